//! Best-answer planning and activation per question group.

use eoka::Page;
use tracing::{debug, info};

use crate::config::MarkupConfig;
use crate::dom::{self, ChoiceWidget};
use crate::{group, score, Result};

/// How a group's members can be compared, decided once per group so the
/// numeric and sentiment paths never interleave within one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRegime {
    /// At least one member's raw value parses as a number.
    Numeric,
    /// No numeric values, but at least one label matches a scoring rule.
    Sentiment,
    /// No usable signal; fall back to the first member.
    Unmatched,
}

impl ScoreRegime {
    /// Classify a group by inspecting its members.
    pub fn of_group(widgets: &[ChoiceWidget], group: &[usize]) -> Self {
        if group.iter().any(|&i| numeric_value(&widgets[i]).is_some()) {
            ScoreRegime::Numeric
        } else if group
            .iter()
            .any(|&i| score::score_text(widgets[i].answer_text()).is_some())
        {
            ScoreRegime::Sentiment
        } else {
            ScoreRegime::Unmatched
        }
    }
}

/// Observable result of one selection pass, consumed by the retry driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassOutcome {
    /// Choice widgets discovered.
    pub widgets: usize,
    /// Question groups reconstructed.
    pub groups: usize,
    /// Activations performed.
    pub activated: usize,
    /// Groups left with no checked member.
    pub unchecked: usize,
}

impl PassOutcome {
    /// A pass converged when every discovered group ended up checked.
    /// A pass that found nothing at all has not converged — the page
    /// likely has not rendered its question set yet.
    pub fn converged(&self) -> bool {
        self.widgets > 0 && self.unchecked == 0
    }
}

fn numeric_value(widget: &ChoiceWidget) -> Option<f64> {
    let trimmed = widget.value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Pick the member to activate, as an index into the snapshot.
///
/// Numeric regime: maximum value, strictly-greater comparison so ties
/// resolve to the first-encountered maximum. Sentiment regime: maximum
/// score among members that match a rule. Unmatched: first member.
pub fn plan(widgets: &[ChoiceWidget], group: &[usize]) -> Option<usize> {
    match ScoreRegime::of_group(widgets, group) {
        ScoreRegime::Numeric => {
            let mut best: Option<(usize, f64)> = None;
            for &i in group {
                let Some(v) = numeric_value(&widgets[i]) else { continue };
                if best.map_or(true, |(_, bv)| v > bv) {
                    best = Some((i, v));
                }
            }
            best.map(|(i, _)| i)
        }
        ScoreRegime::Sentiment => {
            let mut best: Option<(usize, i32)> = None;
            for &i in group {
                let Some(s) = score::score_text(widgets[i].answer_text()) else { continue };
                if best.map_or(true, |(_, bs)| s > bs) {
                    best = Some((i, s));
                }
            }
            best.map(|(i, _)| i)
        }
        ScoreRegime::Unmatched => group.first().copied(),
    }
}

/// One grouping + selection pass over the live page.
///
/// Snapshots the page, activates the planned member of every group (skipping
/// disabled members), then re-snapshots to count groups that still have no
/// checked member — the host may re-render between click and check.
pub async fn select_pass(page: &Page, markup: &MarkupConfig) -> Result<PassOutcome> {
    let snap = dom::snapshot(page, markup).await?;
    debug!("choice widgets: {}", snap.widgets.len());

    if snap.widgets.is_empty() {
        debug!("no choice widgets found; custom component or not rendered yet");
        return Ok(PassOutcome::default());
    }

    let groups = group::group_widgets(&snap.widgets);
    let mut activated = 0;
    for members in &groups {
        if let Some(i) = plan(&snap.widgets, members) {
            let best = &snap.widgets[i];
            if !best.disabled && dom::activate(page, &best.selector).await? {
                activated += 1;
            }
        }
    }

    let after = dom::snapshot(page, markup).await?;
    let regrouped = group::group_widgets(&after.widgets);
    let unchecked = regrouped
        .iter()
        .filter(|members| !group::is_checked(members, &after.widgets))
        .count();

    info!(
        "selection pass: {} groups, {} activated, {} unchecked",
        groups.len(),
        activated,
        unchecked
    );

    Ok(PassOutcome {
        widgets: snap.widgets.len(),
        groups: groups.len(),
        activated,
        unchecked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(value: &str, label: &str) -> ChoiceWidget {
        ChoiceWidget {
            selector: String::new(),
            value: value.into(),
            label: label.into(),
            name: None,
            container: Some(0),
            disabled: false,
            checked: false,
        }
    }

    fn indices(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_numeric_group_picks_max() {
        let widgets = vec![widget("1", ""), widget("5", ""), widget("3", "")];
        assert_eq!(ScoreRegime::of_group(&widgets, &indices(3)), ScoreRegime::Numeric);
        assert_eq!(plan(&widgets, &indices(3)), Some(1));
    }

    #[test]
    fn test_numeric_tie_first_wins() {
        let widgets = vec![widget("5", ""), widget("5", ""), widget("2", "")];
        assert_eq!(plan(&widgets, &indices(3)), Some(0));
    }

    #[test]
    fn test_numeric_skips_unparseable_members() {
        let widgets = vec![widget("abc", ""), widget("2", ""), widget("4", "")];
        assert_eq!(plan(&widgets, &indices(3)), Some(2));
    }

    #[test]
    fn test_sentiment_group_picks_max_score() {
        let widgets = vec![
            widget("", "不太满意"),
            widget("", "非常满意"),
            widget("", "比较满意"),
        ];
        assert_eq!(ScoreRegime::of_group(&widgets, &indices(3)), ScoreRegime::Sentiment);
        assert_eq!(plan(&widgets, &indices(3)), Some(1));
    }

    #[test]
    fn test_sentiment_ignores_unmatched_members() {
        let widgets = vec![widget("", "其他"), widget("", "满意"), widget("", "同意")];
        // 满意 and 同意 both score 2; first max wins.
        assert_eq!(plan(&widgets, &indices(3)), Some(1));
    }

    #[test]
    fn test_unmatched_group_falls_back_to_first() {
        let widgets = vec![widget("", "选项甲"), widget("", "选项乙")];
        assert_eq!(ScoreRegime::of_group(&widgets, &indices(2)), ScoreRegime::Unmatched);
        assert_eq!(plan(&widgets, &indices(2)), Some(0));
    }

    #[test]
    fn test_mixed_group_is_numeric() {
        // One numeric member puts the whole group in the numeric regime;
        // sentiment labels on other members are not consulted.
        let widgets = vec![widget("", "非常满意"), widget("2", "一般")];
        assert_eq!(ScoreRegime::of_group(&widgets, &indices(2)), ScoreRegime::Numeric);
        assert_eq!(plan(&widgets, &indices(2)), Some(1));
    }

    #[test]
    fn test_empty_group() {
        let widgets: Vec<ChoiceWidget> = Vec::new();
        assert_eq!(plan(&widgets, &[]), None);
    }

    #[test]
    fn test_plan_is_idempotent_on_checked_snapshot() {
        let mut widgets = vec![widget("1", ""), widget("5", ""), widget("3", "")];
        let first = plan(&widgets, &indices(3)).unwrap();
        widgets[first].checked = true;
        // Re-planning picks the same member and the group reads as checked.
        assert_eq!(plan(&widgets, &indices(3)), Some(first));
        assert!(crate::group::is_checked(&indices(3), &widgets));
    }

    #[test]
    fn test_outcome_convergence() {
        let converged = PassOutcome { widgets: 10, groups: 2, activated: 2, unchecked: 0 };
        assert!(converged.converged());

        let pending = PassOutcome { widgets: 10, groups: 2, activated: 1, unchecked: 1 };
        assert!(!pending.converged());

        // An empty page never counts as converged.
        assert!(!PassOutcome::default().converged());
    }
}
