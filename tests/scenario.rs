//! End-to-end pass over a constructed page snapshot: a form with three
//! numeric radio questions and two free-text fields, one about the
//! teaching assistant.

use autoeval::config::FillConfig;
use autoeval::dom::{ChoiceWidget, FreeTextField};
use autoeval::{fill, group, select};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn radio(container: usize, value: &str) -> ChoiceWidget {
    ChoiceWidget {
        selector: format!("[data-qf-uid=\"{}-{}\"]", container, value),
        value: value.into(),
        label: String::new(),
        name: None,
        container: Some(container),
        disabled: false,
        checked: false,
    }
}

fn form() -> Vec<ChoiceWidget> {
    let mut widgets = Vec::new();
    for question in 0..3 {
        for value in ["1", "2", "3", "4", "5"] {
            widgets.push(radio(question, value));
        }
    }
    widgets
}

fn text_fields() -> Vec<FreeTextField> {
    vec![
        FreeTextField {
            index: 0,
            selector: "[data-qf-uid=\"ta\"]".into(),
            context: "请对本课程助教的工作进行评价".into(),
            value: String::new(),
        },
        FreeTextField {
            index: 1,
            selector: "[data-qf-uid=\"course\"]".into(),
            context: "请对课程教学提出意见和建议".into(),
            value: String::new(),
        },
    ]
}

#[test]
fn full_pass_selects_max_and_fills_both_fields() {
    let mut widgets = form();
    let groups = group::group_widgets(&widgets);
    assert_eq!(groups.len(), 3);

    // Every group plans its "5" option.
    let mut planned = Vec::new();
    for members in &groups {
        let best = select::plan(&widgets, members).expect("numeric group plans a member");
        assert_eq!(widgets[best].value, "5");
        planned.push(best);
    }

    // Simulate the host reacting to activation.
    for &i in &planned {
        widgets[i].checked = true;
    }
    let unchecked = groups
        .iter()
        .filter(|members| !group::is_checked(members, &widgets))
        .count();
    assert_eq!(unchecked, 0);

    // Text filling: both fields non-empty, the TA field from the TA pool.
    let cfg = FillConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let values = fill::plan(&text_fields(), &cfg, &mut rng);
    assert_eq!(values.len(), 2);
    assert!(!values[0].is_empty());
    assert!(!values[1].is_empty());
    assert!(cfg.ta_pool.contains(&values[0]));
    assert!(cfg.course_pool.contains(&values[1]));
}

#[test]
fn second_pass_on_selected_form_stays_converged() {
    let mut widgets = form();
    let groups = group::group_widgets(&widgets);
    for members in &groups {
        let best = select::plan(&widgets, members).unwrap();
        widgets[best].checked = true;
    }

    // Re-running grouping + planning changes nothing and reports no
    // unchecked groups.
    let regrouped = group::group_widgets(&widgets);
    assert_eq!(regrouped, groups);
    for members in &regrouped {
        let best = select::plan(&widgets, members).unwrap();
        assert!(widgets[best].checked);
        assert!(group::is_checked(members, &widgets));
    }
    let unchecked = regrouped
        .iter()
        .filter(|members| !group::is_checked(members, &widgets))
        .count();
    assert_eq!(unchecked, 0);
}

#[test]
fn sentiment_form_picks_most_positive_label() {
    let labels = ["非常不满意", "不太满意", "一般", "比较满意", "非常满意"];
    let widgets: Vec<ChoiceWidget> = labels
        .iter()
        .map(|label| ChoiceWidget {
            selector: String::new(),
            value: String::new(),
            label: label.to_string(),
            name: Some("q1".into()),
            container: None,
            disabled: false,
            checked: false,
        })
        .collect();

    let groups = group::group_widgets(&widgets);
    assert_eq!(groups.len(), 1);
    let best = select::plan(&widgets, &groups[0]).unwrap();
    assert_eq!(widgets[best].label, "非常满意");
}
