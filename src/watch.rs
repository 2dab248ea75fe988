//! Page watching and pass orchestration.
//!
//! The watcher probes the page on a fixed interval for two signals: entry
//! into the fill view (fragment routing — the SPA never does a full page
//! navigation into it) and DOM mutations while on the fill view. Each probe
//! yields discrete triggers that are drained in order; a gate with a
//! cooldown decides whether a trigger actually starts a pass, so a render
//! burst firing many mutations produces at most one pass.

use eoka::Page;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::{dom, fill, guard, retry, select, Result};

/// A discrete reason to run an orchestration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The route newly acquired the fill-view prefix.
    RouteEntered,
    /// The DOM mutated while on the fill view with fillable content present.
    ContentChanged,
}

/// Pass admission gate: at most one pass at a time, and a quiet window
/// after each completion so mutation bursts from our own filling do not
/// immediately re-trigger a pass.
#[derive(Debug)]
pub struct PassGate {
    running: bool,
    last_done: Option<Instant>,
    cooldown: Duration,
}

impl PassGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            running: false,
            last_done: None,
            cooldown,
        }
    }

    /// Try to enter the running state. Pure precondition: not already
    /// running, and the cooldown since the last completion has elapsed.
    pub fn try_start(&mut self, now: Instant) -> bool {
        if self.running {
            return false;
        }
        if let Some(done) = self.last_done {
            if now.duration_since(done) < self.cooldown {
                return false;
            }
        }
        self.running = true;
        true
    }

    /// Record pass completion and start the cooldown window.
    pub fn finish(&mut self, now: Instant) {
        self.running = false;
        self.last_done = Some(now);
    }
}

/// Raw probe result from the page.
#[derive(Debug, Clone, Deserialize)]
struct ProbeState {
    hash: String,
    mutations: u64,
    has_content: bool,
}

/// Installs a mutation counter on the page. Re-run every tick: the flag
/// makes it a no-op normally, and a full reload (which wipes page state)
/// gets the observer back on the next tick.
const INSTALL_JS: &str = r#"
(() => {
    if (window.__qf_observer) return false;
    window.__qf_mutations = 0;
    window.__qf_observer = new MutationObserver(() => { window.__qf_mutations++; });
    window.__qf_observer.observe(document.documentElement, { childList: true, subtree: true });
    return true;
})()
"#;

/// Derive triggers from consecutive probe states.
fn derive_triggers(prev: Option<&ProbeState>, cur: &ProbeState, prefix: &str) -> Vec<Trigger> {
    let mut triggers = Vec::new();
    let on_fill = cur.hash.starts_with(prefix);
    if !on_fill {
        return triggers;
    }

    let was_on_fill = prev.map(|p| p.hash.starts_with(prefix)).unwrap_or(false);
    if !was_on_fill {
        triggers.push(Trigger::RouteEntered);
    }

    let mutated = prev.map(|p| cur.mutations > p.mutations).unwrap_or(false);
    if mutated && cur.has_content {
        triggers.push(Trigger::ContentChanged);
    }

    triggers
}

/// Watches the page and drives orchestration passes.
pub struct PageWatcher {
    config: Config,
    gate: PassGate,
    last_probe: Option<ProbeState>,
}

impl PageWatcher {
    pub fn new(config: Config) -> Self {
        let gate = PassGate::new(Duration::from_millis(config.fill.cooldown_ms));
        Self {
            config,
            gate,
            last_probe: None,
        }
    }

    /// Run the watch loop until the caller drops the future (Ctrl-C).
    /// Browser transport failures during a probe are logged and retried on
    /// the next tick; nothing here escalates past the loop.
    pub async fn run(&mut self, page: &Page) -> Result<()> {
        info!("watching for fill view (prefix: {})", self.config.fill.route_prefix);
        loop {
            match self.tick(page).await {
                Ok(()) => {}
                Err(e) => warn!("probe failed, will retry: {}", e),
            }
            page.wait(self.config.fill.poll_interval_ms).await;
        }
    }

    /// One probe + drain cycle.
    async fn tick(&mut self, page: &Page) -> Result<()> {
        let _ = page.evaluate::<bool>(INSTALL_JS).await?;
        let cur = self.probe(page).await?;
        let triggers = derive_triggers(self.last_probe.as_ref(), &cur, &self.config.fill.route_prefix);
        self.last_probe = Some(cur);

        for trigger in triggers {
            if !self.gate.try_start(Instant::now()) {
                debug!("{:?} skipped: pass in progress or within cooldown", trigger);
                continue;
            }
            debug!("{:?}: starting pass", trigger);
            let result = run_pass(page, &self.config).await;
            self.gate.finish(Instant::now());
            if let Err(e) = result {
                warn!("pass failed: {}", e);
            }
        }
        Ok(())
    }

    async fn probe(&self, page: &Page) -> Result<ProbeState> {
        let js = format!(
            r#"(() => JSON.stringify({{
                hash: location.hash,
                mutations: window.__qf_mutations || 0,
                has_content: !!(document.querySelector({choice}) || document.querySelector({text})),
            }}))()"#,
            choice = js_str(&self.config.markup.choice_input),
            text = js_str(&self.config.markup.text_input),
        );
        let json: String = page.evaluate(&js).await?;
        serde_json::from_str(&json)
            .map_err(|e| crate::Error::Snapshot(format!("probe: {}", e)))
    }
}

/// One full orchestration pass: wait for content, drive selection to
/// convergence, fill text fields, focus the captcha, re-fill after the
/// settle delay if new fields appeared, arm the submit guard.
async fn run_pass(page: &Page, config: &Config) -> Result<()> {
    info!("fill view detected: {}", page.url().await?);

    let selectors = [
        config.markup.choice_input.as_str(),
        config.markup.text_input.as_str(),
    ];
    let appeared = dom::wait_for_any(page, &selectors, config.fill.wait_timeout_ms, 200).await?;
    if !appeared {
        warn!("form content did not appear within {}ms, proceeding anyway", config.fill.wait_timeout_ms);
    }

    retry::drive(
        config.fill.max_retry_attempts,
        Duration::from_millis(config.fill.retry_interval_ms),
        || select::select_pass(page, &config.markup),
    )
    .await?;

    let fields_before = fill::fill_pass(page, &config.markup, &config.fill).await?;

    if dom::exists(page, &config.markup.captcha).await? {
        dom::focus(page, &config.markup.captcha).await?;
        debug!("captcha input focused");
    }

    page.wait(config.fill.settle_delay_ms).await;

    let fields_after = dom::count(page, &config.markup.text_input).await?;
    if fields_after > fields_before {
        debug!("{} new text fields after settle, refilling", fields_after - fields_before);
        fill::fill_pass(page, &config.markup, &config.fill).await?;
    }

    if config.fill.block_auto_submit {
        guard::arm(page, &config.markup.submit_button).await?;
    }

    info!("pass complete");
    Ok(())
}

fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "#/myPoll/fill/";

    fn probe(hash: &str, mutations: u64, has_content: bool) -> ProbeState {
        ProbeState {
            hash: hash.into(),
            mutations,
            has_content,
        }
    }

    #[test]
    fn test_route_entry_triggers() {
        let prev = probe("#/myPoll/list", 0, false);
        let cur = probe("#/myPoll/fill/123", 0, false);
        assert_eq!(
            derive_triggers(Some(&prev), &cur, PREFIX),
            vec![Trigger::RouteEntered]
        );
    }

    #[test]
    fn test_first_probe_on_fill_view_triggers() {
        let cur = probe("#/myPoll/fill/123", 0, false);
        assert_eq!(derive_triggers(None, &cur, PREFIX), vec![Trigger::RouteEntered]);
    }

    #[test]
    fn test_off_view_never_triggers() {
        let prev = probe("#/home", 0, false);
        let cur = probe("#/home", 5, true);
        assert!(derive_triggers(Some(&prev), &cur, PREFIX).is_empty());
    }

    #[test]
    fn test_mutation_with_content_triggers() {
        let prev = probe("#/myPoll/fill/123", 3, true);
        let cur = probe("#/myPoll/fill/123", 7, true);
        assert_eq!(
            derive_triggers(Some(&prev), &cur, PREFIX),
            vec![Trigger::ContentChanged]
        );
    }

    #[test]
    fn test_mutation_without_content_is_ignored() {
        let prev = probe("#/myPoll/fill/123", 3, false);
        let cur = probe("#/myPoll/fill/123", 7, false);
        assert!(derive_triggers(Some(&prev), &cur, PREFIX).is_empty());
    }

    #[test]
    fn test_quiet_probe_yields_nothing() {
        let prev = probe("#/myPoll/fill/123", 3, true);
        let cur = probe("#/myPoll/fill/123", 3, true);
        assert!(derive_triggers(Some(&prev), &cur, PREFIX).is_empty());
    }

    #[test]
    fn test_entry_and_mutation_in_one_tick() {
        let prev = probe("#/home", 1, false);
        let cur = probe("#/myPoll/fill/123", 4, true);
        assert_eq!(
            derive_triggers(Some(&prev), &cur, PREFIX),
            vec![Trigger::RouteEntered, Trigger::ContentChanged]
        );
    }

    #[test]
    fn test_gate_blocks_while_running() {
        let mut gate = PassGate::new(Duration::from_millis(300));
        let now = Instant::now();
        assert!(gate.try_start(now));
        assert!(!gate.try_start(now));
    }

    #[test]
    fn test_gate_enforces_cooldown() {
        let mut gate = PassGate::new(Duration::from_millis(300));
        let start = Instant::now();
        assert!(gate.try_start(start));
        gate.finish(start);
        assert!(!gate.try_start(start + Duration::from_millis(100)));
        assert!(gate.try_start(start + Duration::from_millis(301)));
    }

    #[test]
    fn test_gate_admits_first_pass_immediately() {
        let mut gate = PassGate::new(Duration::from_millis(300));
        assert!(gate.try_start(Instant::now()));
    }
}
