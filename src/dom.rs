//! Page snapshots and synthetic interaction.
//!
//! All reads happen through one JavaScript evaluation returning JSON, all
//! writes go through synthetic events (never direct state assignment), so
//! the host framework's reactivity stays in sync.

use eoka::Page;
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

use crate::config::MarkupConfig;
use crate::{Error, Result};

/// Snapshot of one selectable answer input. A view onto host-controlled
/// state; autoeval mutates it only through [`activate`].
#[derive(Debug, Clone)]
pub struct ChoiceWidget {
    /// Stable CSS selector for re-locating the element.
    pub selector: String,
    /// Raw value attribute.
    pub value: String,
    /// Rendered label text.
    pub label: String,
    /// Form grouping attribute, if any.
    pub name: Option<String>,
    /// Index of the enclosing question container, if any.
    pub container: Option<usize>,
    pub disabled: bool,
    pub checked: bool,
}

impl ChoiceWidget {
    /// Text fed to the sentiment scorer: the raw value when present,
    /// otherwise the rendered label.
    pub fn answer_text(&self) -> &str {
        if self.value.trim().is_empty() {
            &self.label
        } else {
            &self.value
        }
    }
}

/// Snapshot of one free-text entry surface.
#[derive(Debug, Clone)]
pub struct FreeTextField {
    /// Position among the page's text fields.
    pub index: usize,
    /// Stable CSS selector for re-locating the element.
    pub selector: String,
    /// Text of the nearest card/form-row ancestor, used for classification.
    pub context: String,
    /// Current value.
    pub value: String,
}

/// One observation of the page's fillable content.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub widgets: Vec<ChoiceWidget>,
    pub fields: Vec<FreeTextField>,
}

#[derive(Deserialize)]
struct RawWidget {
    selector: String,
    value: String,
    label: String,
    name: Option<String>,
    container: Option<usize>,
    disabled: bool,
    checked: bool,
}

#[derive(Deserialize)]
struct RawField {
    index: usize,
    selector: String,
    context: String,
    value: String,
}

#[derive(Deserialize)]
struct RawSnapshot {
    widgets: Vec<RawWidget>,
    fields: Vec<RawField>,
}

/// JavaScript that enumerates choice widgets and text fields in one pass.
/// Elements are stamped with a data attribute so later interactions can
/// re-locate them without rebuilding positional selectors.
const SNAPSHOT_JS: &str = r#"
((cfg) => {
    let uid = window.__qf_uid || 0;
    const stamp = (el) => {
        if (!el.dataset.qfUid) el.dataset.qfUid = String(uid++);
        return '[data-qf-uid="' + el.dataset.qfUid + '"]';
    };

    const containers = Array.from(document.querySelectorAll(cfg.group));

    const widgets = Array.from(document.querySelectorAll(cfg.choice)).map((el) => {
        const labelEl = el.closest('label');
        const textEl = labelEl && labelEl.querySelector('.el-radio__label');
        const label = ((textEl && textEl.textContent) || (labelEl && labelEl.textContent) || '').trim();
        const holder = el.closest(cfg.group);
        const idx = holder ? containers.indexOf(holder) : -1;
        return {
            selector: stamp(el),
            value: String(el.value || ''),
            label,
            name: el.name || null,
            container: idx >= 0 ? idx : null,
            disabled: !!el.disabled,
            checked: !!el.checked || el.getAttribute('aria-checked') === 'true',
        };
    });

    const fields = Array.from(document.querySelectorAll(cfg.text)).map((el, i) => {
        const card = el.closest(cfg.card);
        return {
            index: i,
            selector: stamp(el),
            context: card ? (card.textContent || '').trim() : '',
            value: el.value || '',
        };
    });

    window.__qf_uid = uid;
    return JSON.stringify({ widgets, fields });
})(__QF_CFG)
"#;

/// Observe the page's fillable content.
pub async fn snapshot(page: &Page, markup: &MarkupConfig) -> Result<PageSnapshot> {
    let cfg = serde_json::json!({
        "group": markup.group_container,
        "choice": markup.choice_input,
        "text": markup.text_input,
        "card": markup.card,
    });
    let js = SNAPSHOT_JS.replace("__QF_CFG", &cfg.to_string());
    let json_str: String = page.evaluate(&js).await?;

    let raw: RawSnapshot = serde_json::from_str(&json_str)
        .map_err(|e| Error::Snapshot(e.to_string()))?;

    Ok(PageSnapshot {
        widgets: raw
            .widgets
            .into_iter()
            .map(|w| ChoiceWidget {
                selector: w.selector,
                value: w.value,
                label: w.label,
                name: w.name.filter(|n| !n.is_empty()),
                container: w.container,
                disabled: w.disabled,
                checked: w.checked,
            })
            .collect(),
        fields: raw
            .fields
            .into_iter()
            .map(|f| FreeTextField {
                index: f.index,
                selector: f.selector,
                context: f.context,
                value: f.value,
            })
            .collect(),
    })
}

/// Activate a choice widget as a user would: click its enclosing label
/// surface, then dispatch a bubbling `change`. Frameworks bind internal
/// state to the click and sync visual/ARIA state on the change event.
/// Returns false if the element is gone or disabled.
pub async fn activate(page: &Page, selector: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el || el.disabled) return false;
            const surface = el.closest('label') || el;
            surface.click();
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        sel = js_str(selector)
    );
    Ok(page.evaluate(&js).await?)
}

/// Write a value into a text field and raise `input` + `change`, mirroring
/// the two-notification requirement of [`activate`]. Returns false if the
/// element is gone.
pub async fn write_text(page: &Page, selector: &str, value: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.focus();
            el.value = {val};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        sel = js_str(selector),
        val = js_str(value)
    );
    Ok(page.evaluate(&js).await?)
}

/// Focus an element if it exists.
pub async fn focus(page: &Page, selector: &str) -> Result<()> {
    let js = format!("document.querySelector({})?.focus()", js_str(selector));
    page.execute(&js).await?;
    Ok(())
}

/// Whether any element matches the selector.
pub async fn exists(page: &Page, selector: &str) -> Result<bool> {
    let js = format!("!!document.querySelector({})", js_str(selector));
    Ok(page.evaluate(&js).await?)
}

/// Number of elements matching the selector.
pub async fn count(page: &Page, selector: &str) -> Result<usize> {
    let js = format!("document.querySelectorAll({}).length", js_str(selector));
    Ok(page.evaluate(&js).await?)
}

/// Poll until any of the selectors matches, or the timeout elapses.
/// Returns whether content appeared — a timeout is not an error, the
/// caller proceeds best-effort with whatever is on the page.
pub async fn wait_for_any(
    page: &Page,
    selectors: &[&str],
    timeout_ms: u64,
    poll_ms: u64,
) -> Result<bool> {
    let start = Instant::now();
    loop {
        for sel in selectors {
            if exists(page, sel).await? {
                return Ok(true);
            }
        }
        if start.elapsed().as_millis() as u64 > timeout_ms {
            debug!("wait timeout after {}ms: {}", timeout_ms, selectors.join(", "));
            return Ok(false);
        }
        page.wait(poll_ms).await;
    }
}

/// Escape a string for embedding in a JS expression.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".into())
}
