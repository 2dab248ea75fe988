//! Submit guard — cancels programmatic clicks on the submit button.

use eoka::Page;
use tracing::debug;

use crate::Result;

/// Install a capture-phase interceptor on the submit button that cancels
/// untrusted (synthetic) clicks, so only a real user can submit. Idempotent:
/// a flag on the element prevents double installation. Returns whether a
/// listener was newly installed.
pub async fn arm(page: &Page, selector: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const btn = document.querySelector({sel});
            if (!btn || btn.__qf_guarded) return false;
            btn.__qf_guarded = true;
            btn.addEventListener('click', (e) => {{
                if (!e.isTrusted) {{
                    e.preventDefault();
                    e.stopImmediatePropagation();
                }}
            }}, true);
            return true;
        }})()"#,
        sel = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".into())
    );
    let installed: bool = page.evaluate(&js).await?;
    if installed {
        debug!("submit guard armed on {}", selector);
    }
    Ok(installed)
}
