//! Free-text field filling from preset answers or configured pools.

use eoka::Page;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::{FillConfig, MarkupConfig};
use crate::dom::{self, FreeTextField};
use crate::Result;

/// Which answer pool a field draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    TeachingAssistant,
    Course,
}

/// Classify a field by its enclosing context text.
pub fn classify(context: &str, keyword: &str) -> PoolKind {
    if context.contains(keyword) {
        PoolKind::TeachingAssistant
    } else {
        PoolKind::Course
    }
}

/// Decide the value for every field: the positional preset when non-empty,
/// otherwise a uniform draw from the pool matching the field's context.
/// The rng is only consulted for fields without a usable preset.
pub fn plan<R: Rng>(fields: &[FreeTextField], fill: &FillConfig, rng: &mut R) -> Vec<String> {
    fields
        .iter()
        .map(|field| {
            if let Some(preset) = fill.presets.get(field.index) {
                if !preset.trim().is_empty() {
                    return preset.clone();
                }
            }
            let pool = match classify(&field.context, &fill.ta_keyword) {
                PoolKind::TeachingAssistant => &fill.ta_pool,
                PoolKind::Course => &fill.course_pool,
            };
            pool.choose(rng).cloned().unwrap_or_default()
        })
        .collect()
}

/// Fill every text field on the page. Returns the field count observed,
/// so the caller can detect late-rendered fields after the settle delay.
pub async fn fill_pass(page: &Page, markup: &MarkupConfig, fill: &FillConfig) -> Result<usize> {
    let snap = dom::snapshot(page, markup).await?;
    debug!("text fields: {}", snap.fields.len());

    if snap.fields.is_empty() {
        return Ok(0);
    }

    let values = {
        let mut rng = rand::thread_rng();
        plan(&snap.fields, fill, &mut rng)
    };

    let mut written = 0;
    for (field, value) in snap.fields.iter().zip(&values) {
        if dom::write_text(page, &field.selector, value).await? {
            written += 1;
        }
    }
    info!("filled {} of {} text fields", written, snap.fields.len());
    Ok(snap.fields.len())
}
