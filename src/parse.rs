//! Model output to [`Outline`]: locate the JSON object, decode it, and
//! enforce the section and bullet minimums. CTA anchors are not checked.

use tracing::debug;

use crate::outline::{MIN_BULLETS, MIN_SECTIONS, Outline};

/// Extract the JSON object substring from raw model output.
///
/// Greedy: spans from the first `{` to the last `}`, so prose before and
/// after a single object is dropped.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Check the cardinality rules a decoded outline must meet.
pub fn validate_outline(outline: &Outline) -> bool {
    outline.sections.len() >= MIN_SECTIONS
        && outline
            .sections
            .iter()
            .all(|s| s.bullets.len() >= MIN_BULLETS)
}

/// Parse raw model output into an [`Outline`].
///
/// Returns `None` on any decode error, missing field or cardinality
/// violation; the caller falls back to the template outline.
pub fn parse_response(raw: &str) -> Option<Outline> {
    let json_str = match extract_json_object(raw) {
        Some(s) => s,
        None => {
            debug!("no JSON object in model output ({} chars)", raw.len());
            return None;
        }
    };

    let outline: Outline = match serde_json::from_str(json_str) {
        Ok(o) => o,
        Err(e) => {
            debug!("model output did not decode as an outline: {}", e);
            return None;
        }
    };

    if !validate_outline(&outline) {
        debug!(
            "model outline rejected: {} sections",
            outline.sections.len()
        );
        return None;
    }

    Some(outline)
}
