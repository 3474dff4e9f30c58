//! Plain-text rendering of outlines, shared by the screen view and file export

use crate::outline::Outline;

pub const BULLET_MARKER: &str = "•";
pub const CTA_MARKER: &str = "💡";

/// Render an outline as markdown-flavoured plain text.
pub fn format_outline(outline: &Outline) -> String {
    let mut text = String::with_capacity(1024);
    text.push_str("# ");
    text.push_str(&outline.heading);
    text.push_str("\n\n");

    for (idx, section) in outline.sections.iter().enumerate() {
        text.push_str("## ");
        text.push_str(&section.subheading);
        text.push_str("\n\n");
        for bullet in &section.bullets {
            text.push_str(BULLET_MARKER);
            text.push(' ');
            text.push_str(bullet);
            text.push('\n');
        }
        text.push('\n');

        if let Some(cta) = outline.cta_after(idx) {
            text.push_str(CTA_MARKER);
            text.push(' ');
            text.push_str(&cta.text);
            text.push_str("\n\n");
        }
    }

    text
}
