//! Outline value types
//!
//! Field names on the wire follow the JSON shape the model is asked to
//! return (`h1`, `h2`, `ctas`, `after`), so the same types decode model
//! output and serialize API responses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Minimum number of sections a usable outline carries
pub const MIN_SECTIONS: usize = 3;

/// Minimum number of bullets per section
pub const MIN_BULLETS: usize = 2;

/// Anchor stored for a CTA whose `after` is not a usable number; matches no section
pub const NO_SECTION: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(rename = "h1")]
    pub heading: String,
    pub sections: Vec<Section>,
    #[serde(rename = "ctas")]
    pub calls_to_action: Vec<CallToAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "h2")]
    pub subheading: String,
    pub bullets: Vec<String>,
}

/// CTA anchored after a section. The anchor is never bounds-checked: an
/// index outside the outline simply never renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    #[serde(
        rename = "after",
        default = "no_section",
        deserialize_with = "lenient_index"
    )]
    pub after_section_index: i64,
    #[serde(default)]
    pub text: String,
}

fn no_section() -> i64 {
    NO_SECTION
}

/// Integers (and integral floats such as `1.0`) are kept; strings, booleans,
/// nulls and fractional numbers become [`NO_SECTION`].
fn lenient_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let index = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .unwrap_or(NO_SECTION),
        _ => NO_SECTION,
    };
    Ok(index)
}

impl Outline {
    /// First CTA anchored after the section at `index`, if any.
    pub fn cta_after(&self, index: usize) -> Option<&CallToAction> {
        let index = i64::try_from(index).ok()?;
        self.calls_to_action
            .iter()
            .find(|c| c.after_section_index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_cta_wins() {
        let outline = Outline {
            heading: "H".into(),
            sections: vec![],
            calls_to_action: vec![
                CallToAction {
                    after_section_index: 1,
                    text: "first".into(),
                },
                CallToAction {
                    after_section_index: 1,
                    text: "second".into(),
                },
            ],
        };
        assert_eq!(outline.cta_after(1).map(|c| c.text.as_str()), Some("first"));
        assert!(outline.cta_after(0).is_none());
    }

    #[test]
    fn wire_names_match_model_schema() {
        let outline = Outline {
            heading: "Title".into(),
            sections: vec![Section {
                subheading: "Intro".into(),
                bullets: vec!["a".into()],
            }],
            calls_to_action: vec![CallToAction {
                after_section_index: 0,
                text: "Go".into(),
            }],
        };
        let value = serde_json::to_value(&outline).unwrap();
        assert_eq!(value["h1"], "Title");
        assert_eq!(value["sections"][0]["h2"], "Intro");
        assert_eq!(value["ctas"][0]["after"], 0);
    }

    fn decode_cta(json: &str) -> CallToAction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn cta_anchor_decodes_leniently() {
        assert_eq!(decode_cta(r#"{"after": 2, "text": "t"}"#).after_section_index, 2);
        assert_eq!(decode_cta(r#"{"after": 1.0, "text": "t"}"#).after_section_index, 1);
        assert_eq!(decode_cta(r#"{"after": -3, "text": "t"}"#).after_section_index, -3);
        assert_eq!(
            decode_cta(r#"{"after": "1", "text": "t"}"#).after_section_index,
            NO_SECTION
        );
        assert_eq!(
            decode_cta(r#"{"after": 1.5, "text": "t"}"#).after_section_index,
            NO_SECTION
        );
        assert_eq!(decode_cta(r#"{"text": "t"}"#).after_section_index, NO_SECTION);
        assert_eq!(decode_cta(r#"{"after": 0}"#).text, "");
    }

    #[test]
    fn negative_anchor_matches_nothing() {
        let outline = Outline {
            heading: "H".into(),
            sections: vec![],
            calls_to_action: vec![CallToAction {
                after_section_index: -1,
                text: "nowhere".into(),
            }],
        };
        assert!((0..4).all(|i| outline.cta_after(i).is_none()));
    }
}
