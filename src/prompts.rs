//! Prompt construction for the hosted model
//!
//! The prompt spells out the exact JSON shape that [`crate::parse`] accepts,
//! so any change to the example schema here must keep `h1`, `sections[].h2`,
//! `sections[].bullets` and `ctas[]` intact.

use crate::classifier::ArticleType;

/// Marker used in place of an empty keyword
pub const KEYWORD_NOT_SPECIFIED: &str = "Not specified";

/// Prompt used to check that a model answers at all
pub const PROBE_PROMPT: &str = "Hello";

const EXAMPLE_SCHEMA: &str = r#"{
    "h1": "SEO-optimized main heading",
    "sections": [
        {
            "h2": "First section heading",
            "bullets": ["Point 1", "Point 2", "Point 3"]
        },
        {
            "h2": "Second section heading",
            "bullets": ["Point 1", "Point 2", "Point 3"]
        },
        {
            "h2": "Third section heading",
            "bullets": ["Point 1", "Point 2", "Point 3"]
        },
        {
            "h2": "Fourth section heading",
            "bullets": ["Point 1", "Point 2", "Point 3"]
        }
    ],
    "ctas": [
        {"after": 0, "text": "CTA after first section"},
        {"after": 1, "text": "CTA after second section"},
        {"after": 3, "text": "Final CTA"}
    ]
}"#;

/// One-sentence guidance for each article type
pub fn type_guidance(article_type: ArticleType) -> &'static str {
    match article_type {
        ArticleType::HowTo => "Create a practical how-to guide with clear steps.",
        ArticleType::Listicle => "Create a comparison or list article.",
        ArticleType::Explanatory => "Create an educational article with examples.",
        ArticleType::General => "Create a comprehensive article.",
    }
}

/// Build the outline instruction sent to the model.
pub fn build_prompt(topic: &str, keyword: &str, article_type: ArticleType) -> String {
    let keyword = if keyword.trim().is_empty() {
        KEYWORD_NOT_SPECIFIED
    } else {
        keyword
    };

    let mut out = String::with_capacity(1024);
    out.push_str("Generate a detailed article outline in JSON format.\n\n");
    out.push_str("Topic: ");
    out.push_str(topic);
    out.push_str("\nKeyword: ");
    out.push_str(keyword);
    out.push_str("\nType: ");
    out.push_str(type_guidance(article_type));
    out.push_str("\n\nReturn ONLY valid JSON:\n");
    out.push_str(EXAMPLE_SCHEMA);
    out
}
