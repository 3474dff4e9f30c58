//! Article type detection for outline topics
//!
//! Topics are matched against ordered word-boundary patterns; the first rule
//! that matches decides the type, and anything unmatched is `General`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse content type of an article, used to pick prompt guidance and template fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleType {
    HowTo,
    Listicle,
    Explanatory,
    General,
}

impl ArticleType {
    pub const ALL: [ArticleType; 4] = [
        ArticleType::HowTo,
        ArticleType::Listicle,
        ArticleType::Explanatory,
        ArticleType::General,
    ];

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::HowTo => "how_to",
            ArticleType::Listicle => "listicle",
            ArticleType::Explanatory => "explanatory",
            ArticleType::General => "general",
        }
    }

    /// Human-readable label for the form preview
    pub fn label(&self) -> &'static str {
        match self {
            ArticleType::HowTo => "How-To Guide",
            ArticleType::Listicle => "Listicle",
            ArticleType::Explanatory => "Explanatory",
            ArticleType::General => "General",
        }
    }
}

impl std::fmt::Display for ArticleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static HOW_TO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(how to|guide|tutorial|step by step)\b").unwrap());
static LISTICLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+\s+)?(best|top|vs|versus|comparison)\b").unwrap());
static EXPLANATORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(what is|introduction to|understanding|explain)\b").unwrap());

/// Classify a topic into an [`ArticleType`].
///
/// Matching is case-insensitive and total: empty or whitespace-only input
/// falls through to `General`.
///
/// # Examples
/// ```
/// use article_outline::classifier::{classify, ArticleType};
///
/// assert_eq!(classify("How to bake bread"), ArticleType::HowTo);
/// assert_eq!(classify("10 best laptops"), ArticleType::Listicle);
/// ```
pub fn classify(topic: &str) -> ArticleType {
    let topic_lower = topic.to_lowercase();

    let rules: [(&Lazy<Regex>, ArticleType); 3] = [
        (&HOW_TO_RE, ArticleType::HowTo),
        (&LISTICLE_RE, ArticleType::Listicle),
        (&EXPLANATORY_RE, ArticleType::Explanatory),
    ];

    rules
        .iter()
        .find(|(re, _)| re.is_match(&topic_lower))
        .map(|(_, kind)| *kind)
        .unwrap_or(ArticleType::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_how_to() {
        assert_eq!(classify("how to bake bread"), ArticleType::HowTo);
        assert_eq!(classify("Beginner Guide to Kayaking"), ArticleType::HowTo);
        assert_eq!(classify("Rust tutorial"), ArticleType::HowTo);
        assert_eq!(classify("Tiling a floor step by step"), ArticleType::HowTo);
    }

    #[test]
    fn test_detect_listicle() {
        assert_eq!(classify("10 best laptops"), ArticleType::Listicle);
        assert_eq!(classify("Top hiking trails"), ArticleType::Listicle);
        assert_eq!(classify("Postgres vs MySQL"), ArticleType::Listicle);
        assert_eq!(classify("cloud storage comparison"), ArticleType::Listicle);
    }

    #[test]
    fn test_detect_explanatory() {
        assert_eq!(classify("what is entropy"), ArticleType::Explanatory);
        assert_eq!(classify("Introduction to Graph Theory"), ArticleType::Explanatory);
        assert_eq!(classify("understanding inflation"), ArticleType::Explanatory);
    }

    #[test]
    fn test_general_fallback() {
        assert_eq!(classify("my garden"), ArticleType::General);
        assert_eq!(classify(""), ArticleType::General);
        assert_eq!(classify("   "), ArticleType::General);
    }

    #[test]
    fn test_first_rule_wins() {
        // "guide" and "best" both match; how-to is checked first
        assert_eq!(classify("the best guide to sourdough"), ArticleType::HowTo);
        // "top" and "explain" both match; listicle is checked before explanatory
        assert_eq!(classify("top ways to explain recursion"), ArticleType::Listicle);
    }

    #[test]
    fn test_word_boundaries() {
        // "topic" and "bestow" contain rule words but not as whole words
        assert_eq!(classify("a topic to bestow"), ArticleType::General);
        assert_eq!(classify("guidelines for pets"), ArticleType::General);
    }

    #[test]
    fn test_idempotent() {
        for topic in ["how to swim", "5 top cameras", "what is rust", "cats"] {
            assert_eq!(classify(topic), classify(topic));
        }
    }
}
