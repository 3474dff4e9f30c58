//! Template outlines used whenever the hosted model is unavailable or its
//! answer is unusable.
//!
//! Each [`ArticleType`] owns one static [`FragmentSet`]: a heading pattern,
//! four sections of three bullets, and three calls to action. `{topic}` in a
//! fragment is replaced by the raw topic text; `{subject}` in a heading is
//! replaced by the title-cased topic.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::{ArticleType, classify};
use crate::outline::{CallToAction, Outline, Section};

struct SectionTemplate {
    subheading: &'static str,
    bullets: [&'static str; 3],
}

struct CtaTemplate {
    after: i64,
    text: &'static str,
}

/// How a supplied keyword is worked into the heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeywordRule {
    /// Keep the text before the first colon, put the keyword after it
    ReplaceAfterColon,
    /// Keep the heading and append ` | <Keyword>`
    AppendQualifier,
}

struct FragmentSet {
    heading: &'static str,
    strip_how_to: bool,
    keyword_rule: KeywordRule,
    sections: [SectionTemplate; 4],
    ctas: [CtaTemplate; 3],
}

static HOW_TO_FRAGMENTS: FragmentSet = FragmentSet {
    heading: "How to {subject}: Complete Guide",
    strip_how_to: true,
    keyword_rule: KeywordRule::ReplaceAfterColon,
    sections: [
        SectionTemplate {
            subheading: "Getting Started: Prerequisites",
            bullets: [
                "Understanding requirements and tools",
                "Setting up for success",
                "Avoiding common mistakes",
            ],
        },
        SectionTemplate {
            subheading: "Step-by-Step Process",
            bullets: [
                "Following the proven methodology",
                "Best practices for each phase",
                "Troubleshooting common issues",
            ],
        },
        SectionTemplate {
            subheading: "Advanced Techniques",
            bullets: [
                "Taking results to the next level",
                "Professional strategies",
                "Measuring and improving outcomes",
            ],
        },
        SectionTemplate {
            subheading: "Long-Term Success",
            bullets: [
                "Ongoing maintenance",
                "Scaling your approach",
                "Continued learning resources",
            ],
        },
    ],
    ctas: [
        CtaTemplate {
            after: 0,
            text: "Ready to master {topic}? Continue reading!",
        },
        CtaTemplate {
            after: 1,
            text: "Apply these steps today for best results.",
        },
        CtaTemplate {
            after: 3,
            text: "Start implementing now!",
        },
    ],
};

static LISTICLE_FRAGMENTS: FragmentSet = FragmentSet {
    heading: "{subject}: Ranked and Compared",
    strip_how_to: false,
    keyword_rule: KeywordRule::AppendQualifier,
    sections: [
        SectionTemplate {
            subheading: "How We Chose",
            bullets: [
                "Selection criteria for {topic}",
                "What we tested and compared",
                "Who this list is for",
            ],
        },
        SectionTemplate {
            subheading: "The Top Picks",
            bullets: [
                "Standout options at a glance",
                "Strengths and trade-offs of each",
                "Best overall choice",
            ],
        },
        SectionTemplate {
            subheading: "Side-by-Side Comparison",
            bullets: [
                "Key features compared",
                "Price and value breakdown",
                "Which option fits which need",
            ],
        },
        SectionTemplate {
            subheading: "Final Verdict",
            bullets: [
                "Our recommendation",
                "Budget-friendly alternatives",
                "Questions to ask before deciding",
            ],
        },
    ],
    ctas: [
        CtaTemplate {
            after: 0,
            text: "See which {topic} pick comes out on top. Keep reading!",
        },
        CtaTemplate {
            after: 2,
            text: "Bookmark this comparison for your next purchase.",
        },
        CtaTemplate {
            after: 3,
            text: "Make your choice with confidence today!",
        },
    ],
};

static EXPLANATORY_FRAGMENTS: FragmentSet = FragmentSet {
    heading: "{subject}: Explained Simply",
    strip_how_to: false,
    keyword_rule: KeywordRule::ReplaceAfterColon,
    sections: [
        SectionTemplate {
            subheading: "The Basics",
            bullets: [
                "A plain definition of {topic}",
                "Where the idea comes from",
                "Key terms to know",
            ],
        },
        SectionTemplate {
            subheading: "How It Works",
            bullets: [
                "The core mechanism",
                "A worked example",
                "Common misconceptions",
            ],
        },
        SectionTemplate {
            subheading: "Why It Matters",
            bullets: [
                "Real-world applications",
                "Who benefits and how",
                "Limitations to keep in mind",
            ],
        },
        SectionTemplate {
            subheading: "Going Further",
            bullets: [
                "Related concepts",
                "Questions worth exploring",
                "Resources for deeper study",
            ],
        },
    ],
    ctas: [
        CtaTemplate {
            after: 1,
            text: "Now that you know how {topic} works, see why it matters.",
        },
        CtaTemplate {
            after: 2,
            text: "Share this explainer with someone who is curious.",
        },
        CtaTemplate {
            after: 3,
            text: "Keep learning with the resources above!",
        },
    ],
};

static GENERAL_FRAGMENTS: FragmentSet = FragmentSet {
    heading: "{subject}: Essential Guide",
    strip_how_to: false,
    keyword_rule: KeywordRule::ReplaceAfterColon,
    sections: [
        SectionTemplate {
            subheading: "Introduction and Overview",
            bullets: [
                "Understanding {topic}",
                "Why this topic matters",
                "What you will learn",
            ],
        },
        SectionTemplate {
            subheading: "Key Components",
            bullets: [
                "Main aspects and features",
                "How elements work together",
                "Critical success factors",
            ],
        },
        SectionTemplate {
            subheading: "Best Practices",
            bullets: [
                "Proven strategies",
                "Common pitfalls to avoid",
                "Expert tips",
            ],
        },
        SectionTemplate {
            subheading: "Next Steps",
            bullets: [
                "Emerging trends",
                "Future opportunities",
                "Resources for learning",
            ],
        },
    ],
    ctas: [
        CtaTemplate {
            after: 0,
            text: "Ready to master {topic}? Continue reading!",
        },
        CtaTemplate {
            after: 1,
            text: "Apply these strategies today for best results.",
        },
        CtaTemplate {
            after: 3,
            text: "Start implementing now!",
        },
    ],
};

fn fragments(article_type: ArticleType) -> &'static FragmentSet {
    match article_type {
        ArticleType::HowTo => &HOW_TO_FRAGMENTS,
        ArticleType::Listicle => &LISTICLE_FRAGMENTS,
        ArticleType::Explanatory => &EXPLANATORY_FRAGMENTS,
        ArticleType::General => &GENERAL_FRAGMENTS,
    }
}

static HOW_TO_PHRASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)how to").unwrap());

/// Word-wise title case: the first letter of every alphabetic run is upper-cased,
/// the rest lower-cased.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_is_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(ch);
            prev_is_alpha = false;
        }
    }
    out
}

fn fill(fragment: &str, topic: &str) -> String {
    fragment.replace("{topic}", topic)
}

fn build_heading(set: &FragmentSet, topic: &str, keyword: &str) -> String {
    let subject = if set.strip_how_to {
        HOW_TO_PHRASE.replace_all(topic, "").trim().to_string()
    } else {
        topic.trim().to_string()
    };
    let heading = set.heading.replace("{subject}", &title_case(&subject));

    let keyword = keyword.trim();
    if keyword.is_empty() {
        return heading;
    }

    match set.keyword_rule {
        KeywordRule::ReplaceAfterColon => {
            let prefix = heading.split(':').next().unwrap_or(&heading);
            format!("{}: {}", prefix, title_case(keyword))
        }
        KeywordRule::AppendQualifier => format!("{} | {}", heading, title_case(keyword)),
    }
}

/// Build a complete outline from the fixed fragments for the topic's type.
///
/// Never fails, and the result always satisfies
/// [`crate::parse::validate_outline`].
pub fn generate_template(topic: &str, keyword: &str) -> Outline {
    let article_type = classify(topic);
    let set = fragments(article_type);
    let topic = topic.trim();

    let sections = set
        .sections
        .iter()
        .map(|s| Section {
            subheading: fill(s.subheading, topic),
            bullets: s.bullets.iter().map(|b| fill(b, topic)).collect(),
        })
        .collect();

    let calls_to_action = set
        .ctas
        .iter()
        .map(|c| CallToAction {
            after_section_index: c.after,
            text: fill(c.text, topic),
        })
        .collect();

    Outline {
        heading: build_heading(set, topic, keyword),
        sections,
        calls_to_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::validate_outline;

    #[test]
    fn title_case_matches_word_runs() {
        assert_eq!(title_case("bake bread"), "Bake Bread");
        assert_eq!(title_case("10 best LAPTOPS"), "10 Best Laptops");
        assert_eq!(title_case("e-commerce tips"), "E-Commerce Tips");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn how_to_heading_strips_phrase() {
        let outline = generate_template("how to bake bread", "");
        assert_eq!(outline.heading, "How to Bake Bread: Complete Guide");
        assert_eq!(outline.sections[0].subheading, "Getting Started: Prerequisites");
    }

    #[test]
    fn keyword_replaces_text_after_colon() {
        let outline = generate_template("how to buy a phone", "phone guide 2024");
        assert_eq!(outline.heading, "How to Buy A Phone: Phone Guide 2024");

        let outline = generate_template("my garden", "raised beds");
        assert_eq!(outline.heading, "My Garden: Raised Beds");
    }

    #[test]
    fn listicle_keyword_is_appended() {
        let outline = generate_template("10 best laptops", "budget");
        assert_eq!(outline.heading, "10 Best Laptops: Ranked and Compared | Budget");
    }

    #[test]
    fn topic_is_interpolated_into_bullets_and_ctas() {
        let outline = generate_template("my garden", "");
        assert_eq!(outline.sections[0].bullets[0], "Understanding my garden");
        assert_eq!(
            outline.calls_to_action[0].text,
            "Ready to master my garden? Continue reading!"
        );
    }

    #[test]
    fn cta_indices_per_type() {
        let indices = |topic: &str| -> Vec<i64> {
            generate_template(topic, "")
                .calls_to_action
                .iter()
                .map(|c| c.after_section_index)
                .collect()
        };
        assert_eq!(indices("how to swim"), vec![0, 1, 3]);
        assert_eq!(indices("top 5 cameras"), vec![0, 2, 3]);
        assert_eq!(indices("what is entropy"), vec![1, 2, 3]);
        assert_eq!(indices("my garden"), vec![0, 1, 3]);
    }

    #[test]
    fn every_type_yields_valid_shape() {
        for topic in [
            "how to swim",
            "best pizza in town",
            "understanding tides",
            "garden",
            "",
            "   ",
            "Weird: topic: with colons",
        ] {
            for keyword in ["", "seo keyword"] {
                let outline = generate_template(topic, keyword);
                assert!(validate_outline(&outline), "{topic:?}/{keyword:?}");
                assert_eq!(outline.sections.len(), 4);
                assert!(outline.sections.iter().all(|s| s.bullets.len() == 3));
                assert_eq!(outline.calls_to_action.len(), 3);
            }
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            generate_template("what is entropy", "physics"),
            generate_template("what is entropy", "physics")
        );
    }
}
