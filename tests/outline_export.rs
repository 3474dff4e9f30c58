//! Template outlines through formatting and export.

use article_outline::export::{export_file_name, write_export};
use article_outline::parse::validate_outline;
use article_outline::{ArticleType, classify, format_outline, generate_template};

const TOPICS: &[&str] = &[
    "how to bake bread",
    "10 best laptops for students",
    "what is quantum computing",
    "my garden in spring",
];

#[test]
fn every_article_type_gets_a_valid_template() {
    let types: Vec<ArticleType> = TOPICS.iter().map(|t| classify(t)).collect();
    assert_eq!(
        types,
        vec![
            ArticleType::HowTo,
            ArticleType::Listicle,
            ArticleType::Explanatory,
            ArticleType::General,
        ]
    );

    for topic in TOPICS {
        let outline = generate_template(topic, "");
        assert!(validate_outline(&outline), "template for {topic} is invalid");
        assert!(
            outline
                .calls_to_action
                .iter()
                .all(|cta| usize::try_from(cta.after_section_index)
                    .is_ok_and(|i| i < outline.sections.len()))
        );
    }
}

#[test]
fn templates_are_deterministic() {
    for topic in TOPICS {
        assert_eq!(
            generate_template(topic, "budget"),
            generate_template(topic, "budget")
        );
        assert_eq!(
            format_outline(&generate_template(topic, "")),
            format_outline(&generate_template(topic, ""))
        );
    }
}

#[test]
fn keyword_changes_heading_only() {
    let plain = generate_template("how to bake bread", "");
    let keyed = generate_template("how to bake bread", "sourdough");
    assert_ne!(plain.heading, keyed.heading);
    assert!(keyed.heading.contains("Sourdough"));
    assert_eq!(plain.sections, keyed.sections);
}

#[tokio::test]
async fn export_writes_formatted_text() {
    let dir = std::env::temp_dir().join(format!("article-outline-test-{}", std::process::id()));
    let topic = "10 best laptops for students";
    let outline = generate_template(topic, "");

    let path = write_export(&dir, topic, &outline).await.unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        export_file_name(topic)
    );
    assert_eq!(
        export_file_name(topic),
        "10-best-laptops-for-students-outline.txt"
    );

    let written = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(written, format_outline(&outline));

    tokio::fs::remove_dir_all(&dir).await.ok();
}
