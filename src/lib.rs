pub mod classifier;
pub mod clients;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod generator;
pub mod http;
pub mod outline;
pub mod parse;
pub mod prompts;
pub mod sessions;
pub mod templates;

pub use classifier::{ArticleType, classify};
pub use format::format_outline;
pub use generator::{Generation, OutlineGenerator, OutlineSource};
pub use outline::{CallToAction, Outline, Section};
pub use parse::parse_response;
pub use prompts::build_prompt;
pub use templates::generate_template;
