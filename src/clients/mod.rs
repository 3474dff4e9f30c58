pub mod huggingface;
pub mod traits;

pub use huggingface::HuggingFaceClient;
pub use traits::{FailureKind, InferenceBackend, InferenceError, InferenceRequest};
