//! The language-model collaborator contract.

#[cfg(feature = "http-llm")]
pub mod http;

#[cfg(feature = "http-llm")]
pub use http::HttpLanguageModel;

use crate::error::LlmError;

/// A synchronous language-model invocation capability.
///
/// One prompt in, one response out; no streaming, no retry. A failure here
/// is fatal for the in-flight question.
pub trait LanguageModel {
    fn invoke(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<T: LanguageModel + ?Sized> LanguageModel for std::sync::Arc<T> {
    fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        self.as_ref().invoke(prompt)
    }
}
