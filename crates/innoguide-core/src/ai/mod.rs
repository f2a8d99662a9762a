pub mod gemini;
pub mod types;

pub use gemini::GeminiClient;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part,
};

use anyhow::Result;
use async_trait::async_trait;

/// Anything that can answer a Gemini `generateContent` call.
///
/// The analysis code only talks to this trait so tests can swap in a fake.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}
