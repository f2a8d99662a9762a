//! Turns a technique plus user input into a Gemini request and normalizes
//! whatever comes back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ai::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GenerativeClient,
    Part,
};
use crate::error::{AnalysisError, ValidationError};
use crate::fanout::gather_ordered;
use crate::input::UploadedImage;
use crate::technique::Technique;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Number of image variations requested for visual prototyping.
pub const VARIATION_COUNT: usize = 4;
pub const TEXT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_EDIT_INSTRUCTION: &str = "Enhance this image";
pub const SYSTEM_INSTRUCTION: &str = "You are a world-class innovation consultant. Your output should be structured, practical, and formatted in clean Markdown. Use bold headings and bullet points for readability.";

const FALLBACK_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// Markdown document
    Text(String),
    /// Image data URIs in request order
    Images(Vec<String>),
}

impl AnalysisResult {
    pub fn is_images(&self) -> bool {
        matches!(self, AnalysisResult::Images(_))
    }
}

/// A variation that was dropped without failing the whole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailure {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct VariationReport {
    pub images: Vec<String>,
    pub soft_failures: Vec<SoftFailure>,
}

/// Check the inputs a technique needs before anything is sent.
pub fn validate_request(
    problem: &str,
    technique: Technique,
    image: Option<&UploadedImage>,
) -> Result<(), ValidationError> {
    if technique.produces_images() {
        if image.is_none() {
            return Err(ValidationError::MissingImage);
        }
    } else if problem.trim().is_empty() {
        return Err(ValidationError::MissingProblem);
    }
    Ok(())
}

pub fn data_uri(mime_type: &str, data: &str) -> String {
    let mime = if mime_type.is_empty() {
        FALLBACK_IMAGE_MIME
    } else {
        mime_type
    };
    format!("data:{};base64,{}", mime, data)
}

#[derive(Clone)]
pub struct Analyzer {
    client: Arc<dyn GenerativeClient>,
    text_model: String,
    image_model: String,
}

impl Analyzer {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self {
            client,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_models(mut self, text_model: &str, image_model: &str) -> Self {
        self.text_model = text_model.to_string();
        self.image_model = image_model.to_string();
        self
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    pub async fn run_analysis(
        &self,
        problem: &str,
        technique: Technique,
        image: Option<&UploadedImage>,
    ) -> Result<AnalysisResult, AnalysisError> {
        validate_request(problem, technique, image)?;

        match (technique.produces_images(), image) {
            (true, Some(image)) => {
                let report = self.generate_variations(problem, image).await;
                if report.images.is_empty() {
                    return Err(AnalysisError::NoImagesGenerated);
                }
                Ok(AnalysisResult::Images(report.images))
            }
            _ => self
                .generate_text(problem, technique)
                .await
                .map(AnalysisResult::Text),
        }
    }

    pub fn text_request(problem: &str, technique: Technique) -> GenerateContentRequest {
        let prompt = technique.definition().fill(problem);
        GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(TEXT_TEMPERATURE),
            }),
        }
    }

    pub fn image_edit_request(problem: &str, image: &UploadedImage) -> GenerateContentRequest {
        let instruction = if problem.trim().is_empty() {
            DEFAULT_EDIT_INSTRUCTION
        } else {
            problem
        };
        GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(image.mime.as_str(), image.to_base64()),
                Part::text(instruction),
            ])],
            system_instruction: None,
            generation_config: None,
        }
    }

    async fn generate_text(
        &self,
        problem: &str,
        technique: Technique,
    ) -> Result<String, AnalysisError> {
        let request = Self::text_request(problem, technique);
        info!(technique = technique.as_str(), model = %self.text_model, "requesting analysis");

        let response = self
            .client
            .generate_content(&self.text_model, &request)
            .await
            .map_err(|err| {
                warn!(technique = technique.as_str(), "analysis request failed: {:#}", err);
                AnalysisError::upstream(err)
            })?;

        response.text().ok_or(AnalysisError::EmptyResponse)
    }

    /// Request `VARIATION_COUNT` edits of `image` at once and keep every
    /// variation that came back with an image.
    pub async fn generate_variations(&self, problem: &str, image: &UploadedImage) -> VariationReport {
        let request = Self::image_edit_request(problem, image);
        info!(model = %self.image_model, count = VARIATION_COUNT, "requesting image variations");

        let request = &request;
        let gathered = gather_ordered(VARIATION_COUNT, |index| async move {
            let response: GenerateContentResponse =
                match self.client.generate_content(&self.image_model, request).await {
                    Ok(response) => response,
                    Err(err) => return Err(format!("{:#}", err)),
                };

            response
                .first_inline_image()
                .map(|inline| data_uri(&inline.mime_type, &inline.data))
                .ok_or_else(|| format!("variation {} came back without an image", index + 1))
        })
        .await;

        if gathered.is_total_failure() {
            warn!(count = VARIATION_COUNT, "no image variation succeeded");
        }

        let soft_failures: Vec<SoftFailure> = gathered
            .failures
            .into_iter()
            .map(|(index, reason)| {
                warn!(variation = index + 1, "image variation dropped: {}", reason);
                SoftFailure { index, reason }
            })
            .collect();

        debug!(
            collected = gathered.successes.len(),
            dropped = soft_failures.len(),
            "image variations settled"
        );

        VariationReport {
            images: gathered.successes,
            soft_failures,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::input::ImageMime;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted stand-in for Gemini. Replies are handed out in call order.
    pub(crate) struct FakeClient {
        replies: Mutex<Vec<Result<GenerateContentResponse>>>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<(String, GenerateContentRequest)>>,
    }

    impl FakeClient {
        pub(crate) fn new(replies: Vec<Result<GenerateContentResponse>>) -> Arc<Self> {
            let mut replies = replies;
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerativeClient for FakeClient {
        async fn generate_content(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((model.to_string(), request.clone()));
            let reply = self.replies.lock().unwrap().pop();
            reply.unwrap_or_else(|| Err(anyhow!("no scripted reply")))
        }
    }

    pub(crate) fn text_reply(text: &str) -> Result<GenerateContentResponse> {
        Ok(serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        }))
        .unwrap())
    }

    pub(crate) fn image_reply(data: &str) -> Result<GenerateContentResponse> {
        Ok(serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is your edit"},
                {"inlineData": {"mimeType": "image/png", "data": data}}
            ]}}]
        }))
        .unwrap())
    }

    fn photo() -> UploadedImage {
        UploadedImage::new("room.png", ImageMime::Png, b"pixels".to_vec())
    }

    #[tokio::test]
    async fn test_text_technique_returns_markdown() {
        let fake = FakeClient::new(vec![text_reply("## Root cause\nBudget cuts")]);
        let analyzer = Analyzer::new(fake.clone());

        let result = analyzer
            .run_analysis("sales dropped", Technique::FiveWhys, None)
            .await
            .unwrap();

        assert_eq!(result, AnalysisResult::Text("## Root cause\nBudget cuts".into()));
        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, DEFAULT_TEXT_MODEL);
        let request = &seen[0].1;
        assert_eq!(
            request.contents[0].parts[0],
            Part::text(Technique::FiveWhys.definition().fill("sales dropped"))
        );
        assert_eq!(request.generation_config.as_ref().unwrap().temperature, Some(0.8));
        assert!(request.system_instruction.is_some());
    }

    #[tokio::test]
    async fn test_empty_problem_is_rejected_before_dispatch() {
        for technique in Technique::all().into_iter().filter(|t| !t.produces_images()) {
            let fake = FakeClient::new(vec![]);
            let analyzer = Analyzer::new(fake.clone());

            let err = analyzer.run_analysis("   ", technique, None).await.unwrap_err();
            assert!(matches!(
                err,
                AnalysisError::Validation(ValidationError::MissingProblem)
            ));
            assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_visual_prototyping_without_image_is_rejected_before_dispatch() {
        let fake = FakeClient::new(vec![]);
        let analyzer = Analyzer::new(fake.clone());

        let err = analyzer
            .run_analysis("add a retro filter", Technique::VisualPrototyping, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::MissingImage)
        ));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_text_without_content_is_empty_response() {
        let empty = Ok(GenerateContentResponse::default());
        let analyzer = Analyzer::new(FakeClient::new(vec![empty]));

        let err = analyzer
            .run_analysis("too much email", Technique::Triz, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        let analyzer = Analyzer::new(FakeClient::new(vec![Err(anyhow!(
            "Gemini API error 403 Forbidden: API key not valid"
        ))]));

        let err = analyzer
            .run_analysis("too much email", Technique::Scamper, None)
            .await
            .unwrap_err();
        match err {
            AnalysisError::Upstream(msg) => assert!(msg.contains("403")),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_two_of_four_variations_succeed() {
        let fake = FakeClient::new(vec![
            image_reply("b25l"),
            Err(anyhow!("quota exceeded")),
            text_reply("I can't draw that"),
            image_reply("Zm91cg=="),
        ]);
        let analyzer = Analyzer::new(fake.clone());

        let report = analyzer.generate_variations("make it blue", &photo()).await;
        assert_eq!(
            report.images,
            vec![
                "data:image/png;base64,b25l".to_string(),
                "data:image/png;base64,Zm91cg==".to_string(),
            ]
        );
        assert_eq!(report.soft_failures.len(), 2);
        assert_eq!(fake.calls.load(Ordering::SeqCst), VARIATION_COUNT);

        let result = Analyzer::new(FakeClient::new(vec![
            image_reply("b25l"),
            Err(anyhow!("quota exceeded")),
            text_reply("I can't draw that"),
            image_reply("Zm91cg=="),
        ]))
        .run_analysis("make it blue", Technique::VisualPrototyping, Some(&photo()))
        .await
        .unwrap();
        assert_eq!(
            result,
            AnalysisResult::Images(vec![
                "data:image/png;base64,b25l".to_string(),
                "data:image/png;base64,Zm91cg==".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_no_variations_is_no_images_generated() {
        let fake = FakeClient::new(vec![
            Err(anyhow!("timeout")),
            text_reply("refused"),
            Ok(GenerateContentResponse::default()),
            Err(anyhow!("500")),
        ]);
        let analyzer = Analyzer::new(fake.clone());

        let err = analyzer
            .run_analysis("", Technique::VisualPrototyping, Some(&photo()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NoImagesGenerated));
        assert_eq!(fake.calls.load(Ordering::SeqCst), VARIATION_COUNT);
    }

    /// Replies with an image whose payload names the call, finishing in
    /// reverse call order.
    struct SlowFirstClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerativeClient for SlowFirstClient {
        async fn generate_content(
            &self,
            _model: &str,
            _request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(60 - 15 * call as u64)).await;
            image_reply(&format!("call{}", call))
        }
    }

    #[tokio::test]
    async fn test_variation_order_is_request_order() {
        let analyzer = Analyzer::new(Arc::new(SlowFirstClient {
            calls: AtomicUsize::new(0),
        }));

        let report = analyzer.generate_variations("", &photo()).await;
        assert_eq!(
            report.images,
            (0..4)
                .map(|i| format!("data:image/png;base64,call{}", i))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_image_edit_request_falls_back_to_default_instruction() {
        let request = Analyzer::image_edit_request("  ", &photo());
        let parts = &request.contents[0].parts;
        assert_eq!(parts[0], Part::inline("image/png", photo().to_base64()));
        assert_eq!(parts[1], Part::text(DEFAULT_EDIT_INSTRUCTION));

        let request = Analyzer::image_edit_request("add neon lights", &photo());
        assert_eq!(request.contents[0].parts[1], Part::text("add neon lights"));
    }

    #[test]
    fn test_data_uri_falls_back_to_png() {
        assert_eq!(data_uri("", "AAAA"), "data:image/png;base64,AAAA");
        assert_eq!(data_uri("image/webp", "AAAA"), "data:image/webp;base64,AAAA");
    }

    #[test]
    fn test_validate_request() {
        assert_eq!(
            validate_request("", Technique::Synectics, None),
            Err(ValidationError::MissingProblem)
        );
        assert_eq!(
            validate_request("anything", Technique::VisualPrototyping, None),
            Err(ValidationError::MissingImage)
        );
        assert_eq!(
            validate_request("", Technique::VisualPrototyping, Some(&photo())),
            Ok(())
        );
    }
}
