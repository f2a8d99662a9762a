//! UI-agnostic view state: idle, loading, success, error.
//!
//! Every request gets a generation number. A finished request is only
//! applied when its generation is still the current one, so results that
//! arrive after a reset or a newer request are dropped on the floor.

use tracing::debug;

use crate::analysis::{validate_request, AnalysisResult};
use crate::error::{AnalysisError, StartError};
use crate::input::{InputCollector, UploadedImage};
use crate::technique::Technique;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything a background task needs to run one request.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub generation: u64,
    pub technique: Technique,
    pub problem: String,
    pub image: Option<UploadedImage>,
}

#[derive(Debug, Default)]
pub struct Session {
    state: ViewState,
    technique: Option<Technique>,
    result: Option<AnalysisResult>,
    error_message: Option<String>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn technique(&self) -> Option<Technique> {
        self.technique
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// idle → loading when `input` satisfies `technique`.
    pub fn start(
        &mut self,
        technique: Technique,
        input: &InputCollector,
    ) -> Result<RequestTicket, StartError> {
        if self.state == ViewState::Loading {
            return Err(StartError::Busy);
        }
        validate_request(input.problem_text(), technique, input.image())
            .map_err(StartError::Invalid)?;

        self.generation += 1;
        self.state = ViewState::Loading;
        self.technique = Some(technique);
        self.result = None;
        self.error_message = None;
        debug!(generation = self.generation, technique = technique.as_str(), "request started");

        Ok(RequestTicket {
            generation: self.generation,
            technique,
            problem: input.problem_text().to_string(),
            image: input.image().cloned(),
        })
    }

    /// Re-run the last technique with whatever the input holds now.
    pub fn retry(&mut self, input: &InputCollector) -> Result<RequestTicket, StartError> {
        match (self.state, self.technique) {
            (ViewState::Loading, _) => Err(StartError::Busy),
            (ViewState::Error | ViewState::Success, Some(technique)) => self.start(technique, input),
            _ => Err(StartError::NothingToRetry),
        }
    }

    /// Apply a finished request. Returns false when the outcome is stale.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        if generation != self.generation || self.state != ViewState::Loading {
            debug!(
                generation,
                current = self.generation,
                "ignoring superseded result"
            );
            return false;
        }

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.state = ViewState::Success;
            }
            Err(err) => {
                self.error_message = Some(err.to_string());
                self.state = ViewState::Error;
            }
        }
        true
    }

    /// Back to idle. Anything still in flight becomes stale.
    pub fn reset(&mut self) {
        if self.state == ViewState::Idle {
            return;
        }
        self.generation += 1;
        self.state = ViewState::Idle;
        self.technique = None;
        self.result = None;
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::input::ImageMime;

    fn input_with(text: &str) -> InputCollector {
        let mut input = InputCollector::new();
        input.set_problem_text(text);
        input
    }

    #[test]
    fn test_start_then_success_then_reset() {
        let mut session = Session::new();
        let input = input_with("sales dropped");

        let ticket = session.start(Technique::FiveWhys, &input).unwrap();
        assert_eq!(session.state(), ViewState::Loading);
        assert_eq!(ticket.problem, "sales dropped");

        let applied = session.complete(ticket.generation, Ok(AnalysisResult::Text("ok".into())));
        assert!(applied);
        assert_eq!(session.state(), ViewState::Success);
        assert_eq!(session.result(), Some(&AnalysisResult::Text("ok".into())));

        session.reset();
        assert_eq!(session.state(), ViewState::Idle);
        assert!(session.result().is_none());
        assert!(session.technique().is_none());
    }

    #[test]
    fn test_invalid_input_does_not_change_state() {
        let mut session = Session::new();
        let err = session.start(Technique::Triz, &input_with("  ")).unwrap_err();
        assert_eq!(err, StartError::Invalid(ValidationError::MissingProblem));
        assert_eq!(session.state(), ViewState::Idle);
        assert_eq!(session.generation(), 0);

        let err = session
            .start(Technique::VisualPrototyping, &input_with("retro"))
            .unwrap_err();
        assert_eq!(err, StartError::Invalid(ValidationError::MissingImage));
        assert_eq!(session.state(), ViewState::Idle);
    }

    #[test]
    fn test_error_then_retry_uses_latest_text() {
        let mut session = Session::new();
        let mut input = input_with("first draft");

        let ticket = session.start(Technique::Biomimicry, &input).unwrap();
        session.complete(ticket.generation, Err(AnalysisError::EmptyResponse));
        assert_eq!(session.state(), ViewState::Error);
        assert_eq!(session.error_message(), Some("No text returned from Gemini."));

        input.set_problem_text("edited after failure");
        let retried = session.retry(&input).unwrap();
        assert_eq!(session.state(), ViewState::Loading);
        assert_eq!(retried.technique, Technique::Biomimicry);
        assert_eq!(retried.problem, "edited after failure");
        assert!(retried.generation > ticket.generation);
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_cannot_start_while_loading() {
        let mut session = Session::new();
        let input = input_with("x");
        session.start(Technique::Sit, &input).unwrap();

        assert_eq!(session.start(Technique::Triz, &input).unwrap_err(), StartError::Busy);
        assert_eq!(session.retry(&input).unwrap_err(), StartError::Busy);
        assert_eq!(session.technique(), Some(Technique::Sit));
    }

    #[test]
    fn test_retry_from_idle_has_nothing_to_repeat() {
        let mut session = Session::new();
        assert_eq!(
            session.retry(&input_with("x")).unwrap_err(),
            StartError::NothingToRetry
        );
    }

    #[test]
    fn test_success_can_regenerate() {
        let mut session = Session::new();
        let input = input_with("x");
        let ticket = session.start(Technique::Synectics, &input).unwrap();
        session.complete(ticket.generation, Ok(AnalysisResult::Text("a".into())));

        let again = session.retry(&input).unwrap();
        assert_eq!(again.technique, Technique::Synectics);
        assert_eq!(session.state(), ViewState::Loading);
        assert!(session.result().is_none());
    }

    #[test]
    fn test_reset_twice_is_a_no_op() {
        let mut session = Session::new();
        let ticket = session.start(Technique::Triz, &input_with("x")).unwrap();
        session.complete(ticket.generation, Ok(AnalysisResult::Text("a".into())));

        session.reset();
        let generation = session.generation();
        session.reset();
        assert_eq!(session.state(), ViewState::Idle);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn test_result_after_reset_is_ignored() {
        let mut session = Session::new();
        let ticket = session.start(Technique::Triz, &input_with("x")).unwrap();
        session.reset();

        let applied = session.complete(ticket.generation, Ok(AnalysisResult::Text("late".into())));
        assert!(!applied);
        assert_eq!(session.state(), ViewState::Idle);
        assert!(session.result().is_none());
    }

    #[test]
    fn test_result_of_superseded_request_is_ignored() {
        let mut session = Session::new();
        let input = input_with("x");
        let old = session.start(Technique::Triz, &input).unwrap();
        session.reset();
        let new = session.start(Technique::Scamper, &input).unwrap();

        assert!(!session.complete(old.generation, Ok(AnalysisResult::Text("old".into()))));
        assert_eq!(session.state(), ViewState::Loading);

        assert!(session.complete(new.generation, Ok(AnalysisResult::Text("new".into()))));
        assert_eq!(session.result(), Some(&AnalysisResult::Text("new".into())));
    }

    #[test]
    fn test_ticket_carries_attached_image() {
        let mut session = Session::new();
        let mut input = input_with("");
        input.set_image(Some(UploadedImage::new("a.webp", ImageMime::Webp, vec![1, 2])));

        let ticket = session.start(Technique::VisualPrototyping, &input).unwrap();
        assert_eq!(ticket.image.map(|i| i.name), Some("a.webp".to_string()));
    }
}
