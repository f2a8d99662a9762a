use thiserror::Error;

/// Missing input, caught before anything is sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a problem description first.")]
    MissingProblem,
    #[error("Please attach an image for Visual Prototyping.")]
    MissingImage,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Gemini request failed: {0}")]
    Upstream(String),
    #[error("No text returned from Gemini.")]
    EmptyResponse,
    #[error("Failed to generate any images. Please try again.")]
    NoImagesGenerated,
}

impl AnalysisError {
    pub fn upstream(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        AnalysisError::Upstream(format!("{:#}", err))
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unsupported image type '{0}' (expected png, jpeg or webp)")]
    UnsupportedImageType(String),
    #[error("could not read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a request could not be started. The view state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error(transparent)]
    Invalid(ValidationError),
    #[error("An analysis is already running.")]
    Busy,
    #[error("Choose a technique first.")]
    NothingToRetry,
}
