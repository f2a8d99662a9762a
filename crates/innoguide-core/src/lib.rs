pub mod ai;
pub mod analysis;
pub mod config;
pub mod error;
pub mod fanout;
pub mod input;
pub mod render;
pub mod session;
pub mod technique;

// Re-export main types for convenience
pub use ai::{GeminiClient, GenerativeClient};
pub use analysis::{AnalysisResult, Analyzer, SoftFailure, VariationReport};
pub use config::Config;
pub use error::{AnalysisError, InputError, StartError, ValidationError};
pub use input::{ImageMime, InputCollector, PreviewRef, UploadedImage};
pub use render::RenderPlan;
pub use session::{RequestTicket, Session, ViewState};
pub use technique::{Accent, Icon, Technique, TechniqueDef};
