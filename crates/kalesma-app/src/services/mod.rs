//! Clients for the generative AI service and the run orchestration on top of
//! them. Modules here coordinate external calls; pure transforms (encoding,
//! domain types, export) live in their own top-level modules.

pub mod extract;
pub mod orchestrator;
pub mod slides;
pub mod video;

pub use extract::{ExtractError, GeminiExtractor, TextExtraction};
pub use orchestrator::{
    GenerationRequest, Orchestrator, RunError, RunEvent, RunFailure, Stage,
};
pub use slides::{GeminiSlideGenerator, SlideError, SlideGeneration};
pub use video::{
    DEFAULT_POLL_INTERVAL, DEFAULT_VIDEO_TIMEOUT, GeminiVideoBackend, VideoBackend, VideoError,
    VideoGeneration, VideoGenerator, VideoJobState,
};
