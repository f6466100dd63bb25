use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TldwError {
    #[error("Not a YouTube video URL or id: {input}")]
    InvalidUrl { input: String },

    #[error("Metadata unavailable for {url}: {reason}")]
    MetadataUnavailable { url: String, reason: String },

    #[error("Transcript unavailable for {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Outline rejected: {0}")]
    Outline(#[from] OutlineError),

    #[error("Summary generation failed during {stage}: {reason}")]
    SummaryFailed { stage: &'static str, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

/// Problems with an outline returned by the extraction call.
///
/// None of these are fatal to a run: the pipeline falls back to synthetic
/// chunking whenever it sees one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutlineError {
    #[error("Unexpected timestamp format: {0}")]
    MalformedTimestamp(String),

    #[error("Outline offsets are not strictly increasing ({previous:?} then {next:?})")]
    UnorderedOffsets { previous: Duration, next: Duration },

    #[error("Outline does not have the expected shape: {reason}")]
    MalformedOutline { reason: String },
}

pub type Result<T> = std::result::Result<T, TldwError>;
