//! tldw Core Library
//!
//! Turns a YouTube video's transcript into chaptered summaries: the transcript
//! is split along the creator's outline when the description has one, or into
//! fixed-length chapters sized by the video's length otherwise.

pub mod align;
pub mod cache;
pub mod chunk;
pub mod error;
pub mod format;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod provider;
pub mod source;
pub mod summarizer;
pub mod transcript;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use align::align_to_outline;
pub use cache::{get_cache_dir, get_root_cache_dir};
pub use chunk::{chunk_length_for, chunk_transcript};
pub use error::{OutlineError, Result, TldwError};
pub use format::{format_offset, format_summary_readable};
pub use outline::{OutlineExtraction, parse_extraction_reply, parse_outline, parse_timestamp};
pub use output::{Artifacts, write_artifacts};
pub use pipeline::{Pipeline, PipelineConfig, RunOutcome, SummaryStep, plan_from_extraction};
pub use provider::{Provider, ProviderConfig};
pub use source::{MetadataSource, TranscriptSource};
pub use summarizer::{ChatSummarizer, Summarizer};
pub use transcript::normalize;
pub use types::{
    OutlineEntry, RawOutlineEntry, Section, SectionPlan, SectionSource, TimedEntry,
    TranscriptEntry, Video, VideoMetadata, VideoSummary,
};
pub use youtube::{YoutubeClient, video_id_from_url};
