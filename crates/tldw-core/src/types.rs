use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One caption line as delivered by the transcript provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// A transcript entry annotated with the offset at which it finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEntry {
    pub start: f64,
    pub duration: f64,
    pub text: String,
    /// `start + duration`, in seconds.
    pub end_offset: f64,
    /// Same instant as `end_offset`, used as the alignment key.
    pub timestamp: Duration,
}

/// Outline item exactly as the extraction call returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOutlineEntry {
    pub timestamp: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub offset: Duration,
    pub topic: String,
}

/// A contiguous, topic-labeled span of transcript text; the unit of summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub start_offset: Duration,
    pub topic: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSource {
    Outline,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub source: SectionSource,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub channel: String,
    pub description: String,
}

/// Everything known about one video before summarization starts.
#[derive(Debug, Clone)]
pub struct Video {
    pub id: String,
    pub url: String,
    pub metadata: VideoMetadata,
    pub transcript: Vec<TimedEntry>,
}

#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub title: String,
    pub channel: String,
    pub source: SectionSource,
    pub chapters: Vec<String>,
    pub short_chapters: Vec<String>,
    pub unified: Option<String>,
}
