use async_trait::async_trait;

use crate::{
    error::Result,
    types::{TranscriptEntry, VideoMetadata},
};

/// Where title, channel and description come from.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, video_id: &str) -> Result<VideoMetadata>;
}

/// Where caption lines come from.
///
/// `languages` is in preference order; the first language with captions wins.
/// Implementations report any failure as `TldwError::TranscriptUnavailable`.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<TranscriptEntry>>;
}
