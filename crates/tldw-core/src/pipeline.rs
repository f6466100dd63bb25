use std::{future::Future, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{Instrument, Span, debug, info, warn};

use crate::{
    align::align_to_outline,
    cache::{get_cache_dir, get_metadata_path, get_transcript_path, load_json, save_json},
    chunk::{chunk_length_for, chunk_transcript},
    error::{Result, TldwError},
    format::{format_offset, word_count},
    outline::{OutlineExtraction, parse_outline},
    source::{MetadataSource, TranscriptSource},
    summarizer::Summarizer,
    transcript::{normalize, total_duration},
    types::{Section, SectionPlan, SectionSource, TimedEntry, Video, VideoSummary},
    youtube::{video_id_from_url, watch_url},
};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Caption languages in preference order.
    pub languages: Vec<String>,
    /// Run the minimal + unified summary pass after the chapter summaries.
    pub second_pass: bool,
    /// Root for per-video metadata/transcript caches; `None` disables caching.
    pub cache_root: Option<PathBuf>,
    /// Ignore cached files and fetch again.
    pub force: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            languages: vec!["de".to_string(), "en".to_string()],
            second_pass: true,
            cache_root: None,
            force: false,
        }
    }
}

/// How a run ended when nothing failed.
#[derive(Debug)]
pub enum RunOutcome {
    Summarized(VideoSummary),
    NoContent { title: String },
}

/// Reported while summaries are produced, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStep<'a> {
    Chapter {
        index: usize,
        total: usize,
        topic: &'a str,
    },
    Minimizing {
        index: usize,
        total: usize,
    },
    Unifying,
}

/// Drives one video from URL to summaries, one collaborator call at a time.
pub struct Pipeline {
    metadata: Box<dyn MetadataSource>,
    transcripts: Box<dyn TranscriptSource>,
    summarizer: Box<dyn Summarizer>,
    config: PipelineConfig,
    span: Span,
}

impl Pipeline {
    pub fn new(
        metadata: Box<dyn MetadataSource>,
        transcripts: Box<dyn TranscriptSource>,
        summarizer: Box<dyn Summarizer>,
        config: PipelineConfig,
        span: Span,
    ) -> Self {
        Self {
            metadata,
            transcripts,
            summarizer,
            config,
            span,
        }
    }

    /// Full run: fetch, partition, summarize.
    ///
    /// A video without a transcript is not an error; it ends as
    /// [`RunOutcome::NoContent`].
    pub async fn run(&self, input: &str) -> Result<RunOutcome> {
        let video = self.load_video(input).await?;
        let plan = self.plan_sections(&video).await;

        if plan.sections.is_empty() {
            return Ok(RunOutcome::NoContent {
                title: video.metadata.title,
            });
        }

        let summary = self.summarize(&video, &plan, |_| {}).await?;
        Ok(RunOutcome::Summarized(summary))
    }

    /// Resolve the video id, then gather metadata and the normalized transcript.
    ///
    /// A missing transcript degrades to an empty one.
    pub async fn load_video(&self, input: &str) -> Result<Video> {
        self.fetch_video(input)
            .instrument(self.span.clone())
            .await
    }

    /// Decide between the creator outline and synthetic chapters.
    ///
    /// Never fails: every outline problem falls back to synthetic chunking,
    /// and an empty transcript yields an empty plan without calling the model.
    pub async fn plan_sections(&self, video: &Video) -> SectionPlan {
        self.choose_sections(video)
            .instrument(self.span.clone())
            .await
    }

    /// Summarize every section in order, then optionally condense.
    ///
    /// Any model failure aborts the whole run.
    pub async fn summarize(
        &self,
        video: &Video,
        plan: &SectionPlan,
        on_step: impl FnMut(SummaryStep<'_>),
    ) -> Result<VideoSummary> {
        self.summarize_sections(video, plan, on_step)
            .instrument(self.span.clone())
            .await
    }

    async fn fetch_video(&self, input: &str) -> Result<Video> {
        let id = video_id_from_url(input)?;
        let cache_dir = self
            .config
            .cache_root
            .as_ref()
            .map(|root| get_cache_dir(root, &id));

        let metadata = self
            .cached(
                cache_dir.as_deref().map(get_metadata_path),
                self.metadata.fetch_metadata(&id),
            )
            .await?;
        info!(video_id = %id, title = %metadata.title, channel = %metadata.channel, "fetched metadata");

        let raw_transcript = match self
            .cached(
                cache_dir
                    .as_deref()
                    .map(|dir| get_transcript_path(dir, &self.config.languages)),
                self.transcripts.fetch_transcript(&id, &self.config.languages),
            )
            .await
        {
            Ok(entries) => entries,
            Err(e @ TldwError::TranscriptUnavailable { .. }) => {
                warn!("{e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let transcript = normalize(&raw_transcript);
        info!(
            entries = transcript.len(),
            duration = %format_offset(total_duration(&transcript)),
            "loaded transcript"
        );

        Ok(Video {
            url: watch_url(&id),
            id,
            metadata,
            transcript,
        })
    }

    async fn choose_sections(&self, video: &Video) -> SectionPlan {
        if video.transcript.is_empty() {
            warn!("no transcript, nothing to partition");
            return SectionPlan {
                source: SectionSource::Synthetic,
                sections: Vec::new(),
            };
        }

        let extraction = if video.metadata.description.trim().is_empty() {
            OutlineExtraction::NotFound {
                reason: "description is empty".to_string(),
            }
        } else {
            match self
                .summarizer
                .extract_outline(&video.metadata.description)
                .await
            {
                Ok(extraction) => extraction,
                Err(e) => OutlineExtraction::NotFound {
                    reason: format!("outline extraction failed: {e}"),
                },
            }
        };

        plan_from_extraction(&video.transcript, &extraction)
    }

    async fn summarize_sections(
        &self,
        video: &Video,
        plan: &SectionPlan,
        mut on_step: impl FnMut(SummaryStep<'_>),
    ) -> Result<VideoSummary> {
        let total = plan.sections.len();
        let mut chapters = Vec::with_capacity(total);

        for (index, section) in plan.sections.iter().enumerate() {
            on_step(SummaryStep::Chapter {
                index,
                total,
                topic: &section.topic,
            });
            debug!(topic = %section.topic, start = %format_offset(section.start_offset), "summarizing section");
            chapters.push(self.summarizer.summarize_chapter(section).await?);
        }

        let (short_chapters, unified) = if self.config.second_pass {
            let mut short_chapters = Vec::with_capacity(chapters.len());
            for (index, chapter) in chapters.iter().enumerate() {
                on_step(SummaryStep::Minimizing { index, total });
                short_chapters.push(self.summarizer.minimize(chapter).await?);
            }

            on_step(SummaryStep::Unifying);
            let unified = self.summarizer.unify(&short_chapters.join("\n\n")).await?;
            (short_chapters, Some(unified))
        } else {
            (Vec::new(), None)
        };

        info!(chapters = chapters.len(), "summaries complete");

        Ok(VideoSummary {
            title: video.metadata.title.clone(),
            channel: video.metadata.channel.clone(),
            source: plan.source,
            chapters,
            short_chapters,
            unified,
        })
    }

    async fn cached<T, F>(&self, path: Option<PathBuf>, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T>>,
    {
        let Some(path) = path else {
            return fetch.await;
        };

        if !self.config.force && path.exists() {
            match load_json(&path).await {
                Ok(value) => {
                    debug!(path = %path.display(), "using cached copy");
                    return Ok(value);
                }
                Err(e) => warn!(path = %path.display(), "ignoring unreadable cache file: {e}"),
            }
        }

        let value = fetch.await?;
        if let Err(e) = save_json(&value, &path).await {
            warn!(path = %path.display(), "could not write cache file: {e}");
        }
        Ok(value)
    }
}

/// Pick the partitioning for a non-empty transcript given the extraction result.
pub fn plan_from_extraction(transcript: &[TimedEntry], extraction: &OutlineExtraction) -> SectionPlan {
    let outline = match extraction {
        OutlineExtraction::Found(raw) => match parse_outline(raw) {
            Ok(outline) if !outline.is_empty() => Some(outline),
            Ok(_) => None,
            Err(e) => {
                warn!("discarding outline: {e}");
                None
            }
        },
        OutlineExtraction::NotFound { reason } => {
            info!("no outline in description: {reason}");
            None
        }
    };

    let plan = match outline {
        Some(outline) => {
            info!(entries = outline.len(), "aligning transcript to outline");
            SectionPlan {
                source: SectionSource::Outline,
                sections: align_to_outline(transcript, &outline),
            }
        }
        None => {
            let chunk = chunk_length_for(total_duration(transcript));
            info!(chunk_minutes = chunk.as_secs() / 60, "creating synthetic chapters");
            SectionPlan {
                source: SectionSource::Synthetic,
                sections: chunk_transcript(transcript),
            }
        }
    };

    log_sections(&plan.sections);
    plan
}

fn log_sections(sections: &[Section]) {
    for section in sections {
        debug!(
            topic = %section.topic,
            start = %format_offset(section.start_offset),
            words = word_count(&section.content),
            "section"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawOutlineEntry, TranscriptEntry};

    fn transcript() -> Vec<TimedEntry> {
        let raw: Vec<_> = (0..60)
            .map(|i| TranscriptEntry {
                start: i as f64 * 10.0,
                duration: 10.0,
                text: format!("w{i}"),
            })
            .collect();
        normalize(&raw)
    }

    fn raw(timestamp: &str, topic: &str) -> RawOutlineEntry {
        RawOutlineEntry {
            timestamp: timestamp.to_string(),
            topic: topic.to_string(),
        }
    }

    #[test]
    fn valid_outline_uses_aligner() {
        let extraction = OutlineExtraction::Found(vec![raw("00:00", "Intro"), raw("05:00", "Main")]);
        let plan = plan_from_extraction(&transcript(), &extraction);

        assert_eq!(plan.source, SectionSource::Outline);
        let topics: Vec<_> = plan.sections.iter().map(|s| s.topic.as_str()).collect();
        assert_eq!(topics, vec!["Intro", "Main"]);
    }

    #[test]
    fn missing_outline_uses_chunker() {
        let extraction = OutlineExtraction::NotFound {
            reason: "No outline found in description.".to_string(),
        };
        let plan = plan_from_extraction(&transcript(), &extraction);

        assert_eq!(plan.source, SectionSource::Synthetic);
        assert_eq!(plan.sections[0].topic, "Chapter 1");
    }

    #[test]
    fn broken_outline_falls_back_to_chunker() {
        for entries in [
            vec![raw("00:00", "Intro"), raw("1-2-3-4", "Main")],
            vec![raw("05:00", "Late"), raw("00:00", "Early")],
            vec![],
        ] {
            let plan = plan_from_extraction(&transcript(), &OutlineExtraction::Found(entries));
            assert_eq!(plan.source, SectionSource::Synthetic);
            assert!(!plan.sections.is_empty());
        }
    }
}

