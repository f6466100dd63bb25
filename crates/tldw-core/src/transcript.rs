use std::time::Duration;

use crate::types::{TimedEntry, TranscriptEntry};

/// Annotate one entry with the offset at which it finishes.
///
/// An utterance counts as part of a chapter only once it has been fully
/// spoken, so the alignment key is the end, not the start.
pub fn normalize_entry(entry: &TranscriptEntry) -> TimedEntry {
    let end_offset = entry.start + entry.duration;
    // Negative or non-finite sums only come from broken caption data.
    let timestamp = Duration::try_from_secs_f64(end_offset).unwrap_or(Duration::ZERO);

    TimedEntry {
        start: entry.start,
        duration: entry.duration,
        text: entry.text.clone(),
        end_offset,
        timestamp,
    }
}

/// Normalize a whole transcript, keeping order and every entry.
pub fn normalize(entries: &[TranscriptEntry]) -> Vec<TimedEntry> {
    entries.iter().map(normalize_entry).collect()
}

/// Offset of the last spoken word, or zero for an empty transcript.
pub fn total_duration(transcript: &[TimedEntry]) -> Duration {
    transcript
        .last()
        .map(|entry| entry.timestamp)
        .unwrap_or(Duration::ZERO)
}
