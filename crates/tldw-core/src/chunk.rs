use std::time::Duration;

use crate::{
    align::join_texts,
    transcript::total_duration,
    types::{Section, TimedEntry},
};

const MINUTE: u64 = 60;

/// Chunk length for a video of the given total length.
///
/// | total length | chunk  |
/// |--------------|--------|
/// | <= 15 min    | 3 min  |
/// | <= 45 min    | 5 min  |
/// | <= 90 min    | 10 min |
/// | longer       | 15 min |
pub fn chunk_length_for(total: Duration) -> Duration {
    let minutes = total.as_secs_f64() / 60.0;
    let chunk_minutes = if minutes <= 15.0 {
        3
    } else if minutes <= 45.0 {
        5
    } else if minutes <= 90.0 {
        10
    } else {
        15
    };
    Duration::from_secs(chunk_minutes * MINUTE)
}

/// Split a transcript with no outline into fixed-length chapters.
///
/// A chapter opens at the timestamp of its first entry and keeps taking
/// entries while they finish before `start + chunk_length`. Chapters are
/// labeled `Chapter 1`, `Chapter 2`, ... in order.
pub fn chunk_transcript(transcript: &[TimedEntry]) -> Vec<Section> {
    let Some(first) = transcript.first() else {
        return Vec::new();
    };
    let chunk_length = chunk_length_for(total_duration(transcript));

    let mut buckets: Vec<(Duration, Vec<&TimedEntry>)> = Vec::new();
    let mut current_start = first.timestamp;
    let mut current: Vec<&TimedEntry> = Vec::new();

    for entry in transcript {
        if entry.timestamp < current_start + chunk_length {
            current.push(entry);
        } else {
            buckets.push((current_start, std::mem::take(&mut current)));
            current_start = entry.timestamp;
            current.push(entry);
        }
    }
    buckets.push((current_start, current));

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, (start_offset, entries))| Section {
            start_offset,
            topic: format!("Chapter {}", index + 1),
            content: join_texts(entries.into_iter()),
        })
        .collect()
}
