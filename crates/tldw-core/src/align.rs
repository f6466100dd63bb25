use std::time::Duration;

use crate::types::{OutlineEntry, Section, TimedEntry};

pub const PREAMBLE_TOPIC: &str = "Preamble";

/// Project an outline onto a transcript.
///
/// Outline entry `i` owns every transcript entry whose timestamp lies in
/// `[offset_i, offset_{i+1})`; the last entry's interval is open-ended.
/// Entries that finish before the first outline offset are gathered into a
/// leading "Preamble" section instead of being lost.
///
/// The outline must be sorted by strictly increasing offset
/// (see [`crate::outline::parse_outline`]). An empty outline yields no
/// sections.
pub fn align_to_outline(transcript: &[TimedEntry], outline: &[OutlineEntry]) -> Vec<Section> {
    let Some(first) = outline.first() else {
        return Vec::new();
    };

    let mut sections = Vec::with_capacity(outline.len() + 1);

    let preamble = join_texts(
        transcript
            .iter()
            .filter(|entry| entry.timestamp < first.offset),
    );
    if !preamble.is_empty() {
        sections.push(Section {
            start_offset: Duration::ZERO,
            topic: PREAMBLE_TOPIC.to_string(),
            content: preamble,
        });
    }

    for (position, item) in outline.iter().enumerate() {
        let end = outline.get(position + 1).map(|next| next.offset);
        let in_interval = |entry: &&TimedEntry| {
            entry.timestamp >= item.offset && end.is_none_or(|end| entry.timestamp < end)
        };

        sections.push(Section {
            start_offset: item.offset,
            topic: item.topic.clone(),
            content: join_texts(transcript.iter().filter(in_interval)),
        });
    }

    sections
}

pub(crate) fn join_texts<'a>(entries: impl Iterator<Item = &'a TimedEntry>) -> String {
    entries
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(end_secs: f64, text: &str) -> TimedEntry {
        TimedEntry {
            start: end_secs - 1.0,
            duration: 1.0,
            text: text.to_string(),
            end_offset: end_secs,
            timestamp: Duration::from_secs_f64(end_secs),
        }
    }

    fn outline(offsets: &[(u64, &str)]) -> Vec<OutlineEntry> {
        offsets
            .iter()
            .map(|(secs, topic)| OutlineEntry {
                offset: Duration::from_secs(*secs),
                topic: topic.to_string(),
            })
            .collect()
    }

    #[test]
    fn entries_land_in_half_open_intervals() {
        let transcript = vec![
            timed(5.0, "a"),
            timed(59.9, "b"),
            timed(60.0, "c"),
            timed(119.0, "d"),
            timed(120.0, "e"),
            timed(4000.0, "f"),
        ];
        let sections = align_to_outline(&transcript, &outline(&[(0, "A"), (60, "B"), (120, "C")]));

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].content, "a b");
        assert_eq!(sections[1].content, "c d");
        assert_eq!(sections[2].content, "e f");
        assert_eq!(sections[1].start_offset, Duration::from_secs(60));
        assert_eq!(sections[2].topic, "C");
    }

    #[test]
    fn boundary_entry_belongs_to_later_section() {
        let transcript = vec![timed(300.0, "exactly on the line")];
        let sections =
            align_to_outline(&transcript, &outline(&[(1, "Intro"), (300, "Main"), (600, "End")]));

        assert_eq!(sections[0].content, "");
        assert_eq!(sections[1].content, "exactly on the line");
        assert_eq!(sections[2].content, "");
    }

    #[test]
    fn entries_before_first_offset_become_preamble() {
        let transcript = vec![timed(0.5, "hello"), timed(0.9, "all"), timed(2.0, "welcome")];
        let sections = align_to_outline(&transcript, &outline(&[(1, "Intro")]));

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].topic, PREAMBLE_TOPIC);
        assert_eq!(sections[0].start_offset, Duration::ZERO);
        assert_eq!(sections[0].content, "hello all");
        assert_eq!(sections[1].content, "welcome");
    }

    #[test]
    fn every_entry_is_assigned_once() {
        let transcript: Vec<_> = (1..=50).map(|i| timed(i as f64 * 7.3, &i.to_string())).collect();
        let sections =
            align_to_outline(&transcript, &outline(&[(30, "A"), (100, "B"), (101, "C"), (250, "D")]));

        let assigned: Vec<String> = sections
            .iter()
            .flat_map(|s| s.content.split_whitespace().map(str::to_string))
            .collect();
        let expected: Vec<String> = (1..=50).map(|i| i.to_string()).collect();
        assert_eq!(assigned, expected);
    }

    #[test]
    fn empty_inputs() {
        assert!(align_to_outline(&[timed(1.0, "x")], &[]).is_empty());

        let sections = align_to_outline(&[], &outline(&[(0, "A"), (10, "B")]));
        assert_eq!(sections.len(), 2);
        assert!(sections.iter().all(|s| s.content.is_empty()));
    }
}
