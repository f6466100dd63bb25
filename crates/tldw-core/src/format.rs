use std::time::Duration;

use crate::types::{Section, SectionSource, VideoSummary};

/// Format an offset as HH:MM:SS
pub fn format_offset(offset: Duration) -> String {
    let total = offset.as_secs();
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Render a section as the user message for the chapter summarizer
pub fn format_section_for_prompt(section: &Section) -> String {
    format!(
        "Topic: {}\nStart: {}\n\n{}",
        section.topic,
        format_offset(section.start_offset),
        section.content
    )
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Format a finished summary as human-readable markdown
pub fn format_summary_readable(summary: &VideoSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", summary.title));

    let source = match summary.source {
        SectionSource::Outline => "creator outline",
        SectionSource::Synthetic => "synthetic chapters",
    };
    output.push_str(&format!(
        "**Channel:** {} | **Chapters:** {} ({})\n\n",
        summary.channel,
        summary.chapters.len(),
        source
    ));

    if let Some(unified) = &summary.unified {
        output.push_str("## Summary\n\n");
        output.push_str(unified.trim());
        output.push_str("\n\n");
    }

    for chapter in &summary.chapters {
        output.push_str(chapter.trim());
        output.push_str("\n\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_render_with_hours() {
        assert_eq!(format_offset(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_offset(Duration::from_secs(90)), "00:01:30");
        assert_eq!(format_offset(Duration::from_secs(3723)), "01:02:03");
        assert_eq!(format_offset(Duration::from_secs_f64(59.9)), "00:00:59");
    }

    #[test]
    fn section_prompt_carries_topic_and_start() {
        let section = Section {
            start_offset: Duration::from_secs(300),
            topic: "Main".to_string(),
            content: "hello there".to_string(),
        };
        assert_eq!(
            format_section_for_prompt(&section),
            "Topic: Main\nStart: 00:05:00\n\nhello there"
        );
    }

    #[test]
    fn readable_summary_puts_unified_first() {
        let summary = VideoSummary {
            title: "A talk".to_string(),
            channel: "Someone".to_string(),
            source: SectionSource::Synthetic,
            chapters: vec!["## 00:00:10 Start\n- a".to_string()],
            short_chapters: vec![],
            unified: Some("- overall".to_string()),
        };
        let text = format_summary_readable(&summary);
        assert!(text.starts_with("# A talk\n\n"));
        assert!(text.contains("**Chapters:** 1 (synthetic chapters)"));
        let unified_at = text.find("- overall").unwrap();
        let chapter_at = text.find("## 00:00:10 Start").unwrap();
        assert!(unified_at < chapter_at);
    }
}
