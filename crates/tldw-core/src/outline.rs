use std::time::Duration;

use serde_json::Value;

use crate::{
    error::OutlineError,
    types::{OutlineEntry, RawOutlineEntry},
};

/// What the outline extraction call made of a video description.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineExtraction {
    Found(Vec<RawOutlineEntry>),
    NotFound { reason: String },
}

impl OutlineExtraction {
    fn not_found(reason: impl Into<String>) -> Self {
        OutlineExtraction::NotFound {
            reason: reason.into(),
        }
    }
}

/// Parse `MM:SS` or `HH:MM:SS` into an offset.
///
/// Components are not range checked: `"00:90"` is a valid minute and a half.
pub fn parse_timestamp(raw: &str) -> Result<Duration, OutlineError> {
    let malformed = || OutlineError::MalformedTimestamp(raw.to_string());

    let parts = raw
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(malformed()),
    };

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .map(Duration::from_secs)
        .ok_or_else(malformed)
}

/// Turn the raw outline into offsets, rejecting anything that would make
/// the alignment intervals overlap or invert.
pub fn parse_outline(raw: &[RawOutlineEntry]) -> Result<Vec<OutlineEntry>, OutlineError> {
    let mut outline: Vec<OutlineEntry> = Vec::with_capacity(raw.len());

    for item in raw {
        let offset = parse_timestamp(&item.timestamp)?;
        if let Some(previous) = outline.last() {
            if offset <= previous.offset {
                return Err(OutlineError::UnorderedOffsets {
                    previous: previous.offset,
                    next: offset,
                });
            }
        }
        outline.push(OutlineEntry {
            offset,
            topic: item.topic.trim().to_string(),
        });
    }

    Ok(outline)
}

/// Interpret the extraction model's reply.
///
/// The model is asked for `{"timestamps": [{"timestamp", "topic"}, ...]}` and
/// to put a sentence in `timestamps` when there is no outline. Anything else
/// is treated the same as "no outline".
pub fn parse_extraction_reply(reply: &str) -> OutlineExtraction {
    let cleaned: String = strip_code_fence(reply.trim())
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect();

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => return OutlineExtraction::not_found(format!("reply is not JSON: {e}")),
    };

    match value.get("timestamps") {
        None => OutlineExtraction::not_found("reply has no timestamps key"),
        Some(Value::String(sentinel)) => OutlineExtraction::not_found(sentinel.clone()),
        Some(Value::Array(items)) if items.is_empty() => {
            OutlineExtraction::not_found("timestamps list is empty")
        }
        Some(Value::Array(items)) => {
            match serde_json::from_value::<Vec<RawOutlineEntry>>(Value::Array(items.clone())) {
                Ok(entries) => OutlineExtraction::Found(entries),
                Err(e) => OutlineExtraction::not_found(
                    OutlineError::MalformedOutline {
                        reason: e.to_string(),
                    }
                    .to_string(),
                ),
            }
        }
        Some(other) => OutlineExtraction::not_found(
            OutlineError::MalformedOutline {
                reason: format!("timestamps is {other}"),
            }
            .to_string(),
        ),
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let Some(rest) = reply.strip_prefix("```") else {
        return reply;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
