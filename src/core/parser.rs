//! JSON parser for detection event files.
//!
//! An event file looks like:
//!
//! ```json
//! {
//!   "camera": "driveway",
//!   "events": [
//!     { "id": "1", "label": "car", "start_time": 1700000000, "end_time": 1700000012 },
//!     { "id": "2", "label": "person", "start_time": 1700000005 }
//!   ]
//! }
//! ```
//!
//! Events without `end_time` are ongoing.

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use super::event::{DetectionEvent, DetectionLabel};

/// Errors that can occur while parsing an event file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON syntax error
    #[error("Invalid JSON syntax: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    /// Label outside the known set
    #[error("Invalid label '{value}' for event '{id}': expected one of car, person, dog")]
    InvalidLabel { id: String, value: String },

    /// Event with an empty identifier
    #[error("Event at position {index} has an empty id")]
    EmptyId { index: usize },
}

// ============================================================================
// Intermediate JSON structures for deserialization
// ============================================================================

/// Top-level JSON structure of an event file.
#[derive(Debug, Deserialize)]
struct JsonEventFile {
    #[serde(default)]
    camera: Option<String>,
    events: Vec<JsonEvent>,
}

/// A single event in JSON format.
#[derive(Debug, Deserialize)]
struct JsonEvent {
    id: String,
    label: String,
    start_time: i64,
    #[serde(default)]
    end_time: Option<i64>,
}

/// Parsed event file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFile {
    /// Camera the events were recorded on
    pub camera: Option<String>,
    /// Events ordered by start time
    pub events: Vec<DetectionEvent>,
}

// ============================================================================
// Parser implementation
// ============================================================================

/// Parse a JSON string into an [`EventFile`].
///
/// Events are stably sorted by start time, since the timeline requires
/// chronological input.
pub fn parse_json(content: &str) -> Result<EventFile, ParseError> {
    let json: JsonEventFile = serde_json::from_str(content)?;

    let mut events = json
        .events
        .into_iter()
        .enumerate()
        .map(|(index, event)| convert_event(index, event))
        .collect::<Result<Vec<_>, _>>()?;

    if !events.windows(2).all(|w| w[0].start_time <= w[1].start_time) {
        debug!("event file not in chronological order, sorting");
        events.sort_by_key(|event| event.start_time);
    }

    Ok(EventFile {
        camera: json.camera,
        events,
    })
}

/// Convert a JSON event to a [`DetectionEvent`].
fn convert_event(index: usize, json: JsonEvent) -> Result<DetectionEvent, ParseError> {
    if json.id.trim().is_empty() {
        return Err(ParseError::EmptyId { index });
    }

    let label = DetectionLabel::from_name(&json.label.to_ascii_lowercase()).ok_or_else(|| {
        ParseError::InvalidLabel {
            id: json.id.clone(),
            value: json.label.clone(),
        }
    })?;

    Ok(DetectionEvent::new(
        json.id,
        label,
        json.start_time,
        json.end_time,
    ))
}
