//! Detection event data structures.
//!
//! This module defines the raw events fed into the timeline: a labelled
//! detection with a start time and an optional end time (absent while the
//! detection is still ongoing).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Object class reported by the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionLabel {
    /// A vehicle sighting
    Car,
    /// A person sighting
    Person,
    /// A dog sighting
    Dog,
}

impl DetectionLabel {
    /// All labels in display order.
    pub const ALL: [DetectionLabel; 3] = [Self::Car, Self::Person, Self::Dog];

    /// Lower-case name as used in event files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Person => "person",
            Self::Dog => "dog",
        }
    }

    /// Parse a lower-case label name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == name)
    }
}

impl fmt::Display for DetectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detection as supplied by the host.
///
/// Times are epoch seconds. `end_time == None` means the detection is
/// ongoing and is treated as "now" whenever the timeline is laid out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Event identifier
    pub id: String,
    /// Detected object class
    pub label: DetectionLabel,
    /// Start of the detection (epoch seconds)
    pub start_time: i64,
    /// End of the detection (epoch seconds), absent while ongoing
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl DetectionEvent {
    /// Create a new event.
    pub fn new(
        id: impl Into<String>,
        label: DetectionLabel,
        start_time: i64,
        end_time: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            label,
            start_time,
            end_time,
        }
    }

    /// Returns true if the detection has not ended yet.
    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }
}
