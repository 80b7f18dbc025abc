//! Event block layout.
//!
//! Turns an ordered list of detection events into horizontally positioned,
//! vertically stacked blocks. One pixel on the timeline equals one second.
//! Every block's `position_x` carries the timeline offset (half the viewport
//! width) so that a marker fixed at the viewport center reads
//! `first_start + scroll_left` seconds.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use super::event::DetectionEvent;

/// Vertical distance between stacked lanes, in pixels.
pub const LANE_STEP: i32 = 10;

/// Errors returned when the input cannot be laid out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The event list was empty
    #[error("cannot lay out an empty event list")]
    NoEvents,

    /// A timestamp cannot be represented as a datetime
    #[error("event '{id}' has an out-of-range timestamp: {seconds}")]
    TimestampOutOfRange { id: String, seconds: i64 },
}

/// A laid-out, screen-positioned representation of one event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventBlock {
    /// Source event
    pub event: DetectionEvent,
    /// Start of the event
    pub start_time: DateTime<Utc>,
    /// End of the event ("now" at layout time for ongoing events)
    pub end_time: DateTime<Utc>,
    /// Position in the input order (0-based)
    pub index: usize,
    /// Seconds from the first event's start, plus the timeline offset
    pub position_x: i64,
    /// Duration in whole seconds
    pub width: i64,
    /// Vertical lane offset in pixels
    pub y_offset: i32,
}

impl EventBlock {
    /// Event identifier.
    pub fn id(&self) -> &str {
        &self.event.id
    }

    /// Returns true if `time` falls within `[start_time, end_time]`.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start_time <= time && time <= self.end_time
    }
}

/// Returns true if `current` starts before `previous` ends.
pub fn check_overlap(previous: &EventBlock, current: &EventBlock) -> bool {
    current.start_time < previous.end_time
}

/// Lay out `events` into blocks.
///
/// `events` must already be ordered by start time; this function neither
/// sorts nor checks the order. Ongoing events end at `now`, so repeated
/// calls with a different `now` produce different widths for them.
///
/// # Errors
/// Returns [`LayoutError::NoEvents`] for an empty slice and
/// [`LayoutError::TimestampOutOfRange`] for unrepresentable timestamps.
pub fn layout(
    events: &[DetectionEvent],
    timeline_offset: i64,
    now: DateTime<Utc>,
) -> Result<Vec<EventBlock>, LayoutError> {
    let first = events.first().ok_or(LayoutError::NoEvents)?;
    let origin = to_datetime(&first.id, first.start_time)?;

    let mut blocks: Vec<EventBlock> = Vec::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
        let start_time = to_datetime(&event.id, event.start_time)?;
        let end_time = match event.end_time {
            Some(seconds) => to_datetime(&event.id, seconds)?,
            None => now,
        };

        let mut block = EventBlock {
            event: event.clone(),
            start_time,
            end_time,
            index,
            position_x: whole_seconds(start_time - origin) + timeline_offset,
            width: whole_seconds(end_time - start_time),
            y_offset: 0,
        };
        block.y_offset = lane_offset(&blocks, &block);
        blocks.push(block);
    }

    Ok(blocks)
}

/// Walk backward from `current` through the run of adjacent overlapping
/// blocks, one lane step per link. Stops at the first block that does not
/// overlap its successor in the run.
fn lane_offset(placed: &[EventBlock], current: &EventBlock) -> i32 {
    let mut offset = 0;
    let mut later = current;
    for earlier in placed.iter().rev() {
        if !check_overlap(earlier, later) {
            break;
        }
        offset += LANE_STEP;
        later = earlier;
    }
    offset
}

fn to_datetime(id: &str, seconds: i64) -> Result<DateTime<Utc>, LayoutError> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| LayoutError::TimestampOutOfRange {
        id: id.to_string(),
        seconds,
    })
}

/// Absolute length of `delta`, rounded to whole seconds.
fn whole_seconds(delta: TimeDelta) -> i64 {
    (delta.num_milliseconds().unsigned_abs() as f64 / 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::DetectionLabel;

    fn closed(id: &str, label: DetectionLabel, start: i64, end: i64) -> DetectionEvent {
        DetectionEvent::new(id, label, start, Some(end))
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn test_single_event() {
        let events = [closed("1", DetectionLabel::Car, 1000, 1010)];
        let blocks = layout(&events, 50, at(2000)).unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].position_x, 50);
        assert_eq!(blocks[0].width, 10);
        assert_eq!(blocks[0].y_offset, 0);
        assert_eq!(blocks[0].index, 0);
    }

    #[test]
    fn test_overlapping_event_moves_down_one_lane() {
        let events = [
            closed("1", DetectionLabel::Car, 1000, 1020),
            closed("2", DetectionLabel::Person, 1010, 1015),
        ];
        let blocks = layout(&events, 0, at(2000)).unwrap();

        assert!(check_overlap(&blocks[0], &blocks[1]));
        assert_eq!(blocks[0].y_offset, 0);
        assert_eq!(blocks[1].y_offset, LANE_STEP);
        assert_eq!(blocks[1].position_x, 10);
    }

    #[test]
    fn test_non_overlapping_events_share_base_lane() {
        let events = [
            closed("1", DetectionLabel::Car, 1000, 1010),
            closed("2", DetectionLabel::Dog, 1010, 1030),
            closed("3", DetectionLabel::Person, 1100, 1101),
        ];
        let blocks = layout(&events, 0, at(2000)).unwrap();

        assert!(blocks.iter().all(|b| b.y_offset == 0));
        let positions: Vec<i64> = blocks.iter().map(|b| b.position_x).collect();
        assert_eq!(positions, vec![0, 10, 100]);
    }

    #[test]
    fn test_cluster_stacks_lanes() {
        let events = [
            closed("1", DetectionLabel::Car, 1000, 1100),
            closed("2", DetectionLabel::Person, 1010, 1090),
            closed("3", DetectionLabel::Dog, 1020, 1080),
            closed("4", DetectionLabel::Car, 1200, 1210),
        ];
        let blocks = layout(&events, 0, at(2000)).unwrap();
        let lanes: Vec<i32> = blocks.iter().map(|b| b.y_offset).collect();

        assert_eq!(lanes, vec![0, LANE_STEP, 2 * LANE_STEP, 0]);
    }

    #[test]
    fn test_adjacent_overlaps_never_share_a_lane() {
        // The third event overlaps the second but not the first.
        let events = [
            closed("1", DetectionLabel::Car, 1000, 1020),
            closed("2", DetectionLabel::Person, 1010, 1050),
            closed("3", DetectionLabel::Dog, 1030, 1040),
            closed("4", DetectionLabel::Dog, 1035, 1036),
        ];
        let blocks = layout(&events, 0, at(2000)).unwrap();

        for pair in blocks.windows(2) {
            if check_overlap(&pair[0], &pair[1]) {
                assert_ne!(pair[0].y_offset, pair[1].y_offset);
            }
        }
    }

    #[test]
    fn test_output_preserves_length_and_order() {
        let events: Vec<DetectionEvent> = (0..20)
            .map(|i| closed(&i.to_string(), DetectionLabel::Car, 1000 + i * 7, 1000 + i * 7 + 12))
            .collect();
        let blocks = layout(&events, 320, at(5000)).unwrap();

        assert_eq!(blocks.len(), events.len());
        for (i, (block, event)) in blocks.iter().zip(&events).enumerate() {
            assert_eq!(block.index, i);
            assert_eq!(block.event, *event);
        }
        assert!(blocks.windows(2).all(|p| p[0].position_x <= p[1].position_x));
    }

    #[test]
    fn test_ongoing_event_ends_now() {
        let events = [DetectionEvent::new("1", DetectionLabel::Person, 1000, None)];

        let first = layout(&events, 0, at(1030)).unwrap();
        let second = layout(&events, 0, at(1045)).unwrap();

        assert_eq!(first[0].end_time, at(1030));
        assert_eq!(first[0].width, 30);
        assert_eq!(second[0].width, 45);
    }

    #[test]
    fn test_closed_events_are_idempotent() {
        let events = [
            closed("1", DetectionLabel::Car, 1000, 1020),
            closed("2", DetectionLabel::Person, 1010, 1015),
        ];

        let first = layout(&events, 75, at(2000)).unwrap();
        let second = layout(&events, 75, at(9000)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_width_is_absolute_and_rounded() {
        let events = [closed("1", DetectionLabel::Car, 1010, 1000)];
        let blocks = layout(&events, 0, at(2000)).unwrap();
        assert_eq!(blocks[0].width, 10);

        let ongoing = [DetectionEvent::new("2", DetectionLabel::Dog, 1000, None)];
        let now = at(1004) + TimeDelta::milliseconds(600);
        let blocks = layout(&ongoing, 0, now).unwrap();
        assert_eq!(blocks[0].width, 5);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(layout(&[], 100, at(0)), Err(LayoutError::NoEvents));
    }

    #[test]
    fn test_out_of_range_timestamp_is_rejected() {
        let events = [closed("bad", DetectionLabel::Car, i64::MAX, i64::MAX)];
        assert!(matches!(
            layout(&events, 0, at(0)),
            Err(LayoutError::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let events = [closed("1", DetectionLabel::Car, 1000, 1010)];
        let block = &layout(&events, 0, at(2000)).unwrap()[0];

        assert!(block.contains(at(1000)));
        assert!(block.contains(at(1010)));
        assert!(!block.contains(at(1011)));
    }
}
