//! Scroll marker controller.
//!
//! Owns the mapping between the viewport's scroll position and the marker
//! time shown at the viewport center, decides which block is the current
//! event, and keeps its own programmatic scrolls from being read back as
//! user input.
//!
//! Scroll position and time share one scale: one pixel is one second, so
//! `marker_time = first_block.start_time + scroll_left` seconds.
//!
//! The controller never runs anything in the background. The host calls
//! [`ScrollMarkerController::tick`] from its update loop, which advances the
//! scroll animation and fires due timers, and collects notifications with
//! [`ScrollMarkerController::drain_changes`].

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, trace};
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::layout::EventBlock;
use super::timer::DeadlineTimer;
use super::viewport::{DEFAULT_SCROLL_ANIMATION, ScrollViewport};

/// Scroll inactivity after which a user scroll counts as settled.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Time during which scroll events are ignored after a programmatic scroll.
/// Must exceed the scroll animation duration.
pub const DEFAULT_QUIESCENT_WINDOW: Duration = Duration::from_millis(150);

/// Timing parameters of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerTiming {
    /// Debounce window for settling a user scroll
    pub settle_delay: Duration,
    /// Scroll-event suppression window after a programmatic scroll
    pub quiescent_window: Duration,
    /// Duration of programmatic smooth scrolls
    pub scroll_animation: Duration,
}

impl Default for MarkerTiming {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            quiescent_window: DEFAULT_QUIESCENT_WINDOW,
            scroll_animation: DEFAULT_SCROLL_ANIMATION,
        }
    }
}

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    /// The viewport has not been measured yet
    Uninitialized,
    /// Measured and idle
    Ready,
    /// User scroll events are arriving; the settle timer is pending
    UserScrubbing,
    /// A programmatic scroll is in its quiescent window
    ProgrammaticScroll,
}

impl MarkerState {
    /// Short name for status display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "waiting for layout",
            Self::Ready => "ready",
            Self::UserScrubbing => "scrubbing",
            Self::ProgrammaticScroll => "seeking",
        }
    }
}

/// Notification sent to the host whenever the marker time or the current
/// event changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerChange {
    /// Current event after the change
    pub event: Option<EventBlock>,
    /// Marker time after the change
    pub marker_time: Option<DateTime<Utc>>,
    /// False while scrubbing, true once the scroll has settled
    pub seek_complete: bool,
}

/// State machine tying the viewport scroll position to the marker time and
/// the current event.
#[derive(Debug)]
pub struct ScrollMarkerController<C: Clock = SystemClock> {
    clock: C,
    timing: MarkerTiming,
    viewport: ScrollViewport,
    /// Half the viewport width; `None` until measured
    timeline_offset: Option<i64>,
    blocks: Vec<EventBlock>,
    marker_time: Option<DateTime<Utc>>,
    current_event: Option<EventBlock>,
    /// Whether scroll events are interpreted as user input
    scroll_enabled: bool,
    /// Host request to keep the timeline display-only
    marker_events_disabled: bool,
    settle_timer: DeadlineTimer,
    quiescent_timer: DeadlineTimer,
    changes: Vec<MarkerChange>,
}

impl<C: Clock> ScrollMarkerController<C> {
    /// Create a controller driven by `clock`.
    pub fn with_clock(clock: C, timing: MarkerTiming) -> Self {
        Self {
            clock,
            timing,
            viewport: ScrollViewport::new(timing.scroll_animation),
            timeline_offset: None,
            blocks: Vec::new(),
            marker_time: None,
            current_event: None,
            scroll_enabled: true,
            marker_events_disabled: false,
            settle_timer: DeadlineTimer::new(),
            quiescent_timer: DeadlineTimer::new(),
            changes: Vec::new(),
        }
    }

    /// The clock driving this controller.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current state.
    pub fn state(&self) -> MarkerState {
        if self.timeline_offset.is_none() {
            MarkerState::Uninitialized
        } else if self.quiescent_timer.is_pending() {
            MarkerState::ProgrammaticScroll
        } else if self.settle_timer.is_pending() {
            MarkerState::UserScrubbing
        } else {
            MarkerState::Ready
        }
    }

    /// Half the viewport width, once measured.
    pub fn timeline_offset(&self) -> Option<i64> {
        self.timeline_offset
    }

    /// Marker time, once a scroll has been interpreted.
    pub fn marker_time(&self) -> Option<DateTime<Utc>> {
        self.marker_time
    }

    /// The selected event.
    pub fn current_event(&self) -> Option<&EventBlock> {
        self.current_event.as_ref()
    }

    /// Whether scroll events are currently interpreted as user input.
    pub fn is_scroll_enabled(&self) -> bool {
        self.scroll_enabled
    }

    /// Laid-out blocks the controller resolves against.
    pub fn blocks(&self) -> &[EventBlock] {
        &self.blocks
    }

    /// The viewport handle.
    pub fn viewport(&self) -> &ScrollViewport {
        &self.viewport
    }

    /// Mutable viewport handle.
    pub fn viewport_mut(&mut self) -> &mut ScrollViewport {
        &mut self.viewport
    }

    /// Measure the viewport and derive the timeline offset from its width.
    ///
    /// Returns true if the offset changed, meaning the layout must be
    /// recomputed.
    pub fn measure_viewport(&mut self, width: f32) -> bool {
        if !width.is_finite() || width <= 0.0 {
            trace!("ignoring viewport measurement of {width}");
            return false;
        }

        self.viewport.set_width(width);
        let offset = (width / 2.0).round() as i64;
        if self.timeline_offset == Some(offset) {
            return false;
        }

        debug!("viewport measured at {width}px, timeline offset {offset}px");
        self.timeline_offset = Some(offset);
        true
    }

    /// Replace the laid-out blocks after a recompute.
    ///
    /// The current event is re-pointed at its counterpart in the new layout
    /// when one with the same id exists. Otherwise the selection and the
    /// marker time are cleared, since they refer to an event that is gone.
    pub fn set_blocks(&mut self, blocks: Vec<EventBlock>) {
        let offset = self.timeline_offset.unwrap_or(0);
        let content_end = blocks
            .iter()
            .map(|block| block.position_x + block.width)
            .max()
            .unwrap_or(0);
        self.viewport.set_content_width((content_end + offset) as f32);

        if let Some(current) = &self.current_event {
            match blocks.iter().find(|block| block.id() == current.id()) {
                Some(fresh) => self.current_event = Some(fresh.clone()),
                None => {
                    debug!("event '{}' left the timeline, clearing selection", current.id());
                    self.current_event = None;
                    self.marker_time = None;
                }
            }
        }

        self.blocks = blocks;
    }

    /// Keep the timeline display-only. While disabled, scroll events are
    /// never interpreted.
    pub fn set_marker_events_disabled(&mut self, disabled: bool) {
        self.marker_events_disabled = disabled;
        if disabled {
            self.scroll_enabled = false;
            self.settle_timer.cancel();
        } else if !self.quiescent_timer.is_pending() {
            self.scroll_enabled = true;
        }
    }

    /// Whether the host has made the timeline display-only.
    pub fn marker_events_disabled(&self) -> bool {
        self.marker_events_disabled
    }

    /// Smoothly scroll so that `block.position_x + extra_offset_secs` sits
    /// under the marker.
    ///
    /// Scroll events are ignored for the quiescent window that follows, so
    /// the animation is not mistaken for a user gesture.
    pub fn scroll_to(&mut self, block: &EventBlock, extra_offset_secs: i64) {
        let Some(offset) = self.timeline_offset else {
            debug!("scroll to '{}' deferred: viewport not measured", block.id());
            return;
        };

        let target = block.position_x + extra_offset_secs - offset;
        let now = self.clock.now();

        self.scroll_enabled = false;
        self.settle_timer.cancel();
        self.quiescent_timer
            .schedule(now, self.timing.quiescent_window);

        debug!(
            "programmatic scroll to {target}px (event '{}', +{extra_offset_secs}s)",
            block.id()
        );
        self.viewport.scroll_smooth_to(target as f32, now);
    }

    /// Seek `offset_secs` into the current event.
    ///
    /// Returns false when there is no current event to seek within.
    pub fn scroll_to_offset_within_current_event(&mut self, offset_secs: i64) -> bool {
        let Some(current) = self.current_event.clone() else {
            debug!("seek by {offset_secs}s ignored: no current event");
            return false;
        };
        self.scroll_to(&current, offset_secs);
        true
    }

    /// Scroll to the block at `index` and make it the current event.
    ///
    /// Emits a settled notification. Returns false if `index` is out of range.
    pub fn focus_block(&mut self, index: usize) -> bool {
        let Some(block) = self.blocks.get(index).cloned() else {
            return false;
        };

        self.scroll_to(&block, 0);
        self.marker_time = Some(block.start_time);
        self.current_event = Some(block);
        self.emit(true);
        true
    }

    /// Record a scroll position reported by the scroll area and deliver a
    /// scroll event if it moved.
    pub fn report_scroll(&mut self, scroll_left: f32) {
        if self.viewport.set_scroll_left(scroll_left) {
            self.on_viewport_scroll();
        }
    }

    /// Handle a scroll event.
    ///
    /// Ignored entirely while scroll interpretation is disabled. Otherwise
    /// updates the marker time, emits an in-flight notification and restarts
    /// the settle timer.
    pub fn on_viewport_scroll(&mut self) {
        if !self.scroll_enabled || self.timeline_offset.is_none() {
            trace!("scroll event ignored at {}px", self.viewport.scroll_left());
            return;
        }
        let Some(first) = self.blocks.first() else {
            return;
        };

        let seconds = self.viewport.scroll_left().round() as i64;
        self.marker_time = Some(first.start_time + TimeDelta::seconds(seconds));
        self.emit(false);
        self.settle_timer
            .schedule(self.clock.now(), self.timing.settle_delay);
    }

    /// Advance the scroll animation and fire due timers.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        if self.viewport.tick(now) {
            self.on_viewport_scroll();
        }

        if self.quiescent_timer.fire(now) {
            self.scroll_enabled = !self.marker_events_disabled;
            debug!("quiescent window over, scroll events enabled: {}", self.scroll_enabled);
        }

        if self.settle_timer.fire(now) {
            self.resolve_current_event();
        }
    }

    /// Time until the controller next needs a [`tick`](Self::tick), if any.
    pub fn next_tick_in(&self) -> Option<Duration> {
        if self.viewport.is_animating() {
            return Some(Duration::ZERO);
        }
        let now = self.clock.now();
        [
            self.settle_timer.remaining(now),
            self.quiescent_timer.remaining(now),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Take all notifications emitted since the last call.
    pub fn drain_changes(&mut self) -> Vec<MarkerChange> {
        std::mem::take(&mut self.changes)
    }

    /// Cancel pending timers and animation and drop undelivered notifications.
    pub fn teardown(&mut self) {
        self.settle_timer.cancel();
        self.quiescent_timer.cancel();
        self.viewport.stop_animation();
        self.changes.clear();
        self.scroll_enabled = !self.marker_events_disabled;
    }

    /// Pick the latest-started block containing the marker time.
    ///
    /// When none matches, the previous selection is kept.
    fn resolve_current_event(&mut self) {
        let Some(marker_time) = self.marker_time else {
            return;
        };

        match self
            .blocks
            .iter()
            .rev()
            .find(|block| block.contains(marker_time))
        {
            Some(block) => {
                debug!("scroll settled on event '{}'", block.id());
                self.current_event = Some(block.clone());
                self.emit(true);
            }
            None => {
                debug!("no event at {marker_time}, keeping current selection");
            }
        }
    }

    fn emit(&mut self, seek_complete: bool) {
        self.changes.push(MarkerChange {
            event: self.current_event.clone(),
            marker_time: self.marker_time,
            seek_complete,
        });
    }
}
