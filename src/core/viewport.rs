//! Scrollable viewport state.
//!
//! Mirrors the horizontal scroll position of the timeline's scroll area and
//! runs programmatic smooth scrolls. Every change of the scroll position,
//! whether it comes from the user or from an animation frame, is reported to
//! the caller as a scroll event; telling the two apart is the marker
//! controller's job.

use std::time::{Duration, Instant};

/// Default duration of a programmatic smooth scroll.
pub const DEFAULT_SCROLL_ANIMATION: Duration = Duration::from_millis(120);

/// An in-flight smooth scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollAnimation {
    from: f32,
    to: f32,
    started: Instant,
}

/// Horizontal scroll state of the timeline viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollViewport {
    /// Visible width in pixels
    width: f32,
    /// Total scrollable content width in pixels
    content_width: f32,
    /// Current left edge of the visible area in pixels
    scroll_left: f32,
    /// Running smooth scroll, if any
    animation: Option<ScrollAnimation>,
    /// Duration of smooth scrolls
    animation_duration: Duration,
    /// Set when the scroll position was changed programmatically and the
    /// scroll area has not picked it up yet
    needs_sync: bool,
}

impl Default for ScrollViewport {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_ANIMATION)
    }
}

impl ScrollViewport {
    /// Create a viewport whose smooth scrolls take `animation_duration`.
    pub fn new(animation_duration: Duration) -> Self {
        Self {
            width: 0.0,
            content_width: 0.0,
            scroll_left: 0.0,
            animation: None,
            animation_duration,
            needs_sync: false,
        }
    }

    /// Update the visible width.
    pub fn set_width(&mut self, width: f32) {
        self.width = width.max(0.0);
    }

    /// Update the scrollable content width.
    pub fn set_content_width(&mut self, content_width: f32) {
        self.content_width = content_width.max(0.0);
    }

    /// Total scrollable content width in pixels.
    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    /// Largest valid scroll position.
    pub fn max_scroll_left(&self) -> f32 {
        (self.content_width - self.width).max(0.0)
    }

    /// Current scroll position in pixels.
    pub fn scroll_left(&self) -> f32 {
        self.scroll_left
    }

    /// Returns true while a smooth scroll is running.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Record a scroll position reported by the scroll area.
    ///
    /// Interrupts any running animation, as a user gesture would. Returns
    /// true if the position changed.
    pub fn set_scroll_left(&mut self, scroll_left: f32) -> bool {
        let scroll_left = self.clamp(scroll_left);
        if (scroll_left - self.scroll_left).abs() < 0.5 {
            return false;
        }
        self.animation = None;
        self.scroll_left = scroll_left;
        true
    }

    /// Start a smooth scroll towards `target`.
    pub fn scroll_smooth_to(&mut self, target: f32, now: Instant) {
        let to = self.clamp(target);
        if self.animation_duration.is_zero() {
            self.jump_to(to);
            return;
        }
        self.animation = Some(ScrollAnimation {
            from: self.scroll_left,
            to,
            started: now,
        });
    }

    /// Move to `target` immediately. Returns true if the position changed.
    pub fn jump_to(&mut self, target: f32) -> bool {
        self.animation = None;
        let target = self.clamp(target);
        if target == self.scroll_left {
            return false;
        }
        self.scroll_left = target;
        self.needs_sync = true;
        true
    }

    /// Stop any running animation where it is.
    pub fn stop_animation(&mut self) {
        self.animation = None;
    }

    /// Advance the running animation to `now`.
    ///
    /// Returns true if the scroll position changed, i.e. a scroll event
    /// should be delivered.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };

        let elapsed = now.saturating_duration_since(animation.started);
        let t = (elapsed.as_secs_f32() / self.animation_duration.as_secs_f32()).min(1.0);
        let next = if t >= 1.0 {
            self.animation = None;
            animation.to
        } else {
            // ease-out cubic
            let eased = 1.0 - (1.0 - t).powi(3);
            animation.from + (animation.to - animation.from) * eased
        };

        if next == self.scroll_left {
            return false;
        }
        self.scroll_left = next;
        self.needs_sync = true;
        true
    }

    /// Take the programmatic scroll position the scroll area must adopt this
    /// frame, if any.
    pub fn take_programmatic_offset(&mut self) -> Option<f32> {
        if self.needs_sync || self.animation.is_some() {
            self.needs_sync = false;
            Some(self.scroll_left)
        } else {
            None
        }
    }

    fn clamp(&self, scroll_left: f32) -> f32 {
        scroll_left.clamp(0.0, self.max_scroll_left())
    }
}
