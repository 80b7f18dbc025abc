//! Timeline view.
//!
//! Renders laid-out event blocks inside a horizontally scrolling area with a
//! fixed marker at the viewport center, feeds scroll positions into the
//! marker controller and relays its change notifications to the host.

use chrono::{DateTime, Local, TimeDelta};
use eframe::egui::{self, Align2, FontId, Painter, Pos2, Rect, Stroke};
use log::{debug, warn};

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::ColorSettings;
use crate::core::event::DetectionEvent;
use crate::core::layout::{self, EventBlock, LayoutError};
use crate::core::marker::{MarkerChange, MarkerTiming, ScrollMarkerController};

/// Height of the time header.
const HEADER_HEIGHT: f32 = 20.0;

/// Height of one event block.
const BLOCK_HEIGHT: f32 = 8.0;

/// Space between the header and the first lane, and below the last lane.
const LANE_PADDING: f32 = 6.0;

/// Narrowest block that is still drawn visibly.
const MIN_BLOCK_WIDTH: f32 = 2.0;

/// Seconds between time header ticks.
const TICK_INTERVAL_SECS: i64 = 60;

/// Callback receiving marker change notifications.
pub type ChangeCallback = Box<dyn FnMut(&MarkerChange)>;

/// Scrollable timeline of detection events.
pub struct TimelineView<C: Clock = SystemClock> {
    /// Events as supplied by the host, in chronological order
    events: Vec<DetectionEvent>,
    controller: ScrollMarkerController<C>,
    on_change: Option<ChangeCallback>,
    /// Set after the first successful layout of the current event list
    initialized: bool,
    /// Last layout failure other than an empty event list
    layout_error: Option<LayoutError>,
}

impl TimelineView<SystemClock> {
    /// Create an empty view driven by the system clock.
    pub fn new(timing: MarkerTiming) -> Self {
        Self::with_clock(SystemClock, timing)
    }
}

impl<C: Clock> TimelineView<C> {
    /// Create an empty view driven by `clock`.
    pub fn with_clock(clock: C, timing: MarkerTiming) -> Self {
        Self {
            events: Vec::new(),
            controller: ScrollMarkerController::with_clock(clock, timing),
            on_change: None,
            initialized: false,
            layout_error: None,
        }
    }

    /// Register the host's change callback.
    pub fn on_change(&mut self, callback: impl FnMut(&MarkerChange) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// The marker controller.
    pub fn controller(&self) -> &ScrollMarkerController<C> {
        &self.controller
    }

    /// Events currently shown.
    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    /// Laid-out blocks currently shown.
    pub fn blocks(&self) -> &[EventBlock] {
        self.controller.blocks()
    }

    /// The last layout error, if the current event list could not be laid out.
    pub fn layout_error(&self) -> Option<&LayoutError> {
        self.layout_error.as_ref()
    }

    /// Replace the event list. `events` must be ordered by start time.
    pub fn set_events(&mut self, events: Vec<DetectionEvent>) {
        self.controller.teardown();
        self.events = events;
        self.initialized = false;
        self.recompute();
    }

    /// Make the timeline display-only, or interactive again.
    pub fn set_marker_events_disabled(&mut self, disabled: bool) {
        self.controller.set_marker_events_disabled(disabled);
    }

    /// Measure the viewport; a changed width triggers a relayout.
    pub fn measure(&mut self, width: f32) {
        if self.controller.measure_viewport(width) {
            self.recompute();
        }
    }

    /// Recompute the layout from the current events and viewport offset.
    ///
    /// Skipped until the viewport has been measured. The first successful
    /// layout of an event list focuses its most recent event.
    pub fn recompute(&mut self) -> bool {
        let Some(offset) = self.controller.timeline_offset() else {
            debug!("layout deferred until the viewport is measured");
            return false;
        };

        let now = self.controller.clock().wall_time();
        match layout::layout(&self.events, offset, now) {
            Ok(blocks) => {
                let last = blocks.len() - 1;
                self.layout_error = None;
                self.controller.set_blocks(blocks);
                if !self.initialized {
                    self.initialized = true;
                    self.controller.focus_block(last);
                }
                self.dispatch_changes();
                true
            }
            Err(LayoutError::NoEvents) => {
                debug!("no events to lay out, timeline left blank");
                self.layout_error = None;
                self.controller.set_blocks(Vec::new());
                false
            }
            Err(e) => {
                warn!("timeline layout failed: {}", e);
                self.layout_error = Some(e);
                self.controller.set_blocks(Vec::new());
                false
            }
        }
    }

    /// Seek `offset_secs` into the current event, as requested by the
    /// preview player.
    pub fn seek_by_offset(&mut self, offset_secs: i64) -> bool {
        self.controller.scroll_to_offset_within_current_event(offset_secs)
    }

    /// Scroll to and select the block at `index`.
    pub fn focus_block(&mut self, index: usize) -> bool {
        let focused = self.controller.focus_block(index);
        self.dispatch_changes();
        focused
    }

    /// Select the block `step` positions away from the current event.
    pub fn focus_adjacent(&mut self, step: isize) -> bool {
        let count = self.blocks().len();
        if count == 0 {
            return false;
        }
        let target = match self.controller.current_event() {
            Some(current) => current
                .index
                .saturating_add_signed(step)
                .min(count - 1),
            None => count - 1,
        };
        self.focus_block(target)
    }

    /// Advance timers and animation and deliver notifications.
    pub fn update(&mut self) {
        self.controller.tick();
        self.dispatch_changes();
    }

    fn dispatch_changes(&mut self) {
        let changes = self.controller.drain_changes();
        if let Some(callback) = self.on_change.as_mut() {
            for change in &changes {
                callback(change);
            }
        }
    }

    /// Render the timeline into `ui`.
    pub fn show(&mut self, ui: &mut egui::Ui, colors: &ColorSettings) {
        self.measure(ui.available_width());
        self.update();

        if self.blocks().is_empty() {
            self.draw_empty(ui, colors);
            return;
        }

        let lanes_height = self
            .blocks()
            .iter()
            .map(|block| block.y_offset)
            .max()
            .unwrap_or(0) as f32;
        let height = HEADER_HEIGHT + LANE_PADDING * 2.0 + lanes_height + BLOCK_HEIGHT;
        let content_width = self.controller.viewport().content_width();

        let mut area = egui::ScrollArea::horizontal()
            .id_salt("detection_timeline")
            .auto_shrink([false, true]);
        if let Some(offset) = self.controller.viewport_mut().take_programmatic_offset() {
            area = area.horizontal_scroll_offset(offset);
        }

        let mut clicked: Option<usize> = None;
        let output = area.show(ui, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(egui::vec2(content_width, height), egui::Sense::click());
            let painter = ui.painter_at(rect);

            painter.rect_filled(rect, 0.0, colors.background_color());
            self.draw_time_header(&painter, rect, colors);
            self.draw_blocks(&painter, rect, colors);

            if response.clicked()
                && let Some(pos) = response.interact_pointer_pos()
            {
                clicked = self
                    .blocks()
                    .iter()
                    .rev()
                    .find(|block| block_rect(rect, block).contains(pos))
                    .map(|block| block.index);
            }
        });

        self.controller.report_scroll(output.state.offset.x);
        self.draw_marker(ui, output.inner_rect, colors);

        if let Some(index) = clicked {
            self.focus_block(index);
        }
        self.dispatch_changes();

        if let Some(delay) = self.controller.next_tick_in() {
            ui.ctx().request_repaint_after(delay);
        }
    }

    /// Draw the placeholder shown when there is nothing to lay out.
    fn draw_empty(&self, ui: &mut egui::Ui, colors: &ColorSettings) {
        let text = match self.layout_error() {
            Some(e) => format!("Timeline unavailable: {}", e),
            None => "No events".to_string(),
        };
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.colored_label(colors.text_dim_color(), text);
        });
    }

    /// Draw minute ticks and their labels across the visible range.
    fn draw_time_header(&self, painter: &Painter, rect: Rect, colors: &ColorSettings) {
        let (Some(first), Some(offset)) = (self.blocks().first(), self.controller.timeline_offset())
        else {
            return;
        };

        let header_rect = Rect::from_min_max(rect.min, Pos2::new(rect.right(), rect.top() + HEADER_HEIGHT));
        painter.rect_filled(header_rect, 0.0, colors.header_background_color());

        let origin = first.start_time.timestamp();
        let visible = painter.clip_rect();
        let visible_start = origin - offset + (visible.left() - rect.left()).floor() as i64;
        let visible_end = origin - offset + (visible.right() - rect.left()).ceil() as i64;

        let mut tick = visible_start.div_euclid(TICK_INTERVAL_SECS) * TICK_INTERVAL_SECS;
        while tick <= visible_end {
            let x = rect.left() + (tick - origin + offset) as f32;
            painter.line_segment(
                [Pos2::new(x, rect.top() + HEADER_HEIGHT), Pos2::new(x, rect.bottom())],
                Stroke::new(0.5, colors.grid_color()),
            );
            if let Some(time) = DateTime::from_timestamp(tick, 0) {
                painter.text(
                    Pos2::new(x, rect.top() + HEADER_HEIGHT / 2.0),
                    Align2::CENTER_CENTER,
                    time.with_timezone(&Local).format("%H:%M").to_string(),
                    FontId::proportional(10.0),
                    colors.text_header_color(),
                );
            }
            tick += TICK_INTERVAL_SECS;
        }
    }

    /// Draw every block, outlining the current event.
    fn draw_blocks(&self, painter: &Painter, rect: Rect, colors: &ColorSettings) {
        let visible = painter.clip_rect();
        let current_id = self.controller.current_event().map(EventBlock::id);

        for block in self.blocks() {
            let block_rect = block_rect(rect, block);
            if !block_rect.intersects(visible) {
                continue;
            }

            let fill = if block.event.is_ongoing() {
                colors.ongoing_label_color(block.event.label)
            } else {
                colors.label_color(block.event.label)
            };
            painter.rect_filled(block_rect, 2.0, fill);
            if current_id == Some(block.id()) {
                painter.rect_stroke(
                    block_rect,
                    2.0,
                    Stroke::new(1.5, colors.current_event_color()),
                    egui::StrokeKind::Outside,
                );
            }

            let label = block.event.label.as_str();
            if block_rect.width() > label.len() as f32 * 6.0 {
                painter.text(
                    Pos2::new(block_rect.left() + 3.0, block_rect.center().y),
                    Align2::LEFT_CENTER,
                    label,
                    FontId::proportional(8.0),
                    colors.background_color(),
                );
            }
        }
    }

    /// Draw the fixed center marker and the time it currently points at.
    fn draw_marker(&self, ui: &egui::Ui, viewport_rect: Rect, colors: &ColorSettings) {
        let (Some(first), Some(offset)) = (self.blocks().first(), self.controller.timeline_offset())
        else {
            return;
        };

        let x = viewport_rect.left() + offset as f32;
        let painter = ui.painter_at(viewport_rect);
        painter.line_segment(
            [Pos2::new(x, viewport_rect.top()), Pos2::new(x, viewport_rect.bottom())],
            Stroke::new(2.0, colors.marker_color()),
        );

        let seconds = self.controller.viewport().scroll_left().round() as i64;
        let time = (first.start_time + TimeDelta::seconds(seconds)).with_timezone(&Local);
        painter.text(
            Pos2::new(x + 4.0, viewport_rect.bottom() - 2.0),
            Align2::LEFT_BOTTOM,
            time.format("%H:%M:%S").to_string(),
            FontId::monospace(10.0),
            colors.marker_color(),
        );
    }
}

impl<C: Clock> Drop for TimelineView<C> {
    fn drop(&mut self) {
        self.controller.teardown();
    }
}

/// Screen rectangle of `block` inside the timeline content `rect`.
fn block_rect(rect: Rect, block: &EventBlock) -> Rect {
    Rect::from_min_size(
        Pos2::new(
            rect.left() + block.position_x as f32,
            rect.top() + HEADER_HEIGHT + LANE_PADDING + block.y_offset as f32,
        ),
        egui::vec2((block.width as f32).max(MIN_BLOCK_WIDTH), BLOCK_HEIGHT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::event::DetectionLabel;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Recorded = Rc<RefCell<Vec<MarkerChange>>>;

    fn events() -> Vec<DetectionEvent> {
        vec![
            DetectionEvent::new("a", DetectionLabel::Car, 1000, Some(1010)),
            DetectionEvent::new("b", DetectionLabel::Person, 1020, Some(1040)),
            DetectionEvent::new("c", DetectionLabel::Dog, 1050, Some(1080)),
        ]
    }

    fn view() -> (TimelineView<ManualClock>, ManualClock, Recorded) {
        let clock = ManualClock::starting_at(2000);
        let mut view = TimelineView::with_clock(clock.clone(), MarkerTiming::default());
        let recorded: Recorded = Rc::default();
        let sink = Rc::clone(&recorded);
        view.on_change(move |change| sink.borrow_mut().push(change.clone()));
        (view, clock, recorded)
    }

    fn run_for(view: &mut TimelineView<ManualClock>, clock: &ManualClock, ms: u64) {
        for _ in 0..ms / 10 {
            clock.advance_ms(10);
            view.update();
        }
    }

    #[test]
    fn test_layout_waits_for_measurement() {
        let (mut view, _clock, recorded) = view();
        view.set_events(events());

        assert!(view.blocks().is_empty());
        assert!(recorded.borrow().is_empty());

        view.measure(400.0);
        assert_eq!(view.blocks().len(), 3);
        assert_eq!(view.blocks()[0].position_x, 200);
    }

    #[test]
    fn test_first_layout_focuses_latest_event() {
        let (mut view, clock, recorded) = view();
        view.measure(400.0);
        view.set_events(events());

        {
            let changes = recorded.borrow();
            assert_eq!(changes.len(), 1);
            assert!(changes[0].seek_complete);
            assert_eq!(changes[0].event.as_ref().map(EventBlock::id), Some("c"));
        }

        run_for(&mut view, &clock, 300);
        assert_eq!(view.controller().viewport().scroll_left(), 50.0);
        assert_eq!(recorded.borrow().len(), 1);
    }

    #[test]
    fn test_empty_events_leave_timeline_blank() {
        let (mut view, _clock, recorded) = view();
        view.measure(400.0);
        view.set_events(Vec::new());

        assert!(view.blocks().is_empty());
        assert!(view.layout_error().is_none());
        assert!(recorded.borrow().is_empty());
    }

    #[test]
    fn test_reload_with_empty_list_clears_selection() {
        let (mut view, _clock, _recorded) = view();
        view.measure(400.0);
        view.set_events(vec![DetectionEvent::new("a", DetectionLabel::Car, 1000, Some(1010))]);
        assert_eq!(view.controller().current_event().map(EventBlock::id), Some("a"));

        view.set_events(Vec::new());

        assert!(view.blocks().is_empty());
        assert!(view.controller().current_event().is_none());
        assert_eq!(view.controller().marker_time(), None);
        assert!(!view.seek_by_offset(5));
    }

    #[test]
    fn test_layout_error_is_kept() {
        let (mut view, _clock, _recorded) = view();
        view.measure(400.0);
        view.set_events(vec![DetectionEvent::new("x", DetectionLabel::Car, i64::MAX, None)]);

        assert!(view.blocks().is_empty());
        assert!(matches!(
            view.layout_error(),
            Some(LayoutError::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn test_user_scroll_reaches_callback() {
        let (mut view, clock, recorded) = view();
        view.measure(400.0);
        view.set_events(events());
        run_for(&mut view, &clock, 300);
        recorded.borrow_mut().clear();

        view.controller.report_scroll(25.0);
        view.update();
        run_for(&mut view, &clock, 200);

        let changes = recorded.borrow();
        assert_eq!(changes.len(), 2);
        assert!(!changes[0].seek_complete);
        assert!(changes[1].seek_complete);
        assert_eq!(changes[1].event.as_ref().map(EventBlock::id), Some("b"));
    }

    #[test]
    fn test_seek_by_offset_scrolls_within_current_event() {
        let (mut view, clock, recorded) = view();
        view.measure(400.0);
        view.set_events(events());
        run_for(&mut view, &clock, 300);

        assert!(view.seek_by_offset(-20));
        run_for(&mut view, &clock, 300);

        // "c" starts 50s after "a"
        assert_eq!(view.controller().viewport().scroll_left(), 30.0);
        assert_eq!(recorded.borrow().len(), 1);
    }

    #[test]
    fn test_focus_adjacent() {
        let (mut view, _clock, _recorded) = view();
        view.measure(400.0);
        view.set_events(events());

        assert!(view.focus_adjacent(-1));
        assert_eq!(view.controller().current_event().map(EventBlock::id), Some("b"));
        assert!(view.focus_adjacent(-5));
        assert_eq!(view.controller().current_event().map(EventBlock::id), Some("a"));
        assert!(view.focus_adjacent(9));
        assert_eq!(view.controller().current_event().map(EventBlock::id), Some("c"));
    }

    #[test]
    fn test_resize_relays_out() {
        let (mut view, _clock, _recorded) = view();
        view.measure(400.0);
        view.set_events(events());

        view.measure(1000.0);

        assert_eq!(view.blocks()[0].position_x, 500);
        assert_eq!(view.controller().current_event().unwrap().position_x, 550);
    }

    #[test]
    fn test_ongoing_event_grows_on_recompute() {
        let (mut view, clock, _recorded) = view();
        view.measure(400.0);
        view.set_events(vec![DetectionEvent::new("live", DetectionLabel::Person, 1990, None)]);
        assert_eq!(view.blocks()[0].width, 10);

        clock.advance_ms(5000);
        view.recompute();
        assert_eq!(view.blocks()[0].width, 15);
    }

    #[test]
    fn test_new_events_refocus_latest() {
        let (mut view, _clock, recorded) = view();
        view.measure(400.0);
        view.set_events(events());
        view.focus_block(0);
        recorded.borrow_mut().clear();

        let mut more = events();
        more.push(DetectionEvent::new("d", DetectionLabel::Car, 1100, Some(1110)));
        view.set_events(more);

        assert_eq!(view.controller().current_event().map(EventBlock::id), Some("d"));
        assert_eq!(recorded.borrow().len(), 1);
    }

    #[test]
    fn test_block_rect_uses_position_and_lane() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 5.0), egui::vec2(1000.0, 100.0));
        let events = [
            DetectionEvent::new("1", DetectionLabel::Car, 1000, Some(1020)),
            DetectionEvent::new("2", DetectionLabel::Person, 1010, Some(1010)),
        ];
        let blocks = layout::layout(&events, 50, DateTime::from_timestamp(0, 0).unwrap()).unwrap();

        let first = block_rect(rect, &blocks[0]);
        assert_eq!(first.left(), 60.0);
        assert_eq!(first.width(), 20.0);
        assert_eq!(first.top(), 5.0 + HEADER_HEIGHT + LANE_PADDING);

        let second = block_rect(rect, &blocks[1]);
        assert_eq!(second.width(), MIN_BLOCK_WIDTH);
        assert_eq!(second.top(), first.top() + layout::LANE_STEP as f32);
    }
}
