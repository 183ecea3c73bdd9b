//! Scroll arrows, wheel momentum filtering and the custom scrollbar
//!
//! Each menu owns a [`ScrollArea`]. While the pointer rests on a scroll
//! arrow (or a touch holds it) the area scrolls by a fixed step on an
//! interval until it reaches an edge.
//!
//! Wheel events that arrive while the arrow is driving the scroll are
//! swallowed, and so is their momentum tail after the pointer has moved
//! on. The tail ends when the [`VelocityKickDetector`] sees a fresh
//! gesture, or when no wheel event arrives for the settle period.

use cascade_core::geometry::Rect;
use cascade_core::kick::{KickConfig, VelocityKickDetector};
use cascade_core::timer::{TimerId, TimerQueue};

use crate::config::ScrollConfig;
use crate::dropdown::TimerTask;
use crate::id::MenuId;
use crate::viewport::{GeometryProvider, ScrollMetrics};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Input device driving a continuous scroll
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    /// Pixels per tick for this device
    pub fn step(self, config: &ScrollConfig) -> f32 {
        match self {
            PointerKind::Mouse => config.mouse_step_px,
            PointerKind::Touch | PointerKind::Pen => config.touch_step_px,
        }
    }
}

/// Whether a wheel event may scroll the menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelOutcome {
    Allow,
    Suppress,
}

/// Scrollbar thumb, relative to the top of the scrollport
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollThumb {
    pub top: f32,
    pub height: f32,
}

/// Derived scrollbar state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollProperties {
    pub can_scroll_up: bool,
    pub can_scroll_down: bool,
    /// `None` when the content fits
    pub thumb: Option<ScrollThumb>,
    /// Pointer hit-box over the scrollbar, in document coordinates
    pub hitbox: Option<Rect>,
}

impl ScrollProperties {
    /// Compute scrollbar state from the current scroll position
    pub fn compute(metrics: &ScrollMetrics, scrollport: Rect, config: &ScrollConfig) -> Self {
        let tolerance = config.edge_tolerance;
        if !metrics.is_scrollable() {
            return Self::default();
        }

        let viewport = metrics.client_height.max(0.0);
        let content = metrics.scroll_height.max(viewport);
        let ratio = if content > 0.0 { viewport / content } else { 1.0 };

        let thumb_height = (ratio * viewport)
            .max(config.min_thumb_length)
            .min(viewport);
        let max_scroll = metrics.max_scroll_top();
        let progress = if max_scroll > 0.0 {
            (metrics.scroll_top / max_scroll).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let thumb_top = progress * (viewport - thumb_height);

        let width = config.hitbox_width.min(scrollport.width()).max(0.0);
        let hitbox = Rect::new(
            scrollport.right() - width,
            scrollport.top(),
            width,
            scrollport.height(),
        );

        Self {
            can_scroll_up: !metrics.at_top(tolerance),
            can_scroll_down: !metrics.at_bottom(tolerance),
            thumb: Some(ScrollThumb {
                top: thumb_top,
                height: thumb_height,
            }),
            hitbox: Some(hitbox),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveScroll {
    direction: ScrollDirection,
    pointer: PointerKind,
    timer: TimerId,
}

/// Scroll controller for one menu
#[derive(Debug)]
pub struct ScrollArea {
    menu: MenuId,
    active: Option<ActiveScroll>,
    pointer_on_arrow: bool,
    momentum_timer: Option<TimerId>,
    detector: VelocityKickDetector,
    properties: ScrollProperties,
    dirty: bool,
}

impl ScrollArea {
    pub fn new(menu: MenuId, kick: KickConfig) -> Self {
        Self {
            menu,
            active: None,
            pointer_on_arrow: false,
            momentum_timer: None,
            detector: VelocityKickDetector::new(kick),
            properties: ScrollProperties::default(),
            dirty: true,
        }
    }

    pub fn menu(&self) -> &MenuId {
        &self.menu
    }

    pub fn is_scrolling(&self) -> bool {
        self.active.is_some()
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        self.active.map(|active| active.direction)
    }

    /// Device driving the current continuous scroll
    pub fn active_pointer(&self) -> Option<PointerKind> {
        self.active.map(|active| active.pointer)
    }

    pub fn pointer_on_arrow(&self) -> bool {
        self.pointer_on_arrow
    }

    pub fn set_pointer_on_arrow(&mut self, on_arrow: bool) {
        self.pointer_on_arrow = on_arrow;
    }

    /// Wheel events are being treated as momentum
    pub fn momentum_suppressed(&self) -> bool {
        self.momentum_timer.is_some()
    }

    pub fn properties(&self) -> &ScrollProperties {
        &self.properties
    }

    /// Start scrolling toward `direction`. Returns `false` if already at
    /// that edge.
    pub fn begin(
        &mut self,
        direction: ScrollDirection,
        pointer: PointerKind,
        metrics: &ScrollMetrics,
        config: &ScrollConfig,
        timers: &mut TimerQueue<TimerTask>,
    ) -> bool {
        if at_edge(metrics, direction, config.edge_tolerance) {
            self.end(timers);
            return false;
        }
        if let Some(active) = self.active {
            if active.direction == direction && active.pointer == pointer {
                return true;
            }
        }

        self.end(timers);
        let timer = timers.set_interval(config.interval_ms, TimerTask::ScrollStep(self.menu.clone()));
        self.active = Some(ActiveScroll {
            direction,
            pointer,
            timer,
        });
        tracing::debug!(menu = %self.menu, ?direction, ?pointer, "continuous scroll started");
        true
    }

    /// Stop continuous scrolling. Returns `true` if it was running.
    pub fn end(&mut self, timers: &mut TimerQueue<TimerTask>) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        timers.clear(active.timer);
        tracing::debug!(menu = %self.menu, "continuous scroll ended");
        true
    }

    /// One interval tick. Scrolls by one step and stops at the edge.
    ///
    /// Returns `true` if the scroll position changed.
    pub fn step<G: GeometryProvider + ?Sized>(
        &mut self,
        geometry: &mut G,
        config: &ScrollConfig,
        timers: &mut TimerQueue<TimerTask>,
    ) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let Some(metrics) = geometry.scroll_metrics(&self.menu) else {
            tracing::warn!(menu = %self.menu, "scroll tick without scroll metrics");
            self.end(timers);
            return false;
        };
        if at_edge(&metrics, active.direction, config.edge_tolerance) {
            self.end(timers);
            return false;
        }

        let step = active.pointer.step(config);
        let target = match active.direction {
            ScrollDirection::Up => metrics.scroll_top - step,
            ScrollDirection::Down => metrics.scroll_top + step,
        };
        geometry.set_scroll_top(&self.menu, target.clamp(0.0, metrics.max_scroll_top()));
        self.dirty = true;

        let reached_edge = geometry
            .scroll_metrics(&self.menu)
            .map_or(true, |after| at_edge(&after, active.direction, config.edge_tolerance));
        if reached_edge {
            self.end(timers);
        }
        true
    }

    /// Decide whether a wheel event may scroll this menu
    pub fn on_wheel(
        &mut self,
        delta: f32,
        timestamp_ms: u64,
        config: &ScrollConfig,
        timers: &mut TimerQueue<TimerTask>,
    ) -> WheelOutcome {
        let sample = self.detector.sample(delta, timestamp_ms);

        if self.pointer_on_arrow && self.active.is_some() {
            self.arm_momentum_guard(config, timers);
            return WheelOutcome::Suppress;
        }

        if self.momentum_timer.is_some() {
            if sample.is_kick_start {
                timers.clear_slot(&mut self.momentum_timer);
                tracing::debug!(menu = %self.menu, "fresh wheel gesture lifted suppression");
                return WheelOutcome::Allow;
            }
            self.arm_momentum_guard(config, timers);
            return WheelOutcome::Suppress;
        }

        WheelOutcome::Allow
    }

    fn arm_momentum_guard(&mut self, config: &ScrollConfig, timers: &mut TimerQueue<TimerTask>) {
        timers.clear_slot(&mut self.momentum_timer);
        self.momentum_timer = Some(timers.set_timeout(
            config.momentum_settle_ms,
            TimerTask::MomentumSettle(self.menu.clone()),
        ));
    }

    /// The settle timer fired without further wheel events
    pub fn momentum_settled(&mut self, timer: TimerId) {
        if self.momentum_timer == Some(timer) {
            self.momentum_timer = None;
            tracing::trace!(menu = %self.menu, "wheel momentum settled");
        }
    }

    /// Mark properties stale for the next batched update
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute scrollbar properties from live geometry
    pub fn refresh<G: GeometryProvider + ?Sized>(
        &mut self,
        geometry: &G,
        config: &ScrollConfig,
    ) -> &ScrollProperties {
        self.dirty = false;
        self.properties = match geometry
            .scroll_metrics(&self.menu)
            .zip(geometry.scrollport(&self.menu))
        {
            Some((metrics, scrollport)) => ScrollProperties::compute(&metrics, scrollport, config),
            None => ScrollProperties::default(),
        };
        &self.properties
    }

    /// Drop timers and gesture history; called when the menu closes or unmounts
    pub fn release(&mut self, timers: &mut TimerQueue<TimerTask>) {
        self.end(timers);
        timers.clear_slot(&mut self.momentum_timer);
        self.pointer_on_arrow = false;
        self.detector.reset();
        self.properties = ScrollProperties::default();
        self.dirty = true;
    }
}

fn at_edge(metrics: &ScrollMetrics, direction: ScrollDirection, tolerance: f32) -> bool {
    match direction {
        ScrollDirection::Up => metrics.at_top(tolerance),
        ScrollDirection::Down => metrics.at_bottom(tolerance),
    }
}
