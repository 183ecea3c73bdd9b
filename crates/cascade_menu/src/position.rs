//! Submenu positioning engine
//!
//! Places an open submenu next to its opener:
//!
//! - vertically, the submenu's first item lines up with the opener as it
//!   was when the submenu opened, clamped to the parent's scrollport and
//!   then to the visible viewport;
//! - horizontally, the submenu sits on the preferred side unless it only
//!   fits on the other one, and never leaves the padded viewport.
//!
//! [`compute_placement`] is pure. [`SubmenuPositioner`] gathers its inputs
//! from a [`GeometryProvider`] and keeps the per-open anchor.

use cascade_core::geometry::{clamp, rects_equal, Rect};

use crate::config::LayoutConfig;
use crate::error::PositionError;
use crate::id::{ItemKey, MenuId};
use crate::tree::Edge;
use crate::viewport::{GeometryProvider, LayoutHandle, SubmenuMeasure};

/// Why a positioning pass runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepositionPhase {
    /// First pass after a submenu opens; records the chosen edge
    Initial,
    /// Resize, scroll or broadcast; re-decides from the recorded edge
    Reposition,
}

/// Opener position captured when the submenu opened
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpenAnchor {
    pub item_offset_in_menu: f32,
    pub parent_scroll_top: f32,
}

/// Free space on either side of the opener
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HorizontalFit {
    pub overflows_left: bool,
    pub overflows_right: bool,
    pub distance_to_left_edge: f32,
    pub distance_to_right_edge: f32,
}

/// Computed submenu box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubmenuPlacement {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub max_height: f32,
    pub edge: Edge,
    pub z_index: i32,
}

impl SubmenuPlacement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }
}

/// Inputs of one positioning pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionInput {
    /// Visible part of the document
    pub visible: Rect,
    /// Current opener rect
    pub opener: Rect,
    /// Visible scroll area of the parent menu
    pub parent_scrollport: Rect,
    pub parent_max_scroll_top: f32,
    pub anchor: OpenAnchor,
    pub measure: SubmenuMeasure,
    pub preferred_edge: Edge,
    pub z_index: i32,
}

/// Pick the side a submenu opens on
///
/// | preferred | overflows left | overflows right | chosen |
/// |---|---|---|---|
/// | any | yes | yes | side with strictly more room, ties go right |
/// | right | any | no | right |
/// | left | yes | no | right |
/// | left | no | any | left |
/// | right | no | yes | left |
pub fn choose_edge(preferred: Edge, fit: &HorizontalFit) -> Edge {
    if !fit.distance_to_left_edge.is_finite() || !fit.distance_to_right_edge.is_finite() {
        tracing::error!(?preferred, ?fit, "non-finite horizontal distances");
        return preferred;
    }

    match (preferred, fit.overflows_left, fit.overflows_right) {
        (_, true, true) => {
            if fit.distance_to_left_edge > fit.distance_to_right_edge {
                Edge::Left
            } else {
                Edge::Right
            }
        }
        (Edge::Right, _, false) | (Edge::Left, false, _) => preferred,
        (Edge::Left, true, false) | (Edge::Right, false, true) => preferred.opposite(),
    }
}

/// Compute a placement from already measured geometry
pub fn compute_placement(input: &PositionInput, config: &LayoutConfig) -> SubmenuPlacement {
    let visible = input.visible;
    let first_child_offset = input.measure.first_child_offset;

    // Vertical: anchor to the opener as captured at open time
    let effective_parent_scroll_top = input
        .anchor
        .parent_scroll_top
        .min(input.parent_max_scroll_top);
    let opener_top = input.parent_scrollport.top() + input.anchor.item_offset_in_menu
        - effective_parent_scroll_top;
    let ideal_top = opener_top - first_child_offset;

    let min_ideal_top = input.parent_scrollport.top() - first_child_offset;
    let max_ideal_top =
        input.parent_scrollport.bottom() - input.opener.height() - first_child_offset;
    let ideal_top = clamp(ideal_top, min_ideal_top, max_ideal_top);

    let visible_height = visible.height().max(0.0);
    let constrained_height = input.measure.size.height.max(0.0).min(visible_height);
    let top = clamp(
        ideal_top,
        visible.top(),
        (visible.bottom() - constrained_height).max(visible.top()),
    );

    // Width bounds
    let padding = visible.width().max(0.0) * config.viewport_padding_ratio;
    let padded_left = visible.left() + padding;
    let padded_right = visible.right() - padding;
    let max_width = (padded_right - padded_left).max(0.0);
    let min_width = config.ideal_min_width.min(max_width);
    let width = clamp(input.measure.size.width, min_width, max_width);

    // Horizontal side
    let gap = config.submenu_gap;
    let distance_to_left_edge = input.opener.left() - padded_left;
    let distance_to_right_edge = padded_right - input.opener.right();
    let fit = HorizontalFit {
        overflows_left: width + gap > distance_to_left_edge,
        overflows_right: width + gap > distance_to_right_edge,
        distance_to_left_edge,
        distance_to_right_edge,
    };
    let edge = choose_edge(input.preferred_edge, &fit);

    let ideal_left = match edge {
        Edge::Left => input.opener.left() - gap - width,
        Edge::Right => input.opener.right() + gap,
    };
    let left = clamp(
        ideal_left,
        padded_left,
        (padded_right - width).max(padded_left),
    );

    SubmenuPlacement {
        top,
        left,
        width,
        height: constrained_height,
        min_width,
        max_width,
        max_height: constrained_height,
        edge,
        z_index: input.z_index,
    }
}

/// What to position and where it hangs
#[derive(Clone, Copy, Debug)]
pub struct PositionTarget<'a> {
    pub menu: &'a MenuId,
    pub parent_menu: &'a MenuId,
    pub opener: ItemKey,
    pub preferred_edge: Edge,
    pub z_index: i32,
}

/// Per-submenu positioning state
///
/// Holds the open anchor for the lifetime of one open, the last placement,
/// and the last observed content rect used to break the resize feedback
/// loop (applying a placement resizes the content, which is observed, which
/// would trigger another pass).
#[derive(Clone, Debug, Default)]
pub struct SubmenuPositioner {
    anchor: Option<OpenAnchor>,
    last: Option<SubmenuPlacement>,
    observed: Option<Rect>,
}

impl SubmenuPositioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Option<OpenAnchor> {
        self.anchor
    }

    pub fn last_placement(&self) -> Option<&SubmenuPlacement> {
        self.last.as_ref()
    }

    /// Record the opener's position; called when the submenu opens
    pub fn capture<G: GeometryProvider + ?Sized>(
        &mut self,
        geometry: &G,
        opener: ItemKey,
        parent_menu: &MenuId,
    ) -> Option<OpenAnchor> {
        let item_offset_in_menu = geometry.item_offset_in_menu(opener)?;
        let parent_scroll_top = geometry
            .scroll_metrics(parent_menu)
            .map_or(0.0, |metrics| metrics.scroll_top);

        let anchor = OpenAnchor {
            item_offset_in_menu,
            parent_scroll_top,
        };
        self.anchor = Some(anchor);
        Some(anchor)
    }

    /// Forget everything; called when the submenu closes
    pub fn release(&mut self) {
        self.anchor = None;
        self.last = None;
        self.observed = None;
    }

    /// Feed a content resize observation. Returns `true` if it differs from
    /// the last one and a reposition is warranted.
    pub fn observe_resize(&mut self, rect: Rect) -> bool {
        if self.observed.is_some_and(|seen| rects_equal(&seen, &rect)) {
            return false;
        }
        self.observed = Some(rect);
        true
    }

    /// Run one positioning pass
    pub fn compute<G: GeometryProvider + ?Sized>(
        &mut self,
        geometry: &G,
        target: &PositionTarget<'_>,
        visible: Rect,
        config: &LayoutConfig,
    ) -> Result<SubmenuPlacement, PositionError> {
        let opener = geometry.item_rect(target.opener);
        let content = geometry.content_rect(target.menu);
        let measure = geometry.measure_submenu(target.menu);
        let parent = geometry
            .scrollport(target.parent_menu)
            .zip(geometry.scroll_metrics(target.parent_menu));

        let mut missing = Vec::new();
        if opener.is_none() {
            missing.push(LayoutHandle::Opener);
        }
        if content.is_none() {
            missing.push(LayoutHandle::Content);
        }
        if measure.is_none() {
            missing.push(LayoutHandle::MeasuringContainer);
        }
        if parent.is_none() {
            missing.push(LayoutHandle::ParentMenu);
        }

        let (Some(opener), Some(measure), Some((parent_scrollport, parent_metrics)), Some(_)) =
            (opener, measure, parent, content)
        else {
            for handle in &missing {
                tracing::warn!(menu = %target.menu, handle = handle.name(), "missing layout handle, skipping placement");
            }
            return Err(PositionError::MissingHandles {
                menu: target.menu.clone(),
                missing: missing.into_iter().map(LayoutHandle::name).collect(),
            });
        };

        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => self
                .capture(geometry, target.opener, target.parent_menu)
                .ok_or_else(|| PositionError::NotAnchored(target.menu.clone()))?,
        };

        let input = PositionInput {
            visible,
            opener,
            parent_scrollport,
            parent_max_scroll_top: parent_metrics.max_scroll_top(),
            anchor,
            measure,
            preferred_edge: target.preferred_edge,
            z_index: target.z_index,
        };
        let placement = compute_placement(&input, config);

        tracing::trace!(menu = %target.menu, ?placement, "submenu placed");
        self.last = Some(placement);
        Ok(placement)
    }
}
