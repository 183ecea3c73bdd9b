//! Viewport coordinates and the geometry provider seam
//!
//! The engine never measures anything itself. Hosts implement
//! [`GeometryProvider`] on top of their layout engine; tests use
//! [`crate::headless::HeadlessGeometry`].
//!
//! Rendering engines disagree on how the visual viewport (the part of the
//! page actually on screen, e.g. under pinch zoom or an on-screen keyboard)
//! relates to document coordinates. Both known behaviors are kept as a
//! [`ViewportStrategy`], chosen once when the dropdown is created.

use cascade_core::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::id::{ItemKey, MenuId};
use crate::position::SubmenuPlacement;

/// Visual viewport as reported by the host
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualViewport {
    pub width: f32,
    pub height: f32,
    /// Offset of the visual viewport within the layout viewport
    pub offset_left: f32,
    pub offset_top: f32,
    /// Offset of the visual viewport within the document
    pub page_left: f32,
    pub page_top: f32,
    pub scale: f32,
}

/// Layout viewport as reported by the host
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutViewport {
    pub width: f32,
    pub height: f32,
    pub scroll_left: f32,
    pub scroll_top: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSnapshot {
    pub visual: VisualViewport,
    pub layout: LayoutViewport,
}

impl ViewportSnapshot {
    /// An unzoomed viewport whose visual and layout viewports coincide
    pub fn simple(width: f32, height: f32) -> Self {
        Self {
            visual: VisualViewport {
                width,
                height,
                offset_left: 0.0,
                offset_top: 0.0,
                page_left: 0.0,
                page_top: 0.0,
                scale: 1.0,
            },
            layout: LayoutViewport {
                width,
                height,
                scroll_left: 0.0,
                scroll_top: 0.0,
            },
        }
    }

    /// Scroll the document, keeping the visual viewport aligned with it
    pub fn scrolled(mut self, left: f32, top: f32) -> Self {
        self.layout.scroll_left = left;
        self.layout.scroll_top = top;
        self.visual.page_left = left + self.visual.offset_left;
        self.visual.page_top = top + self.visual.offset_top;
        self
    }
}

/// How the visible rect is derived from a [`ViewportSnapshot`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportStrategy {
    /// The visual viewport's page offsets are reliable document coordinates
    VariantA,
    /// Page offsets are unreliable; rebuild them from the layout scroll
    /// position and the (non-negative) visual offset, capped to the layout
    /// viewport size
    VariantB,
}

impl ViewportStrategy {
    /// Visible portion of the document
    pub fn visible_rect(self, viewport: &ViewportSnapshot) -> Rect {
        let visual = &viewport.visual;
        let layout = &viewport.layout;
        match self {
            ViewportStrategy::VariantA => Rect::from_origin_size(
                Point::new(visual.page_left, visual.page_top),
                Size::new(visual.width, visual.height),
            ),
            ViewportStrategy::VariantB => Rect::from_origin_size(
                Point::new(
                    layout.scroll_left + visual.offset_left.max(0.0),
                    layout.scroll_top + visual.offset_top.max(0.0),
                ),
                Size::new(
                    visual.width.min(layout.width),
                    visual.height.min(layout.height),
                ),
            ),
        }
    }
}

/// Configured strategy choice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyPreference {
    /// Ask the provider
    #[default]
    Auto,
    VariantA,
    VariantB,
}

impl StrategyPreference {
    pub fn resolve(self, probe: impl FnOnce() -> ViewportStrategy) -> ViewportStrategy {
        match self {
            StrategyPreference::Auto => probe(),
            StrategyPreference::VariantA => ViewportStrategy::VariantA,
            StrategyPreference::VariantB => ViewportStrategy::VariantB,
        }
    }
}

/// Scroll state of a menu's scrollport
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
}

impl ScrollMetrics {
    pub fn max_scroll_top(&self) -> f32 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    pub fn at_top(&self, tolerance: f32) -> bool {
        self.scroll_top <= tolerance.max(0.0)
    }

    pub fn at_bottom(&self, tolerance: f32) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - tolerance.max(0.0)
    }

    pub fn is_scrollable(&self) -> bool {
        self.max_scroll_top() > 0.0
    }
}

/// Natural size of a submenu taken from its measuring container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubmenuMeasure {
    /// Unconstrained content size
    pub size: Size,
    /// Vertical offset of the first item inside the content
    pub first_child_offset: f32,
}

/// Layout handles a positioning pass depends on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutHandle {
    Opener,
    Content,
    MeasuringContainer,
    ParentMenu,
}

impl LayoutHandle {
    pub fn name(self) -> &'static str {
        match self {
            LayoutHandle::Opener => "opener",
            LayoutHandle::Content => "content",
            LayoutHandle::MeasuringContainer => "measuring container",
            LayoutHandle::ParentMenu => "parent menu",
        }
    }
}

/// Everything the engine needs to know about on-screen layout
///
/// Methods returning `Option` report handles that are not attached yet
/// (hidden submenu, unmounted item). The engine skips and retries later.
pub trait GeometryProvider {
    /// Current viewport
    fn viewport(&self) -> ViewportSnapshot;

    /// Which viewport coordinate behavior this host exhibits
    fn probe_strategy(&self) -> ViewportStrategy {
        ViewportStrategy::VariantA
    }

    /// Document rect of an item
    fn item_rect(&self, item: ItemKey) -> Option<Rect>;

    /// Offset of an item's top from the top of its menu's scrollable content
    fn item_offset_in_menu(&self, item: ItemKey) -> Option<f32>;

    /// Natural size of a submenu, `None` while it cannot be measured
    fn measure_submenu(&self, menu: &MenuId) -> Option<SubmenuMeasure>;

    /// Document rect of a menu's content box
    fn content_rect(&self, menu: &MenuId) -> Option<Rect>;

    /// Document rect of a menu's visible scroll area
    fn scrollport(&self, menu: &MenuId) -> Option<Rect>;

    fn scroll_metrics(&self, menu: &MenuId) -> Option<ScrollMetrics>;

    /// Scroll a menu; the provider clamps to its own bounds
    fn set_scroll_top(&mut self, menu: &MenuId, scroll_top: f32);

    /// Apply a computed placement to a submenu
    fn apply_placement(&mut self, menu: &MenuId, placement: &SubmenuPlacement);

    /// A submenu left the open path and is hidden again
    fn submenu_closed(&mut self, _menu: &MenuId) {}

    /// A menu was registered; `parent` is `None` for the root
    fn mount_menu(&mut self, _menu: &MenuId, _parent: Option<&MenuId>) {}

    fn unmount_menu(&mut self, _menu: &MenuId) {}

    /// An item was added to the end of `menu`
    fn mount_item(&mut self, _item: ItemKey, _menu: &MenuId) {}

    fn unmount_item(&mut self, _item: ItemKey) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoomed() -> ViewportSnapshot {
        ViewportSnapshot {
            visual: VisualViewport {
                width: 400.0,
                height: 300.0,
                offset_left: 50.0,
                offset_top: -20.0,
                page_left: 1050.0,
                page_top: 480.0,
                scale: 2.0,
            },
            layout: LayoutViewport {
                width: 800.0,
                height: 250.0,
                scroll_left: 1000.0,
                scroll_top: 500.0,
            },
        }
    }

    #[test]
    fn test_variant_a_uses_page_offsets() {
        let rect = ViewportStrategy::VariantA.visible_rect(&zoomed());
        assert_eq!(rect, Rect::new(1050.0, 480.0, 400.0, 300.0));
    }

    #[test]
    fn test_variant_b_rebuilds_from_layout_scroll() {
        let rect = ViewportStrategy::VariantB.visible_rect(&zoomed());
        assert_eq!(rect, Rect::new(1050.0, 500.0, 400.0, 250.0));
    }

    #[test]
    fn test_strategies_agree_without_zoom() {
        let viewport = ViewportSnapshot::simple(1024.0, 768.0).scrolled(0.0, 120.0);
        assert_eq!(
            ViewportStrategy::VariantA.visible_rect(&viewport),
            ViewportStrategy::VariantB.visible_rect(&viewport)
        );
    }

    #[test]
    fn test_preference_resolution() {
        let probe = || ViewportStrategy::VariantB;
        assert_eq!(StrategyPreference::Auto.resolve(probe), ViewportStrategy::VariantB);
        assert_eq!(
            StrategyPreference::VariantA.resolve(probe),
            ViewportStrategy::VariantA
        );
    }

    #[test]
    fn test_scroll_metrics_edges() {
        let metrics = ScrollMetrics {
            scroll_top: 199.5,
            scroll_height: 500.0,
            client_height: 300.0,
        };
        assert_eq!(metrics.max_scroll_top(), 200.0);
        assert!(metrics.at_bottom(1.0));
        assert!(!metrics.at_top(1.0));
        assert!(metrics.is_scrollable());
    }
}
