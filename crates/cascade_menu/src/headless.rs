//! In-memory geometry provider
//!
//! Lays menus out as fixed-height rows without any rendering engine. The
//! root menu is placed by the host with [`HeadlessGeometry::place_menu`];
//! submenus take whatever placement the engine applies. Useful for tests
//! and for hosts that only need hit testing.

use cascade_core::geometry::{Point, Rect, Size};
use rustc_hash::FxHashMap;

use crate::id::{ItemKey, MenuId};
use crate::position::SubmenuPlacement;
use crate::viewport::{
    GeometryProvider, ScrollMetrics, SubmenuMeasure, ViewportSnapshot, ViewportStrategy,
};

pub const DEFAULT_ROW_HEIGHT: f32 = 30.0;
pub const DEFAULT_MENU_PADDING: f32 = 4.0;
pub const DEFAULT_MENU_WIDTH: f32 = 180.0;

#[derive(Clone, Debug)]
struct MenuLayout {
    origin: Point,
    width: f32,
    natural_width: f32,
    max_height: Option<f32>,
    scroll_top: f32,
    items: Vec<ItemKey>,
    attached: bool,
    placed: bool,
}

impl Default for MenuLayout {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            width: DEFAULT_MENU_WIDTH,
            natural_width: DEFAULT_MENU_WIDTH,
            max_height: None,
            scroll_top: 0.0,
            items: Vec::new(),
            attached: true,
            placed: false,
        }
    }
}

/// Row-based layout with no rendering
#[derive(Clone, Debug)]
pub struct HeadlessGeometry {
    viewport: ViewportSnapshot,
    strategy: ViewportStrategy,
    row_height: f32,
    padding: f32,
    menus: FxHashMap<MenuId, MenuLayout>,
    item_menus: FxHashMap<ItemKey, MenuId>,
}

impl HeadlessGeometry {
    pub fn new(viewport: ViewportSnapshot) -> Self {
        Self {
            viewport,
            strategy: ViewportStrategy::VariantA,
            row_height: DEFAULT_ROW_HEIGHT,
            padding: DEFAULT_MENU_PADDING,
            menus: FxHashMap::default(),
            item_menus: FxHashMap::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ViewportStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn set_viewport(&mut self, viewport: ViewportSnapshot) {
        self.viewport = viewport;
    }

    /// Position a menu directly, as the host does for the root menu
    pub fn place_menu(&mut self, menu: &MenuId, origin: Point, width: f32, max_height: Option<f32>) {
        let layout = self.menus.entry(menu.clone()).or_default();
        layout.origin = origin;
        layout.width = width;
        layout.natural_width = width;
        layout.max_height = max_height;
        layout.placed = true;
        self.clamp_scroll(menu);
    }

    /// Width a submenu would take if unconstrained
    pub fn set_natural_width(&mut self, menu: &MenuId, width: f32) {
        if let Some(layout) = self.menus.get_mut(menu) {
            layout.natural_width = width;
        }
    }

    /// Simulate a menu whose layout handles are not attached yet
    pub fn set_attached(&mut self, menu: &MenuId, attached: bool) {
        if let Some(layout) = self.menus.get_mut(menu) {
            layout.attached = attached;
        }
    }

    pub fn is_placed(&self, menu: &MenuId) -> bool {
        self.menus.get(menu).is_some_and(|layout| layout.placed)
    }

    pub fn scroll_top(&self, menu: &MenuId) -> f32 {
        self.menus.get(menu).map_or(0.0, |layout| layout.scroll_top)
    }

    /// Center of an item's row, for driving pointer input
    pub fn item_center(&self, item: ItemKey) -> Option<Point> {
        let rect = self.item_rect(item)?;
        Some(Point::new(
            rect.left() + rect.width() / 2.0,
            rect.top() + rect.height() / 2.0,
        ))
    }

    fn natural_height(&self, layout: &MenuLayout) -> f32 {
        self.padding * 2.0 + layout.items.len() as f32 * self.row_height
    }

    fn client_height(&self, layout: &MenuLayout) -> f32 {
        let natural = self.natural_height(layout);
        layout.max_height.map_or(natural, |max| natural.min(max))
    }

    fn visible_layout(&self, menu: &MenuId) -> Option<&MenuLayout> {
        self.menus
            .get(menu)
            .filter(|layout| layout.attached && layout.placed)
    }

    fn clamp_scroll(&mut self, menu: &MenuId) {
        let Some(layout) = self.menus.get(menu) else {
            return;
        };
        let max = (self.natural_height(layout) - self.client_height(layout)).max(0.0);
        if let Some(layout) = self.menus.get_mut(menu) {
            layout.scroll_top = layout.scroll_top.clamp(0.0, max);
        }
    }
}

impl GeometryProvider for HeadlessGeometry {
    fn viewport(&self) -> ViewportSnapshot {
        self.viewport
    }

    fn probe_strategy(&self) -> ViewportStrategy {
        self.strategy
    }

    fn item_rect(&self, item: ItemKey) -> Option<Rect> {
        let menu = self.item_menus.get(&item)?;
        let layout = self.visible_layout(menu)?;
        let offset = self.item_offset_in_menu(item)?;
        Some(Rect::new(
            layout.origin.x,
            layout.origin.y + offset - layout.scroll_top,
            layout.width,
            self.row_height,
        ))
    }

    fn item_offset_in_menu(&self, item: ItemKey) -> Option<f32> {
        let menu = self.item_menus.get(&item)?;
        let layout = self.menus.get(menu)?;
        let index = layout.items.iter().position(|key| *key == item)?;
        Some(self.padding + index as f32 * self.row_height)
    }

    fn measure_submenu(&self, menu: &MenuId) -> Option<SubmenuMeasure> {
        let layout = self.menus.get(menu).filter(|layout| layout.attached)?;
        Some(SubmenuMeasure {
            size: Size::new(layout.natural_width, self.natural_height(layout)),
            first_child_offset: self.padding,
        })
    }

    fn content_rect(&self, menu: &MenuId) -> Option<Rect> {
        let layout = self.menus.get(menu).filter(|layout| layout.attached)?;
        Some(Rect::from_origin_size(
            layout.origin,
            Size::new(layout.width, self.client_height(layout)),
        ))
    }

    fn scrollport(&self, menu: &MenuId) -> Option<Rect> {
        let layout = self.visible_layout(menu)?;
        Some(Rect::from_origin_size(
            layout.origin,
            Size::new(layout.width, self.client_height(layout)),
        ))
    }

    fn scroll_metrics(&self, menu: &MenuId) -> Option<ScrollMetrics> {
        let layout = self.menus.get(menu).filter(|layout| layout.attached)?;
        Some(ScrollMetrics {
            scroll_top: layout.scroll_top,
            scroll_height: self.natural_height(layout),
            client_height: self.client_height(layout),
        })
    }

    fn set_scroll_top(&mut self, menu: &MenuId, scroll_top: f32) {
        if let Some(layout) = self.menus.get_mut(menu) {
            layout.scroll_top = scroll_top;
        }
        self.clamp_scroll(menu);
    }

    fn apply_placement(&mut self, menu: &MenuId, placement: &SubmenuPlacement) {
        if let Some(layout) = self.menus.get_mut(menu) {
            layout.origin = Point::new(placement.left, placement.top);
            layout.width = placement.width;
            layout.max_height = Some(placement.max_height);
            layout.placed = true;
        }
        self.clamp_scroll(menu);
    }

    fn submenu_closed(&mut self, menu: &MenuId) {
        if let Some(layout) = self.menus.get_mut(menu) {
            layout.placed = false;
            layout.scroll_top = 0.0;
        }
    }

    fn mount_menu(&mut self, menu: &MenuId, _parent: Option<&MenuId>) {
        self.menus.entry(menu.clone()).or_default();
    }

    fn unmount_menu(&mut self, menu: &MenuId) {
        if let Some(layout) = self.menus.remove(menu) {
            for item in layout.items {
                self.item_menus.remove(&item);
            }
        }
    }

    fn mount_item(&mut self, item: ItemKey, menu: &MenuId) {
        self.menus.entry(menu.clone()).or_default().items.push(item);
        self.item_menus.insert(item, menu.clone());
    }

    fn unmount_item(&mut self, item: ItemKey) {
        if let Some(menu) = self.item_menus.remove(&item) {
            if let Some(layout) = self.menus.get_mut(&menu) {
                layout.items.retain(|key| *key != item);
            }
            self.clamp_scroll(&menu);
        }
    }
}
