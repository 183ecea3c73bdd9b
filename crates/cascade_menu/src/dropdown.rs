//! Dropdown controller
//!
//! [`Dropdown`] is the single owner of a dropdown's state: the menu tree,
//! the open path, every item and scroll area, the timer queue and the
//! event emitter. Hosts forward input and layout notifications to it and
//! drive time with [`Dropdown::advance`].
//!
//! # Data flow
//!
//! State changes flow one way. Items never write the open path: a fired
//! intent timer or a click issues exactly one controller request
//! (`request_*`). Every public entry point ends with a commit that
//!
//! 1. re-derives each item's hover state from open path membership when
//!    the path epoch moved (a pure reducer that never issues requests), then
//! 2. positions pending submenus in open-path order, shallowest first, so
//!    a child always sees its parent's fresh placement.
//!
//! [`ControllerStats`] counts requests so tests can bound them per
//! interaction.

use cascade_core::events::{EventEmitter, ListenerId};
use cascade_core::geometry::{rect_contains, Point, Rect};
use cascade_core::timer::{TimerId, TimerQueue};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::config::MenuConfig;
use crate::error::{MenuError, PositionError, Result};
use crate::id::{ItemKey, MenuId};
use crate::item::{AriaAttributes, DropdownItem, HoverEvent, HoverState};
use crate::position::{PositionTarget, RepositionPhase, SubmenuPlacement};
use crate::scroll::{PointerKind, ScrollArea, ScrollDirection, ScrollProperties, WheelOutcome};
use crate::store::{MenuStore, OpenPath};
use crate::tree::{Edge, MenuItemTree};
use crate::viewport::{GeometryProvider, ViewportStrategy};

/// Work scheduled on the dropdown's timer queue
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// Hover-intent delay of a submenu item elapsed
    OpenIntent(ItemKey),
    /// Leave grace period of a submenu item elapsed
    CloseIntent(ItemKey),
    /// Debounced clearing of the hovered item
    HoverClear(ItemKey),
    /// Continuous scroll tick
    ScrollStep(MenuId),
    /// No wheel events for the settle period
    MomentumSettle(MenuId),
}

/// Notification categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuEventKind {
    Reposition,
    HoverChange,
    OpenPathChange,
    Placement,
    Dismiss,
}

/// Payloads delivered to listeners
#[derive(Clone, Debug, PartialEq)]
pub enum MenuEvent {
    Reposition(RepositionPhase),
    HoverChange(Option<ItemKey>),
    OpenPathChange(Vec<MenuId>),
    Placement {
        menu: MenuId,
        placement: SubmenuPlacement,
    },
    /// A leaf click asked for the whole dropdown to close
    Dismiss,
}

impl MenuEvent {
    pub fn kind(&self) -> MenuEventKind {
        match self {
            MenuEvent::Reposition(_) => MenuEventKind::Reposition,
            MenuEvent::HoverChange(_) => MenuEventKind::HoverChange,
            MenuEvent::OpenPathChange(_) => MenuEventKind::OpenPathChange,
            MenuEvent::Placement { .. } => MenuEventKind::Placement,
            MenuEvent::Dismiss => MenuEventKind::Dismiss,
        }
    }
}

/// Number of open path requests issued, by kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub open_calls: u32,
    pub close_calls: u32,
    pub collapse_calls: u32,
    pub close_all_calls: u32,
}

impl ControllerStats {
    pub fn total(&self) -> u32 {
        self.open_calls + self.close_calls + self.collapse_calls + self.close_all_calls
    }
}

/// What the host should do with a click
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Let the click bubble to the host
    pub propagate: bool,
    /// The dropdown asked to be closed
    pub dismissed: bool,
    /// Swallowed as the phantom click after a scroll-arrow press
    pub suppressed: bool,
}

/// Where a pointer-down landed
#[derive(Clone, Debug, PartialEq)]
pub enum PointerDownTarget {
    Item(ItemKey),
    ScrollArrow {
        menu: MenuId,
        direction: ScrollDirection,
        pointer: PointerKind,
    },
    Elsewhere,
}

/// Options for [`Dropdown::update_scroll_properties`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollUpdateOptions {
    /// Recompute now instead of at the next layout flush
    pub immediate: bool,
}

/// Nested dropdown controller
pub struct Dropdown<G: GeometryProvider> {
    config: MenuConfig,
    geometry: G,
    strategy: ViewportStrategy,
    root: MenuId,
    tree: MenuItemTree,
    store: MenuStore,
    items: SlotMap<ItemKey, DropdownItem>,
    submenu_owner: FxHashMap<MenuId, ItemKey>,
    scroll_areas: FxHashMap<MenuId, ScrollArea>,
    timers: TimerQueue<TimerTask>,
    emitter: EventEmitter<MenuEventKind, MenuEvent>,
    hover_clear_timer: Option<TimerId>,
    needs_initial: SmallVec<[MenuId; 4]>,
    reposition_pending: bool,
    suppress_next_click: bool,
    synced_epoch: u64,
    stats: ControllerStats,
}

impl<G: GeometryProvider> Dropdown<G> {
    /// Create a dropdown whose top-level menu is `root`
    pub fn new(root: impl Into<MenuId>, mut geometry: G, config: MenuConfig) -> Result<Self> {
        config.validate()?;

        let root = root.into();
        let strategy = config
            .layout
            .viewport_strategy
            .resolve(|| geometry.probe_strategy());

        let mut tree = MenuItemTree::new();
        tree.insert_root(root.clone())?;
        geometry.mount_menu(&root, None);

        let mut scroll_areas = FxHashMap::default();
        scroll_areas.insert(root.clone(), ScrollArea::new(root.clone(), config.kick));

        tracing::debug!(menu = %root, ?strategy, "dropdown created");

        Ok(Self {
            config,
            geometry,
            strategy,
            root,
            tree,
            store: MenuStore::new(),
            items: SlotMap::with_key(),
            submenu_owner: FxHashMap::default(),
            scroll_areas,
            timers: TimerQueue::new(),
            emitter: EventEmitter::new(),
            hover_clear_timer: None,
            needs_initial: SmallVec::new(),
            reposition_pending: false,
            suppress_next_click: false,
            synced_epoch: 0,
            stats: ControllerStats::default(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn root(&self) -> &MenuId {
        &self.root
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Mutable access to the provider. Call [`Dropdown::on_resize`] or
    /// [`Dropdown::on_menu_scroll`] after changing layout through it.
    pub fn geometry_mut(&mut self) -> &mut G {
        &mut self.geometry
    }

    pub fn strategy(&self) -> ViewportStrategy {
        self.strategy
    }

    pub fn tree(&self) -> &MenuItemTree {
        &self.tree
    }

    pub fn open_path(&self) -> &OpenPath {
        self.store.open_path()
    }

    pub fn is_open(&self, menu: &MenuId) -> bool {
        self.store.is_open(menu)
    }

    pub fn hovered_item(&self) -> Option<ItemKey> {
        self.store.hovered()
    }

    pub fn alignment_of(&self, menu: &MenuId) -> Option<Edge> {
        self.store.alignment_of(menu)
    }

    /// Screen rect of an open submenu from the hit-test registry
    pub fn submenu_rect(&self, menu: &MenuId) -> Option<Rect> {
        self.store.submenu_rect(menu).copied()
    }

    /// Last placement computed for an open submenu
    pub fn placement(&self, menu: &MenuId) -> Option<SubmenuPlacement> {
        let owner = self.submenu_owner.get(menu)?;
        self.items
            .get(*owner)?
            .submenu()?
            .positioner
            .last_placement()
            .copied()
    }

    pub fn z_index(&self, menu: &MenuId) -> i32 {
        self.tree.z_index(menu, self.config.layout.z_index_base)
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn item(&self, key: ItemKey) -> Option<&DropdownItem> {
        self.items.get(key)
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemKey, &DropdownItem)> {
        self.items.iter()
    }

    pub fn aria(&self, key: ItemKey) -> Option<AriaAttributes> {
        self.items.get(key).map(DropdownItem::aria)
    }

    /// Item that opens `menu`
    pub fn owner_of(&self, menu: &MenuId) -> Option<ItemKey> {
        self.submenu_owner.get(menu).copied()
    }

    pub fn scroll_area(&self, menu: &MenuId) -> Option<&ScrollArea> {
        self.scroll_areas.get(menu)
    }

    pub fn scroll_properties(&self, menu: &MenuId) -> Option<&ScrollProperties> {
        self.scroll_areas.get(menu).map(ScrollArea::properties)
    }

    /// Number of scheduled timers
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Current clock value (ms)
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn add_listener<F>(&mut self, kind: MenuEventKind, callback: F) -> ListenerId
    where
        F: FnMut(&MenuEvent) + 'static,
    {
        self.emitter.add_listener(kind, callback)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.emitter.remove_listener(id)
    }

    fn emit(&mut self, event: MenuEvent) {
        self.emitter.emit(event.kind(), &event);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Item slots
    // ─────────────────────────────────────────────────────────────────────

    /// Append an item to `menu`
    pub fn add_item(&mut self, menu: &MenuId, label: impl Into<String>) -> Result<ItemKey> {
        if !self.tree.contains(menu) {
            return Err(MenuError::UnknownMenu(menu.clone()));
        }

        let key = self.items.insert(DropdownItem::new(menu.clone(), label));
        self.geometry.mount_item(key, menu);
        if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.mark_dirty();
        }
        if self.store.is_open(menu) {
            self.reposition_pending = true;
        }
        self.commit();
        Ok(key)
    }

    pub fn set_label(&mut self, key: ItemKey, label: impl Into<String>) -> Result<()> {
        let item = self.items.get_mut(key).ok_or(MenuError::UnknownItem)?;
        item.set_label(label);
        Ok(())
    }

    /// Give an item a submenu with a generated ID
    pub fn set_submenu(&mut self, key: ItemKey) -> Result<MenuId> {
        self.set_submenu_id(key, MenuId::generate())
    }

    /// Give an item a submenu with a host-supplied ID
    ///
    /// Replaces any submenu the item already had.
    pub fn set_submenu_id(&mut self, key: ItemKey, id: impl Into<MenuId>) -> Result<MenuId> {
        let id = id.into();
        let item = self.items.get(key).ok_or(MenuError::UnknownItem)?;
        if item.submenu_id() == Some(&id) {
            return Ok(id);
        }
        if self.tree.contains(&id) {
            return Err(MenuError::DuplicateMenu(id));
        }
        let parent = item.parent_menu().clone();

        if item.submenu_id().is_some() {
            self.detach_submenu(key);
        }

        let depth = self
            .tree
            .insert(id.clone(), &parent, self.config.layout.default_edge)?;
        self.geometry.mount_menu(&id, Some(&parent));
        self.submenu_owner.insert(id.clone(), key);
        self.scroll_areas
            .insert(id.clone(), ScrollArea::new(id.clone(), self.config.kick));
        if let Some(item) = self.items.get_mut(key) {
            item.attach_submenu(id.clone());
        }

        tracing::debug!(menu = %id, parent = %parent, depth, "submenu mounted");
        self.commit();
        Ok(id)
    }

    /// Preferred side for a submenu whose parent is the root menu
    pub fn set_preferred_edge(&mut self, menu: &MenuId, edge: Edge) -> Result<()> {
        if !self.tree.contains(menu) {
            return Err(MenuError::UnknownMenu(menu.clone()));
        }
        self.tree.set_preferred_edge(menu, edge);
        Ok(())
    }

    /// Turn an item back into a leaf, unmounting its submenu
    pub fn clear_submenu(&mut self, key: ItemKey) -> Result<()> {
        if !self.items.contains_key(key) {
            return Err(MenuError::UnknownItem);
        }
        self.detach_submenu(key);
        self.commit();
        Ok(())
    }

    /// Unmount an item: cancels its timers and closes its submenu
    pub fn remove_item(&mut self, key: ItemKey) -> Result<()> {
        if !self.items.contains_key(key) {
            return Err(MenuError::UnknownItem);
        }
        self.unmount_item(key);
        self.commit();
        Ok(())
    }

    /// Unmount every item and submenu, leaving an empty root menu
    pub fn unmount_all(&mut self) {
        let keys: Vec<ItemKey> = self.items.keys().collect();
        for key in keys {
            if self.items.contains_key(key) {
                self.unmount_item(key);
            }
        }
        self.timers.clear_slot(&mut self.hover_clear_timer);
        if let Some(area) = self.scroll_areas.get_mut(&self.root) {
            area.release(&mut self.timers);
        }
        self.commit();
    }

    fn unmount_item(&mut self, key: ItemKey) {
        self.detach_submenu(key);

        let Some(mut item) = self.items.remove(key) else {
            return;
        };
        item.cancel_timers(&mut self.timers);
        self.geometry.unmount_item(key);
        if let Some(area) = self.scroll_areas.get_mut(item.parent_menu()) {
            area.mark_dirty();
        }
        if self.store.hovered() == Some(key) {
            self.set_hovered(None);
        }
        tracing::debug!(label = item.label(), "item unmounted");
    }

    fn detach_submenu(&mut self, key: ItemKey) {
        let Some(item) = self.items.get_mut(key) else {
            return;
        };
        item.cancel_timers(&mut self.timers);
        let Some(slot) = item.detach_submenu() else {
            return;
        };

        let closed = self.store.remove_menu(&slot.id);
        self.menus_closed(&closed);

        let removed = self.tree.remove(&slot.id);
        for menu in &removed {
            self.submenu_owner.remove(menu);
            if let Some(mut area) = self.scroll_areas.remove(menu) {
                area.release(&mut self.timers);
            }
            self.store.set_hitbox(menu.clone(), None);
            self.geometry.unmount_menu(menu);
        }
        self.needs_initial.retain(|menu| !removed.contains(menu));

        let orphans: Vec<ItemKey> = self
            .items
            .iter()
            .filter(|(_, item)| removed.contains(item.parent_menu()))
            .map(|(key, _)| key)
            .collect();
        for orphan in orphans {
            self.unmount_item(orphan);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Controller
    // ─────────────────────────────────────────────────────────────────────

    pub fn open_submenu(&mut self, menu: &MenuId) -> Result<()> {
        self.request_open(menu)?;
        self.commit();
        Ok(())
    }

    pub fn close_submenu(&mut self, menu: &MenuId) {
        self.request_close(menu);
        self.commit();
    }

    /// Open or close `menu`. Returns whether it is open afterwards.
    pub fn toggle_submenu(&mut self, menu: &MenuId) -> Result<bool> {
        if self.store.is_open(menu) {
            self.close_submenu(menu);
            Ok(false)
        } else {
            self.open_submenu(menu)?;
            Ok(true)
        }
    }

    /// Close every submenu deeper than `menu`
    pub fn collapse_to(&mut self, menu: &MenuId) {
        self.request_collapse(menu);
        self.commit();
    }

    pub fn close_all(&mut self) {
        self.request_close_all();
        self.commit();
    }

    /// Ask every open submenu to reposition in the next flush
    pub fn schedule_reposition(&mut self, phase: RepositionPhase) {
        self.queue_reposition(phase);
        self.commit();
    }

    fn queue_reposition(&mut self, phase: RepositionPhase) {
        match phase {
            RepositionPhase::Initial => {
                for menu in self.store.open_path().iter() {
                    if !self.needs_initial.contains(menu) {
                        self.needs_initial.push(menu.clone());
                    }
                }
            }
            RepositionPhase::Reposition => self.reposition_pending = true,
        }
        self.emit(MenuEvent::Reposition(phase));
    }

    fn request_open(&mut self, menu: &MenuId) -> Result<()> {
        self.stats.open_calls += 1;
        tracing::debug!(menu = %menu, "open submenu");
        if let Some(closed) = self.store.open(menu, &self.tree)? {
            self.menus_closed(&closed);
        }
        Ok(())
    }

    fn request_close(&mut self, menu: &MenuId) {
        self.stats.close_calls += 1;
        tracing::debug!(menu = %menu, "close submenu");
        let closed = self.store.close(menu);
        self.menus_closed(&closed);
    }

    fn request_collapse(&mut self, menu: &MenuId) {
        self.stats.collapse_calls += 1;
        tracing::debug!(menu = %menu, "collapse open path");
        let closed = self.store.collapse_to(menu, &self.tree);
        self.menus_closed(&closed);
    }

    fn request_close_all(&mut self) {
        self.stats.close_all_calls += 1;
        tracing::debug!("close all submenus");
        let closed = self.store.clear();
        self.menus_closed(&closed);
        self.emit(MenuEvent::Dismiss);
    }

    /// Release per-open resources of menus that left the path
    fn menus_closed(&mut self, closed: &[MenuId]) {
        for menu in closed {
            self.tree.set_open(menu, false);
            if let Some(area) = self.scroll_areas.get_mut(menu) {
                area.release(&mut self.timers);
            }
            self.geometry.submenu_closed(menu);
        }
        self.needs_initial.retain(|menu| !closed.contains(menu));

        // Items inside a closed menu are gone from screen
        let mut hovered_hidden = false;
        for (key, item) in self.items.iter_mut() {
            if closed.contains(item.parent_menu()) {
                item.hide(&mut self.timers);
                hovered_hidden |= self.store.hovered() == Some(key);
            }
        }
        if hovered_hidden {
            self.timers.clear_slot(&mut self.hover_clear_timer);
            self.set_hovered(None);
        }
    }

    /// Synchronize items with the open path, then run pending layout
    fn commit(&mut self) {
        if self.store.epoch() != self.synced_epoch {
            self.synced_epoch = self.store.epoch();
            self.sync_items();
            let path = self.store.open_path().to_vec();
            self.emit(MenuEvent::OpenPathChange(path));
        }
        self.flush_layout();
    }

    /// Derive each item's state from open path membership
    fn sync_items(&mut self) {
        let keys: Vec<ItemKey> = self.items.keys().collect();
        for key in keys {
            let Some(item) = self.items.get_mut(key) else {
                continue;
            };
            let Some(menu) = item.submenu_id().cloned() else {
                continue;
            };

            let in_path = self.store.is_open(&menu);
            let shown = matches!(item.hover_state(), HoverState::Open | HoverState::PendingClose);
            let event = match (in_path, shown) {
                (true, false) => HoverEvent::PathOpened,
                (false, true) => HoverEvent::PathClosed,
                _ => continue,
            };
            item.handle(key, event, &mut self.timers, &self.config.interaction);

            let parent = item.parent_menu().clone();
            let Some(slot) = item.submenu_mut() else {
                continue;
            };
            slot.positioner.release();

            if event == HoverEvent::PathOpened {
                if slot.positioner.capture(&self.geometry, key, &parent).is_none() {
                    tracing::warn!(menu = %menu, "opener offset unavailable, anchoring on first placement");
                }
                self.tree.set_open(&menu, true);
                if !self.needs_initial.contains(&menu) {
                    self.needs_initial.push(menu);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Layout
    // ─────────────────────────────────────────────────────────────────────

    /// Position pending submenus shallowest first, then refresh stale
    /// scrollbar properties
    pub fn flush_layout(&mut self) {
        let reposition = std::mem::take(&mut self.reposition_pending);

        if reposition || !self.needs_initial.is_empty() {
            let visible = self.strategy.visible_rect(&self.geometry.viewport());
            let path = self.store.open_path().to_vec();

            for menu in &path {
                let phase = if self.needs_initial.contains(menu) {
                    RepositionPhase::Initial
                } else if reposition {
                    RepositionPhase::Reposition
                } else {
                    continue;
                };

                match self.position_menu(menu, phase, visible) {
                    Ok(_) => self.needs_initial.retain(|pending| pending != menu),
                    Err(err) => tracing::debug!(%err, "placement deferred"),
                }
            }
        }

        let menus: Vec<MenuId> = self
            .scroll_areas
            .iter()
            .filter(|(_, area)| area.is_dirty())
            .map(|(menu, _)| menu.clone())
            .collect();
        for menu in menus {
            self.refresh_scroll_properties(&menu);
        }
    }

    fn position_menu(
        &mut self,
        menu: &MenuId,
        phase: RepositionPhase,
        visible: Rect,
    ) -> std::result::Result<SubmenuPlacement, PositionError> {
        let Some(owner) = self.submenu_owner.get(menu).copied() else {
            tracing::error!(menu = %menu, "open submenu has no owning item");
            return Err(PositionError::NotAnchored(menu.clone()));
        };
        let parent = match self.items.get(owner) {
            Some(item) => item.parent_menu().clone(),
            None => {
                tracing::error!(menu = %menu, "owning item of submenu is gone");
                return Err(PositionError::NotAnchored(menu.clone()));
            }
        };

        let preferred_edge = self.preferred_edge(menu, &parent, phase);
        let z_index = self.z_index(menu);

        // Scrollbar geometry feeds into the width, so refresh it first
        if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.refresh(&self.geometry, &self.config.scroll);
        }

        let Some(slot) = self.items.get_mut(owner).and_then(|item| item.submenu_mut()) else {
            return Err(PositionError::NotAnchored(menu.clone()));
        };
        let target = PositionTarget {
            menu,
            parent_menu: &parent,
            opener: owner,
            preferred_edge,
            z_index,
        };
        let placement = slot
            .positioner
            .compute(&self.geometry, &target, visible, &self.config.layout)?;

        self.geometry.apply_placement(menu, &placement);
        if let Some(rect) = self.geometry.content_rect(menu) {
            slot.positioner.observe_resize(rect);
        }

        if phase == RepositionPhase::Initial {
            self.store.record_alignment(menu.clone(), placement.edge);
        }
        self.store.set_submenu_rect(menu.clone(), placement.rect());
        self.refresh_scroll_properties(menu);

        self.emit(MenuEvent::Placement {
            menu: menu.clone(),
            placement,
        });
        Ok(placement)
    }

    /// Edge a submenu should try first
    ///
    /// The first pass follows the parent's recorded alignment (or the
    /// menu's own preference under the root). Later passes stick to the
    /// edge chosen on the first one.
    fn preferred_edge(&self, menu: &MenuId, parent: &MenuId, phase: RepositionPhase) -> Edge {
        let fallback = self.config.layout.default_edge;
        match phase {
            RepositionPhase::Reposition => match self.store.alignment_of(menu) {
                Some(edge) => edge,
                None => {
                    tracing::error!(menu = %menu, "no alignment recorded, using default edge");
                    fallback
                }
            },
            RepositionPhase::Initial if parent == &self.root => self
                .tree
                .get(menu)
                .map_or(fallback, |node| node.preferred_edge),
            RepositionPhase::Initial => match self.store.alignment_of(parent) {
                Some(edge) => edge,
                None => {
                    tracing::error!(menu = %menu, parent = %parent, "parent has no alignment, using default edge");
                    fallback
                }
            },
        }
    }

    fn refresh_scroll_properties(&mut self, menu: &MenuId) {
        let Some(area) = self.scroll_areas.get_mut(menu) else {
            return;
        };
        let hitbox = area.refresh(&self.geometry, &self.config.scroll).hitbox;
        if menu == &self.root || self.store.is_open(menu) {
            self.store.set_hitbox(menu.clone(), hitbox);
        }
    }

    /// Recompute scrollbar properties, now or at the next flush
    pub fn update_scroll_properties(&mut self, menu: &MenuId, options: ScrollUpdateOptions) {
        if options.immediate {
            self.refresh_scroll_properties(menu);
        } else if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.mark_dirty();
        }
    }

    /// Stop an arrow-driven scroll. Returns `true` if one was running.
    pub fn end_continuous_scrolling(&mut self, menu: &MenuId) -> bool {
        let ended = match self.scroll_areas.get_mut(menu) {
            Some(area) => area.end(&mut self.timers),
            None => false,
        };
        self.commit();
        ended
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pointer input
    // ─────────────────────────────────────────────────────────────────────

    pub fn pointer_enter(&mut self, key: ItemKey) {
        let Some(item) = self.items.get_mut(key) else {
            tracing::warn!("pointer entered unknown item");
            return;
        };
        item.set_pointer_inside(true);
        if self.config.interaction.mouse_hover_events {
            item.handle(key, HoverEvent::PointerEnter, &mut self.timers, &self.config.interaction);
        }

        self.timers.clear_slot(&mut self.hover_clear_timer);
        self.set_hovered(Some(key));
        self.commit();
    }

    /// The pointer left an item's own box at `point`
    ///
    /// Moving into the item's open submenu (which lives elsewhere in the
    /// layout) is not a leave.
    pub fn pointer_leave(&mut self, key: ItemKey, point: Point) {
        if !self.items.contains_key(key) || self.region_contains(key, point) {
            return;
        }
        self.leave_item(key);
        self.commit();
    }

    /// Re-check every latched or open item against the pointer position
    pub fn pointer_move(&mut self, point: Point) {
        let candidates: Vec<ItemKey> = self
            .items
            .iter()
            .filter(|(_, item)| item.pointer_inside() || item.hover_state() != HoverState::Closed)
            .map(|(key, _)| key)
            .collect();

        for key in candidates {
            let inside = self.region_contains(key, point);
            let Some(item) = self.items.get_mut(key) else {
                continue;
            };
            match (inside, item.pointer_inside()) {
                (true, false) => {
                    item.set_pointer_inside(true);
                    if self.config.interaction.mouse_hover_events {
                        item.handle(key, HoverEvent::PointerEnter, &mut self.timers, &self.config.interaction);
                    }
                }
                (false, true) => self.leave_item(key),
                _ => {}
            }
        }
        self.commit();
    }

    fn leave_item(&mut self, key: ItemKey) {
        let Some(item) = self.items.get_mut(key) else {
            return;
        };
        item.set_pointer_inside(false);
        if self.config.interaction.mouse_hover_events {
            item.handle(key, HoverEvent::PointerLeave, &mut self.timers, &self.config.interaction);
        }

        if self.store.hovered() == Some(key) {
            self.timers.clear_slot(&mut self.hover_clear_timer);
            self.hover_clear_timer = Some(self.timers.set_timeout(
                self.config.interaction.hover_close_delay_ms,
                TimerTask::HoverClear(key),
            ));
        }
    }

    /// Item box plus every open submenu below it and their scrollbar hit-boxes
    fn region_contains(&self, key: ItemKey, point: Point) -> bool {
        if rect_contains(self.geometry.item_rect(key).as_ref(), point) {
            return true;
        }
        let Some(menu) = self.items.get(key).and_then(DropdownItem::submenu_id) else {
            return false;
        };
        let path = self.store.open_path();
        let Some(start) = path.position(menu) else {
            return false;
        };
        path[start..].iter().any(|open| {
            rect_contains(self.store.submenu_rect(open), point)
                || rect_contains(self.store.hitbox(open), point)
        })
    }

    fn set_hovered(&mut self, key: Option<ItemKey>) {
        if self.store.set_hovered(key) {
            self.emit(MenuEvent::HoverChange(key));
        }
    }

    pub fn pointer_down(&mut self, target: PointerDownTarget) {
        match target {
            PointerDownTarget::ScrollArrow {
                menu,
                direction,
                pointer,
            } => {
                self.suppress_next_click = true;
                if pointer != PointerKind::Mouse {
                    self.begin_continuous_scroll(&menu, direction, pointer);
                }
            }
            PointerDownTarget::Item(_) | PointerDownTarget::Elsewhere => {
                self.suppress_next_click = false;
            }
        }
        self.commit();
    }

    /// End touch or pen holds on scroll arrows
    pub fn pointer_up(&mut self) {
        for area in self.scroll_areas.values_mut() {
            if matches!(area.active_pointer(), Some(PointerKind::Touch | PointerKind::Pen)) {
                area.end(&mut self.timers);
            }
        }
        self.commit();
    }

    pub fn click(&mut self, key: ItemKey) -> ClickOutcome {
        if std::mem::take(&mut self.suppress_next_click) {
            tracing::trace!("click after scroll arrow press suppressed");
            return ClickOutcome {
                suppressed: true,
                ..ClickOutcome::default()
            };
        }

        let Some(item) = self.items.get_mut(key) else {
            tracing::warn!("click on unknown item");
            return ClickOutcome {
                propagate: true,
                ..ClickOutcome::default()
            };
        };
        item.cancel_timers(&mut self.timers);
        let submenu = item.submenu_id().cloned();
        let parent = item.parent_menu().clone();

        let outcome = match submenu {
            Some(menu) => {
                if self.store.is_open(&menu) {
                    self.request_close(&menu);
                } else if let Err(err) = self.request_open(&menu) {
                    tracing::warn!(%err, "submenu toggle failed");
                }
                ClickOutcome::default()
            }
            None if self.config.interaction.close_on_click_leaf_item => {
                self.request_close_all();
                ClickOutcome {
                    propagate: true,
                    dismissed: true,
                    suppressed: false,
                }
            }
            None => {
                self.request_collapse(&parent);
                ClickOutcome::default()
            }
        };

        self.commit();
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scrolling
    // ─────────────────────────────────────────────────────────────────────

    pub fn scroll_arrow_enter(&mut self, menu: &MenuId, direction: ScrollDirection) {
        if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.set_pointer_on_arrow(true);
        }
        self.begin_continuous_scroll(menu, direction, PointerKind::Mouse);
        self.commit();
    }

    pub fn scroll_arrow_leave(&mut self, menu: &MenuId) {
        if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.set_pointer_on_arrow(false);
            area.end(&mut self.timers);
        }
        self.commit();
    }

    fn begin_continuous_scroll(
        &mut self,
        menu: &MenuId,
        direction: ScrollDirection,
        pointer: PointerKind,
    ) {
        let Some(metrics) = self.geometry.scroll_metrics(menu) else {
            tracing::warn!(menu = %menu, "scroll arrow on a menu without scroll metrics");
            return;
        };
        if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.begin(direction, pointer, &metrics, &self.config.scroll, &mut self.timers);
        }
    }

    /// Feed a wheel event over `menu`. Allowed deltas are applied to the
    /// menu's scroll position.
    pub fn wheel(&mut self, menu: &MenuId, delta_y: f32, timestamp_ms: u64) -> WheelOutcome {
        let Some(area) = self.scroll_areas.get_mut(menu) else {
            return WheelOutcome::Allow;
        };
        let outcome = area.on_wheel(delta_y, timestamp_ms, &self.config.scroll, &mut self.timers);

        if outcome == WheelOutcome::Allow {
            if let Some(metrics) = self.geometry.scroll_metrics(menu) {
                let target = (metrics.scroll_top + delta_y).clamp(0.0, metrics.max_scroll_top());
                self.geometry.set_scroll_top(menu, target);
                self.menu_scrolled(menu);
            }
        }
        self.commit();
        outcome
    }

    /// The host scrolled a menu
    pub fn on_menu_scroll(&mut self, menu: &MenuId) {
        self.menu_scrolled(menu);
        self.commit();
    }

    fn menu_scrolled(&mut self, menu: &MenuId) {
        if let Some(area) = self.scroll_areas.get_mut(menu) {
            area.mark_dirty();
        }
        let has_open_child = match self.store.open_path().deepest() {
            Some(deepest) => deepest != menu && self.tree.is_ancestor_or_self(menu, deepest),
            None => false,
        };
        if has_open_child {
            self.queue_reposition(RepositionPhase::Reposition);
        }
    }

    /// The viewport or the page layout changed
    pub fn on_resize(&mut self) {
        for area in self.scroll_areas.values_mut() {
            area.mark_dirty();
        }
        self.queue_reposition(RepositionPhase::Reposition);
        self.commit();
    }

    /// A resize observer reported `rect` for a submenu's content
    ///
    /// Echoes of the engine's own placement are ignored.
    pub fn observe_content_resize(&mut self, menu: &MenuId, rect: Rect) {
        let Some(owner) = self.submenu_owner.get(menu).copied() else {
            return;
        };
        let changed = self
            .items
            .get_mut(owner)
            .and_then(|item| item.submenu_mut())
            .is_some_and(|slot| slot.positioner.observe_resize(rect));

        if changed && self.store.is_open(menu) {
            tracing::trace!(menu = %menu, "content resized");
            if let Some(area) = self.scroll_areas.get_mut(menu) {
                area.mark_dirty();
            }
            self.queue_reposition(RepositionPhase::Reposition);
            self.commit();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Time
    // ─────────────────────────────────────────────────────────────────────

    /// Run every timer due at or before `now_ms`, one at a time
    pub fn advance(&mut self, now_ms: u64) {
        while let Some((id, task)) = self.timers.pop_due(now_ms) {
            self.run_timer(id, task);
            self.commit();
        }
        self.timers.advance_clock(now_ms);
        self.commit();
    }

    /// Advance the clock by `delta_ms`
    pub fn advance_by(&mut self, delta_ms: u64) {
        self.advance(self.timers.now() + delta_ms);
    }

    fn run_timer(&mut self, id: TimerId, task: TimerTask) {
        match task {
            TimerTask::OpenIntent(key) => {
                let Some(item) = self.items.get_mut(key) else {
                    return;
                };
                item.timer_fired(id);
                let parent = item.parent_menu();
                let shown = parent == &self.root || self.store.is_open(parent);
                if shown && item.hover_state() == HoverState::PendingOpen && item.pointer_inside() {
                    if let Some(menu) = item.submenu_id().cloned() {
                        if let Err(err) = self.request_open(&menu) {
                            tracing::warn!(%err, "hover open failed");
                        }
                    }
                }
            }
            TimerTask::CloseIntent(key) => {
                let Some(item) = self.items.get_mut(key) else {
                    return;
                };
                item.timer_fired(id);
                if item.hover_state() == HoverState::PendingClose && !item.pointer_inside() {
                    if let Some(menu) = item.submenu_id().cloned() {
                        self.request_close(&menu);
                    }
                }
            }
            TimerTask::HoverClear(key) => {
                if self.hover_clear_timer == Some(id) {
                    self.hover_clear_timer = None;
                }
                let still_inside = self.items.get(key).is_some_and(DropdownItem::pointer_inside);
                if self.store.hovered() == Some(key) && !still_inside {
                    self.set_hovered(None);
                }
            }
            TimerTask::ScrollStep(menu) => {
                let scrolled = match self.scroll_areas.get_mut(&menu) {
                    Some(area) => area.step(&mut self.geometry, &self.config.scroll, &mut self.timers),
                    None => {
                        self.timers.clear(id);
                        false
                    }
                };
                if scrolled {
                    self.menu_scrolled(&menu);
                }
            }
            TimerTask::MomentumSettle(menu) => {
                if let Some(area) = self.scroll_areas.get_mut(&menu) {
                    area.momentum_settled(id);
                }
            }
        }
    }
}

impl<G: GeometryProvider + std::fmt::Debug> std::fmt::Debug for Dropdown<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dropdown")
            .field("root", &self.root)
            .field("open_path", self.store.open_path())
            .field("items", &self.items.len())
            .field("timers", &self.timers.len())
            .field("stats", &self.stats)
            .finish()
    }
}
