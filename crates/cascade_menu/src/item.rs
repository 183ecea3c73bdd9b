//! Dropdown items and the hover/open state machine
//!
//! Every item tracks whether the pointer is over its region and, when it
//! opens a submenu, a four-state hover machine:
//!
//! ```text
//!            enter                 path opened
//!   Closed ────────► PendingOpen ───────────────► Open
//!     ▲     ◄──────── (leave)                    │  ▲
//!     │                                     leave│  │enter
//!     │           path closed                    ▼  │
//!     └──────────────────────────────────── PendingClose
//! ```
//!
//! Timer expiry never moves the machine by itself. An expired intent timer
//! asks the controller to open or close the submenu; the machine follows
//! once the controller's open path changes. Leaf items stay `Closed`.

use cascade_core::fsm::{Machine, StateTransitions};
use cascade_core::timer::{TimerId, TimerQueue};

use crate::config::InteractionConfig;
use crate::dropdown::TimerTask;
use crate::id::{ItemKey, MenuId};
use crate::position::SubmenuPositioner;

/// Hover/open state of a submenu-bearing item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HoverState {
    #[default]
    Closed,
    /// Open-intent timer running
    PendingOpen,
    Open,
    /// Close-intent timer running
    PendingClose,
}

/// Inputs of [`HoverState`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HoverEvent {
    PointerEnter,
    PointerLeave,
    /// The controller's open path now contains this item's submenu
    PathOpened,
    /// The controller's open path no longer contains this item's submenu
    PathClosed,
}

impl StateTransitions for HoverState {
    type Event = HoverEvent;

    fn on_event(&self, event: HoverEvent) -> Option<Self> {
        use HoverEvent::*;
        use HoverState::*;

        match (self, event) {
            (Closed, PointerEnter) => Some(PendingOpen),
            (PendingOpen, PointerLeave) => Some(Closed),
            (Open, PointerLeave) => Some(PendingClose),
            (PendingClose, PointerEnter) => Some(Open),
            (Closed | PendingOpen | PendingClose, PathOpened) => Some(Open),
            (Open | PendingClose, PathClosed) => Some(Closed),
            _ => None,
        }
    }
}

/// The submenu an item opens
#[derive(Clone, Debug)]
pub struct SubmenuSlot {
    pub id: MenuId,
    pub positioner: SubmenuPositioner,
}

/// ARIA attributes for an item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AriaAttributes {
    pub role: &'static str,
    pub has_popup: Option<&'static str>,
    pub expanded: Option<bool>,
    pub controls: Option<MenuId>,
}

/// A mounted dropdown item
#[derive(Debug)]
pub struct DropdownItem {
    parent_menu: MenuId,
    label: String,
    submenu: Option<SubmenuSlot>,
    machine: Machine<HoverState>,
    /// Pointer is over the item or its open descendants
    pointer_inside: bool,
    open_timer: Option<TimerId>,
    close_timer: Option<TimerId>,
}

impl DropdownItem {
    pub fn new(parent_menu: MenuId, label: impl Into<String>) -> Self {
        Self {
            parent_menu,
            label: label.into(),
            submenu: None,
            machine: Machine::new(HoverState::Closed),
            pointer_inside: false,
            open_timer: None,
            close_timer: None,
        }
    }

    pub fn parent_menu(&self) -> &MenuId {
        &self.parent_menu
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn is_leaf(&self) -> bool {
        self.submenu.is_none()
    }

    pub fn submenu(&self) -> Option<&SubmenuSlot> {
        self.submenu.as_ref()
    }

    pub fn submenu_id(&self) -> Option<&MenuId> {
        self.submenu.as_ref().map(|slot| &slot.id)
    }

    pub(crate) fn submenu_mut(&mut self) -> Option<&mut SubmenuSlot> {
        self.submenu.as_mut()
    }

    pub(crate) fn attach_submenu(&mut self, id: MenuId) -> Option<SubmenuSlot> {
        self.submenu.replace(SubmenuSlot {
            id,
            positioner: SubmenuPositioner::new(),
        })
    }

    pub(crate) fn detach_submenu(&mut self) -> Option<SubmenuSlot> {
        self.machine = Machine::new(HoverState::Closed);
        self.submenu.take()
    }

    pub fn hover_state(&self) -> HoverState {
        self.machine.current()
    }

    pub fn pointer_inside(&self) -> bool {
        self.pointer_inside
    }

    pub(crate) fn set_pointer_inside(&mut self, inside: bool) {
        self.pointer_inside = inside;
    }

    pub fn has_pending_timers(&self) -> bool {
        self.open_timer.is_some() || self.close_timer.is_some()
    }

    /// Feed a hover event, arming or cancelling intent timers to match the
    /// new state. Returns the new state if a transition happened.
    pub(crate) fn handle(
        &mut self,
        key: ItemKey,
        event: HoverEvent,
        timers: &mut TimerQueue<TimerTask>,
        delays: &InteractionConfig,
    ) -> Option<HoverState> {
        if self.is_leaf() {
            return None;
        }

        let from = self.machine.current();
        let to = self.machine.send(event)?;

        if from == HoverState::PendingOpen {
            timers.clear_slot(&mut self.open_timer);
        }
        if from == HoverState::PendingClose {
            timers.clear_slot(&mut self.close_timer);
        }
        match to {
            HoverState::PendingOpen => {
                timers.clear_slot(&mut self.open_timer);
                self.open_timer = Some(
                    timers.set_timeout(delays.hover_open_delay_ms, TimerTask::OpenIntent(key)),
                );
            }
            HoverState::PendingClose => {
                timers.clear_slot(&mut self.close_timer);
                self.close_timer = Some(
                    timers.set_timeout(delays.hover_close_delay_ms, TimerTask::CloseIntent(key)),
                );
            }
            HoverState::Open | HoverState::Closed => {}
        }
        Some(to)
    }

    /// Mark a fired timer as consumed
    pub(crate) fn timer_fired(&mut self, timer: TimerId) {
        if self.open_timer == Some(timer) {
            self.open_timer = None;
        }
        if self.close_timer == Some(timer) {
            self.close_timer = None;
        }
    }

    /// Cancel every pending timer
    pub(crate) fn cancel_timers(&mut self, timers: &mut TimerQueue<TimerTask>) {
        timers.clear_slot(&mut self.open_timer);
        timers.clear_slot(&mut self.close_timer);
    }

    /// The menu holding this item closed. Drops pending timers, the pointer
    /// latch and any open state.
    pub(crate) fn hide(&mut self, timers: &mut TimerQueue<TimerTask>) {
        self.cancel_timers(timers);
        self.pointer_inside = false;
        if !self.machine.is_in(HoverState::Closed) {
            self.machine = Machine::new(HoverState::Closed);
        }
        if let Some(slot) = self.submenu.as_mut() {
            slot.positioner.release();
        }
    }

    pub fn aria(&self) -> AriaAttributes {
        match &self.submenu {
            Some(slot) => AriaAttributes {
                role: "menuitem",
                has_popup: Some("menu"),
                expanded: Some(matches!(
                    self.hover_state(),
                    HoverState::Open | HoverState::PendingClose
                )),
                controls: Some(slot.id.clone()),
            },
            None => AriaAttributes {
                role: "menuitem",
                has_popup: None,
                expanded: None,
                controls: None,
            },
        }
    }
}
