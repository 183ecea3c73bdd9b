//! Cascade Menu
//!
//! A headless engine for nested dropdown menus: submenus that open on
//! hover intent or click, sit beside their opener without leaving the
//! visible viewport, and scroll with arrows, wheel or a custom scrollbar.
//!
//! The engine does no rendering and no measuring. Hosts implement
//! [`GeometryProvider`] over their layout engine, forward input to a
//! [`Dropdown`], and drive time with [`Dropdown::advance`].
//!
//! # Example
//!
//! ```rust
//! use cascade_core::geometry::Point;
//! use cascade_menu::prelude::*;
//!
//! let geometry = HeadlessGeometry::new(ViewportSnapshot::simple(1280.0, 800.0));
//! let mut dropdown = Dropdown::new("root", geometry, MenuConfig::default()).unwrap();
//! let root = dropdown.root().clone();
//! dropdown
//!     .geometry_mut()
//!     .place_menu(&root, Point::new(0.0, 0.0), 220.0, None);
//!
//! let file = dropdown.add_item(&root, "File").unwrap();
//! let file_menu = dropdown.set_submenu_id(file, "file").unwrap();
//!
//! dropdown.pointer_enter(file);
//! dropdown.advance(200);
//! assert_eq!(dropdown.open_path().to_vec(), vec![file_menu]);
//! ```

pub mod config;
pub mod dropdown;
pub mod error;
pub mod headless;
pub mod id;
pub mod item;
pub mod position;
pub mod scroll;
pub mod store;
pub mod tree;
pub mod viewport;

pub use config::MenuConfig;
pub use dropdown::{
    ClickOutcome, ControllerStats, Dropdown, MenuEvent, MenuEventKind, PointerDownTarget,
    ScrollUpdateOptions,
};
pub use error::{MenuError, PositionError, Result};
pub use headless::HeadlessGeometry;
pub use id::{ItemKey, MenuId};
pub use position::{RepositionPhase, SubmenuPlacement};
pub use tree::Edge;
pub use viewport::{GeometryProvider, ViewportSnapshot, ViewportStrategy};

/// Common imports for hosts
pub mod prelude {
    pub use crate::config::MenuConfig;
    pub use crate::dropdown::{
        ClickOutcome, Dropdown, MenuEvent, MenuEventKind, PointerDownTarget, ScrollUpdateOptions,
    };
    pub use crate::error::{MenuError, Result};
    pub use crate::headless::HeadlessGeometry;
    pub use crate::id::{ItemKey, MenuId};
    pub use crate::item::HoverState;
    pub use crate::position::RepositionPhase;
    pub use crate::scroll::{PointerKind, ScrollDirection, WheelOutcome};
    pub use crate::tree::Edge;
    pub use crate::viewport::{GeometryProvider, ViewportSnapshot, ViewportStrategy};
}
