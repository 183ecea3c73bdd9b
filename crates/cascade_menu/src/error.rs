use thiserror::Error;

use crate::id::MenuId;

/// Errors raised by the menu controller and its collaborators
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("unknown menu: {0}")]
    UnknownMenu(MenuId),

    #[error("unknown menu item")]
    UnknownItem,

    #[error("menu already registered: {0}")]
    DuplicateMenu(MenuId),

    #[error("failed to parse menu config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid menu config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Reasons a positioning pass was skipped
///
/// These are expected while a submenu is still hidden or its layout handles
/// are being attached. The next resize, scroll or reposition broadcast
/// retries the pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("submenu {menu} is missing layout handles: {missing:?}")]
    MissingHandles {
        menu: MenuId,
        missing: Vec<&'static str>,
    },

    #[error("submenu {0} has no open anchor")]
    NotAnchored(MenuId),
}

/// Result type for menu operations
pub type Result<T> = std::result::Result<T, MenuError>;
