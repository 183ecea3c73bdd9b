//! Dropdown configuration
//!
//! Every delay, step and padding the engine uses lives here. A config can be
//! built in code or loaded from a TOML table:
//!
//! ```toml
//! [interaction]
//! hover_open_delay_ms = 150
//! close_on_click_leaf_item = false
//!
//! [scroll]
//! mouse_step_px = 20.0
//!
//! [layout]
//! default_edge = "left"
//! viewport_strategy = "variant-b"
//! ```

use cascade_core::kick::KickConfig;
use serde::{Deserialize, Serialize};

use crate::error::{MenuError, Result};
use crate::tree::Edge;
use crate::viewport::StrategyPreference;

/// Top-level dropdown configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MenuConfig {
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub kick: KickConfig,
}

impl MenuConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: MenuConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !(0.0..0.5).contains(&layout.viewport_padding_ratio) {
            return Err(MenuError::InvalidConfig(format!(
                "layout.viewport_padding_ratio must be in [0, 0.5), got {}",
                layout.viewport_padding_ratio
            )));
        }
        if layout.ideal_min_width < 0.0 || !layout.ideal_min_width.is_finite() {
            return Err(MenuError::InvalidConfig(format!(
                "layout.ideal_min_width must be a non-negative number, got {}",
                layout.ideal_min_width
            )));
        }
        if self.scroll.interval_ms == 0 {
            return Err(MenuError::InvalidConfig(
                "scroll.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.scroll.mouse_step_px <= 0.0 || self.scroll.touch_step_px <= 0.0 {
            return Err(MenuError::InvalidConfig(
                "scroll steps must be positive".to_string(),
            ));
        }
        if self.kick.min_dt_ms > self.kick.max_dt_ms {
            return Err(MenuError::InvalidConfig(format!(
                "kick.min_dt_ms ({}) exceeds kick.max_dt_ms ({})",
                self.kick.min_dt_ms, self.kick.max_dt_ms
            )));
        }
        Ok(())
    }
}

/// Hover and click behavior
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct InteractionConfig {
    /// Dwell time before a hovered submenu item opens
    #[serde(default = "default_intent_delay")]
    pub hover_open_delay_ms: u64,
    /// Grace period before a left submenu item closes
    #[serde(default = "default_intent_delay")]
    pub hover_close_delay_ms: u64,
    /// Open and close submenus on hover
    #[serde(default = "default_true")]
    pub mouse_hover_events: bool,
    /// Dismiss the whole dropdown when a leaf item is clicked
    #[serde(default = "default_true")]
    pub close_on_click_leaf_item: bool,
}

fn default_intent_delay() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_open_delay_ms: default_intent_delay(),
            hover_close_delay_ms: default_intent_delay(),
            mouse_hover_events: true,
            close_on_click_leaf_item: true,
        }
    }
}

/// Scroll arrows, wheel filtering and the custom scrollbar
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScrollConfig {
    /// Step per tick while a mouse rests on a scroll arrow
    #[serde(default = "default_mouse_step")]
    pub mouse_step_px: f32,
    /// Step per tick during a touch or pen hold
    #[serde(default = "default_touch_step")]
    pub touch_step_px: f32,
    /// Continuous scroll tick interval
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// Quiet period after which wheel momentum is presumed settled
    #[serde(default = "default_settle")]
    pub momentum_settle_ms: u64,
    /// Width of the scrollbar hit-box on the trailing edge
    #[serde(default = "default_hitbox_width")]
    pub hitbox_width: f32,
    /// Shortest scrollbar thumb
    #[serde(default = "default_min_thumb")]
    pub min_thumb_length: f32,
    /// Sub-pixel slack when testing for the scroll edges
    #[serde(default = "default_edge_tolerance")]
    pub edge_tolerance: f32,
}

fn default_mouse_step() -> f32 {
    15.0
}

fn default_touch_step() -> f32 {
    30.0
}

fn default_interval() -> u64 {
    30
}

fn default_settle() -> u64 {
    200
}

fn default_hitbox_width() -> f32 {
    12.0
}

fn default_min_thumb() -> f32 {
    20.0
}

fn default_edge_tolerance() -> f32 {
    1.0
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            mouse_step_px: default_mouse_step(),
            touch_step_px: default_touch_step(),
            interval_ms: default_interval(),
            momentum_settle_ms: default_settle(),
            hitbox_width: default_hitbox_width(),
            min_thumb_length: default_min_thumb(),
            edge_tolerance: default_edge_tolerance(),
        }
    }
}

/// Submenu placement
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Edge used when a menu has no recorded alignment
    #[serde(default)]
    pub default_edge: Edge,
    /// Horizontal padding on each side, as a fraction of the visible width
    #[serde(default = "default_padding_ratio")]
    pub viewport_padding_ratio: f32,
    /// Submenus are never narrower than this unless the viewport is
    #[serde(default = "default_ideal_min_width")]
    pub ideal_min_width: f32,
    /// Gap between an opener and its submenu
    #[serde(default = "default_gap")]
    pub submenu_gap: f32,
    /// Z-index of depth 0
    #[serde(default = "default_z_base")]
    pub z_index_base: i32,
    /// Visual viewport coordinate handling
    #[serde(default)]
    pub viewport_strategy: StrategyPreference,
}

fn default_padding_ratio() -> f32 {
    0.01
}

fn default_ideal_min_width() -> f32 {
    200.0
}

fn default_gap() -> f32 {
    1.0
}

fn default_z_base() -> i32 {
    10
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_edge: Edge::default(),
            viewport_padding_ratio: default_padding_ratio(),
            ideal_min_width: default_ideal_min_width(),
            submenu_gap: default_gap(),
            z_index_base: default_z_base(),
            viewport_strategy: StrategyPreference::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MenuConfig::default();
        assert_eq!(config.interaction.hover_open_delay_ms, 200);
        assert_eq!(config.scroll.mouse_step_px, 15.0);
        assert_eq!(config.scroll.touch_step_px, 30.0);
        assert_eq!(config.layout.z_index_base, 10);
        assert_eq!(config.layout.default_edge, Edge::Right);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = MenuConfig::from_toml_str(
            r#"
            [interaction]
            hover_open_delay_ms = 150
            close_on_click_leaf_item = false

            [layout]
            default_edge = "left"
            viewport_strategy = "variant-b"

            [kick]
            required_streak = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.interaction.hover_open_delay_ms, 150);
        assert_eq!(config.interaction.hover_close_delay_ms, 200);
        assert!(!config.interaction.close_on_click_leaf_item);
        assert_eq!(config.layout.default_edge, Edge::Left);
        assert_eq!(config.layout.viewport_strategy, StrategyPreference::VariantB);
        assert_eq!(config.kick.required_streak, 3);
        assert_eq!(config.kick.baseline_tau_ms, 100.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(MenuConfig::from_toml_str("").unwrap(), MenuConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = MenuConfig::from_toml_str("[scroll]\ninterval_ms = 0\n").unwrap_err();
        assert!(matches!(err, MenuError::InvalidConfig(_)));

        let err = MenuConfig::from_toml_str("[layout]\nviewport_padding_ratio = 0.7\n").unwrap_err();
        assert!(matches!(err, MenuError::InvalidConfig(_)));

        let err = MenuConfig::from_toml_str("[interaction]\nhover_open_delay_ms = \"soon\"\n")
            .unwrap_err();
        assert!(matches!(err, MenuError::Config(_)));
    }
}
