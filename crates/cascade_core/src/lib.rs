//! Cascade Core
//!
//! UI-agnostic primitives shared by the Cascade menu engine:
//!
//! - **Geometry**: points, sizes, rectangles, safe clamping
//! - **Events**: typed pub/sub emitter with listener handles
//! - **State Machines**: transition tables for interaction states
//! - **Timers**: cooperative timeout/interval queue driven by the host clock
//! - **Kick Detection**: separates fresh wheel gestures from momentum
//!
//! # Example
//!
//! ```rust
//! use cascade_core::timer::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! timers.set_timeout(200, "open-intent");
//!
//! assert!(timers.pop_due(100).is_none());
//! assert_eq!(timers.pop_due(200).map(|(_, task)| task), Some("open-intent"));
//! ```

pub mod events;
pub mod fsm;
pub mod geometry;
pub mod kick;
pub mod timer;

pub use events::{EventEmitter, ListenerId};
pub use fsm::{Machine, StateTransitions};
pub use geometry::{clamp, rect_contains, rects_equal, Point, Rect, Size};
pub use kick::{KickConfig, KickSample, VelocityKickDetector};
pub use timer::{TimerId, TimerQueue};
