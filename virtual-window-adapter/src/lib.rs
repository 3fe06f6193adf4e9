//! A debounced windowing session for the `virtual-window` crate.
//!
//! The `virtual-window` crate is UI-agnostic and focuses on the core math. This crate wraps it
//! in the loop every adapter ends up writing:
//!
//! - Dirty tracking with a single debounced recompute per burst of events
//! - Scroll-to-item, instant or tween-driven (adapter-driven ticks)
//! - Scroll anchoring when items above the viewport change size
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod options;
mod session;
mod tween;


pub use options::SessionOptions;
pub use session::{Dirty, Session};
pub use tween::Easing;
