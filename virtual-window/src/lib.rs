//! A headless windowing engine for very large lists.
//!
//! Given a scroll offset, a viewport and an ordered collection of keyed items, this crate decides
//! which items must be rendered, where, which sticky item (if any) is pinned at the viewport
//! edge, and how to hand a small pool of reusable render slots to the items of the new frame.
//!
//! The pieces, in data-flow order:
//! - [`MeasurementCache`]: measured bounds per key, versioned, with debounced change
//!   notifications and a smoothed scroll-direction classifier.
//! - [`compute_window`] / [`ItemMetrics`]: visible range, offscreen buffer, sticky resolution and
//!   the ordered [`RenderDescriptor`]s of a frame.
//! - [`SlotTracker`]: maps descriptors onto [`RenderSlot`]s with minimal rebinding.
//!
//! It is UI-agnostic and never reads a clock: the host passes timestamps (`now_ms`) to the
//! debounced parts. For a ready-made scheduler loop, see the `virtual-window-adapter` crate.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod cache;
mod debounce;
mod error;
mod fenwick;
mod key;
mod metrics;
mod sticky;
mod tracker;
mod types;
mod window;

#[cfg(test)]
mod tests;

pub use cache::{
    CacheOptions, DIRECTION_WINDOW_CAPACITY, DIRECTION_WINDOW_IDLE_LEN, MAX_SAFE_VERSION,
    MeasurementCache, OnVersionChange, SizeChange,
};
pub use debounce::Debouncer;
pub use error::WindowError;
pub use key::{ItemId, Keyed, ensure_unique_keys, index_by_key};
pub use metrics::ItemMetrics;
pub use sticky::{Stickiness, StickyMap};
pub use tracker::{RenderSlot, SlotId, SlotTracker, TrackReport};
pub use types::{
    Align, Axis, Bounds, DescriptorConfig, RenderDescriptor, ScrollDirection, Window, WindowRange,
};
pub use window::{
    DEFAULT_ITEMS_OFFSET, DEFAULT_TYPICAL_SIZE, ViewportBounds, WindowOptions, compute_window,
    compute_window_with,
};

#[doc(hidden)]
pub use key::KeyCacheKey;
