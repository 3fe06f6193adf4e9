use virtual_window::{
    Axis, CacheOptions, DEFAULT_ITEMS_OFFSET, DEFAULT_TYPICAL_SIZE, ViewportBounds, WindowOptions,
};

/// Configuration of a [`crate::Session`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionOptions {
    pub axis: Axis,
    pub typical_size: f64,
    pub items_offset: usize,
    pub dynamic_size: bool,
    pub snap: bool,
    /// Quiet time after the last trigger before the window is recomputed. With `0`, every trigger
    /// seen before a tick is folded into that tick's recompute.
    pub recompute_delay_ms: u64,
    /// Shift the scroll offset when items above the viewport change size (dynamic mode only).
    pub anchor_on_resize: bool,
    pub cache: CacheOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            axis: Axis::Vertical,
            typical_size: DEFAULT_TYPICAL_SIZE,
            items_offset: DEFAULT_ITEMS_OFFSET,
            dynamic_size: false,
            snap: false,
            recompute_delay_ms: 0,
            anchor_on_resize: true,
            cache: CacheOptions::default(),
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_typical_size(mut self, typical_size: f64) -> Self {
        self.typical_size = typical_size;
        self
    }

    pub fn with_items_offset(mut self, items_offset: usize) -> Self {
        self.items_offset = items_offset;
        self
    }

    pub fn with_dynamic_size(mut self, dynamic_size: bool) -> Self {
        self.dynamic_size = dynamic_size;
        self
    }

    pub fn with_snap(mut self, snap: bool) -> Self {
        self.snap = snap;
        self
    }

    pub fn with_recompute_delay_ms(mut self, delay_ms: u64) -> Self {
        self.recompute_delay_ms = delay_ms;
        self
    }

    pub fn with_anchor_on_resize(mut self, anchor: bool) -> Self {
        self.anchor_on_resize = anchor;
        self
    }

    pub fn with_cache_options(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    /// The per-frame engine options for `viewport` at `scroll_offset`.
    pub fn window_options(&self, viewport: ViewportBounds, scroll_offset: f64) -> WindowOptions {
        WindowOptions {
            viewport,
            axis: self.axis,
            typical_size: self.typical_size,
            items_offset: self.items_offset,
            dynamic_size: self.dynamic_size,
            scroll_offset,
            snap: self.snap,
        }
    }
}
