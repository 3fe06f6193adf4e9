use crate::key::ensure_unique_keys;
use crate::{
    Axis, Bounds, DescriptorConfig, ItemMetrics, Keyed, MeasurementCache, RenderDescriptor,
    Stickiness, StickyMap, Window, WindowError, WindowRange,
};

/// Fallback item size for unmeasured items (and every item when dynamic sizing is off).
pub const DEFAULT_TYPICAL_SIZE: f64 = 24.0;

/// Items rendered beyond each edge of the viewport.
pub const DEFAULT_ITEMS_OFFSET: usize = 2;

/// Width and height of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportBounds {
    pub width: f64,
    pub height: f64,
}

impl ViewportBounds {
    pub fn new(width: f64, height: f64) -> Result<Self, WindowError> {
        let viewport = Self { width, height };
        viewport.validate()?;
        Ok(viewport)
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        if self.width < 0.0 || self.height < 0.0 {
            return Err(WindowError::NegativeViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn main_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.height,
            Axis::Horizontal => self.width,
        }
    }

    pub fn cross_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.width,
            Axis::Horizontal => self.height,
        }
    }
}

/// Inputs of one recompute besides the collection, sticky map and cache.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowOptions {
    pub viewport: ViewportBounds,
    pub axis: Axis,
    /// Size of unmeasured items. Non-positive or non-finite values fall back to
    /// [`DEFAULT_TYPICAL_SIZE`].
    pub typical_size: f64,
    /// Offscreen buffer on each side of the visible range.
    pub items_offset: usize,
    /// Use measured sizes from the cache instead of the typical size.
    pub dynamic_size: bool,
    /// Scroll offset along `axis`. Negative or `NaN` values count as 0; values past the end are
    /// not clamped.
    pub scroll_offset: f64,
    /// Enables sticky items.
    pub snap: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            viewport: ViewportBounds::default(),
            axis: Axis::Vertical,
            typical_size: DEFAULT_TYPICAL_SIZE,
            items_offset: DEFAULT_ITEMS_OFFSET,
            dynamic_size: false,
            scroll_offset: 0.0,
            snap: false,
        }
    }
}

impl WindowOptions {
    pub fn new(viewport: ViewportBounds) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, viewport: ViewportBounds) -> Self {
        self.viewport = viewport;
        self
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

    pub fn with_scroll_offset(mut self, scroll_offset: f64) -> Self {
        self.scroll_offset = scroll_offset;
        self
    }

    pub fn with_snap(mut self, snap: bool) -> Self {
        self.snap = snap;
        self
    }

    pub fn effective_typical_size(&self) -> f64 {
        if self.typical_size.is_finite() && self.typical_size > 0.0 {
            self.typical_size
        } else {
            DEFAULT_TYPICAL_SIZE
        }
    }

    pub fn effective_scroll_offset(&self) -> f64 {
        if self.scroll_offset > 0.0 {
            self.scroll_offset
        } else {
            0.0
        }
    }
}

/// Computes the render window for one frame.
///
/// Builds fresh [`ItemMetrics`] (an `O(n)` walk when `options.dynamic_size` is set). Adapters
/// that recompute on every scroll tick should keep the metrics around and call
/// [`compute_window_with`] instead.
///
/// # Panics
///
/// Panics on a negative viewport dimension. Item keys must be unique; this is only checked in
/// debug builds.
pub fn compute_window<T: Keyed + Clone>(
    items: &[T],
    sticky: &StickyMap<T::Key>,
    cache: &MeasurementCache<T::Key>,
    options: &WindowOptions,
) -> Window<T::Key, T> {
    let metrics = ItemMetrics::for_options(items, cache, options);
    compute_window_with(&metrics, items, sticky, options)
}

/// Same as [`compute_window`], reusing metrics built for `items`.
///
/// Metrics built [`with_sticky_index`](ItemMetrics::with_sticky_index) for `items` and `sticky`
/// make sticky resolution independent of the collection size.
pub fn compute_window_with<T: Keyed + Clone>(
    metrics: &ItemMetrics,
    items: &[T],
    sticky: &StickyMap<T::Key>,
    options: &WindowOptions,
) -> Window<T::Key, T> {
    if let Err(err) = options.viewport.validate() {
        panic!("compute_window: {err}");
    }
    debug_assert!(
        ensure_unique_keys(items).is_ok(),
        "compute_window: item keys must be unique"
    );
    if metrics.count() != items.len() {
        vwarn!(
            metrics = metrics.count(),
            items = items.len(),
            "compute_window: metrics were built for another collection"
        );
    }

    // Only indexes both sides know about are emitted.
    let count = items.len().min(metrics.count());
    if count == 0 {
        return Window::empty();
    }

    let frame = Frame {
        items,
        axis: options.axis,
        cross_size: options.viewport.cross_size(options.axis),
        snap: options.snap,
        dynamic: options.dynamic_size,
    };
    let scroll = options.effective_scroll_offset();
    let viewport_size = options.viewport.main_size(options.axis);
    let total_size = metrics.total_size();

    let (first_visible, last_visible) = metrics.visible_range(scroll, viewport_size);
    let (first_visible, last_visible) = (first_visible.min(count), last_visible.min(count));
    if !(viewport_size > 0.0) {
        return Window {
            descriptors: Vec::new(),
            total_size,
            range: WindowRange {
                first_visible,
                last_visible,
                start: first_visible,
                end: first_visible,
            },
        };
    }

    let leading = first_visible.min(options.items_offset);
    let trailing = options.items_offset.min(count - last_visible);
    let range = WindowRange {
        first_visible,
        last_visible,
        start: first_visible - leading,
        end: last_visible + trailing,
    };

    let watch_start = options.snap && sticky.contains_kind(Stickiness::Start);
    let mut pinned = if watch_start {
        let found = match metrics.sticky_positions(Stickiness::Start) {
            Some(positions) => {
                let at = positions.partition_point(|&i| i < range.start);
                at.checked_sub(1).map(|p| positions[p])
            }
            None => (0..range.start)
                .rev()
                .find(|&i| sticky.get(&items[i].key()) == Stickiness::Start),
        };
        found.map(|index| Pinned::at(index, metrics.size_of(index), scroll, Stickiness::Start))
    } else {
        None
    };

    let mut descriptors = Vec::with_capacity(range.len() + 1);
    let mut watching = watch_start;
    let mut offset = metrics.offset_of(range.start);
    for index in range.start..range.end {
        let size = metrics.size_of(index);
        let key = items[index].key();
        let stickiness = sticky.get(&key);

        if watching && stickiness == Stickiness::Start {
            if offset <= scroll {
                // Reached the pin point: this item replaces the current sticky one.
                pinned = Some(Pinned::at(index, size, scroll, stickiness));
                offset += size;
                continue;
            }
            watching = false;
            if let Some(current) = pinned.as_mut() {
                if offset < scroll + current.size {
                    current.position = offset - current.size;
                    current.outgoing = true;
                }
            }
        }

        descriptors.push(frame.describe(index, key, offset, size, stickiness, false, false));
        offset += size;
    }

    if pinned.is_none() && options.snap && sticky.contains_kind(Stickiness::End) {
        let edge = scroll + viewport_size;
        let from = last_visible.saturating_sub(1).max(first_visible);
        let past_edge = |i: usize| metrics.offset_of(i) + metrics.size_of(i) > edge;
        let found = match metrics.sticky_positions(Stickiness::End) {
            Some(positions) => {
                let at = positions.partition_point(|&i| i < from);
                positions[at..]
                    .iter()
                    .copied()
                    .take_while(|&i| i < count)
                    .find(|&i| past_edge(i))
            }
            None => (from..count)
                .find(|&i| sticky.get(&items[i].key()) == Stickiness::End && past_edge(i)),
        };
        if let Some(index) = found {
            let size = metrics.size_of(index);
            descriptors.retain(|d| d.index != index);
            pinned = Some(Pinned::at(index, size, edge - size, Stickiness::End));
        }
    }

    if let Some(p) = pinned {
        let key = items[p.index].key();
        let outgoing = p.outgoing;
        let descriptor =
            frame.describe(p.index, key, p.position, p.size, p.stickiness, !outgoing, outgoing);
        descriptors.insert(0, descriptor);
    }

    vtrace!(
        start = range.start,
        end = range.end,
        total_size,
        sticky = ?pinned.map(|p| p.index),
        "compute_window"
    );

    Window {
        descriptors,
        total_size,
        range,
    }
}

#[derive(Clone, Copy, Debug)]
struct Pinned {
    index: usize,
    size: f64,
    position: f64,
    stickiness: Stickiness,
    outgoing: bool,
}

impl Pinned {
    fn at(index: usize, size: f64, position: f64, stickiness: Stickiness) -> Self {
        Self {
            index,
            size,
            position,
            stickiness,
            outgoing: false,
        }
    }
}

struct Frame<'a, T> {
    items: &'a [T],
    axis: Axis,
    cross_size: f64,
    snap: bool,
    dynamic: bool,
}

impl<T: Keyed + Clone> Frame<'_, T> {
    #[allow(clippy::too_many_arguments)]
    fn describe(
        &self,
        index: usize,
        key: T::Key,
        position: f64,
        size: f64,
        sticky: Stickiness,
        snapped: bool,
        snapped_out: bool,
    ) -> RenderDescriptor<T::Key, T> {
        let measures = match self.axis {
            Axis::Vertical => Bounds::new(0.0, position, self.cross_size, size),
            Axis::Horizontal => Bounds::new(position, 0.0, size, self.cross_size),
        };
        RenderDescriptor {
            key,
            index,
            measures,
            item: self.items[index].clone(),
            config: DescriptorConfig {
                sticky,
                snap: self.snap,
                snapped,
                snapped_out,
                is_vertical: self.axis.is_vertical(),
                dynamic: self.dynamic,
            },
        }
    }
}
