use crate::fenwick::Fenwick;
use crate::{Axis, Keyed, MeasurementCache, Stickiness, StickyMap, WindowOptions};

#[derive(Clone, Debug)]
enum Sizes {
    /// Every item has the typical size.
    Fixed,
    /// Measured sizes with the typical size as fallback.
    Measured { sizes: Vec<f64>, sums: Fenwick },
}

/// Indexes of the sticky items of one collection, ascending.
#[derive(Clone, Debug, Default)]
struct StickyPositions {
    start: Vec<usize>,
    end: Vec<usize>,
}

/// Item sizes and offsets along the scroll axis.
///
/// In fixed mode every query is `O(1)`. In dynamic mode, building the metrics walks the whole
/// collection once (the only `O(n)` step of a recompute); afterwards lookups are `O(log n)`.
/// Adapters can keep an `ItemMetrics` across frames and rebuild it only when
/// [`Self::is_current`] says so, which makes pure scroll frames `O(window)`.
#[derive(Clone, Debug)]
pub struct ItemMetrics {
    sizes: Sizes,
    count: usize,
    typical_size: f64,
    axis: Axis,
    cache_version: Option<u64>,
    sticky: Option<StickyPositions>,
}

impl ItemMetrics {
    pub fn fixed(count: usize, typical_size: f64, axis: Axis) -> Self {
        Self {
            sizes: Sizes::Fixed,
            count,
            typical_size,
            axis,
            cache_version: None,
            sticky: None,
        }
    }

    pub fn measured<T: Keyed>(
        items: &[T],
        cache: &MeasurementCache<T::Key>,
        axis: Axis,
        typical_size: f64,
    ) -> Self {
        let sizes: Vec<f64> = items
            .iter()
            .map(|item| {
                cache
                    .main_size(&item.key(), axis)
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .unwrap_or(typical_size)
            })
            .collect();
        let sums = Fenwick::from_sizes(&sizes);
        vdebug!(
            count = items.len(),
            cached = cache.len(),
            version = cache.version(),
            "ItemMetrics::measured"
        );
        Self {
            sizes: Sizes::Measured { sizes, sums },
            count: items.len(),
            typical_size,
            axis,
            cache_version: Some(cache.version()),
            sticky: None,
        }
    }

    /// Builds the metrics `options` ask for (fixed or measured).
    pub fn for_options<T: Keyed>(
        items: &[T],
        cache: &MeasurementCache<T::Key>,
        options: &WindowOptions,
    ) -> Self {
        let typical_size = options.effective_typical_size();
        if options.dynamic_size {
            Self::measured(items, cache, options.axis, typical_size)
        } else {
            Self::fixed(items.len(), typical_size, options.axis)
        }
    }

    /// Also records where the sticky items of `items` are, so sticky resolution does not scan
    /// the collection. The index is only valid for this `items` and `sticky` pair; rebuild the
    /// metrics when either changes.
    pub fn with_sticky_index<T: Keyed>(mut self, items: &[T], sticky: &StickyMap<T::Key>) -> Self {
        let mut positions = StickyPositions::default();
        if !sticky.is_empty() {
            for (index, item) in items.iter().enumerate() {
                match sticky.get(&item.key()) {
                    Stickiness::Start => positions.start.push(index),
                    Stickiness::End => positions.end.push(index),
                    Stickiness::None => {}
                }
            }
        }
        self.sticky = Some(positions);
        self
    }

    /// Ascending indexes of the items with `stickiness`, when built
    /// [`with_sticky_index`](Self::with_sticky_index).
    pub fn sticky_positions(&self, stickiness: Stickiness) -> Option<&[usize]> {
        let positions = self.sticky.as_ref()?;
        match stickiness {
            Stickiness::Start => Some(&positions.start),
            Stickiness::End => Some(&positions.end),
            Stickiness::None => None,
        }
    }

    /// Whether these metrics still describe `count` items under `options` and `cache_version`.
    pub fn is_current(&self, count: usize, options: &WindowOptions, cache_version: u64) -> bool {
        if self.count != count
            || self.axis != options.axis
            || self.typical_size != options.effective_typical_size()
            || self.is_dynamic() != options.dynamic_size
        {
            return false;
        }
        !self.is_dynamic() || self.cache_version == Some(cache_version)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.sizes, Sizes::Measured { .. })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn typical_size(&self) -> f64 {
        self.typical_size
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn total_size(&self) -> f64 {
        match &self.sizes {
            Sizes::Fixed => self.count as f64 * self.typical_size,
            Sizes::Measured { sums, .. } => sums.total(),
        }
    }

    /// Size of item `index` along the scroll axis.
    pub fn size_of(&self, index: usize) -> f64 {
        match &self.sizes {
            Sizes::Fixed => self.typical_size,
            Sizes::Measured { sizes, .. } => {
                sizes.get(index).copied().unwrap_or(self.typical_size)
            }
        }
    }

    /// Start offset of item `index` (the total size for `index >= count`).
    pub fn offset_of(&self, index: usize) -> f64 {
        match &self.sizes {
            Sizes::Fixed => index.min(self.count) as f64 * self.typical_size,
            Sizes::Measured { sums, .. } => sums.prefix_sum(index),
        }
    }

    /// Index of the item under `offset`, clamped to the last item.
    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        Some(self.items_ending_by(offset).min(self.count - 1))
    }

    /// Visible index range `[first, last)` for a viewport of `viewport_size` at `scroll_offset`.
    ///
    /// `first` is the item under the leading edge; `last` is one past the item under the
    /// trailing edge. Both are clipped to the collection, so an offset past the end yields an
    /// empty range at `count`.
    ///
    /// With a fixed size `t` this is `first = floor(s / t)` and `last = ceil((s + v) / t)`.
    /// Rounding `first` down keeps a partially scrolled leading item in the range, so a window
    /// without buffer has no gap at the top. For 1000 items of 24 in a 400 viewport at `s = 0`
    /// this gives `(0, 17)`, and a buffer of 2 makes the window `[0, 19)`.
    pub fn visible_range(&self, scroll_offset: f64, viewport_size: f64) -> (usize, usize) {
        let first = self.items_ending_by(scroll_offset).min(self.count);
        if self.count == 0 || !(viewport_size > 0.0) {
            return (first, first);
        }
        let end = scroll_offset + viewport_size;
        let last = match &self.sizes {
            Sizes::Fixed => (end / self.typical_size).ceil() as usize,
            Sizes::Measured { sums, .. } => sums.count_ending_before(end).saturating_add(1),
        };
        (first, last.min(self.count).max(first))
    }

    fn items_ending_by(&self, offset: f64) -> usize {
        match &self.sizes {
            Sizes::Fixed => (offset / self.typical_size).floor() as usize,
            Sizes::Measured { sums, .. } => sums.count_ending_at_or_before(offset),
        }
    }
}
