use std::collections::VecDeque;
use std::sync::Arc;

use crate::key::{KeyCacheKey, KeyMap};
use crate::{Axis, Bounds, Debouncer, ItemId, ScrollDirection};

/// Versions wrap back to 0 after this value (2^53 − 1).
pub const MAX_SAFE_VERSION: u64 = (1 << 53) - 1;

/// Capacity of the rolling scroll-direction window.
pub const DIRECTION_WINDOW_CAPACITY: usize = 50;

/// Length the direction window is trimmed to once scrolling goes idle.
pub const DIRECTION_WINDOW_IDLE_LEN: usize = 10;

/// Listener for the coalesced "version changed" notification. The argument is the new version.
pub type OnVersionChange = Arc<dyn Fn(u64) + Send + Sync>;

/// Debounce settings for [`MeasurementCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheOptions {
    /// Delay between the last size change and the change notification.
    pub change_delay_ms: u64,
    /// Quiet time after the last direction sample before the window is trimmed.
    pub direction_idle_ms: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            change_delay_ms: 0,
            direction_idle_ms: 150,
        }
    }
}

impl CacheOptions {
    pub fn with_change_delay_ms(mut self, delay_ms: u64) -> Self {
        self.change_delay_ms = delay_ms;
        self
    }

    pub fn with_direction_idle_ms(mut self, delay_ms: u64) -> Self {
        self.direction_idle_ms = delay_ms;
        self
    }
}

/// One entry of [`MeasurementCache::changed_since_snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub struct SizeChange<K> {
    pub key: K,
    /// `None` when the key was first measured after the snapshot.
    pub previous: Option<Bounds>,
    pub current: Bounds,
}

impl<K> SizeChange<K> {
    /// Growth along `axis`; an unmeasured previous entry counts as `fallback`.
    pub fn main_delta(&self, axis: Axis, fallback: f64) -> f64 {
        let before = self.previous.map_or(fallback, |b| b.main_size(axis));
        self.current.main_size(axis) - before
    }
}

/// Versioned `key → bounds` store of everything the renderer has measured.
///
/// Only real size changes count: re-reporting the same width and height (even at a new
/// position) leaves the cache untouched. Change notifications are debounced so that a frame full
/// of measurements results in a single downstream recompute.
pub struct MeasurementCache<K = ItemId> {
    entries: KeyMap<K, Bounds>,
    snapshot: KeyMap<K, Bounds>,
    version: u64,
    directions: VecDeque<ScrollDirection>,
    scroll_direction: ScrollDirection,
    change: Debouncer,
    idle: Debouncer,
    on_version_change: Option<OnVersionChange>,
    disposed: bool,
}

impl<K: KeyCacheKey> Default for MeasurementCache<K> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<K: KeyCacheKey> MeasurementCache<K> {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: KeyMap::new(),
            snapshot: KeyMap::new(),
            version: 0,
            directions: VecDeque::with_capacity(DIRECTION_WINDOW_CAPACITY + 1),
            scroll_direction: ScrollDirection::Idle,
            change: Debouncer::new(options.change_delay_ms),
            idle: Debouncer::new(options.direction_idle_ms),
            on_version_change: None,
            disposed: false,
        }
    }

    pub fn set_options(&mut self, options: CacheOptions) {
        self.change.set_delay_ms(options.change_delay_ms);
        self.idle.set_delay_ms(options.direction_idle_ms);
    }

    /// Installs the listener fired by [`Self::poll`] once size changes settle.
    pub fn on_version_change(&mut self, listener: impl Fn(u64) + Send + Sync + 'static) {
        self.on_version_change = Some(Arc::new(listener));
    }

    pub fn clear_version_listener(&mut self) {
        self.on_version_change = None;
    }

    /// Records the measured bounds of `key`.
    ///
    /// Returns `true` when the size changed (or the key is new). In that case the version is
    /// bumped and a change notification is scheduled for the next [`Self::poll`].
    ///
    /// Bounds with a NaN, infinite or negative size are dropped and the key keeps its previous
    /// entry (or the typical size when it has none).
    pub fn set(&mut self, key: K, bounds: Bounds) -> bool {
        if self.disposed {
            vwarn!("MeasurementCache::set after dispose");
            return false;
        }
        if !bounds.is_measurable() {
            vwarn!(
                width = bounds.width,
                height = bounds.height,
                "MeasurementCache::set ignored unmeasurable bounds"
            );
            return false;
        }
        if let Some(prev) = self.entries.get(&key) {
            if prev.same_size(&bounds) {
                return false;
            }
        }
        self.entries.insert(key, bounds);
        self.bump_version();
        self.change.mark();
        true
    }

    /// Applies many measurements; returns how many of them changed a size.
    pub fn set_many(&mut self, entries: impl IntoIterator<Item = (K, Bounds)>) -> usize {
        let mut changed = 0usize;
        for (key, bounds) in entries {
            if self.set(key, bounds) {
                changed += 1;
            }
        }
        changed
    }

    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<Bounds> {
        self.entries.get(key).copied()
    }

    /// Size of `key` along `axis`, if it was ever measured.
    pub fn main_size(&self, key: &K, axis: Axis) -> Option<f64> {
        self.entries.get(key).map(|b| b.main_size(axis))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn bump_version(&mut self) {
        self.version = if self.version >= MAX_SAFE_VERSION {
            0
        } else {
            self.version + 1
        };
        vtrace!(version = self.version, "measurement cache version");
    }

    /// Feeds the signed scroll delta of the current frame to the direction classifier.
    pub fn set_delta_direction(&mut self, direction: ScrollDirection) {
        if self.disposed {
            return;
        }
        self.directions.push_back(direction);
        while self.directions.len() > DIRECTION_WINDOW_CAPACITY {
            self.directions.pop_front();
        }
        self.scroll_direction = classify(&self.directions);
        self.idle.mark();
    }

    /// Majority vote over the rolling window; ties resolve to [`ScrollDirection::Idle`].
    pub fn scroll_direction(&self) -> ScrollDirection {
        self.scroll_direction
    }

    pub fn direction_samples(&self) -> usize {
        self.directions.len()
    }

    /// Advances the debouncers.
    ///
    /// Returns the current version when a change notification fired during this call, after the
    /// listener (if any) was invoked.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        if self.disposed {
            return None;
        }
        if self.idle.poll(now_ms) {
            self.trim_directions();
        }
        if !self.change.poll(now_ms) {
            return None;
        }
        if let Some(listener) = &self.on_version_change {
            listener(self.version);
        }
        Some(self.version)
    }

    fn trim_directions(&mut self) {
        let excess = self
            .directions
            .len()
            .saturating_sub(DIRECTION_WINDOW_IDLE_LEN);
        self.directions.drain(..excess);
        self.scroll_direction = classify(&self.directions);
    }

    /// Remembers the current entries for a later [`Self::changed_since_snapshot`].
    pub fn snapshot(&mut self)
    where
        K: Clone,
    {
        self.snapshot.clone_from(&self.entries);
    }

    /// Keys whose size differs from the last snapshot (including keys measured since then).
    pub fn changed_since_snapshot(&self) -> Vec<SizeChange<K>>
    where
        K: Clone,
    {
        let mut out = Vec::new();
        for (key, current) in self.entries.iter() {
            let previous = self.snapshot.get(key).copied();
            if previous.is_some_and(|p| p.same_size(current)) {
                continue;
            }
            out.push(SizeChange {
                key: key.clone(),
                previous,
                current: *current,
            });
        }
        out
    }

    /// Drops every entry, the snapshot, the direction window and the listener.
    ///
    /// Calling it again is harmless; nothing else is valid afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        vdebug!(entries = self.entries.len(), "MeasurementCache::dispose");
        self.entries = KeyMap::new();
        self.snapshot = KeyMap::new();
        self.directions.clear();
        self.scroll_direction = ScrollDirection::Idle;
        self.change.cancel();
        self.idle.cancel();
        self.on_version_change = None;
        self.disposed = true;
    }
}

fn classify(window: &VecDeque<ScrollDirection>) -> ScrollDirection {
    let (mut backward, mut idle, mut forward) = (0usize, 0usize, 0usize);
    for direction in window {
        match direction {
            ScrollDirection::Backward => backward += 1,
            ScrollDirection::Idle => idle += 1,
            ScrollDirection::Forward => forward += 1,
        }
    }
    if forward > backward && forward > idle {
        ScrollDirection::Forward
    } else if backward > forward && backward > idle {
        ScrollDirection::Backward
    } else {
        ScrollDirection::Idle
    }
}

impl<K> core::fmt::Debug for MeasurementCache<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeasurementCache")
            .field("entries", &self.entries.len())
            .field("version", &self.version)
            .field("scroll_direction", &self.scroll_direction)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
