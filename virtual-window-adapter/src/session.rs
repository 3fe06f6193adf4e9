use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use virtual_window::{
    Align, Bounds, Debouncer, ItemMetrics, Keyed, MeasurementCache, RenderSlot, ScrollDirection,
    SlotId, SlotTracker, StickyMap, TrackReport, ViewportBounds, Window, WindowError,
    WindowOptions, compute_window_with, index_by_key,
};

use crate::tween::{ScrollTarget, ScrollTween};
use crate::{Easing, SessionOptions};

bitflags::bitflags! {
    /// Inputs that changed since the last recompute.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Dirty: u8 {
        const ITEMS = 1 << 0;
        const STICKY = 1 << 1;
        const VIEWPORT = 1 << 2;
        const SCROLL = 1 << 3;
        const MEASUREMENTS = 1 << 4;
        const OPTIONS = 1 << 5;
    }
}

/// An owning windowing loop for one list.
///
/// The session does not hold any UI objects. Adapters drive it by calling:
/// - `set_items` / `set_sticky_map` when the data changes
/// - `on_resize` / `on_scroll` when UI events occur
/// - `report_measure` (or `measure_slots`) after painting
/// - `tick(now_ms)` each frame/timer tick, then `render` with their slot pool
///
/// Every trigger marks the session dirty and (re)arms a single debounced recompute, so a burst of
/// events costs one window computation. Scroll positions the host must apply to its real scroll
/// container (tweens, scroll-to, anchoring) are handed out by [`Self::take_scroll_correction`].
pub struct Session<T: Keyed> {
    options: SessionOptions,
    items: Vec<T>,
    index: HashMap<T::Key, usize>,
    sticky: StickyMap<T::Key>,
    cache: MeasurementCache<T::Key>,
    snapshot_version: Option<u64>,
    viewport: ViewportBounds,
    scroll_offset: f64,
    metrics: Option<ItemMetrics>,
    window: Option<Window<T::Key, T>>,
    tracker: SlotTracker<T::Key>,
    dirty: Dirty,
    recompute: Debouncer,
    tween: Option<ScrollTween<T::Key>>,
    correction: Option<f64>,
    disposed: bool,
}

impl<T: Keyed + Clone> Default for Session<T> {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl<T: Keyed + Clone> Session<T> {
    pub fn new(options: SessionOptions) -> Self {
        let mut recompute = Debouncer::new(options.recompute_delay_ms);
        recompute.mark();
        Self {
            options,
            items: Vec::new(),
            index: HashMap::new(),
            sticky: StickyMap::new(),
            cache: MeasurementCache::new(options.cache),
            snapshot_version: None,
            viewport: ViewportBounds::default(),
            scroll_offset: 0.0,
            metrics: None,
            window: None,
            tracker: SlotTracker::new(),
            dirty: Dirty::all(),
            recompute,
            tween: None,
            correction: None,
            disposed: false,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn sticky(&self) -> &StickyMap<T::Key> {
        &self.sticky
    }

    pub fn cache(&self) -> &MeasurementCache<T::Key> {
        &self.cache
    }

    pub fn tracker(&self) -> &SlotTracker<T::Key> {
        &self.tracker
    }

    pub fn viewport(&self) -> ViewportBounds {
        self.viewport
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn scroll_direction(&self) -> ScrollDirection {
        self.cache.scroll_direction()
    }

    /// The last computed window.
    pub fn window(&self) -> Option<&Window<T::Key, T>> {
        self.window.as_ref()
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn index_of(&self, key: &T::Key) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Registers the listener for coalesced measurement changes.
    pub fn on_version_change(&mut self, listener: impl Fn(u64) + Send + Sync + 'static) {
        self.cache.on_version_change(listener);
    }

    pub fn clear_version_listener(&mut self) {
        self.cache.clear_version_listener();
    }

    pub fn set_options(&mut self, options: SessionOptions) {
        if self.disposed {
            return;
        }
        self.cache.set_options(options.cache);
        self.recompute.set_delay_ms(options.recompute_delay_ms);
        self.options = options;
        self.invalidate(Dirty::OPTIONS, None);
    }

    /// Replaces the collection.
    ///
    /// Keys must be unique; on a duplicate the session keeps its previous collection.
    pub fn set_items(&mut self, items: Vec<T>) -> Result<(), WindowError> {
        if self.disposed {
            vwarn!("Session::set_items after dispose");
            return Ok(());
        }
        let index = index_by_key(&items)?;
        self.items = items;
        self.index = index;
        self.invalidate(Dirty::ITEMS, None);
        Ok(())
    }

    pub fn set_sticky_map(&mut self, sticky: StickyMap<T::Key>) {
        if self.disposed {
            return;
        }
        self.sticky = sticky;
        self.invalidate(Dirty::STICKY, None);
    }

    pub fn on_resize(&mut self, viewport: ViewportBounds, now_ms: u64) -> Result<(), WindowError> {
        viewport.validate()?;
        if self.disposed || viewport == self.viewport {
            return Ok(());
        }
        self.viewport = viewport;
        self.invalidate(Dirty::VIEWPORT, Some(now_ms));
        Ok(())
    }

    /// Call this when the UI reports a scroll offset change (e.g. user wheel/drag).
    ///
    /// This cancels any active tween.
    pub fn on_scroll(&mut self, scroll_offset: f64, now_ms: u64) {
        if self.disposed {
            return;
        }
        self.tween = None;
        self.apply_scroll(scroll_offset, now_ms);
    }

    /// Stores the painted bounds of `key`. Returns `true` when its size changed.
    pub fn report_measure(&mut self, key: T::Key, bounds: Bounds, now_ms: u64) -> bool {
        if self.disposed || !self.cache.set(key, bounds) {
            return false;
        }
        self.invalidate(Dirty::MEASUREMENTS, Some(now_ms));
        true
    }

    /// Reports the [`RenderSlot::measure`] of every slot of `pool` bound to an item.
    ///
    /// Returns how many sizes changed.
    pub fn measure_slots<S>(&mut self, pool: &[S], now_ms: u64) -> usize
    where
        S: RenderSlot<T::Key, T>,
    {
        let mut changed = 0usize;
        for slot in pool {
            let Some(bounds) = slot.measure() else {
                continue;
            };
            let Some(key) = self.tracker.key_for(slot.slot_id()).cloned() else {
                continue;
            };
            if self.report_measure(key, bounds, now_ms) {
                changed += 1;
            }
        }
        changed
    }

    /// Advances the session.
    ///
    /// Steps an active tween, flushes the cache notifications and, when something changed and
    /// the recompute debounce elapsed, recomputes the window. Returns the new window only on
    /// ticks that recomputed it.
    pub fn tick(&mut self, now_ms: u64) -> Option<&Window<T::Key, T>> {
        if self.disposed {
            return None;
        }

        let step = self.tween.as_ref().map(|tween| {
            let offset = self
                .resolve_target(&tween.target)
                .map(|to| tween.offset_at(now_ms, to));
            (offset, tween.is_finished(now_ms))
        });
        match step {
            Some((Some(offset), finished)) => {
                self.apply_scroll(offset, now_ms);
                self.correction = Some(self.scroll_offset);
                if finished {
                    self.tween = None;
                }
            }
            Some((None, _)) => {
                vdebug!("animated scroll target left the collection");
                self.tween = None;
            }
            None => {}
        }

        // Fires the version-change listener when measurements settled.
        self.cache.poll(now_ms);

        if !self.recompute.poll(now_ms) || self.dirty.is_empty() {
            return None;
        }
        self.recompute_window();
        self.window.as_ref()
    }

    /// Returns (once) the scroll offset the host must apply to its scroll container, after a
    /// tween step, a scroll-to or an anchoring shift.
    pub fn take_scroll_correction(&mut self) -> Option<f64> {
        self.correction.take()
    }

    /// Scroll offset that brings `key` into view with `align`, clamped to the scrollable range.
    pub fn scroll_to_key_offset(&self, key: &T::Key, align: Align) -> Option<f64> {
        let index = self.index_of(key)?;
        let options = self.window_options();
        let metrics = self.current_metrics(&options);

        let start = metrics.offset_of(index);
        let size = metrics.size_of(index);
        let end = start + size;
        let view = self.viewport.main_size(self.options.axis);
        let cur = options.effective_scroll_offset();

        let target = match align {
            Align::Start => start,
            Align::End => end - view,
            Align::Center => start + size / 2.0 - view / 2.0,
            Align::Auto => {
                if start >= cur && end <= cur + view {
                    cur
                } else if start < cur {
                    start
                } else {
                    end - view
                }
            }
        };
        Some(clamp_offset(target, metrics.total_size(), view))
    }

    /// Scrolls to `key` immediately (no animation).
    ///
    /// Returns the applied offset, or `None` for an unknown key.
    pub fn scroll_to_key(&mut self, key: &T::Key, align: Align, now_ms: u64) -> Option<f64> {
        if self.disposed {
            return None;
        }
        let offset = self.scroll_to_key_offset(key, align)?;
        Some(self.scroll_to_offset(offset, now_ms))
    }

    /// Applies a scroll-to-offset immediately (no animation).
    ///
    /// Returns the applied (clamped) offset.
    pub fn scroll_to_offset(&mut self, offset: f64, now_ms: u64) -> f64 {
        if self.disposed {
            return self.scroll_offset;
        }
        self.tween = None;
        let offset = self.clamp_scroll_offset(offset);
        self.apply_scroll(offset, now_ms);
        self.correction = Some(self.scroll_offset);
        self.scroll_offset
    }

    /// Starts an animated scroll to `key`; [`Self::tick`] advances it.
    ///
    /// The target is resolved again on every tick, so measurements that move `key` while the
    /// animation runs are followed. The animation stops if `key` leaves the collection.
    ///
    /// Returns the clamped target offset as of now.
    pub fn start_tween_to_key(
        &mut self,
        key: &T::Key,
        align: Align,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> Option<f64> {
        if self.disposed {
            return None;
        }
        let to = self.scroll_to_key_offset(key, align)?;
        let target = ScrollTarget::Key {
            key: key.clone(),
            align,
        };
        self.start_tween(target, now_ms, duration_ms, easing);
        Some(to)
    }

    /// Starts an animated scroll to `offset`, clamped to the scrollable range.
    ///
    /// A running animation is replaced and the new one starts from the current scroll offset.
    /// Returns the clamped target offset as of now.
    pub fn start_tween_to_offset(
        &mut self,
        offset: f64,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> f64 {
        let to = self.clamp_scroll_offset(offset);
        if !self.disposed {
            self.start_tween(ScrollTarget::Offset(offset), now_ms, duration_ms, easing);
        }
        to
    }

    fn start_tween(
        &mut self,
        target: ScrollTarget<T::Key>,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) {
        let origin = self.scroll_offset;
        self.tween = Some(ScrollTween::new(origin, target, now_ms, duration_ms, easing));
    }

    pub fn cancel_animation(&mut self) {
        self.tween = None;
    }

    /// Binds the last computed window to `pool` (and `pinned` for the sticky item).
    pub fn render<S>(
        &mut self,
        pool: &mut Vec<S>,
        pinned: Option<&mut S>,
        spawn: impl FnMut(SlotId) -> S,
    ) -> Option<TrackReport>
    where
        S: RenderSlot<T::Key, T>,
    {
        if self.disposed {
            return None;
        }
        let window = self.window.as_ref()?;
        Some(self.tracker.track(
            &window.descriptors,
            pool,
            pinned,
            self.cache.scroll_direction(),
            spawn,
        ))
    }

    /// Releases the cache and every retained frame. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        vdebug!(items = self.items.len(), "Session::dispose");
        self.cache.dispose();
        self.items = Vec::new();
        self.index = HashMap::new();
        self.sticky.clear();
        self.metrics = None;
        self.window = None;
        self.tracker.clear();
        self.recompute.cancel();
        self.dirty = Dirty::empty();
        self.tween = None;
        self.correction = None;
        self.disposed = true;
    }

    fn invalidate(&mut self, dirty: Dirty, now_ms: Option<u64>) {
        self.dirty |= dirty;
        match now_ms {
            Some(now_ms) => self.recompute.trigger(now_ms),
            None => self.recompute.mark(),
        }
    }

    fn apply_scroll(&mut self, scroll_offset: f64, now_ms: u64) {
        let offset = if scroll_offset.is_finite() {
            scroll_offset.max(0.0)
        } else {
            0.0
        };
        let delta = offset - self.scroll_offset;
        self.cache.set_delta_direction(ScrollDirection::from_delta(delta));
        if delta == 0.0 {
            return;
        }
        self.scroll_offset = offset;
        self.invalidate(Dirty::SCROLL, Some(now_ms));
    }

    fn window_options(&self) -> WindowOptions {
        self.options.window_options(self.viewport, self.scroll_offset)
    }

    fn current_metrics(&self, options: &WindowOptions) -> Cow<'_, ItemMetrics> {
        match &self.metrics {
            Some(metrics)
                if !self.dirty.contains(Dirty::ITEMS)
                    && metrics.is_current(self.items.len(), options, self.cache.version()) =>
            {
                Cow::Borrowed(metrics)
            }
            _ => Cow::Owned(ItemMetrics::for_options(&self.items, &self.cache, options)),
        }
    }

    /// Current clamped offset of an animation target; `None` once a key target is gone.
    fn resolve_target(&self, target: &ScrollTarget<T::Key>) -> Option<f64> {
        match target {
            ScrollTarget::Offset(offset) => Some(self.clamp_scroll_offset(*offset)),
            ScrollTarget::Key { key, align } => self.scroll_to_key_offset(key, *align),
        }
    }

    fn clamp_scroll_offset(&self, offset: f64) -> f64 {
        let options = self.window_options();
        let total = self.current_metrics(&options).total_size();
        clamp_offset(offset, total, self.viewport.main_size(self.options.axis))
    }

    /// Growth of the measured items that start above the scroll offset, according to the
    /// metrics of the previous recompute.
    fn anchor_shift(&self, options: &WindowOptions) -> f64 {
        let Some(metrics) = self
            .metrics
            .as_ref()
            .filter(|m| m.is_dynamic() && m.count() == self.items.len())
        else {
            return 0.0;
        };
        let scroll = options.effective_scroll_offset();
        self.cache
            .changed_since_snapshot()
            .into_iter()
            .filter_map(|change| {
                let index = self.index_of(&change.key)?;
                (metrics.offset_of(index) < scroll)
                    .then(|| change.main_delta(options.axis, metrics.size_of(index)))
            })
            .sum()
    }

    fn recompute_window(&mut self) {
        let mut options = self.window_options();

        let anchor = self.options.anchor_on_resize
            && options.dynamic_size
            && self.dirty.contains(Dirty::MEASUREMENTS)
            && !self.dirty.intersects(Dirty::ITEMS | Dirty::OPTIONS);
        if anchor {
            let shift = self.anchor_shift(&options);
            if shift != 0.0 {
                self.scroll_offset = (self.scroll_offset + shift).max(0.0);
                self.correction = Some(self.scroll_offset);
                options.scroll_offset = self.scroll_offset;
                vdebug!(shift, scroll_offset = self.scroll_offset, "scroll anchored");
            }
        }

        let stale = self
            .dirty
            .intersects(Dirty::ITEMS | Dirty::STICKY | Dirty::OPTIONS)
            || !self
                .metrics
                .as_ref()
                .is_some_and(|m| m.is_current(self.items.len(), &options, self.cache.version()));
        if stale {
            self.metrics = None;
        }
        let metrics = self.metrics.get_or_insert_with(|| {
            let metrics = ItemMetrics::for_options(&self.items, &self.cache, &options);
            if options.snap {
                metrics.with_sticky_index(&self.items, &self.sticky)
            } else {
                metrics
            }
        });
        let window = compute_window_with(metrics, &self.items, &self.sticky, &options);

        vtrace!(
            dirty = ?self.dirty,
            rebuilt_metrics = stale,
            start = window.range.start,
            end = window.range.end,
            "Session::recompute"
        );

        let version = self.cache.version();
        if self.snapshot_version != Some(version) {
            self.cache.snapshot();
            self.snapshot_version = Some(version);
        }
        self.dirty = Dirty::empty();
        self.window = Some(window);
    }
}

fn clamp_offset(offset: f64, total_size: f64, viewport_size: f64) -> f64 {
    let max = (total_size - viewport_size).max(0.0);
    if offset.is_nan() {
        return 0.0;
    }
    offset.clamp(0.0, max)
}

impl<T: Keyed> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("items", &self.items.len())
            .field("viewport", &self.viewport)
            .field("scroll_offset", &self.scroll_offset)
            .field("dirty", &self.dirty)
            .field("cache", &self.cache)
            .field("animating", &self.tween.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
