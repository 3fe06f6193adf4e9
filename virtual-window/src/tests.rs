use crate::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_f64(&mut self, start: f64, end: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        start + (end - start) * unit
    }
}

const EPS: f64 = 1e-6;

fn ids(count: u64) -> Vec<u64> {
    (0..count).collect()
}

fn viewport(width: f64, height: f64) -> ViewportBounds {
    ViewportBounds::new(width, height).unwrap()
}

fn window_at(
    items: &[u64],
    sticky: &StickyMap<u64>,
    options: WindowOptions,
) -> Window<u64, u64> {
    let cache = MeasurementCache::<u64>::default();
    compute_window(items, sticky, &cache, &options)
}

fn regular(w: &Window<u64, u64>) -> impl Iterator<Item = &RenderDescriptor<u64, u64>> {
    w.iter().filter(|d| !d.config.is_pinned())
}

// --- window engine -------------------------------------------------------------------------

#[test]
fn fixed_window_at_top_covers_viewport_plus_trailing_buffer() {
    let items = ids(1000);
    let w = window_at(
        &items,
        &StickyMap::new(),
        WindowOptions::new(viewport(300.0, 400.0)),
    );

    assert_eq!(w.total_size, 24_000.0);
    // ceil(400 / 24) = 17 visible items, nothing before index 0, 2 buffered after.
    assert_eq!(
        w.range,
        WindowRange {
            first_visible: 0,
            last_visible: 17,
            start: 0,
            end: 19,
        }
    );
    assert_eq!(w.len(), 19);
    for (i, d) in w.iter().enumerate() {
        assert_eq!(d.index, i);
        assert_eq!(d.key, i as u64);
        assert_eq!(d.measures, Bounds::new(0.0, i as f64 * 24.0, 300.0, 24.0));
        assert!(d.config.is_vertical);
        assert!(!d.config.dynamic);
        assert!(!d.config.is_pinned());
    }
    assert!(w.sticky().is_none());
}

#[test]
fn fixed_window_mid_list_buffers_both_sides() {
    let items = ids(1000);
    let w = window_at(
        &items,
        &StickyMap::new(),
        WindowOptions::new(viewport(300.0, 400.0)).with_scroll_offset(1000.0),
    );

    // 41 * 24 = 984 <= 1000 < 1008; ceil(1400 / 24) = 59.
    assert_eq!(w.range.first_visible, 41);
    assert_eq!(w.range.last_visible, 59);
    assert_eq!(w.range.start, 39);
    assert_eq!(w.range.end, 61);
    assert_eq!(w.range.leading_buffer(), 2);
    assert_eq!(w.range.trailing_buffer(), 2);
    assert_eq!(w.descriptors[0].measures.y, 39.0 * 24.0);
}

#[test]
fn buffer_is_truncated_at_collection_bounds() {
    let items = ids(10);
    let opts = WindowOptions::new(viewport(100.0, 100.0));

    let w = window_at(&items, &StickyMap::new(), opts.with_scroll_offset(140.0));
    assert_eq!(w.range.first_visible, 5);
    assert_eq!(w.range.last_visible, 10);
    assert_eq!((w.range.start, w.range.end), (3, 10));

    let w = window_at(&items, &StickyMap::new(), opts.with_items_offset(50));
    assert_eq!((w.range.start, w.range.end), (0, 10));
    assert_eq!(w.len(), 10);
}

#[test]
fn empty_collection_and_zero_viewport_are_degenerate_but_valid() {
    let w = window_at(&[], &StickyMap::new(), WindowOptions::new(viewport(100.0, 100.0)));
    assert!(w.is_empty());
    assert_eq!(w.total_size, 0.0);
    assert!(w.range.is_empty());

    let items = ids(10);
    let w = window_at(&items, &StickyMap::new(), WindowOptions::new(viewport(100.0, 0.0)));
    assert!(w.is_empty());
    assert_eq!(w.total_size, 240.0);
}

#[test]
fn scroll_offset_past_the_end_is_not_clamped() {
    let items = ids(10);
    let w = window_at(
        &items,
        &StickyMap::new(),
        WindowOptions::new(viewport(100.0, 100.0)).with_scroll_offset(10_000.0),
    );
    assert_eq!(w.range.first_visible, 10);
    assert_eq!(w.range.last_visible, 10);
    assert_eq!((w.range.start, w.range.end), (8, 10));
    assert_eq!(w.len(), 2);
}

#[test]
fn negative_and_nan_scroll_offsets_count_as_zero() {
    let items = ids(100);
    let base = WindowOptions::new(viewport(100.0, 100.0));
    let top = window_at(&items, &StickyMap::new(), base);
    for offset in [-50.0, f64::NAN, f64::NEG_INFINITY] {
        let w = window_at(&items, &StickyMap::new(), base.with_scroll_offset(offset));
        assert_eq!(w.range, top.range);
    }
}

#[test]
fn non_positive_typical_size_falls_back_to_default() {
    let items = ids(10);
    for typical in [0.0, -5.0, f64::NAN] {
        let w = window_at(
            &items,
            &StickyMap::new(),
            WindowOptions::new(viewport(100.0, 100.0)).with_typical_size(typical),
        );
        assert_eq!(w.total_size, 240.0);
    }
}

#[test]
fn horizontal_axis_swaps_coordinates() {
    let items = ids(100);
    let w = window_at(
        &items,
        &StickyMap::new(),
        WindowOptions::new(viewport(200.0, 50.0))
            .with_axis(Axis::Horizontal)
            .with_typical_size(40.0)
            .with_scroll_offset(400.0),
    );
    assert_eq!(w.range.first_visible, 10);
    assert_eq!(w.range.last_visible, 15);
    let d = &w.descriptors[0];
    assert_eq!(d.index, 8);
    assert_eq!(d.measures, Bounds::new(320.0, 0.0, 40.0, 50.0));
    assert!(!d.config.is_vertical);
}

#[test]
fn dynamic_sizes_use_measured_bounds_instead_of_typical() {
    let items: Vec<ItemId> = ["a", "b", "x", "c", "d"]
        .into_iter()
        .map(ItemId::from)
        .collect();
    let mut cache = MeasurementCache::<ItemId>::default();
    cache.set(ItemId::from("x"), Bounds::sized(300.0, 80.0));

    let opts = WindowOptions::new(viewport(300.0, 1000.0)).with_dynamic_size(true);
    let w = compute_window(&items, &StickyMap::new(), &cache, &opts);
    assert_eq!(w.total_size, 4.0 * 24.0 + 80.0);
    let x = w.iter().find(|d| d.key == ItemId::from("x")).unwrap();
    assert_eq!(x.measures.height, 80.0);
    assert!(x.config.dynamic);
    let c = w.iter().find(|d| d.key == ItemId::from("c")).unwrap();
    assert_eq!(c.measures.y, 48.0 + 80.0);

    // Without dynamic sizing the measurement is ignored.
    let w = compute_window(&items, &StickyMap::new(), &cache, &opts.with_dynamic_size(false));
    assert_eq!(w.total_size, 5.0 * 24.0);
}

#[test]
fn dynamic_visible_range_walks_measured_sizes() {
    let items = ids(100);
    let mut cache = MeasurementCache::<u64>::default();
    for id in 0..10u64 {
        cache.set(id, Bounds::sized(100.0, 50.0));
    }
    let opts = WindowOptions::new(viewport(100.0, 100.0))
        .with_dynamic_size(true)
        .with_items_offset(0)
        .with_scroll_offset(120.0);
    let w = compute_window(&items, &StickyMap::new(), &cache, &opts);
    // Items 0..10 are 50 tall: [120, 220) spans items 2, 3 and 4.
    assert_eq!(w.range.first_visible, 2);
    assert_eq!(w.range.last_visible, 5);
    assert_eq!(w.descriptors[0].measures.y, 100.0);

    // Past the measured block, sizes fall back to 24.
    let w = compute_window(
        &items,
        &StickyMap::new(),
        &cache,
        &opts.with_scroll_offset(500.0),
    );
    assert_eq!(w.range.first_visible, 10);
    assert_eq!(w.descriptors[0].measures.y, 500.0);
    assert_eq!(w.descriptors[0].measures.height, 24.0);
}

#[test]
fn window_covers_viewport_for_random_offsets() {
    let mut rng = Lcg::new(0x5eed);
    for round in 0..40 {
        let count = rng.gen_range_usize(1, 400);
        let items = ids(count as u64);
        let mut cache = MeasurementCache::<u64>::default();
        for id in 0..count as u64 {
            if rng.gen_range_u64(0, 3) > 0 {
                cache.set(id, Bounds::sized(10.0, rng.gen_f64(1.0, 90.0)));
            }
        }
        let dynamic = round % 2 == 0;
        let view = rng.gen_f64(1.0, 500.0);
        let buffer = rng.gen_range_usize(0, 4);
        let base = WindowOptions::new(viewport(10.0, view))
            .with_dynamic_size(dynamic)
            .with_items_offset(buffer);
        let metrics = ItemMetrics::for_options(&items, &cache, &base);
        let total = metrics.total_size();

        for _ in 0..25 {
            let max = (total - view).max(0.0);
            let s = rng.gen_f64(0.0, max);
            let options = base.with_scroll_offset(s);
            let w = compute_window_with(&metrics, &items, &StickyMap::new(), &options);

            assert!(w.range.start <= w.range.first_visible);
            assert!(w.range.first_visible <= w.range.last_visible);
            assert!(w.range.last_visible <= w.range.end);
            assert!(w.range.end <= count);
            assert!(w.range.leading_buffer() <= buffer);
            assert!(w.range.trailing_buffer() <= buffer);

            let first = w.descriptors.first().unwrap();
            let last = w.descriptors.last().unwrap();
            assert!(first.measures.y <= s + EPS, "gap at the leading edge");
            let covered_to = last.measures.y + last.measures.height;
            assert!(
                covered_to + EPS >= (s + view).min(total),
                "gap at the trailing edge (covered {covered_to}, need {})",
                s + view
            );
            // Contiguous.
            for pair in w.descriptors.windows(2) {
                let end = pair[0].measures.y + pair[0].measures.height;
                assert!((end - pair[1].measures.y).abs() < EPS);
                assert_eq!(pair[0].index + 1, pair[1].index);
            }
        }
    }
}

#[test]
fn retained_metrics_track_cache_version() {
    let items = ids(10);
    let mut cache = MeasurementCache::<u64>::default();
    let opts = WindowOptions::new(viewport(100.0, 100.0)).with_dynamic_size(true);
    let metrics = ItemMetrics::for_options(&items, &cache, &opts);
    assert!(metrics.is_current(10, &opts, cache.version()));

    cache.set(3, Bounds::sized(100.0, 90.0));
    assert!(!metrics.is_current(10, &opts, cache.version()));
    assert!(!metrics.is_current(11, &opts, cache.version()));

    let fixed = ItemMetrics::for_options(&items, &cache, &opts.with_dynamic_size(false));
    assert!(fixed.is_current(10, &opts.with_dynamic_size(false), cache.version() + 7));
    assert_eq!(fixed.index_at_offset(50.0), Some(2));
    assert_eq!(fixed.index_at_offset(10_000.0), Some(9));
}

#[test]
fn metrics_for_another_collection_stay_within_the_items() {
    let cache = MeasurementCache::<u64>::default();
    let long = ids(100);
    let short = ids(40);
    let opts = WindowOptions::new(viewport(100.0, 240.0)).with_snap(true);
    let sticky = StickyMap::from_iter([(90u64, Stickiness::End)]);
    let metrics = ItemMetrics::for_options(&long, &cache, &opts).with_sticky_index(&long, &sticky);

    for s in [0.0, 900.0, 1_800.0] {
        let options = opts.with_scroll_offset(s);
        let w = compute_window_with(&metrics, &short, &sticky, &options);
        assert!(w.range.end <= 40);
        assert!(w.iter().all(|d| d.index < 40));
        assert!(w.sticky().is_none());
    }

    let narrow = ItemMetrics::for_options(&ids(10), &cache, &opts);
    let w = compute_window_with(&narrow, &short, &StickyMap::new(), &opts);
    assert_eq!(w.range.end, 10);
    assert_eq!(w.len(), 10);
}

// --- sticky items ----------------------------------------------------------------------------

fn sticky_list(entries: &[(u64, Stickiness)]) -> StickyMap<u64> {
    entries.iter().copied().collect()
}

fn snapped_count(w: &Window<u64, u64>) -> usize {
    w.iter().filter(|d| d.config.snapped).count()
}

#[test]
fn sticky_item_scrolled_past_pins_at_scroll_offset() {
    let items = ids(200);
    let sticky = sticky_list(&[(50, Stickiness::Start)]);
    let opts = WindowOptions::new(viewport(320.0, 240.0))
        .with_snap(true)
        .with_scroll_offset(1300.0);

    let w = window_at(&items, &sticky, opts);
    let pinned = w.sticky().expect("sticky descriptor");
    assert_eq!(pinned.key, 50);
    assert!(pinned.config.snapped);
    assert!(!pinned.config.snapped_out);
    assert_eq!(pinned.config.sticky, Stickiness::Start);
    assert_eq!(pinned.measures, Bounds::new(0.0, 1300.0, 320.0, 24.0));
    assert_eq!(regular(&w).filter(|d| d.key == 50).count(), 0);
    assert_eq!(snapped_count(&w), 1);

    // Sticky resolution only runs with snapping enabled.
    let w = window_at(&items, &sticky, opts.with_snap(false));
    assert!(w.sticky().is_none());
}

#[test]
fn sticky_item_in_leading_buffer_takes_over() {
    let items = ids(200);
    let sticky = sticky_list(&[(50, Stickiness::Start)]);
    let w = window_at(
        &items,
        &sticky,
        WindowOptions::new(viewport(320.0, 240.0))
            .with_snap(true)
            .with_scroll_offset(1210.0),
    );
    assert_eq!(w.range.start, 48);
    let pinned = w.sticky().unwrap();
    assert_eq!(pinned.key, 50);
    assert_eq!(pinned.measures.y, 1210.0);
    assert_eq!(w.iter().filter(|d| d.key == 50).count(), 1);
}

#[test]
fn no_sticky_before_the_first_sticky_item() {
    let items = ids(200);
    let sticky = sticky_list(&[(50, Stickiness::Start)]);
    let w = window_at(
        &items,
        &sticky,
        WindowOptions::new(viewport(320.0, 240.0))
            .with_snap(true)
            .with_scroll_offset(600.0),
    );
    assert!(w.sticky().is_none());
}

#[test]
fn incoming_sticky_pushes_the_active_one_out() {
    let items = ids(200);
    let sticky = sticky_list(&[(50, Stickiness::Start), (60, Stickiness::Start)]);
    let opts = WindowOptions::new(viewport(320.0, 240.0)).with_snap(true);

    // Item 60 starts at 1440, 10px below the pin point: item 50 slides up by 14.
    let w = window_at(&items, &sticky, opts.with_scroll_offset(1430.0));
    let outgoing = w.sticky().unwrap();
    assert_eq!(outgoing.key, 50);
    assert!(outgoing.config.snapped_out);
    assert!(!outgoing.config.snapped);
    assert_eq!(outgoing.measures.y, 1440.0 - 24.0);
    let incoming = regular(&w).find(|d| d.key == 60).unwrap();
    assert_eq!(incoming.measures.y, 1440.0);
    assert!(!incoming.config.snapped);
    assert_eq!(incoming.config.sticky, Stickiness::Start);
    assert_eq!(snapped_count(&w), 0);

    // Still a full item away: no interaction.
    let w = window_at(&items, &sticky, opts.with_scroll_offset(1400.0));
    let active = w.sticky().unwrap();
    assert_eq!(active.key, 50);
    assert!(active.config.snapped);
    assert_eq!(active.measures.y, 1400.0);
}

#[test]
fn incoming_sticky_at_exact_pin_point_replaces_the_old_one() {
    let items = ids(200);
    let sticky = sticky_list(&[(50, Stickiness::Start), (60, Stickiness::Start)]);
    let w = window_at(
        &items,
        &sticky,
        WindowOptions::new(viewport(320.0, 240.0))
            .with_snap(true)
            .with_scroll_offset(1440.0),
    );
    let active = w.sticky().unwrap();
    assert_eq!(active.key, 60);
    assert!(active.config.snapped);
    assert_eq!(active.measures.y, 1440.0);
    assert!(w.iter().all(|d| d.key != 50));
    assert_eq!(snapped_count(&w), 1);
}

#[test]
fn end_sticky_pins_at_trailing_edge_until_scrolled_into_view() {
    let items = ids(200);
    let sticky = sticky_list(&[(150, Stickiness::End)]);
    let opts = WindowOptions::new(viewport(320.0, 240.0)).with_snap(true);

    let w = window_at(&items, &sticky, opts);
    let pinned = w.sticky().unwrap();
    assert_eq!(pinned.key, 150);
    assert_eq!(pinned.config.sticky, Stickiness::End);
    assert!(pinned.config.snapped);
    assert_eq!(pinned.measures.y, 240.0 - 24.0);

    // 150 * 24 = 3600; the viewport [3400, 3640) shows it entirely.
    let w = window_at(&items, &sticky, opts.with_scroll_offset(3400.0));
    assert!(w.sticky().is_none());
    assert_eq!(w.iter().filter(|d| d.key == 150).count(), 1);
}

#[test]
fn sticky_index_matches_the_scan() {
    let mut rng = Lcg::new(7);
    for _ in 0..20 {
        let count = rng.gen_range_u64(1, 300);
        let items = ids(count);
        let mut sticky = StickyMap::new();
        for id in 0..count {
            match rng.gen_range_u64(0, 12) {
                0 => sticky.insert(id, Stickiness::Start),
                1 => sticky.insert(id, Stickiness::End),
                _ => Stickiness::None,
            };
        }
        let cache = MeasurementCache::<u64>::default();
        let base = WindowOptions::new(viewport(100.0, rng.gen_f64(10.0, 300.0))).with_snap(true);
        let plain = ItemMetrics::for_options(&items, &cache, &base);
        let indexed = plain.clone().with_sticky_index(&items, &sticky);
        assert!(plain.sticky_positions(Stickiness::Start).is_none());
        assert!(indexed.sticky_positions(Stickiness::Start).is_some());

        for _ in 0..20 {
            let opts = base.with_scroll_offset(rng.gen_f64(0.0, plain.total_size()));
            assert_eq!(
                compute_window_with(&plain, &items, &sticky, &opts),
                compute_window_with(&indexed, &items, &sticky, &opts)
            );
        }
    }
}

#[test]
fn raw_stickiness_outside_known_values_is_ignored() {
    let mut sticky = StickyMap::<u64>::new();
    assert_eq!(sticky.insert_raw(5, 7), Stickiness::None);
    assert_eq!(sticky.insert_raw(6, -1), Stickiness::None);
    assert!(sticky.is_empty());
    sticky.insert_raw(5, 1);
    assert_eq!(sticky.get(&5), Stickiness::Start);
    assert_eq!(sticky.insert(5, Stickiness::None), Stickiness::Start);
    assert!(sticky.is_empty());
}

#[test]
#[should_panic(expected = "viewport dimensions must be non-negative")]
fn negative_viewport_is_a_programmer_error() {
    let items = ids(10);
    let opts = WindowOptions::new(ViewportBounds {
        width: 100.0,
        height: -1.0,
    });
    window_at(&items, &StickyMap::new(), opts);
}

#[test]
fn input_validation_reports_programmer_errors() {
    assert_eq!(
        ViewportBounds::new(-1.0, 10.0),
        Err(WindowError::NegativeViewport {
            width: -1.0,
            height: 10.0
        })
    );
    assert_eq!(
        ensure_unique_keys(&[1u64, 2, 1]),
        Err(WindowError::DuplicateKey { first: 0, index: 2 })
    );
    let index = index_by_key(&[7u64, 3, 9]).unwrap();
    assert_eq!(index.get(&9), Some(&2));
}

// --- measurement cache -------------------------------------------------------------------------

#[test]
fn equal_size_measurement_is_a_noop() {
    let mut cache = MeasurementCache::<u64>::default();
    assert!(cache.set(1, Bounds::new(0.0, 10.0, 100.0, 30.0)));
    let v1 = cache.version();
    assert!(!cache.set(1, Bounds::new(5.0, 99.0, 100.0, 30.0)));
    assert_eq!(cache.version(), v1);
    // Position of a no-op report is not recorded either.
    assert_eq!(cache.get(&1), Some(Bounds::new(0.0, 10.0, 100.0, 30.0)));

    assert!(cache.set(1, Bounds::new(0.0, 10.0, 100.0, 31.0)));
    assert_eq!(cache.version(), v1 + 1);
    assert!(cache.has(&1));
    assert!(!cache.has(&2));
    assert_eq!(cache.get(&2), None);
}

#[test]
fn size_changes_in_one_tick_notify_once() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    static LAST: AtomicU64 = AtomicU64::new(0);

    let mut cache = MeasurementCache::<u64>::default();
    cache.on_version_change(|version: u64| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        LAST.store(version, Ordering::SeqCst);
    });
    assert_eq!(cache.poll(0), None);

    let changed = cache.set_many((0..3u64).map(|id| (id, Bounds::sized(10.0, 20.0))));
    assert_eq!(changed, 3);
    assert_eq!(cache.poll(16), Some(3));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(LAST.load(Ordering::SeqCst), 3);
    assert_eq!(cache.poll(32), None);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn cleared_version_listener_is_not_called() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let mut cache = MeasurementCache::<u64>::default();
    cache.on_version_change(|_version: u64| {
        CALLS.fetch_add(1, Ordering::SeqCst);
    });
    cache.set(1, Bounds::sized(10.0, 20.0));
    assert_eq!(cache.poll(0), Some(1));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    cache.clear_version_listener();
    cache.set(1, Bounds::sized(10.0, 30.0));
    assert_eq!(cache.poll(1), Some(2));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn change_notification_is_trailing_edge_debounced() {
    let mut cache = MeasurementCache::<u64>::new(CacheOptions::default().with_change_delay_ms(10));
    cache.set(1, Bounds::sized(10.0, 20.0));
    assert_eq!(cache.poll(0), None); // deadline 10
    cache.set(2, Bounds::sized(10.0, 20.0));
    assert_eq!(cache.poll(5), None); // superseded: deadline 15
    assert_eq!(cache.poll(12), None);
    assert_eq!(cache.poll(15), Some(2));
    assert_eq!(cache.poll(40), None);
}

#[test]
fn direction_majority_needs_a_strict_winner() {
    let mut cache = MeasurementCache::<u64>::default();
    for i in 0..50 {
        let dir = if i % 2 == 0 || i == 49 {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        };
        cache.set_delta_direction(dir);
    }
    // 26 forward, 24 backward.
    assert_eq!(cache.scroll_direction(), ScrollDirection::Forward);

    let mut cache = MeasurementCache::<u64>::default();
    cache.set_delta_direction(ScrollDirection::Forward);
    cache.set_delta_direction(ScrollDirection::Backward);
    cache.set_delta_direction(ScrollDirection::Idle);
    assert_eq!(cache.scroll_direction(), ScrollDirection::Idle);

    cache.set_delta_direction(ScrollDirection::Backward);
    assert_eq!(cache.scroll_direction(), ScrollDirection::Backward);
}

#[test]
fn direction_window_is_bounded_and_trimmed_when_idle() {
    let mut cache =
        MeasurementCache::<u64>::new(CacheOptions::default().with_direction_idle_ms(100));
    for _ in 0..40 {
        cache.set_delta_direction(ScrollDirection::Backward);
    }
    for _ in 0..20 {
        cache.set_delta_direction(ScrollDirection::Forward);
    }
    assert_eq!(cache.direction_samples(), DIRECTION_WINDOW_CAPACITY);
    // 30 backward vs 20 forward remain.
    assert_eq!(cache.scroll_direction(), ScrollDirection::Backward);

    cache.poll(0);
    assert_eq!(cache.direction_samples(), DIRECTION_WINDOW_CAPACITY);
    cache.poll(100);
    assert_eq!(cache.direction_samples(), DIRECTION_WINDOW_IDLE_LEN);
    assert_eq!(cache.scroll_direction(), ScrollDirection::Forward);
}

#[test]
fn snapshot_diff_reports_resized_and_new_entries() {
    let mut cache = MeasurementCache::<u64>::default();
    cache.set(1, Bounds::sized(10.0, 20.0));
    cache.set(2, Bounds::sized(10.0, 20.0));
    cache.snapshot();
    assert!(cache.changed_since_snapshot().is_empty());

    cache.set(1, Bounds::new(0.0, 50.0, 10.0, 20.0));
    cache.set(2, Bounds::sized(10.0, 45.0));
    cache.set(3, Bounds::sized(10.0, 30.0));
    let mut changes = cache.changed_since_snapshot();
    changes.sort_by_key(|c| c.key);
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].key, 2);
    assert_eq!(changes[0].main_delta(Axis::Vertical, 24.0), 25.0);
    assert_eq!(changes[1].key, 3);
    assert_eq!(changes[1].previous, None);
    assert_eq!(changes[1].main_delta(Axis::Vertical, 24.0), 6.0);
}

#[test]
fn dispose_is_idempotent_and_final() {
    let mut cache = MeasurementCache::<u64>::default();
    cache.set(1, Bounds::sized(10.0, 20.0));
    cache.dispose();
    cache.dispose();
    assert!(cache.is_disposed());
    assert!(cache.is_empty());
    assert!(!cache.set(2, Bounds::sized(10.0, 20.0)));
    assert_eq!(cache.poll(100), None);
}

// --- slot tracker ------------------------------------------------------------------------------

#[derive(Debug)]
struct TestSlot {
    id: SlotId,
    key: Option<u64>,
    y: f64,
    visible: bool,
}

impl TestSlot {
    fn new(id: SlotId) -> Self {
        Self {
            id,
            key: None,
            y: 0.0,
            visible: false,
        }
    }
}

impl RenderSlot<u64, u64> for TestSlot {
    fn slot_id(&self) -> SlotId {
        self.id
    }

    fn assign(&mut self, descriptor: &RenderDescriptor<u64, u64>) {
        self.key = Some(descriptor.key);
        self.y = descriptor.measures.y;
    }

    fn clear(&mut self) {
        self.key = None;
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

fn descriptor(key: u64, pinned: bool) -> RenderDescriptor<u64, u64> {
    RenderDescriptor {
        key,
        index: key as usize,
        measures: Bounds::new(0.0, key as f64 * 24.0, 100.0, 24.0),
        item: key,
        config: DescriptorConfig {
            snapped: pinned,
            ..DescriptorConfig::default()
        },
    }
}

fn frame(keys: impl IntoIterator<Item = u64>) -> Vec<RenderDescriptor<u64, u64>> {
    keys.into_iter().map(|k| descriptor(k, false)).collect()
}

fn slot_of(pool: &[TestSlot], key: u64) -> Option<SlotId> {
    pool.iter().find(|s| s.key == Some(key)).map(|s| s.id)
}

#[test]
fn first_frame_spawns_one_slot_per_descriptor() {
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    let report = tracker.track(
        &frame(0..5),
        &mut pool,
        None,
        ScrollDirection::Idle,
        TestSlot::new,
    );
    assert_eq!(report.created, 5);
    assert_eq!(report.bindings(), 5);
    assert_eq!(pool.len(), 5);
    assert!(pool.iter().all(|s| s.visible && s.key.is_some()));
    assert_eq!(tracker.len(), 5);
}

#[test]
fn items_that_stay_visible_keep_their_slot() {
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    tracker.track(&frame(0..5), &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    let before: Vec<_> = (1..5).map(|k| slot_of(&pool, k)).collect();
    let leaving = slot_of(&pool, 0);

    let report = tracker.track(
        &frame(1..6),
        &mut pool,
        None,
        ScrollDirection::Forward,
        TestSlot::new,
    );
    assert_eq!(report.reused, 4);
    assert_eq!(report.rebound, 1);
    assert_eq!(report.created, 0);
    assert_eq!(pool.len(), 5);
    let after: Vec<_> = (1..5).map(|k| slot_of(&pool, k)).collect();
    assert_eq!(before, after);
    // The slot of the item that left now shows the item that entered.
    assert_eq!(slot_of(&pool, 5), leaving);
    assert_eq!(tracker.slot_for(&0), None);
    assert_eq!(tracker.key_for(leaving.unwrap()), Some(&5));
}

#[test]
fn shrinking_window_hides_and_clears_leftover_slots() {
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    tracker.track(&frame(0..5), &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    let report = tracker.track(&frame(0..2), &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    assert_eq!(report.reused, 2);
    assert_eq!(report.idle, 3);
    assert_eq!(pool.iter().filter(|s| s.visible).count(), 2);
    assert_eq!(pool.iter().filter(|s| s.key.is_some()).count(), 2);

    // Scrolling back re-binds the idle slots that still remember their items.
    let slot_for_4 = tracker.slot_for(&4);
    let report = tracker.track(&frame(0..5), &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    assert_eq!(report.reused, 5);
    assert_eq!(report.bindings(), 0);
    assert_eq!(slot_of(&pool, 4), slot_for_4);
}

#[test]
fn backward_scroll_matches_trailing_descriptors_first() {
    let mut tracker = SlotTracker::new();
    let mut pool: Vec<TestSlot> = (0..3).map(|i| TestSlot::new(SlotId(100 + i))).collect();

    tracker.track(&frame([1, 2, 3]), &mut pool, None, ScrollDirection::Backward, TestSlot::new);
    assert_eq!(slot_of(&pool, 3), Some(SlotId(100)));
    assert_eq!(slot_of(&pool, 1), Some(SlotId(102)));

    let mut tracker = SlotTracker::new();
    let mut pool: Vec<TestSlot> = (0..3).map(|i| TestSlot::new(SlotId(100 + i))).collect();
    tracker.track(&frame([1, 2, 3]), &mut pool, None, ScrollDirection::Forward, TestSlot::new);
    assert_eq!(slot_of(&pool, 1), Some(SlotId(100)));
}

#[test]
fn sticky_descriptor_goes_to_the_pinned_slot() {
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    let mut pinned = TestSlot::new(SlotId(9_000));

    tracker.track(&frame(0..4), &mut pool, Some(&mut pinned), ScrollDirection::Idle, TestSlot::new);
    assert!(!pinned.visible);
    assert_eq!(pinned.key, None);

    let mut descriptors = vec![descriptor(2, true)];
    descriptors.extend(frame([3, 4, 5]));
    let report = tracker.track(
        &descriptors,
        &mut pool,
        Some(&mut pinned),
        ScrollDirection::Forward,
        TestSlot::new,
    );
    assert!(report.pinned);
    assert!(pinned.visible);
    assert_eq!(pinned.key, Some(2));
    // The regular slot of item 2 is not used for it this frame.
    assert!(pool.iter().all(|s| s.key != Some(2)));
    assert_eq!(pool.iter().filter(|s| s.visible).count(), 3);

    // Nothing sticky any more: the pinned slot is released.
    let report = tracker.track(
        &frame(3..6),
        &mut pool,
        Some(&mut pinned),
        ScrollDirection::Idle,
        TestSlot::new,
    );
    assert!(!report.pinned);
    assert!(!pinned.visible);
    assert_eq!(pinned.key, None);
}

#[test]
fn without_a_pinned_slot_sticky_descriptors_use_the_pool() {
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    let mut descriptors = vec![descriptor(7, true)];
    descriptors.extend(frame([8, 9]));
    let report = tracker.track(&descriptors, &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    assert!(!report.pinned);
    assert_eq!(report.created, 3);
    assert!(slot_of(&pool, 7).is_some());
}

#[test]
fn slots_removed_from_the_pool_are_forgotten() {
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    tracker.track(&frame(0..3), &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    let gone = pool.remove(0);
    let gone_key = gone.key.unwrap();

    let report = tracker.track(&frame(0..3), &mut pool, None, ScrollDirection::Idle, TestSlot::new);
    assert_eq!(report.reused, 2);
    assert_eq!(report.created, 1);
    assert_ne!(tracker.slot_for(&gone_key), Some(gone.id));
    assert!(pool.iter().all(|s| s.id != gone.id || s.key != Some(gone_key)));
}

#[test]
fn rebinding_is_bounded_by_new_keys() {
    let mut rng = Lcg::new(42);
    let mut tracker = SlotTracker::new();
    let mut pool = Vec::new();
    let mut prev: Vec<u64> = Vec::new();
    let mut start = 0u64;

    for _ in 0..200 {
        let jump = rng.gen_range_u64(0, 8);
        start = if rng.gen_range_u64(0, 2) == 0 {
            start + jump
        } else {
            start.saturating_sub(jump)
        };
        let len = rng.gen_range_u64(3, 15);
        let keys: Vec<u64> = (start..start + len).collect();
        let kept = keys.iter().filter(|k| prev.contains(k)).count();

        let report = tracker.track(
            &frame(keys.iter().copied()),
            &mut pool,
            None,
            ScrollDirection::Idle,
            TestSlot::new,
        );
        // Idle slots may still remember older keys, so reuse can exceed the overlap.
        assert!(report.reused >= kept);
        assert!(report.bindings() <= keys.len() - kept);
        assert_eq!(pool.iter().filter(|s| s.visible).count(), keys.len());
        for &k in &keys {
            let slot = tracker.slot_for(&k).unwrap();
            let owner = pool.iter().find(|s| s.id == slot).unwrap();
            assert_eq!(owner.key, Some(k));
        }
        prev = keys;
    }
}

#[test]
fn debouncer_fires_once_per_burst() {
    let mut d = Debouncer::new(5);
    assert!(!d.poll(0));
    d.trigger(0);
    d.trigger(3);
    assert!(!d.poll(7));
    assert!(d.poll(8));
    assert!(!d.poll(9));

    let mut immediate = Debouncer::new(0);
    immediate.mark();
    immediate.mark();
    assert!(immediate.is_pending());
    assert!(immediate.poll(1));
    assert!(!immediate.is_pending());
}

#[test]
fn item_ids_cover_strings_and_integers() {
    assert_eq!(ItemId::from(5i64).to_string(), "5");
    assert_eq!(ItemId::from("row-7").to_string(), "row-7");
    assert_ne!(ItemId::from(5i64), ItemId::from("5"));
    let shared: Arc<ItemId> = Arc::new(ItemId::from("x"));
    assert_eq!(shared.key(), ItemId::from("x"));
}
