// Example: measured sizes replace the typical size once reported.
use virtual_window::{
    Bounds, ItemId, MeasurementCache, StickyMap, ViewportBounds, WindowOptions, compute_window,
};

fn main() -> Result<(), virtual_window::WindowError> {
    let items: Vec<ItemId> = (0..100i64).map(ItemId::from).collect();
    let mut cache = MeasurementCache::<ItemId>::default();
    cache.on_version_change(|version: u64| println!("cache version -> {version}"));

    let opts = WindowOptions::new(ViewportBounds::new(320.0, 200.0)?).with_dynamic_size(true);
    let before = compute_window(&items, &StickyMap::new(), &cache, &opts);
    println!("before: total={} range={:?}", before.total_size, before.range);

    // The renderer reports what it actually painted.
    for d in &before.descriptors {
        let height = if d.index % 3 == 0 { 60.0 } else { 24.0 };
        cache.set(d.key.clone(), Bounds::new(0.0, d.measures.y, 320.0, height));
    }
    // Re-reporting the same size is ignored.
    cache.set(ItemId::from(0i64), Bounds::sized(320.0, 60.0));

    // One coalesced notification for the whole batch.
    cache.poll(16);

    let after = compute_window(&items, &StickyMap::new(), &cache, &opts);
    println!("after: total={} range={:?}", after.total_size, after.range);
    Ok(())
}
