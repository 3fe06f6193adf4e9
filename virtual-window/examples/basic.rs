// Example: fixed-size window over a million rows.
use virtual_window::{MeasurementCache, StickyMap, ViewportBounds, WindowOptions, compute_window};

fn main() -> Result<(), virtual_window::WindowError> {
    let items: Vec<u64> = (0..1_000_000).collect();
    let cache = MeasurementCache::<u64>::default();
    let sticky = StickyMap::new();

    let opts = WindowOptions::new(ViewportBounds::new(320.0, 400.0)?).with_scroll_offset(123_456.0);
    let window = compute_window(&items, &sticky, &cache, &opts);

    println!("total_size={}", window.total_size);
    println!("range={:?}", window.range);
    println!("descriptors={}", window.len());
    if let Some(first) = window.descriptors.first() {
        println!("first key={} y={}", first.key, first.measures.y);
    }
    Ok(())
}
