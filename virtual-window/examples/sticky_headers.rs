// Example: section headers that stick to the top and push each other out.
use virtual_window::{
    MeasurementCache, Stickiness, StickyMap, ViewportBounds, WindowOptions, compute_window,
};

fn main() -> Result<(), virtual_window::WindowError> {
    let items: Vec<u64> = (0..1_000).collect();
    let cache = MeasurementCache::<u64>::default();

    // A header every 20 rows.
    let sticky: StickyMap<u64> = items
        .iter()
        .filter(|id| *id % 20 == 0)
        .map(|&id| (id, Stickiness::Start))
        .collect();

    let base = WindowOptions::new(ViewportBounds::new(320.0, 240.0)?).with_snap(true);
    for offset in [0.0, 300.0, 470.0, 480.0] {
        let window = compute_window(&items, &sticky, &cache, &base.with_scroll_offset(offset));
        match window.sticky() {
            Some(d) => println!(
                "offset={offset}: header {} at y={} snapped={} snapped_out={}",
                d.key, d.measures.y, d.config.snapped, d.config.snapped_out
            ),
            None => println!("offset={offset}: no header pinned"),
        }
    }
    Ok(())
}
