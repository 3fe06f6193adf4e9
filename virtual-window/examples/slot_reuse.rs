// Example: reusing a small pool of render slots while scrolling.
use virtual_window::{
    MeasurementCache, RenderDescriptor, RenderSlot, ScrollDirection, SlotId, SlotTracker,
    StickyMap, ViewportBounds, WindowOptions, compute_window,
};

struct Row {
    id: SlotId,
    key: Option<u64>,
    visible: bool,
}

impl RenderSlot<u64, u64> for Row {
    fn slot_id(&self) -> SlotId {
        self.id
    }

    fn assign(&mut self, descriptor: &RenderDescriptor<u64, u64>) {
        self.key = Some(descriptor.key);
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

fn main() -> Result<(), virtual_window::WindowError> {
    let items: Vec<u64> = (0..10_000).collect();
    let mut cache = MeasurementCache::<u64>::default();
    let sticky = StickyMap::new();
    let base = WindowOptions::new(ViewportBounds::new(320.0, 240.0)?);

    let mut tracker = SlotTracker::new();
    let mut pool: Vec<Row> = Vec::new();
    let mut offset = 0.0;
    for step in 0..5 {
        let delta = if step == 3 { -30.0 } else { 50.0 };
        offset = f64::max(offset + delta, 0.0);
        cache.set_delta_direction(ScrollDirection::from_delta(delta));

        let window = compute_window(&items, &sticky, &cache, &base.with_scroll_offset(offset));
        let report = tracker.track(
            &window.descriptors,
            &mut pool,
            None,
            cache.scroll_direction(),
            |id| Row {
                id,
                key: None,
                visible: false,
            },
        );
        let visible = pool.iter().filter(|r| r.visible).count();
        let first = pool.iter().filter_map(|r| r.key).min();
        println!(
            "offset={offset} {report:?} pool={} visible={visible} first={first:?}",
            pool.len()
        );
    }
    Ok(())
}
