// Example: a frame loop driving a session (scroll, measure, tween, anchoring).
use virtual_window::{
    Align, Bounds, ItemId, RenderDescriptor, RenderSlot, SlotId, Stickiness, StickyMap,
    ViewportBounds,
};
use virtual_window_adapter::{Easing, Session, SessionOptions};

struct Row {
    id: SlotId,
    key: Option<ItemId>,
    height: Option<f64>,
}

impl RenderSlot<ItemId, ItemId> for Row {
    fn slot_id(&self) -> SlotId {
        self.id
    }

    fn assign(&mut self, descriptor: &RenderDescriptor<ItemId, ItemId>) {
        // Pretend every fifth row wraps onto a second line.
        let wraps = descriptor.index % 5 == 0;
        self.key = Some(descriptor.key.clone());
        self.height = Some(if wraps { 40.0 } else { 24.0 });
    }

    fn clear(&mut self) {
        self.key = None;
        self.height = None;
    }

    fn show(&mut self) {}

    fn hide(&mut self) {}

    fn measure(&self) -> Option<Bounds> {
        self.height.map(|h| Bounds::sized(320.0, h))
    }
}

fn new_row(id: SlotId) -> Row {
    Row {
        id,
        key: None,
        height: None,
    }
}

fn main() -> Result<(), virtual_window::WindowError> {
    let opts = SessionOptions::new()
        .with_dynamic_size(true)
        .with_snap(true)
        .with_recompute_delay_ms(4);
    let mut session = Session::<ItemId>::new(opts);
    session.on_version_change(|v: u64| println!("  measurements settled (version {v})"));

    let items: Vec<ItemId> = (0..500i64).map(ItemId::from).collect();
    session.set_sticky_map(StickyMap::from_iter(
        items
            .iter()
            .step_by(50)
            .map(|id| (id.clone(), Stickiness::Start)),
    ));
    session.set_items(items)?;
    session.on_resize(ViewportBounds::new(320.0, 240.0)?, 0)?;

    let mut pool: Vec<Row> = Vec::new();
    let mut pinned = new_row(SlotId(u64::MAX));
    let target = ItemId::from(260i64);
    session.start_tween_to_key(&target, Align::Center, 0, 120, Easing::EaseInOutCubic);

    for frame in 0..12u64 {
        let now_ms = frame * 16;
        if let Some(window) = session.tick(now_ms) {
            println!(
                "t={now_ms} recompute: range={:?} total={}",
                window.range, window.total_size
            );
        }
        if let Some(report) = session.render(&mut pool, Some(&mut pinned), new_row) {
            println!("  slots: {report:?}");
        }
        session.measure_slots(&pool, now_ms);
        if let Some(offset) = session.take_scroll_correction() {
            println!("  host scrolls to {offset:.1}");
        }
    }

    println!("pinned header: {:?}", pinned.key);
    session.dispose();
    Ok(())
}
