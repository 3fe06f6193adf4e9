use crate::key::{KeyCacheKey, KeyMap};
use crate::{Bounds, RenderDescriptor, ScrollDirection};

/// Identity of a render slot in the host's pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotId(pub u64);

impl SlotId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A reusable render unit owned by the host (a widget, a DOM node, a terminal region...).
///
/// The tracker only ever talks to slots through this trait. Binding a slot to a different item
/// is what the tracker tries to avoid; `assign` on an already bound slot is expected to be cheap.
pub trait RenderSlot<K, T> {
    fn slot_id(&self) -> SlotId;

    fn assign(&mut self, descriptor: &RenderDescriptor<K, T>);

    /// Drops the item data held by the slot.
    fn clear(&mut self);

    fn show(&mut self);

    fn hide(&mut self);

    /// Bounds observed after the last paint, if the host measured them.
    fn measure(&self) -> Option<Bounds> {
        None
    }
}

/// What one [`SlotTracker::track`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackReport {
    /// Descriptors that got the slot they already had.
    pub reused: usize,
    /// Descriptors bound to an idle slot of the pool.
    pub rebound: usize,
    /// Descriptors for which a new slot had to be spawned.
    pub created: usize,
    /// Slots left without an item (hidden and cleared).
    pub idle: usize,
    /// Whether the pinned slot received a sticky descriptor.
    pub pinned: bool,
}

impl TrackReport {
    /// New item-to-slot bindings made by the call.
    pub fn bindings(&self) -> usize {
        self.rebound + self.created
    }
}

/// Assigns render descriptors to a bounded pool of slots, keeping every item that stays in the
/// window on the slot it already had.
#[derive(Clone, Debug)]
pub struct SlotTracker<K> {
    assignments: KeyMap<K, SlotId>,
    bound: KeyMap<SlotId, K>,
    next_slot_id: u64,
}

impl<K: KeyCacheKey + Clone> Default for SlotTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeyCacheKey + Clone> SlotTracker<K> {
    pub fn new() -> Self {
        Self {
            assignments: KeyMap::new(),
            bound: KeyMap::new(),
            next_slot_id: 0,
        }
    }

    /// The slot last bound to `key`.
    pub fn slot_for(&self, key: &K) -> Option<SlotId> {
        self.assignments.get(key).copied()
    }

    /// The item key last bound to `slot`.
    pub fn key_for(&self, slot: SlotId) -> Option<&K> {
        self.bound.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
        self.bound.clear();
    }

    /// Maps `descriptors` onto `pool` for one frame.
    ///
    /// Descriptors are visited forward, or backward when scrolling backward, so the items
    /// entering in the direction of travel are matched first. Sticky descriptors go to `pinned`
    /// when one is supplied. New slots are only spawned when the pool has no idle slot left, so
    /// `rebound + created` never exceeds the number of descriptors whose key has no live slot.
    pub fn track<T, S>(
        &mut self,
        descriptors: &[RenderDescriptor<K, T>],
        pool: &mut Vec<S>,
        mut pinned: Option<&mut S>,
        direction: ScrollDirection,
        mut spawn: impl FnMut(SlotId) -> S,
    ) -> TrackReport
    where
        S: RenderSlot<K, T>,
    {
        let mut report = TrackReport::default();

        let positions: KeyMap<SlotId, usize> = pool
            .iter()
            .enumerate()
            .map(|(pos, slot)| (slot.slot_id(), pos))
            .collect();
        self.assignments.retain(|_, id| positions.contains_key(id));
        self.bound.retain(|id, _| positions.contains_key(id));

        let order: Vec<usize> = if direction == ScrollDirection::Backward {
            (0..descriptors.len()).rev().collect()
        } else {
            (0..descriptors.len()).collect()
        };

        let mut claimed = vec![false; pool.len()];
        let mut queue = Vec::new();
        for &di in &order {
            let descriptor = &descriptors[di];
            if !report.pinned && descriptor.config.is_pinned() {
                if let Some(slot) = pinned.as_deref_mut() {
                    slot.assign(descriptor);
                    slot.show();
                    report.pinned = true;
                    continue;
                }
            }
            let reusable = self
                .assignments
                .get(&descriptor.key)
                .and_then(|id| positions.get(id))
                .copied()
                .filter(|&pos| !claimed[pos]);
            match reusable {
                Some(pos) => {
                    claimed[pos] = true;
                    let slot = &mut pool[pos];
                    slot.assign(descriptor);
                    slot.show();
                    report.reused += 1;
                }
                None => queue.push(di),
            }
        }

        let free: Vec<usize> = (0..pool.len()).filter(|&pos| !claimed[pos]).collect();
        let mut free = free.into_iter();
        for di in queue {
            let descriptor = &descriptors[di];
            let pos = match free.next() {
                Some(pos) => {
                    report.rebound += 1;
                    pos
                }
                None => {
                    let id = self.allocate_slot_id(&positions);
                    pool.push(spawn(id));
                    report.created += 1;
                    pool.len() - 1
                }
            };
            let slot = &mut pool[pos];
            self.bind(descriptor.key.clone(), slot.slot_id());
            slot.assign(descriptor);
            slot.show();
        }

        for pos in free {
            let slot = &mut pool[pos];
            slot.hide();
            slot.clear();
            report.idle += 1;
        }

        if !report.pinned {
            if let Some(slot) = pinned {
                slot.hide();
                slot.clear();
            }
        }

        vtrace!(
            descriptors = descriptors.len(),
            reused = report.reused,
            rebound = report.rebound,
            created = report.created,
            idle = report.idle,
            pinned = report.pinned,
            "SlotTracker::track"
        );
        report
    }

    fn bind(&mut self, key: K, slot: SlotId) {
        if let Some(previous) = self.bound.insert(slot, key.clone()) {
            if previous != key && self.assignments.get(&previous) == Some(&slot) {
                self.assignments.remove(&previous);
            }
        }
        if let Some(old_slot) = self.assignments.insert(key.clone(), slot) {
            if old_slot != slot && self.bound.get(&old_slot) == Some(&key) {
                self.bound.remove(&old_slot);
            }
        }
    }

    fn allocate_slot_id(&mut self, taken: &KeyMap<SlotId, usize>) -> SlotId {
        loop {
            let id = SlotId(self.next_slot_id);
            self.next_slot_id = self.next_slot_id.wrapping_add(1);
            if !taken.contains_key(&id) {
                return id;
            }
        }
    }
}
