/// A trailing-edge debounce driven by caller-supplied timestamps.
///
/// The crate never reads a clock. Adapters arm the debouncer when something happens and poll it
/// once per scheduling tick; each new trigger supersedes the pending deadline, so a burst of
/// triggers fires exactly once, `delay_ms` after the last one. With a zero delay, everything
/// triggered before a poll is coalesced into that poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u64,
    pending: bool,
    deadline: Option<u64>,
}

impl Debouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: false,
            deadline: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Takes effect for the next trigger; an armed deadline is kept.
    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    /// Arms (or re-arms) the debouncer at `now_ms`.
    pub fn trigger(&mut self, now_ms: u64) {
        self.pending = true;
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// Arms the debouncer without a timestamp. The delay starts at the next [`Self::poll`].
    pub fn mark(&mut self) {
        self.pending = true;
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns `true` exactly once per armed burst, when the deadline has passed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.pending {
            return false;
        }
        let delay = self.delay_ms;
        let deadline = *self
            .deadline
            .get_or_insert_with(|| now_ms.saturating_add(delay));
        if now_ms < deadline {
            return false;
        }
        self.cancel();
        true
    }

    pub fn cancel(&mut self) {
        self.pending = false;
        self.deadline = None;
    }
}
