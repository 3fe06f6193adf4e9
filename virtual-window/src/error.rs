/// Programmer errors in the input of a windowing session.
///
/// The hot path never returns these: irregular but recoverable input (negative offsets, unknown
/// stickiness, unmeasured items) is clamped instead.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("duplicate item key at index {index} (first seen at index {first})")]
    DuplicateKey { first: usize, index: usize },
    #[error("viewport dimensions must be non-negative (got {width}x{height})")]
    NegativeViewport { width: f64, height: f64 },
}
