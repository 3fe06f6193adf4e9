use crate::Stickiness;

/// The scroll axis of a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

/// Net scroll direction of a frame (`-1`, `0`, `+1`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Backward,
    #[default]
    Idle,
    Forward,
}

impl ScrollDirection {
    /// Classifies a signed scroll delta. `NaN` counts as no movement.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Forward
        } else if delta < 0.0 {
            Self::Backward
        } else {
            Self::Idle
        }
    }

    pub fn signum(self) -> i8 {
        match self {
            Self::Backward => -1,
            Self::Idle => 0,
            Self::Forward => 1,
        }
    }
}

/// Geometry of one item in content coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin; handy when only the size of a measurement matters.
    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Finite, non-negative width and height.
    pub fn is_measurable(&self) -> bool {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        ok(self.width) && ok(self.height)
    }

    /// Whether both rectangles have the same width and height (position is ignored).
    pub fn same_size(&self, other: &Bounds) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn main_start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.y,
            Axis::Horizontal => self.x,
        }
    }

    pub fn main_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.height,
            Axis::Horizontal => self.width,
        }
    }

    pub fn main_end(&self, axis: Axis) -> f64 {
        self.main_start(axis) + self.main_size(axis)
    }

    pub fn cross_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.width,
            Axis::Horizontal => self.height,
        }
    }
}

/// Per-item flags carried by a [`RenderDescriptor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorConfig {
    pub sticky: Stickiness,
    /// Sticky snapping was enabled for the frame.
    pub snap: bool,
    /// The item is the active sticky item, pinned at the viewport edge.
    pub snapped: bool,
    /// The item is the outgoing sticky item, being pushed away by the next one.
    pub snapped_out: bool,
    pub is_vertical: bool,
    pub dynamic: bool,
}

impl DescriptorConfig {
    /// Whether the descriptor belongs in a pinned slot.
    pub fn is_pinned(&self) -> bool {
        self.snapped || self.snapped_out
    }
}

/// What the renderer needs to paint one item for one frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderDescriptor<K, T> {
    pub key: K,
    pub index: usize,
    pub measures: Bounds,
    pub item: T,
    pub config: DescriptorConfig,
}

/// Index ranges of a computed window. All ends are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowRange {
    pub first_visible: usize,
    pub last_visible: usize,
    /// Start of the window including the leading offscreen buffer.
    pub start: usize,
    /// End of the window including the trailing offscreen buffer.
    pub end: usize,
}

impl WindowRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn leading_buffer(&self) -> usize {
        self.first_visible.saturating_sub(self.start)
    }

    pub fn trailing_buffer(&self) -> usize {
        self.end.saturating_sub(self.last_visible)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// The result of one recompute: ordered descriptors plus the total content extent.
///
/// When a sticky item is active it is always the first descriptor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window<K, T> {
    pub descriptors: Vec<RenderDescriptor<K, T>>,
    pub total_size: f64,
    pub range: WindowRange,
}

impl<K, T> Window<K, T> {
    pub fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
            total_size: 0.0,
            range: WindowRange::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// The active (or outgoing) sticky descriptor, if any.
    pub fn sticky(&self) -> Option<&RenderDescriptor<K, T>> {
        self.descriptors.first().filter(|d| d.config.is_pinned())
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RenderDescriptor<K, T>> {
        self.descriptors.iter()
    }
}

impl<K, T> Default for Window<K, T> {
    fn default() -> Self {
        Self::empty()
    }
}
