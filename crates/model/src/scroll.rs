#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Surface shift in device pixels. A positive delta moves content towards larger
/// coordinates, which exposes the leading edge of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub axis: Axis,
    pub delta: i64,
}

impl ScrollCommand {
    pub const fn new(axis: Axis, delta: i64) -> Self {
        Self { axis, delta }
    }
}
