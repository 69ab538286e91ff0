//! Integer and floating point geometry tagged with the coordinate space it lives in.
//!
//! The unit parameter is a zero-sized marker. Mixing spaces is a type error; crossing
//! between them goes through `crate::transform`.

use std::marker::PhantomData;

/// Document-native length unit, 1/1440 inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Twips;

/// Device-independent pixels as reported by the host widget before zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dip;

/// CSS pixels: 96 per inch, zoom applied, device scale not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CssPx;

/// Physical pixels of the paint surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevicePx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point<U> {
    pub x: i64,
    pub y: i64,
    unit: PhantomData<U>,
}

impl<U> Point<U> {
    pub const fn new(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            unit: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn offset(self, delta_x: i64, delta_y: i64) -> Self {
        Self::new(self.x + delta_x, self.y + delta_y)
    }

    pub fn is_origin(self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn to_f64(self) -> PointF<U> {
        PointF::new(self.x as f64, self.y as f64)
    }

    pub(crate) fn cast_unit<V>(self) -> Point<V> {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF<U> {
    pub x: f64,
    pub y: f64,
    unit: PhantomData<U>,
}

impl<U> PointF<U> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            unit: PhantomData,
        }
    }

    pub fn offset(self, delta_x: f64, delta_y: f64) -> Self {
        Self::new(self.x + delta_x, self.y + delta_y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<U> {
    pub width: i64,
    pub height: i64,
    unit: PhantomData<U>,
}

impl<U> Size<U> {
    pub const fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            unit: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn to_f64(self) -> SizeF<U> {
        SizeF::new(self.width as f64, self.height as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeF<U> {
    pub width: f64,
    pub height: f64,
    unit: PhantomData<U>,
}

impl<U> SizeF<U> {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            unit: PhantomData,
        }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle, origin at the top left, half-open on the far edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<U> {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    unit: PhantomData<U>,
}

impl<U> Rect<U> {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: PhantomData,
        }
    }

    pub const fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn from_size(size: Size<U>) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn from_origin_size(origin: Point<U>, size: Size<U>) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Builds a rect from its edges; inverted edges collapse to an empty rect at `min`.
    pub fn from_edges(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self::new(
            min_x,
            min_y,
            (max_x - min_x).max(0),
            (max_y - min_y).max(0),
        )
    }

    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point<U> {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size<U> {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width * self.height
        }
    }

    /// Overlap test. Rects that only share an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn intersect(&self, other: &Self) -> Self {
        if !self.intersects(other) {
            return Self::empty();
        }
        Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Bounding box of both rects; empty inputs are ignored.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return Self::new(other.x, other.y, other.width, other.height);
        }
        if other.is_empty() {
            return Self::new(self.x, self.y, self.width, self.height);
        }
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn offset(&self, delta_x: i64, delta_y: i64) -> Self {
        Self::new(self.x + delta_x, self.y + delta_y, self.width, self.height)
    }

    pub fn contains_point(&self, point: Point<U>) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Self) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn with_width(&self, width: i64) -> Self {
        Self::new(self.x, self.y, width, self.height)
    }

    pub fn with_height(&self, height: i64) -> Self {
        Self::new(self.x, self.y, self.width, height)
    }

    pub(crate) fn cast_unit<V>(&self) -> Rect<V> {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

pub type TwipRect = Rect<Twips>;
pub type CssRect = Rect<CssPx>;
pub type DeviceRect = Rect<DevicePx>;
