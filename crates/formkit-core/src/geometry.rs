#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are signed design units with the origin at the top-left of
//! the canvas. Rectangles are half-open: the left/top edges are inclusive and
//! the right/bottom edges are exclusive.

use serde::{Deserialize, Serialize};

/// A point in canvas or local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Origin point.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise offset from `origin` to `self`.
    #[inline]
    #[must_use]
    pub const fn delta_from(self, origin: Point) -> (i32, i32) {
        (
            self.x.saturating_sub(origin.x),
            self.y.saturating_sub(origin.y),
        )
    }

    /// Squared euclidean distance, widened to avoid overflow.
    #[inline]
    #[must_use]
    pub const fn distance_sq(self, other: Point) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero or negative.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// A rectangle used for control geometry, content bounds, and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in design units.
    pub width: i32,
    /// Height in design units.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Build a rectangle from its four edges, clamping inverted spans to zero.
    #[inline]
    #[must_use]
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left).max(0),
            bottom.saturating_sub(top).max(0),
        )
    }

    /// Bounding box of two corner points, in any order.
    #[must_use]
    pub fn normalized(a: Point, b: Point) -> Self {
        Self::from_edges(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Integer center point (rounded toward the top-left).
    #[inline]
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    ///
    /// Edges may touch. A zero-size rectangle is contained if its origin lies
    /// within the closed bounds.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Shift the rectangle by a delta.
    #[inline]
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Same size, new origin.
    #[inline]
    #[must_use]
    pub const fn with_origin(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.width, self.height)
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Create a new rectangle inside the current one with the given margin.
    #[must_use]
    pub fn inner(&self, margin: Sides) -> Rect {
        Rect::from_edges(
            self.x.saturating_add(margin.left),
            self.y.saturating_add(margin.top),
            self.right().saturating_sub(margin.right),
            self.bottom().saturating_sub(margin.bottom),
        )
    }

    /// Keep the size, move the origin so the rectangle fits in `bounds`.
    ///
    /// When the rectangle is larger than `bounds` on an axis the origin snaps
    /// to the bounds' leading edge.
    #[must_use]
    pub fn clamp_position_into(&self, bounds: &Rect) -> Rect {
        let max_x = bounds.right().saturating_sub(self.width).max(bounds.x);
        let max_y = bounds.bottom().saturating_sub(self.height).max(bounds.y);
        Rect::new(
            self.x.clamp(bounds.x, max_x),
            self.y.clamp(bounds.y, max_y),
            self.width,
            self.height,
        )
    }

    /// Shrink to fit `bounds`, then clamp the origin.
    ///
    /// The result is always contained in `bounds`. Empty bounds yield a
    /// zero-size rectangle at the bounds' origin edge.
    #[must_use]
    pub fn clamp_into(&self, bounds: &Rect) -> Rect {
        let width = self.width.clamp(0, bounds.width.max(0));
        let height = self.height.clamp(0, bounds.height.max(0));
        Rect::new(self.x, self.y, width, height).clamp_position_into(bounds)
    }
}

/// Padding or inset applied to each side of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Sides {
    /// Same value on every side.
    #[must_use]
    pub const fn all(value: i32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Only a top inset, the shape of a title band or tab strip.
    #[must_use]
    pub const fn top(value: i32) -> Self {
        Self {
            top: value,
            right: 0,
            bottom: 0,
            left: 0,
        }
    }

    #[must_use]
    pub const fn horizontal_sum(&self) -> i32 {
        self.left + self.right
    }

    #[must_use]
    pub const fn vertical_sum(&self) -> i32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn edges_are_half_open() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert!(r.contains(Point::new(10, 20)));
        assert!(r.contains(Point::new(39, 59)));
        assert!(!r.contains(Point::new(40, 59)));
        assert!(!r.contains(Point::new(39, 60)));
    }

    #[test]
    fn normalized_orders_corners() {
        let r = Rect::normalized(Point::new(50, 10), Point::new(20, 40));
        assert_eq!(r, Rect::new(20, 10, 30, 30));
    }

    #[test]
    fn from_edges_never_negative() {
        let r = Rect::from_edges(10, 10, 5, 0);
        assert_eq!(r.width, 0);
        assert_eq!(r.height, 0);
    }

    #[test]
    fn inner_removes_band() {
        let r = Rect::new(0, 0, 200, 150).inner(Sides::top(15));
        assert_eq!(r, Rect::new(0, 15, 200, 135));
        let tiny = Rect::new(0, 0, 10, 10).inner(Sides::top(15));
        assert_eq!(tiny.height, 0);
    }

    #[test]
    fn intersection_and_union() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Rect::new(5, 5, 5, 5));
        assert_eq!(a.union(&b), Rect::new(0, 0, 15, 15));
        assert!(a.intersection_opt(&Rect::new(20, 20, 1, 1)).is_none());
    }

    #[test]
    fn clamp_position_keeps_size() {
        let bounds = Rect::new(0, 0, 100, 100);
        let r = Rect::new(90, -5, 20, 20).clamp_position_into(&bounds);
        assert_eq!(r, Rect::new(80, 0, 20, 20));
    }

    #[test]
    fn clamp_into_shrinks_oversized() {
        let bounds = Rect::new(10, 10, 50, 50);
        let r = Rect::new(0, 0, 80, 20).clamp_into(&bounds);
        assert_eq!(r, Rect::new(10, 10, 50, 20));
    }

    #[test]
    fn clamp_into_empty_bounds() {
        let bounds = Rect::new(10, 10, 40, 0);
        let r = Rect::new(0, 0, 20, 20).clamp_into(&bounds);
        assert_eq!(r.height, 0);
        assert!(bounds.contains_rect(&r));
    }

    proptest! {
        #[test]
        fn clamp_into_is_always_contained(
            x in -500i32..500, y in -500i32..500,
            w in 0i32..400, h in 0i32..400,
            bx in -100i32..100, by in -100i32..100,
            bw in 0i32..300, bh in 0i32..300,
        ) {
            let bounds = Rect::new(bx, by, bw, bh);
            let clamped = Rect::new(x, y, w, h).clamp_into(&bounds);
            prop_assert!(bounds.contains_rect(&clamped));
        }

        #[test]
        fn clamp_into_is_idempotent(
            x in -500i32..500, y in -500i32..500,
            w in 0i32..400, h in 0i32..400,
        ) {
            let bounds = Rect::new(0, 0, 250, 180);
            let once = Rect::new(x, y, w, h).clamp_into(&bounds);
            prop_assert_eq!(once.clamp_into(&bounds), once);
        }
    }
}
