//! Geometry primitives for menu placement and hit testing
//!
//! All coordinates are document-space CSS pixels. Menus that are portaled
//! out of their opener's subtree are compared against each other through
//! these rectangles rather than through any live layout query.

/// Tolerance used when comparing measured rectangles.
///
/// Layout engines report fractional sizes that jitter below this threshold
/// between two measurements of the same box.
pub const RECT_EPSILON: f32 = 0.01;

// ─────────────────────────────────────────────────────────────────────────────
// Core Geometry Types
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Whether `point` lies inside the rectangle, edges included
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }

    /// Inset the rect by a delta (shrink from all sides)
    pub fn inset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: Size::new(
                (self.size.width - 2.0 * dx).max(0.0),
                (self.size.height - 2.0 * dy).max(0.0),
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Free Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f32::clamp`] this never panics: when `max < min` the lower bound
/// wins, so `min <= result` always holds.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Whether `rect` contains `point`, treating a missing rect as empty
pub fn rect_contains(rect: Option<&Rect>, point: Point) -> bool {
    rect.is_some_and(|r| r.contains(point))
}

/// Compare two rectangles with [`RECT_EPSILON`] tolerance
pub fn rects_equal(a: &Rect, b: &Rect) -> bool {
    (a.origin.x - b.origin.x).abs() <= RECT_EPSILON
        && (a.origin.y - b.origin.y).abs() <= RECT_EPSILON
        && (a.size.width - b.size.width).abs() <= RECT_EPSILON
        && (a.size.height - b.size.height).abs() <= RECT_EPSILON
}
