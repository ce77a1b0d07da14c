/// An axis-aligned bounding box in image pixel space.
///
/// Corners are inclusive: a window of width `w` starting at column `x`
/// spans `left = x` to `right = x + w - 1`. Field order defines the
/// derived ordering, so rectangles sort lexicographically by
/// `(left, top, right, bottom)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rectangle {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rectangle {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds a rectangle from its top-left corner and size.
    pub fn from_origin_size(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    pub fn width(&self) -> i64 {
        (self.right - self.left + 1).max(0)
    }

    pub fn height(&self) -> i64 {
        (self.bottom - self.top + 1).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn intersect(&self, other: &Rectangle) -> Rectangle {
        Rectangle::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    /// Flattens to `[left, top, right, bottom]`.
    pub fn to_array(&self) -> [i64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}
