use super::Point;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Bounding rectangle expressed by its four edges, the way accessibility APIs
/// report element geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub const fn left(&self) -> i32 {
        self.left
    }

    pub const fn top(&self) -> i32 {
        self.top
    }

    pub const fn right(&self) -> i32 {
        self.right
    }

    pub const fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Width clamped at zero for inverted rectangles.
    pub const fn width(&self) -> i32 {
        let width = self.right.saturating_sub(self.left);
        if width < 0 { 0 } else { width }
    }

    pub const fn height(&self) -> i32 {
        let height = self.bottom.saturating_sub(self.top);
        if height < 0 { 0 } else { height }
    }

    pub const fn center(&self) -> Point {
        Point::new(
            self.left.saturating_add(self.width() / 2),
            self.top.saturating_add(self.height() / 2),
        )
    }

    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.left, self.top, self.right, self.bottom)
    }
}
