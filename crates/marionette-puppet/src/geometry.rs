//! Screen-space geometry shared by the puppet and the stage

use serde::{Deserialize, Serialize};

/// A point in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Point at fractional position inside the rectangle
    pub fn point_at(&self, fx: f32, fy: f32) -> Point {
        Point::new(self.x + self.width * fx, self.y + self.height * fy)
    }
}

/// Placement of the puppet on the stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f32,
    pub position: Point,
    /// Fractional anchor inside the puppet's bounds
    pub anchor: Point,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: Point::default(),
            anchor: Point::default(),
        }
    }
}

impl Transform {
    /// Screen-space bounds of content with `logical` size under this transform
    pub fn bounds_of(&self, logical: Size) -> Rect {
        let w = logical.width * self.scale;
        let h = logical.height * self.scale;
        Rect::new(
            self.position.x - self.anchor.x * w,
            self.position.y - self.anchor.y * h,
            w,
            h,
        )
    }
}

/// Rendering surface size and resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Logical size of the container
    pub size: Size,
    /// Backing-store pixels per logical pixel
    pub resolution: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, resolution: f32) -> Self {
        Self {
            size: Size::new(width, height),
            resolution,
        }
    }

    /// Backing-store size in whole device pixels
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.size.width * self.resolution).floor().max(0.0) as u32,
            (self.size.height * self.resolution).floor().max(0.0) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_bottom_center_anchor() {
        let t = Transform {
            scale: 0.5,
            position: Point::new(400.0, 600.0),
            anchor: Point::new(0.5, 1.0),
        };
        let b = t.bounds_of(Size::new(800.0, 1000.0));
        assert_eq!(b, Rect::new(200.0, 100.0, 400.0, 500.0));
        assert_eq!(b.point_at(0.5, 0.2), Point::new(400.0, 200.0));
    }

    #[test]
    fn test_backing_size() {
        let v = Viewport::new(801.5, 600.0, 2.0);
        assert_eq!(v.backing_size(), (1603, 1200));
    }
}
