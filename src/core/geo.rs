use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 2D vector in pixel space (positions, deltas, sizes and velocities)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same value on both axes
    pub fn splat(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    /// Elementwise product
    pub fn multiply_by(&self, other: &Point) -> Point {
        Point::new(self.x * other.x, self.y * other.y)
    }

    pub fn divide(&self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }

    /// Elementwise quotient
    pub fn divide_by(&self, other: &Point) -> Point {
        Point::new(self.x / other.x, self.y / other.y)
    }

    /// Negates both components
    pub fn invert(&self) -> Point {
        Point::new(-self.x, -self.y)
    }

    /// Euclidean length
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        self.subtract(other).magnitude()
    }

    /// Applies `f` to each component
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Point {
        Point::new(f(self.x), f(self.y))
    }

    pub fn floor(&self) -> Point {
        self.map(f64::floor)
    }

    pub fn ceil(&self) -> Point {
        self.map(f64::ceil)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        self.add(other).divide(2.0)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::add(&self, &rhs)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        self.subtract(&rhs)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        self.multiply(rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        self.divide(rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        self.invert()
    }
}

/// Integer (column, row) address of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub col: i64,
    pub row: i64,
}

impl GridCoord {
    pub fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }

    /// Top-left pixel of this cell for a grid anchored at `origin`
    pub fn to_pixel(&self, origin: Point, tile_size: f64) -> Point {
        Point::new(
            origin.x + self.col as f64 * tile_size,
            origin.y + self.row as f64 * tile_size,
        )
    }

    /// Cell containing `pixel` for a grid anchored at `origin`
    pub fn from_pixel(pixel: Point, origin: Point, tile_size: f64) -> Self {
        let grid = pixel.subtract(&origin).divide(tile_size).floor();
        Self::new(grid.x as i64, grid.y as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, 2.0);

        assert_eq!(Point::add(&a, &b), Point::new(4.0, 6.0));
        assert_eq!(a.subtract(&b), Point::new(2.0, 2.0));
        assert_eq!(a.multiply(2.0), Point::new(6.0, 8.0));
        assert_eq!(a.divide(2.0), Point::new(1.5, 2.0));
        assert_eq!(a.multiply_by(&b), Point::new(3.0, 8.0));
        assert_eq!(a.divide_by(&b), Point::new(3.0, 2.0));
        assert_eq!(a.invert(), Point::new(-3.0, -4.0));
        assert_eq!(a.magnitude(), 5.0);
        assert_eq!(a + b, Point::new(4.0, 6.0));
        assert_eq!(-a, a.invert());
    }

    #[test]
    fn test_point_map() {
        let p = Point::new(1.4, -1.4);
        assert_eq!(p.map(f64::round), Point::new(1.0, -1.0));
        assert_eq!(p.floor(), Point::new(1.0, -2.0));
        assert_eq!(p.ceil(), Point::new(2.0, -1.0));
    }

    #[test]
    fn test_grid_coord_pixel_mapping() {
        let origin = Point::new(-30.0, 10.0);
        let coord = GridCoord::new(-2, 3);
        let pixel = coord.to_pixel(origin, 100.0);
        assert_eq!(pixel, Point::new(-230.0, 310.0));

        let inside = Point::add(&pixel, &Point::new(50.0, 99.0));
        assert_eq!(GridCoord::from_pixel(inside, origin, 100.0), coord);
    }
}
