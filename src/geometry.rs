use serde::{Deserialize, Serialize};

/// A point in raw input units (terminal cells, but the math does not care).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
}

impl RawPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point expressed as percentages of a page surface's box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle in percentages of a page surface's box.
/// `(x, y)` is always the top-left corner; `w`/`h` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PercentRect {
    /// Normalize two opposite corners into a rectangle, regardless of the
    /// direction the drag was made in.
    pub fn from_corners(a: PercentPoint, b: PercentPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

/// The layout box currently hosting a page's content. Annotation coordinates
/// are percentages of this box, so they survive any resize of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_rect(rect: ratatui::layout::Rect) -> Self {
        Self {
            left: rect.x as f64,
            top: rect.y as f64,
            width: rect.width as f64,
            height: rect.height as f64,
        }
    }

    pub fn contains(&self, p: RawPoint) -> bool {
        p.x >= self.left
            && p.x < self.left + self.width
            && p.y >= self.top
            && p.y < self.top + self.height
    }

    /// Map a raw point to surface percentages. Points outside the surface are
    /// tolerated; the result simply leaves the [0, 100] range.
    pub fn to_percent(&self, p: RawPoint) -> PercentPoint {
        // A zero-sized surface cannot host content; avoid a division by zero.
        if self.width <= 0.0 || self.height <= 0.0 {
            return PercentPoint { x: 0.0, y: 0.0 };
        }
        PercentPoint {
            x: (p.x - self.left) / self.width * 100.0,
            y: (p.y - self.top) / self.height * 100.0,
        }
    }
}

/// Minimum-drag check, applied to raw deltas *before* percentage conversion.
/// A drag qualifies when at least one dimension reaches the threshold.
pub fn drag_exceeds_threshold(a: RawPoint, b: RawPoint, threshold: f64) -> bool {
    (a.x - b.x).abs() >= threshold || (a.y - b.y).abs() >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_in_bounds_points_to_percent_range() {
        let surface = SurfaceBox::new(10.0, 5.0, 40.0, 20.0);
        for (px, py) in [(10.0, 5.0), (30.0, 15.0), (49.9, 24.9)] {
            let p = surface.to_percent(RawPoint::new(px, py));
            assert!((0.0..=100.0).contains(&p.x), "x out of range: {}", p.x);
            assert!((0.0..=100.0).contains(&p.y), "y out of range: {}", p.y);
        }
    }

    #[test]
    fn percent_mapping_is_linear() {
        let surface = SurfaceBox::new(0.0, 0.0, 1000.0, 700.0);
        let p = surface.to_percent(RawPoint::new(150.0, 350.0));
        assert_eq!(p.x, 15.0);
        assert_eq!(p.y, 50.0);
    }

    #[test]
    fn out_of_surface_points_do_not_panic() {
        let surface = SurfaceBox::new(10.0, 10.0, 100.0, 100.0);
        let p = surface.to_percent(RawPoint::new(0.0, 250.0));
        assert!(p.x < 0.0);
        assert!(p.y > 100.0);
    }

    #[test]
    fn zero_sized_surface_maps_to_origin() {
        let surface = SurfaceBox::new(3.0, 3.0, 0.0, 0.0);
        let p = surface.to_percent(RawPoint::new(50.0, 50.0));
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn rect_normalization_is_direction_independent() {
        let a = PercentPoint { x: 10.0, y: 20.0 };
        let b = PercentPoint { x: 40.0, y: 5.0 };
        let forward = PercentRect::from_corners(a, b);
        let backward = PercentRect::from_corners(b, a);
        assert_eq!(forward, backward);
        assert_eq!(forward.x, 10.0);
        assert_eq!(forward.y, 5.0);
        assert_eq!(forward.w, 30.0);
        assert_eq!(forward.h, 15.0);
    }

    #[test]
    fn degenerate_rect_has_zero_size() {
        let a = PercentPoint { x: 35.0, y: 35.0 };
        let r = PercentRect::from_corners(a, a);
        assert_eq!((r.w, r.h), (0.0, 0.0));
    }

    #[test]
    fn threshold_requires_one_dimension() {
        let a = RawPoint::new(10.0, 10.0);
        assert!(!drag_exceeds_threshold(a, RawPoint::new(12.0, 11.0), 10.0));
        assert!(drag_exceeds_threshold(a, RawPoint::new(150.0, 150.0), 10.0));
        // One long dimension is enough.
        assert!(drag_exceeds_threshold(a, RawPoint::new(40.0, 10.0), 10.0));
    }
}
