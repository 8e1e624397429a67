//! Cursor position tracking in pixels and normalized device coordinates.

use winit::dpi::PhysicalPosition;

/// Bounding rectangle of the render surface in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    /// A surface filling the whole window client area.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }
}

/// Maps a pixel inside `rect` to `[-1, 1]` on both axes, with y pointing up.
///
/// Returns `None` for a rectangle without area.
pub fn to_ndc(pixel: PhysicalPosition<f64>, rect: &SurfaceRect) -> Option<(f32, f32)> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let x = (pixel.x as f32 - rect.left) / rect.width * 2.0 - 1.0;
    let y = -((pixel.y as f32 - rect.top) / rect.height) * 2.0 + 1.0;
    Some((x, y))
}

/// Last known cursor position. Both representations come from the same event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub ndc: (f32, f32),
    pub pixel: PhysicalPosition<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_and_centre() {
        let rect = SurfaceRect::from_size(800, 600);
        assert_eq!(to_ndc(PhysicalPosition::new(400.0, 300.0), &rect), Some((0.0, 0.0)));
        assert_eq!(to_ndc(PhysicalPosition::new(0.0, 0.0), &rect), Some((-1.0, 1.0)));
        assert_eq!(to_ndc(PhysicalPosition::new(800.0, 600.0), &rect), Some((1.0, -1.0)));
    }

    #[test]
    fn offset_rectangles_are_respected() {
        let rect = SurfaceRect {
            left: 100.0,
            top: 50.0,
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(to_ndc(PhysicalPosition::new(200.0, 100.0), &rect), Some((0.0, 0.0)));
        assert_eq!(to_ndc(PhysicalPosition::new(300.0, 50.0), &rect), Some((1.0, 1.0)));
    }

    #[test]
    fn every_pixel_inside_stays_in_range() {
        let rect = SurfaceRect::from_size(37, 23);
        for x in 0..=37 {
            for y in 0..=23 {
                let (nx, ny) = to_ndc(PhysicalPosition::new(x as f64, y as f64), &rect).unwrap();
                assert!((-1.0..=1.0).contains(&nx), "x {} -> {}", x, nx);
                assert!((-1.0..=1.0).contains(&ny), "y {} -> {}", y, ny);
            }
        }
    }

    #[test]
    fn empty_rectangle_gives_nothing() {
        let rect = SurfaceRect::from_size(0, 600);
        assert_eq!(to_ndc(PhysicalPosition::new(10.0, 10.0), &rect), None);
    }
}
