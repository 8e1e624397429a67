//! Info popup shown next to the cursor while a part is hovered.

use winit::dpi::PhysicalPosition;

/// Pixel offset between the cursor hot spot and the popup's top left corner.
pub const CURSOR_OFFSET: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    /// Top left corner in window pixels.
    pub left: f32,
    pub top: f32,
    pub label: String,
}

impl Popup {
    pub fn at_cursor(pixel: PhysicalPosition<f64>, name: &str) -> Self {
        Self {
            left: (pixel.x + CURSOR_OFFSET) as f32,
            top: (pixel.y + CURSOR_OFFSET) as f32,
            label: format!("Name: {}", name),
        }
    }
}
