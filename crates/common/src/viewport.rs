/// Upper bound on the pixel ratio used for the output surface.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Window-sized viewport state.
///
/// Width and height are logical (CSS-like) pixels. The output surface is
/// `logical * pixel_ratio`, with the ratio capped at [`MAX_PIXEL_RATIO`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        let mut viewport = Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
        };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    /// Build from a physical window size and the window's scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = scale_factor.max(f64::EPSILON);
        Self::new(
            (width as f64 / scale).round() as u32,
            (height as f64 / scale).round() as u32,
            scale as f32,
        )
    }

    /// Apply a resize event.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.pixel_ratio = device_pixel_ratio.clamp(f32::EPSILON, MAX_PIXEL_RATIO);
    }

    /// Camera aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Logical output size, as handed to the renderer.
    pub fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the backing surface in physical pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}
