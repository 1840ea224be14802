//! Screenshot support.
//!
//! The core never reads back GPU memory itself. A view that should support
//! screenshots gets a [`CaptureSurface`] from the device backend; the engine
//! calls it after the view rendered.

use crate::errors::Result;
use crate::render::context::FrameRecord;
use crate::scene::view::ViewInformation;

/// RGBA8 pixels of one captured frame, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Screenshot {
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self { width, height, pixels }
    }

    /// Uniformly filled image.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width * height) as usize);
        Self { width, height, pixels }
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

pub trait CaptureSurface: Send + Sync {
    /// Reads back the view's render target. `last_frame` is the most recent
    /// record of the view, if it rendered at least once.
    fn capture(&self, view: &ViewInformation, last_frame: Option<&FrameRecord>) -> Result<Screenshot>;
}
