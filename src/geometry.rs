use image::{GrayImage, Luma, Rgba, RgbaImage};
use log::{debug, trace};

/// Mask value of pixels inside the compartment.
pub const MASK_FOREGROUND: Luma<u8> = Luma([255]);
/// Mask value of pixels outside the compartment.
pub const MASK_BACKGROUND: Luma<u8> = Luma([0]);

/// Integer pixel coordinate within the source image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

impl Pixel {
    #[inline(always)]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// The set of pixels that make up one compartment of a geometry image.
///
/// Pixels are stored in column-major scan order (x outer, y inner), and a
/// pixel's position in [`Geometry::pixels`] is its index everywhere downstream.
#[derive(Debug, Clone)]
pub struct Geometry {
    pixels: Vec<Pixel>,
    width: u32,
    height: u32,
}

impl Geometry {
    /// Collects every pixel of `image` whose colour equals `colour`.
    pub fn from_image(image: &RgbaImage, colour: Rgba<u8>) -> Self {
        let (width, height) = image.dimensions();
        let mut pixels = Vec::new();
        for x in 0..width {
            for y in 0..height {
                if *image.get_pixel(x, y) == colour {
                    trace!("compartment pixel ({}, {})", x, y);
                    pixels.push(Pixel::new(x, y));
                }
            }
        }
        debug!(
            "Geometry: {} of {}x{} pixels match colour {:?}",
            pixels.len(),
            width,
            height,
            colour.0
        );
        Self { pixels, width, height }
    }

    /// Compartment pixels, in index order.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Width and height of the source image.
    pub fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Binary mask of the source image's size: [`MASK_FOREGROUND`] on
    /// compartment pixels, [`MASK_BACKGROUND`] everywhere else.
    pub fn compartment_image(&self) -> GrayImage {
        let mut mask = GrayImage::from_pixel(self.width, self.height, MASK_BACKGROUND);
        for p in &self.pixels {
            mask.put_pixel(p.x, p.y, MASK_FOREGROUND);
        }
        mask
    }
}
