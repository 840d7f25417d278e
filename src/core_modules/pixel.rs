// THEORY:
// The `pixel` module is the most fundamental unit of the comparison engine. It
// defines the "dumb" RGBA `Pixel` container and the `PixelBuffer` seam through
// which the engine reads images.
//
// Key architectural principles:
// 1.  **Read-Only Boundary**: The engine never decodes files or owns the caller's
//     images. Anything that can answer "how big are you" and "what is the pixel at
//     (x, y)" can be compared. Decoded `image` buffers plug in at the imaging
//     boundary; raw RGBA bytes plug in through `RgbaFrame`.
// 2.  **Coordinates**: `x` runs along the width, `y` along the height, both from
//     the top-left corner.
// 3.  **Fail Early on Raw Bytes**: Byte buffers of the wrong length are rejected at
//     construction time so the comparison itself never has to check them.

pub mod pixel {
    use crate::error::DiffError;

    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;

    pub const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// An opaque pixel.
        pub fn rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel::new(red, green, blue, Channel::MAX)
        }
    }

    impl TryFrom<&[Byte]> for Pixel {
        type Error = DiffError;

        fn try_from(bytes: &[Byte]) -> Result<Self, Self::Error> {
            match bytes {
                [red, green, blue, alpha] => Ok(Pixel::new(*red, *green, *blue, *alpha)),
                _ => Err(DiffError::InvalidPixelBytes(bytes.len())),
            }
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            vec![pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }

    /// A rectangular grid of pixels the engine can read.
    ///
    /// `pixel` is only ever called with `x < width()` and `y < height()`.
    pub trait PixelBuffer {
        fn width(&self) -> u32;
        fn height(&self) -> u32;
        fn pixel(&self, x: u32, y: u32) -> Pixel;

        /// `(width, height)`.
        fn dimensions(&self) -> (u32, u32) {
            (self.width(), self.height())
        }
    }

    impl<T: PixelBuffer + ?Sized> PixelBuffer for &T {
        fn width(&self) -> u32 {
            (**self).width()
        }

        fn height(&self) -> u32 {
            (**self).height()
        }

        fn pixel(&self, x: u32, y: u32) -> Pixel {
            (**self).pixel(x, y)
        }
    }

    /// An owned image held as tightly packed RGBA8 bytes, row by row.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RgbaFrame {
        width: u32,
        height: u32,
        data: Bytes,
    }

    impl RgbaFrame {
        /// Wraps a raw RGBA buffer. Fails unless it holds exactly
        /// `width * height * 4` bytes.
        pub fn new(width: u32, height: u32, data: Bytes) -> Result<Self, DiffError> {
            let expected = width as usize * height as usize * CHANNELS;
            if data.len() != expected {
                return Err(DiffError::InvalidBufferLength {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        /// A frame where every pixel is `fill`.
        pub fn filled(width: u32, height: u32, fill: Pixel) -> Self {
            let count = width as usize * height as usize;
            let mut data = Vec::with_capacity(count * CHANNELS);
            for _ in 0..count {
                data.extend_from_slice(&[fill.red, fill.green, fill.blue, fill.alpha]);
            }
            Self {
                width,
                height,
                data,
            }
        }

        /// Overwrites one pixel. Out-of-range coordinates are ignored.
        pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
            if x >= self.width || y >= self.height {
                return;
            }
            let start = self.byte_index(x, y);
            self.data[start..start + CHANNELS]
                .copy_from_slice(&[pixel.red, pixel.green, pixel.blue, pixel.alpha]);
        }

        pub fn as_bytes(&self) -> &[Byte] {
            &self.data
        }

        #[inline]
        fn byte_index(&self, x: u32, y: u32) -> usize {
            (y as usize * self.width as usize + x as usize) * CHANNELS
        }
    }

    impl PixelBuffer for RgbaFrame {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn pixel(&self, x: u32, y: u32) -> Pixel {
            let start = self.byte_index(x, y);
            let px = &self.data[start..start + CHANNELS];
            Pixel::new(px[0], px[1], px[2], px[3])
        }
    }
}
