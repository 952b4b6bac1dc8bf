//! EXIF orientation codes and the pixel transforms that undo them.
//!
//! | Code | Stored image is… | Correction |
//! |---|---|---|
//! | 1 | upright | none |
//! | 2 | mirrored left/right | flip horizontal |
//! | 3 | upside down | rotate 180° |
//! | 4 | mirrored top/bottom | flip vertical |
//! | 5 | transposed | flip horizontal, rotate 270° |
//! | 6 | rotated 90° counter-clockwise | rotate 90° |
//! | 7 | transversed | flip horizontal, rotate 90° |
//! | 8 | rotated 90° clockwise | rotate 270° |
//!
//! Rotations are clockwise. Codes 5–8 swap width and height. Anything
//! outside 1–8 is treated as 1.

use image::DynamicImage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation tag value. Unknown values are `Normal`.
    pub fn from_exif(code: u32) -> Self {
        match code {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    pub fn exif_code(self) -> u16 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Whether the upright image has width and height exchanged.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Dimensions of the upright image given the stored ones.
    pub fn apply_to_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Return the upright version of a decoded image.
    #[must_use]
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.fliph().rotate270(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.fliph().rotate90(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}
