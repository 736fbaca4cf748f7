use std::path::Path;

use ndarray::{s, Array3, ArrayView3};
use thiserror::Error;
use tiff::decoder::DecodingResult;
use tiff::ColorType;

use crate::error::{OvrMergeError, Result};
use crate::placement::PixelOffset;

/// A source region that does not fit inside the destination canvas.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error(
    "{width}x{height} block at ({x}, {y}) does not fit in {canvas_width}x{canvas_height} canvas"
)]
pub struct OutOfBounds {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub canvas_width: usize,
    pub canvas_height: usize,
}

/// Copy `src` into `dst` with its top-left corner at column `x`, row `y`, one band at a time.
///
/// Both arrays are (rows, columns, bands). Regions that fall outside `dst` are rejected whole.
pub fn blit<T: Clone>(
    dst: &mut Array3<T>,
    src: ArrayView3<'_, T>,
    x: usize,
    y: usize,
) -> std::result::Result<(), OutOfBounds> {
    let (height, width, bands) = src.dim();
    let (canvas_height, canvas_width, canvas_bands) = dst.dim();
    let fits = x
        .checked_add(width)
        .is_some_and(|right| right <= canvas_width)
        && y.checked_add(height)
            .is_some_and(|bottom| bottom <= canvas_height)
        && bands <= canvas_bands;
    if !fits {
        return Err(OutOfBounds {
            x,
            y,
            width,
            height,
            canvas_width,
            canvas_height,
        });
    }

    for band in 0..bands {
        dst.slice_mut(s![y..y + height, x..x + width, band])
            .assign(&src.slice(s![.., .., band]));
    }
    Ok(())
}

/// `SampleFormat` tag values.
pub(crate) const SAMPLE_FORMAT_UINT: u16 = 1;
pub(crate) const SAMPLE_FORMAT_INT: u16 = 2;
pub(crate) const SAMPLE_FORMAT_FLOAT: u16 = 3;

/// Numeric type of one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    U16,
    U32,
    I16,
    I32,
    F32,
    F64,
}

impl SampleType {
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Colour interpretation of the bands, written back as the output `PhotometricInterpretation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Photometric {
    Gray,
    Rgb,
    Rgba,
    Cmyk,
}

impl Photometric {
    pub fn bands(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Rgba | Self::Cmyk => 4,
        }
    }
}

/// Pixel layout of an overview page that can be merged and written back unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub sample: SampleType,
    pub photometric: Photometric,
}

impl PixelFormat {
    pub fn new(sample: SampleType, photometric: Photometric) -> Self {
        Self {
            sample,
            photometric,
        }
    }

    /// Classify a decoded page of `path` from its colour type and `SampleFormat` tag.
    ///
    /// Layouts the output encoder cannot write back, such as grey + alpha or palette pages, are
    /// rejected while scanning.
    pub fn from_tiff(color_type: ColorType, sample_format: u16, path: &Path) -> Result<Self> {
        let unsupported = || OvrMergeError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            format: format!("{color_type:?} with sample format {sample_format}"),
        };
        let (photometric, bits) = match color_type {
            ColorType::Gray(bits) => (Photometric::Gray, bits),
            // JPEG-compressed YCbCr pages come out of the decoder as RGB
            ColorType::RGB(bits) | ColorType::YCbCr(bits) => (Photometric::Rgb, bits),
            ColorType::RGBA(bits) => (Photometric::Rgba, bits),
            ColorType::CMYK(bits) => (Photometric::Cmyk, bits),
            _ => return Err(unsupported()),
        };
        let sample = match (sample_format, bits) {
            (SAMPLE_FORMAT_UINT, 8) => SampleType::U8,
            (SAMPLE_FORMAT_UINT, 16) => SampleType::U16,
            (SAMPLE_FORMAT_UINT, 32) => SampleType::U32,
            (SAMPLE_FORMAT_INT, 16) => SampleType::I16,
            (SAMPLE_FORMAT_INT, 32) => SampleType::I32,
            (SAMPLE_FORMAT_FLOAT, 32) => SampleType::F32,
            (SAMPLE_FORMAT_FLOAT, 64) => SampleType::F64,
            _ => return Err(unsupported()),
        };
        let format = Self::new(sample, photometric);
        if format.is_writable() {
            Ok(format)
        } else {
            Err(unsupported())
        }
    }

    /// Whether the output encoder has a colour type for this layout.
    pub fn is_writable(&self) -> bool {
        use SampleType::*;
        match self.photometric {
            Photometric::Gray => true,
            Photometric::Rgb | Photometric::Rgba => matches!(self.sample, U8 | U16 | U32 | F32 | F64),
            Photometric::Cmyk => matches!(self.sample, U8 | U16),
        }
    }

    pub fn bands(&self) -> usize {
        self.photometric.bands()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bands() * self.sample.bytes()
    }
}

/// Decoded pixels of one overview page or one merged canvas, (rows, columns, bands).
#[derive(Clone, Debug, PartialEq)]
pub enum PixelBuffer {
    U8(Array3<u8>),
    U16(Array3<u16>),
    U32(Array3<u32>),
    I16(Array3<i16>),
    I32(Array3<i32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

impl PixelBuffer {
    /// Wrap chunky (interleaved) decoder output of a `width` x `height` page of `path`.
    pub fn from_decoded(
        result: DecodingResult,
        width: u32,
        height: u32,
        format: PixelFormat,
        path: &Path,
    ) -> Result<Self> {
        let shape = (height as usize, width as usize, format.bands());
        let buffer = match result {
            DecodingResult::U8(data) => Array3::from_shape_vec(shape, data).map(Self::U8),
            DecodingResult::U16(data) => Array3::from_shape_vec(shape, data).map(Self::U16),
            DecodingResult::U32(data) => Array3::from_shape_vec(shape, data).map(Self::U32),
            DecodingResult::I16(data) => Array3::from_shape_vec(shape, data).map(Self::I16),
            DecodingResult::I32(data) => Array3::from_shape_vec(shape, data).map(Self::I32),
            DecodingResult::F32(data) => Array3::from_shape_vec(shape, data).map(Self::F32),
            DecodingResult::F64(data) => Array3::from_shape_vec(shape, data).map(Self::F64),
            _ => {
                return Err(OvrMergeError::UnsupportedPixelFormat {
                    path: path.to_path_buf(),
                    format: format!("{format:?}"),
                })
            }
        }
        .map_err(OvrMergeError::shape(path))?;

        if buffer.sample_type() != format.sample {
            return Err(OvrMergeError::UnsupportedPixelFormat {
                path: path.to_path_buf(),
                format: format!(
                    "decoded {:?} samples for a {format:?} page",
                    buffer.sample_type()
                ),
            });
        }
        Ok(buffer)
    }

    /// A zero-filled buffer with the sample type and band count of `self`.
    pub fn zeros_like(&self, width: u32, height: u32) -> Self {
        let shape = (height as usize, width as usize, self.bands());
        match self {
            Self::U8(_) => Self::U8(Array3::zeros(shape)),
            Self::U16(_) => Self::U16(Array3::zeros(shape)),
            Self::U32(_) => Self::U32(Array3::zeros(shape)),
            Self::I16(_) => Self::I16(Array3::zeros(shape)),
            Self::I32(_) => Self::I32(Array3::zeros(shape)),
            Self::F32(_) => Self::F32(Array3::zeros(shape)),
            Self::F64(_) => Self::F64(Array3::zeros(shape)),
        }
    }

    fn dim(&self) -> (usize, usize, usize) {
        match self {
            Self::U8(a) => a.dim(),
            Self::U16(a) => a.dim(),
            Self::U32(a) => a.dim(),
            Self::I16(a) => a.dim(),
            Self::I32(a) => a.dim(),
            Self::F32(a) => a.dim(),
            Self::F64(a) => a.dim(),
        }
    }

    pub fn width(&self) -> usize {
        self.dim().1
    }

    pub fn height(&self) -> usize {
        self.dim().0
    }

    pub fn bands(&self) -> usize {
        self.dim().2
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            Self::U8(_) => SampleType::U8,
            Self::U16(_) => SampleType::U16,
            Self::U32(_) => SampleType::U32,
            Self::I16(_) => SampleType::I16,
            Self::I32(_) => SampleType::I32,
            Self::F32(_) => SampleType::F32,
            Self::F64(_) => SampleType::F64,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.sample_type().bytes()
    }

    /// Place the pixels of tile `path` at `offset`. Sample type and band count must match.
    pub fn paste(&mut self, src: &PixelBuffer, offset: PixelOffset, path: &Path) -> Result<()> {
        if self.bands() != src.bands() {
            return Err(OvrMergeError::Inconsistent(format!(
                "{}: {} band tile cannot be placed in a {} band canvas",
                path.display(),
                src.bands(),
                self.bands()
            )));
        }
        let (x, y) = (offset.x as usize, offset.y as usize);
        let (src_type, dst_type) = (src.sample_type(), self.sample_type());
        let placed = match (&mut *self, src) {
            (Self::U8(dst), Self::U8(src)) => blit(dst, src.view(), x, y),
            (Self::U16(dst), Self::U16(src)) => blit(dst, src.view(), x, y),
            (Self::U32(dst), Self::U32(src)) => blit(dst, src.view(), x, y),
            (Self::I16(dst), Self::I16(src)) => blit(dst, src.view(), x, y),
            (Self::I32(dst), Self::I32(src)) => blit(dst, src.view(), x, y),
            (Self::F32(dst), Self::F32(src)) => blit(dst, src.view(), x, y),
            (Self::F64(dst), Self::F64(src)) => blit(dst, src.view(), x, y),
            _ => {
                return Err(OvrMergeError::Inconsistent(format!(
                    "{}: {src_type:?} tile cannot be placed in a {dst_type:?} canvas",
                    path.display(),
                )))
            }
        };
        placed.map_err(|source| OvrMergeError::PlacementOutOfBounds {
            path: path.to_path_buf(),
            source,
        })
    }
}
