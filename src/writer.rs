use std::borrow::Cow;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::Array3;
use tempfile::NamedTempFile;
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32, Gray32Float, Gray64Float, Gray8, GrayI16, GrayI32, RGB16, RGB32,
    RGB32Float, RGB64Float, RGB8, RGBA16, RGBA32, RGBA32Float, RGBA64Float, RGBA8, CMYK16, CMYK8,
};
use tiff::encoder::{
    Compression as TiffCompression, TiffEncoder, TiffKind, TiffKindBig, TiffKindStandard,
    TiffValue,
};
use tiff::TiffResult;

use crate::buffer::{Photometric, PixelBuffer};
use crate::compositor::MergedCanvas;
use crate::config::{BigTiffMode, OutputLayout};
use crate::error::{OvrMergeError, Result};

/// Above this many uncompressed bytes a classic TIFF risks overflowing its 32-bit offsets.
pub const BIGTIFF_THRESHOLD: u64 = 4_000_000_000;

/// Rows per strip in written pages.
const ROWS_PER_STRIP: u32 = 64;

/// Path of level `level` in the per-level layout: the index goes before the last extension,
/// `out.tif.ovr` becomes `out.tif.0.ovr`.
pub fn level_path(output: &Path, level: usize) -> PathBuf {
    match (output.file_stem(), output.extension()) {
        (Some(stem), Some(ext)) => {
            let mut name = stem.to_os_string();
            name.push(format!(".{level}."));
            name.push(ext);
            output.with_file_name(name)
        }
        _ => {
            let mut name = output.as_os_str().to_os_string();
            name.push(format!(".{level}"));
            PathBuf::from(name)
        }
    }
}

enum PageEncoder {
    Standard(TiffEncoder<File, TiffKindStandard>),
    Big(TiffEncoder<File, TiffKindBig>),
}

impl PageEncoder {
    fn create(file: File, bigtiff: bool, compression: TiffCompression) -> TiffResult<Self> {
        Ok(if bigtiff {
            Self::Big(TiffEncoder::new_big(file)?.with_compression(compression))
        } else {
            Self::Standard(TiffEncoder::new(file)?.with_compression(compression))
        })
    }

    fn write(&mut self, canvas: &MergedCanvas, path: &Path) -> Result<()> {
        match self {
            Self::Standard(encoder) => write_page(encoder, canvas, path),
            Self::Big(encoder) => write_page(encoder, canvas, path),
        }
    }
}

fn write_page<W: Write + Seek, K: TiffKind>(
    encoder: &mut TiffEncoder<W, K>,
    canvas: &MergedCanvas,
    path: &Path,
) -> Result<()> {
    use Photometric::{Cmyk, Gray, Rgb, Rgba};
    use PixelBuffer::{F32, F64, I16, I32, U16, U32, U8};

    let pixels = &canvas.pixels;
    let (width, height) = (pixels.width() as u32, pixels.height() as u32);
    let e = encoder;
    let written = match (canvas.format.photometric, pixels) {
        (Gray, U8(data)) => write_typed::<_, _, Gray8>(e, width, height, data),
        (Gray, U16(data)) => write_typed::<_, _, Gray16>(e, width, height, data),
        (Gray, U32(data)) => write_typed::<_, _, Gray32>(e, width, height, data),
        (Gray, I16(data)) => write_typed::<_, _, GrayI16>(e, width, height, data),
        (Gray, I32(data)) => write_typed::<_, _, GrayI32>(e, width, height, data),
        (Gray, F32(data)) => write_typed::<_, _, Gray32Float>(e, width, height, data),
        (Gray, F64(data)) => write_typed::<_, _, Gray64Float>(e, width, height, data),
        (Rgb, U8(data)) => write_typed::<_, _, RGB8>(e, width, height, data),
        (Rgb, U16(data)) => write_typed::<_, _, RGB16>(e, width, height, data),
        (Rgb, U32(data)) => write_typed::<_, _, RGB32>(e, width, height, data),
        (Rgb, F32(data)) => write_typed::<_, _, RGB32Float>(e, width, height, data),
        (Rgb, F64(data)) => write_typed::<_, _, RGB64Float>(e, width, height, data),
        (Rgba, U8(data)) => write_typed::<_, _, RGBA8>(e, width, height, data),
        (Rgba, U16(data)) => write_typed::<_, _, RGBA16>(e, width, height, data),
        (Rgba, U32(data)) => write_typed::<_, _, RGBA32>(e, width, height, data),
        (Rgba, F32(data)) => write_typed::<_, _, RGBA32Float>(e, width, height, data),
        (Rgba, F64(data)) => write_typed::<_, _, RGBA64Float>(e, width, height, data),
        (Cmyk, U8(data)) => write_typed::<_, _, CMYK8>(e, width, height, data),
        (Cmyk, U16(data)) => write_typed::<_, _, CMYK16>(e, width, height, data),
        _ => {
            return Err(OvrMergeError::UnsupportedPixelFormat {
                path: path.to_path_buf(),
                format: format!("cannot write {:?}", canvas.format),
            })
        }
    };
    written.map_err(OvrMergeError::tiff(path))?;
    debug!(
        "{}: wrote {width}x{height} {:?} page, {} bytes uncompressed",
        path.display(),
        canvas.format,
        width as usize * height as usize * pixels.bands() * pixels.bytes_per_sample()
    );
    Ok(())
}

fn write_typed<W: Write + Seek, K: TiffKind, C: ColorType>(
    encoder: &mut TiffEncoder<W, K>,
    width: u32,
    height: u32,
    data: &Array3<C::Inner>,
) -> TiffResult<()>
where
    C::Inner: Clone,
    [C::Inner]: TiffValue,
{
    let samples = match data.as_slice() {
        Some(samples) => Cow::Borrowed(samples),
        None => Cow::Owned(data.iter().cloned().collect::<Vec<_>>()),
    };
    let mut image = encoder.new_image::<C>(width, height)?;
    image.rows_per_strip(ROWS_PER_STRIP.min(height.max(1)))?;
    image.write_data(&samples)
}

/// Writes merged levels to temporary files next to the output and moves them into place in
/// [`OverviewWriter::finish`]. Dropping an unfinished writer deletes the temporary files.
pub struct OverviewWriter {
    output: PathBuf,
    layout: OutputLayout,
    compression: TiffCompression,
    bigtiff: bool,
    multi_page: Option<(NamedTempFile, PageEncoder)>,
    /// Finished files waiting to be renamed, with their final paths
    pending: Vec<(NamedTempFile, PathBuf)>,
    levels_written: usize,
}

impl OverviewWriter {
    pub fn create(
        output: &Path,
        layout: OutputLayout,
        compression: TiffCompression,
        bigtiff: bool,
    ) -> Result<Self> {
        let mut writer = Self {
            output: output.to_path_buf(),
            layout,
            compression,
            bigtiff,
            multi_page: None,
            pending: vec![],
            levels_written: 0,
        };
        if layout == OutputLayout::MultiPage {
            writer.multi_page = Some(writer.open_temp()?);
        }
        Ok(writer)
    }

    fn open_temp(&self) -> Result<(NamedTempFile, PageEncoder)> {
        let dir = match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".ovr-merge-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(OvrMergeError::io(&self.output))?;
        let file = temp.reopen().map_err(OvrMergeError::io(temp.path()))?;
        let encoder = PageEncoder::create(file, self.bigtiff, self.compression.clone())
            .map_err(OvrMergeError::tiff(temp.path()))?;
        Ok((temp, encoder))
    }

    /// Append the next pyramid level.
    pub fn write_level(&mut self, canvas: &MergedCanvas) -> Result<()> {
        match self.layout {
            OutputLayout::MultiPage => {
                let output = &self.output;
                let (temp, encoder) = self.multi_page.as_mut().ok_or_else(|| {
                    OvrMergeError::io(output)(std::io::Error::other("writer already finished"))
                })?;
                encoder.write(canvas, temp.path())?;
            }
            OutputLayout::PerLevel => {
                let (temp, mut encoder) = self.open_temp()?;
                encoder.write(canvas, temp.path())?;
                drop(encoder);
                self.pending
                    .push((temp, level_path(&self.output, self.levels_written)));
            }
        }
        self.levels_written += 1;
        Ok(())
    }

    /// Flush every temporary file and rename it to its final path. Returns the final paths.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        if let Some((temp, encoder)) = self.multi_page.take() {
            drop(encoder);
            self.pending.push((temp, self.output.clone()));
        }

        for (temp, _) in &self.pending {
            temp.as_file()
                .sync_all()
                .map_err(OvrMergeError::io(temp.path()))?;
        }

        let mut written = Vec::with_capacity(self.pending.len());
        for (temp, path) in self.pending.drain(..) {
            if let Err(source) = temp.persist(&path) {
                return Err(OvrMergeError::Persist { path, source });
            }
            info!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Whether the configured mode asks for BigTIFF given the uncompressed size of all levels.
pub fn needs_bigtiff(mode: BigTiffMode, uncompressed_bytes: u64) -> bool {
    match mode {
        BigTiffMode::Always => true,
        BigTiffMode::Never => false,
        BigTiffMode::IfNeeded => uncompressed_bytes > BIGTIFF_THRESHOLD,
    }
}
