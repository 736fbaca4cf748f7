use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use log::debug;
use tiff::decoder::{Decoder, Limits};
use tiff::tags::Tag;
use tiff::TiffResult;

use crate::buffer::{PixelBuffer, PixelFormat, SAMPLE_FORMAT_UINT};
use crate::error::{OvrMergeError, Result};
use crate::header::TiffHeader;

/// `NewSubfileType` bit marking a transparency mask page.
const SUBFILE_MASK: u32 = 0x4;

/// `PlanarConfiguration` of pages storing each band in its own plane.
const PLANAR_SEPARATE: u16 = 2;

/// One reduced resolution page of an overview file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PyramidLevel {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Raw `Compression` tag value of the page.
    pub compression: Option<u16>,
    /// Index of the page among all pages of the file, masks included.
    page: usize,
}

impl PyramidLevel {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            compression: None,
            page: 0,
        }
    }

    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bands(&self) -> usize {
        self.format.bands()
    }

    /// Size of the decoded page in bytes.
    pub fn uncompressed_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * self.format.bytes_per_pixel() as u64
    }
}

/// Image pages of an external overview file, largest first.
#[derive(Clone, Debug, PartialEq)]
pub struct OverviewPyramid {
    pub path: PathBuf,
    levels: Vec<PyramidLevel>,
}

impl OverviewPyramid {
    pub fn from_levels(path: impl Into<PathBuf>, levels: Vec<PyramidLevel>) -> Self {
        Self {
            path: path.into(),
            levels,
        }
    }

    /// Walk every page of `path` and record the image (non-mask) pages without decoding pixels.
    pub fn scan(path: &Path) -> Result<Self> {
        TiffHeader::sniff(path)?;
        let mut decoder = open_decoder(path)?;
        let levels = scan_pages(&mut decoder, path)?;
        if levels.is_empty() {
            return Err(OvrMergeError::EmptyPyramid(path.to_path_buf()));
        }
        debug!(
            "{}: {} overview levels {:?}",
            path.display(),
            levels.len(),
            levels.iter().map(PyramidLevel::shape).collect::<Vec<_>>()
        );
        Ok(Self {
            path: path.to_path_buf(),
            levels,
        })
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Decode the pixels of pyramid level `index`.
    pub fn read_level(&self, index: usize) -> Result<PixelBuffer> {
        let level = self.levels.get(index).ok_or_else(|| {
            OvrMergeError::Inconsistent(format!(
                "{} has no overview level {index}",
                self.path.display()
            ))
        })?;
        let mut decoder = open_decoder(&self.path)?;
        let tiff_err = OvrMergeError::tiff(&self.path);
        let data = seek_to_page(&mut decoder, level.page)
            .and_then(|()| decoder.read_image())
            .map_err(tiff_err)?;
        PixelBuffer::from_decoded(data, level.width, level.height, level.format, &self.path)
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let reader = BufReader::new(File::open(path).map_err(OvrMergeError::io(path))?);
    Decoder::new(reader)
        .map(|decoder| decoder.with_limits(Limits::unlimited()))
        .map_err(OvrMergeError::tiff(path))
}

fn scan_pages<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<Vec<PyramidLevel>> {
    let tiff_err = || OvrMergeError::tiff(path);
    let mut levels = vec![];
    let mut page = 0;
    loop {
        let subfile_type = decoder
            .find_tag(Tag::NewSubfileType)
            .and_then(|value| value.map(|value| value.into_u32()).transpose())
            .map_err(tiff_err())?
            .unwrap_or(0);
        if subfile_type & SUBFILE_MASK != 0 {
            debug!("{}: skipping mask page {page}", path.display());
        } else {
            levels.push(scan_image_page(decoder, path, page)?);
        }

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(tiff_err())?;
        page += 1;
    }
    Ok(levels)
}

fn scan_image_page<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
    page: usize,
) -> Result<PyramidLevel> {
    let tiff_err = || OvrMergeError::tiff(path);
    let (width, height) = decoder.dimensions().map_err(tiff_err())?;
    let color_type = decoder.colortype().map_err(tiff_err())?;
    let sample_format = decoder
        .find_tag(Tag::SampleFormat)
        .and_then(|value| value.map(|value| value.into_u16_vec()).transpose())
        .map_err(tiff_err())?
        .and_then(|formats| formats.first().copied())
        .unwrap_or(SAMPLE_FORMAT_UINT);
    let format = PixelFormat::from_tiff(color_type, sample_format, path)?;

    let planar = decoder
        .find_tag(Tag::PlanarConfiguration)
        .and_then(|value| value.map(|value| value.into_u16()).transpose())
        .map_err(tiff_err())?
        .unwrap_or(1);
    if planar == PLANAR_SEPARATE && format.bands() > 1 {
        return Err(OvrMergeError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            format: format!("page {page} stores its bands in separate planes"),
        });
    }

    let compression = decoder
        .find_tag(Tag::Compression)
        .and_then(|value| value.map(|value| value.into_u16()).transpose())
        .map_err(tiff_err())?;
    Ok(PyramidLevel {
        width,
        height,
        format,
        compression,
        page,
    })
}

fn seek_to_page<R: Read + Seek>(decoder: &mut Decoder<R>, page: usize) -> TiffResult<()> {
    for _ in 0..page {
        decoder.next_image()?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::{Photometric, SampleType};

    #[test]
    fn level_sizes() {
        let dem = PyramidLevel::new(4, 3, PixelFormat::new(SampleType::I16, Photometric::Gray));
        assert_eq!(dem.bands(), 1);
        assert_eq!(dem.uncompressed_bytes(), 24);
        let cmyk = PyramidLevel::new(2, 2, PixelFormat::new(SampleType::U8, Photometric::Cmyk));
        assert_eq!(cmyk.bands(), 4);
        assert_eq!(cmyk.uncompressed_bytes(), 16);
    }

    #[test]
    fn missing_level() {
        let pyramid = OverviewPyramid::from_levels(
            "a.tif.ovr",
            vec![PyramidLevel::new(
                4,
                4,
                PixelFormat::new(SampleType::U8, Photometric::Gray),
            )],
        );
        assert_eq!(pyramid.len(), 1);
        assert!(matches!(
            pyramid.read_level(1),
            Err(OvrMergeError::Inconsistent(_))
        ));
    }

    #[test]
    fn missing_file_is_named() {
        let err = OverviewPyramid::scan(Path::new("no/such/dir/a.tif.ovr")).unwrap_err();
        assert!(matches!(err, OvrMergeError::Io { .. }));
        assert!(err.to_string().starts_with("no/such/dir/a.tif.ovr: "));
    }
}
