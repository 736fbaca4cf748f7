//! Fixture builders: tiny GeoTIFF tiles and their multi-page overview sidecars.

#![allow(dead_code)]

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray8, GrayI16, CMYK8, RGB8};
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Tag;

/// Georeferencing written into a fixture tile.
pub enum Georef {
    /// North-up tiepoint + pixel scale
    Tiepoint { x: f64, y: f64, pixel: f64 },
    /// Like `Tiepoint`, flagged as PixelIsPoint in the GeoKey directory
    PixelIsPoint { x: f64, y: f64, pixel: f64 },
    /// Full ModelTransformation matrix with a row rotation term
    Rotated { x: f64, y: f64, pixel: f64, rotation: f64 },
}

/// Write `<dir>/<name>.tif` with georeferencing and return its path.
pub fn write_base(dir: &Path, name: &str, width: u32, height: u32, georef: Georef) -> PathBuf {
    let path = dir.join(format!("{name}.tif"));
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    let mut image = encoder.new_image::<Gray8>(width, height).unwrap();
    let dir_encoder = image.encoder();
    match georef {
        Georef::Tiepoint { x, y, pixel } | Georef::PixelIsPoint { x, y, pixel } => {
            dir_encoder
                .write_tag(Tag::ModelPixelScaleTag, &[pixel, pixel, 0.0][..])
                .unwrap();
            dir_encoder
                .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, x, y, 0.0][..])
                .unwrap();
            let raster_type = if matches!(georef, Georef::PixelIsPoint { .. }) { 2 } else { 1 };
            let keys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, raster_type];
            dir_encoder
                .write_tag(Tag::GeoKeyDirectoryTag, &keys[..])
                .unwrap();
        }
        Georef::Rotated {
            x,
            y,
            pixel,
            rotation,
        } => {
            #[rustfmt::skip]
            let matrix = [
                pixel, rotation, 0.0, x,
                0.0, -pixel, 0.0, y,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ];
            dir_encoder
                .write_tag(Tag::ModelTransformationTag, &matrix[..])
                .unwrap();
        }
    }
    image
        .write_data(&vec![0u8; (width * height) as usize])
        .unwrap();
    path
}

/// Write `<dir>/<name>.tif.ovr` with one single-band page per `(width, height)` level, every
/// pixel set to `value`.
pub fn write_gray_overview(dir: &Path, name: &str, levels: &[(u32, u32)], value: u8) -> PathBuf {
    write_gray_overview_with(dir, name, levels, value, Compression::Uncompressed)
}

pub fn write_gray_overview_with(
    dir: &Path,
    name: &str,
    levels: &[(u32, u32)],
    value: u8,
    compression: Compression,
) -> PathBuf {
    let path = dir.join(format!("{name}.tif.ovr"));
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap())
        .unwrap()
        .with_compression(compression);
    for &(width, height) in levels {
        encoder
            .write_image::<Gray8>(width, height, &vec![value; (width * height) as usize])
            .unwrap();
    }
    path
}

/// Like [`write_gray_overview`] but with three bands holding `value`, `value + 1`, `value + 2`.
pub fn write_rgb_overview(dir: &Path, name: &str, levels: &[(u32, u32)], value: u8) -> PathBuf {
    let path = dir.join(format!("{name}.tif.ovr"));
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    for &(width, height) in levels {
        let data: Vec<u8> = (0..width * height)
            .flat_map(|_| [value, value + 1, value + 2])
            .collect();
        encoder.write_image::<RGB8>(width, height, &data).unwrap();
    }
    path
}

/// A gray overview whose second page is a transparency mask.
pub fn write_overview_with_mask(dir: &Path, name: &str, size: (u32, u32), value: u8) -> PathBuf {
    let path = dir.join(format!("{name}.tif.ovr"));
    let (width, height) = size;
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    encoder
        .write_image::<Gray8>(width, height, &vec![value; (width * height) as usize])
        .unwrap();
    let mut mask = encoder.new_image::<Gray8>(width, height).unwrap();
    mask.encoder().write_tag(Tag::NewSubfileType, 4u32).unwrap();
    mask.write_data(&vec![255u8; (width * height) as usize])
        .unwrap();
    path
}

/// Four-band CMYK pages holding `value` to `value + 3`.
pub fn write_cmyk_overview(dir: &Path, name: &str, levels: &[(u32, u32)], value: u8) -> PathBuf {
    let path = dir.join(format!("{name}.tif.ovr"));
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    for &(width, height) in levels {
        let data: Vec<u8> = (0..width * height)
            .flat_map(|_| [value, value + 1, value + 2, value + 3])
            .collect();
        encoder.write_image::<CMYK8>(width, height, &data).unwrap();
    }
    path
}

/// Signed 16-bit single-band pages, like an elevation model.
pub fn write_i16_overview(dir: &Path, name: &str, levels: &[(u32, u32)], value: i16) -> PathBuf {
    let path = dir.join(format!("{name}.tif.ovr"));
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    for &(width, height) in levels {
        encoder
            .write_image::<GrayI16>(width, height, &vec![value; (width * height) as usize])
            .unwrap();
    }
    path
}

/// A single 8-bit RGB page with PlanarConfiguration 2: one strip per band.
///
/// The encoder only writes interleaved pages, so the file is laid out by hand.
pub fn write_planar_overview(dir: &Path, name: &str, size: (u32, u32), value: u8) -> PathBuf {
    let path = dir.join(format!("{name}.tif.ovr"));
    let (width, height) = size;
    let plane = width * height;

    const ENTRIES: u16 = 10;
    let ifd_end = 8 + 2 + u32::from(ENTRIES) * 12 + 4;
    let bits_at = ifd_end;
    let offsets_at = bits_at + 6;
    let counts_at = offsets_at + 12;
    let data_at = counts_at + 12;

    let mut out = vec![];
    out.write_all(b"II").unwrap();
    out.write_u16::<LittleEndian>(42).unwrap();
    out.write_u32::<LittleEndian>(8).unwrap();
    out.write_u16::<LittleEndian>(ENTRIES).unwrap();
    // (tag, type, count, value or offset); type 3 is SHORT, 4 is LONG
    let entries: [(u16, u16, u32, u32); ENTRIES as usize] = [
        (256, 4, 1, width),
        (257, 4, 1, height),
        (258, 3, 3, bits_at),
        (259, 3, 1, 1),
        (262, 3, 1, 2),
        (273, 4, 3, offsets_at),
        (277, 3, 1, 3),
        (278, 4, 1, height),
        (279, 4, 3, counts_at),
        (284, 3, 1, 2),
    ];
    for (tag, kind, count, value) in entries {
        out.write_u16::<LittleEndian>(tag).unwrap();
        out.write_u16::<LittleEndian>(kind).unwrap();
        out.write_u32::<LittleEndian>(count).unwrap();
        if kind == 3 && count == 1 {
            out.write_u16::<LittleEndian>(value as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
        } else {
            out.write_u32::<LittleEndian>(value).unwrap();
        }
    }
    out.write_u32::<LittleEndian>(0).unwrap();
    for _ in 0..3 {
        out.write_u16::<LittleEndian>(8).unwrap();
    }
    for band in 0..3 {
        out.write_u32::<LittleEndian>(data_at + band * plane).unwrap();
    }
    for _ in 0..3 {
        out.write_u32::<LittleEndian>(plane).unwrap();
    }
    for band in 0..3u8 {
        out.extend(std::iter::repeat(value + band).take(plane as usize));
    }
    std::fs::write(&path, out).unwrap();
    path
}

/// A decoded output page. 8-bit pages fill `samples`, signed 16-bit pages fill `signed`.
pub struct Page {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<u8>,
    pub signed: Vec<i16>,
    pub compression: u16,
    pub photometric: u16,
    pub sample_format: u16,
}

impl Page {
    /// Sample at column `x`, row `y`, band `band` of a page with `bands` bands.
    pub fn at(&self, x: u32, y: u32, band: u32, bands: u32) -> u8 {
        self.samples[((y * self.width + x) * bands + band) as usize]
    }

    pub fn signed_at(&self, x: u32, y: u32) -> i16 {
        self.signed[(y * self.width + x) as usize]
    }
}

pub fn read_pages(path: &Path) -> Vec<Page> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    let mut pages = vec![];
    loop {
        let (width, height) = decoder.dimensions().unwrap();
        let mut short_tag = |tag: Tag, default: u16| {
            decoder
                .find_tag(tag)
                .unwrap()
                .map(|value| value.into_u16_vec().unwrap()[0])
                .unwrap_or(default)
        };
        let compression = short_tag(Tag::Compression, 1);
        let photometric = short_tag(Tag::PhotometricInterpretation, 1);
        let sample_format = short_tag(Tag::SampleFormat, 1);
        let (samples, signed) = match decoder.read_image().unwrap() {
            DecodingResult::U8(samples) => (samples, vec![]),
            DecodingResult::I16(signed) => (vec![], signed),
            _ => panic!("expected 8-bit or signed 16-bit samples"),
        };
        pages.push(Page {
            width,
            height,
            samples,
            signed,
            compression,
            photometric,
            sample_format,
        });
        if !decoder.more_images() {
            break;
        }
        decoder.next_image().unwrap();
    }
    pages
}
