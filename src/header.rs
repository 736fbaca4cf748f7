use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::error::{OvrMergeError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

/// The first eight bytes of a TIFF file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TiffHeader {
    pub endianness: Endianness,
    /// Version 43 (64-bit offsets) rather than 42.
    pub bigtiff: bool,
}

impl TiffHeader {
    /// Parse the byte order mark and version. Returns `None` for anything that is not a TIFF.
    pub fn parse<R: Read>(mut reader: R) -> Option<Self> {
        let mut magic_bytes = [0; 2];
        reader.read_exact(&mut magic_bytes).ok()?;
        // Should be b"II" for little endian or b"MM" for big endian
        let endianness = match &magic_bytes {
            b"II" => Endianness::LittleEndian,
            b"MM" => Endianness::BigEndian,
            _ => return None,
        };

        let version = match endianness {
            Endianness::LittleEndian => reader.read_u16::<LittleEndian>(),
            Endianness::BigEndian => reader.read_u16::<BigEndian>(),
        }
        .ok()?;

        match version {
            42 => Some(Self {
                endianness,
                bigtiff: false,
            }),
            43 => Some(Self {
                endianness,
                bigtiff: true,
            }),
            _ => None,
        }
    }

    /// Check that `path` is a TIFF before handing it to the decoder.
    pub(crate) fn sniff(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(OvrMergeError::io(path))?;
        Self::parse(file).ok_or_else(|| OvrMergeError::NotTiff(path.to_path_buf()))
    }
}
