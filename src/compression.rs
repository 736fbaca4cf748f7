use log::warn;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tiff::encoder::{Compression as TiffCompression, DeflateLevel};

use crate::config::OutputCompression;

/// TIFF `Compression` tag values seen in overview files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Compression {
    Uncompressed = 1,
    Lzw = 5,
    OldJpeg = 6,
    Jpeg = 7,
    Deflate = 8,
    Packbits = 32773,
    OldDeflate = 32946,
    Lerc = 34887,
    Lzma = 34925,
    Zstd = 50000,
    Webp = 50001,
}

impl Compression {
    /// The encoder's equivalent, if it can write this scheme.
    fn encodable(self) -> Option<TiffCompression> {
        match self {
            Self::Uncompressed => Some(TiffCompression::Uncompressed),
            Self::Lzw => Some(TiffCompression::Lzw),
            Self::Deflate | Self::OldDeflate => {
                Some(TiffCompression::Deflate(DeflateLevel::Balanced))
            }
            Self::Packbits => Some(TiffCompression::Packbits),
            _ => None,
        }
    }
}

/// Pick the encoder compression for the merged output.
///
/// `source` is the raw `Compression` tag of the first tile's first overview page.
pub fn resolve(choice: OutputCompression, source: Option<u16>) -> TiffCompression {
    match choice {
        OutputCompression::None => TiffCompression::Uncompressed,
        OutputCompression::Lzw => TiffCompression::Lzw,
        OutputCompression::Deflate => TiffCompression::Deflate(DeflateLevel::Balanced),
        OutputCompression::Packbits => TiffCompression::Packbits,
        OutputCompression::Inherit => {
            let Some(code) = source else {
                return TiffCompression::Uncompressed;
            };
            match Compression::try_from(code) {
                Ok(compression) => compression.encodable().unwrap_or_else(|| {
                    warn!("source overviews use {compression:?} compression, writing Deflate instead");
                    TiffCompression::Deflate(DeflateLevel::Balanced)
                }),
                Err(_) => {
                    warn!("unknown source compression {code}, writing Deflate instead");
                    TiffCompression::Deflate(DeflateLevel::Balanced)
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn is_deflate(compression: TiffCompression) -> bool {
        matches!(compression, TiffCompression::Deflate(_))
    }

    #[test]
    fn inherit_supported_schemes() {
        assert!(matches!(
            resolve(OutputCompression::Inherit, Some(5)),
            TiffCompression::Lzw
        ));
        assert!(matches!(
            resolve(OutputCompression::Inherit, Some(32773)),
            TiffCompression::Packbits
        ));
        assert!(is_deflate(resolve(OutputCompression::Inherit, Some(32946))));
        assert!(matches!(
            resolve(OutputCompression::Inherit, None),
            TiffCompression::Uncompressed
        ));
    }

    #[test]
    fn inherit_falls_back_to_deflate() {
        assert!(is_deflate(resolve(OutputCompression::Inherit, Some(7))));
        assert!(is_deflate(resolve(OutputCompression::Inherit, Some(50001))));
        assert!(is_deflate(resolve(OutputCompression::Inherit, Some(4242))));
    }

    #[test]
    fn explicit_choice_wins() {
        assert!(matches!(
            resolve(OutputCompression::None, Some(5)),
            TiffCompression::Uncompressed
        ));
        assert!(is_deflate(resolve(OutputCompression::Deflate, Some(1))));
    }

    #[test]
    fn tag_codes() {
        assert_eq!(u16::from(Compression::Jpeg), 7);
        assert!(matches!(Compression::try_from(8), Ok(Compression::Deflate)));
        assert!(Compression::try_from(2).is_err());
    }
}
