use std::path::PathBuf;

use clap::ValueEnum;

/// Output path used when none is given.
pub const DEFAULT_OUTPUT: &str = "out.tif.ovr";

/// How merged pyramid levels are laid out on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputLayout {
    /// One TIFF, one page per level
    #[default]
    MultiPage,
    /// One TIFF per level, the level index inserted before the extension
    PerLevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputCompression {
    /// Reuse the compression of the input overviews where possible
    #[default]
    Inherit,
    None,
    Lzw,
    Deflate,
    Packbits,
}

/// When to write 64-bit offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BigTiffMode {
    /// Only when the uncompressed levels would not fit 32-bit offsets
    #[default]
    IfNeeded,
    Always,
    Never,
}

/// Everything a merge run needs. Tiles are processed in `inputs` order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub layout: OutputLayout,
    pub compression: OutputCompression,
    pub bigtiff: BigTiffMode,
}

impl MergeConfig {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            output: PathBuf::from(DEFAULT_OUTPUT),
            layout: OutputLayout::default(),
            compression: OutputCompression::default(),
            bigtiff: BigTiffMode::default(),
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: OutputCompression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_bigtiff(mut self, bigtiff: BigTiffMode) -> Self {
        self.bigtiff = bigtiff;
        self
    }
}
