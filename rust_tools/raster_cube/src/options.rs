use crate::error::{RasterCubeError, Result};
use gdal::cpl::CslStringList;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Deflate,
    Lzw,
    Zstd,
}

impl Compression {
    pub fn as_gdal(&self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Deflate => "DEFLATE",
            Compression::Lzw => "LZW",
            Compression::Zstd => "ZSTD",
        }
    }
}

impl FromStr for Compression {
    type Err = RasterCubeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NONE" => Ok(Compression::None),
            "DEFLATE" => Ok(Compression::Deflate),
            "LZW" => Ok(Compression::Lzw),
            "ZSTD" => Ok(Compression::Zstd),
            other => Err(RasterCubeError::InvalidCompression(other.to_string())),
        }
    }
}

/// GeoTIFF creation settings. The default writes uncompressed strips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoTiffOptions {
    pub compression: Compression,
    /// Square tile edge in pixels; `None` writes strips.
    pub tile_size: Option<usize>,
}

/// Validate tile size (must be multiple of 16)
pub fn validate_tile_size(tile_size: usize) -> Result<()> {
    if tile_size == 0 || tile_size % 16 != 0 {
        return Err(RasterCubeError::InvalidTileSize(tile_size));
    }
    Ok(())
}

impl GeoTiffOptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(tile_size) = self.tile_size {
            validate_tile_size(tile_size)?;
        }
        Ok(())
    }

    /// `KEY=VALUE` creation options for the GTiff driver.
    pub fn creation_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        if self.compression != Compression::None {
            options.push(format!("COMPRESS={}", self.compression.as_gdal()));
        }
        if let Some(tile_size) = self.tile_size {
            options.push("TILED=YES".to_string());
            options.push(format!("BLOCKXSIZE={}", tile_size));
            options.push(format!("BLOCKYSIZE={}", tile_size));
        }
        options
    }

    pub fn to_csl(&self) -> Result<CslStringList> {
        self.validate()?;
        let mut list = CslStringList::new();
        for option in self.creation_options() {
            list.add_string(&option)?;
        }
        Ok(list)
    }
}
