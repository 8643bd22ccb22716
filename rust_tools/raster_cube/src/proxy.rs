use crate::array::{DataType, MaskedArray, RasterArray};
use crate::error::{RasterCubeError, Result};
use crate::io::open_dataset;
use crate::lazy::ArraySource;
use gdal::raster::{GdalType, RasterBand};
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Array-like handle on one band of a raster file.
///
/// Holds only the identifying fields; every read reopens the file and reads
/// the whole band, so the proxy can be cloned, sent and serialised freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredRasterProxy {
    shape: (usize, usize),
    dtype: DataType,
    path: PathBuf,
    band_index: usize,
    fill_value: Option<f64>,
}

impl DeferredRasterProxy {
    pub fn new(
        shape: (usize, usize),
        dtype: DataType,
        path: impl Into<PathBuf>,
        band_index: usize,
        fill_value: Option<f64>,
    ) -> Self {
        Self {
            shape,
            dtype,
            path: path.into(),
            band_index,
            fill_value,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1-based GDAL band number.
    pub fn band_index(&self) -> usize {
        self.band_index
    }

    pub fn fill_value(&self) -> Option<f64> {
        self.fill_value
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read the whole band, masking pixels equal to the fill value.
    pub fn read_band(&self) -> Result<MaskedArray> {
        debug!(
            "Reading band {} of {} as {}",
            self.band_index,
            self.path.display(),
            self.dtype
        );
        let dataset = open_dataset(&self.path)?;
        let band = dataset.rasterband(self.band_index)?;

        let data: RasterArray = match self.dtype {
            DataType::UInt8 => read_typed::<u8>(&band, self.shape)?.into(),
            DataType::UInt16 => read_typed::<u16>(&band, self.shape)?.into(),
            DataType::Int16 => read_typed::<i16>(&band, self.shape)?.into(),
            DataType::UInt32 => read_typed::<u32>(&band, self.shape)?.into(),
            DataType::Int32 => read_typed::<i32>(&band, self.shape)?.into(),
            DataType::Float32 => read_typed::<f32>(&band, self.shape)?.into(),
            DataType::Float64 => read_typed::<f64>(&band, self.shape)?.into(),
            DataType::Int8 => {
                return Err(RasterCubeError::UnsupportedDtype(self.dtype.name().to_string()))
            }
        };

        Ok(match self.fill_value {
            Some(fill) => MaskedArray::masked_equal(data, fill),
            None => MaskedArray::new(data),
        })
    }
}

fn read_typed<T: GdalType + Copy>(band: &RasterBand, shape: (usize, usize)) -> Result<Array2<T>> {
    let (rows, cols) = shape;
    let buffer = band.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
    let values: Vec<T> = buffer.into_iter().collect();
    Ok(Array2::from_shape_vec((rows, cols), values)?)
}

impl ArraySource for DeferredRasterProxy {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn dtype(&self) -> DataType {
        self.dtype
    }

    fn read(&self, rows: Range<usize>, cols: Range<usize>) -> Result<MaskedArray> {
        let full = self.read_band()?;
        if rows == (0..self.shape.0) && cols == (0..self.shape.1) {
            return Ok(full);
        }
        Ok(full.slice(rows, cols))
    }
}
