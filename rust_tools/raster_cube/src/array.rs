//! Typed 2-D pixel arrays and the masked wrapper used as realised cube data.

use crate::error::{RasterCubeError, Result};
use gdal::raster::GdalDataType;
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Scalar pixel type of a raster band or cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Map a band's reported pixel type onto a cube dtype.
    pub fn from_gdal(band_type: GdalDataType) -> Result<Self> {
        match band_type {
            GdalDataType::UInt8 => Ok(DataType::UInt8),
            GdalDataType::UInt16 => Ok(DataType::UInt16),
            GdalDataType::Int16 => Ok(DataType::Int16),
            GdalDataType::UInt32 => Ok(DataType::UInt32),
            GdalDataType::Int32 => Ok(DataType::Int32),
            GdalDataType::Float32 => Ok(DataType::Float32),
            GdalDataType::Float64 => Ok(DataType::Float64),
            other => Err(RasterCubeError::UnsupportedDtype(format!("{:?}", other))),
        }
    }

    /// Output pixel type for a GeoTIFF band. `Int8` has no counterpart.
    pub fn to_gdal(&self) -> Result<GdalDataType> {
        match self {
            DataType::UInt8 => Ok(GdalDataType::UInt8),
            DataType::UInt16 => Ok(GdalDataType::UInt16),
            DataType::Int16 => Ok(GdalDataType::Int16),
            DataType::UInt32 => Ok(GdalDataType::UInt32),
            DataType::Int32 => Ok(GdalDataType::Int32),
            DataType::Float32 => Ok(GdalDataType::Float32),
            DataType::Float64 => Ok(GdalDataType::Float64),
            DataType::Int8 => Err(RasterCubeError::UnsupportedDtype(self.name().to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of a raw pixel buffer handed to [`RasterArray::from_raw_bytes`].
///
/// Only decoding looks at it; decoded arrays are native, so GeoTIFF output
/// never depends on the order the input bytes arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Native,
    Little,
    Big,
}

impl ByteOrder {
    /// The non-native order on this host.
    pub fn swapped() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RasterArray {
    UInt8(Array2<u8>),
    Int8(Array2<i8>),
    UInt16(Array2<u16>),
    Int16(Array2<i16>),
    UInt32(Array2<u32>),
    Int32(Array2<i32>),
    Float32(Array2<f32>),
    Float64(Array2<f64>),
}

/// Evaluate `$body` with `$inner` bound to the typed array of any variant.
macro_rules! dispatch {
    ($array:expr, $inner:ident => $body:expr) => {
        match $array {
            RasterArray::UInt8($inner) => $body,
            RasterArray::Int8($inner) => $body,
            RasterArray::UInt16($inner) => $body,
            RasterArray::Int16($inner) => $body,
            RasterArray::UInt32($inner) => $body,
            RasterArray::Int32($inner) => $body,
            RasterArray::Float32($inner) => $body,
            RasterArray::Float64($inner) => $body,
        }
    };
}

/// Like `dispatch!`, re-wrapping the result in the same variant.
macro_rules! map_array {
    ($array:expr, $inner:ident => $body:expr) => {
        match $array {
            RasterArray::UInt8($inner) => RasterArray::UInt8($body),
            RasterArray::Int8($inner) => RasterArray::Int8($body),
            RasterArray::UInt16($inner) => RasterArray::UInt16($body),
            RasterArray::Int16($inner) => RasterArray::Int16($body),
            RasterArray::UInt32($inner) => RasterArray::UInt32($body),
            RasterArray::Int32($inner) => RasterArray::Int32($body),
            RasterArray::Float32($inner) => RasterArray::Float32($body),
            RasterArray::Float64($inner) => RasterArray::Float64($body),
        }
    };
}

macro_rules! decode_values {
    ($ty:ty, $bytes:expr, $order:expr) => {{
        const WIDTH: usize = std::mem::size_of::<$ty>();
        $bytes
            .chunks_exact(WIDTH)
            .map(|chunk| {
                let mut raw = [0u8; WIDTH];
                raw.copy_from_slice(chunk);
                match $order {
                    ByteOrder::Native => <$ty>::from_ne_bytes(raw),
                    ByteOrder::Little => <$ty>::from_le_bytes(raw),
                    ByteOrder::Big => <$ty>::from_be_bytes(raw),
                }
            })
            .collect::<Vec<$ty>>()
    }};
}

macro_rules! impl_from_array {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Array2<$ty>> for RasterArray {
                fn from(array: Array2<$ty>) -> Self {
                    RasterArray::$variant(array)
                }
            }
        )*
    };
}

impl_from_array!(
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    f32 => Float32,
    f64 => Float64,
);

impl RasterArray {
    /// Decode a row-major `(rows, cols)` buffer of `dtype` values stored in `order`.
    ///
    /// The result is always held in native order; the source byte order is
    /// not remembered.
    pub fn from_raw_bytes(
        dtype: DataType,
        order: ByteOrder,
        shape: (usize, usize),
        bytes: &[u8],
    ) -> Result<Self> {
        let expected = shape.0 * shape.1 * dtype.size_in_bytes();
        if bytes.len() != expected {
            return Err(RasterCubeError::ByteLengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let array: RasterArray = match dtype {
            DataType::UInt8 => Array2::from_shape_vec(shape, bytes.to_vec())?.into(),
            DataType::Int8 => {
                let values: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
                Array2::from_shape_vec(shape, values)?.into()
            }
            DataType::UInt16 => Array2::from_shape_vec(shape, decode_values!(u16, bytes, order))?.into(),
            DataType::Int16 => Array2::from_shape_vec(shape, decode_values!(i16, bytes, order))?.into(),
            DataType::UInt32 => Array2::from_shape_vec(shape, decode_values!(u32, bytes, order))?.into(),
            DataType::Int32 => Array2::from_shape_vec(shape, decode_values!(i32, bytes, order))?.into(),
            DataType::Float32 => Array2::from_shape_vec(shape, decode_values!(f32, bytes, order))?.into(),
            DataType::Float64 => Array2::from_shape_vec(shape, decode_values!(f64, bytes, order))?.into(),
        };
        Ok(array)
    }

    pub fn dtype(&self) -> DataType {
        match self {
            RasterArray::UInt8(_) => DataType::UInt8,
            RasterArray::Int8(_) => DataType::Int8,
            RasterArray::UInt16(_) => DataType::UInt16,
            RasterArray::Int16(_) => DataType::Int16,
            RasterArray::UInt32(_) => DataType::UInt32,
            RasterArray::Int32(_) => DataType::Int32,
            RasterArray::Float32(_) => DataType::Float32,
            RasterArray::Float64(_) => DataType::Float64,
        }
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        dispatch!(self, a => a.dim())
    }

    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> RasterArray {
        map_array!(self, a => a.slice(s![rows.clone(), cols.clone()]).to_owned())
    }

    /// Copy with the row order reversed (first row last).
    pub fn reversed_rows(&self) -> RasterArray {
        map_array!(self, a => a.slice(s![..;-1, ..]).to_owned())
    }

    pub fn to_f64(&self) -> Array2<f64> {
        dispatch!(self, a => a.mapv(|v| v as f64))
    }

    /// Mask of the pixels equal to `value`; a NaN value matches NaN pixels.
    ///
    /// Float32 pixels are compared at single precision, as GDAL does for
    /// no-data values.
    pub fn mask_equal(&self, value: f64) -> Array2<bool> {
        if value.is_nan() {
            return dispatch!(self, a => a.mapv(|v| (v as f64).is_nan()));
        }
        match self {
            RasterArray::Float32(a) => a.mapv(|v| v == value as f32),
            other => dispatch!(other, a => a.mapv(|v| v as f64 == value)),
        }
    }
}

/// Realised cube data: values plus an optional mask (true = masked).
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    pub data: RasterArray,
    pub mask: Option<Array2<bool>>,
    pub fill_value: Option<f64>,
}

impl MaskedArray {
    pub fn new(data: impl Into<RasterArray>) -> Self {
        Self {
            data: data.into(),
            mask: None,
            fill_value: None,
        }
    }

    pub fn with_mask(
        data: impl Into<RasterArray>,
        mask: Array2<bool>,
        fill_value: Option<f64>,
    ) -> Result<Self> {
        let data = data.into();
        if mask.dim() != data.shape() {
            return Err(RasterCubeError::ShapeMismatch {
                data: data.shape(),
                coords: mask.dim(),
            });
        }
        Ok(Self {
            data,
            mask: Some(mask),
            fill_value,
        })
    }

    /// Mask every pixel equal to `fill_value`, keeping it as the fill value.
    pub fn masked_equal(data: RasterArray, fill_value: f64) -> Self {
        let mask = data.mask_equal(fill_value);
        Self {
            data,
            mask: Some(mask),
            fill_value: Some(fill_value),
        }
    }

    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> MaskedArray {
        MaskedArray {
            data: self.data.slice(rows.clone(), cols.clone()),
            mask: self
                .mask
                .as_ref()
                .map(|m| m.slice(s![rows, cols]).to_owned()),
            fill_value: self.fill_value,
        }
    }

    pub fn reversed_rows(&self) -> MaskedArray {
        MaskedArray {
            data: self.data.reversed_rows(),
            mask: self.mask.as_ref().map(|m| m.slice(s![..;-1, ..]).to_owned()),
            fill_value: self.fill_value,
        }
    }
}
