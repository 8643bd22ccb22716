//! Integration test: every writable data type, in both byte orders.

mod common;

use common::plain_cube;
use gdal::raster::GdalDataType;
use gdal::Dataset;
use raster_cube::{export_geotiff, load_cubes, ByteOrder, DataType, ErrorKind, RasterArray};

/// Raw bytes of 20..32 as `dtype` in `order`.
fn raw_bytes(dtype: DataType, order: ByteOrder) -> Vec<u8> {
    let mut bytes = Vec::new();
    for v in 20u8..32 {
        let mut value: Vec<u8> = match dtype {
            DataType::UInt8 => vec![v],
            DataType::Int8 => vec![v],
            DataType::UInt16 => (v as u16).to_be_bytes().to_vec(),
            DataType::Int16 => (v as i16).to_be_bytes().to_vec(),
            DataType::UInt32 => (v as u32).to_be_bytes().to_vec(),
            DataType::Int32 => (v as i32).to_be_bytes().to_vec(),
            DataType::Float32 => (v as f32).to_be_bytes().to_vec(),
            DataType::Float64 => (v as f64).to_be_bytes().to_vec(),
        };
        let little = match order {
            ByteOrder::Little => true,
            ByteOrder::Big => false,
            ByteOrder::Native => cfg!(target_endian = "little"),
        };
        if little {
            value.reverse();
        }
        bytes.extend(value);
    }
    bytes
}

/// Decoding is the only step that differs between byte orders: the array is
/// native afterwards, so each order is checked against the native decode
/// before the shared export path.
fn check_dtype(dtype: DataType, order: ByteOrder, expected: GdalDataType) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.tif", dtype));

    let bytes = raw_bytes(dtype, order);
    let native_bytes = raw_bytes(dtype, ByteOrder::Native);
    if dtype.size_in_bytes() > 1 && order == ByteOrder::swapped() {
        assert_ne!(bytes, native_bytes, "{} {:?}", dtype, order);
    }
    let data = RasterArray::from_raw_bytes(dtype, order, (3, 4), &bytes).unwrap();
    let native = RasterArray::from_raw_bytes(dtype, ByteOrder::Native, (3, 4), &native_bytes).unwrap();
    assert_eq!(data, native, "{} {:?}", dtype, order);
    export_geotiff(&plain_cube(data), &path).unwrap();

    let dataset = Dataset::open(&path).unwrap();
    let band = dataset.rasterband(1).unwrap();
    assert_eq!(band.band_type(), expected, "{} {:?}", dtype, order);

    let values: Vec<f64> = band
        .read_as::<f64>((0, 0), (4, 3), (4, 3), None)
        .unwrap()
        .into_iter()
        .collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!((min, max), (20.0, 31.0), "{} {:?}", dtype, order);

    let loaded = load_cubes(&path).unwrap().next().unwrap();
    assert_eq!(loaded.dtype(), dtype);
}

#[test]
fn test_unsigned_types() {
    for order in [ByteOrder::Native, ByteOrder::swapped()] {
        check_dtype(DataType::UInt8, order, GdalDataType::UInt8);
        check_dtype(DataType::UInt16, order, GdalDataType::UInt16);
        check_dtype(DataType::UInt32, order, GdalDataType::UInt32);
    }
}

#[test]
fn test_signed_types() {
    for order in [ByteOrder::Native, ByteOrder::swapped()] {
        check_dtype(DataType::Int16, order, GdalDataType::Int16);
        check_dtype(DataType::Int32, order, GdalDataType::Int32);
    }
}

#[test]
fn test_float_types() {
    for order in [ByteOrder::Native, ByteOrder::swapped()] {
        check_dtype(DataType::Float32, order, GdalDataType::Float32);
        check_dtype(DataType::Float64, order, GdalDataType::Float64);
    }
}

#[test]
fn test_int8_cannot_be_exported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("int8.tif");

    let bytes = raw_bytes(DataType::Int8, ByteOrder::Native);
    let data = RasterArray::from_raw_bytes(DataType::Int8, ByteOrder::Native, (3, 4), &bytes).unwrap();
    let err = export_geotiff(&plain_cube(data), &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    assert!(!path.exists());
}
