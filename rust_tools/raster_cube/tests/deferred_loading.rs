//! Integration test: cubes loaded from disk read pixels only when asked.

mod common;

use common::{geodetic_cube, init_logging};
use ndarray::array;
use raster_cube::{export_geotiff, load_cubes, DeferredRasterProxy, ErrorKind, RasterArray};
use std::path::PathBuf;

fn stock_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("stock.tif");
    export_geotiff(&geodetic_cube(6, 3), &path).unwrap();
    path
}

fn reference_data() -> RasterArray {
    geodetic_cube(6, 3).into_data().unwrap().data
}

#[test]
fn test_data_is_deferred_until_touched() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut cube = load_cubes(stock_file(&dir)).unwrap().next().unwrap();

    assert!(cube.has_lazy_data());
    assert_eq!(cube.lazy_data().unwrap().shape(), (6, 3));
    assert_eq!(cube.data().unwrap().data, reference_data());
    assert!(!cube.has_lazy_data());
}

#[test]
fn test_partial_touch() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cubes(stock_file(&dir)).unwrap().next().unwrap();

    let mut part = cube.slice(3.., 1..).unwrap();
    assert!(part.has_lazy_data());
    assert_eq!(
        part.data().unwrap().data,
        reference_data().slice(3..6, 1..3)
    );
    assert!(!part.has_lazy_data());
    assert!(cube.has_lazy_data());
}

#[test]
fn test_partial_touch_rows_only() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cubes(stock_file(&dir)).unwrap().next().unwrap();

    let mut part = cube.slice(1.., ..).unwrap();
    assert_eq!(part.shape(), (5, 3));
    assert_eq!(part.y().points, array![45.0, 15.0, -15.0, -45.0, -75.0]);
    assert_eq!(part.data().unwrap().data, reference_data().slice(1..6, 0..3));
    assert!(cube.has_lazy_data());
}

#[test]
fn test_nested_slices_compose() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cubes(stock_file(&dir)).unwrap().next().unwrap();

    let inner = cube.slice(1..5, ..).unwrap().slice(2.., 1..2).unwrap();
    assert_eq!(inner.shape(), (2, 1));
    assert_eq!(
        inner.into_data().unwrap().data,
        RasterArray::from(array![[10.0f32], [13.0]])
    );
}

#[test]
fn test_file_removed_after_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = stock_file(&dir);
    let mut cube = load_cubes(&path).unwrap().next().unwrap();

    std::fs::remove_file(&path).unwrap();
    let err = cube.data().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().starts_with("gdal failed to open raster image"));
    assert!(cube.has_lazy_data());
}

#[test]
fn test_proxy_survives_serialization() {
    let dir = tempfile::tempdir().unwrap();
    let path = stock_file(&dir);

    let proxy = DeferredRasterProxy::new((6, 3), raster_cube::DataType::Float32, path, 1, None);
    let restored = DeferredRasterProxy::from_bytes(&proxy.to_bytes().unwrap()).unwrap();
    assert_eq!(restored, proxy);
    assert_eq!(restored.read_band().unwrap().data, reference_data());
}
