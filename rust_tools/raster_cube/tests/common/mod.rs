//! Shared fixtures for the GeoTIFF integration tests.

#![allow(dead_code)]

use ndarray::{Array1, Array2};
use raster_cube::{Axis, CoordSystem, Coordinate, Cube, GeogCs, RasterArray};

pub const UM_SPHERE_RADIUS: f64 = 6371229.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Coordinate with regular points and guessed contiguous bounds.
pub fn regular_coord(axis: Axis, first: f64, step: f64, n: usize) -> Coordinate {
    let points = Array1::from_shape_fn(n, |i| first + i as f64 * step);
    let mut coord = Coordinate::new(axis, points);
    coord.guess_bounds().expect("regular points always have bounds");
    coord
}

/// Global lat/lon cube on the UM sphere with `arange` float32 data.
///
/// Latitude runs north to south, matching the order the importer produces.
pub fn geodetic_cube(rows: usize, cols: usize) -> Cube {
    let cs = Some(CoordSystem::Geodetic(GeogCs::sphere(UM_SPHERE_RADIUS)));
    let lat_step = 180.0 / rows as f64;
    let lon_step = 360.0 / cols as f64;
    let y = regular_coord(Axis::Y, 90.0 - lat_step / 2.0, -lat_step, rows)
        .with_standard_name("latitude")
        .with_units("degree_north")
        .with_coord_system(cs.clone());
    let x = regular_coord(Axis::X, lon_step / 2.0, lon_step, cols)
        .with_standard_name("longitude")
        .with_units("degree_east")
        .with_coord_system(cs);

    let data = Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f32);
    Cube::new(RasterArray::from(data), y, x).expect("valid stock cube")
}

/// 3x4 cube without a coordinate system around `data`.
pub fn plain_cube(data: RasterArray) -> Cube {
    let (rows, cols) = data.shape();
    let y = regular_coord(Axis::Y, 0.0, 1.0, rows).with_units("degrees");
    let x = regular_coord(Axis::X, 0.0, 1.0, cols).with_units("degrees");
    Cube::new(data, y, x).expect("valid plain cube")
}

/// Same cube with its Y axis and data rows reversed.
pub fn flip_y(cube: &Cube) -> Cube {
    let data = cube.materialized().expect("in-memory data").reversed_rows();
    let mut flipped =
        Cube::new(data, cube.y().reversed(), cube.x().clone()).expect("flipped cube is valid");
    flipped.name = cube.name.clone();
    flipped
}
