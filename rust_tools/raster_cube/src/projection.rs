//! Geotransform and projection handling: from raster metadata to cube
//! coordinates, and back.

use crate::crs::{coord_system_from_wkt, CoordSystem};
use crate::cube::{Axis, Coordinate};
use crate::error::{RasterCubeError, Result};
use ndarray::{Array1, Array2};

/// Affine pixel-to-world mapping of a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    /// Negative for the usual north-up layout.
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Validate GDAL's six-term transform. Rotated rasters are rejected.
    pub fn from_gdal(gt: [f64; 6]) -> Result<Self> {
        if gt.iter().any(|v| !v.is_finite()) {
            return Err(RasterCubeError::MalformedGeoTransform(format!(
                "non-finite term in {:?}",
                gt
            )));
        }
        if gt[2] != 0.0 || gt[4] != 0.0 {
            return Err(RasterCubeError::RotationNotSupported(gt[2], gt[4]));
        }
        if gt[1] == 0.0 || gt[5] == 0.0 {
            return Err(RasterCubeError::MalformedGeoTransform(format!(
                "zero pixel size in {:?}",
                gt
            )));
        }
        Ok(Self {
            origin_x: gt[0],
            pixel_width: gt[1],
            origin_y: gt[3],
            pixel_height: gt[5],
        })
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }
}

/// Pixel-centre points and cell bounds for `n` cells starting at `origin`.
fn axis_values(origin: f64, step: f64, n: usize) -> (Array1<f64>, Array2<f64>) {
    let edge = |i: usize| origin + i as f64 * step;
    let points = Array1::from_shape_fn(n, |i| origin + (i as f64 + 0.5) * step);
    let bounds = Array2::from_shape_fn((n, 2), |(i, j)| edge(i + j));
    (points, bounds)
}

fn axis_coord(
    axis: Axis,
    origin: f64,
    step: f64,
    n: usize,
    coord_system: &Option<CoordSystem>,
) -> Result<Coordinate> {
    let (points, bounds) = axis_values(origin, step, n);
    let mut coord = Coordinate::new(axis, points).with_coord_system(coord_system.clone());
    if let Some(cs) = coord_system {
        let (x_meta, y_meta) = cs.axis_metadata();
        let meta = match axis {
            Axis::X => x_meta,
            Axis::Y => y_meta,
        };
        coord = coord
            .with_standard_name(meta.standard_name)
            .with_units(meta.units);
    }
    coord.with_bounds(bounds)
}

/// Build the `(y, x)` dimension coordinates of a `width` x `height` raster.
///
/// Fails on rotated geotransforms and on projections absent from the
/// recognised-CRS table.
pub fn resolve_grid(
    projection: &str,
    geotransform: [f64; 6],
    width: usize,
    height: usize,
) -> Result<(Coordinate, Coordinate)> {
    let gt = GeoTransform::from_gdal(geotransform)?;
    let coord_system = coord_system_from_wkt(projection)?;

    let y = axis_coord(Axis::Y, gt.origin_y, gt.pixel_height, height, &coord_system)?;
    let x = axis_coord(Axis::X, gt.origin_x, gt.pixel_width, width, &coord_system)?;
    Ok((y, x))
}
