use crate::array::{DataType, MaskedArray, RasterArray};
use crate::crs::approx_eq;
use crate::cube::{Coordinate, Cube};
use crate::error::{RasterCubeError, Result};
use crate::options::GeoTiffOptions;
use crate::projection::GeoTransform;
use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, Metadata};
use log::{debug, info};
use ndarray::Array2;
use num_traits::NumCast;
use std::borrow::Cow;
use std::path::Path;

const DEGREE_UNITS: &[&str] = &[
    "degree",
    "degrees",
    "degree_east",
    "degrees_east",
    "degree_north",
    "degrees_north",
];
const METRE_UNITS: &[&str] = &["m", "metre", "metres", "meter", "meters"];

/// Where and how the output raster is laid out relative to the cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub geotransform: GeoTransform,
    /// Y increases with row index, so rows must be reversed for north-up output.
    pub flip_rows: bool,
}

fn invalid(coord: &Coordinate, reason: &str) -> RasterCubeError {
    RasterCubeError::InvalidCoordinate {
        name: coord.name(),
        reason: reason.to_string(),
    }
}

/// Signed cell width of a coordinate with contiguous, regular bounds.
fn regular_step(coord: &Coordinate) -> Result<f64> {
    let bounds = coord
        .bounds
        .as_ref()
        .ok_or_else(|| RasterCubeError::MissingBounds(coord.name()))?;
    if bounds.nrows() == 0 {
        return Err(invalid(coord, "coordinate has no points"));
    }
    if coord.coord_system.is_some() {
        let units = coord.units.to_ascii_lowercase();
        if !DEGREE_UNITS.contains(&units.as_str()) && !METRE_UNITS.contains(&units.as_str()) {
            return Err(invalid(
                coord,
                "units must be either degrees or convertible to meters",
            ));
        }
    }

    let step = bounds[[0, 1]] - bounds[[0, 0]];
    if step == 0.0 {
        return Err(invalid(coord, "bounds must have non-zero width"));
    }
    for i in 1..bounds.nrows() {
        if !approx_eq(bounds[[i, 0]], bounds[[i - 1, 1]]) {
            return Err(invalid(coord, "bounds must be contiguous"));
        }
        if !approx_eq(bounds[[i, 1]] - bounds[[i, 0]], step) {
            return Err(invalid(coord, "bounds must be regularly spaced"));
        }
    }
    Ok(step)
}

/// Geotransform and row order for writing `cube` north-up.
pub fn grid_layout(cube: &Cube) -> Result<GridLayout> {
    let (x, y) = (cube.x(), cube.y());
    if x.coord_system != y.coord_system {
        return Err(RasterCubeError::CoordSystemMismatch);
    }
    let x_step = regular_step(x)?;
    let y_step = regular_step(y)?;
    if x_step < 0.0 || !x.is_increasing() {
        return Err(invalid(x, "x points must be monotonically increasing"));
    }

    let (x_bounds, y_bounds) = match (&x.bounds, &y.bounds) {
        (Some(xb), Some(yb)) => (xb, yb),
        _ => return Err(RasterCubeError::MissingBounds(x.name())),
    };
    let top = y_bounds.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(GridLayout {
        geotransform: GeoTransform {
            origin_x: x_bounds[[0, 0]],
            pixel_width: x_step,
            origin_y: top,
            pixel_height: -y_step.abs(),
        },
        flip_rows: y_step > 0.0,
    })
}

/// Fill value for masked pixels when the data does not carry one.
fn default_fill_value(dtype: DataType) -> f64 {
    match dtype {
        DataType::UInt8 => u8::MAX as f64,
        DataType::Int8 => i8::MAX as f64,
        DataType::UInt16 => u16::MAX as f64,
        DataType::Int16 => i16::MAX as f64,
        DataType::UInt32 => u32::MAX as f64,
        DataType::Int32 => i32::MAX as f64,
        DataType::Float32 | DataType::Float64 => 1e20,
    }
}

struct BandTarget<'a> {
    path: &'a Path,
    geotransform: [f64; 6],
    spatial_ref: Option<&'a SpatialRef>,
    description: Option<&'a str>,
    options: &'a GeoTiffOptions,
}

fn create_output_dataset<T: GdalType>(
    path: &Path,
    width: usize,
    height: usize,
    options: &GeoTiffOptions,
) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let dataset = if options.creation_options().is_empty() {
        driver.create_with_band_type::<T, _>(path, width, height, 1)?
    } else {
        driver.create_with_band_type_with_options::<T, _>(
            path,
            width,
            height,
            1,
            &options.to_csl()?,
        )?
    };
    Ok(dataset)
}

fn write_band<T: GdalType + NumCast + Copy>(
    target: &BandTarget<'_>,
    array: &Array2<T>,
    data: &MaskedArray,
) -> Result<()> {
    let dtype = data.dtype();
    let (rows, cols) = array.dim();

    let (values, no_data): (Vec<T>, Option<f64>) = match &data.mask {
        Some(mask) => {
            let fill = data.fill_value.unwrap_or_else(|| default_fill_value(dtype));
            let fill_as_t = <T as NumCast>::from(fill)
                .ok_or(RasterCubeError::InvalidFillValue(fill, dtype.name()))?;
            let values = array
                .iter()
                .zip(mask.iter())
                .map(|(&v, &masked)| if masked { fill_as_t } else { v })
                .collect();
            (values, Some(fill))
        }
        None => (array.iter().copied().collect(), None),
    };

    let mut dataset = create_output_dataset::<T>(target.path, cols, rows, target.options)?;
    dataset.set_geo_transform(&target.geotransform)?;
    if let Some(spatial_ref) = target.spatial_ref {
        dataset.set_spatial_ref(spatial_ref)?;
    }

    let mut band = dataset.rasterband(1)?;
    if let Some(no_data) = no_data {
        debug!("Setting no-data value {}", no_data);
        band.set_no_data_value(Some(no_data))?;
    }
    if let Some(description) = target.description {
        band.set_description(description)?;
    }

    let mut buffer = Buffer::new((cols, rows), values);
    band.write((0, 0), (cols, rows), &mut buffer)?;
    Ok(())
}

/// Write `cube` as a single-band GeoTIFF with default creation options.
pub fn export_geotiff(cube: &Cube, path: impl AsRef<Path>) -> Result<()> {
    export_geotiff_with_options(cube, path, &GeoTiffOptions::default())
}

/// Write `cube` as a single-band GeoTIFF, overwriting `path`.
///
/// Rows are written north-up whatever the cube's Y order. Masked pixels are
/// written as the fill value, which becomes the band's no-data value.
pub fn export_geotiff_with_options(
    cube: &Cube,
    path: impl AsRef<Path>,
    options: &GeoTiffOptions,
) -> Result<()> {
    let path = path.as_ref();
    cube.dtype().to_gdal()?;
    options.validate()?;

    let layout = grid_layout(cube)?;
    let spatial_ref = cube
        .x()
        .coord_system
        .as_ref()
        .map(|cs| cs.to_spatial_ref())
        .transpose()?;

    let data = cube.materialized()?;
    let data = if layout.flip_rows {
        Cow::Owned(data.reversed_rows())
    } else {
        data
    };

    info!(
        "Writing {}x{} {} GeoTIFF: {}",
        data.shape().1,
        data.shape().0,
        data.dtype(),
        path.display()
    );
    let target = BandTarget {
        path,
        geotransform: layout.geotransform.to_gdal(),
        spatial_ref: spatial_ref.as_ref(),
        description: cube.name.as_deref(),
        options,
    };

    match &data.data {
        RasterArray::UInt8(a) => write_band(&target, a, &data),
        RasterArray::UInt16(a) => write_band(&target, a, &data),
        RasterArray::Int16(a) => write_band(&target, a, &data),
        RasterArray::UInt32(a) => write_band(&target, a, &data),
        RasterArray::Int32(a) => write_band(&target, a, &data),
        RasterArray::Float32(a) => write_band(&target, a, &data),
        RasterArray::Float64(a) => write_band(&target, a, &data),
        RasterArray::Int8(_) => Err(RasterCubeError::UnsupportedDtype(
            DataType::Int8.name().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::{CoordSystem, GeogCs, RotatedGeogCs};
    use crate::cube::Axis;
    use crate::error::ErrorKind;
    use ndarray::Array1;

    fn coord(axis: Axis, points: Vec<f64>) -> Coordinate {
        let mut coord = Coordinate::new(axis, points).with_units("degrees");
        coord.guess_bounds().unwrap();
        coord
    }

    fn cube(y: Vec<f64>, x: Vec<f64>) -> Cube {
        let data = Array2::<u8>::zeros((y.len(), x.len()));
        Cube::new(RasterArray::from(data), coord(Axis::Y, y), coord(Axis::X, x)).unwrap()
    }

    #[test]
    fn test_geotransform_from_bounds() {
        let layout = grid_layout(&cube(vec![30.0, 40.0, 50.0], vec![-10.0, -5.0, 0.0, 5.0])).unwrap();
        assert_eq!(layout.geotransform.to_gdal(), [-12.5, 5.0, 0.0, 55.0, 0.0, -10.0]);
        assert!(layout.flip_rows);
    }

    #[test]
    fn test_orientation_gives_same_geotransform() {
        let up = grid_layout(&cube(vec![30.0, 40.0, 50.0], vec![0.0, 1.0])).unwrap();
        let down = grid_layout(&cube(vec![50.0, 40.0, 30.0], vec![0.0, 1.0])).unwrap();
        assert_eq!(up.geotransform, down.geotransform);
        assert!(up.flip_rows);
        assert!(!down.flip_rows);
    }

    #[test]
    fn test_missing_bounds() {
        let y = Coordinate::new(Axis::Y, vec![0.0, 1.0]);
        let x = coord(Axis::X, vec![0.0, 1.0]);
        let cube = Cube::new(RasterArray::from(Array2::<u8>::zeros((2, 2))), y, x).unwrap();
        assert!(matches!(grid_layout(&cube), Err(RasterCubeError::MissingBounds(_))));
    }

    #[test]
    fn test_irregular_bounds() {
        let err = grid_layout(&cube(vec![0.0, 1.0, 3.0], vec![0.0, 1.0])).unwrap_err();
        assert!(err.to_string().contains("regularly spaced"));
    }

    #[test]
    fn test_decreasing_x_rejected() {
        let err = grid_layout(&cube(vec![0.0, 1.0], vec![1.0, 0.0])).unwrap_err();
        assert!(err.to_string().contains("monotonically increasing"));
    }

    #[test]
    fn test_coord_systems_must_match() {
        let cs = CoordSystem::Geodetic(GeogCs::sphere(6371229.0));
        let y = coord(Axis::Y, vec![0.0, 1.0]).with_coord_system(Some(cs));
        let x = coord(Axis::X, vec![0.0, 1.0]);
        let cube = Cube::new(RasterArray::from(Array2::<u8>::zeros((2, 2))), y, x).unwrap();
        assert!(matches!(grid_layout(&cube), Err(RasterCubeError::CoordSystemMismatch)));
    }

    #[test]
    fn test_units_checked_when_crs_present() {
        let cs = CoordSystem::Geodetic(GeogCs::sphere(6371229.0));
        let y = coord(Axis::Y, vec![0.0, 1.0])
            .with_units("hours")
            .with_coord_system(Some(cs.clone()));
        let x = coord(Axis::X, vec![0.0, 1.0]).with_coord_system(Some(cs));
        let cube = Cube::new(RasterArray::from(Array2::<u8>::zeros((2, 2))), y, x).unwrap();
        assert!(grid_layout(&cube).unwrap_err().to_string().contains("units"));
    }

    #[test]
    fn test_int8_rejected_before_writing() {
        let data = Array2::<i8>::zeros((2, 2));
        let cube = Cube::new(
            RasterArray::from(data),
            coord(Axis::Y, vec![0.0, 1.0]),
            coord(Axis::X, vec![0.0, 1.0]),
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int8.tif");
        let err = export_geotiff(&cube, &path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert!(err.to_string().contains("int8"));
        assert!(!path.exists());
    }

    #[test]
    fn test_rotated_pole_rejected() {
        let cs = CoordSystem::RotatedGeodetic(RotatedGeogCs {
            grid_north_pole_latitude: 37.5,
            grid_north_pole_longitude: 177.5,
            north_pole_grid_longitude: 0.0,
            ellipsoid: GeogCs::sphere(6371229.0),
        });
        let y = coord(Axis::Y, vec![0.0, 1.0]).with_coord_system(Some(cs.clone()));
        let x = coord(Axis::X, vec![0.0, 1.0]).with_coord_system(Some(cs));
        let cube = Cube::new(RasterArray::from(Array2::<u8>::zeros((2, 2))), y, x).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = export_geotiff(&cube, dir.path().join("rotated.tif")).unwrap_err();
        assert!(matches!(err, RasterCubeError::UnsupportedCoordSystem(_)));
    }

    #[test]
    fn test_single_cell_layout() {
        let mut y = Coordinate::new(Axis::Y, Array1::from(vec![10.0]));
        y = y.with_bounds(ndarray::array![[15.0, 5.0]]).unwrap();
        let mut x = Coordinate::new(Axis::X, Array1::from(vec![0.0]));
        x = x.with_bounds(ndarray::array![[-1.0, 1.0]]).unwrap();
        let cube = Cube::new(RasterArray::from(Array2::<f32>::zeros((1, 1))), y, x).unwrap();
        let layout = grid_layout(&cube).unwrap();
        assert_eq!(layout.geotransform.to_gdal(), [-1.0, 2.0, 0.0, 15.0, 0.0, -10.0]);
        assert!(!layout.flip_rows);
    }
}
