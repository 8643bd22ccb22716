use crate::array::DataType;
use crate::cube::{Coordinate, Cube};
use crate::error::{RasterCubeError, Result};
use crate::lazy::LazyArray;
use crate::projection::resolve_grid;
use crate::proxy::DeferredRasterProxy;
use gdal::{Dataset, Metadata};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// GDAL's transform for rasters that carry none.
const DEFAULT_GEOTRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct BandMetadata {
    pub data_type: DataType,
    pub no_data: Option<f64>,
    pub description: String,
}

/// Everything the importer needs from a dataset, read without touching pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub bands: Vec<BandMetadata>,
}

impl RasterMetadata {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let (width, height) = dataset.raster_size();
        let geotransform = dataset.geo_transform().unwrap_or_else(|e| {
            debug!("No geotransform ({}), using pixel coordinates", e);
            DEFAULT_GEOTRANSFORM
        });

        let mut bands = Vec::with_capacity(dataset.raster_count());
        for index in 1..=dataset.raster_count() {
            let band = dataset.rasterband(index)?;
            bands.push(BandMetadata {
                data_type: DataType::from_gdal(band.band_type())?,
                no_data: band.no_data_value(),
                description: band.description().unwrap_or_default(),
            });
        }

        Ok(Self {
            width,
            height,
            geotransform,
            projection: dataset.projection(),
            bands,
        })
    }
}

pub fn open_dataset(path: &Path) -> Result<Dataset> {
    Dataset::open(path).map_err(|source| RasterCubeError::OpenFailed {
        path: path.display().to_string(),
        source,
    })
}

/// Cubes of a raster file, one per band in band order.
///
/// Pixel data is not read; each cube holds a lazy array over a
/// [`DeferredRasterProxy`].
#[derive(Debug)]
pub struct RasterCubes {
    path: PathBuf,
    shape: (usize, usize),
    y: Coordinate,
    x: Coordinate,
    bands: std::iter::Enumerate<std::vec::IntoIter<BandMetadata>>,
}

impl Iterator for RasterCubes {
    type Item = Cube;

    fn next(&mut self) -> Option<Cube> {
        let (offset, band) = self.bands.next()?;
        let band_index = offset + 1;
        debug!("Building cube for band {} of {}", band_index, self.path.display());

        let proxy = DeferredRasterProxy::new(
            self.shape,
            band.data_type,
            self.path.clone(),
            band_index,
            band.no_data,
        );
        let data = LazyArray::new(Arc::new(proxy));
        let mut cube = Cube::from_resolved(data.into(), self.y.clone(), self.x.clone());
        if !band.description.is_empty() {
            cube.name = Some(band.description);
        }
        Some(cube)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bands.size_hint()
    }
}

impl ExactSizeIterator for RasterCubes {}

/// Assemble the band cubes of `path` from already-read metadata.
pub fn cubes_from_metadata(path: &Path, metadata: RasterMetadata) -> Result<RasterCubes> {
    let (y, x) = resolve_grid(
        &metadata.projection,
        metadata.geotransform,
        metadata.width,
        metadata.height,
    )?;
    Ok(RasterCubes {
        path: path.to_path_buf(),
        shape: (metadata.height, metadata.width),
        y,
        x,
        bands: metadata.bands.into_iter().enumerate(),
    })
}

/// Open a raster and return its cubes.
///
/// Metadata and coordinates are resolved here, so open, rotation and
/// projection failures surface immediately; the dataset is closed before
/// returning. A raster without bands yields no cubes.
pub fn load_cubes(path: impl AsRef<Path>) -> Result<RasterCubes> {
    let path = path.as_ref();
    info!("Opening raster: {}", path.display());

    let metadata = {
        let dataset = open_dataset(path)?;
        RasterMetadata::from_dataset(&dataset)?
    };
    debug!(
        "Raster {}x{} with {} band(s)",
        metadata.width,
        metadata.height,
        metadata.bands.len()
    );

    cubes_from_metadata(path, metadata)
}
