// Load GDAL rasters as lazily-read 2-D cubes and export cubes as GeoTIFF

pub mod array;
pub mod crs;
pub mod cube;
pub mod error;
pub mod export;
pub mod io;
pub mod lazy;
pub mod options;
pub mod projection;
pub mod proxy;
pub mod registry;

// Re-export commonly used types
pub use array::{ByteOrder, DataType, MaskedArray, RasterArray};
pub use crs::{AxisMetadata, CoordSystem, GeogCs, RotatedGeogCs, TransverseMercator};
pub use cube::{Axis, Coordinate, Cube, CubeData};
pub use error::{ErrorKind, RasterCubeError, Result};
pub use export::{export_geotiff, export_geotiff_with_options};
pub use io::{load_cubes, RasterCubes, RasterMetadata};
pub use lazy::{ArraySource, LazyArray};
pub use options::{Compression, GeoTiffOptions};
pub use projection::GeoTransform;
pub use proxy::DeferredRasterProxy;
pub use registry::{register_raster_format, FormatRegistry, FormatSpecification};
