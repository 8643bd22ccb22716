use thiserror::Error;

/// Broad failure category, mirroring the io / value / runtime split callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Value,
    Runtime,
}

#[derive(Error, Debug)]
pub enum RasterCubeError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Proxy serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("gdal failed to open raster image: {path}")]
    OpenFailed {
        path: String,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("No registered format can load {0}")]
    NoMatchingFormat(String),

    #[error("Rotation not supported: ({0}, {1})")]
    RotationNotSupported(f64, f64),

    #[error("Malformed geotransform: {0}")]
    MalformedGeoTransform(String),

    #[error("Projection information not currently in lookup table: {0}")]
    UnknownProjection(String),

    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),

    #[error("Coordinate {0:?} must have two bounds per point")]
    MissingBounds(String),

    #[error("Coordinate {name:?} is invalid: {reason}")]
    InvalidCoordinate { name: String, reason: String },

    #[error("The X and Y coordinates must share a CoordSystem")]
    CoordSystemMismatch,

    #[error("Coordinate system cannot be written as WKT: {0}")]
    UnsupportedCoordSystem(String),

    #[error("Data shape {data:?} does not match coordinate lengths {coords:?}")]
    ShapeMismatch {
        data: (usize, usize),
        coords: (usize, usize),
    },

    #[error("Slice [{start}..{end}] is out of range for axis of length {len}")]
    InvalidSlice { start: usize, end: usize, len: usize },

    #[error("Expected {expected} bytes for the array, got {actual}")]
    ByteLengthMismatch { expected: usize, actual: usize },

    #[error("Fill value {0} is not representable as {1}")]
    InvalidFillValue(f64, &'static str),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),

    #[error("Invalid tile size: {0} (must be multiple of 16)")]
    InvalidTileSize(usize),
}

impl RasterCubeError {
    pub fn kind(&self) -> ErrorKind {
        use RasterCubeError::*;
        match self {
            Io(_) | OpenFailed { .. } | NoMatchingFormat(_) => ErrorKind::Io,
            Gdal(_) | Serialization(_) | UnknownProjection(_) => ErrorKind::Runtime,
            ShapeError(_)
            | RotationNotSupported(..)
            | MalformedGeoTransform(_)
            | UnsupportedDtype(_)
            | MissingBounds(_)
            | InvalidCoordinate { .. }
            | CoordSystemMismatch
            | UnsupportedCoordSystem(_)
            | ShapeMismatch { .. }
            | InvalidSlice { .. }
            | ByteLengthMismatch { .. }
            | InvalidFillValue(..)
            | InvalidCompression(_)
            | InvalidTileSize(_) => ErrorKind::Value,
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterCubeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_message_names_both_terms() {
        let err = RasterCubeError::RotationNotSupported(1.0, 1.0);
        assert_eq!(err.to_string(), "Rotation not supported: (1, 1)");
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_unknown_projection_is_runtime() {
        let err = RasterCubeError::UnknownProjection("GEOGCS[]".to_string());
        assert!(err
            .to_string()
            .contains("not currently in lookup table"));
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }
}
