//! Format registration for generic "load any supported file" dispatch.
//!
//! Nothing is registered implicitly; applications call
//! [`register_raster_format`] on their own registry during start-up.

use crate::cube::Cube;
use crate::error::{RasterCubeError, Result};
use crate::io::load_cubes;
use gdal::Dataset;
use log::debug;
use std::path::Path;

pub type CubeStream = Box<dyn Iterator<Item = Cube>>;

#[derive(Debug, Clone)]
pub struct FormatSpecification {
    pub name: &'static str,
    /// Higher wins when several formats claim a file.
    pub priority: i32,
    pub identify: fn(&Path) -> bool,
    pub load: fn(&Path) -> Result<CubeStream>,
}

#[derive(Debug, Default)]
pub struct FormatRegistry {
    specs: Vec<FormatSpecification>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_spec(&mut self, spec: FormatSpecification) {
        debug!("Registering format {} (priority {})", spec.name, spec.priority);
        self.specs.push(spec);
    }

    pub fn specifications(&self) -> &[FormatSpecification] {
        &self.specs
    }

    /// Highest-priority format whose predicate accepts `path`; ties go to the
    /// earliest registration.
    pub fn find(&self, path: &Path) -> Option<&FormatSpecification> {
        let mut best: Option<&FormatSpecification> = None;
        for spec in self.specs.iter().filter(|s| (s.identify)(path)) {
            if best.map_or(true, |b| spec.priority > b.priority) {
                best = Some(spec);
            }
        }
        best
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<CubeStream> {
        let path = path.as_ref();
        let spec = self
            .find(path)
            .ok_or_else(|| RasterCubeError::NoMatchingFormat(path.display().to_string()))?;
        debug!("Loading {} as {}", path.display(), spec.name);
        (spec.load)(path)
    }
}

/// Whether GDAL claims `path`.
///
/// Only GDAL's "not recognized as a supported file format" failure rejects the
/// file. Other open errors (missing file, permissions) still claim it, so they
/// surface from the loader instead of as "no matching format".
pub fn gdal_can_open(path: &Path) -> bool {
    match Dataset::open(path) {
        Ok(_) => true,
        Err(e) => {
            let message = e.to_string();
            let unrecognised =
                message.contains("not recognized as") && message.contains("supported file format");
            debug!("GDAL cannot open {}: {}", path.display(), message);
            !unrecognised
        }
    }
}

fn load_raster(path: &Path) -> Result<CubeStream> {
    Ok(Box::new(load_cubes(path)?))
}

pub fn raster_format() -> FormatSpecification {
    FormatSpecification {
        name: "gdal",
        priority: 2,
        identify: gdal_can_open,
        load: load_raster,
    }
}

pub fn register_raster_format(registry: &mut FormatRegistry) {
    registry.add_spec(raster_format());
}
