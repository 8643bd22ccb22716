use crate::error::{RasterCubeError, Result};
use gdal::spatial_ref::SpatialRef;
use log::{debug, warn};

/// Relative tolerance for comparing projection parameters against known definitions.
/// WKT round trips through GDAL print a limited number of digits.
pub const REL_TOLERANCE: f64 = 1e-6;

/// Radians per degree.
const DEGREE: f64 = std::f64::consts::PI / 180.0;

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= REL_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Ellipsoid (or sphere) defining a geodetic coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct GeogCs {
    pub semi_major_axis: f64,
    pub semi_minor_axis: f64,
    /// Zero for a sphere.
    pub inverse_flattening: f64,
}

impl GeogCs {
    pub fn sphere(radius: f64) -> Self {
        Self {
            semi_major_axis: radius,
            semi_minor_axis: radius,
            inverse_flattening: 0.0,
        }
    }

    pub fn from_inverse_flattening(semi_major_axis: f64, inverse_flattening: f64) -> Self {
        let semi_minor_axis = if inverse_flattening == 0.0 {
            semi_major_axis
        } else {
            semi_major_axis - semi_major_axis / inverse_flattening
        };
        Self {
            semi_major_axis,
            semi_minor_axis,
            inverse_flattening,
        }
    }

    pub fn from_semi_minor_axis(semi_major_axis: f64, semi_minor_axis: f64) -> Self {
        let inverse_flattening = if semi_major_axis == semi_minor_axis {
            0.0
        } else {
            semi_major_axis / (semi_major_axis - semi_minor_axis)
        };
        Self {
            semi_major_axis,
            semi_minor_axis,
            inverse_flattening,
        }
    }

    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening == 0.0
    }

    fn approx_eq(&self, other: &GeogCs) -> bool {
        approx_eq(self.semi_major_axis, other.semi_major_axis)
            && approx_eq(self.inverse_flattening, other.inverse_flattening)
    }

    /// PROJ.4 ellipsoid terms, `+a`/`+b` for a sphere and `+a`/`+rf` otherwise.
    fn proj4_ellipsoid(&self) -> String {
        if self.is_sphere() {
            format!("+a={} +b={}", self.semi_major_axis, self.semi_major_axis)
        } else {
            format!("+a={} +rf={}", self.semi_major_axis, self.inverse_flattening)
        }
    }

    pub fn to_proj4(&self) -> String {
        format!("+proj=longlat {} +no_defs", self.proj4_ellipsoid())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotatedGeogCs {
    pub grid_north_pole_latitude: f64,
    pub grid_north_pole_longitude: f64,
    pub north_pole_grid_longitude: f64,
    pub ellipsoid: GeogCs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    pub latitude_of_projection_origin: f64,
    pub longitude_of_central_meridian: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub scale_factor_at_central_meridian: f64,
    pub ellipsoid: GeogCs,
}

impl TransverseMercator {
    fn approx_eq(&self, other: &TransverseMercator) -> bool {
        approx_eq(self.latitude_of_projection_origin, other.latitude_of_projection_origin)
            && approx_eq(self.longitude_of_central_meridian, other.longitude_of_central_meridian)
            && approx_eq(self.false_easting, other.false_easting)
            && approx_eq(self.false_northing, other.false_northing)
            && approx_eq(
                self.scale_factor_at_central_meridian,
                other.scale_factor_at_central_meridian,
            )
            && self.ellipsoid.approx_eq(&other.ellipsoid)
    }

    pub fn to_proj4(&self) -> String {
        format!(
            "+proj=tmerc +lat_0={} +lon_0={} +k={} +x_0={} +y_0={} {} +units=m +no_defs",
            self.latitude_of_projection_origin,
            self.longitude_of_central_meridian,
            self.scale_factor_at_central_meridian,
            self.false_easting,
            self.false_northing,
            self.ellipsoid.proj4_ellipsoid()
        )
    }
}

/// Coordinate reference system attached to a cube's coordinates.
/// Equality is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordSystem {
    Geodetic(GeogCs),
    RotatedGeodetic(RotatedGeogCs),
    TransverseMercator(TransverseMercator),
}

/// Standard name and units for one horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMetadata {
    pub standard_name: &'static str,
    pub units: &'static str,
}

impl CoordSystem {
    /// `(x, y)` axis metadata for grids defined on this system.
    pub fn axis_metadata(&self) -> (AxisMetadata, AxisMetadata) {
        match self {
            CoordSystem::Geodetic(_) => (
                AxisMetadata { standard_name: "longitude", units: "degree_east" },
                AxisMetadata { standard_name: "latitude", units: "degree_north" },
            ),
            CoordSystem::RotatedGeodetic(_) => (
                AxisMetadata { standard_name: "grid_longitude", units: "degrees" },
                AxisMetadata { standard_name: "grid_latitude", units: "degrees" },
            ),
            CoordSystem::TransverseMercator(_) => (
                AxisMetadata { standard_name: "projection_x_coordinate", units: "m" },
                AxisMetadata { standard_name: "projection_y_coordinate", units: "m" },
            ),
        }
    }

    pub fn to_spatial_ref(&self) -> Result<SpatialRef> {
        let proj4 = match self {
            CoordSystem::Geodetic(cs) => cs.to_proj4(),
            CoordSystem::TransverseMercator(tm) => tm.to_proj4(),
            CoordSystem::RotatedGeodetic(_) => {
                return Err(RasterCubeError::UnsupportedCoordSystem(
                    "rotated pole has no GeoTIFF form".to_string(),
                ))
            }
        };
        debug!("Building spatial reference from {}", proj4);
        Ok(SpatialRef::from_proj4(&proj4)?)
    }

    /// WKT understood by GDAL's `SetProjection`.
    pub fn to_wkt(&self) -> Result<String> {
        Ok(self.to_spatial_ref()?.to_wkt()?)
    }

    fn approx_eq(&self, other: &CoordSystem) -> bool {
        match (self, other) {
            (CoordSystem::Geodetic(a), CoordSystem::Geodetic(b)) => a.approx_eq(b),
            (CoordSystem::TransverseMercator(a), CoordSystem::TransverseMercator(b)) => {
                a.approx_eq(b)
            }
            _ => false,
        }
    }

    /// Read a spatial reference as a candidate system, before table matching.
    /// `None` when it is outside what the table can describe.
    fn from_spatial_ref(srs: &SpatialRef) -> Result<Option<CoordSystem>> {
        if !approx_eq(srs.angular_units(), DEGREE) {
            debug!("Angular unit is not degrees: {}", srs.angular_units());
            return Ok(None);
        }
        let prime_meridian = srs
            .get_attr_value("PRIMEM", 1)?
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        if !approx_eq(prime_meridian, 0.0) {
            debug!("Prime meridian is not Greenwich: {}", prime_meridian);
            return Ok(None);
        }
        let ellipsoid = GeogCs::from_semi_minor_axis(srs.semi_major()?, srs.semi_minor()?);

        if srs.is_projected() {
            let method = srs.get_attr_value("PROJECTION", 0)?.unwrap_or_default();
            if !approx_eq(srs.linear_units(), 1.0)
                || !method.eq_ignore_ascii_case("Transverse_Mercator")
            {
                debug!("Unsupported projection {:?} ({} m per unit)", method, srs.linear_units());
                return Ok(None);
            }
            let param = |name: &str, default: f64| -> Result<f64> {
                Ok(srs.get_proj_param(name)?.unwrap_or(default))
            };
            Ok(Some(CoordSystem::TransverseMercator(TransverseMercator {
                latitude_of_projection_origin: param("latitude_of_origin", 0.0)?,
                longitude_of_central_meridian: param("central_meridian", 0.0)?,
                false_easting: param("false_easting", 0.0)?,
                false_northing: param("false_northing", 0.0)?,
                scale_factor_at_central_meridian: param("scale_factor", 1.0)?,
                ellipsoid,
            })))
        } else if srs.is_geographic() {
            Ok(Some(CoordSystem::Geodetic(ellipsoid)))
        } else {
            Ok(None)
        }
    }
}

/// An entry of the recognised-CRS table.
pub struct KnownCrs {
    pub name: &'static str,
    pub build: fn() -> CoordSystem,
}

fn wgs84() -> CoordSystem {
    CoordSystem::Geodetic(GeogCs::from_inverse_flattening(6378137.0, 298.257223563))
}

fn um_sphere() -> CoordSystem {
    CoordSystem::Geodetic(GeogCs::sphere(6371229.0))
}

fn osgb() -> CoordSystem {
    CoordSystem::TransverseMercator(TransverseMercator {
        latitude_of_projection_origin: 49.0,
        longitude_of_central_meridian: -2.0,
        false_easting: 400000.0,
        false_northing: -100000.0,
        scale_factor_at_central_meridian: 0.9996012717,
        ellipsoid: GeogCs::from_semi_minor_axis(6377563.396, 6356256.909),
    })
}

/// Recognised systems, tried in order; the first match wins.
pub const KNOWN_CRS: &[KnownCrs] = &[
    KnownCrs { name: "WGS84", build: wgs84 },
    KnownCrs { name: "UM sphere", build: um_sphere },
    KnownCrs { name: "OSGB 1936 / British National Grid", build: osgb },
];

/// Resolve a dataset projection string. An empty string means no CRS.
pub fn coord_system_from_wkt(wkt: &str) -> Result<Option<CoordSystem>> {
    if wkt.trim().is_empty() {
        return Ok(None);
    }
    let unknown = || RasterCubeError::UnknownProjection(wkt.to_string());

    let candidate = SpatialRef::from_wkt(wkt)
        .map_err(RasterCubeError::from)
        .and_then(|srs| CoordSystem::from_spatial_ref(&srs))
        .map_err(|e| {
            warn!("Failed to read projection WKT: {}", e);
            unknown()
        })?
        .ok_or_else(unknown)?;

    KNOWN_CRS
        .iter()
        .map(|known| (known.name, (known.build)()))
        .find(|(_, cs)| cs.approx_eq(&candidate))
        .map(|(name, cs)| {
            debug!("Projection matched {}", name);
            Some(cs)
        })
        .ok_or_else(unknown)
}
