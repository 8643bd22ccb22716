use crate::array::{DataType, MaskedArray, RasterArray};
use crate::crs::CoordSystem;
use crate::error::{RasterCubeError, Result};
use crate::lazy::{resolve_range, LazyArray};
use ndarray::{s, Array1, Array2};
use std::borrow::Cow;
use std::ops::{Range, RangeBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Dimension coordinate: one per cube axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub axis: Axis,
    pub points: Array1<f64>,
    /// `[n, 2]` cell bounds, ordered like the points.
    pub bounds: Option<Array2<f64>>,
    pub standard_name: Option<String>,
    pub units: String,
    pub coord_system: Option<CoordSystem>,
}

impl Coordinate {
    pub fn new(axis: Axis, points: impl Into<Array1<f64>>) -> Self {
        Self {
            axis,
            points: points.into(),
            bounds: None,
            standard_name: None,
            units: "unknown".to_string(),
            coord_system: None,
        }
    }

    pub fn with_standard_name(mut self, standard_name: impl Into<String>) -> Self {
        self.standard_name = Some(standard_name.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_coord_system(mut self, coord_system: Option<CoordSystem>) -> Self {
        self.coord_system = coord_system;
        self
    }

    pub fn with_bounds(mut self, bounds: Array2<f64>) -> Result<Self> {
        self.check_bounds(&bounds)?;
        self.bounds = Some(bounds);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Standard name, or `x`/`y` when there is none.
    pub fn name(&self) -> String {
        match (&self.standard_name, self.axis) {
            (Some(name), _) => name.clone(),
            (None, Axis::X) => "x".to_string(),
            (None, Axis::Y) => "y".to_string(),
        }
    }

    pub fn is_increasing(&self) -> bool {
        self.points.len() < 2 || self.points[1] > self.points[0]
    }

    /// Contiguous bounds halfway between neighbouring points, with the outer
    /// edges extrapolated by half the adjacent spacing.
    pub fn guess_bounds(&mut self) -> Result<()> {
        let n = self.points.len();
        if n < 2 {
            return Err(RasterCubeError::InvalidCoordinate {
                name: self.name(),
                reason: "cannot guess bounds from fewer than two points".to_string(),
            });
        }
        let p = &self.points;
        let mut edges = Vec::with_capacity(n + 1);
        edges.push(p[0] - (p[1] - p[0]) / 2.0);
        for i in 1..n {
            edges.push((p[i - 1] + p[i]) / 2.0);
        }
        edges.push(p[n - 1] + (p[n - 1] - p[n - 2]) / 2.0);

        let bounds = Array2::from_shape_fn((n, 2), |(i, j)| edges[i + j]);
        self.check_bounds(&bounds)?;
        self.bounds = Some(bounds);
        Ok(())
    }

    pub fn slice(&self, range: Range<usize>) -> Coordinate {
        Coordinate {
            points: self.points.slice(s![range.clone()]).to_owned(),
            bounds: self
                .bounds
                .as_ref()
                .map(|b| b.slice(s![range, ..]).to_owned()),
            ..self.clone()
        }
    }

    pub fn reversed(&self) -> Coordinate {
        Coordinate {
            points: self.points.slice(s![..;-1]).to_owned(),
            bounds: self.bounds.as_ref().map(|b| b.slice(s![..;-1, ..;-1]).to_owned()),
            ..self.clone()
        }
    }

    fn check_points(&self) -> Result<()> {
        let increasing = self.is_increasing();
        let monotonic = self.points.windows(2).into_iter().all(|w| {
            if increasing {
                w[1] > w[0]
            } else {
                w[1] < w[0]
            }
        });
        if !monotonic {
            return Err(RasterCubeError::InvalidCoordinate {
                name: self.name(),
                reason: "points must be strictly monotonic".to_string(),
            });
        }
        Ok(())
    }

    fn check_bounds(&self, bounds: &Array2<f64>) -> Result<()> {
        let invalid = |reason: &str| RasterCubeError::InvalidCoordinate {
            name: self.name(),
            reason: reason.to_string(),
        };
        if bounds.dim() != (self.points.len(), 2) {
            return Err(invalid("bounds must have shape [n, 2]"));
        }
        // A single point has no direction of its own; take it from its cell.
        let increasing = if self.points.len() == 1 {
            bounds[[0, 0]] <= bounds[[0, 1]]
        } else {
            self.is_increasing()
        };
        let ordered = |a: f64, b: f64| if increasing { a <= b } else { a >= b };
        for (i, cell) in bounds.outer_iter().enumerate() {
            if !ordered(cell[0], cell[1]) {
                return Err(invalid("bounds must be ordered like the points"));
            }
            if i > 0 && !ordered(bounds[[i - 1, 0]], cell[0]) {
                return Err(invalid("bounds must be monotonic"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum CubeData {
    Lazy(LazyArray),
    Real(MaskedArray),
}

impl CubeData {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            CubeData::Lazy(lazy) => lazy.shape(),
            CubeData::Real(real) => real.shape(),
        }
    }

    pub fn dtype(&self) -> DataType {
        match self {
            CubeData::Lazy(lazy) => lazy.dtype(),
            CubeData::Real(real) => real.dtype(),
        }
    }
}

impl From<LazyArray> for CubeData {
    fn from(lazy: LazyArray) -> Self {
        CubeData::Lazy(lazy)
    }
}

impl From<MaskedArray> for CubeData {
    fn from(real: MaskedArray) -> Self {
        CubeData::Real(real)
    }
}

impl From<RasterArray> for CubeData {
    fn from(array: RasterArray) -> Self {
        CubeData::Real(MaskedArray::new(array))
    }
}

/// 2-D cube with dimensions `(y, x)`.
#[derive(Debug, Clone)]
pub struct Cube {
    pub name: Option<String>,
    data: CubeData,
    y: Coordinate,
    x: Coordinate,
}

impl Cube {
    pub fn new(data: impl Into<CubeData>, y: Coordinate, x: Coordinate) -> Result<Self> {
        let data = data.into();
        for (coord, axis) in [(&y, Axis::Y), (&x, Axis::X)] {
            if coord.axis != axis {
                return Err(RasterCubeError::InvalidCoordinate {
                    name: coord.name(),
                    reason: format!("expected a {:?} axis coordinate", axis),
                });
            }
            coord.check_points()?;
        }
        if data.shape() != (y.len(), x.len()) {
            return Err(RasterCubeError::ShapeMismatch {
                data: data.shape(),
                coords: (y.len(), x.len()),
            });
        }
        Ok(Self {
            name: None,
            data,
            y,
            x,
        })
    }

    /// For coordinates built by the resolver, which are valid by construction.
    pub(crate) fn from_resolved(data: CubeData, y: Coordinate, x: Coordinate) -> Self {
        Self {
            name: None,
            data,
            y,
            x,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn coord(&self, axis: Axis) -> &Coordinate {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn x(&self) -> &Coordinate {
        &self.x
    }

    pub fn y(&self) -> &Coordinate {
        &self.y
    }

    pub fn has_lazy_data(&self) -> bool {
        matches!(self.data, CubeData::Lazy(_))
    }

    pub fn lazy_data(&self) -> Option<&LazyArray> {
        match &self.data {
            CubeData::Lazy(lazy) => Some(lazy),
            CubeData::Real(_) => None,
        }
    }

    /// Realise the data, replacing any lazy array so later calls do not read again.
    pub fn data(&mut self) -> Result<&MaskedArray> {
        if let CubeData::Lazy(lazy) = &self.data {
            let real = lazy.compute()?;
            self.data = CubeData::Real(real);
        }
        match &self.data {
            CubeData::Real(real) => Ok(real),
            CubeData::Lazy(_) => unreachable!("lazy data was just realised"),
        }
    }

    /// The realised data without caching it on the cube.
    pub fn materialized(&self) -> Result<Cow<'_, MaskedArray>> {
        match &self.data {
            CubeData::Lazy(lazy) => Ok(Cow::Owned(lazy.compute()?)),
            CubeData::Real(real) => Ok(Cow::Borrowed(real)),
        }
    }

    pub fn into_data(self) -> Result<MaskedArray> {
        match self.data {
            CubeData::Lazy(lazy) => lazy.compute(),
            CubeData::Real(real) => Ok(real),
        }
    }

    /// Sub-cube over `rows` (y) and `cols` (x). Lazy data stays lazy.
    pub fn slice(
        &self,
        rows: impl RangeBounds<usize>,
        cols: impl RangeBounds<usize>,
    ) -> Result<Cube> {
        let (n_rows, n_cols) = self.shape();
        let rows = resolve_range(rows, n_rows)?;
        let cols = resolve_range(cols, n_cols)?;
        let data = match &self.data {
            CubeData::Lazy(lazy) => CubeData::Lazy(lazy.slice(rows.clone(), cols.clone())?),
            CubeData::Real(real) => CubeData::Real(real.slice(rows.clone(), cols.clone())),
        };
        Ok(Cube {
            name: self.name.clone(),
            data,
            y: self.y.slice(rows),
            x: self.x.slice(cols),
        })
    }
}
