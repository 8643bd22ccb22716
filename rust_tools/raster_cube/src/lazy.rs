use crate::array::{DataType, MaskedArray};
use crate::error::{RasterCubeError, Result};
use std::fmt;
use std::ops::{Bound, Range, RangeBounds};
use std::sync::Arc;

/// Something that can materialise a rectangular window of a 2-D array on demand.
pub trait ArraySource: fmt::Debug + Send + Sync {
    /// Full `(rows, cols)` shape of the source.
    fn shape(&self) -> (usize, usize);

    fn dtype(&self) -> DataType;

    /// Materialise `rows` x `cols` of the source. Both ranges are in source
    /// coordinates and have already been checked against [`ArraySource::shape`].
    fn read(&self, rows: Range<usize>, cols: Range<usize>) -> Result<MaskedArray>;
}

/// A deferred view onto an [`ArraySource`].
///
/// Slicing narrows the recorded window and never touches the source; only
/// [`LazyArray::compute`] reads.
#[derive(Debug, Clone)]
pub struct LazyArray {
    source: Arc<dyn ArraySource>,
    rows: Range<usize>,
    cols: Range<usize>,
}

impl LazyArray {
    pub fn new(source: Arc<dyn ArraySource>) -> Self {
        let (rows, cols) = source.shape();
        Self {
            source,
            rows: 0..rows,
            cols: 0..cols,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    pub fn dtype(&self) -> DataType {
        self.source.dtype()
    }

    /// Narrow the view. Ranges are relative to this view, not the source.
    pub fn slice(
        &self,
        rows: impl RangeBounds<usize>,
        cols: impl RangeBounds<usize>,
    ) -> Result<LazyArray> {
        let rows = resolve_range(rows, self.rows.len())?;
        let cols = resolve_range(cols, self.cols.len())?;
        Ok(LazyArray {
            source: Arc::clone(&self.source),
            rows: self.rows.start + rows.start..self.rows.start + rows.end,
            cols: self.cols.start + cols.start..self.cols.start + cols.end,
        })
    }

    pub fn compute(&self) -> Result<MaskedArray> {
        self.source.read(self.rows.clone(), self.cols.clone())
    }
}

/// Turn any `RangeBounds` into a concrete range within `0..len`.
pub(crate) fn resolve_range(range: impl RangeBounds<usize>, len: usize) -> Result<Range<usize>> {
    let overflow = || RasterCubeError::InvalidSlice {
        start: usize::MAX,
        end: usize::MAX,
        len,
    };
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.checked_add(1).ok_or_else(overflow)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.checked_add(1).ok_or_else(overflow)?,
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    if start > end || end > len {
        return Err(RasterCubeError::InvalidSlice { start, end, len });
    }
    Ok(start..end)
}
