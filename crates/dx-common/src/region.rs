//! Box descriptors addressing rectangular array subregions.

use serde::{Deserialize, Serialize};

use crate::{DxError, DxResult};

/// One dimension of a box: first index and number of elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub start: i64,
    pub span: u64,
}

impl Extent {
    pub fn new(start: i64, span: u64) -> Self {
        Self { start, span }
    }

    /// Last index covered by this extent (inclusive), or `None` when the
    /// extent is empty or runs past `i64::MAX`.
    pub fn end(&self) -> Option<i64> {
        let last = i64::try_from(self.span.checked_sub(1)?).ok()?;
        self.start.checked_add(last)
    }
}

/// Canonical box descriptor: one [`Extent`] per dimension.
///
/// Serializes as `{"bounds":[{"start":s,"span":n},...]}`. Validity against
/// the real extent of a stored object is checked by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayBox {
    pub bounds: Vec<Extent>,
}

impl ArrayBox {
    /// Build a box from inclusive lower and upper bounds.
    ///
    /// Each span is `ub[i] - lb[i] + 1`. Bounds whose distance does not fit
    /// in an `i64` are rejected.
    pub fn from_bounds(lb: &[i64], ub: &[i64]) -> DxResult<Self> {
        if lb.len() != ub.len() {
            return Err(DxError::DimensionMismatch {
                left: lb.len(),
                right: ub.len(),
            });
        }

        let bounds = lb
            .iter()
            .zip(ub)
            .enumerate()
            .map(|(dim, (&l, &u))| {
                if u < l {
                    return Err(DxError::EmptyExtent {
                        dim,
                        detail: format!("upper bound {} is below lower bound {}", u, l),
                    });
                }
                let span = u
                    .checked_sub(l)
                    .and_then(|d| u64::try_from(d).ok())
                    .and_then(|d| d.checked_add(1))
                    .ok_or_else(|| DxError::ExtentOverflow {
                        dim,
                        detail: format!("{}..={} is too wide", l, u),
                    })?;
                Ok(Extent::new(l, span))
            })
            .collect::<DxResult<Vec<_>>>()?;

        Ok(Self { bounds })
    }

    /// Build a box covering an array of `shape` placed at `offset`.
    pub fn from_shape_offset(shape: &[usize], offset: &[i64]) -> DxResult<Self> {
        if shape.len() != offset.len() {
            return Err(DxError::DimensionMismatch {
                left: shape.len(),
                right: offset.len(),
            });
        }

        let bounds = shape
            .iter()
            .zip(offset)
            .enumerate()
            .map(|(dim, (&s, &o))| {
                if s == 0 {
                    return Err(DxError::EmptyExtent {
                        dim,
                        detail: "shape entry is zero".to_string(),
                    });
                }
                let extent = u64::try_from(s)
                    .ok()
                    .map(|span| Extent::new(o, span))
                    .filter(|e| e.end().is_some())
                    .ok_or_else(|| DxError::ExtentOverflow {
                        dim,
                        detail: format!("{} elements from offset {}", s, o),
                    })?;
                Ok(extent)
            })
            .collect::<DxResult<Vec<_>>>()?;

        Ok(Self { bounds })
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.bounds.len()
    }

    pub fn starts(&self) -> Vec<i64> {
        self.bounds.iter().map(|e| e.start).collect()
    }

    pub fn spans(&self) -> Vec<u64> {
        self.bounds.iter().map(|e| e.span).collect()
    }

    /// Inclusive upper bound of every dimension.
    pub fn upper_bounds(&self) -> DxResult<Vec<i64>> {
        self.bounds
            .iter()
            .enumerate()
            .map(|(dim, e)| {
                e.end().ok_or_else(|| DxError::ExtentOverflow {
                    dim,
                    detail: format!("start {} with span {}", e.start, e.span),
                })
            })
            .collect()
    }

    /// Spans as an array shape.
    pub fn shape(&self) -> Vec<usize> {
        self.bounds.iter().map(|e| e.span as usize).collect()
    }

    /// Total number of elements addressed.
    pub fn num_elements(&self) -> u64 {
        self.bounds.iter().map(|e| e.span).product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let b = ArrayBox::from_bounds(&[4, 8], &[6, 9]).unwrap();
        assert_eq!(b.bounds, vec![Extent::new(4, 3), Extent::new(8, 2)]);
        assert_eq!(b.upper_bounds().unwrap(), vec![6, 9]);
        assert_eq!(b.num_elements(), 6);
    }

    #[test]
    fn test_shape_offset() {
        let b = ArrayBox::from_shape_offset(&[9, 11], &[2, 1]).unwrap();
        assert_eq!(b.bounds, vec![Extent::new(2, 9), Extent::new(1, 11)]);
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(matches!(
            ArrayBox::from_bounds(&[0, 0], &[1]),
            Err(DxError::DimensionMismatch { left: 2, right: 1 })
        ));
        assert!(matches!(
            ArrayBox::from_shape_offset(&[3], &[0, 0]),
            Err(DxError::DimensionMismatch { left: 1, right: 2 })
        ));
    }

    #[test]
    fn test_empty_extent_rejected() {
        assert!(matches!(
            ArrayBox::from_bounds(&[5, 0], &[4, 0]),
            Err(DxError::EmptyExtent { dim: 0, .. })
        ));
        assert!(matches!(
            ArrayBox::from_shape_offset(&[3, 0], &[0, 0]),
            Err(DxError::EmptyExtent { dim: 1, .. })
        ));
    }

    #[test]
    fn test_extent_end_edges() {
        assert_eq!(Extent::new(i64::MAX, 1).end(), Some(i64::MAX));
        assert_eq!(Extent::new(i64::MIN, 1).end(), Some(i64::MIN));
        assert_eq!(Extent::new(i64::MAX, 2).end(), None);
        assert_eq!(Extent::new(0, u64::MAX).end(), None);
        assert_eq!(Extent::new(3, 0).end(), None);
    }

    #[test]
    fn test_wire_shape() {
        let b = ArrayBox::from_bounds(&[116, 412], &[123, 423]).unwrap();
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"bounds": [{"start": 116, "span": 8}, {"start": 412, "span": 12}]})
        );
    }
}
