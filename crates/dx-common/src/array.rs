//! N-dimensional array payloads.

use bytes::Bytes;

use crate::element::{Element, ElementType};
use crate::{DxError, DxResult};

/// A dense, row-major N-dimensional array in native byte order.
///
/// The buffer always holds exactly `product(shape) * element_type.size()` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct NDArray {
    element_type: ElementType,
    shape: Vec<usize>,
    data: Bytes,
}

impl NDArray {
    /// Wrap a raw buffer, checking it against the shape and element type.
    pub fn new(element_type: ElementType, shape: Vec<usize>, data: Bytes) -> DxResult<Self> {
        if shape.is_empty() {
            return Err(DxError::malformed("array must have at least one dimension"));
        }
        if let Some(dim) = shape.iter().position(|&s| s == 0) {
            return Err(DxError::malformed(format!("dimension {} has size zero", dim)));
        }

        let expected = expected_len(&shape, element_type)?;
        if data.len() != expected {
            return Err(DxError::malformed(format!(
                "payload is {} bytes, shape {:?} of {} needs {}",
                data.len(),
                shape,
                element_type,
                expected
            )));
        }

        Ok(Self {
            element_type,
            shape,
            data,
        })
    }

    /// Build an array from typed values.
    pub fn from_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> DxResult<Self> {
        let data = Bytes::copy_from_slice(bytemuck::cast_slice(&values));
        Self::new(T::TYPE, shape, data)
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Arrays always hold at least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Copy the elements out as `T`, which must match the element type.
    pub fn to_vec<T: Element>(&self) -> DxResult<Vec<T>> {
        if T::TYPE != self.element_type {
            return Err(DxError::malformed(format!(
                "array holds {}, requested {}",
                self.element_type,
                T::TYPE
            )));
        }

        // Copy through a zeroed vec; the payload need not be aligned for T.
        let mut out = vec![T::zeroed(); self.len()];
        bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(&self.data);
        Ok(out)
    }

    /// Convert every element to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        macro_rules! widen {
            ($ty:ty) => {{
                let size = std::mem::size_of::<$ty>();
                self.data
                    .chunks_exact(size)
                    .map(|c| <$ty>::from_ne_bytes(c.try_into().unwrap_or_default()) as f64)
                    .collect()
            }};
        }

        match self.element_type {
            ElementType::I8 => widen!(i8),
            ElementType::U8 => widen!(u8),
            ElementType::I16 => widen!(i16),
            ElementType::U16 => widen!(u16),
            ElementType::I32 => widen!(i32),
            ElementType::U32 => widen!(u32),
            ElementType::I64 => widen!(i64),
            ElementType::U64 => widen!(u64),
            ElementType::F32 => widen!(f32),
            ElementType::F64 => widen!(f64),
        }
    }
}

fn expected_len(shape: &[usize], element_type: ElementType) -> DxResult<usize> {
    shape
        .iter()
        .try_fold(element_type.size(), |acc, &s| acc.checked_mul(s))
        .ok_or_else(|| DxError::malformed(format!("shape {:?} overflows", shape)))
}
