//! Array wire codec.
//!
//! An array travels as two parts: a small metadata record (element type tag
//! and per-dimension sizes) sent in headers, and the raw row-major payload
//! sent untouched as the body.

use bytes::Bytes;
use dx_common::{DxError, DxResult, ElementType, NDArray};

/// Header carrying the comma separated dimension sizes.
pub const DIMS_HEADER: &str = "x-ds-dims";
/// Header carrying the element type tag.
pub const TAG_HEADER: &str = "x-ds-tag";

/// Shape and type of an array payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayMetadata {
    pub dims: Vec<usize>,
    pub element_type: ElementType,
}

impl ArrayMetadata {
    /// Parse the two header values.
    pub fn parse(dims: &str, tag: &str) -> DxResult<Self> {
        let dims = dims
            .split(',')
            .map(|d| {
                d.trim()
                    .parse::<usize>()
                    .map_err(|_| DxError::malformed(format!("invalid dimension '{}'", d)))
            })
            .collect::<DxResult<Vec<_>>>()?;

        let tag = tag
            .trim()
            .parse::<i64>()
            .map_err(|_| DxError::malformed(format!("invalid type tag '{}'", tag)))?;

        Ok(Self {
            dims,
            element_type: ElementType::from_tag(tag)?,
        })
    }

    /// Header values as `(dims, tag)`.
    pub fn header_values(&self) -> (String, String) {
        let dims = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        (dims, self.element_type.tag().to_string())
    }
}

/// An array split into metadata and payload.
#[derive(Debug, Clone)]
pub struct EncodedArray {
    pub metadata: ArrayMetadata,
    pub payload: Bytes,
}

/// Split an array for transmission. The payload is shared, not copied.
pub fn encode(array: &NDArray) -> EncodedArray {
    EncodedArray {
        metadata: ArrayMetadata {
            dims: array.shape().to_vec(),
            element_type: array.element_type(),
        },
        payload: array.data().clone(),
    }
}

/// Rebuild an array from metadata and payload.
pub fn decode(metadata: ArrayMetadata, payload: Bytes) -> DxResult<NDArray> {
    NDArray::new(metadata.element_type, metadata.dims, payload)
}

/// Decode from raw header values.
pub fn decode_with_headers(dims: &str, tag: &str, payload: Bytes) -> DxResult<NDArray> {
    decode(ArrayMetadata::parse(dims, tag)?, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let meta = ArrayMetadata::parse("8,12", "11").unwrap();
        assert_eq!(meta.dims, vec![8, 12]);
        assert_eq!(meta.element_type, ElementType::F32);
        assert_eq!(meta.header_values(), ("8,12".to_string(), "11".to_string()));
    }

    #[test]
    fn test_parse_bad_headers() {
        assert!(matches!(
            ArrayMetadata::parse("8,x", "11"),
            Err(DxError::MalformedArray(_))
        ));
        assert!(matches!(
            ArrayMetadata::parse("", "11"),
            Err(DxError::MalformedArray(_))
        ));
        assert!(matches!(
            ArrayMetadata::parse("8", "float"),
            Err(DxError::MalformedArray(_))
        ));
        assert!(matches!(
            ArrayMetadata::parse("8", "99"),
            Err(DxError::UnknownElementType(99))
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let meta = ArrayMetadata::parse("3,2", "12").unwrap();
        let err = decode(meta, Bytes::from(vec![0u8; 47])).unwrap_err();
        assert!(matches!(err, DxError::MalformedArray(_)));
    }
}
