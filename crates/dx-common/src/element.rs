//! Numeric element types and their wire tags.
//!
//! Both ends of the protocol agree on this table. Tags are the native numeric
//! type numbers used by the data service; the table may only grow together
//! with [`ELEMENT_TABLE_VERSION`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DxError, DxResult};

/// Version of the tag table below.
pub const ELEMENT_TABLE_VERSION: u32 = 1;

/// Numeric type of every element in an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ElementType {
    /// All supported types, in tag order.
    pub const ALL: [ElementType; 10] = [
        ElementType::I8,
        ElementType::U8,
        ElementType::I16,
        ElementType::U16,
        ElementType::I32,
        ElementType::U32,
        ElementType::I64,
        ElementType::U64,
        ElementType::F32,
        ElementType::F64,
    ];

    /// Wire tag for this type.
    pub fn tag(&self) -> u8 {
        match self {
            ElementType::I8 => 1,
            ElementType::U8 => 2,
            ElementType::I16 => 3,
            ElementType::U16 => 4,
            ElementType::I32 => 5,
            ElementType::U32 => 6,
            ElementType::I64 => 7,
            ElementType::U64 => 8,
            ElementType::F32 => 11,
            ElementType::F64 => 12,
        }
    }

    /// Look up a type by wire tag.
    pub fn from_tag(tag: i64) -> DxResult<Self> {
        match tag {
            1 => Ok(ElementType::I8),
            2 => Ok(ElementType::U8),
            3 => Ok(ElementType::I16),
            4 => Ok(ElementType::U16),
            5 => Ok(ElementType::I32),
            6 => Ok(ElementType::U32),
            7 => Ok(ElementType::I64),
            8 => Ok(ElementType::U64),
            11 => Ok(ElementType::F32),
            12 => Ok(ElementType::F64),
            other => Err(DxError::UnknownElementType(other)),
        }
    }

    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::U64 | ElementType::F64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::I8 => "i8",
            ElementType::U8 => "u8",
            ElementType::I16 => "i16",
            ElementType::U16 => "u16",
            ElementType::I32 => "i32",
            ElementType::U32 => "u32",
            ElementType::I64 => "i64",
            ElementType::U64 => "u64",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        }
    }

    /// Parse a type name such as `f32`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust primitive that can be stored as an array element.
pub trait Element: bytemuck::Pod {
    const TYPE: ElementType;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;
            }
        )*
    };
}

impl_element!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);
