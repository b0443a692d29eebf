//! Identities of remote objects and execution arguments.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::region::ArrayBox;
use crate::DxResult;

/// A named, versioned array object on the data service.
///
/// `namespace = None` addresses the default global scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            namespace: None,
        }
    }

    /// Scope this reference to a namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}@{}", ns, self.name, self.version),
            None => write!(f, "{}@{}", self.name, self.version),
        }
    }
}

/// One positional argument of a remote execution: an object and the region of it to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecArg {
    pub object: ObjectRef,
    pub region: ArrayBox,
}

impl ExecArg {
    pub fn new(object: ObjectRef, region: ArrayBox) -> Self {
        Self { object, region }
    }

    /// Build an argument from inclusive lower/upper bounds.
    pub fn from_bounds(
        name: impl Into<String>,
        version: u32,
        lb: &[i64],
        ub: &[i64],
        namespace: Option<&str>,
    ) -> DxResult<Self> {
        let mut object = ObjectRef::new(name, version);
        object.namespace = namespace.map(str::to_string);
        Ok(Self {
            object,
            region: ArrayBox::from_bounds(lb, ub)?,
        })
    }
}

/// Handle returned when an external dataset is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegHandle {
    /// Namespace allocated for the registered dataset.
    pub namespace: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Extent;

    #[test]
    fn test_exec_arg_from_bounds() {
        let arg = ExecArg::from_bounds("ex_api2", 1, &[4, 8], &[6, 9], None).unwrap();
        assert_eq!(arg.object, ObjectRef::new("ex_api2", 1));
        assert_eq!(arg.region.bounds, vec![Extent::new(4, 3), Extent::new(8, 2)]);

        assert!(ExecArg::from_bounds("x", 0, &[0], &[0, 1], None).is_err());
    }

    #[test]
    fn test_object_display() {
        let obj = ObjectRef::new("v:tas", 7).in_namespace("cmip6-planetary");
        assert_eq!(obj.to_string(), "cmip6-planetary/v:tas@7");
        assert_eq!(ObjectRef::new("a", 0).to_string(), "a@0");
    }

    #[test]
    fn test_reg_handle_deserialize() {
        let handle: RegHandle = serde_json::from_str(
            r#"{"namespace": "s3nc-foo", "parameters": {"bucket": "noaa-goes17"}}"#,
        )
        .unwrap();
        assert_eq!(handle.namespace, "s3nc-foo");
        assert_eq!(handle.parameters["bucket"], "noaa-goes17");
    }
}
