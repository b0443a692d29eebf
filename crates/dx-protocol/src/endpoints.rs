//! Request routes of the data service.
//!
//! Routes are relative to the service's API root (`dspaces` by default):
//!
//! | operation | method | path |
//! |-----------|--------|------|
//! | read      | POST   | `obj/{name}/{version}[?namespace=ns]` |
//! | write     | PUT    | `obj/{name}/{version}?element_size=N&element_type=T[&namespace=ns]` |
//! | exec      | POST   | `exec/` |
//! | variables | GET    | `var/` |
//! | objects   | GET    | `var/{name}/` |
//! | register  | POST   | `register/{type}/{name}` |

use dx_common::{ElementType, ObjectRef};

/// Default API root under which all routes live.
pub const DEFAULT_API_ROOT: &str = "dspaces";

/// HTTP method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

/// A route: method, path segments (unencoded) and query pairs.
///
/// A trailing empty segment renders as a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
        }
    }

    fn with_namespace(mut self, namespace: Option<&str>) -> Self {
        if let Some(ns) = namespace {
            self.query.push(("namespace", ns.to_string()));
        }
        self
    }

    /// Read a region of an object. Body: box descriptor.
    pub fn read(object: &ObjectRef) -> Self {
        let version = object.version.to_string();
        Self::new(Method::Post, &["obj", &object.name, &version])
            .with_namespace(object.namespace.as_deref())
    }

    /// Write a region of an object. Body: multipart `box` + `data`.
    pub fn write(object: &ObjectRef, element_type: ElementType) -> Self {
        let version = object.version.to_string();
        let mut endpoint = Self::new(Method::Put, &["obj", &object.name, &version]);
        endpoint
            .query
            .push(("element_size", element_type.size().to_string()));
        endpoint
            .query
            .push(("element_type", element_type.tag().to_string()));
        endpoint.with_namespace(object.namespace.as_deref())
    }

    /// Submit a remote execution. Body: multipart `requests` + `fn`.
    pub fn exec() -> Self {
        Self::new(Method::Post, &["exec", ""])
    }

    /// List known variable names.
    pub fn variables() -> Self {
        Self::new(Method::Get, &["var", ""])
    }

    /// List the objects stored under a variable name.
    pub fn variable_objects(name: &str) -> Self {
        Self::new(Method::Get, &["var", name, ""])
    }

    /// Register an externally located dataset. Body: JSON parameters.
    pub fn register(kind: &str, name: &str) -> Self {
        Self::new(Method::Post, &["register", kind, name])
    }

    /// Path relative to the API root, without percent-encoding.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_route() {
        let obj = ObjectRef::new("v:tas,m:ACCESS-ESM1-5", 42).in_namespace("cmip6-planetary");
        let ep = Endpoint::read(&obj);
        assert_eq!(ep.method, Method::Post);
        assert_eq!(ep.path(), "obj/v:tas,m:ACCESS-ESM1-5/42");
        assert_eq!(ep.query, vec![("namespace", "cmip6-planetary".to_string())]);
    }

    #[test]
    fn test_write_route() {
        let ep = Endpoint::write(&ObjectRef::new("ex_api2", 1), ElementType::I64);
        assert_eq!(ep.method, Method::Put);
        assert_eq!(ep.path(), "obj/ex_api2/1");
        assert_eq!(
            ep.query,
            vec![
                ("element_size", "8".to_string()),
                ("element_type", "7".to_string())
            ]
        );
    }

    #[test]
    fn test_trailing_slash_routes() {
        assert_eq!(Endpoint::exec().path(), "exec/");
        assert_eq!(Endpoint::variables().path(), "var/");
        assert_eq!(Endpoint::variable_objects("ex_api3").path(), "var/ex_api3/");
        assert_eq!(Endpoint::register("s3nc", "foo").path(), "register/s3nc/foo");
    }
}
