//! In-memory data service for tests.
//!
//! Speaks the same HTTP protocol as a real deployment under the `dspaces`
//! root, holding objects in memory. Reads are composed from the newest write
//! covering each cell; executable units are evaluated in `f64`.

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dx_common::{ArrayBox, ElementType, NDArray};
use dx_protocol::exec::{decode_unit, ArgRequest, ExecRequests, ExecUnit, Expr};
use dx_protocol::{BOX_FIELD, DATA_FIELD, DIMS_HEADER, FUNCTION_FIELD, REQUESTS_FIELD, TAG_HEADER};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::debug;

/// Namespace + name + version.
type ObjectKey = (Option<String>, String, u32);

/// A request as the service saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Read {
        name: String,
        version: u32,
        namespace: Option<String>,
        region: ArrayBox,
    },
    Write {
        name: String,
        version: u32,
        namespace: Option<String>,
        region: ArrayBox,
        element_size: usize,
        element_type: i64,
        data: Vec<u8>,
    },
    Exec {
        requests: Vec<ArgRequest>,
        unit: ExecUnit,
    },
    Register {
        kind: String,
        name: String,
        parameters: Value,
    },
}

#[derive(Debug, Clone)]
struct Block {
    region: ArrayBox,
    data: Bytes,
}

#[derive(Debug, Clone)]
struct StoredObject {
    element_type: ElementType,
    blocks: Vec<Block>,
}

impl StoredObject {
    /// Compose `region` cell by cell from the newest covering block.
    fn read(&self, region: &ArrayBox) -> Result<NDArray, String> {
        let shape = region.shape();
        let size = self.element_type.size();
        let total = region.num_elements() as usize;
        let mut out = Vec::with_capacity(total * size);
        let mut coords = vec![0i64; region.ndim()];

        for linear in 0..total {
            let mut rem = linear;
            for d in (0..shape.len()).rev() {
                coords[d] = region.bounds[d].start + (rem % shape[d]) as i64;
                rem /= shape[d];
            }

            let (block, offset) = self
                .blocks
                .iter()
                .rev()
                .find_map(|b| block_offset(&b.region, &coords).map(|o| (b, o)))
                .ok_or_else(|| format!("cell {:?} has never been written", coords))?;
            out.extend_from_slice(&block.data[offset * size..(offset + 1) * size]);
        }

        NDArray::new(self.element_type, shape, Bytes::from(out)).map_err(|e| e.to_string())
    }
}

/// Row-major element offset of `coords` inside `region`, if it lies there.
fn block_offset(region: &ArrayBox, coords: &[i64]) -> Option<usize> {
    if region.ndim() != coords.len() {
        return None;
    }
    let mut offset = 0usize;
    for (extent, &c) in region.bounds.iter().zip(coords) {
        if c < extent.start || c > extent.end()? {
            return None;
        }
        offset = offset * extent.span as usize + (c - extent.start) as usize;
    }
    Some(offset)
}

/// Everything the service holds.
#[derive(Debug, Default)]
pub struct MockState {
    objects: HashMap<ObjectKey, StoredObject>,
    requests: Vec<RecordedRequest>,
    fail_next: Option<(StatusCode, String)>,
}

impl MockState {
    /// Requests received so far, oldest first.
    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    fn store(&mut self, key: ObjectKey, region: ArrayBox, array: &NDArray) {
        let block = Block {
            region,
            data: array.data().clone(),
        };
        let object = self.objects.entry(key).or_insert_with(|| StoredObject {
            element_type: array.element_type(),
            blocks: Vec::new(),
        });
        if object.element_type != array.element_type() {
            object.element_type = array.element_type();
            object.blocks.clear();
        }
        object.blocks.push(block);
    }
}

/// A running service bound to a loopback port. Stops when dropped.
pub struct MockDataService {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    handle: JoinHandle<()>,
}

impl MockDataService {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                debug!(error = %e, "Mock data service stopped");
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// `http://127.0.0.1:<port>`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// Seed an object without going through HTTP.
    pub fn insert(
        &self,
        name: &str,
        version: u32,
        namespace: Option<&str>,
        offset: &[i64],
        array: &NDArray,
    ) {
        let region = ArrayBox::from_shape_offset(array.shape(), offset).expect("valid offset");
        let key = (namespace.map(str::to_string), name.to_string(), version);
        lock(&self.state).store(key, region, array);
    }

    /// Answer the next request, whatever it is, with `status` and `body`.
    pub fn fail_next(&self, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        lock(&self.state).fail_next = Some((status, body.into()));
    }
}

impl Drop for MockDataService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type SharedState = Arc<Mutex<MockState>>;

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/dspaces/obj/:name/:version", post(read_handler).put(write_handler))
        .route("/dspaces/exec/", post(exec_handler))
        .route("/dspaces/var/", get(variables_handler))
        .route("/dspaces/var/:name/", get(objects_handler))
        .route("/dspaces/register/:kind/:name", post(register_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(Extension(state))
}

fn take_failure(state: &SharedState) -> Option<Response> {
    lock(state)
        .fail_next
        .take()
        .map(|(status, body)| (status, body).into_response())
}

fn bad_request(msg: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, msg.into()).into_response()
}

fn array_response(array: &NDArray) -> Response {
    let encoded = dx_protocol::array::encode(array);
    let (dims, tag) = encoded.metadata.header_values();
    ([(DIMS_HEADER, dims), (TAG_HEADER, tag)], encoded.payload).into_response()
}

// ============================================================================
// Object store
// ============================================================================

#[derive(Debug, Deserialize)]
struct NamespaceQuery {
    namespace: Option<String>,
}

/// POST /dspaces/obj/:name/:version
async fn read_handler(
    Extension(state): Extension<SharedState>,
    Path((name, version)): Path<(String, u32)>,
    Query(query): Query<NamespaceQuery>,
    body: Bytes,
) -> Response {
    if let Some(failure) = take_failure(&state) {
        return failure;
    }
    let region: ArrayBox = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return bad_request(format!("invalid box: {}", e)),
    };

    let mut st = lock(&state);
    st.requests.push(RecordedRequest::Read {
        name: name.clone(),
        version,
        namespace: query.namespace.clone(),
        region: region.clone(),
    });

    let Some(object) = st.objects.get(&(query.namespace, name, version)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match object.read(&region) {
        Ok(array) => array_response(&array),
        Err(e) => bad_request(e),
    }
}

#[derive(Debug, Deserialize)]
struct WriteQuery {
    element_size: usize,
    element_type: i64,
    namespace: Option<String>,
}

/// PUT /dspaces/obj/:name/:version
async fn write_handler(
    Extension(state): Extension<SharedState>,
    Path((name, version)): Path<(String, u32)>,
    Query(query): Query<WriteQuery>,
    mut multipart: Multipart,
) -> Response {
    if let Some(failure) = take_failure(&state) {
        return failure;
    }

    let mut region = None;
    let mut data = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let field_name = field.name().unwrap_or_default().to_string();
                let Ok(bytes) = field.bytes().await else {
                    return bad_request("unreadable multipart field");
                };
                if field_name == BOX_FIELD {
                    region = serde_json::from_slice::<ArrayBox>(&bytes).ok();
                } else if field_name == DATA_FIELD {
                    data = Some(bytes);
                }
            }
            Ok(None) => break,
            Err(e) => return bad_request(e.to_string()),
        }
    }
    let (Some(region), Some(data)) = (region, data) else {
        return bad_request("write needs a box and a data field");
    };

    lock(&state).requests.push(RecordedRequest::Write {
        name: name.clone(),
        version,
        namespace: query.namespace.clone(),
        region: region.clone(),
        element_size: query.element_size,
        element_type: query.element_type,
        data: data.to_vec(),
    });

    let element_type = match ElementType::from_tag(query.element_type) {
        Ok(t) if t.size() == query.element_size => t,
        Ok(_) => return bad_request("element size does not match element type"),
        Err(e) => return bad_request(e.to_string()),
    };
    let array = match NDArray::new(element_type, region.shape(), data) {
        Ok(a) => a,
        Err(e) => return bad_request(e.to_string()),
    };

    lock(&state).store((query.namespace, name, version), region, &array);
    StatusCode::OK.into_response()
}

// ============================================================================
// Remote execution
// ============================================================================

/// An evaluated value: a broadcastable scalar or a shaped array.
#[derive(Debug, Clone)]
enum Operand {
    Scalar(f64),
    Array { shape: Vec<usize>, values: Vec<f64> },
}

enum EvalError {
    UnknownFunction(String),
    Invalid(String),
}

fn eval(expr: &Expr, args: &[NDArray]) -> Result<Operand, EvalError> {
    match expr {
        Expr::Arg { index } => args
            .get(*index)
            .map(|a| Operand::Array {
                shape: a.shape().to_vec(),
                values: a.to_f64_vec(),
            })
            .ok_or_else(|| EvalError::Invalid(format!("argument {} not supplied", index))),
        Expr::Const { value } => Ok(Operand::Scalar(*value)),
        Expr::Unary { func, arg } => Ok(match eval(arg, args)? {
            Operand::Scalar(v) => Operand::Scalar(func.apply(v)),
            Operand::Array { shape, values } => Operand::Array {
                shape,
                values: values.into_iter().map(|v| func.apply(v)).collect(),
            },
        }),
        Expr::Binary { func, lhs, rhs } => {
            match (eval(lhs, args)?, eval(rhs, args)?) {
                (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(func.apply(a, b))),
                (Operand::Scalar(a), Operand::Array { shape, values }) => Ok(Operand::Array {
                    shape,
                    values: values.into_iter().map(|b| func.apply(a, b)).collect(),
                }),
                (Operand::Array { shape, values }, Operand::Scalar(b)) => Ok(Operand::Array {
                    shape,
                    values: values.into_iter().map(|a| func.apply(a, b)).collect(),
                }),
                (
                    Operand::Array { shape, values: a },
                    Operand::Array {
                        shape: other,
                        values: b,
                    },
                ) => {
                    if shape != other {
                        return Err(EvalError::Invalid(format!(
                            "shape {:?} does not match {:?}",
                            shape, other
                        )));
                    }
                    Ok(Operand::Array {
                        shape,
                        values: a.iter().zip(&b).map(|(x, y)| func.apply(*x, *y)).collect(),
                    })
                }
            }
        }
        Expr::Call { name, .. } => Err(EvalError::UnknownFunction(name.clone())),
    }
}

fn run_named(op: &str, args: &[NDArray]) -> Option<Value> {
    match op {
        "sum" => Some(json!(args
            .iter()
            .flat_map(|a| a.to_f64_vec())
            .sum::<f64>())),
        "shapes" => Some(json!(args.iter().map(|a| a.shape().to_vec()).collect::<Vec<_>>())),
        _ => None,
    }
}

/// POST /dspaces/exec/
async fn exec_handler(
    Extension(state): Extension<SharedState>,
    mut multipart: Multipart,
) -> Response {
    if let Some(failure) = take_failure(&state) {
        return failure;
    }

    let mut requests = None;
    let mut unit = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let field_name = field.name().unwrap_or_default().to_string();
                let Ok(bytes) = field.bytes().await else {
                    return bad_request("unreadable multipart field");
                };
                if field_name == REQUESTS_FIELD {
                    match serde_json::from_slice::<ExecRequests>(&bytes) {
                        Ok(r) => requests = Some(r.requests),
                        Err(e) => return bad_request(format!("invalid requests: {}", e)),
                    }
                } else if field_name == FUNCTION_FIELD {
                    match decode_unit(&bytes) {
                        Ok(u) => unit = Some(u),
                        Err(e) => return bad_request(e.to_string()),
                    }
                }
            }
            Ok(None) => break,
            Err(e) => return bad_request(e.to_string()),
        }
    }
    let (Some(requests), Some(unit)) = (requests, unit) else {
        return bad_request("exec needs a requests and a fn field");
    };

    let args = {
        let mut st = lock(&state);
        st.requests.push(RecordedRequest::Exec {
            requests: requests.clone(),
            unit: unit.clone(),
        });

        let mut args = Vec::with_capacity(requests.len());
        for req in &requests {
            let key = (req.namespace.clone(), req.name.clone(), req.version);
            let Some(object) = st.objects.get(&key) else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let region = ArrayBox {
                bounds: req.bounds.clone(),
            };
            match object.read(&region) {
                Ok(a) => args.push(a),
                Err(e) => return bad_request(e),
            }
        }
        args
    };

    match unit {
        ExecUnit::Named { op, .. } => match run_named(&op, &args) {
            Some(value) => Json(value).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        ExecUnit::Expr { expr } => match eval(&expr, &args) {
            Ok(Operand::Scalar(v)) => Json(json!(v)).into_response(),
            Ok(Operand::Array { shape, values }) => match NDArray::from_vec(shape, values) {
                Ok(array) => array_response(&array),
                Err(e) => bad_request(e.to_string()),
            },
            Err(EvalError::UnknownFunction(name)) => {
                debug!(function = %name, "Unknown function");
                StatusCode::NOT_FOUND.into_response()
            }
            Err(EvalError::Invalid(e)) => bad_request(e),
        },
    }
}

// ============================================================================
// Catalog and registration
// ============================================================================

/// GET /dspaces/var/
async fn variables_handler(Extension(state): Extension<SharedState>) -> Response {
    if let Some(failure) = take_failure(&state) {
        return failure;
    }
    let st = lock(&state);
    let names: BTreeSet<String> = st.objects.keys().map(|(_, name, _)| name.clone()).collect();
    Json(names.into_iter().collect::<Vec<_>>()).into_response()
}

/// GET /dspaces/var/:name/
async fn objects_handler(
    Extension(state): Extension<SharedState>,
    Path(name): Path<String>,
) -> Response {
    if let Some(failure) = take_failure(&state) {
        return failure;
    }
    let st = lock(&state);
    let mut objects: Vec<Value> = st
        .objects
        .iter()
        .filter(|((_, n, _), _)| n.as_str() == name)
        .map(|((ns, n, v), obj)| {
            json!({
                "name": n,
                "version": v,
                "namespace": ns,
                "element_type": obj.element_type.name(),
                "blocks": obj.blocks.len(),
            })
        })
        .collect();
    if objects.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    objects.sort_by_key(|o| o["version"].as_u64());
    Json(objects).into_response()
}

/// POST /dspaces/register/:kind/:name
async fn register_handler(
    Extension(state): Extension<SharedState>,
    Path((kind, name)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    if let Some(failure) = take_failure(&state) {
        return failure;
    }
    let parameters: Value = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return bad_request(format!("invalid parameters: {}", e)),
    };

    lock(&state).requests.push(RecordedRequest::Register {
        kind: kind.clone(),
        name: name.clone(),
        parameters: parameters.clone(),
    });

    if kind != "s3nc" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": format!("unsupported dataset type '{}'", kind) })),
        )
            .into_response();
    }
    Json(json!({
        "namespace": format!("{}-{}", kind, name),
        "parameters": parameters,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_common::Extent;

    #[test]
    fn test_newest_block_wins() {
        let mut state = MockState::default();
        let key = (None, "a".to_string(), 0);
        let old = NDArray::from_vec(vec![2, 2], vec![1i32; 4]).unwrap();
        let new = NDArray::from_vec(vec![1, 1], vec![9i32]).unwrap();
        state.store(key.clone(), ArrayBox::from_shape_offset(&[2, 2], &[0, 0]).unwrap(), &old);
        state.store(key.clone(), ArrayBox::from_shape_offset(&[1, 1], &[1, 1]).unwrap(), &new);

        let region = ArrayBox::from_shape_offset(&[2, 2], &[0, 0]).unwrap();
        let read = state.objects[&key].read(&region).unwrap();
        assert_eq!(read.to_vec::<i32>().unwrap(), vec![1, 1, 1, 9]);
    }

    #[test]
    fn test_uncovered_cells_fail() {
        let mut state = MockState::default();
        let key = (None, "a".to_string(), 0);
        let arr = NDArray::from_vec(vec![2], vec![1u8, 2]).unwrap();
        state.store(key.clone(), ArrayBox::from_shape_offset(&[2], &[5]).unwrap(), &arr);

        let region = ArrayBox {
            bounds: vec![Extent::new(4, 2)],
        };
        assert!(state.objects[&key].read(&region).is_err());
    }

    #[test]
    fn test_eval_broadcasts_scalars() {
        let a = NDArray::from_vec(vec![3], vec![1.0f64, 2.0, 3.0]).unwrap();
        let Ok(Operand::Array { values, .. }) = eval(&(Expr::arg(0) * 2.0 + 1.0), &[a]) else {
            panic!("expected an array");
        };
        assert_eq!(values, vec![3.0, 5.0, 7.0]);
    }
}
