//! HTTP client for the data service.
//!
//! Every operation is exactly one request/response exchange. The client keeps
//! no per-call state, so a single instance (or clones of it) may be used from
//! many tasks at once.

use std::time::Instant;

use bytes::Bytes;
use dx_common::{ArrayBox, DxError, DxResult, ExecArg, NDArray, ObjectRef, RegHandle};
use dx_protocol::array::{self, ArrayMetadata};
use dx_protocol::exec::{self, ExecOutput, ExecRequests, ExecUnit};
use dx_protocol::{
    register, Endpoint, Method, BOX_FIELD, DATA_FIELD, DIMS_HEADER, FUNCTION_FIELD,
    REQUESTS_FIELD, TAG_HEADER,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::metrics;

const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Client for one data service.
#[derive(Debug, Clone)]
pub struct DxClient {
    http: Client,
    base: Url,
    api_root: Vec<String>,
}

impl DxClient {
    /// Create a client from configuration.
    pub fn new(config: &ClientConfig) -> DxResult<Self> {
        let mut builder = Client::builder().tcp_nodelay(true);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| DxError::Config(format!("failed to create HTTP client: {}", e)))?;

        Self::with_http_client(config, http)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_http_client(config: &ClientConfig, http: Client) -> DxResult<Self> {
        let raw = config.normalized_base_url();
        let base = Url::parse(&raw)
            .map_err(|e| DxError::Config(format!("invalid base URL '{}': {}", raw, e)))?;
        if base.cannot_be_a_base() {
            return Err(DxError::Config(format!("base URL '{}' cannot carry a path", raw)));
        }

        let api_root = config
            .api_root
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            http,
            base,
            api_root,
        })
    }

    /// Convenience constructor from an address such as `127.0.0.1:8002`.
    pub fn connect(address: &str) -> DxResult<Self> {
        Self::new(&ClientConfig::new(address))
    }

    /// Absolute URL of a route.
    pub fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(&self.api_root)
                .extend(&endpoint.segments);
        }
        if !endpoint.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(endpoint.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    fn request(&self, endpoint: &Endpoint) -> RequestBuilder {
        let url = self.url(endpoint);
        match endpoint.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
        }
    }

    // ------------------------------------------------------------------------
    // Object store
    // ------------------------------------------------------------------------

    /// Read the region `region` of `object`.
    ///
    /// Returns `Ok(None)` when the service reports the object as not found.
    #[instrument(skip(self, region), fields(object = %object, ndim = region.ndim()))]
    pub async fn get_array(
        &self,
        object: &ObjectRef,
        region: &ArrayBox,
    ) -> DxResult<Option<NDArray>> {
        let started = Instant::now();
        let result = self.fetch_array(object, region).await;
        metrics::record("get", started, metrics::lookup_outcome(&result));
        result
    }

    async fn fetch_array(
        &self,
        object: &ObjectRef,
        region: &ArrayBox,
    ) -> DxResult<Option<NDArray>> {
        let body = serde_json::to_vec(region)?;
        let request = self
            .request(&Endpoint::read(object))
            .header(CONTENT_TYPE, JSON)
            .body(body);

        let response = send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Object not found");
            return Ok(None);
        }
        let response = check_status(response).await?;

        let dims = required_header(&response, DIMS_HEADER)?;
        let tag = required_header(&response, TAG_HEADER)?;
        let metadata = ArrayMetadata::parse(&dims, &tag)?;
        let payload = read_body(response).await?;
        debug!(dims = %dims, size = payload.len(), "Read array");

        array::decode(metadata, payload).map(Some)
    }

    /// Write `data` into `object` with its first element at `offset`.
    #[instrument(skip(self, offset, data), fields(object = %object, shape = ?data.shape()))]
    pub async fn put_array(
        &self,
        object: &ObjectRef,
        offset: &[i64],
        data: &NDArray,
    ) -> DxResult<()> {
        let started = Instant::now();
        let result = self.store_array(object, offset, data).await;
        metrics::record("put", started, metrics::outcome(&result));
        result
    }

    async fn store_array(
        &self,
        object: &ObjectRef,
        offset: &[i64],
        data: &NDArray,
    ) -> DxResult<()> {
        let region = ArrayBox::from_shape_offset(data.shape(), offset)?;
        let encoded = array::encode(data);
        debug!(size = encoded.payload.len(), "Writing array");

        let payload = Part::bytes(encoded.payload.to_vec())
            .file_name(DATA_FIELD)
            .mime_str(OCTET_STREAM)
            .map_err(transport)?;
        let form = Form::new()
            .text(BOX_FIELD, serde_json::to_string(&region)?)
            .part(DATA_FIELD, payload);

        let request = self
            .request(&Endpoint::write(object, data.element_type()))
            .multipart(form);
        check_status(send(request).await?).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Remote execution
    // ------------------------------------------------------------------------

    /// Run `unit` on the service with `args` bound positionally.
    ///
    /// Only the result crosses the network. Returns `Ok(None)` when the unit
    /// or an argument resolved to nothing.
    #[instrument(skip(self, unit, args), fields(num_args = args.len()))]
    pub async fn exec(&self, unit: &ExecUnit, args: &[ExecArg]) -> DxResult<Option<ExecOutput>> {
        let started = Instant::now();
        let result = self.submit_exec(unit, args).await;
        metrics::record("exec", started, metrics::lookup_outcome(&result));
        result
    }

    async fn submit_exec(&self, unit: &ExecUnit, args: &[ExecArg]) -> DxResult<Option<ExecOutput>> {
        unit.validate(args.len())?;

        let requests = serde_json::to_string(&ExecRequests::from_args(args))?;
        let function = Part::bytes(exec::encode_unit(unit)?)
            .file_name(FUNCTION_FIELD)
            .mime_str(JSON)
            .map_err(transport)?;
        let form = Form::new()
            .text(REQUESTS_FIELD, requests)
            .part(FUNCTION_FIELD, function);

        let response = send(self.request(&Endpoint::exec()).multipart(form)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Exec target not found");
            return Ok(None);
        }
        let response = check_status(response).await?;

        let dims = optional_header(&response, DIMS_HEADER);
        let tag = optional_header(&response, TAG_HEADER);
        let body = read_body(response).await?;
        debug!(size = body.len(), binary = dims.is_some(), "Exec result received");

        exec::decode_output(dims.as_deref(), tag.as_deref(), body).map(Some)
    }

    // ------------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------------

    /// Names of all known variables.
    #[instrument(skip(self))]
    pub async fn list_variables(&self) -> DxResult<Option<Vec<String>>> {
        let started = Instant::now();
        let result = self.get_json(&Endpoint::variables()).await;
        metrics::record("list_variables", started, metrics::lookup_outcome(&result));
        result
    }

    /// Objects stored under the variable `name`, as the service describes them.
    #[instrument(skip(self))]
    pub async fn list_variable_objects(&self, name: &str) -> DxResult<Option<Value>> {
        let started = Instant::now();
        let result = self.get_json(&Endpoint::variable_objects(name)).await;
        metrics::record("list_objects", started, metrics::lookup_outcome(&result));
        result
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
    ) -> DxResult<Option<T>> {
        let response = send(self.request(endpoint)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_body(check_status(response).await?).await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register an externally located dataset of type `kind` under `name`.
    ///
    /// `parameters` are passed through untouched (e.g. a bucket and path).
    #[instrument(skip(self, parameters))]
    pub async fn register<P: Serialize + ?Sized>(
        &self,
        kind: &str,
        name: &str,
        parameters: &P,
    ) -> DxResult<RegHandle> {
        let started = Instant::now();
        let result = self.submit_registration(kind, name, parameters).await;
        metrics::record("register", started, metrics::outcome(&result));
        result
    }

    async fn submit_registration<P: Serialize + ?Sized>(
        &self,
        kind: &str,
        name: &str,
        parameters: &P,
    ) -> DxResult<RegHandle> {
        let body = serde_json::to_vec(parameters)?;
        let request = self
            .request(&Endpoint::register(kind, name))
            .header(CONTENT_TYPE, JSON)
            .body(body);

        let body = read_body(check_status(send(request).await?).await?).await?;
        let handle: RegHandle = serde_json::from_slice(&body)?;
        debug!(namespace = %handle.namespace, "Dataset registered");
        Ok(handle)
    }
}

fn transport(err: reqwest::Error) -> DxError {
    DxError::Transport(err.to_string())
}

async fn send(request: RequestBuilder) -> DxResult<Response> {
    request.send().await.map_err(transport)
}

async fn read_body(response: Response) -> DxResult<Bytes> {
    response.bytes().await.map_err(transport)
}

/// Turn any non-2xx response into a `ServerError` carrying the server's message.
async fn check_status(response: Response) -> DxResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let mut message = register::failure_message(&body);
    if message.is_empty() {
        message = status.canonical_reason().unwrap_or("no message").to_string();
    }
    warn!(status = status.as_u16(), message = %message, "Request failed");
    Err(DxError::server(status.as_u16(), message))
}

fn optional_header(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn required_header(response: &Response, name: &str) -> DxResult<String> {
    optional_header(response, name)
        .ok_or_else(|| DxError::malformed(format!("response is missing the {} header", name)))
}
