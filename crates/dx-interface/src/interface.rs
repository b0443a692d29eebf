//! Domain-level facade over an [`ArrayService`].

use dx_client::{ArrayService, DxClient};
use dx_common::{DxError, DxResult, ExecArg, NDArray, ObjectRef};
use dx_protocol::{ExecOutput, ExecUnit};
use tracing::{debug, instrument};

use crate::naming::VariableName;
use crate::request::SemanticRequest;
use crate::source::SourceConfig;

/// Reads, writes and remote execution addressed by variable, date range and
/// geographic box.
#[derive(Debug, Clone)]
pub struct DxInterface<S = DxClient> {
    service: S,
    sources: SourceConfig,
}

impl DxInterface<DxClient> {
    /// Connect to a service at `address` with default source settings.
    pub fn connect(address: &str) -> DxResult<Self> {
        Ok(Self::new(DxClient::connect(address)?, SourceConfig::default()))
    }
}

impl<S: ArrayService> DxInterface<S> {
    pub fn new(service: S, sources: SourceConfig) -> Self {
        Self { service, sources }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn sources(&self) -> &SourceConfig {
        &self.sources
    }

    /// Read the data a request describes; `None` when it is not stored.
    #[instrument(skip(self, request), fields(source = %request.source()))]
    pub async fn query(&self, request: &SemanticRequest) -> DxResult<Option<NDArray>> {
        let resolved = request.resolve(&self.sources)?;
        debug!(object = %resolved.object, "Resolved query");
        self.service
            .get_array(&resolved.object, &resolved.region)
            .await
    }

    /// Store a user array as `v:<variable>,m:<model>` at version 0, with its
    /// first element at the grid origin. Both parts of the name are required.
    #[instrument(skip(self, data), fields(shape = ?data.shape()))]
    pub async fn write(&self, variable: &str, model: &str, data: &NDArray) -> DxResult<()> {
        if variable.trim().is_empty() {
            return Err(DxError::Config("cannot write without a variable".to_string()));
        }
        if model.trim().is_empty() {
            return Err(DxError::Config(format!(
                "cannot write '{}' without a model",
                variable
            )));
        }

        let name = VariableName::new(variable).with_model(model);
        let object = ObjectRef::new(name.to_string(), 0);
        let offset = vec![0i64; data.ndim()];
        self.service.put_array(&object, &offset, data).await
    }

    /// Translate a request into an execution argument.
    pub fn build_arg(&self, request: &SemanticRequest) -> DxResult<ExecArg> {
        request.to_exec_arg(&self.sources)
    }

    pub async fn exec(&self, unit: &ExecUnit, args: &[ExecArg]) -> DxResult<Option<ExecOutput>> {
        self.service.exec(unit, args).await
    }
}
