//! The seam between semantic callers and the transport.

use async_trait::async_trait;
use dx_common::{ArrayBox, DxResult, ExecArg, NDArray, ObjectRef};
use dx_protocol::{ExecOutput, ExecUnit};

use crate::client::DxClient;

/// Array reads, writes and remote execution against a data service.
#[async_trait]
pub trait ArrayService: Send + Sync {
    /// Read a region; `None` when the object does not exist.
    async fn get_array(
        &self,
        object: &ObjectRef,
        region: &ArrayBox,
    ) -> DxResult<Option<NDArray>>;

    /// Write an array with its first element at `offset`.
    async fn put_array(&self, object: &ObjectRef, offset: &[i64], data: &NDArray) -> DxResult<()>;

    /// Execute a unit remotely; `None` when it or an argument resolved to nothing.
    async fn exec(&self, unit: &ExecUnit, args: &[ExecArg]) -> DxResult<Option<ExecOutput>>;
}

#[async_trait]
impl ArrayService for DxClient {
    async fn get_array(
        &self,
        object: &ObjectRef,
        region: &ArrayBox,
    ) -> DxResult<Option<NDArray>> {
        DxClient::get_array(self, object, region).await
    }

    async fn put_array(&self, object: &ObjectRef, offset: &[i64], data: &NDArray) -> DxResult<()> {
        DxClient::put_array(self, object, offset, data).await
    }

    async fn exec(&self, unit: &ExecUnit, args: &[ExecArg]) -> DxResult<Option<ExecOutput>> {
        DxClient::exec(self, unit, args).await
    }
}
