//! Remote store access.
//!
//! [`ProxyStore`] is the seam the console core programs against; the
//! production implementation is [`http::HttpStore`].

use async_trait::async_trait;

use crate::error::Error;
use crate::models::proxies::{
    ExportFormat, ProxyPage, ProxyPatch, ProxyRecord, ProxySpec, TestReport,
};
use crate::query::QueryState;

pub mod http;

pub use http::HttpStore;

#[async_trait]
pub trait ProxyStore {
    /// One page of records for the given query state.
    async fn list(&self, query: &QueryState) -> Result<ProxyPage, Error>;

    /// Persists a spec. Fails with [`Error::Duplicate`] when the
    /// address already exists.
    async fn create(&self, spec: &ProxySpec) -> Result<ProxyRecord, Error>;

    async fn update(&self, id: i64, patch: &ProxyPatch) -> Result<ProxyRecord, Error>;

    async fn delete(&self, id: i64) -> Result<(), Error>;

    async fn bulk_delete(&self, ids: &[i64]) -> Result<(), Error>;

    /// Triggers a remote-side connectivity check.
    async fn test(&self, id: i64) -> Result<TestReport, Error>;

    /// Server-rendered export payload (json/csv).
    async fn export(&self, format: ExportFormat) -> Result<Vec<u8>, Error>;

    /// Makes all stored proxies available for rotation again.
    async fn reload_pool(&self) -> Result<(), Error>;
}
