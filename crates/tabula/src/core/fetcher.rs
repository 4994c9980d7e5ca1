use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

use tabula_api::{ApiError, FetchParams, FetchResponse, Record, Value};
use tabula_core::{DataSource, Fetcher, MaybeSendSync, Result};

/// Exposes a typed `DataSource` to the list engine as untyped records.
///
/// Entities are serialized with serde, so the record fields are the entity's
/// wire field names (e.g. `isActive`, `userId`).
pub struct ResourceFetcher<T, S>
where
    S: DataSource<T>,
    T: MaybeSendSync + 'static,
{
    source: Arc<S>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, S> ResourceFetcher<T, S>
where
    S: DataSource<T>,
    T: MaybeSendSync + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            _phantom: PhantomData,
        }
    }
}

/// Serialize an entity into a record
pub fn to_record<T: serde::Serialize>(entity: &T) -> Result<Record> {
    let json = serde_json::to_value(entity)
        .map_err(|e| ApiError::internal(format!("Failed to serialize entity: {}", e)))?;
    match Value::from_json_value(json) {
        Value::Object(fields) => Ok(fields),
        other => Err(ApiError::internal(format!(
            "Entity did not serialize to an object: {}",
            other.to_json_string()
        ))),
    }
}

#[async_trait]
impl<T, S> Fetcher for ResourceFetcher<T, S>
where
    S: DataSource<T>,
    T: serde::Serialize + MaybeSendSync + 'static,
{
    async fn fetch(&self, params: FetchParams) -> Result<FetchResponse> {
        let entities = self.source.query(&params).await?;
        let records = entities.iter().map(to_record).collect::<Result<Vec<_>>>()?;
        Ok(FetchResponse::from_records(records))
    }
}
