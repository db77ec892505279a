// src/store/mod.rs

pub mod memory;
pub mod postgres;
pub mod subscription;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::user_stats::{StatsDocument, StatsPatch},
};

pub use memory::MemoryAggregateStore;
pub use postgres::PgAggregateStore;
pub use subscription::StatsSubscription;

/// Read-modify-write body run inside a store transaction. It sees the current
/// document (zero-valued when absent) and returns the fields to merge in.
pub type StatsMutation<'a> = &'a (dyn Fn(&StatsDocument) -> StatsPatch + Send + Sync);

/// One stats document per user id.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<StatsDocument>, AppError>;

    /// Creates the document unless one exists. Returns whether it was created.
    async fn insert_if_absent(&self, user_id: &str, doc: StatsDocument) -> Result<bool, AppError>;

    /// Atomically applies `mutation` and returns the merged document. Either
    /// every patched field is written or none is.
    async fn transact(
        &self,
        user_id: &str,
        mutation: StatsMutation<'_>,
    ) -> Result<StatsDocument, AppError>;

    async fn subscribe(&self, user_id: &str) -> Result<StatsSubscription, AppError>;
}
