use anyhow::Result;
use async_trait::async_trait;
use crate::flow::FlowSample;

pub use self::clickhouse::{ClickhouseWriter, Config};
pub use row::FlowRow;
pub use stdout::StdoutWriter;

mod clickhouse;
mod row;
mod stdout;


/// Durable destination for enriched batches. A batch is accepted as a
/// whole or the call fails and nothing is considered written.
#[async_trait]
pub trait SinkWriter: Send + Sync {
    async fn insert(&self, batch: &[FlowSample]) -> Result<()>;
}
