use anyhow::Result;
use async_trait::async_trait;
use crate::flow::FlowSample;

pub use kafka::{Broker, Config, KafkaBroker, KafkaSource, Offset, Record};
pub use replay::ReplaySource;

mod kafka;
mod replay;


/// Supplier of decoded flow batches that tracks how far delivery has
/// been acknowledged.
#[async_trait]
pub trait RecordSource: Send {
    /// Next batch, possibly empty. `None` once the source is exhausted.
    async fn consume(&mut self) -> Result<Option<Vec<FlowSample>>>;

    /// Acknowledge everything delivered so far.
    async fn commit(&mut self) -> Result<()>;

    /// Arrange for everything delivered since the last commit to be
    /// delivered again.
    async fn rewind(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
