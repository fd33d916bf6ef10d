use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use crate::flow::FlowSample;

pub use ifname::{ClickhouseIfNames, IfName, IfNameSource, InterfaceNameAnnotator};
pub use topology::TopologyAnnotator;

mod ifname;
mod topology;


/// An enrichment stage. `annotate` only reads the stage's own cache,
/// which `init` populates once and then keeps fresh in the background
/// until `shutdown` is cancelled.
#[async_trait]
pub trait Annotator: Send + Sync {
    fn name(&self) -> &str;

    async fn init(&self, shutdown: CancellationToken) -> Result<()>;

    fn annotate(&self, sample: &mut FlowSample) -> Result<()>;
}
