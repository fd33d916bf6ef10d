use std::io::{self, Stdout, Write};
use std::sync::Arc;
use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use parking_lot::Mutex;
use crate::flow::FlowSample;
use crate::metrics::Metrics;
use super::{FlowRow, SinkWriter};

/// Writes every sample as one JSON object per line.
pub struct StdoutWriter<W: Write + Send = Stdout> {
    out:     Mutex<W>,
    metrics: Arc<Metrics>,
}

impl StdoutWriter<Stdout> {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self::with_writer(io::stdout(), metrics)
    }
}

impl<W: Write + Send> StdoutWriter<W> {
    pub fn with_writer(out: W, metrics: Arc<Metrics>) -> Self {
        Self {
            out:     Mutex::new(out),
            metrics: metrics,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> SinkWriter for StdoutWriter<W> {
    async fn insert(&self, batch: &[FlowSample]) -> Result<()> {
        let mut out = self.out.lock();

        for sample in batch {
            let row = match FlowRow::try_from(sample) {
                Ok(row) => row,
                Err(e)  => {
                    warn!("dropping row: {:?}", e);
                    self.metrics.rows_dropped.inc();
                    continue;
                }
            };
            serde_json::to_writer(&mut *out, &row)?;
            out.write_all(b"\n")?;
        }

        out.flush()?;

        Ok(())
    }
}
