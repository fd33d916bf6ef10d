use std::sync::Arc;
use std::time::Duration;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use crate::annotate::Annotator;
use crate::cache::Cache;
use crate::metrics::Metrics;
use crate::refresh;
use crate::sink::SinkWriter;
use crate::source::RecordSource;
use crate::topology::{Topology, TopologyProvider};


/// Moves batches from a record source through the annotators into a
/// sink, committing only what the sink accepted.
pub struct Enricher {
    source:     Option<Box<dyn RecordSource>>,
    writer:     Option<Box<dyn SinkWriter>>,
    provider:   Option<Arc<dyn TopologyProvider>>,
    annotators: Vec<Box<dyn Annotator>>,
    topology:   Topology,
    metrics:    Arc<Metrics>,
    interval:   Duration,
    retry:      Duration,
}

impl Enricher {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            source:     None,
            writer:     None,
            provider:   None,
            annotators: Vec::new(),
            topology:   Arc::new(Cache::default()),
            metrics:    metrics,
            interval:   Duration::from_secs(10),
            retry:      Duration::from_secs(1),
        }
    }

    pub fn source<S: RecordSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn writer<W: SinkWriter + 'static>(mut self, writer: W) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn provider<P: TopologyProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn topology_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry = delay;
        self
    }

    /// Annotators run in the order they are added.
    pub fn add_annotator<A: Annotator + 'static>(mut self, annotator: A) -> Self {
        self.annotators.push(Box::new(annotator));
        self
    }

    /// Handle on the topology snapshot this enricher keeps current.
    pub fn topology(&self) -> Topology {
        self.topology.clone()
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let Self { source, writer, provider, annotators, topology, metrics, interval, retry } = self;

        let mut source = source.ok_or_else(|| anyhow!("no record source configured"))?;
        let writer     = writer.ok_or_else(|| anyhow!("no sink writer configured"))?;

        let tasks  = shutdown.child_token();
        let _guard = tasks.clone().drop_guard();

        if let Some(provider) = provider {
            let snapshot = provider.snapshot().await.context("initial topology fetch")?;
            info!("topology: {} users, {} devices", snapshot.users.len(), snapshot.devices.len());
            topology.store(snapshot);

            let errors = metrics.clone();
            refresh::spawn("topology".to_owned(), interval, tasks.clone(), move || {
                errors.topology_errors.inc();
            }, move || {
                fetch(provider.clone(), topology.clone())
            });
        }

        for annotator in &annotators {
            annotator.init(tasks.clone()).await.with_context(|| {
                format!("initializing {} annotator", annotator.name())
            })?;
            info!("{} annotator ready", annotator.name());
        }

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                r = source.consume()     => r,
            };

            let mut batch = match polled {
                Ok(Some(batch)) => batch,
                Ok(None)        => {
                    info!("source exhausted");
                    break;
                },
                Err(e) => {
                    warn!("poll failed: {:?}", e);
                    metrics.poll_errors.inc();
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = sleep(retry)         => continue,
                    }
                }
            };

            if batch.is_empty() {
                continue;
            }

            for sample in &mut batch {
                for annotator in &annotators {
                    if let Err(e) = annotator.annotate(sample) {
                        warn!("{} annotation failed: {}", annotator.name(), e);
                        metrics.annotation_errors.inc();
                    }
                }
            }

            if let Err(e) = writer.insert(&batch).await {
                error!("insert of {} samples failed: {:?}", batch.len(), e);
                metrics.insert_errors.inc();
                if !redeliver(source.as_mut(), &metrics, retry, &shutdown).await {
                    break;
                }
                continue;
            }

            match source.commit().await {
                Ok(()) => metrics.flows_processed.add(batch.len() as u64),
                Err(e) => {
                    warn!("commit failed: {:?}", e);
                    metrics.commit_errors.inc();
                }
            }
        }

        tasks.cancel();

        match source.close() {
            Ok(()) => debug!("source closed"),
            Err(e) => warn!("source close failed: {:?}", e),
        }

        info!("enricher stopped: {}", metrics.snapshot());

        Ok(())
    }
}

/// Wait out `retry`, then rewind the source, repeating until the rewind
/// succeeds. Returns false on shutdown.
async fn redeliver(
    source:   &mut dyn RecordSource,
    metrics:  &Metrics,
    retry:    Duration,
    shutdown: &CancellationToken,
) -> bool {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return false,
            _ = sleep(retry)         => (),
        }

        match source.rewind().await {
            Ok(()) => {
                debug!("source rewound");
                return true;
            },
            Err(e) => {
                warn!("rewind failed: {:?}", e);
                metrics.rewind_errors.inc();
            }
        }
    }
}

async fn fetch(provider: Arc<dyn TopologyProvider>, topology: Topology) -> Result<()> {
    let snapshot = provider.snapshot().await?;
    topology.store(snapshot);
    Ok(())
}
