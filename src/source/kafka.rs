use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use rdkafka::{ClientConfig, Message, Offset as KafkaOffset, TopicPartitionList};
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use tokio::time::{timeout_at, Instant};
use crate::flow::{self, envelope, FlowSample};
use crate::metrics::Metrics;
use super::RecordSource;

/// One message as delivered by the broker.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub topic:     String,
    pub partition: i32,
    pub offset:    i64,
    pub payload:   Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offset {
    pub topic:     String,
    pub partition: i32,
    pub offset:    i64,
}

#[async_trait]
pub trait Broker: Send {
    /// Wait for at least one message, then keep collecting for up to
    /// `linger` or until `max` messages are held.
    async fn fetch(&mut self, max: usize, linger: Duration) -> Result<Vec<Record>>;

    fn commit(&mut self, offsets: &[Offset]) -> Result<()>;

    fn seek(&mut self, offsets: &[Offset]) -> Result<()>;

    fn close(&mut self);
}

#[derive(Clone, Debug)]
pub struct Config {
    pub brokers:   String,
    pub topic:     String,
    pub group:     String,
    pub user:      Option<String>,
    pub password:  Option<String>,
    pub tls:       bool,
    pub linger:    Duration,
    pub max_batch: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brokers:   "localhost:9092".to_owned(),
            topic:     "flows".to_owned(),
            group:     "flow-enricher".to_owned(),
            user:      None,
            password:  None,
            tls:       true,
            linger:    Duration::from_millis(100),
            max_batch: 10_000,
        }
    }
}

impl Config {
    pub fn client(&self) -> ClientConfig {
        let mut cfg = ClientConfig::new();
        cfg.set("bootstrap.servers",  &self.brokers);
        cfg.set("group.id",           &self.group);
        cfg.set("enable.auto.commit", "false");
        cfg.set("auto.offset.reset",  "earliest");

        let protocol = match (&self.user, self.tls) {
            (Some(_), true)  => "SASL_SSL",
            (Some(_), false) => "SASL_PLAINTEXT",
            (None,    true)  => "SSL",
            (None,    false) => "PLAINTEXT",
        };
        cfg.set("security.protocol", protocol);

        if let Some(user) = &self.user {
            cfg.set("sasl.mechanisms", "SCRAM-SHA-256");
            cfg.set("sasl.username",   user);
            cfg.set("sasl.password",   self.password.as_deref().unwrap_or_default());
        }

        cfg
    }
}

pub struct KafkaBroker {
    consumer: StreamConsumer,
}

impl KafkaBroker {
    pub fn new(cfg: &Config) -> Result<Self> {
        let consumer: StreamConsumer = cfg.client().create().context("creating kafka consumer")?;
        consumer.subscribe(&[cfg.topic.as_str()]).with_context(|| {
            format!("subscribing to {}", cfg.topic)
        })?;
        info!("subscribed to {} as {}", cfg.topic, cfg.group);
        Ok(Self { consumer })
    }

    fn list(offsets: &[Offset]) -> Result<TopicPartitionList> {
        let mut tpl = TopicPartitionList::new();
        for o in offsets {
            tpl.add_partition_offset(&o.topic, o.partition, KafkaOffset::Offset(o.offset))?;
        }
        Ok(tpl)
    }
}

#[async_trait]
impl Broker for KafkaBroker {
    async fn fetch(&mut self, max: usize, linger: Duration) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        records.push(record(&self.consumer.recv().await?));

        let deadline = Instant::now() + linger;

        while records.len() < max {
            match timeout_at(deadline, self.consumer.recv()).await {
                Ok(Ok(msg)) => records.push(record(&msg)),
                Ok(Err(e))  => {
                    warn!("kafka receive error: {}", e);
                    break;
                },
                Err(_)      => break,
            }
        }

        Ok(records)
    }

    fn commit(&mut self, offsets: &[Offset]) -> Result<()> {
        let tpl = Self::list(offsets)?;
        self.consumer.commit(&tpl, CommitMode::Sync)?;
        Ok(())
    }

    fn seek(&mut self, offsets: &[Offset]) -> Result<()> {
        for o in offsets {
            let offset = KafkaOffset::Offset(o.offset);
            self.consumer.seek(&o.topic, o.partition, offset, Duration::from_secs(10))?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.consumer.unsubscribe();
    }
}

fn record<M: Message>(msg: &M) -> Record {
    Record {
        topic:     msg.topic().to_owned(),
        partition: msg.partition(),
        offset:    msg.offset(),
        payload:   msg.payload().unwrap_or_default().to_vec(),
    }
}

/// Flow samples from a broker topic. Each message carries one sFlow
/// datagram wrapped in an envelope; offsets advance only on `commit`.
pub struct KafkaSource<B: Broker> {
    broker:    B,
    metrics:   Arc<Metrics>,
    linger:    Duration,
    max_batch: usize,
    pending:   BTreeMap<(String, i32), (i64, i64)>,
    reseek:    bool,
}

impl<B: Broker> KafkaSource<B> {
    pub fn new(broker: B, cfg: &Config, metrics: Arc<Metrics>) -> Self {
        Self {
            broker:    broker,
            metrics:   metrics,
            linger:    cfg.linger,
            max_batch: cfg.max_batch,
            pending:   BTreeMap::new(),
            reseek:    false,
        }
    }

    fn track(&mut self, r: &Record) {
        let span = self.pending.entry((r.topic.clone(), r.partition));
        let span = span.or_insert((r.offset, r.offset));
        span.0 = span.0.min(r.offset);
        span.1 = span.1.max(r.offset);
    }

    fn offsets<F: Fn(&(i64, i64)) -> i64>(&self, pick: F) -> Vec<Offset> {
        self.pending.iter().map(|((topic, partition), span)| Offset {
            topic:     topic.clone(),
            partition: *partition,
            offset:    pick(span),
        }).collect()
    }
}

#[async_trait]
impl<B: Broker> RecordSource for KafkaSource<B> {
    async fn consume(&mut self) -> Result<Option<Vec<FlowSample>>> {
        // the consumer position is past a batch that was never written
        if self.reseek {
            self.rewind().await.context("repeating rewind")?;
        }

        let records = self.broker.fetch(self.max_batch, self.linger).await?;

        let mut samples = Vec::new();

        for r in &records {
            self.track(r);
            self.metrics.messages_consumed.inc();

            match decode(&r.payload) {
                Ok(mut batch) => samples.append(&mut batch),
                Err(e)        => {
                    debug!("{}/{}@{} decode failed: {}", r.topic, r.partition, r.offset, e);
                    self.metrics.decode_errors.inc();
                }
            }
        }

        debug!("consumed {} messages, {} samples", records.len(), samples.len());

        Ok(Some(samples))
    }

    async fn commit(&mut self) -> Result<()> {
        if self.reseek {
            return Err(anyhow!("uncommitted batch awaiting redelivery"));
        }

        if self.pending.is_empty() {
            return Ok(());
        }

        let offsets = self.offsets(|&(_, last)| last + 1);
        self.broker.commit(&offsets)?;
        self.pending.clear();

        Ok(())
    }

    async fn rewind(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let offsets = self.offsets(|&(first, _)| first);
        if let Err(e) = self.broker.seek(&offsets) {
            self.reseek = true;
            return Err(e);
        }

        self.pending.clear();
        self.reseek = false;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.broker.close();
        self.pending.clear();
        self.reseek = false;
        Ok(())
    }
}

fn decode(payload: &[u8]) -> Result<Vec<FlowSample>, flow::Error> {
    let (received, datagram): (SystemTime, Vec<u8>) = envelope::decode(payload)?;
    flow::decode(&datagram, received)
}
