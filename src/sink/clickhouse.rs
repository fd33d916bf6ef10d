use std::sync::Arc;
use anyhow::Result;
use async_trait::async_trait;
use clickhouse::Client;
use clickhouse::insert::Insert;
use log::{debug, warn};
use crate::flow::FlowSample;
use crate::metrics::Metrics;
use super::{FlowRow, SinkWriter};

#[derive(Clone, Debug)]
pub struct Config {
    pub url:      String,
    pub database: String,
    pub user:     Option<String>,
    pub password: Option<String>,
    pub table:    String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url:      "http://localhost:8123".to_owned(),
            database: "default".to_owned(),
            user:     None,
            password: None,
            table:    "flows".to_owned(),
        }
    }
}

impl Config {
    pub fn client(&self) -> Client {
        let mut client = Client::default()
            .with_url(&self.url)
            .with_database(&self.database);

        if let Some(user) = &self.user {
            client = client.with_user(user);
        }

        if let Some(password) = &self.password {
            client = client.with_password(password);
        }

        client
    }
}

/// Writes each batch as a single INSERT into the flows table.
pub struct ClickhouseWriter {
    client:  Client,
    table:   String,
    metrics: Arc<Metrics>,
}

impl ClickhouseWriter {
    pub fn new(client: Client, table: String, metrics: Arc<Metrics>) -> Self {
        Self { client, table, metrics }
    }
}

#[async_trait]
impl SinkWriter for ClickhouseWriter {
    async fn insert(&self, batch: &[FlowSample]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut insert: Insert<FlowRow> = self.client.insert(&self.table).await?;
        let mut rows = 0;

        for sample in batch {
            let row = match FlowRow::try_from(sample) {
                Ok(row) => row,
                Err(e)  => {
                    warn!("dropping row: {:?}", e);
                    self.metrics.rows_dropped.inc();
                    continue;
                }
            };
            insert.write(&row).await?;
            rows += 1;
        }

        insert.end().await?;

        debug!("inserted {} rows into {}", rows, self.table);

        Ok(())
    }
}
