use std::sync::Arc;
use std::thread;
use anyhow::{anyhow, Result};
use clap::{value_t, ArgMatches};
use log::{debug, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use crate::annotate::{ClickhouseIfNames, InterfaceNameAnnotator, TopologyAnnotator};
use crate::args::{duration, opt};
use crate::enricher::Enricher;
use crate::metrics::Metrics;
use crate::sink::{self, ClickhouseWriter, StdoutWriter};
use crate::source::{self, KafkaBroker, KafkaSource, ReplaySource};
use crate::topology::FileProvider;

pub fn enrich(args: &ArgMatches) -> Result<()> {
    let input  = value_t!(args, "input",  String)?;
    let output = value_t!(args, "output", String)?;

    let kafka = source::Config {
        brokers:   value_t!(args, "kafka-brokers", String)?,
        topic:     value_t!(args, "kafka-topic",   String)?,
        group:     value_t!(args, "kafka-group",   String)?,
        user:      args.value_of("kafka-user").map(String::from),
        password:  args.value_of("kafka-password").map(String::from),
        tls:       !args.is_present("kafka-no-tls"),
        linger:    required(duration(args.value_of("linger"))?, "linger")?,
        max_batch: required(opt(args.value_of("max-batch"))?, "max-batch")?,
    };

    let clickhouse = sink::Config {
        url:      value_t!(args, "clickhouse-url",      String)?,
        database: value_t!(args, "clickhouse-database", String)?,
        user:     args.value_of("clickhouse-user").map(String::from),
        password: args.value_of("clickhouse-password").map(String::from),
        table:    value_t!(args, "clickhouse-table",    String)?,
    };

    let topology_interval = required(duration(args.value_of("topology-interval"))?, "topology-interval")?;
    let ifname_interval   = required(duration(args.value_of("ifname-interval"))?, "ifname-interval")?;
    let ifname_table      = value_t!(args, "ifname-table", String)?;
    let retry_delay       = required(duration(args.value_of("retry-delay"))?, "retry-delay")?;

    let rt       = Runtime::new()?;
    let metrics  = Arc::new(Metrics::new());
    let shutdown = CancellationToken::new();

    let mut signals = Signals::new(&[SIGINT, SIGTERM])?;
    let token = shutdown.clone();
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!("received signal {}, shutting down", signal);
            token.cancel();
        }
    });

    let mut enricher = Enricher::new(metrics.clone())
        .topology_interval(topology_interval)
        .retry_delay(retry_delay);

    enricher = match input.as_str() {
        "pcap" => {
            let path = value_t!(args, "pcap", String)?;
            info!("replaying {}", path);
            enricher.source(ReplaySource::new(path, metrics.clone()))
        },
        _ => {
            let _guard = rt.enter();
            let broker = KafkaBroker::new(&kafka)?;
            enricher.source(KafkaSource::new(broker, &kafka, metrics.clone()))
        },
    };

    enricher = match output.as_str() {
        "stdout" => enricher.writer(StdoutWriter::new(metrics.clone())),
        _        => {
            let writer = ClickhouseWriter::new(clickhouse.client(), clickhouse.table.clone(), metrics.clone());
            enricher.writer(writer)
        },
    };

    if let Some(path) = args.value_of("topology") {
        debug!("topology from {}", path);
        let annotator = TopologyAnnotator::new(enricher.topology(), metrics.clone());
        enricher = enricher.provider(FileProvider::new(path)).add_annotator(annotator);
    }

    if args.is_present("ifname") {
        let source    = ClickhouseIfNames::new(clickhouse.client(), ifname_table);
        let annotator = InterfaceNameAnnotator::new(Arc::new(source), metrics.clone());
        enricher = enricher.add_annotator(annotator.interval(ifname_interval));
    }

    rt.block_on(enricher.run(shutdown))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("missing argument {}", name))
}
