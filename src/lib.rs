pub mod annotate;
pub mod args;
pub mod cache;
pub mod enrich;
pub mod enricher;
pub mod flow;
pub mod metrics;
pub mod packet;
pub mod refresh;
pub mod sink;
pub mod source;
pub mod topology;
