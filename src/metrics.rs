use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome counters shared by every stage of the pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    pub flows_processed:   Counter,
    pub messages_consumed: Counter,
    pub decode_errors:     Counter,
    pub annotation_errors: Counter,
    pub refresh_errors:    Counter,
    pub topology_errors:   Counter,
    pub poll_errors:       Counter,
    pub insert_errors:     Counter,
    pub rewind_errors:     Counter,
    pub commit_errors:     Counter,
    pub rows_dropped:      Counter,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    pub flows_processed:   u64,
    pub messages_consumed: u64,
    pub decode_errors:     u64,
    pub annotation_errors: u64,
    pub refresh_errors:    u64,
    pub topology_errors:   u64,
    pub poll_errors:       u64,
    pub insert_errors:     u64,
    pub rewind_errors:     u64,
    pub commit_errors:     u64,
    pub rows_dropped:      u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            flows_processed:   self.flows_processed.get(),
            messages_consumed: self.messages_consumed.get(),
            decode_errors:     self.decode_errors.get(),
            annotation_errors: self.annotation_errors.get(),
            refresh_errors:    self.refresh_errors.get(),
            topology_errors:   self.topology_errors.get(),
            poll_errors:       self.poll_errors.get(),
            insert_errors:     self.insert_errors.get(),
            rewind_errors:     self.rewind_errors.get(),
            commit_errors:     self.commit_errors.get(),
            rows_dropped:      self.rows_dropped.get(),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "processed={} consumed={} ", self.flows_processed, self.messages_consumed)?;
        write!(f, "decode_errors={} annotation_errors={} ", self.decode_errors, self.annotation_errors)?;
        write!(f, "refresh_errors={} topology_errors={} ", self.refresh_errors, self.topology_errors)?;
        write!(f, "poll_errors={} insert_errors={} ", self.poll_errors, self.insert_errors)?;
        write!(f, "rewind_errors={} ", self.rewind_errors)?;
        write!(f, "commit_errors={} rows_dropped={}", self.commit_errors, self.rows_dropped)
    }
}
