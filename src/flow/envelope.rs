use std::time::{Duration, SystemTime, UNIX_EPOCH};
use prost::Message;
use prost_types::Timestamp;
use super::Error;

/// Wire wrapper the ingest side puts around each sFlow datagram
/// before producing it to the topic.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    #[prost(message, optional, tag = "1")]
    pub receive_timestamp: Option<Timestamp>,
    #[prost(bytes = "vec", tag = "2")]
    pub flow_payload: Vec<u8>,
}

pub fn decode(buf: &[u8]) -> Result<(SystemTime, Vec<u8>), Error> {
    let envelope = Envelope::decode(buf)?;

    let received = match &envelope.receive_timestamp {
        Some(ts) => time(ts)?,
        None     => SystemTime::now(),
    };

    Ok((received, envelope.flow_payload))
}

pub fn encode(received: SystemTime, payload: &[u8]) -> Vec<u8> {
    let since = received.duration_since(UNIX_EPOCH).unwrap_or_default();

    let timestamp = Timestamp {
        seconds: i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
        nanos:   since.subsec_nanos() as i32,
    };

    Envelope {
        receive_timestamp: Some(timestamp),
        flow_payload:      payload.to_vec(),
    }.encode_to_vec()
}

fn time(ts: &Timestamp) -> Result<SystemTime, Error> {
    let secs  = u64::try_from(ts.seconds).map_err(|_| Error::Timestamp(ts.seconds))?;
    let nanos = u32::try_from(ts.nanos).map_err(|_| Error::Timestamp(ts.seconds))?;
    Ok(UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_nanos(u64::from(nanos)))
}
