use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::SystemTime;
use byteorder::{ByteOrder, BE};
use log::{debug, trace};
use crate::packet;
use super::{Error, FlowSample};

pub const VERSION: u32 = 5;

pub const FLOW_SAMPLE:              u32 = 1;
pub const COUNTER_SAMPLE:           u32 = 2;
pub const EXPANDED_FLOW_SAMPLE:     u32 = 3;
pub const EXPANDED_COUNTER_SAMPLE:  u32 = 4;

pub const RAW_PACKET_HEADER:        u32 = 1;
pub const ETHERNET_FRAME_DATA:      u32 = 2;
pub const IPV4_DATA:                u32 = 3;
pub const IPV6_DATA:                u32 = 4;
pub const EXTENDED_SWITCH:          u32 = 1001;
pub const EXTENDED_ROUTER:          u32 = 1002;
pub const EXTENDED_GATEWAY:         u32 = 1003;

pub const HEADER_ETHERNET:          u32 = 1;

const IFINDEX_MASK: u32 = 0x3fff_ffff;

/// Decode one sFlow v5 datagram. Every flow sample in the datagram
/// yields exactly one record; counter samples yield nothing.
pub fn decode(buf: &[u8], received: SystemTime) -> Result<Vec<FlowSample>, Error> {
    let mut r = Reader::new(buf);

    let version = r.u32("datagram header")?;
    if version != VERSION {
        return Err(Error::Version(version));
    }

    let agent = match r.u32("datagram header")? {
        1 => {
            let b = r.bytes(4, "agent address")?;
            IpAddr::V4(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        },
        2 => {
            let mut a = [0u8; 16];
            a.copy_from_slice(r.bytes(16, "agent address")?);
            IpAddr::V6(Ipv6Addr::from(a))
        },
        n => return Err(Error::AddressType(n)),
    };

    let _sub_agent = r.u32("datagram header")?;
    let sequence   = r.u32("datagram header")?;
    let _uptime    = r.u32("datagram header")?;
    let count      = r.u32("datagram header")?;

    let mut samples = Vec::new();

    for _ in 0..count {
        let format = r.u32("sample header")?;
        let data   = r.opaque("sample")?;

        let base = FlowSample {
            time_received:   received,
            sequence_num:    sequence,
            sampler_address: Some(agent),
            packets:         1,
            ..Default::default()
        };

        let sample = match format {
            FLOW_SAMPLE          => flow(data, base)?,
            EXPANDED_FLOW_SAMPLE => expanded(data, base)?,
            _                    => {
                trace!("skipping sample format {}", format);
                continue;
            }
        };

        samples.push(sample);
    }

    Ok(samples)
}

fn flow(data: &[u8], mut sample: FlowSample) -> Result<FlowSample, Error> {
    let mut r = Reader::new(data);

    r.skip(2, "flow sample")?;
    sample.sampling_rate = r.u32("flow sample")?;
    r.skip(2, "flow sample")?;
    sample.in_if  = r.u32("flow sample")? & IFINDEX_MASK;
    sample.out_if = r.u32("flow sample")? & IFINDEX_MASK;

    records(&mut r, &mut sample)?;

    Ok(sample)
}

fn expanded(data: &[u8], mut sample: FlowSample) -> Result<FlowSample, Error> {
    let mut r = Reader::new(data);

    // sequence, source id, rate, pool, drops, in/out interface
    r.skip(10, "expanded flow sample")?;

    records(&mut r, &mut sample)?;

    Ok(sample)
}

fn records(r: &mut Reader<'_>, sample: &mut FlowSample) -> Result<(), Error> {
    let count = r.u32("record count")?;

    for _ in 0..count {
        let format = r.u32("record header")?;
        let data   = r.opaque("record")?;

        let result = match format {
            RAW_PACKET_HEADER => raw_header(data, sample),
            EXTENDED_SWITCH   => switch(data, sample),
            _                 => Ok(()),
        };

        if let Err(e) = result {
            debug!("skipping record format {}: {}", format, e);
        }
    }

    Ok(())
}

fn raw_header(data: &[u8], sample: &mut FlowSample) -> Result<(), Error> {
    let mut r = Reader::new(data);

    let protocol = r.u32("raw packet header")?;
    let length   = r.u32("raw packet header")?;
    let _strip   = r.u32("raw packet header")?;
    let header   = r.opaque("raw packet header")?;

    if protocol != HEADER_ETHERNET {
        return Err(Error::HeaderProtocol(protocol));
    }

    sample.bytes = u64::from(length);

    packet::decode(header, sample)
}

fn switch(data: &[u8], sample: &mut FlowSample) -> Result<(), Error> {
    let mut r = Reader::new(data);
    sample.src_vlan = r.u32("extended switch")?;
    r.skip(1, "extended switch")?;
    sample.dst_vlan = r.u32("extended switch")?;
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn bytes(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], Error> {
        if self.buf.len() < n {
            return Err(Error::Truncated(what));
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, Error> {
        self.bytes(4, what).map(BE::read_u32)
    }

    fn skip(&mut self, words: usize, what: &'static str) -> Result<(), Error> {
        self.bytes(words * 4, what).map(|_| ())
    }

    // XDR variable-length opaque: length, data, padding to 4 bytes
    fn opaque(&mut self, what: &'static str) -> Result<&'a [u8], Error> {
        let n    = self.u32(what)? as usize;
        let data = self.bytes(n, what)?;
        let pad  = (4 - n % 4) % 4;
        self.bytes(pad.min(self.buf.len()), what)?;
        Ok(data)
    }
}
