pub mod decode;
pub mod envelope;
pub mod sample;

pub use decode::decode;
pub use error::Error;
pub use sample::FlowSample;

mod error;

#[cfg(test)]
pub(crate) mod fixture;
