pub use decode::decode;

mod decode;

#[cfg(test)]
mod test;
