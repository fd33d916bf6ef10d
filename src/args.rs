use std::str::FromStr;
use std::time::Duration;
use anyhow::Result;

pub fn opt<T: FromStr>(arg: Option<&str>) -> Result<Option<T>> {
    Ok(arg.map(|s| T::from_str(s).map_err(|_| invalid(s))).transpose()?)
}

/// Parse a duration written as an integer with an `ms`, `s` or `m`
/// suffix.
pub fn duration(arg: Option<&str>) -> Result<Option<Duration>> {
    Ok(arg.map(|s| {
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (n, unit) = s.split_at(split);
        let n = u64::from_str(n).map_err(|_| invalid(s))?;
        match unit {
            "ms"     => Ok(Duration::from_millis(n)),
            "s" | "" => Ok(Duration::from_secs(n)),
            "m"      => n.checked_mul(60).map(Duration::from_secs).ok_or_else(|| invalid(s)),
            _        => Err(invalid(s)),
        }
    }).transpose()?)
}

fn invalid(s: &str) -> clap::Error {
    let msg  = format!("invalid argument value '{}'", s);
    let kind = clap::ErrorKind::InvalidValue;
    clap::Error::with_description(&msg, kind)
}
