use std::future::Future;
use std::time::Duration;
use anyhow::Result;
use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Run `refresh` every `interval` until `shutdown` is cancelled. The
/// first refresh is the caller's job; a failed refresh is logged and
/// reported through `failed`, and the next one runs on schedule.
pub fn spawn<R, F, E>(name: String, interval: Duration, shutdown: CancellationToken, failed: E, mut refresh: R) -> JoinHandle<()>
where
    R: FnMut() -> F + Send + 'static,
    F: Future<Output = Result<()>> + Send,
    E: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(interval)      => (),
            }

            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                r = refresh()            => r,
            };

            match result {
                Ok(()) => debug!("{} refreshed", name),
                Err(e) => {
                    warn!("{} refresh failed: {:?}", name, e);
                    failed();
                }
            }
        }
        debug!("{} refresh stopped", name);
    })
}
