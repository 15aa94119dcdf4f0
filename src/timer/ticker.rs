use std::time::Duration;

use tokio::{
    runtime::Handle,
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::{log_info, log_warn};

/// Signal sent on every background tick. Carries no time: the session
/// controller reads its own clock when it reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
}

/// Background ticker that drives UI refresh and end-of-timer side effects.
/// It is never the source of truth for remaining time.
pub struct Ticker {
    interval: Duration,
    sink: UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Ticker {
    pub fn new(interval: Duration, sink: UnboundedSender<Tick>) -> Self {
        Self {
            interval,
            sink,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawns the tick loop on the current tokio runtime. Returns `false` when
    /// called outside a runtime; timers still work, they just are not ticked.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return true;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                log_warn!("no tokio runtime available; background ticks disabled");
                return false;
            }
        };

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let sink = self.sink.clone();
        let interval = self.interval;

        let handle = runtime.spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut seq: u64 = 0;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        seq = seq.wrapping_add(1);
                        if sink.send(Tick { seq }).is_err() {
                            log_info!("tick receiver dropped; ticker exiting");
                            break;
                        }
                    }
                    _ = token_clone.cancelled() => {
                        log_info!("ticker cancelled after {} ticks", seq);
                        break;
                    }
                }
            }
        });

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        log_info!("ticker started every {:?}", self.interval);
        true
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn start_outside_runtime_is_refused() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new(Duration::from_millis(5), tx);
        assert!(!ticker.start());
        assert!(!ticker.is_running());
    }

    #[tokio::test]
    async fn ticks_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new(Duration::from_millis(5), tx);
        assert!(ticker.start());

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.seq, 1);

        ticker.stop();
        assert!(!ticker.is_running());
        tokio::time::sleep(Duration::from_millis(30)).await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }
}
