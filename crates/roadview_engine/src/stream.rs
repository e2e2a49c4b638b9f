use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use roadview_logging::{roadview_info, roadview_warn};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::backend::{BackendClient, EventSink};
use crate::config::CacheBustFn;
use crate::{EngineConfig, EngineEvent};

/// Feed progress is reported every time this many more bytes have arrived.
pub const FEED_PROGRESS_STEP: u64 = 256 * 1024;

/// Drives the live feed and the metrics poll of the single-stream mode.
///
/// The two loops are independent: a broken feed never stops metrics.
pub struct MetricsStreamer {
    backend: Arc<dyn BackendClient>,
    sink: Arc<dyn EventSink>,
    metrics_interval: Duration,
    start_delay: Duration,
    cache_bust: CacheBustFn,
    feed: Option<JoinHandle<()>>,
    metrics: Option<JoinHandle<()>>,
}

impl MetricsStreamer {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        sink: Arc<dyn EventSink>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            backend,
            sink,
            metrics_interval: config.metrics_interval,
            start_delay: config.stream_start_delay,
            cache_bust: config.cache_bust.clone(),
            feed: None,
            metrics: None,
        }
    }

    /// (Re)opens the live feed with a fresh cache-bust value and starts the
    /// metrics loop if it is not running yet. Must be called on a tokio runtime.
    pub fn start_stream(&mut self) {
        if let Some(previous) = self.feed.take() {
            previous.abort();
        }
        self.feed = Some(tokio::spawn(run_feed(
            self.backend.clone(),
            self.sink.clone(),
            self.start_delay,
            self.cache_bust.clone(),
        )));

        if !self.has_metrics_loop() {
            self.metrics = Some(tokio::spawn(run_metrics(
                self.backend.clone(),
                self.sink.clone(),
                self.start_delay,
                self.metrics_interval,
            )));
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.feed.as_ref().is_some_and(|feed| !feed.is_finished())
    }

    pub fn has_metrics_loop(&self) -> bool {
        self.metrics.as_ref().is_some_and(|metrics| !metrics.is_finished())
    }
}

impl Drop for MetricsStreamer {
    fn drop(&mut self) {
        for task in [self.feed.take(), self.metrics.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

async fn run_feed(
    backend: Arc<dyn BackendClient>,
    sink: Arc<dyn EventSink>,
    start_delay: Duration,
    cache_bust: CacheBustFn,
) {
    tokio::time::sleep(start_delay).await;
    let mut stream = match backend.open_feed(cache_bust()).await {
        Ok(stream) => stream,
        Err(error) => {
            sink.emit(EngineEvent::StreamFailed { error });
            return;
        }
    };
    sink.emit(EngineEvent::StreamConnected);

    let mut received = 0u64;
    let mut next_report = 0u64;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                received += bytes.len() as u64;
                if received >= next_report {
                    sink.emit(EngineEvent::FeedProgress { bytes: received });
                    next_report = received + FEED_PROGRESS_STEP;
                }
            }
            Err(error) => {
                sink.emit(EngineEvent::StreamFailed { error });
                return;
            }
        }
    }
    sink.emit(EngineEvent::FeedProgress { bytes: received });
    roadview_info!("Live feed ended after {} bytes", received);
}

async fn run_metrics(
    backend: Arc<dyn BackendClient>,
    sink: Arc<dyn EventSink>,
    start_delay: Duration,
    period: Duration,
) {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + start_delay + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match backend.metrics().await {
            Ok(report) => sink.emit(EngineEvent::Metrics(report)),
            Err(err) => roadview_warn!("Metrics poll failed: {}", err),
        }
    }
}
