// src/collector.rs
//! Collection loop: batches in, fixes out

use crate::{
    config::GpsConfig,
    display::FixDisplay,
    error::{GpsError, Result},
    sink::FixLog,
    source::{BatchSource, GpsSource},
    tracker::FixTracker,
    upload::{self, LocalObjectStore, ObjectStore},
};
use log::{debug, error, info};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::sleep;

const STOP_POLL: Duration = Duration::from_millis(100);

/// Totals for one collection session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub batches: usize,
    pub records: usize,
    pub fixes: usize,
    pub failures: usize,
    pub uploaded_bytes: Option<usize>,
}

/// Where the finished log goes
pub struct UploadTarget {
    pub store: Box<dyn ObjectStore + Send + Sync>,
    pub bucket: String,
    pub key: String,
}

impl UploadTarget {
    pub fn from_config(config: &GpsConfig) -> Option<Self> {
        config.upload_dir.as_ref().map(|dir| Self {
            store: Box::new(LocalObjectStore::new(dir.clone())),
            bucket: config.upload_bucket.clone(),
            key: config.upload_key.clone(),
        })
    }
}

/// Drives a tracker from a batch source until stopped or exhausted
pub struct GpsCollector {
    running: Arc<AtomicBool>,
    pacing: Option<Duration>,
}

impl GpsCollector {
    /// Create a collector watching `running`; clearing the flag stops it
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self {
            running,
            pacing: None,
        }
    }

    /// Wait `interval` between batches (recorded sources)
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }

    /// Stop the collector before its next batch
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Check if the collector is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Process batches until the flag clears or the source runs dry.
    ///
    /// A batch that has started always finishes. Source and sink failures
    /// end the session with an error.
    pub async fn run<D>(
        &self,
        source: &mut BatchSource,
        tracker: &mut FixTracker,
        display: &mut D,
    ) -> Result<CollectionSummary>
    where
        D: FixDisplay<Error = GpsError>,
    {
        let mut summary = CollectionSummary::default();
        self.run_into(&mut summary, source, tracker, display).await?;
        Ok(summary)
    }

    /// Like [`run`](Self::run), but totals stay in `summary` when it fails.
    pub async fn run_into<D>(
        &self,
        summary: &mut CollectionSummary,
        source: &mut BatchSource,
        tracker: &mut FixTracker,
        display: &mut D,
    ) -> Result<()>
    where
        D: FixDisplay<Error = GpsError>,
    {
        while self.is_running() {
            let batch = match source.next_batch().await? {
                Some(batch) => batch,
                None => {
                    info!("Source exhausted after {} batch(es)", summary.batches);
                    break;
                }
            };
            if batch.trim().is_empty() {
                debug!("Empty batch, nothing received");
                continue;
            }

            let batch_summary = tracker.process_batch(&batch);
            summary.batches += 1;
            summary.fixes += batch_summary.fixes;
            summary.failures += batch_summary.failures;

            let state = tracker.get_coordinates()?;
            summary.records += 1;
            display.show_fix(summary.batches, &state, &batch_summary)?;

            if let Some(interval) = self.pacing {
                self.pause(interval).await;
            }
        }

        Ok(())
    }

    async fn pause(&self, interval: Duration) {
        let mut remaining = interval;
        while !remaining.is_zero() && self.is_running() {
            let step = remaining.min(STOP_POLL);
            sleep(step).await;
            remaining -= step;
        }
    }
}

/// Run one full session from `config`: collect, then upload the log.
pub async fn run_session<D>(
    config: &GpsConfig,
    running: Arc<AtomicBool>,
    display: &mut D,
) -> Result<CollectionSummary>
where
    D: FixDisplay<Error = GpsError>,
{
    let gps_source = GpsSource::from_config(config)?;
    info!("Collecting from {}", gps_source.describe());

    let mut source = BatchSource::open(&gps_source, config.batch_interval()).await?;
    let mut collector = GpsCollector::new(running);
    if !gps_source.is_live() {
        collector = collector.with_pacing(config.batch_interval());
    }

    collect_and_upload(config, &collector, &mut source, display).await
}

/// Collect from an opened source, then upload whatever was recorded.
///
/// The upload also runs when the source fails partway; the source error is
/// returned afterwards.
pub async fn collect_and_upload<D>(
    config: &GpsConfig,
    collector: &GpsCollector,
    source: &mut BatchSource,
    display: &mut D,
) -> Result<CollectionSummary>
where
    D: FixDisplay<Error = GpsError>,
{
    let log = FixLog::new(config.output_path.clone());
    if config.truncate_log {
        log.reset()?;
    }
    let mut tracker = FixTracker::with_policy(log, config.checksum_policy);

    let mut summary = CollectionSummary::default();
    let collected = collector
        .run_into(&mut summary, source, &mut tracker, display)
        .await;
    match &collected {
        Ok(()) => info!(
            "Collection stopped: {} batch(es), {} fix(es), {} bad line(s)",
            summary.batches, summary.fixes, summary.failures
        ),
        Err(e) => error!("Collection interrupted after {} batch(es): {}", summary.batches, e),
    }

    if let Some(target) = UploadTarget::from_config(config) {
        if summary.records == 0 {
            info!("Nothing recorded this session, skipping upload");
        } else {
            match upload::upload_log(target.store.as_ref(), tracker.log(), &target.bucket, &target.key) {
                Ok(bytes) => summary.uploaded_bytes = Some(bytes),
                Err(e) => {
                    error!("Upload failed: {}", e);
                    collected?;
                    return Err(e);
                }
            }
        }
    }

    collected?;
    Ok(summary)
}
