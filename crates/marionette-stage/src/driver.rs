//! Headless frame driver - a tokio interval standing in for the display's
//! frame callback

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::Stage;

/// A stage shared between the driver and its controllers
pub type SharedStage = Arc<Mutex<Stage>>;

/// Frame driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Time between frames, in milliseconds
    pub frame_interval_ms: u64,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            frame_interval_ms: 16,
            max_frames: None,
        }
    }
}

impl DriverConfig {
    /// 30 fps, for hosts that only need the anchor and mouth level
    pub fn low_power() -> Self {
        DriverConfig {
            frame_interval_ms: 33,
            ..Default::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

/// Why the driver returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveExit {
    /// The shutdown flag was raised or its sender dropped
    Shutdown,
    /// `max_frames` reached
    FrameLimit,
    /// The stage was disposed from elsewhere
    Disposed,
}

/// Summary of one driver run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    pub frames: u64,
    pub exit: DriveExit,
}

/// Tick `stage` on a fixed interval until shutdown.
///
/// Host timestamps are measured from the start of the run; late ticks are
/// skipped rather than replayed. The stage lock is held only for the
/// duration of one frame.
pub async fn drive(stage: SharedStage, config: DriverConfig, mut shutdown: watch::Receiver<bool>) -> DriveSummary {
    let mut interval = tokio::time::interval(config.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut frames = 0u64;
    info!(interval_ms = config.frame_interval_ms, "frame driver started");

    let exit = loop {
        if *shutdown.borrow() {
            break DriveExit::Shutdown;
        }
        if config.max_frames.is_some_and(|max| frames >= max) {
            break DriveExit::FrameLimit;
        }
        tokio::select! {
            _ = interval.tick() => {
                let host_ms = started.elapsed().as_secs_f64() * 1000.0;
                let mut stage = stage.lock();
                if stage.is_disposed() {
                    break DriveExit::Disposed;
                }
                stage.tick(host_ms);
                frames += 1;
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!("shutdown sender dropped");
                    break DriveExit::Shutdown;
                }
            }
        }
    };

    info!(frames, exit = ?exit, "frame driver stopped");
    DriveSummary { frames, exit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StageConfig;
    use marionette_core::MemoryAssetSource;
    use marionette_puppet::testing::RecordingPuppet;
    use marionette_puppet::Size;

    fn shared(puppet: &RecordingPuppet) -> SharedStage {
        let stage = Stage::new(
            Box::new(puppet.clone()),
            Arc::new(MemoryAssetSource::new()),
            None,
            Size::new(320.0, 240.0),
            1.0,
            StageConfig::default(),
        )
        .unwrap();
        Arc::new(Mutex::new(stage))
    }

    #[tokio::test]
    async fn test_frame_limit() {
        let puppet = RecordingPuppet::new();
        let stage = shared(&puppet);
        let (_tx, rx) = watch::channel(false);
        let config = DriverConfig {
            frame_interval_ms: 1,
            max_frames: Some(5),
        };

        let summary = drive(Arc::clone(&stage), config, rx).await;
        assert_eq!(summary, DriveSummary { frames: 5, exit: DriveExit::FrameLimit });
        assert_eq!(puppet.update_count(), 5);
        assert!(stage.lock().is_ready());
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let puppet = RecordingPuppet::new();
        let stage = shared(&puppet);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(drive(Arc::clone(&stage), DriverConfig::default(), rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        let summary = handle.await.unwrap();
        assert_eq!(summary.exit, DriveExit::Shutdown);
        assert!(summary.frames >= 1);
    }

    #[tokio::test]
    async fn test_already_shut_down() {
        let stage = shared(&RecordingPuppet::new());
        let (_tx, rx) = watch::channel(true);
        let summary = drive(stage, DriverConfig::default(), rx).await;
        assert_eq!(summary, DriveSummary { frames: 0, exit: DriveExit::Shutdown });
    }

    #[tokio::test]
    async fn test_stops_on_dispose() {
        let stage = shared(&RecordingPuppet::new());
        stage.lock().dispose();
        let (_tx, rx) = watch::channel(false);
        let summary = drive(stage, DriverConfig::default(), rx).await;
        assert_eq!(summary.exit, DriveExit::Disposed);
        assert_eq!(summary.frames, 0);
    }
}
