use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs, process};

use image::RgbImage;
use time::OffsetDateTime;
use tokio::process::Command;

use crate::errors::CaptureError;
use crate::settings::{Capture, Settings, SourceMode};

// Perceptual luma weights applied to each channel's mean square.
const LUMA_RED: f64 = 0.241;
const LUMA_GREEN: f64 = 0.691;
const LUMA_BLUE: f64 = 0.068;

const MIDDAY_SECS: i64 = 43_200;

/// An illuminance estimator producing values in [0, 100]. The variant is
/// chosen once at startup and never switched during a run.
pub enum IlluminanceSource {
    Capture(CaptureSource),
    Clock(ClockSource),
}

impl IlluminanceSource {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.sampling.mode {
            SourceMode::Webcam => Self::Capture(CaptureSource::new(settings.capture.clone())),
            SourceMode::Seconds => Self::Clock(ClockSource),
        }
    }

    pub async fn sample(&self) -> Result<i64, CaptureError> {
        match self {
            Self::Capture(source) => source.sample().await,
            Self::Clock(source) => Ok(source.sample()),
        }
    }
}

/// Estimates illuminance from a single still frame grabbed off a capture
/// device by an external tool.
pub struct CaptureSource {
    command: Capture,
}

impl CaptureSource {
    pub fn new(command: Capture) -> Self {
        Self { command }
    }

    async fn sample(&self) -> Result<i64, CaptureError> {
        let frame = FrameArtifact::new();
        // Clear any leftover from a previous crashed run under the same name.
        frame.discard();

        let status = Command::new(&self.command.tool)
            .args(&self.command.flags)
            .arg("-i")
            .arg(&self.command.device)
            .arg("-vframes")
            .arg("1")
            .arg(frame.path())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => CaptureError::ToolMissing(self.command.tool.clone()),
                _ => CaptureError::Io(e),
            })?;

        if !status.success() {
            return Err(CaptureError::ToolFailed(status));
        }

        let still = image::open(frame.path())?.to_rgb8();

        Ok(frame_lux(&still))
    }
}

/// Temporary still-image path, removed on drop regardless of outcome.
struct FrameArtifact {
    path: PathBuf,
}

impl FrameArtifact {
    fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let path = env::temp_dir().join(format!(
            "fake-light-sensor-{}-{nanos}.jpg",
            process::id()
        ));

        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn discard(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

impl Drop for FrameArtifact {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Weighted RMS brightness of a frame, mapped from 0-255 to [0, 100].
///
/// Each channel is reduced to its root-mean-square over all pixels, then the
/// channels are combined as `sqrt(0.241*R^2 + 0.691*G^2 + 0.068*B^2)`; the
/// squares cancel the root, so the per-channel mean squares are used
/// directly.
fn frame_lux(frame: &RgbImage) -> i64 {
    let pixels = f64::from(frame.width()) * f64::from(frame.height());
    if pixels == 0.0 {
        return 0;
    }

    let mut squares = [0.0f64; 3];
    for pixel in frame.pixels() {
        for (sum, channel) in squares.iter_mut().zip(pixel.0) {
            *sum += f64::from(channel) * f64::from(channel);
        }
    }

    let [red, green, blue] = squares.map(|sum| sum / pixels);
    let weighted = (LUMA_RED * red + LUMA_GREEN * green + LUMA_BLUE * blue).sqrt();

    (100.0 * weighted / 255.0).round() as i64
}

/// Synthetic illuminance from the wall-clock time of day: 0 at midnight,
/// ramping linearly to 100 at midday and back down. Pure, cannot fail.
pub struct ClockSource;

impl ClockSource {
    fn sample(&self) -> i64 {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let seconds = i64::from(now.hour()) * 3600
            + i64::from(now.minute()) * 60
            + i64::from(now.second());

        clock_lux(seconds)
    }
}

fn clock_lux(seconds: i64) -> i64 {
    let ramp = seconds * 100 / MIDDAY_SECS;

    if seconds > MIDDAY_SECS {
        100 - (ramp - 100)
    } else {
        ramp
    }
}
