use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture tool `{0}` not found")]
    ToolMissing(String),

    #[error("capture tool exited with {0}")]
    ToolFailed(ExitStatus),

    #[error("failed to decode captured frame: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another instance is already running (lock marker at {})", .0.display())]
    AlreadyRunning(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DaemonError {
    /// Process exit code reported for this failure. Zero is reserved for
    /// signal-driven clean shutdown.
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::Lock(LockError::AlreadyRunning(_)) => 2,
            DaemonError::Capture(CaptureError::ToolMissing(_)) => 3,
            DaemonError::Capture(CaptureError::ToolFailed(_)) => 4,
            _ => 1,
        }
    }
}
