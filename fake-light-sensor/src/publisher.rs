use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const SENSOR_DIR: &str = "light-sensor";
const VALUE_FILE: &str = "in_illuminance_raw";
const NAME_FILE: &str = "name";
const SENSOR_NAME: &str = "als";

/// Owns the emulated sensor's writable value file.
///
/// `open` bootstraps the endpoint under `<base>/light-sensor/`: parent
/// directories, the `name` identity file (written only if absent) and the
/// value file itself, which stays open for the process lifetime. The files
/// deliberately survive process exit so the last published value remains
/// readable.
pub struct SensorPublisher {
    value_file: File,
}

impl SensorPublisher {
    pub fn open(base_dir: &Path) -> io::Result<Self> {
        let dir = base_dir.join(SENSOR_DIR);
        fs::create_dir_all(&dir)?;

        let name_path = dir.join(NAME_FILE);
        if !name_path.exists() {
            fs::write(&name_path, SENSOR_NAME)?;
        }

        let value_file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(dir.join(VALUE_FILE))?;

        Ok(Self { value_file })
    }

    /// Rewrites the value file with `current` unless it equals the last
    /// published value. Cycles can be as frequent as 15s, so unchanged
    /// readings are debounced into no I/O at all.
    pub fn publish_if_changed(&mut self, current: i64, previous: Option<i64>) -> io::Result<bool> {
        if previous == Some(current) {
            return Ok(false);
        }

        // Truncate first so a shorter value leaves no residual digits.
        self.value_file.set_len(0)?;
        self.value_file.seek(SeekFrom::Start(0))?;
        self.value_file.write_all(current.to_string().as_bytes())?;
        self.value_file.sync_all()?;

        Ok(true)
    }
}

/// Path of the value file under `base_dir`, as consumers will read it.
pub fn value_path(base_dir: &Path) -> PathBuf {
    base_dir.join(SENSOR_DIR).join(VALUE_FILE)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn open_bootstraps_endpoint() {
        let base = tempdir().unwrap();
        let _publisher = SensorPublisher::open(base.path()).unwrap();

        let dir = base.path().join(SENSOR_DIR);
        assert!(dir.is_dir());
        assert_eq!(fs::read_to_string(dir.join(NAME_FILE)).unwrap(), "als");
        assert!(value_path(base.path()).exists());
    }

    #[test]
    fn open_never_rewrites_existing_name_file() {
        let base = tempdir().unwrap();
        let name_path = base.path().join(SENSOR_DIR).join(NAME_FILE);
        fs::create_dir_all(name_path.parent().unwrap()).unwrap();
        fs::write(&name_path, "custom").unwrap();

        let _publisher = SensorPublisher::open(base.path()).unwrap();

        assert_eq!(fs::read_to_string(&name_path).unwrap(), "custom");
    }

    #[test]
    fn unchanged_value_skips_the_write() {
        let base = tempdir().unwrap();
        let mut publisher = SensorPublisher::open(base.path()).unwrap();

        assert!(publisher.publish_if_changed(42, None).unwrap());
        assert!(!publisher.publish_if_changed(42, Some(42)).unwrap());
        assert!(publisher.publish_if_changed(43, Some(42)).unwrap());

        assert_eq!(
            fs::read_to_string(value_path(base.path())).unwrap(),
            "43"
        );
    }

    #[test]
    fn shorter_value_truncates_previous_content() {
        let base = tempdir().unwrap();
        let mut publisher = SensorPublisher::open(base.path()).unwrap();

        assert!(publisher.publish_if_changed(100, None).unwrap());
        assert!(publisher.publish_if_changed(7, Some(100)).unwrap());

        assert_eq!(fs::read_to_string(value_path(base.path())).unwrap(), "7");
    }
}
