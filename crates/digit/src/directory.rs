//! DIGIT device discovery via the sysfs video4linux class.
//!
//! Every `/sys/class/video4linux/videoN` node links to the USB interface
//! that registered it; the USB device directory above that carries the
//! `manufacturer`, `product`, `serial`, and `bcdDevice` attributes.
//! Enumeration re-reads sysfs on every call; attach state can change
//! between calls, so results are never cached.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Product string reported by DIGIT firmware.
pub const DIGIT_MODEL: &str = "DIGIT";

const SYSFS_VIDEO4LINUX: &str = "/sys/class/video4linux";

/// Identity record for one attached DIGIT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    /// Device node used to open the capture session, e.g. `/dev/video4`.
    pub device_path: String,
    pub manufacturer: String,
    pub model: String,
    /// Firmware revision, decimal parse of `bcdDevice` ("0200" → 200).
    pub revision: u16,
    /// USB serial number. Unique among attached devices at enumeration
    /// time; a serial can reappear on replug.
    pub serial: String,
}

/// Enumerates attached DIGIT devices.
pub struct DeviceDirectory {
    sysfs_root: PathBuf,
}

impl Default for DeviceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDirectory {
    pub fn new() -> Self {
        Self::with_sysfs_root(SYSFS_VIDEO4LINUX)
    }

    /// Enumerate against an alternate sysfs class root (tests, containers).
    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
        }
    }

    /// One descriptor per attached DIGIT, in directory-read order.
    /// Returns an empty vec, never an error, when nothing matches.
    pub fn list_devices(&self) -> Vec<DeviceDescriptor> {
        let Ok(entries) = fs::read_dir(&self.sysfs_root) else {
            return Vec::new();
        };

        let mut devices = Vec::new();
        for entry in entries.flatten() {
            let node = entry.file_name();
            let Some(node) = node.to_str() else {
                continue;
            };
            if !node.starts_with("video") {
                continue;
            }
            let Some(descriptor) = read_descriptor(&entry.path(), format!("/dev/{node}")) else {
                continue;
            };
            if descriptor.model != DIGIT_MODEL {
                continue;
            }
            tracing::debug!(
                path = %descriptor.device_path,
                serial = %descriptor.serial,
                revision = descriptor.revision,
                "found DIGIT device"
            );
            devices.push(descriptor);
        }

        if devices.is_empty() {
            tracing::debug!(root = %self.sysfs_root.display(), "no DIGIT devices attached");
        }
        devices
    }

    /// Resolve a serial number to its descriptor, first match wins.
    pub fn find_device(&self, serial: &str) -> Option<DeviceDescriptor> {
        let found = self
            .list_devices()
            .into_iter()
            .find(|d| d.serial == serial);
        if found.is_none() {
            tracing::debug!(serial, "no DIGIT with matching serial");
        }
        found
    }
}

/// Read the USB identity attributes behind a `videoN` class node.
///
/// The node's `device` entry points at the USB interface directory; the
/// attribute files live either there or on its parent (the USB device
/// directory). Nodes with missing or unparsable attributes are skipped.
fn read_descriptor(video_dir: &Path, device_path: String) -> Option<DeviceDescriptor> {
    let interface_dir = fs::canonicalize(video_dir.join("device")).ok()?;

    let usb_dir = [Some(interface_dir.as_path()), interface_dir.parent()]
        .into_iter()
        .flatten()
        .find(|dir| dir.join("serial").exists())?;

    let attr = |name: &str| -> Option<String> {
        fs::read_to_string(usb_dir.join(name))
            .ok()
            .map(|s| s.trim().to_string())
    };

    Some(DeviceDescriptor {
        device_path,
        manufacturer: attr("manufacturer")?,
        model: attr("product")?,
        revision: attr("bcdDevice")?.parse().ok()?,
        serial: attr("serial")?,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    /// Lay out a fake sysfs video4linux node with USB attributes.
    pub fn add_device(root: &Path, node: &str, serial: &str, model: &str, revision: &str) {
        let usb_dir = root.join(node).join("device");
        fs::create_dir_all(&usb_dir).unwrap();
        fs::write(usb_dir.join("manufacturer"), "Facebook\n").unwrap();
        fs::write(usb_dir.join("product"), format!("{model}\n")).unwrap();
        fs::write(usb_dir.join("serial"), format!("{serial}\n")).unwrap();
        fs::write(usb_dir.join("bcdDevice"), format!("{revision}\n")).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::add_device;
    use tempfile::tempdir;

    #[test]
    fn lists_one_descriptor_per_device() {
        let root = tempdir().unwrap();
        add_device(root.path(), "video2", "D00001", "DIGIT", "0200");
        add_device(root.path(), "video4", "D00002", "DIGIT", "0200");

        let directory = DeviceDirectory::with_sysfs_root(root.path());
        let mut devices = directory.list_devices();
        devices.sort_by(|a, b| a.serial.cmp(&b.serial));

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "D00001");
        assert_eq!(devices[0].device_path, "/dev/video2");
        assert_eq!(devices[0].manufacturer, "Facebook");
        assert_eq!(devices[0].model, "DIGIT");
        assert_eq!(devices[0].revision, 200);
        assert_eq!(devices[1].device_path, "/dev/video4");
    }

    #[test]
    fn empty_when_no_devices_attached() {
        let root = tempdir().unwrap();
        let directory = DeviceDirectory::with_sysfs_root(root.path());
        assert!(directory.list_devices().is_empty());
    }

    #[test]
    fn empty_when_sysfs_root_missing() {
        let directory = DeviceDirectory::with_sysfs_root("/nonexistent/sysfs/root");
        assert!(directory.list_devices().is_empty());
    }

    #[test]
    fn skips_non_digit_devices() {
        let root = tempdir().unwrap();
        add_device(root.path(), "video0", "CAM123", "Integrated Webcam", "0101");
        add_device(root.path(), "video2", "D00001", "DIGIT", "0200");

        let directory = DeviceDirectory::with_sysfs_root(root.path());
        let devices = directory.list_devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].serial, "D00001");
    }

    #[test]
    fn skips_nodes_with_missing_attributes() {
        let root = tempdir().unwrap();
        // Node with a device dir but no USB attributes at all.
        fs::create_dir_all(root.path().join("video6").join("device")).unwrap();
        add_device(root.path(), "video2", "D00001", "DIGIT", "0200");

        let directory = DeviceDirectory::with_sysfs_root(root.path());
        assert_eq!(directory.list_devices().len(), 1);
    }

    #[test]
    fn finds_device_by_exact_serial() {
        let root = tempdir().unwrap();
        add_device(root.path(), "video2", "D00001", "DIGIT", "0200");
        add_device(root.path(), "video4", "D00002", "DIGIT", "0200");

        let directory = DeviceDirectory::with_sysfs_root(root.path());
        let found = directory.find_device("D00002").unwrap();
        assert_eq!(found.device_path, "/dev/video4");
    }

    #[test]
    fn find_device_returns_none_for_unknown_serial() {
        let root = tempdir().unwrap();
        add_device(root.path(), "video2", "D00001", "DIGIT", "0200");

        let directory = DeviceDirectory::with_sysfs_root(root.path());
        assert!(directory.find_device("D0000").is_none());
        assert!(directory.find_device("UNKNOWN").is_none());
    }
}
