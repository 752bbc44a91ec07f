//! Input device capability interface
//!
//! The multiplexer and the remap search only talk to devices through
//! [`Device`], so anything readable with an fd can be monitored and tests
//! can substitute fake devices for kernel nodes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};

use log::debug;

use super::event::{EventTypes, InputId, KeyBits};
use super::ioctl_helpers;
use crate::constants::EVENT_NODE_PREFIX;

/// A readable event source with evdev-style queries
pub trait Device: AsFd + Read {
    /// Event types the device declares
    fn capabilities(&self) -> io::Result<EventTypes>;

    /// Device name as reported by the driver
    fn name(&self) -> io::Result<String>;

    /// Bus/vendor/product/version
    fn identity(&self) -> io::Result<InputId>;

    /// Keys currently held down
    fn pressed_keys(&self) -> io::Result<KeyBits>;

    /// Short description for log messages
    fn label(&self) -> String {
        format!("fd {}", self.as_fd().as_raw_fd())
    }
}

/// Kernel evdev node (or any other fd; queries then fail with ENOTTY)
pub struct EvdevDevice {
    file: File,
    path: Option<PathBuf>,
}

impl EvdevDevice {
    /// Open a device node read-only
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }
}

impl From<File> for EvdevDevice {
    fn from(file: File) -> Self {
        Self { file, path: None }
    }
}

impl AsFd for EvdevDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl Read for EvdevDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Device for EvdevDevice {
    fn capabilities(&self) -> io::Result<EventTypes> {
        ioctl_helpers::event_types(self.file.as_raw_fd())
    }

    fn name(&self) -> io::Result<String> {
        ioctl_helpers::device_name(self.file.as_raw_fd())
    }

    fn identity(&self) -> io::Result<InputId> {
        ioctl_helpers::device_id(self.file.as_raw_fd())
    }

    fn pressed_keys(&self) -> io::Result<KeyBits> {
        ioctl_helpers::key_state(self.file.as_raw_fd())
    }

    fn label(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => format!("fd {}", self.file.as_raw_fd()),
        }
    }
}

/// Parse the numeric suffix of an `event<N>` node name
pub fn event_node_number(name: &str) -> Option<u32> {
    let suffix = name.strip_prefix(EVENT_NODE_PREFIX)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Check whether a directory entry name is an evdev node
#[inline]
pub fn is_event_node(name: &str) -> bool {
    event_node_number(name).is_some()
}

/// List `event<N>` nodes in `dir`, ordered by N.
///
/// Entries that cannot be read are skipped.
pub fn scan_event_nodes(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = event_node_number(name.to_str()?)?;
            Some((number, entry.path()))
        })
        .collect();
    nodes.sort_by_key(|(number, _)| *number);
    debug!("{}: {} event nodes", dir.display(), nodes.len());
    Ok(nodes.into_iter().map(|(_, path)| path).collect())
}
