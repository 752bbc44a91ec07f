//! Boot parameter lookup
//!
//! The device tag selects board-specific remap files. It comes from a
//! `DEVICE=<tag>` token on the kernel command line.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use crate::constants::{CMDLINE_MAX, DEVICE_TAG_PARAM};

/// Extract the value of `key` from a space-separated `KEY=VALUE` blob.
///
/// The last occurrence wins. An empty value (`DEVICE=`) counts as absent,
/// including when it overrides an earlier non-empty one, so no tagged remap
/// candidates are built from an empty tag.
pub fn param_value<'a>(cmdline: &'a str, key: &str) -> Option<&'a str> {
    cmdline
        .trim_end_matches('\n')
        .split(' ')
        .filter_map(|token| token.split_once('='))
        .filter(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .last()
        .filter(|v| !v.is_empty())
}

/// Device tag from a command line blob
pub fn parse_device_tag(cmdline: &str) -> Option<String> {
    param_value(cmdline, DEVICE_TAG_PARAM).map(str::to_string)
}

/// Read the device tag from `path` (normally /proc/cmdline).
///
/// At most `CMDLINE_MAX` bytes are considered. A missing or unreadable file
/// yields None.
pub fn read_device_tag(path: &Path) -> Option<String> {
    let mut buf = Vec::with_capacity(CMDLINE_MAX);
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    if let Err(e) = file.take(CMDLINE_MAX as u64).read_to_end(&mut buf) {
        debug!("Cannot read {}: {}", path.display(), e);
        return None;
    }
    let tag = parse_device_tag(&String::from_utf8_lossy(&buf));
    if let Some(tag) = &tag {
        info!("Device tag: {}", tag);
    }
    tag
}
