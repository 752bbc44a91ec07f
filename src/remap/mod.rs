//! Per-device key remapping
//!
//! Loads `.keys` override files and locates the one that applies to a device.
//!
//! File format, one rule per line:
//!
//! ```text
//! # comment
//! 72 BACK     # key 72 -> KEY_BACK
//! 128 15      # key 128 -> 15 (KEY_TAB)
//! ```
//!
//! The second token is either a decimal keycode or one of
//! `NONE`, `UP`, `DOWN`, `LEFT`, `RIGHT`, `BACK`, `ENTER`.
//! Only the first two tokens of a line are significant.

pub mod search;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use log::{debug, info, warn};

use crate::constants::{REMAP_MAX_KEYS, REMAP_MAX_LINE};
use crate::input::keycodes::remap_symbol;

pub use search::{DeviceIdentity, RemapSearch};

/// One `key -> override` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOverride {
    /// Keycode reported by the device
    pub key: u16,
    /// Keycode delivered instead
    pub code: u16,
}

/// Ordered overrides for one device, at most `REMAP_MAX_KEYS` long.
///
/// Never empty: loading a file without rules yields no table at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapTable {
    entries: Vec<KeyOverride>,
}

impl RemapTable {
    /// Build a table from rules in order. Rules past capacity are dropped.
    /// Returns None for an empty rule list.
    pub fn from_overrides<I: IntoIterator<Item = KeyOverride>>(rules: I) -> Option<Self> {
        let entries: Vec<KeyOverride> = rules.into_iter().take(REMAP_MAX_KEYS).collect();
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    /// Override for `key`; the first matching rule wins
    pub fn lookup(&self, key: u16) -> Option<u16> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// False for any table produced by the loader
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Table has room for no further rules
    pub fn is_full(&self) -> bool {
        self.entries.len() == REMAP_MAX_KEYS
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyOverride> {
        self.entries.iter()
    }
}

/// Resolve the override token of a rule.
///
/// A token starting with a digit is read as its leading decimal digits
/// (`16abc` is 16); otherwise it must be one of the symbolic names.
pub fn parse_symbol(token: &str) -> Option<u16> {
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        let end = token
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.len());
        return token[..end].parse().ok();
    }
    remap_symbol(token)
}

/// Parse one line (without its newline). Comments, blank lines and
/// malformed rules yield None.
///
/// The key token must be a whole decimal `u16`; only the override token
/// accepts a digit prefix (see [`parse_symbol`]).
pub fn parse_line(line: &str) -> Option<KeyOverride> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut tokens = line.split_whitespace();
    let key = tokens.next()?.parse::<u16>().ok()?;
    let code = parse_symbol(tokens.next()?)?;
    Some(KeyOverride { key, code })
}

/// Parse rules from a reader, stopping once the table is full.
///
/// Lines longer than `REMAP_MAX_LINE` bytes are truncated; the excess is
/// skipped without being buffered, and never read as a new line.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Option<RemapTable> {
    let mut entries = Vec::with_capacity(REMAP_MAX_KEYS);
    let mut raw = Vec::with_capacity(REMAP_MAX_LINE + 1);
    loop {
        raw.clear();
        let limit = (REMAP_MAX_LINE + 1) as u64;
        match reader.by_ref().take(limit).read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Remap read error: {}", e);
                break;
            }
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
        } else if raw.len() > REMAP_MAX_LINE {
            raw.truncate(REMAP_MAX_LINE);
            if let Err(e) = skip_line(&mut reader) {
                warn!("Remap read error: {}", e);
                break;
            }
        }

        let line = String::from_utf8_lossy(&raw);
        if let Some(rule) = parse_line(&line) {
            debug!("ID:{:3} -> {}", rule.key, rule.code);
            entries.push(rule);
            if entries.len() == REMAP_MAX_KEYS {
                debug!("Stop loading, maximum reached");
                break;
            }
        }
    }
    RemapTable::from_overrides(entries)
}

/// Discard input up to and including the next newline.
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let (found, used) = {
            let buf = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, buf.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(());
        }
    }
}

/// Load a remap file. Unopenable files and files without rules yield None.
pub fn load_file(path: &Path) -> Option<RemapTable> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("Remap file {}: {}", path.display(), e);
            return None;
        }
    };
    let table = parse_reader(BufReader::new(file));
    info!(
        "Loaded {} overrides from {}",
        table.as_ref().map_or(0, RemapTable::len),
        path.display()
    );
    table
}
