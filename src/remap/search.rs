//! Remap file discovery
//!
//! Candidate files are tried in a fixed order and the first one that loads
//! wins; later candidates are never opened:
//!
//! ```text
//! {sdcard}/devices/{tag}/{name}.keys                 (tag given)
//! for each search dir (writable first, bundled second):
//!     Vendor_{vvvv}_Product_{pppp}_Version_{rrrr}.keys   (vendor != 0)
//!     Vendor_{vvvv}_Product_{pppp}.keys                  (vendor != 0)
//!     {name}_{tag}.keys                                  (tag given)
//!     {name}.keys                                        (name non-empty)
//!     Generic.keys
//! ```

use std::path::{Path, PathBuf};

use log::debug;

use super::{load_file, RemapTable};
use crate::config::RemapConfig;
use crate::constants::{REMAP_FILE_EXT, REMAP_GENERIC_NAME};
use crate::input::event::InputId;
use crate::input::Device;

/// What the search needs to know about a device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Driver-reported name, empty if unavailable
    pub name: String,
    /// Vendor/product/version, zero if unavailable
    pub id: InputId,
}

impl DeviceIdentity {
    /// Query a device. Failed queries fall back to empty/zero values.
    pub fn query(device: &dyn Device) -> Self {
        Self {
            name: device.name().unwrap_or_default(),
            id: device.identity().unwrap_or_default(),
        }
    }
}

/// One way of building a candidate path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    /// `{sdcard}/devices/{tag}/{name}.keys`
    Tagged,
    /// `Vendor_..._Product_..._Version_....keys`
    VendorProductVersion,
    /// `Vendor_..._Product_....keys`
    VendorProduct,
    /// `{name}_{tag}.keys`
    NameWithTag,
    /// `{name}.keys`
    Name,
    /// `Generic.keys`
    Generic,
}

/// Per-search-dir candidates, in priority order
const DIR_CANDIDATES: [Candidate; 5] = [
    Candidate::VendorProductVersion,
    Candidate::VendorProduct,
    Candidate::NameWithTag,
    Candidate::Name,
    Candidate::Generic,
];

impl Candidate {
    /// Path for this candidate, or None if it does not apply to the device
    fn build(self, root: &Path, tag: Option<&str>, ident: &DeviceIdentity) -> Option<PathBuf> {
        let id = &ident.id;
        let stem = match self {
            Candidate::Tagged => {
                return Some(
                    root.join("devices")
                        .join(relative(tag?))
                        .join(keys_file(relative(&ident.name))),
                );
            }
            Candidate::VendorProductVersion if id.vendor != 0 => format!(
                "Vendor_{:04x}_Product_{:04x}_Version_{:04x}",
                id.vendor, id.product, id.version
            ),
            Candidate::VendorProduct if id.vendor != 0 => {
                format!("Vendor_{:04x}_Product_{:04x}", id.vendor, id.product)
            }
            Candidate::NameWithTag => format!("{}_{}", ident.name, tag?),
            Candidate::Name if !ident.name.is_empty() => ident.name.clone(),
            Candidate::Generic => REMAP_GENERIC_NAME.to_string(),
            _ => return None,
        };
        Some(root.join(keys_file(relative(&stem))))
    }
}

/// Drop leading separators so a tag or name can never replace `root`
fn relative(part: &str) -> &str {
    part.trim_start_matches('/')
}

fn keys_file(stem: &str) -> String {
    format!("{}.{}", stem, REMAP_FILE_EXT)
}

/// Remap file locator
#[derive(Debug, Clone)]
pub struct RemapSearch {
    /// Root holding `devices/{tag}/` directories
    sdcard_dir: PathBuf,
    /// Directories searched in order
    search_dirs: Vec<PathBuf>,
}

impl RemapSearch {
    pub fn new(sdcard_dir: impl Into<PathBuf>, search_dirs: Vec<PathBuf>) -> Self {
        Self {
            sdcard_dir: sdcard_dir.into(),
            search_dirs,
        }
    }

    pub fn from_config(config: &RemapConfig) -> Self {
        Self::new(config.sdcard_dir.clone(), config.search_dirs.clone())
    }

    /// Candidate paths in priority order, built lazily
    pub fn candidates<'a>(
        &'a self,
        tag: Option<&'a str>,
        ident: &'a DeviceIdentity,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        let tagged = Candidate::Tagged.build(&self.sdcard_dir, tag, ident);
        let per_dir = self.search_dirs.iter().flat_map(move |root| {
            DIR_CANDIDATES
                .iter()
                .filter_map(move |candidate| candidate.build(root, tag, ident))
        });
        tagged.into_iter().chain(per_dir)
    }

    /// First candidate `load` accepts. Candidates after it are not built.
    pub fn find_with<F>(&self, tag: Option<&str>, ident: &DeviceIdentity, mut load: F) -> Option<RemapTable>
    where
        F: FnMut(&Path) -> Option<RemapTable>,
    {
        let found = self.candidates(tag, ident).find_map(|path| {
            debug!("Trying remap file {}", path.display());
            load(&path)
        });
        if found.is_none() {
            debug!("No remap file for {:?} (tag={:?})", ident.name, tag);
        }
        found
    }

    /// Locate and load the remap table for a device
    pub fn find(&self, tag: Option<&str>, device: &dyn Device) -> Option<RemapTable> {
        let ident = DeviceIdentity::query(device);
        self.find_with(tag, &ident, load_file)
    }
}
