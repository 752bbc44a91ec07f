//! Global constants for evmux
//!
//! Consolidates registry capacities, parser bounds, and default paths
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Registry Capacities
// ============================================================================

/// Maximum number of devices registered during discovery
pub const MAX_DEVICES: usize = 16;

/// Maximum number of manually registered descriptors
pub const MAX_MISC_FDS: usize = 16;

// ============================================================================
// Remap Tables
// ============================================================================

/// Maximum number of overrides held by one remap table
pub const REMAP_MAX_KEYS: usize = 16;

/// Longest significant line in a `.keys` file (bytes, excluding newline).
/// Anything past this is discarded.
pub const REMAP_MAX_LINE: usize = 127;

/// Extension of remap files
pub const REMAP_FILE_EXT: &str = "keys";

/// Fallback remap file name (without extension)
pub const REMAP_GENERIC_NAME: &str = "Generic";

// ============================================================================
// Device Queries
// ============================================================================

/// Buffer size for EVIOCGNAME (including the NUL terminator)
pub const DEVICE_NAME_MAX: usize = 64;

/// Device node name prefix in the enumeration directory
pub const EVENT_NODE_PREFIX: &str = "event";

/// Boot parameter carrying the device tag
pub const DEVICE_TAG_PARAM: &str = "DEVICE";

/// Maximum number of bytes read from the boot command line
pub const CMDLINE_MAX: usize = 1024;

// ============================================================================
// Default Paths
// ============================================================================

/// Device enumeration directory
pub const DEFAULT_DEVICE_DIR: &str = "/dev/input";

/// Kernel command line
pub const DEFAULT_CMDLINE_PATH: &str = "/proc/cmdline";

/// External storage root; tagged files live under `{root}/devices/{tag}/`
pub const DEFAULT_SDCARD_DIR: &str = "/sdcard";

/// Writable remap directory (searched first)
pub const DEFAULT_USER_REMAP_DIR: &str = "/sdcard/devices/.input";

/// Bundled read-only remap directory (searched second)
pub const DEFAULT_RES_REMAP_DIR: &str = "/res/input";
