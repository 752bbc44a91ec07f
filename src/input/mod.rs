//! Input handling
//!
//! Multiplex evdev devices and caller-supplied descriptors.
//! - Device discovery under /dev/input with capability filtering
//! - poll(2) based wait/dispatch to per-descriptor handlers
//! - Per-device key remapping on read (see [`crate::remap`])

pub mod cmdline;
pub mod device;
pub mod error;
pub mod event;
pub mod ioctl_helpers;
pub mod keycodes;
pub mod mux;
#[cfg(test)]
pub(crate) mod testing;

pub use device::{Device, EvdevDevice};
pub use error::InputError;
pub use event::{EventTypes, InputEvent, InputId, KeyBits, Readiness, INPUT_EVENT_SIZE};
pub use mux::{DescriptorId, EventHandler, EventMux, Ready, SlotKind};
