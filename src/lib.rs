//! evmux - evdev input multiplexer for Linux console UIs
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            Consumer (UI loop)            │
//! ├──────────────────────────────────────────┤
//! │  EventMux: wait → dispatch → handler     │
//! │      ↑ Ready::read_event (+ remap)       │
//! ├──────────────────────────────────────────┤
//! │  Remap: .keys loader + file search       │
//! ├──────────────────────────────────────────┤
//! │  /dev/input/eventN (ioctl, read, poll)   │
//! └──────────────────────────────────────────┘
//! ```

pub mod config;
pub mod constants;
pub mod input;
pub mod remap;

pub use config::Config;
pub use input::{
    DescriptorId, Device, EvdevDevice, EventHandler, EventMux, InputError, InputEvent, Ready,
    Readiness, SlotKind,
};
pub use remap::{RemapSearch, RemapTable};
