//! evdev wire types
//!
//! `struct input_event` records read from device nodes, and the bitmaps
//! returned by the capability, key-state and poll queries.

use std::fmt;

use bitflags::bitflags;

use super::keycodes::{EV_ABS, EV_KEY, EV_MSC, EV_REL, EV_SW, EV_SYN, KEY_CNT, KEY_MAX};

/// One `struct input_event` as the kernel writes it
#[repr(C)]
#[derive(Clone, Copy)]
pub struct InputEvent {
    /// Kernel timestamp
    pub time: libc::timeval,
    /// Event type (EV_KEY, EV_REL, ...)
    pub type_: u16,
    /// Type-specific code (keycode, axis)
    pub code: u16,
    /// Type-specific value (1=press, 0=release, 2=repeat for keys)
    pub value: i32,
}

/// Size of one event record; reads are done in whole records only
pub const INPUT_EVENT_SIZE: usize = std::mem::size_of::<InputEvent>();

impl InputEvent {
    /// Build an event with a zero timestamp
    pub fn new(type_: u16, code: u16, value: i32) -> Self {
        // timeval layout differs between targets; zero it wholesale
        let time: libc::timeval = unsafe { std::mem::zeroed() };
        Self {
            time,
            type_,
            code,
            value,
        }
    }

    /// Decode a record from raw bytes. Returns None if the buffer is too short.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < INPUT_EVENT_SIZE {
            return None;
        }
        // Every bit pattern is a valid InputEvent
        Some(unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const InputEvent) })
    }

    /// Raw bytes of this record, as read from or written to a device
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self as *const Self as *const u8, INPUT_EVENT_SIZE) }
    }

    /// Key event whose code fits in the key state bitmap
    #[inline]
    pub fn is_key(&self) -> bool {
        self.type_ == EV_KEY && self.code <= KEY_MAX
    }
}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputEvent")
            .field("sec", &self.time.tv_sec)
            .field("usec", &self.time.tv_usec)
            .field("type", &self.type_)
            .field("code", &self.code)
            .field("value", &self.value)
            .finish()
    }
}

/// `struct input_id` (EVIOCGID)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

bitflags! {
    /// Event categories a device declares (EVIOCGBIT(0))
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventTypes: u32 {
        const SYN = 1 << EV_SYN as u32;
        const KEY = 1 << EV_KEY as u32;
        const REL = 1 << EV_REL as u32;
        const ABS = 1 << EV_ABS as u32;
        const MSC = 1 << EV_MSC as u32;
        const SW = 1 << EV_SW as u32;
        const LED = 1 << 0x11;
        const SND = 1 << 0x12;
        const REP = 1 << 0x14;
        const FF = 1 << 0x15;
        const PWR = 1 << 0x16;
        const FF_STATUS = 1 << 0x17;
    }
}

impl EventTypes {
    /// Categories that make a device worth monitoring
    pub const INTERESTING: Self = Self::KEY.union(Self::REL).union(Self::ABS);

    /// Device emits at least one of key, relative or absolute events
    pub fn is_input_source(self) -> bool {
        self.intersects(Self::INTERESTING)
    }
}

bitflags! {
    /// poll(2) conditions, both requested and observed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Readiness: libc::c_short {
        const READABLE = libc::POLLIN;
        const PRIORITY = libc::POLLPRI;
        const WRITABLE = libc::POLLOUT;
        const ERROR = libc::POLLERR;
        const HANGUP = libc::POLLHUP;
        const INVALID = libc::POLLNVAL;
    }
}

pub(crate) const BITS_PER_LONG: usize = libc::c_ulong::BITS as usize;

/// Number of longs in a key state bitmap
pub(crate) const KEY_WORDS: usize = (KEY_CNT + BITS_PER_LONG - 1) / BITS_PER_LONG;

/// Currently pressed keys (EVIOCGKEY), laid out as the kernel's long array
#[derive(Clone, PartialEq, Eq)]
pub struct KeyBits {
    words: [libc::c_ulong; KEY_WORDS],
}

impl KeyBits {
    pub fn new() -> Self {
        Self {
            words: [0; KEY_WORDS],
        }
    }

    /// Bitmap with the given keys set. Codes above KEY_MAX are ignored.
    pub fn from_codes(codes: &[u16]) -> Self {
        let mut bits = Self::new();
        for &code in codes {
            bits.set(code);
        }
        bits
    }

    pub fn set(&mut self, code: u16) {
        let code = code as usize;
        if code < KEY_CNT {
            self.words[code / BITS_PER_LONG] |= 1 << (code % BITS_PER_LONG);
        }
    }

    pub fn is_set(&self, code: u16) -> bool {
        let code = code as usize;
        code < KEY_CNT && self.words[code / BITS_PER_LONG] & (1 << (code % BITS_PER_LONG)) != 0
    }

    /// Pressed keycodes in ascending order (0..=KEY_MAX)
    pub fn pressed(&self) -> impl Iterator<Item = u16> + '_ {
        (0..=KEY_MAX).filter(move |&code| self.is_set(code))
    }

    /// Backing storage, for the EVIOCGKEY ioctl
    pub(crate) fn words_mut(&mut self) -> &mut [libc::c_ulong] {
        &mut self.words
    }
}

impl Default for KeyBits {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pressed()).finish()
    }
}
