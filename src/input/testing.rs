//! Fake devices for multiplexer tests
//!
//! Backed by one end of a `UnixStream` pair so poll readiness and reads are
//! real; the other end is handed to the test to write event records.

use std::cell::Cell;
use std::io::{self, Read};
use std::os::unix::io::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::rc::Rc;

use super::device::Device;
use super::event::{EventTypes, InputId, KeyBits};

pub struct FakeDevice {
    stream: UnixStream,
    /// None makes the capability query fail
    caps: Option<EventTypes>,
    name: Option<String>,
    id: Option<InputId>,
    keys: Option<KeyBits>,
    drops: Option<Rc<Cell<usize>>>,
}

impl FakeDevice {
    /// Device declaring `caps`, plus the writable peer end
    pub fn new(caps: EventTypes) -> (Self, UnixStream) {
        let (stream, peer) = UnixStream::pair().expect("socketpair");
        let dev = Self {
            stream,
            caps: Some(caps),
            name: None,
            id: None,
            keys: None,
            drops: None,
        };
        (dev, peer)
    }

    /// Device whose capability query fails
    pub fn broken() -> (Self, UnixStream) {
        let (mut dev, peer) = Self::new(EventTypes::empty());
        dev.caps = None;
        (dev, peer)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_id(mut self, id: InputId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_keys(mut self, keys: KeyBits) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Count drops (closes) in `counter`
    pub fn with_drop_counter(mut self, counter: Rc<Cell<usize>>) -> Self {
        self.drops = Some(counter);
        self
    }
}

fn unsupported() -> io::Error {
    io::Error::from_raw_os_error(libc::ENOTTY)
}

impl AsFd for FakeDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}

impl Read for FakeDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Device for FakeDevice {
    fn capabilities(&self) -> io::Result<EventTypes> {
        self.caps.ok_or_else(unsupported)
    }

    fn name(&self) -> io::Result<String> {
        self.name.clone().ok_or_else(unsupported)
    }

    fn identity(&self) -> io::Result<InputId> {
        self.id.ok_or_else(unsupported)
    }

    fn pressed_keys(&self) -> io::Result<KeyBits> {
        self.keys.clone().ok_or_else(unsupported)
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        if let Some(drops) = &self.drops {
            drops.set(drops.get() + 1);
        }
    }
}
