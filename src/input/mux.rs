//! Event multiplexer
//!
//! Owns every monitored descriptor, waits on all of them with poll(2) and
//! hands ready ones to their handlers.
//!
//! ```text
//! EventMux::new ─ initialize ─┬─ sync_key_state
//!                             └─ loop { wait → dispatch → handler → Ready::read_event }
//!                                teardown
//! ```
//!
//! Device slots (discovered under the device directory) and misc slots
//! (registered by the caller) are separate pools of `MAX_DEVICES` and
//! `MAX_MISC_FDS` entries. Entries are only ever removed all at once by
//! `teardown`, so a `DescriptorId` stays valid until then.

use std::cell::RefCell;
use std::fmt;
use std::os::unix::io::{AsFd, AsRawFd, RawFd};
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, info, warn};

use super::cmdline::read_device_tag;
use super::device::{scan_event_nodes, Device, EvdevDevice};
use super::error::InputError;
use super::event::{EventTypes, InputEvent, Readiness, INPUT_EVENT_SIZE};
use super::ioctl_helpers;
use crate::config::Config;
use crate::constants::{MAX_DEVICES, MAX_MISC_FDS};
use crate::remap::{RemapSearch, RemapTable};

/// Receives ready descriptors from [`EventMux::dispatch`]
pub trait EventHandler {
    fn on_ready(&mut self, ready: &mut Ready<'_>);
}

impl<F> EventHandler for F
where
    F: FnMut(&mut Ready<'_>),
{
    fn on_ready(&mut self, ready: &mut Ready<'_>) {
        self(ready)
    }
}

/// Handler shared by every device slot registered in one `initialize`
type SharedHandler = Rc<RefCell<dyn EventHandler>>;

/// Which pool a descriptor lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Discovered during `initialize`
    Device,
    /// Added with `register_extra`
    Misc,
}

/// Handle to a registered descriptor, valid until the next teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId {
    kind: SlotKind,
    index: usize,
    generation: u32,
}

impl DescriptorId {
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Position within its pool, in registration order
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SlotKind::Device => write!(f, "dev{}", self.index),
            SlotKind::Misc => write!(f, "misc{}", self.index),
        }
    }
}

/// One monitored descriptor
struct Entry {
    device: Box<dyn Device>,
    /// Requested conditions (always READABLE)
    events: Readiness,
    /// Conditions observed by the last `wait`
    revents: Readiness,
    handler: SharedHandler,
    remap: Option<RemapTable>,
}

impl Entry {
    fn new(device: Box<dyn Device>, handler: SharedHandler, remap: Option<RemapTable>) -> Self {
        Self {
            device,
            events: Readiness::READABLE,
            revents: Readiness::empty(),
            handler,
            remap,
        }
    }

    fn raw_fd(&self) -> RawFd {
        self.device.as_fd().as_raw_fd()
    }
}

/// A descriptor that `wait` reported ready, as seen by its handler
pub struct Ready<'a> {
    id: DescriptorId,
    revents: Readiness,
    device: &'a mut dyn Device,
    remap: Option<&'a RemapTable>,
}

impl Ready<'_> {
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Conditions observed by the last `wait`
    pub fn revents(&self) -> Readiness {
        self.revents
    }

    pub fn raw_fd(&self) -> RawFd {
        self.device.as_fd().as_raw_fd()
    }

    pub fn device(&self) -> &dyn Device {
        &*self.device
    }

    /// Remap table attached to this descriptor
    pub fn remap(&self) -> Option<&RemapTable> {
        self.remap
    }

    /// Read one event record and apply this descriptor's remap table
    pub fn read_event(&mut self) -> Result<InputEvent, InputError> {
        read_remapped(&mut *self.device, self.remap, self.revents)
    }
}

/// Read exactly one record from `device` if `revents` says it is readable.
///
/// Key events whose code has an override in `remap` get the override
/// assigned; every other record is returned unmodified.
fn read_remapped(
    device: &mut dyn Device,
    remap: Option<&RemapTable>,
    revents: Readiness,
) -> Result<InputEvent, InputError> {
    if !revents.contains(Readiness::READABLE) {
        return Err(InputError::NotReadable);
    }

    let mut buf = [0u8; INPUT_EVENT_SIZE];
    let got = device.read(&mut buf)?;
    let short = InputError::ShortRead {
        got,
        expected: INPUT_EVENT_SIZE,
    };
    if got != INPUT_EVENT_SIZE {
        return Err(short);
    }
    let mut event = InputEvent::from_bytes(&buf).ok_or(short)?;

    if event.is_key() {
        if let Some(code) = remap.and_then(|table| table.lookup(event.code)) {
            debug!("remap key {} -> {}", event.code, code);
            event.code = code;
        }
    }
    Ok(event)
}

/// Input descriptor registry and poll loop
pub struct EventMux {
    /// Device slots, in discovery order
    devices: Vec<Entry>,
    /// Misc slots, in registration order
    misc: Vec<Entry>,
    /// Bumped by every teardown to invalidate outstanding ids
    generation: u32,
    /// Directory scanned for event nodes
    device_dir: PathBuf,
    /// Boot command line holding `DEVICE=`
    cmdline_path: PathBuf,
    /// Device tag that replaces the boot parameter
    device_tag: Option<String>,
    /// None when remapping is disabled
    remap: Option<RemapSearch>,
}

impl EventMux {
    pub fn new(config: &Config) -> Self {
        let remap = config
            .remap
            .enabled
            .then(|| RemapSearch::from_config(&config.remap));
        Self {
            devices: Vec::with_capacity(MAX_DEVICES),
            misc: Vec::with_capacity(MAX_MISC_FDS),
            generation: 0,
            device_dir: config.input.device_dir.clone(),
            cmdline_path: config.input.cmdline_path.clone(),
            device_tag: config.input.device_tag.clone(),
            remap,
        }
    }

    /// Discover input devices and register them with `handler`.
    ///
    /// Scans the device directory for `event<N>` nodes and keeps those that
    /// emit key, relative or absolute events, up to `MAX_DEVICES`. Nodes that
    /// cannot be opened or queried are skipped. Returns the number of device
    /// slots in use afterwards.
    pub fn initialize<H: EventHandler + 'static>(&mut self, handler: H) -> usize {
        let tag = match &self.device_tag {
            Some(tag) => Some(tag.clone()),
            None => read_device_tag(&self.cmdline_path),
        };

        let nodes = match scan_event_nodes(&self.device_dir) {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("Cannot scan {}: {}", self.device_dir.display(), e);
                Vec::new()
            }
        };

        let candidates = nodes.into_iter().filter_map(|path| {
            match EvdevDevice::open(&path) {
                Ok(dev) => Some(Box::new(dev) as Box<dyn Device>),
                Err(e) => {
                    warn!("Cannot open device: {:?}: {}", path, e);
                    None
                }
            }
        });

        let count = self.discover(candidates, tag.as_deref(), handler);
        info!("evdev: {} input devices added", count);
        count
    }

    /// Register devices from `candidates` as device slots.
    ///
    /// Candidates are pulled lazily and no further ones are taken once
    /// `MAX_DEVICES` slots are in use. A candidate whose capability query
    /// fails or that declares none of key/relative/absolute is dropped.
    pub fn discover<I, H>(&mut self, candidates: I, device_tag: Option<&str>, handler: H) -> usize
    where
        I: IntoIterator<Item = Box<dyn Device>>,
        H: EventHandler + 'static,
    {
        let handler: SharedHandler = Rc::new(RefCell::new(handler));
        let mut candidates = candidates.into_iter();

        while self.devices.len() < MAX_DEVICES {
            let Some(device) = candidates.next() else {
                break;
            };

            match device.capabilities() {
                Ok(caps) if caps.is_input_source() => {
                    debug!("Input device added: {} ({:?})", device.label(), caps);
                }
                Ok(caps) => {
                    debug!("Skipping {}: no key/rel/abs events ({:?})", device.label(), caps);
                    continue;
                }
                Err(e) => {
                    debug!("Skipping {}: {}", device.label(), e);
                    continue;
                }
            }

            let remap = self.find_remap(device_tag, &*device);
            self.devices.push(Entry::new(device, handler.clone(), remap));
        }

        if self.devices.len() == MAX_DEVICES {
            debug!("Device capacity ({}) reached", MAX_DEVICES);
        }
        self.devices.len()
    }

    /// Register a caller-supplied descriptor as a misc slot.
    ///
    /// Fails with `MiscCapacity` when all misc slots are taken; the registry
    /// is left untouched and `device` is dropped (closing it). The remap
    /// search runs without a device tag.
    pub fn register_extra<D, H>(&mut self, device: D, handler: H) -> Result<DescriptorId, InputError>
    where
        D: Device + 'static,
        H: EventHandler + 'static,
    {
        if self.misc.len() >= MAX_MISC_FDS {
            return Err(InputError::MiscCapacity(MAX_MISC_FDS));
        }

        let device: Box<dyn Device> = Box::new(device);
        let remap = self.find_remap(None, &*device);
        debug!("Misc descriptor added: {}", device.label());

        let handler: SharedHandler = Rc::new(RefCell::new(handler));
        self.misc.push(Entry::new(device, handler, remap));
        Ok(DescriptorId {
            kind: SlotKind::Misc,
            index: self.misc.len() - 1,
            generation: self.generation,
        })
    }

    fn find_remap(&self, device_tag: Option<&str>, device: &dyn Device) -> Option<RemapTable> {
        self.remap.as_ref()?.find(device_tag, device)
    }

    /// Block until at least one descriptor is readable.
    ///
    /// `timeout_ms` < 0 waits forever, 0 polls. Returns the number of ready
    /// descriptors, `Timeout` when none became ready, or `Poll` when poll(2)
    /// itself failed. Call `dispatch` afterwards to run the handlers.
    pub fn wait(&mut self, timeout_ms: i32) -> Result<usize, InputError> {
        let mut fds: Vec<libc::pollfd> = self
            .entries_mut()
            .map(|entry| {
                entry.revents = Readiness::empty();
                libc::pollfd {
                    fd: entry.raw_fd(),
                    events: entry.events.bits(),
                    revents: 0,
                }
            })
            .collect();

        let ready = ioctl_helpers::poll(&mut fds, timeout_ms).map_err(InputError::Poll)?;

        for (entry, pfd) in self.entries_mut().zip(&fds) {
            entry.revents = Readiness::from_bits_truncate(pfd.revents);
        }

        if ready == 0 {
            return Err(InputError::Timeout);
        }
        Ok(ready)
    }

    /// Invoke the handler of every descriptor the last `wait` found ready,
    /// devices first, each pool in registration order.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&mut self) -> usize {
        let generation = self.generation;
        let mut invoked = 0;

        let pools = [
            (SlotKind::Device, &mut self.devices),
            (SlotKind::Misc, &mut self.misc),
        ];
        for (kind, pool) in pools {
            for (index, entry) in pool.iter_mut().enumerate() {
                if !entry.revents.intersects(entry.events) {
                    continue;
                }
                let Entry {
                    device,
                    revents,
                    handler,
                    remap,
                    ..
                } = entry;
                let mut ready = Ready {
                    id: DescriptorId {
                        kind,
                        index,
                        generation,
                    },
                    revents: *revents,
                    device: &mut **device,
                    remap: remap.as_ref(),
                };
                handler.borrow_mut().on_ready(&mut ready);
                invoked += 1;
            }
        }

        invoked
    }

    /// Read one event from a registered descriptor, applying its remap table.
    ///
    /// `revents` is the condition set the caller observed; without
    /// `READABLE` nothing is read.
    pub fn read_event(&mut self, id: DescriptorId, revents: Readiness) -> Result<InputEvent, InputError> {
        let entry = self.entry_mut(id)?;
        read_remapped(&mut *entry.device, entry.remap.as_ref(), revents)
    }

    /// Report keys already held down on device slots.
    ///
    /// Calls `on_key(code, true)` for every pressed key of every device slot
    /// that declares key events. Devices whose queries fail are skipped.
    /// Misc slots are not consulted. Returns the number of keys reported.
    pub fn sync_key_state<F>(&self, mut on_key: F) -> usize
    where
        F: FnMut(u16, bool),
    {
        let mut reported = 0;
        for entry in &self.devices {
            let device = &*entry.device;
            match device.capabilities() {
                Ok(caps) if caps.contains(EventTypes::KEY) => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!("sync: skipping {}: {}", device.label(), e);
                    continue;
                }
            }
            let keys = match device.pressed_keys() {
                Ok(keys) => keys,
                Err(e) => {
                    debug!("sync: skipping {}: {}", device.label(), e);
                    continue;
                }
            };
            for code in keys.pressed() {
                on_key(code, true);
                reported += 1;
            }
        }
        reported
    }

    /// Close every descriptor and drop every remap table.
    ///
    /// Ids issued before this call are rejected afterwards. Safe to call on
    /// an empty registry. Returns the number of descriptors closed.
    pub fn teardown(&mut self) -> usize {
        let closed = self.devices.len() + self.misc.len();
        self.devices.clear();
        self.misc.clear();
        self.generation = self.generation.wrapping_add(1);
        if closed > 0 {
            info!("evdev: {} descriptors closed", closed);
        }
        closed
    }

    /// Number of device slots in use
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Number of misc slots in use
    pub fn misc_count(&self) -> usize {
        self.misc.len()
    }

    pub fn len(&self) -> usize {
        self.devices.len() + self.misc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all registered descriptors, devices first
    pub fn ids(&self) -> Vec<DescriptorId> {
        let generation = self.generation;
        let devices = (0..self.devices.len()).map(move |index| DescriptorId {
            kind: SlotKind::Device,
            index,
            generation,
        });
        let misc = (0..self.misc.len()).map(move |index| DescriptorId {
            kind: SlotKind::Misc,
            index,
            generation,
        });
        devices.chain(misc).collect()
    }

    /// Conditions the last `wait` observed on `id`
    pub fn revents(&self, id: DescriptorId) -> Result<Readiness, InputError> {
        Ok(self.entry(id)?.revents)
    }

    /// Remap table attached to `id`
    pub fn remap_table(&self, id: DescriptorId) -> Result<Option<&RemapTable>, InputError> {
        Ok(self.entry(id)?.remap.as_ref())
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.devices.iter_mut().chain(self.misc.iter_mut())
    }

    fn entry(&self, id: DescriptorId) -> Result<&Entry, InputError> {
        if id.generation != self.generation {
            return Err(InputError::StaleDescriptor);
        }
        let pool = match id.kind {
            SlotKind::Device => &self.devices,
            SlotKind::Misc => &self.misc,
        };
        pool.get(id.index).ok_or(InputError::StaleDescriptor)
    }

    fn entry_mut(&mut self, id: DescriptorId) -> Result<&mut Entry, InputError> {
        if id.generation != self.generation {
            return Err(InputError::StaleDescriptor);
        }
        let pool = match id.kind {
            SlotKind::Device => &mut self.devices,
            SlotKind::Misc => &mut self.misc,
        };
        pool.get_mut(id.index).ok_or(InputError::StaleDescriptor)
    }
}

impl Drop for EventMux {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{InputId, KeyBits};
    use crate::input::keycodes::{EV_ABS, EV_KEY, EV_REL, KEY_BACK, KEY_POWER, KEY_VOLUMEUP};
    use crate::input::testing::FakeDevice;
    use std::cell::Cell;
    use std::io::Write;

    fn config() -> Config {
        let mut config = Config::default();
        config.remap.enabled = false;
        config
    }

    fn boxed(dev: FakeDevice) -> Box<dyn Device> {
        Box::new(dev)
    }

    fn ignore(_: &mut Ready<'_>) {}

    #[test]
    fn test_discovery_filters_capabilities() {
        let mut mux = EventMux::new(&config());
        let (key, _k) = FakeDevice::new(EventTypes::SYN | EventTypes::KEY);
        let (sw, _s) = FakeDevice::new(EventTypes::SYN | EventTypes::SW);
        let (rel, _r) = FakeDevice::new(EventTypes::REL);
        let (broken, _b) = FakeDevice::broken();
        let (abs, _a) = FakeDevice::new(EventTypes::ABS | EventTypes::LED);

        let count = mux.discover(
            [boxed(key), boxed(sw), boxed(rel), boxed(broken), boxed(abs)],
            None,
            ignore,
        );
        assert_eq!(count, 3);
        assert_eq!(mux.device_count(), 3);
        assert_eq!(mux.misc_count(), 0);
    }

    #[test]
    fn test_discovery_capacity() {
        let mut mux = EventMux::new(&config());
        let pulled = Rc::new(Cell::new(0));
        let mut peers = Vec::new();
        let counter = pulled.clone();
        let candidates = (0..20).map(|_| {
            counter.set(counter.get() + 1);
            let (dev, peer) = FakeDevice::new(EventTypes::KEY);
            peers.push(peer);
            boxed(dev)
        });

        assert_eq!(mux.discover(candidates, None, ignore), MAX_DEVICES);
        assert_eq!(mux.device_count(), MAX_DEVICES);
        // Nothing past capacity is opened
        assert_eq!(pulled.get(), MAX_DEVICES);

        let (extra, _p) = FakeDevice::new(EventTypes::KEY);
        assert_eq!(mux.discover([boxed(extra)], None, ignore), MAX_DEVICES);
    }

    #[test]
    fn test_misc_capacity() {
        let mut mux = EventMux::new(&config());
        let mut peers = Vec::new();
        for i in 0..MAX_MISC_FDS {
            let (dev, peer) = FakeDevice::new(EventTypes::empty());
            peers.push(peer);
            let id = mux.register_extra(dev, ignore).unwrap();
            assert_eq!(id.kind(), SlotKind::Misc);
            assert_eq!(id.index(), i);
        }

        let closed = Rc::new(Cell::new(0));
        let (dev, _p) = FakeDevice::new(EventTypes::empty());
        let err = mux
            .register_extra(dev.with_drop_counter(closed.clone()), ignore)
            .unwrap_err();
        assert!(matches!(err, InputError::MiscCapacity(MAX_MISC_FDS)));
        assert_eq!(mux.misc_count(), MAX_MISC_FDS);
        assert_eq!(mux.device_count(), 0);
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_wait_timeout_and_dispatch() {
        let mut mux = EventMux::new(&config());
        let (quiet, _q) = FakeDevice::new(EventTypes::KEY);
        let (busy, mut busy_peer) = FakeDevice::new(EventTypes::KEY);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        mux.discover([boxed(quiet), boxed(busy)], None, move |ready: &mut Ready<'_>| {
            let event = ready.read_event().unwrap();
            sink.borrow_mut().push((ready.id().to_string(), event.code, event.value));
        });

        assert!(matches!(mux.wait(0), Err(InputError::Timeout)));
        assert_eq!(mux.dispatch(), 0);

        busy_peer
            .write_all(InputEvent::new(EV_KEY, KEY_POWER, 1).as_bytes())
            .unwrap();
        assert_eq!(mux.wait(1000).unwrap(), 1);
        assert_eq!(mux.dispatch(), 1);
        assert_eq!(*seen.borrow(), vec![("dev1".to_string(), KEY_POWER, 1)]);

        // Record consumed; nothing left to dispatch
        assert!(matches!(mux.wait(0), Err(InputError::Timeout)));
    }

    #[test]
    fn test_dispatch_order_devices_then_misc() {
        let mut mux = EventMux::new(&config());
        let order = Rc::new(RefCell::new(Vec::new()));

        let (misc, mut misc_peer) = FakeDevice::new(EventTypes::empty());
        let sink = order.clone();
        mux.register_extra(misc, move |ready: &mut Ready<'_>| {
            sink.borrow_mut().push(ready.id().to_string());
        })
        .unwrap();

        let (a, mut a_peer) = FakeDevice::new(EventTypes::KEY);
        let (b, mut b_peer) = FakeDevice::new(EventTypes::REL);
        let sink = order.clone();
        mux.discover([boxed(a), boxed(b)], None, move |ready: &mut Ready<'_>| {
            sink.borrow_mut().push(ready.id().to_string());
        });

        for peer in [&mut misc_peer, &mut a_peer, &mut b_peer] {
            peer.write_all(b"x").unwrap();
        }
        assert_eq!(mux.wait(1000).unwrap(), 3);
        assert_eq!(mux.dispatch(), 3);
        assert_eq!(*order.borrow(), vec!["dev0", "dev1", "misc0"]);
    }

    #[test]
    fn test_read_event_remaps_keys_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gpio-keys.keys"), "72 BACK\n").unwrap();
        let mut config = Config::default();
        config.remap.search_dirs = vec![dir.path().to_path_buf()];
        config.remap.sdcard_dir = dir.path().join("sdcard");

        let mut mux = EventMux::new(&config);
        let (dev, mut peer) = FakeDevice::new(EventTypes::KEY | EventTypes::REL);
        mux.discover([boxed(dev.with_name("gpio-keys"))], None, ignore);
        let id = mux.ids()[0];
        assert_eq!(mux.remap_table(id).unwrap().map(RemapTable::len), Some(1));

        peer.write_all(InputEvent::new(EV_KEY, 72, 1).as_bytes()).unwrap();
        let ev = mux.read_event(id, Readiness::READABLE).unwrap();
        assert_eq!((ev.type_, ev.code, ev.value), (EV_KEY, KEY_BACK, 1));

        peer.write_all(InputEvent::new(EV_KEY, 73, 1).as_bytes()).unwrap();
        assert_eq!(mux.read_event(id, Readiness::READABLE).unwrap().code, 73);

        peer.write_all(InputEvent::new(EV_REL, 72, -1).as_bytes()).unwrap();
        let ev = mux.read_event(id, Readiness::READABLE).unwrap();
        assert_eq!((ev.type_, ev.code, ev.value), (EV_REL, 72, -1));

        peer.write_all(InputEvent::new(EV_ABS, 72, 500).as_bytes()).unwrap();
        assert_eq!(mux.read_event(id, Readiness::READABLE).unwrap().code, 72);
    }

    #[test]
    fn test_misc_remap_ignores_device_tag() {
        let dir = tempfile::tempdir().unwrap();
        let tagged = dir.path().join("devices").join("board");
        std::fs::create_dir_all(&tagged).unwrap();
        std::fs::write(tagged.join("pad.keys"), "1 UP\n").unwrap();
        std::fs::write(dir.path().join("pad_board.keys"), "1 DOWN\n").unwrap();
        std::fs::write(dir.path().join("pad.keys"), "1 LEFT\n").unwrap();

        let mut config = Config::default();
        config.input.device_tag = Some("board".to_string());
        config.remap.sdcard_dir = dir.path().to_path_buf();
        config.remap.search_dirs = vec![dir.path().to_path_buf()];
        let mut mux = EventMux::new(&config);

        let (dev, _p) = FakeDevice::new(EventTypes::KEY);
        mux.discover([boxed(dev.with_name("pad"))], Some("board"), ignore);
        let (misc, _m) = FakeDevice::new(EventTypes::KEY);
        let misc_id = mux.register_extra(misc.with_name("pad"), ignore).unwrap();

        let dev_table = mux.remap_table(mux.ids()[0]).unwrap().unwrap();
        assert_eq!(dev_table.lookup(1), Some(crate::input::keycodes::KEY_UP));
        let misc_table = mux.remap_table(misc_id).unwrap().unwrap();
        assert_eq!(misc_table.lookup(1), Some(crate::input::keycodes::KEY_LEFT));
    }

    #[test]
    fn test_read_event_failures() {
        let mut mux = EventMux::new(&config());
        let (dev, mut peer) = FakeDevice::new(EventTypes::empty());
        let id = mux.register_extra(dev, ignore).unwrap();

        assert!(matches!(
            mux.read_event(id, Readiness::HANGUP),
            Err(InputError::NotReadable)
        ));

        peer.write_all(&[0u8; 10]).unwrap();
        match mux.read_event(id, Readiness::READABLE) {
            Err(InputError::ShortRead { got, expected }) => {
                assert_eq!(got, 10);
                assert_eq!(expected, INPUT_EVENT_SIZE);
            }
            other => panic!("unexpected: {:?}", other.map(|e| e.code)),
        }

        drop(peer);
        assert!(matches!(
            mux.read_event(id, Readiness::READABLE),
            Err(InputError::ShortRead { got: 0, .. })
        ));
    }

    #[test]
    fn test_sync_key_state() {
        let mut mux = EventMux::new(&config());
        let (keyboard, _a) = FakeDevice::new(EventTypes::KEY);
        let keyboard = keyboard.with_keys(KeyBits::from_codes(&[KEY_VOLUMEUP, KEY_POWER]));
        let (mouse, _b) = FakeDevice::new(EventTypes::REL);
        let mouse = mouse.with_keys(KeyBits::from_codes(&[KEY_BACK]));
        let (unqueryable, _c) = FakeDevice::new(EventTypes::KEY);
        mux.discover(
            [boxed(keyboard), boxed(mouse), boxed(unqueryable)],
            None,
            ignore,
        );

        let (misc, _d) = FakeDevice::new(EventTypes::KEY);
        mux.register_extra(misc.with_keys(KeyBits::from_codes(&[KEY_BACK])), ignore)
            .unwrap();

        let mut held = Vec::new();
        let reported = mux.sync_key_state(|code, pressed| held.push((code, pressed)));
        assert_eq!(reported, 2);
        assert_eq!(held, vec![(KEY_VOLUMEUP, true), (KEY_POWER, true)]);
    }

    #[test]
    fn test_teardown_closes_everything() {
        let closed = Rc::new(Cell::new(0));
        let mut mux = EventMux::new(&config());
        let mut peers = Vec::new();

        let devices: Vec<Box<dyn Device>> = (0..3)
            .map(|_| {
                let (dev, peer) = FakeDevice::new(EventTypes::KEY);
                peers.push(peer);
                boxed(dev.with_drop_counter(closed.clone()))
            })
            .collect();
        mux.discover(devices, None, ignore);
        let (misc, _m) = FakeDevice::new(EventTypes::empty());
        let misc_id = mux
            .register_extra(misc.with_drop_counter(closed.clone()), ignore)
            .unwrap();
        assert_eq!(closed.get(), 0);

        assert_eq!(mux.teardown(), 4);
        assert_eq!(closed.get(), 4);
        assert_eq!((mux.device_count(), mux.misc_count()), (0, 0));
        assert!(mux.is_empty());
        assert!(matches!(
            mux.read_event(misc_id, Readiness::READABLE),
            Err(InputError::StaleDescriptor)
        ));

        // Idempotent, and the registry is usable again
        assert_eq!(mux.teardown(), 0);
        let (dev, _p) = FakeDevice::new(EventTypes::KEY);
        assert_eq!(mux.discover([boxed(dev)], None, ignore), 1);
        assert!(mux.remap_table(misc_id).is_err());
    }

    #[test]
    fn test_drop_tears_down() {
        let closed = Rc::new(Cell::new(0));
        {
            let mut mux = EventMux::new(&config());
            let (dev, _p) = FakeDevice::new(EventTypes::KEY);
            mux.discover([boxed(dev.with_drop_counter(closed.clone()))], None, ignore);
        }
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_identity_defaults_when_queries_fail() {
        let (dev, _p) = FakeDevice::new(EventTypes::KEY);
        let ident = crate::remap::DeviceIdentity::query(&dev);
        assert_eq!(ident.name, "");
        assert_eq!(ident.id, InputId::default());

        let id = InputId {
            bustype: 3,
            vendor: 0x1234,
            product: 0x5678,
            version: 0,
        };
        let (dev, _p) = FakeDevice::new(EventTypes::KEY);
        let ident = crate::remap::DeviceIdentity::query(&dev.with_name("pad").with_id(id));
        assert_eq!(ident.name, "pad");
        assert_eq!(ident.id, id);
    }
}
