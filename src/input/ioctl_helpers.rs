//! Safe wrappers for evdev ioctl and poll system calls
//!
//! Keeps the unsafe boilerplate out of device.rs and mux.rs.
//! Every wrapper reports failures as `io::Error` so callers can skip
//! a device without aborting.

use std::io;
use std::os::unix::io::RawFd;

use log::debug;

use super::event::{EventTypes, InputId, KeyBits};
use crate::constants::DEVICE_NAME_MAX;

mod raw {
    use super::InputId;

    nix::ioctl_read!(eviocgid, b'E', 0x02, InputId);
    nix::ioctl_read_buf!(eviocgname, b'E', 0x06, u8);
    nix::ioctl_read_buf!(eviocgkey, b'E', 0x18, libc::c_ulong);
    // EVIOCGBIT(0, len): event type bitmap
    nix::ioctl_read_buf!(eviocgbit_ev, b'E', 0x20, libc::c_ulong);
}

/// Map an ioctl result, logging the failing command.
///
/// # Arguments
/// * `fd` - File descriptor the command was issued on
/// * `cmd_name` - Human-readable name for the log message
fn check(res: nix::Result<libc::c_int>, fd: RawFd, cmd_name: &str) -> io::Result<libc::c_int> {
    res.map_err(|errno| {
        debug!("{} failed on fd {}: {}", cmd_name, fd, errno);
        io::Error::from(errno)
    })
}

/// Query the event types a device declares (EVIOCGBIT(0)).
pub fn event_types(fd: RawFd) -> io::Result<EventTypes> {
    let mut words: [libc::c_ulong; 1] = [0];
    check(unsafe { raw::eviocgbit_ev(fd, &mut words) }, fd, "EVIOCGBIT")?;
    Ok(EventTypes::from_bits_retain(words[0] as u32))
}

/// Query the device name (EVIOCGNAME).
///
/// The kernel NUL-terminates the name inside the buffer; anything after the
/// first NUL is ignored and invalid UTF-8 is replaced.
pub fn device_name(fd: RawFd) -> io::Result<String> {
    let mut buf = [0u8; DEVICE_NAME_MAX];
    check(unsafe { raw::eviocgname(fd, &mut buf) }, fd, "EVIOCGNAME")?;
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Query bus/vendor/product/version (EVIOCGID).
pub fn device_id(fd: RawFd) -> io::Result<InputId> {
    let mut id = InputId::default();
    check(unsafe { raw::eviocgid(fd, &mut id) }, fd, "EVIOCGID")?;
    Ok(id)
}

/// Query the currently pressed keys (EVIOCGKEY).
pub fn key_state(fd: RawFd) -> io::Result<KeyBits> {
    let mut bits = KeyBits::new();
    check(unsafe { raw::eviocgkey(fd, bits.words_mut()) }, fd, "EVIOCGKEY")?;
    Ok(bits)
}

/// poll(2) over `fds`.
///
/// `timeout_ms` < 0 blocks indefinitely, 0 returns immediately.
/// Returns the number of descriptors with non-zero `revents`.
pub fn poll(fds: &mut [libc::pollfd], timeout_ms: i32) -> io::Result<usize> {
    let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_queries_fail_on_non_evdev() {
        let (a, _b) = UnixStream::pair().unwrap();
        assert!(event_types(a.as_raw_fd()).is_err());
        assert!(device_name(a.as_raw_fd()).is_err());
        assert!(device_id(a.as_raw_fd()).is_err());
        assert!(key_state(a.as_raw_fd()).is_err());
    }

    #[test]
    fn test_poll_readiness() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let mut fds = [libc::pollfd {
            fd: a.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];
        assert_eq!(poll(&mut fds, 0).unwrap(), 0);
        b.write_all(b"x").unwrap();
        assert_eq!(poll(&mut fds, 1000).unwrap(), 1);
        assert!(fds[0].revents & libc::POLLIN != 0);
    }
}
