//! Descriptor plumbing done once at plugin startup (spec §4.F steps 1-3):
//! the host-facing framed channel is moved off the well-known stdin/stdout
//! descriptors so a plugin author's own `println!`/stray read doesn't
//! corrupt the protocol stream.

use crate::error::StartupError;
use std::io::{self, Read, Write};

/// The plugin's private channel for reading framed [`packplug_wire::HostMessage`]s.
pub enum HostIn {
    #[cfg(unix)]
    Fd(std::fs::File),
    Fallback(io::Stdin),
}

impl Read for HostIn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            #[cfg(unix)]
            HostIn::Fd(f) => f.read(buf),
            HostIn::Fallback(s) => s.lock().read(buf),
        }
    }
}

/// The plugin's private channel for writing framed [`packplug_wire::PluginMessage`]s.
pub enum HostOut {
    #[cfg(unix)]
    Fd(std::fs::File),
    Fallback(io::Stdout),
}

impl Write for HostOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            #[cfg(unix)]
            HostOut::Fd(f) => f.write(buf),
            HostOut::Fallback(s) => s.lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            #[cfg(unix)]
            HostOut::Fd(f) => f.flush(),
            HostOut::Fallback(s) => s.lock().flush(),
        }
    }
}

/// Duplicates the real stdin/stdout for our own framed I/O, closes the
/// original stdin, and redirects the original stdout onto stderr so
/// print-style output from plugin code becomes free-form text (spec §4.F).
///
/// Writes through the returned [`HostOut`] are never buffered beyond a
/// single `File`/`Stdout` write call, satisfying "disable output buffering
/// on the redirected stream".
#[cfg(unix)]
pub fn take_stdio() -> Result<(HostIn, HostOut), StartupError> {
    use nix::unistd::{close, dup, dup2};
    use std::os::unix::io::FromRawFd;

    let host_in_fd = dup(0).map_err(|e| StartupError::DescriptorDuplication(e.into()))?;
    close(0).ok();

    let host_out_fd = dup(1).map_err(|e| StartupError::DescriptorDuplication(e.into()))?;
    dup2(2, 1).map_err(|e| StartupError::DescriptorDuplication(e.into()))?;

    let host_in = unsafe { std::fs::File::from_raw_fd(host_in_fd) };
    let host_out = unsafe { std::fs::File::from_raw_fd(host_out_fd) };
    Ok((HostIn::Fd(host_in), HostOut::Fd(host_out)))
}

/// Fallback for platforms without the unix fd-duplication primitives we use
/// elsewhere: reads/writes go straight to the real stdio handles, so a
/// stray `println!` in plugin code will corrupt the protocol stream here.
#[cfg(not(unix))]
pub fn take_stdio() -> Result<(HostIn, HostOut), StartupError> {
    Ok((HostIn::Fallback(io::stdin()), HostOut::Fallback(io::stdout())))
}
