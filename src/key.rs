use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::errno::Errno;
use nix::libc::{self, key_t};

use crate::error::{Error, Result};

/// Key of the segment when no rendezvous path is given ("SHMP").
pub const DEFAULT_MEMORY_KEY: key_t = 0x5348_4D50;
/// Key of the semaphore set when no rendezvous path is given ("SHSP").
pub const DEFAULT_SEMAPHORE_KEY: key_t = 0x5348_5350;

const MEMORY_PROJ: u8 = b'm';
const SEMAPHORE_PROJ: u8 = b's';

/// The pair of System V keys both peers rendezvous on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelKeys {
    pub memory: key_t,
    pub semaphores: key_t,
}

impl ChannelKeys {
    pub fn new(memory: key_t, semaphores: key_t) -> Self {
        Self { memory, semaphores }
    }

    /// Derives both keys from an existing file with `ftok(3)`, so that
    /// independent sessions can pick independent channels.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let cpath = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            Error::setup(
                "ftok",
                io::Error::new(io::ErrorKind::InvalidInput, "path contains a nul byte"),
            )
        })?;
        Ok(Self {
            memory: ftok(&cpath, MEMORY_PROJ)?,
            semaphores: ftok(&cpath, SEMAPHORE_PROJ)?,
        })
    }
}

impl Default for ChannelKeys {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_KEY, DEFAULT_SEMAPHORE_KEY)
    }
}

fn ftok(path: &CString, proj: u8) -> Result<key_t> {
    let key = unsafe { libc::ftok(path.as_ptr(), proj as libc::c_int) };
    if key == -1 {
        return Err(Error::setup("ftok", Errno::last()));
    }
    Ok(key)
}
