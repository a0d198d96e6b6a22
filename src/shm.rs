use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use nix::errno::Errno;
use nix::libc::{self, c_int, c_void, key_t};
use tracing::warn;

use crate::error::{Error, Result};

pub struct OpenOptions {
    mode: u32,
    create: bool,
    exclusive: bool,
    read_only: bool,
}

impl OpenOptions {
    /// Looks up (or creates) the segment for `key` and attaches it.
    ///
    /// `len` must not exceed the size of an existing segment.
    pub fn open(self, key: key_t, len: usize) -> Result<Shm> {
        let mut flags = (self.mode & 0o777) as c_int;
        if self.create {
            flags |= libc::IPC_CREAT;
        }
        if self.exclusive {
            flags |= libc::IPC_EXCL;
        }
        let id = Errno::result(unsafe { libc::shmget(key, len, flags) })
            .map_err(|e| Error::setup("shmget", e))?;

        let shmflg = if self.read_only { libc::SHM_RDONLY } else { 0 };
        let raw = unsafe { libc::shmat(id, ptr::null(), shmflg) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) if raw as isize != -1 => ptr,
            _ => {
                let err = Errno::last();
                if self.create && self.exclusive {
                    let _ = shmctl_rmid(id);
                }
                return Err(Error::setup("shmat", err));
            }
        };
        Ok(Shm {
            id,
            ptr,
            len,
            read_only: self.read_only,
        })
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            mode: 0o600,
            create: false,
            exclusive: false,
            read_only: false,
        }
    }
}

/// An attached System V shared memory segment.
///
/// Dropping detaches the mapping. The kernel object outlives every handle
/// until [`Shm::remove`] is called.
#[derive(Debug)]
pub struct Shm {
    id: c_int,
    ptr: NonNull<c_void>,
    len: usize,
    read_only: bool,
}

// The mapping is process-wide; access is serialized by the channel turns.
unsafe impl Send for Shm {}

impl Shm {
    /// Creates a fresh segment for `key`, failing if one already exists.
    pub fn create(key: key_t, len: usize) -> Result<Self> {
        Shm::options().create(true).exclusive(true).open(key, len)
    }

    /// Attaches an existing segment read-only.
    pub fn open(key: key_t, len: usize) -> Result<Self> {
        Shm::options().read_only(true).open(key, len)
    }

    pub fn options() -> OpenOptions {
        OpenOptions::default()
    }

    pub fn id(&self) -> c_int {
        self.id
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Marks the segment for destruction once the last attachment goes away.
    pub fn remove(&self) -> Result<()> {
        shmctl_rmid(self.id).map_err(|e| Error::setup("shmctl(IPC_RMID)", e))
    }

    /// Detaches now, reporting a failure instead of swallowing it in `Drop`.
    pub fn detach(self) -> Result<()> {
        let ptr = self.ptr;
        mem::forget(self);
        Errno::result(unsafe { libc::shmdt(ptr.as_ptr()) })
            .map(drop)
            .map_err(|e| Error::setup("shmdt", e))
    }
}

pub(crate) fn shmctl_rmid(id: c_int) -> nix::Result<()> {
    Errno::result(unsafe { libc::shmctl(id, libc::IPC_RMID, ptr::null_mut()) }).map(drop)
}

impl Deref for Shm {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr() as *const u8, self.len) }
    }
}

impl DerefMut for Shm {
    fn deref_mut(&mut self) -> &mut Self::Target {
        assert!(!self.read_only, "segment is attached read-only");
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr() as *mut u8, self.len) }
    }
}

impl Drop for Shm {
    fn drop(&mut self) {
        if let Err(e) = Errno::result(unsafe { libc::shmdt(self.ptr.as_ptr()) }) {
            warn!(id = self.id, error = %e, "shmdt failed");
        }
    }
}
