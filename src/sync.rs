use nix::errno::Errno;
use nix::libc::{self, c_int, key_t};
use tracing::trace;

use crate::error::{Error, Result};

/// Number of semaphores in the set.
pub const SEM_COUNT: usize = 2;

/// Initial token placement: the producer may write, the consumer waits.
pub const INITIAL_VALUES: [u16; SEM_COUNT] = [1, 0];

/// Which side currently holds the right to touch the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Turn {
    Write = 0,
    Read = 1,
}

impl Turn {
    fn index(self) -> c_int {
        self as u16 as c_int
    }
}

/// The `semctl(2)` commands the channel needs, each with its own payload.
#[derive(Debug)]
pub enum SemControl<'a> {
    SetValue { turn: Turn, value: u16 },
    GetValue { turn: Turn },
    GetAll(&'a mut [u16; SEM_COUNT]),
    SetAll(&'a [u16; SEM_COUNT]),
}

impl SemControl<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            SemControl::SetValue { .. } => "semctl(SETVAL)",
            SemControl::GetValue { .. } => "semctl(GETVAL)",
            SemControl::GetAll(_) => "semctl(GETALL)",
            SemControl::SetAll(_) => "semctl(SETALL)",
        }
    }
}

/// A System V semaphore set holding the write and read turns.
///
/// Dropping the handle leaves the kernel object alone; only [`remove`]
/// destroys it.
///
/// [`remove`]: SemaphoreSet::remove
#[derive(Debug)]
pub struct SemaphoreSet {
    id: c_int,
}

impl SemaphoreSet {
    /// Creates the set, failing if `key` is already in use, and places the
    /// token on the write side.
    pub fn create(key: key_t, mode: u32) -> Result<Self> {
        let flags = libc::IPC_CREAT | libc::IPC_EXCL | (mode & 0o777) as c_int;
        let id = Errno::result(unsafe { libc::semget(key, SEM_COUNT as c_int, flags) })
            .map_err(|e| Error::setup("semget", e))?;
        let sems = SemaphoreSet { id };
        let init = SemControl::SetAll(&INITIAL_VALUES);
        let name = init.name();
        if let Err(e) = sems.semctl(init) {
            let _ = semctl_rmid(sems.id);
            return Err(Error::setup(name, e));
        }
        Ok(sems)
    }

    /// Opens an existing set by key without creating it.
    pub fn open(key: key_t) -> Result<Self> {
        let id = Errno::result(unsafe { libc::semget(key, 0, 0) })
            .map_err(|e| Error::setup("semget", e))?;
        Ok(SemaphoreSet { id })
    }

    pub fn id(&self) -> c_int {
        self.id
    }

    /// Blocks until `turn` can be decremented. Signal interruptions are
    /// re-issued rather than reported.
    pub fn wait(&self, turn: Turn) -> Result<()> {
        self.semop(turn, -1, "semop(wait)")
    }

    pub fn post(&self, turn: Turn) -> Result<()> {
        self.semop(turn, 1, "semop(post)")
    }

    /// Runs one control command. The returned value is meaningful only for
    /// [`SemControl::GetValue`].
    pub fn control(&self, ctl: SemControl<'_>) -> Result<c_int> {
        let name = ctl.name();
        self.semctl(ctl).map_err(|e| Error::semaphore(name, e))
    }

    /// Current `[write, read]` values.
    pub fn values(&self) -> Result<[u16; SEM_COUNT]> {
        let mut vals = [0; SEM_COUNT];
        self.control(SemControl::GetAll(&mut vals))?;
        Ok(vals)
    }

    /// Destroys the kernel object. Processes blocked on it wake with `EIDRM`.
    pub fn remove(&self) -> Result<()> {
        semctl_rmid(self.id)
            .map_err(|e| Error::semaphore("semctl(IPC_RMID)", e))
    }

    fn semctl(&self, ctl: SemControl<'_>) -> nix::Result<c_int> {
        let ret = unsafe {
            match ctl {
                SemControl::SetValue { turn, value } => {
                    libc::semctl(self.id, turn.index(), libc::SETVAL, value as c_int)
                }
                SemControl::GetValue { turn } => libc::semctl(self.id, turn.index(), libc::GETVAL),
                SemControl::GetAll(vals) => {
                    libc::semctl(self.id, 0, libc::GETALL, vals.as_mut_ptr())
                }
                SemControl::SetAll(vals) => libc::semctl(self.id, 0, libc::SETALL, vals.as_ptr()),
            }
        };
        Errno::result(ret)
    }

    fn semop(&self, turn: Turn, delta: i16, op: &'static str) -> Result<()> {
        let mut sop = libc::sembuf {
            sem_num: turn as u16,
            sem_op: delta,
            sem_flg: 0,
        };
        loop {
            match Errno::result(unsafe { libc::semop(self.id, &mut sop, 1) }) {
                Ok(_) => return Ok(()),
                Err(Errno::EINTR) => trace!(?turn, delta, "semop interrupted, retrying"),
                Err(e) => return Err(Error::semaphore(op, e)),
            }
        }
    }
}

pub(crate) fn semctl_rmid(id: c_int) -> nix::Result<()> {
    Errno::result(unsafe { libc::semctl(id, 0, libc::IPC_RMID) }).map(drop)
}
