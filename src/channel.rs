use nix::libc::c_int;
use tracing::{debug, warn};

use crate::error::Result;
use crate::key::ChannelKeys;
use crate::segment::Segment;
use crate::shm::{self, Shm};
use crate::sync::{self, SemaphoreSet};

/// Permissions for both kernel objects.
pub const MODE: u32 = 0o600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the kernel objects and is responsible for removing them.
    Creator,
    /// Attached to objects someone else created.
    Attached,
}

/// A live handle to the segment and the semaphore set of one session.
#[derive(Debug)]
pub struct Channel {
    sems: SemaphoreSet,
    shm: Shm,
    role: Role,
}

impl Channel {
    /// Producer side: creates both objects, failing if either key is taken.
    pub fn create(keys: ChannelKeys) -> Result<Self> {
        let sems = SemaphoreSet::create(keys.semaphores, MODE)?;
        let shm = match Shm::options()
            .mode(MODE)
            .create(true)
            .exclusive(true)
            .open(keys.memory, Segment::SIZE)
        {
            Ok(shm) => shm,
            Err(e) => {
                let _ = sems.remove();
                return Err(e);
            }
        };
        debug!(semid = sems.id(), shmid = shm.id(), "created channel");
        Ok(Channel {
            sems,
            shm,
            role: Role::Creator,
        })
    }

    /// Consumer side: opens existing objects and maps the segment read-only.
    pub fn open(keys: ChannelKeys) -> Result<Self> {
        let sems = SemaphoreSet::open(keys.semaphores)?;
        let shm = Shm::open(keys.memory, Segment::SIZE)?;
        debug!(semid = sems.id(), shmid = shm.id(), "attached channel");
        Ok(Channel {
            sems,
            shm,
            role: Role::Attached,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn semaphores(&self) -> &SemaphoreSet {
        &self.sems
    }

    /// Only call while holding a turn.
    pub fn segment(&self) -> &Segment {
        Segment::from_shm(&self.shm)
    }

    /// Only call while holding the write turn.
    pub fn segment_mut(&mut self) -> &mut Segment {
        Segment::from_shm_mut(&mut self.shm)
    }

    /// Removes both kernel objects. Existing attachments stay valid until
    /// they detach; blocked semaphore waiters fail with `EIDRM`.
    pub fn remove(&self) -> Result<()> {
        let sems = self.sems.remove();
        self.shm.remove()?;
        sems
    }

    /// A guard that removes this channel's kernel objects when dropped.
    pub(crate) fn remove_on_drop(&self) -> RemoveOnDrop {
        RemoveOnDrop {
            semid: self.sems.id(),
            shmid: self.shm.id(),
            armed: true,
        }
    }

    pub(crate) fn into_parts(self) -> (SemaphoreSet, Shm) {
        (self.sems, self.shm)
    }
}

#[derive(Debug)]
pub(crate) struct RemoveOnDrop {
    semid: c_int,
    shmid: c_int,
    armed: bool,
}

impl RemoveOnDrop {
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if self.armed {
            warn!(semid = self.semid, shmid = self.shmid, "removing abandoned channel");
            let _ = sync::semctl_rmid(self.semid);
            let _ = shm::shmctl_rmid(self.shmid);
        }
    }
}
