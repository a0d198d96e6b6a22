use std::io::Read;

use tracing::{debug, trace};

use crate::channel::{Channel, RemoveOnDrop, Role};
use crate::error::{Error, ErrorKind, Result};
use crate::key::ChannelKeys;
use crate::summary::Summary;
use crate::sync::Turn;

/// Writing end of a channel. Owns the kernel objects.
///
/// Each call to [`send_chunk`] is one `wait(write) -> fill -> post(read)`
/// pass. After the sentinel has gone out, [`finish`] blocks once more on the
/// write turn; the consumer posts it only after detaching, so once it
/// returns nothing else will touch the objects and they can be removed.
///
/// A producer dropped before `finish` removes both objects, which wakes a
/// blocked consumer with `EIDRM`.
///
/// [`send_chunk`]: Producer::send_chunk
/// [`finish`]: Producer::finish
#[derive(Debug)]
pub struct Producer {
    channel: Channel,
    summary: Summary,
    cleanup: RemoveOnDrop,
}

impl Producer {
    pub fn create(keys: ChannelKeys) -> Result<Self> {
        Self::new(Channel::create(keys)?)
    }

    /// Fails with [`ErrorKind::NotCreator`] unless `channel` came from
    /// [`Channel::create`].
    pub fn new(channel: Channel) -> Result<Self> {
        if channel.role() != Role::Creator {
            return Err(Error::new(ErrorKind::NotCreator));
        }
        let cleanup = channel.remove_on_drop();
        Ok(Producer {
            channel,
            summary: Summary::default(),
            cleanup,
        })
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Moves one chunk of `input` into the segment and hands the turn to
    /// the consumer. Returns the chunk length; `0` means the sentinel was
    /// sent and the next step is [`finish`](Producer::finish).
    pub fn send_chunk<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<usize> {
        self.channel.semaphores().wait(Turn::Write)?;
        let n = self
            .channel
            .segment_mut()
            .fill(input)
            .map_err(|e| Error::io("read stdin", e))?;
        self.channel.semaphores().post(Turn::Read)?;
        trace!(n, "posted chunk");
        if n > 0 {
            self.summary.record(n);
        }
        Ok(n)
    }

    /// Waits for the consumer's final post, then removes the semaphore set
    /// and the segment.
    pub fn finish(self) -> Result<()> {
        let Producer {
            channel,
            mut cleanup,
            ..
        } = self;
        cleanup.disarm();
        let handshake = channel.semaphores().wait(Turn::Write);
        let (sems, shm) = channel.into_parts();
        let sems_removed = sems.remove();
        let shm_removed = shm.remove();
        let detached = shm.detach();
        handshake?;
        sems_removed?;
        shm_removed?;
        detached?;
        debug!("channel removed");
        Ok(())
    }

    /// Streams all of `input`, then tears the channel down.
    pub fn run<R: Read>(mut self, mut input: R) -> Result<Summary> {
        while self.send_chunk(&mut input)? > 0 {}
        let summary = self.summary;
        self.finish()?;
        Ok(summary)
    }
}
