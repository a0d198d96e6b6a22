use std::io::Write;

use tracing::{debug, trace, warn};

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::key::ChannelKeys;
use crate::summary::Summary;
use crate::sync::Turn;

/// Reading end of a channel.
#[derive(Debug)]
pub struct Consumer {
    channel: Channel,
    summary: Summary,
}

impl Consumer {
    pub fn open(keys: ChannelKeys) -> Result<Self> {
        Ok(Self::new(Channel::open(keys)?))
    }

    pub fn new(channel: Channel) -> Self {
        Consumer {
            channel,
            summary: Summary::default(),
        }
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Waits for the read turn and copies the chunk to `output`.
    ///
    /// Returns `None` on the sentinel. The read turn is consumed in that
    /// case and nothing is posted; call [`finish`](Consumer::finish) next.
    pub fn recv_chunk<W: Write + ?Sized>(&mut self, output: &mut W) -> Result<Option<usize>> {
        self.channel.semaphores().wait(Turn::Read)?;
        let Some(chunk) = self.channel.segment().chunk()? else {
            debug!("end of stream");
            return Ok(None);
        };
        output
            .write_all(chunk)
            .map_err(|e| Error::io("write stdout", e))?;
        let n = chunk.len();
        self.channel.semaphores().post(Turn::Write)?;
        trace!(n, "returned turn");
        self.summary.record(n);
        Ok(Some(n))
    }

    /// Detaches the segment, then posts the write turn one last time so the
    /// producer knows it may remove the channel.
    pub fn finish(self) -> Result<()> {
        let (sems, shm) = self.channel.into_parts();
        let detached = shm.detach();
        let posted = sems.post(Turn::Write);
        match (posted, detached) {
            (Err(e), Err(detach)) => {
                warn!(error = %detach, "shmdt failed");
                Err(e)
            }
            (posted, detached) => posted.and(detached),
        }
    }

    /// Drains the channel into `output` until end of stream.
    pub fn run<W: Write>(mut self, mut output: W) -> Result<Summary> {
        while self.recv_chunk(&mut output)?.is_some() {}
        output.flush().map_err(|e| Error::io("flush stdout", e))?;
        let summary = self.summary;
        self.finish()?;
        Ok(summary)
    }
}
