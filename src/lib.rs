//! Byte-stream transfer between two processes through a System V shared
//! memory segment guarded by a pair of semaphores.
//!
//! The producer creates the channel and owns the kernel objects; the
//! consumer attaches to it by key. Exactly one side holds the turn at any
//! time, and a zero `count` in the segment ends the stream.

pub mod channel;
pub mod consumer;
pub mod error;
pub mod key;
pub mod logging;
pub mod producer;
pub mod segment;
pub mod shm;
pub mod summary;
pub mod sync;

pub use channel::{Channel, Role};
pub use consumer::Consumer;
pub use error::{Error, ErrorKind, Result};
pub use key::ChannelKeys;
pub use producer::Producer;
pub use segment::{Segment, CAPACITY};
pub use shm::Shm;
pub use summary::Summary;
pub use sync::{SemControl, SemaphoreSet, Turn};
