use std::io::{self, Read};
use std::mem::size_of;

use crate::error::{Error, ErrorKind, Result};
use crate::shm::Shm;

/// Bytes carried per chunk.
pub const CAPACITY: usize = 4096;

/// Value of `count` that marks the end of the stream.
pub const SENTINEL: isize = 0;

/// The record living in shared memory.
///
/// Only the holder of the matching turn may read or write it.
#[repr(C)]
pub struct Segment {
    pub count: isize,
    pub buffer: [u8; CAPACITY],
}

impl Segment {
    pub const SIZE: usize = size_of::<Segment>();

    pub fn from_shm(shm: &Shm) -> &Self {
        assert!(shm.len() >= Self::SIZE);
        let ptr = shm.as_ptr() as *const Self;
        assert!(ptr.is_aligned());
        unsafe { &*ptr }
    }

    pub fn from_shm_mut(shm: &mut Shm) -> &mut Self {
        assert!(shm.len() >= Self::SIZE);
        let ptr = shm.as_mut_ptr() as *mut Self;
        assert!(ptr.is_aligned());
        unsafe { &mut *ptr }
    }

    /// Reads up to [`CAPACITY`] bytes from `input` and records how many
    /// arrived. Zero means `input` is exhausted.
    pub fn fill<R: Read + ?Sized>(&mut self, input: &mut R) -> io::Result<usize> {
        let n = loop {
            match input.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.count = n as isize;
        Ok(n)
    }

    pub fn is_sentinel(&self) -> bool {
        self.count == SENTINEL
    }

    /// The bytes of the current chunk, or `None` at end of stream.
    pub fn chunk(&self) -> Result<Option<&[u8]>> {
        match self.count {
            SENTINEL => Ok(None),
            n if n > 0 && n as usize <= CAPACITY => Ok(Some(&self.buffer[..n as usize])),
            count => Err(Error::new(ErrorKind::CountOutOfRange {
                count,
                capacity: CAPACITY,
            })),
        }
    }
}
