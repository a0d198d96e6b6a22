#![allow(dead_code)]

use std::path::Path;

use shmpipe::{ChannelKeys, SemaphoreSet, Segment, Shm};
use tempfile::NamedTempFile;

/// Keys derived from a private temp file, so tests never share a channel.
///
/// Whatever the test leaves behind in the kernel is removed on drop.
pub struct TestKeys {
    file: NamedTempFile,
    pub keys: ChannelKeys,
}

impl TestKeys {
    pub fn new() -> Self {
        let file = NamedTempFile::new().unwrap();
        let keys = ChannelKeys::from_path(file.path()).unwrap();
        TestKeys { file, keys }
    }

    /// The file the keys were derived from, for `--key-path`.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for TestKeys {
    fn drop(&mut self) {
        if let Ok(sems) = SemaphoreSet::open(self.keys.semaphores) {
            let _ = sems.remove();
        }
        if let Ok(shm) = Shm::open(self.keys.memory, Segment::SIZE) {
            let _ = shm.remove();
        }
    }
}

/// Deterministic, non-repeating-looking payload.
pub fn payload(len: usize) -> Vec<u8> {
    let mut x: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        })
        .collect()
}
