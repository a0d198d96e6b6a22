use std::fmt;

/// Totals of one transfer. The end-of-stream sentinel is not a chunk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub bytes: u64,
    pub chunks: u64,
}

impl Summary {
    pub fn record(&mut self, n: usize) {
        self.bytes += n as u64;
        self.chunks += 1;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes in {} chunks", self.bytes, self.chunks)
    }
}
