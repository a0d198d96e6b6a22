use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Creating, opening or attaching a kernel object failed.
    #[error("{op}: {source}")]
    Setup {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    /// A semaphore operation failed for a reason other than `EINTR`.
    #[error("{op}: {source}")]
    Semaphore {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    /// A producer was handed a channel it did not create.
    #[error("producer needs the channel it created")]
    NotCreator,
    #[error("segment count {count} outside of 0..={capacity}")]
    CountOutOfRange { count: isize, capacity: usize },
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub fn setup(op: &'static str, source: impl Into<io::Error>) -> Self {
        Self::new(ErrorKind::Setup {
            op,
            source: source.into(),
        })
    }

    pub fn semaphore(op: &'static str, source: impl Into<io::Error>) -> Self {
        Self::new(ErrorKind::Semaphore {
            op,
            source: source.into(),
        })
    }

    pub fn io(op: &'static str, source: impl Into<io::Error>) -> Self {
        Self::new(ErrorKind::Io {
            op,
            source: source.into(),
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// True when a kernel object named by key does not exist.
    pub fn is_not_found(&self) -> bool {
        match &self.kind {
            ErrorKind::Setup { source, .. } | ErrorKind::Semaphore { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn display_names_operation() {
        let err = Error::setup("shmget", Errno::EEXIST);
        let msg = err.to_string();
        assert!(msg.starts_with("shmget: "), "{msg}");
    }

    #[test]
    fn enoent_is_not_found() {
        assert!(Error::setup("semget", Errno::ENOENT).is_not_found());
        assert!(!Error::setup("semget", Errno::EACCES).is_not_found());
        assert!(!Error::io("read stdin", Errno::ENOENT).is_not_found());
    }

    #[test]
    fn count_out_of_range_message() {
        let err = Error::new(ErrorKind::CountOutOfRange {
            count: -3,
            capacity: 16,
        });
        assert_eq!(err.to_string(), "segment count -3 outside of 0..=16");
    }
}
