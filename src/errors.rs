use std::fmt;

/// An error that can occur when decoding an archive or one of its entries
#[derive(Debug)]
pub struct ArchiveError(Box<ArchiveErrorKind>);

impl ArchiveError {
    pub(crate) fn new(kind: ArchiveErrorKind) -> ArchiveError {
        ArchiveError(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ArchiveErrorKind {
        &self.0
    }

    /// Consume the error and return the specific type of error
    pub fn into_kind(self) -> ArchiveErrorKind {
        *self.0
    }

    /// Returns the byte offset that the error occurs (if available)
    pub fn offset(&self) -> Option<u64> {
        self.0.offset()
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ArchiveErrorKind {
    /// The underlying byte source failed
    Io(std::io::Error),

    /// A byte range that must be read lies past the end of the archive
    Truncated { offset: u64, len: u64, available: u64 },

    /// The index describes data that cannot belong to this archive
    Malformed(MalformedKind),

    /// A packed payload did not decompress into its declared length
    DecompressionFailure {
        expected: u32,
        actual: u64,
        source: Option<std::io::Error>,
    },

    /// The image codec rejected an entry's contents
    Image(image::ImageError),
}

/// Reason why an archive or entry was rejected as malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    /// An entry's payload extends past the end of the archive
    EntryOutOfBounds {
        index: u32,
        offset: u32,
        size: u32,
        available: u64,
    },

    /// A packed entry is too small to hold its 8 byte framing header
    PackedFrameTooSmall { offset: u32, size: u32 },
}

impl ArchiveErrorKind {
    pub fn offset(&self) -> Option<u64> {
        match *self {
            ArchiveErrorKind::Truncated { offset, .. } => Some(offset),
            ArchiveErrorKind::Malformed(MalformedKind::EntryOutOfBounds { offset, .. }) => {
                Some(u64::from(offset))
            }
            ArchiveErrorKind::Malformed(MalformedKind::PackedFrameTooSmall { offset, .. }) => {
                Some(u64::from(offset))
            }
            _ => None,
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ArchiveErrorKind::Io(ref err) => Some(err),
            ArchiveErrorKind::DecompressionFailure {
                source: Some(ref err),
                ..
            } => Some(err),
            ArchiveErrorKind::Image(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ArchiveErrorKind::Io(ref err) => write!(f, "io error: {}", err),
            ArchiveErrorKind::Truncated {
                offset,
                len,
                available,
            } => write!(
                f,
                "archive truncated: {} bytes requested at offset {} but only {} bytes available",
                len, offset, available
            ),
            ArchiveErrorKind::Malformed(ref kind) => write!(f, "malformed archive: {}", kind),
            ArchiveErrorKind::DecompressionFailure {
                expected,
                actual,
                ref source,
            } => match source {
                Some(err) => write!(
                    f,
                    "decompression failed after {} of {} bytes: {}",
                    actual, expected, err
                ),
                None => write!(
                    f,
                    "decompression produced {} bytes but {} were declared",
                    actual, expected
                ),
            },
            ArchiveErrorKind::Image(ref err) => write!(f, "image error: {}", err),
        }
    }
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MalformedKind::EntryOutOfBounds {
                index,
                offset,
                size,
                available,
            } => write!(
                f,
                "entry {} (offset: {}, size: {}) extends past the end of a {} byte archive",
                index, offset, size, available
            ),
            MalformedKind::PackedFrameTooSmall { offset, size } => write!(
                f,
                "packed entry at offset {} has {} bytes, fewer than its framing header",
                offset, size
            ),
        }
    }
}

impl From<ArchiveErrorKind> for ArchiveError {
    fn from(kind: ArchiveErrorKind) -> Self {
        ArchiveError::new(kind)
    }
}

impl From<MalformedKind> for ArchiveError {
    fn from(kind: MalformedKind) -> Self {
        ArchiveError::new(ArchiveErrorKind::Malformed(kind))
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(error: std::io::Error) -> Self {
        ArchiveError::new(ArchiveErrorKind::Io(error))
    }
}

impl From<image::ImageError> for ArchiveError {
    fn from(error: image::ImageError) -> Self {
        ArchiveError::new(ArchiveErrorKind::Image(error))
    }
}
