use super::Entry;
use crate::{
    view::read_u32_at, ArchiveError, ArchiveErrorKind, ByteView, Decompressor, MalformedKind,
};
use rawzip::RangeReader;
use std::io::{self, Read};

/// Bytes before the compressed data of a packed payload: a 4 byte reserved
/// field followed by the little endian unpacked length.
pub const PACKED_FRAME_LEN: u32 = 8;

/// The declared unpacked length is untrusted until the data is decoded
const PREALLOCATION_LIMIT: u32 = 16 * 1024 * 1024;

/// A readable stream of an entry's contents.
///
/// Dropping the reader releases everything it holds, whether or not it was
/// read to the end.
pub enum EntryReader<'a, V> {
    /// Stored bytes, read straight out of the archive
    Raw(RangeReader<&'a V>),

    /// Output of the decompressor over a packed payload
    Packed(Box<dyn Read + 'a>),
}

impl<V> std::fmt::Debug for EntryReader<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryReader::Raw(_) => f.write_str("Raw"),
            EntryReader::Packed(_) => f.write_str("Packed"),
        }
    }
}

impl<V: ByteView> Read for EntryReader<'_, V> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryReader::Raw(x) => x.read(buf),
            EntryReader::Packed(x) => x.read(buf),
        }
    }
}

/// Open a stream over an entry.
///
/// For packed entries the unpacked length is read out of the framing header
/// only when the entry doesn't already know it.
pub(crate) fn open_entry<'a, V, D>(
    view: &'a V,
    entry: &Entry,
    decompressor: &D,
) -> Result<EntryReader<'a, V>, ArchiveError>
where
    V: ByteView,
    D: Decompressor + ?Sized,
{
    if !entry.is_packed() {
        return Ok(EntryReader::Raw(RangeReader::new(view, entry.payload_range())));
    }

    if entry.size() < PACKED_FRAME_LEN {
        return Err(MalformedKind::PackedFrameTooSmall {
            offset: entry.offset(),
            size: entry.size(),
        }
        .into());
    }

    let start = u64::from(entry.offset());
    let unpacked_size = match entry.cached_unpacked_size() {
        Some(x) => x,
        None => {
            let x = read_u32_at(view, start + 4)?;
            entry.remember_unpacked_size(x);
            x
        }
    };

    let payload = entry.payload_range();
    let packed = RangeReader::new(view, start + u64::from(PACKED_FRAME_LEN)..payload.end);
    let reader = decompressor.decompress(Box::new(packed), unpacked_size);
    Ok(EntryReader::Packed(reader))
}

/// Drain an entry's stream into memory.
///
/// Packed entries must yield exactly their declared length; any shortfall,
/// surplus, or I/O failure while decoding is a decompression failure.
pub(crate) fn read_entry<V: ByteView>(
    mut reader: EntryReader<'_, V>,
    entry: &Entry,
) -> Result<Vec<u8>, ArchiveError> {
    match reader {
        EntryReader::Raw(ref mut raw) => {
            let mut out = Vec::with_capacity(entry.size() as usize);
            raw.read_to_end(&mut out)?;
            Ok(out)
        }
        EntryReader::Packed(ref mut packed) => {
            let expected = entry.unpacked_size();
            let mut out = Vec::with_capacity(expected.min(PREALLOCATION_LIMIT) as usize);

            // one byte past the declared length is enough to detect a surplus
            let limit = u64::from(expected) + 1;
            let result = packed.take(limit).read_to_end(&mut out);
            match result {
                Ok(n) if n as u64 == u64::from(expected) => Ok(out),
                Ok(n) => Err(ArchiveErrorKind::DecompressionFailure {
                    expected,
                    actual: n as u64,
                    source: None,
                }
                .into()),
                Err(e) => Err(ArchiveErrorKind::DecompressionFailure {
                    expected,
                    actual: out.len() as u64,
                    source: Some(e),
                }
                .into()),
            }
        }
    }
}
