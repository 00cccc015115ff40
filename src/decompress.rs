use std::{io::Read, sync::Arc};

#[cfg(feature = "lz4")]
use std::io::{self, Cursor};

/// Transform applied to the payload of a packed entry.
///
/// The transform receives the compressed bytes (the payload after its 8 byte
/// framing header) as a stream and returns a stream of the decompressed
/// bytes. It is expected to yield exactly `unpacked_len` bytes; errors
/// encountered while decoding surface as I/O errors from the returned
/// reader.
///
/// Archives of this family are produced by several engines that don't agree
/// on the back-reference scheme, so the transform is pluggable.
///
/// ```
/// use resarc::{Decompressor, Stored};
/// use std::io::Read;
///
/// let mut out = Vec::new();
/// Stored.decompress(Box::new(&b"abc"[..]), 3).read_to_end(&mut out).unwrap();
/// assert_eq!(out, b"abc");
/// ```
pub trait Decompressor {
    /// Wrap the compressed stream in a decompressing reader
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, unpacked_len: u32) -> Box<dyn Read + 'a>;
}

impl<T: Decompressor + ?Sized> Decompressor for &'_ T {
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, unpacked_len: u32) -> Box<dyn Read + 'a> {
        (**self).decompress(packed, unpacked_len)
    }
}

impl<T: Decompressor + ?Sized> Decompressor for Box<T> {
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, unpacked_len: u32) -> Box<dyn Read + 'a> {
        (**self).decompress(packed, unpacked_len)
    }
}

impl<T: Decompressor + ?Sized> Decompressor for Arc<T> {
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, unpacked_len: u32) -> Box<dyn Read + 'a> {
        (**self).decompress(packed, unpacked_len)
    }
}

/// Pass the payload through untouched, for producers that set the packed
/// flag without compressing
#[derive(Debug, Default, Clone, Copy)]
pub struct Stored;

impl Decompressor for Stored {
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, unpacked_len: u32) -> Box<dyn Read + 'a> {
        Box::new(packed.take(u64::from(unpacked_len)))
    }
}

/// Raw deflate streams (no zlib or gzip wrapper)
#[cfg(feature = "deflate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Deflate;

#[cfg(feature = "deflate")]
impl Decompressor for Deflate {
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, _unpacked_len: u32) -> Box<dyn Read + 'a> {
        Box::new(flate2::read::DeflateDecoder::new(packed))
    }
}

/// LZ4 block data without a frame header, sized by the entry's framing
#[cfg(feature = "lz4")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4;

#[cfg(feature = "lz4")]
impl Decompressor for Lz4 {
    fn decompress<'a>(&self, packed: Box<dyn Read + 'a>, unpacked_len: u32) -> Box<dyn Read + 'a> {
        Box::new(Lz4Reader {
            packed: Some(packed),
            unpacked_len,
            out: Cursor::new(Vec::new()),
        })
    }
}

/// Blocks only decode as a whole, so the first read decodes everything
#[cfg(feature = "lz4")]
struct Lz4Reader<'a> {
    packed: Option<Box<dyn Read + 'a>>,
    unpacked_len: u32,
    out: Cursor<Vec<u8>>,
}

#[cfg(feature = "lz4")]
impl Read for Lz4Reader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(mut packed) = self.packed.take() {
            let mut compressed = Vec::new();
            packed.read_to_end(&mut compressed)?;

            // a block can't expand past 255 times its length
            let max_len = compressed.len().saturating_mul(255).saturating_add(16);
            let len = (self.unpacked_len as usize).min(max_len);
            let data = lz4_flex::block::decompress(&compressed, len)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            self.out = Cursor::new(data);
        }

        self.out.read(buf)
    }
}

#[cfg(feature = "deflate")]
pub(crate) fn default_decompressor() -> Arc<dyn Decompressor + Send + Sync> {
    Arc::new(Deflate)
}

#[cfg(not(feature = "deflate"))]
pub(crate) fn default_decompressor() -> Arc<dyn Decompressor + Send + Sync> {
    Arc::new(Stored)
}
