use crate::{ArchiveError, ArchiveErrorKind};
use rawzip::{FileReader, ReaderAt};
use std::{
    fs::File,
    io::{self, Cursor},
};

/// Random access to the bytes of an archive.
///
/// Reads go through [ReaderAt], which is positional and takes `&self`, so a
/// view can be shared between every entry reader opened from the same
/// archive. A view additionally knows its own length.
///
/// ```
/// use resarc::{ByteView, ReaderAt};
/// use std::io::Cursor;
///
/// let data = Cursor::new(vec![1u8, 2, 3, 4, 5]);
/// let mut buf = [0u8; 2];
/// assert_eq!(data.read_at(&mut buf, 3).unwrap(), 2);
/// assert_eq!(buf, [4, 5]);
/// assert_eq!(data.size().unwrap(), 5);
/// ```
pub trait ByteView: ReaderAt {
    /// The total number of bytes in the view
    fn size(&self) -> io::Result<u64>;
}

impl<T: AsRef<[u8]>> ByteView for Cursor<T> {
    #[inline]
    fn size(&self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }
}

impl<T: ByteView> ByteView for &'_ T {
    #[inline]
    fn size(&self) -> io::Result<u64> {
        (**self).size()
    }
}

/// A file on disk, read positionally.
///
/// The length is captured when the view is created, as archives are
/// treated as immutable once opened.
#[derive(Debug)]
pub struct FileView {
    reader: FileReader,
    len: u64,
}

impl FileView {
    /// Wrap a file handle
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(FileView {
            reader: FileReader::from(file),
            len,
        })
    }
}

impl ReaderAt for FileView {
    #[inline]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.reader.read_at(buf, offset)
    }
}

impl ByteView for FileView {
    #[inline]
    fn size(&self) -> io::Result<u64> {
        Ok(self.len)
    }
}

#[inline]
pub(crate) fn read_array_at<const N: usize, V>(view: &V, offset: u64) -> io::Result<[u8; N]>
where
    V: ByteView,
{
    let mut buf = [0u8; N];
    view.read_exact_at(&mut buf, offset)?;
    Ok(buf)
}

#[inline]
pub(crate) fn read_u32_at<V>(view: &V, offset: u64) -> io::Result<u32>
where
    V: ByteView,
{
    read_array_at::<4, V>(view, offset).map(u32::from_le_bytes)
}

/// Assert that `len` bytes starting at `offset` lie within an archive of
/// `available` bytes.
pub(crate) fn reserve(offset: u64, len: u64, available: u64) -> Result<(), ArchiveError> {
    match offset.checked_add(len) {
        Some(end) if end <= available => Ok(()),
        _ => Err(ArchiveErrorKind::Truncated {
            offset,
            len,
            available,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawzip::RangeReader;
    use rstest::*;
    use std::io::{Read, Write};

    #[test]
    fn test_read_u32_at() {
        let data = Cursor::new(vec![0, 0, 0, 0, 0x4c, 0, 0, 0]);
        assert_eq!(read_u32_at(&data, 4).unwrap(), 0x4c);
        assert!(read_u32_at(&data, 6).is_err());
    }

    #[test]
    fn test_borrowed_view_size() {
        let data = Cursor::new(&b"abc"[..]);
        let view = &data;
        assert_eq!(view.size().unwrap(), 3);
        assert_eq!(read_array_at::<2, _>(&view, 1).unwrap(), *b"bc");
    }

    #[rstest]
    #[case(0, 10, 10, true)]
    #[case(8, 3, 10, false)]
    #[case(10, 0, 10, true)]
    #[case(u64::MAX, 2, 10, false)]
    fn test_reserve(#[case] offset: u64, #[case] len: u64, #[case] available: u64, #[case] ok: bool) {
        assert_eq!(reserve(offset, len, available).is_ok(), ok);
    }

    #[test]
    fn test_file_view() {
        let path = std::env::temp_dir().join(format!("resarc-view-{}", std::process::id()));
        File::create(&path)
            .unwrap()
            .write_all(b"headerPAYLOADtrailer")
            .unwrap();

        let view = FileView::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(view.size().unwrap(), 20);

        let mut out = String::new();
        RangeReader::new(&view, 6..13)
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "PAYLOAD");
        std::fs::remove_file(&path).unwrap();
    }
}
