use super::{Entry, Layout};
use crate::{
    util::until_nul,
    view::reserve,
    ArchiveError, ByteView, Encoding, MalformedKind,
};

/// Decode the `count` index slots that `layout` describes into the archive's
/// directory.
///
/// Slots with a stored size of zero are unused and left out. Any retained
/// slot that points past the end of the archive rejects the whole index, as
/// it means the layout was accepted by coincidence.
pub fn decode_index<V, E>(
    view: &V,
    layout: Layout,
    count: u32,
    encoding: &E,
) -> Result<Vec<Entry>, ArchiveError>
where
    V: ByteView,
    E: Encoding + ?Sized,
{
    let available = view.size()?;
    let base = u64::from(layout.index_base());
    let index_len = layout.index_len(count);
    reserve(base, index_len, available)?;

    // the reservation bounds the index by the archive length
    let mut index = vec![0u8; index_len as usize];
    view.read_exact_at(&mut index, base)?;

    let shape = layout.record();
    let mut entries = Vec::with_capacity(count as usize);
    for (i, record) in index.chunks_exact(shape.size as usize).enumerate() {
        let size = shape.payload_size(record);
        if size == 0 {
            log::trace!("skipping empty index slot {}", i);
            continue;
        }

        let offset = shape.payload_offset(record);
        let name = encoding.decode(until_nul(shape.name(record))).into_owned();
        let packed = shape.packed_flag(record) != 0;

        if u64::from(offset) + u64::from(size) > available {
            return Err(MalformedKind::EntryOutOfBounds {
                index: i as u32,
                offset,
                size,
                available,
            }
            .into());
        }

        entries.push(Entry::new(name, offset, size, packed));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArchiveErrorKind, Utf8Encoding};
    use rstest::*;
    use std::io::Cursor;

    fn record(layout: Layout, packed: u32, name: &[u8], offset: u32, size: u32) -> Vec<u8> {
        let shape = layout.record();
        let mut rec = vec![0u8; shape.size as usize];
        let at = shape.packed_flag as usize;
        rec[at..at + 4].copy_from_slice(&packed.to_le_bytes());
        let at = shape.name as usize;
        rec[at..at + name.len()].copy_from_slice(name);
        let at = shape.payload_offset as usize;
        rec[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        let at = shape.payload_size as usize;
        rec[at..at + 4].copy_from_slice(&size.to_le_bytes());
        rec
    }

    fn archive(layout: Layout, records: &[Vec<u8>], payload: usize) -> Cursor<Vec<u8>> {
        let mut data = vec![0u8; layout.index_base() as usize];
        for rec in records {
            data.extend_from_slice(rec);
        }
        data.resize(data.len() + payload, 0xaa);
        Cursor::new(data)
    }

    #[rstest]
    #[case(Layout::A)]
    #[case(Layout::B)]
    #[case(Layout::C)]
    fn test_decode_each_shape(#[case] layout: Layout) {
        let first = layout.record_offset(2) as u32;
        let records = [
            record(layout, 1, b"bg/title.tga", first, 16),
            record(layout, 0, b"se/click.ogg", first + 16, 8),
        ];
        let data = archive(layout, &records, 24);
        let entries = decode_index(&data, layout, 2, &Utf8Encoding).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "bg/title.tga");
        assert!(entries[0].is_packed());
        assert_eq!(entries[0].offset(), first);
        assert_eq!(entries[0].size(), 16);
        assert_eq!(entries[1].name(), "se/click.ogg");
        assert!(!entries[1].is_packed());
        assert_eq!(entries[1].unpacked_size(), 0);
    }

    #[test]
    fn test_zero_size_slots_dropped() {
        let layout = Layout::A;
        let first = layout.record_offset(3) as u32;
        let records = [
            record(layout, 0, b"empty", first, 0),
            record(layout, 0, b"kept", first, 4),
            record(layout, 0, b"also_empty", 0xffff_ffff, 0),
        ];
        let data = archive(layout, &records, 4);
        let entries = decode_index(&data, layout, 3, &Utf8Encoding).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "kept");
    }

    #[test]
    fn test_out_of_bounds_rejects_everything() {
        let layout = Layout::B;
        let first = layout.record_offset(2) as u32;
        let records = [
            record(layout, 0, b"good", first, 4),
            record(layout, 0, b"bad", first + 4, 100),
        ];
        let data = archive(layout, &records, 8);
        let err = decode_index(&data, layout, 2, &Utf8Encoding).unwrap_err();
        match err.kind() {
            ArchiveErrorKind::Malformed(MalformedKind::EntryOutOfBounds { index, .. }) => {
                assert_eq!(*index, 1)
            }
            x => panic!("unexpected error: {:?}", x),
        }
    }

    #[test]
    fn test_offset_overflow_is_out_of_bounds() {
        let layout = Layout::A;
        let records = [record(layout, 0, b"wrap", u32::MAX, 2)];
        let data = archive(layout, &records, 0);
        let err = decode_index(&data, layout, 1, &Utf8Encoding).unwrap_err();
        assert!(matches!(err.kind(), ArchiveErrorKind::Malformed(_)));
    }

    #[test]
    fn test_truncated_index() {
        let layout = Layout::C;
        let records = [record(layout, 0, b"only", 0, 1)];
        let data = archive(layout, &records, 0);
        let err = decode_index(&data, layout, 2, &Utf8Encoding).unwrap_err();
        assert!(matches!(err.kind(), ArchiveErrorKind::Truncated { .. }));
        assert_eq!(err.offset(), Some(0x10));
    }

    #[test]
    fn test_index_bounded_by_view_length() {
        // a count far beyond what the view holds fails before the index is read
        let layout = Layout::A;
        let data = archive(layout, &[record(layout, 0, b"only", 0, 1)], 0);
        let err = decode_index(&data, layout, 50_000_000, &Utf8Encoding).unwrap_err();
        match err.kind() {
            ArchiveErrorKind::Truncated { len, available, .. } => {
                assert_eq!(*len, 50_000_000 * 0x24);
                assert_eq!(*available, 8 + 0x24);
            }
            x => panic!("unexpected error: {:?}", x),
        }
    }

    #[test]
    fn test_name_fills_whole_field() {
        let layout = Layout::A;
        let first = layout.record_offset(1) as u32;
        let name = [b'x'; 0x18];
        let records = [record(layout, 0, &name, first, 1)];
        let data = archive(layout, &records, 1);
        let entries = decode_index(&data, layout, 1, &Utf8Encoding).unwrap();
        assert_eq!(entries[0].name().len(), 0x18);
    }
}
