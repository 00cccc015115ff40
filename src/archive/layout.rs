use crate::{util::le_u32, view::read_array_at, ArchiveError, ByteView};
use std::{fmt, io};

/// The default upper bound on a header's declared entry count.
///
/// The bound carries no meaning for the format itself. It only stops random
/// bytes from being read as a count of billions of entries.
pub const DEFAULT_MAX_ENTRIES: u32 = 1_000_000;

/// Identifies which of the known header layouts an archive uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LayoutKind {
    /// Count at 4, index at 8, 0x24 byte records
    A,

    /// Count at 8, index at 0xC, 0x24 byte records
    B,

    /// Count at 12, index at 0x10, 0x2C byte records
    C,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutKind::A => f.write_str("A"),
            LayoutKind::B => f.write_str("B"),
            LayoutKind::C => f.write_str("C"),
        }
    }
}

/// Placement of the fields within a single index record. All offsets are
/// relative to the start of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RecordShape {
    /// Total bytes occupied by one record
    pub size: u32,

    /// Little endian integer, nonzero when the payload is packed
    pub packed_flag: u32,

    /// Start of the nul padded name
    pub name: u32,

    /// Width of the name field
    pub name_len: u32,

    /// Little endian absolute offset of the payload
    pub payload_offset: u32,

    /// Little endian stored length of the payload
    pub payload_size: u32,
}

impl RecordShape {
    /// 0x24 byte records shared by layouts A and B
    pub const V1: RecordShape = RecordShape {
        size: 0x24,
        packed_flag: 0x00,
        name: 0x04,
        name_len: 0x18,
        payload_offset: 0x1C,
        payload_size: 0x20,
    };

    /// 0x2C byte records of layout C
    pub const V2: RecordShape = RecordShape {
        size: 0x2C,
        packed_flag: 0x00,
        name: 0x04,
        name_len: 0x18,
        payload_offset: 0x24,
        payload_size: 0x28,
    };

    #[inline]
    pub(crate) fn packed_flag(&self, record: &[u8]) -> u32 {
        le_u32(&record[self.packed_flag as usize..])
    }

    #[inline]
    pub(crate) fn name<'a>(&self, record: &'a [u8]) -> &'a [u8] {
        let start = self.name as usize;
        &record[start..start + self.name_len as usize]
    }

    #[inline]
    pub(crate) fn payload_offset(&self, record: &[u8]) -> u32 {
        le_u32(&record[self.payload_offset as usize..])
    }

    #[inline]
    pub(crate) fn payload_size(&self, record: &[u8]) -> u32 {
        le_u32(&record[self.payload_size as usize..])
    }
}

/// One hypothesis about how an archive's header and index are laid out.
///
/// No version tag exists in these archives. Instead each layout names where
/// the entry count and the offset of the first payload byte live, and a
/// layout is accepted only when the index it implies ends exactly where the
/// first payload begins:
///
/// ```text
/// count * record.size + index_base == first_offset
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Layout {
    kind: LayoutKind,
    count_offset: u32,
    first_offset_offset: u32,
    index_base: u32,
    record: RecordShape,
}

impl Layout {
    pub const A: Layout = Layout {
        kind: LayoutKind::A,
        count_offset: 4,
        first_offset_offset: 0x24,
        index_base: 8,
        record: RecordShape::V1,
    };

    pub const B: Layout = Layout {
        kind: LayoutKind::B,
        count_offset: 8,
        first_offset_offset: 0x28,
        index_base: 0xC,
        record: RecordShape::V1,
    };

    pub const C: Layout = Layout {
        kind: LayoutKind::C,
        count_offset: 12,
        first_offset_offset: 0x34,
        index_base: 0x10,
        record: RecordShape::V2,
    };

    /// Every known layout in the order they are tried
    pub const PROBE_ORDER: [Layout; 3] = [Layout::A, Layout::B, Layout::C];

    /// Which layout this is
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Absolute offset of the little endian entry count
    pub fn count_field_offset(&self) -> u32 {
        self.count_offset
    }

    /// Absolute offset of the field holding the first payload's offset
    pub fn first_offset_field_offset(&self) -> u32 {
        self.first_offset_offset
    }

    /// Absolute offset of the first index record
    pub fn index_base(&self) -> u32 {
        self.index_base
    }

    /// Shape of the index records
    pub fn record(&self) -> RecordShape {
        self.record
    }

    /// Number of index bytes occupied by `count` records
    pub fn index_len(&self, count: u32) -> u64 {
        u64::from(count) * u64::from(self.record.size)
    }

    /// Absolute offset of the record in slot `index`
    pub fn record_offset(&self, index: u32) -> u64 {
        u64::from(self.index_base) + self.index_len(index)
    }

    /// The self-consistency test for this layout given the two header fields
    /// it points at.
    ///
    /// ```
    /// use resarc::Layout;
    ///
    /// assert!(Layout::A.accepts(2, 2 * 0x24 + 8, 1000));
    /// assert!(Layout::A.accepts(2, 0x50, 1000));
/// assert!(!Layout::A.accepts(2, 0x4c, 1000));
    /// assert!(!Layout::A.accepts(2000, 2000 * 0x24 + 8, 1000));
    /// ```
    pub fn accepts(&self, count: u32, first_offset: u32, max_entries: u32) -> bool {
        count <= max_entries
            && count <= i32::MAX as u32
            && self.record_offset(count) == u64::from(first_offset)
    }

    /// Read this layout's header fields from the view and test them. Returns
    /// the declared entry count when the layout holds.
    ///
    /// A view too short to contain the fields rejects the hypothesis rather
    /// than failing.
    pub fn check<V>(&self, view: &V, max_entries: u32) -> io::Result<Option<u32>>
    where
        V: ByteView,
    {
        let count = match read_field(view, self.count_offset)? {
            Some(x) => x,
            None => return Ok(None),
        };

        let first_offset = match read_field(view, self.first_offset_offset)? {
            Some(x) => x,
            None => return Ok(None),
        };

        if self.accepts(count, first_offset, max_entries) {
            Ok(Some(count))
        } else {
            log::trace!(
                "layout {} rejected (count: {}, first offset: {:#x})",
                self.kind,
                count,
                first_offset
            );
            Ok(None)
        }
    }
}

fn read_field<V>(view: &V, offset: u32) -> io::Result<Option<u32>>
where
    V: ByteView,
{
    match read_array_at::<4, V>(view, u64::from(offset)) {
        Ok(data) => Ok(Some(u32::from_le_bytes(data))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

/// Try each known layout in order, returning the first that holds along with
/// its declared entry count. `None` means the data is not an archive of this
/// family, which is an expected outcome and not an error.
pub fn probe<V>(view: &V, max_entries: u32) -> Result<Option<(Layout, u32)>, ArchiveError>
where
    V: ByteView,
{
    for layout in Layout::PROBE_ORDER {
        if let Some(count) = layout.check(view, max_entries)? {
            log::debug!("resolved layout {} with {} index slots", layout.kind, count);
            return Ok(Some((layout, count)));
        }
    }

    log::debug!("no archive layout matched");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::*;
    use std::io::Cursor;

    fn header(layout: Layout, count: u32, first_offset: u32) -> Cursor<Vec<u8>> {
        let mut data = vec![0u8; 0x40];
        let at = layout.count_field_offset() as usize;
        data[at..at + 4].copy_from_slice(&count.to_le_bytes());
        let at = layout.first_offset_field_offset() as usize;
        data[at..at + 4].copy_from_slice(&first_offset.to_le_bytes());
        Cursor::new(data)
    }

    #[rstest]
    #[case(Layout::A, 8, 0x24)]
    #[case(Layout::B, 0xC, 0x24)]
    #[case(Layout::C, 0x10, 0x2C)]
    fn test_record_offsets(#[case] layout: Layout, #[case] base: u64, #[case] size: u64) {
        assert_eq!(layout.record_offset(0), base);
        assert_eq!(layout.record_offset(3), base + 3 * size);
        assert_eq!(layout.index_len(3), 3 * size);
    }

    #[rstest]
    #[case(Layout::A)]
    #[case(Layout::B)]
    #[case(Layout::C)]
    fn test_check_accepts_consistent_header(#[case] layout: Layout) {
        let first = layout.record_offset(1) as u32;
        let data = header(layout, 1, first);
        assert_eq!(layout.check(&data, DEFAULT_MAX_ENTRIES).unwrap(), Some(1));
    }

    #[test]
    fn test_check_short_view_rejects() {
        let data = Cursor::new(vec![0u8; 0x30]);
        assert_eq!(Layout::C.check(&data, DEFAULT_MAX_ENTRIES).unwrap(), None);
    }

    #[test]
    fn test_check_respects_bound() {
        let data = header(Layout::A, 10, Layout::A.record_offset(10) as u32);
        assert_eq!(Layout::A.check(&data, 9).unwrap(), None);
        assert_eq!(Layout::A.check(&data, 10).unwrap(), Some(10));
    }

    #[test]
    fn test_negative_count_rejected() {
        // -1 as an i32 count; the equation wraps to 8 + 0x24 * 0xffffffff in 32 bits
        let first = 8u32.wrapping_add(0x24u32.wrapping_mul(u32::MAX));
        assert!(!Layout::A.accepts(u32::MAX, first, u32::MAX));
    }

    #[test]
    fn test_empty_archive_accepted() {
        let data = header(Layout::A, 0, 8);
        assert_eq!(probe(&data, DEFAULT_MAX_ENTRIES).unwrap(), Some((Layout::A, 0)));
    }

    #[quickcheck]
    fn probe_never_panics(data: Vec<u8>) -> bool {
        probe(&Cursor::new(data), DEFAULT_MAX_ENTRIES).is_ok()
    }

    #[quickcheck]
    fn accepted_count_within_bound(data: Vec<u8>, max_entries: u32) -> bool {
        match probe(&Cursor::new(data), max_entries).unwrap() {
            Some((_, count)) => count <= max_entries,
            None => true,
        }
    }
}
