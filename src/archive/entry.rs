use std::{
    fmt,
    ops::Range,
    sync::atomic::{AtomicU32, Ordering},
};

/// One resource stored in an archive.
///
/// Everything but the unpacked size is fixed when the index is decoded. The
/// unpacked size of a packed entry lives in the payload's own framing and is
/// only learned the first time the entry is opened, after which it is
/// remembered here. The cell may be filled from several threads at once:
/// each writes the same value derived from the same immutable bytes.
pub struct Entry {
    name: String,
    offset: u32,
    size: u32,
    packed: bool,
    unpacked_size: AtomicU32,
}

impl Entry {
    pub(crate) fn new(name: String, offset: u32, size: u32, packed: bool) -> Self {
        Entry {
            name,
            offset,
            size,
            packed,
            unpacked_size: AtomicU32::new(0),
        }
    }

    /// The decoded name. Names are not unique within an archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute offset of the stored payload
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Stored length of the payload, including the framing of packed entries
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether the payload must be decompressed before use
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    /// Length of the decompressed payload, or 0 while it is still unknown.
    /// Always 0 for entries that aren't packed.
    pub fn unpacked_size(&self) -> u32 {
        self.unpacked_size.load(Ordering::Relaxed)
    }

    /// Byte range of the stored payload within the archive
    pub fn payload_range(&self) -> Range<u64> {
        let start = u64::from(self.offset);
        start..start + u64::from(self.size)
    }

    pub(crate) fn cached_unpacked_size(&self) -> Option<u32> {
        match self.unpacked_size() {
            0 => None,
            x => Some(x),
        }
    }

    pub(crate) fn remember_unpacked_size(&self, len: u32) {
        self.unpacked_size.store(len, Ordering::Relaxed);
    }
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Entry {
            name: self.name.clone(),
            offset: self.offset,
            size: self.size,
            packed: self.packed,
            unpacked_size: AtomicU32::new(self.unpacked_size()),
        }
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.offset == other.offset
            && self.size == other.size
            && self.packed == other.packed
    }
}

impl Eq for Entry {}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("packed", &self.packed)
            .field("unpacked_size", &self.unpacked_size())
            .finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Entry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Entry", 5)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("offset", &self.offset)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("packed", &self.packed)?;
        state.serialize_field("unpacked_size", &self.unpacked_size())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpacked_size_memo() {
        let entry = Entry::new(String::from("a.tga"), 0x4c, 100, true);
        assert_eq!(entry.cached_unpacked_size(), None);
        entry.remember_unpacked_size(512);
        assert_eq!(entry.unpacked_size(), 512);
        assert_eq!(entry.clone().cached_unpacked_size(), Some(512));
    }

    #[test]
    fn test_payload_range_does_not_overflow() {
        let entry = Entry::new(String::from("x"), u32::MAX, u32::MAX, false);
        assert_eq!(entry.payload_range().end, 2 * u64::from(u32::MAX));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_entry() {
        let entry = Entry::new(String::from("a.tga"), 0x4c, 100, false);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"name":"a.tga","offset":76,"size":100,"packed":false,"unpacked_size":0}"#
        );
    }
}
