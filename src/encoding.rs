use std::borrow::Cow;

/// An encoding for interpreting the fixed width entry names of an index as
/// UTF-8 text.
///
/// Names are handed over already cut at their first nul byte. Decoding never
/// fails: bytes that can't be represented are replaced, as an entry with an
/// odd name is still addressable through its [Entry](crate::Entry).
pub trait Encoding {
    /// Decodes bytes into a utf-8 compatible string -- allocating if necessary
    fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str>;
}

impl<T: Encoding + ?Sized> Encoding for &'_ T {
    fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str> {
        (**self).decode(data)
    }
}

impl<T: Encoding + ?Sized> Encoding for Box<T> {
    fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str> {
        (**self).decode(data)
    }
}

/// Decodes bytes according to the utf8 standard
///
/// ```
/// use resarc::{Utf8Encoding, Encoding};
///
/// let encoding = Utf8Encoding::new();
/// assert_eq!(encoding.decode(b"title.tga"), "title.tga");
/// assert_eq!(encoding.decode(b"J\xc3\xa5hk.ogg"), "Jåhk.ogg");
/// assert_eq!(encoding.decode(b"bad\xff.png"), "bad\u{fffd}.png");
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Utf8Encoding;

impl Utf8Encoding {
    /// Creates a new utf8 decoder
    pub fn new() -> Self {
        Utf8Encoding
    }

    /// Static method for decoding utf8 data
    pub fn decode(data: &[u8]) -> Cow<str> {
        String::from_utf8_lossy(data)
    }
}

impl Encoding for Utf8Encoding {
    fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str> {
        Utf8Encoding::decode(data)
    }
}

/// Decodes bytes according to the Shift_JIS code page.
///
/// Archives don't record how their names are encoded. Names are decoded as
/// UTF-8 unless an archive is opened with this encoding (see
/// [ArchiveBuilder::encoding](crate::ArchiveBuilder::encoding)).
///
/// ```
/// use resarc::{ShiftJisEncoding, Encoding};
///
/// let encoding = ShiftJisEncoding::new();
/// assert_eq!(encoding.decode(b"bg01.tga"), "bg01.tga");
/// assert_eq!(encoding.decode(b"\x83\x41\x83\x43.ogg"), "アイ.ogg");
/// ```
#[cfg(feature = "shift-jis")]
#[derive(Debug, Default, Copy, Clone)]
pub struct ShiftJisEncoding;

#[cfg(feature = "shift-jis")]
impl ShiftJisEncoding {
    /// Creates a new Shift_JIS decoder
    pub fn new() -> Self {
        ShiftJisEncoding
    }

    /// Static method for decoding Shift_JIS data
    pub fn decode(data: &[u8]) -> Cow<str> {
        let (name, _) = encoding_rs::SHIFT_JIS.decode_without_bom_handling(data);
        name
    }
}

#[cfg(feature = "shift-jis")]
impl Encoding for ShiftJisEncoding {
    fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str> {
        ShiftJisEncoding::decode(data)
    }
}
