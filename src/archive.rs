//! Open resource archives and read their entries.
//!
//! An archive is a header, an index of fixed size records, and the payloads
//! the records point at. Three header layouts exist and none of them carries
//! a version tag, so opening an archive means trying each [Layout] in turn
//! until one is self-consistent:
//!
//! ```text
//! Archive::open(view)
//! ├── probe: Layout::A → Layout::B → Layout::C, first to hold wins
//! │   └── none hold → Probe::Unrecognized(view)
//! ├── decode_index: records → Vec<Entry> (empty slots dropped)
//! └── Probe::Recognized(Archive)
//!     ├── open_entry(entry) → EntryReader (raw window or decompressed)
//!     ├── read_entry(entry) → Vec<u8>
//!     └── open_image(entry) → EntryImage
//! ```

mod entry;
mod index;
mod layout;
mod reader;

pub use entry::Entry;
pub use index::decode_index;
pub use layout::*;
pub use reader::{EntryReader, PACKED_FRAME_LEN};

use crate::{
    decompress::default_decompressor,
    imaging::{resolve_image, EntryImage},
    ArchiveError, ByteView, Decompressor, Encoding, FileView, Utf8Encoding,
};
use std::{fmt, fs::File, io::Cursor, sync::Arc};

/// Image entries whose header may need repair are recognized by this suffix
pub const DEFAULT_IMAGE_SUFFIX: &str = ".tga";

/// Outcome of offering data to a decoder.
///
/// Data that isn't an archive of the expected family is handed back so the
/// caller can offer it to another decoder.
#[derive(Debug)]
pub enum Probe<A, V> {
    /// The data was recognized and decoded
    Recognized(A),

    /// None of the known layouts hold for this data
    Unrecognized(V),
}

impl<A, V> Probe<A, V> {
    /// Returns the decoded value if recognized
    pub fn recognized(self) -> Option<A> {
        match self {
            Probe::Recognized(x) => Some(x),
            Probe::Unrecognized(_) => None,
        }
    }

    /// Returns true if the data was recognized
    pub fn is_recognized(&self) -> bool {
        matches!(self, Probe::Recognized(_))
    }

    /// Transform the recognized value
    pub fn map<B, F>(self, f: F) -> Probe<B, V>
    where
        F: FnOnce(A) -> B,
    {
        match self {
            Probe::Recognized(x) => Probe::Recognized(f(x)),
            Probe::Unrecognized(v) => Probe::Unrecognized(v),
        }
    }
}

/// Configures how archives are opened.
///
/// ```
/// use resarc::{Archive, Stored, Utf8Encoding};
///
/// let builder = Archive::builder()
///     .max_entries(50_000)
///     .encoding(Utf8Encoding::new())
///     .decompressor(Stored)
///     .image_suffix(".tga");
/// assert!(!builder.open_slice(vec![0u8; 4]).unwrap().is_recognized());
/// ```
#[derive(Clone)]
pub struct ArchiveBuilder<E> {
    max_entries: u32,
    encoding: E,
    decompressor: Arc<dyn Decompressor + Send + Sync>,
    image_suffix: String,
}

impl Default for ArchiveBuilder<Utf8Encoding> {
    fn default() -> Self {
        ArchiveBuilder {
            max_entries: DEFAULT_MAX_ENTRIES,
            encoding: Utf8Encoding::new(),
            decompressor: default_decompressor(),
            image_suffix: String::from(DEFAULT_IMAGE_SUFFIX),
        }
    }
}

impl<E> ArchiveBuilder<E>
where
    E: Encoding,
{
    /// Upper bound on the entry count a header may declare before the layout
    /// is considered a misreading. Defaults to [DEFAULT_MAX_ENTRIES].
    pub fn max_entries(mut self, max_entries: u32) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// How entry names are decoded. Defaults to lossy UTF-8, as archives
    /// don't record the encoding of their names.
    pub fn encoding<E2: Encoding>(self, encoding: E2) -> ArchiveBuilder<E2> {
        ArchiveBuilder {
            max_entries: self.max_entries,
            encoding,
            decompressor: self.decompressor,
            image_suffix: self.image_suffix,
        }
    }

    /// The transform applied to packed payloads
    pub fn decompressor<D>(mut self, decompressor: D) -> Self
    where
        D: Decompressor + Send + Sync + 'static,
    {
        self.decompressor = Arc::new(decompressor);
        self
    }

    /// Entries whose name ends with this suffix (ignoring ascii case) get
    /// their image header repaired. Defaults to [DEFAULT_IMAGE_SUFFIX].
    pub fn image_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.image_suffix = suffix.into();
        self
    }

    /// Probe the view and decode its index
    pub fn open<V: ByteView>(&self, view: V) -> Result<Probe<Archive<V>, V>, ArchiveError> {
        let size = view.size()?;
        let Some((layout, count)) = probe(&view, self.max_entries)? else {
            return Ok(Probe::Unrecognized(view));
        };

        let entries = decode_index(&view, layout, count, &self.encoding)?;
        log::debug!(
            "decoded {} entries from {} index slots",
            entries.len(),
            count
        );

        Ok(Probe::Recognized(Archive {
            view,
            layout,
            entries,
            size,
            decompressor: Arc::clone(&self.decompressor),
            image_suffix: self.image_suffix.clone(),
        }))
    }

    /// Open an archive held in memory. Unrecognized data is handed back as
    /// it was given.
    pub fn open_slice<R>(&self, data: R) -> Result<Probe<Archive<Cursor<R>>, R>, ArchiveError>
    where
        R: AsRef<[u8]>,
    {
        match self.open(Cursor::new(data))? {
            Probe::Recognized(archive) => Ok(Probe::Recognized(archive)),
            Probe::Unrecognized(cursor) => Ok(Probe::Unrecognized(cursor.into_inner())),
        }
    }

    /// Open an archive from a file handle
    pub fn open_file(&self, file: File) -> Result<Probe<Archive<FileView>, FileView>, ArchiveError> {
        self.open(FileView::new(file)?)
    }
}

/// A decoded archive directory over its underlying bytes.
///
/// The directory is fixed once opened. Entries are listed in index order and
/// may share names.
pub struct Archive<V> {
    view: V,
    layout: Layout,
    entries: Vec<Entry>,
    size: u64,
    decompressor: Arc<dyn Decompressor + Send + Sync>,
    image_suffix: String,
}

impl Archive<()> {
    /// Open with the default configuration
    pub fn open<V: ByteView>(view: V) -> Result<Probe<Archive<V>, V>, ArchiveError> {
        ArchiveBuilder::default().open(view)
    }

    /// Open an in-memory archive with the default configuration
    pub fn from_slice<R>(data: R) -> Result<Probe<Archive<Cursor<R>>, R>, ArchiveError>
    where
        R: AsRef<[u8]>,
    {
        ArchiveBuilder::default().open_slice(data)
    }

    /// Open an archive file with the default configuration
    pub fn from_file(file: File) -> Result<Probe<Archive<FileView>, FileView>, ArchiveError> {
        ArchiveBuilder::default().open_file(file)
    }

    /// Customize how archives are opened
    pub fn builder() -> ArchiveBuilder<Utf8Encoding> {
        ArchiveBuilder::default()
    }
}

impl<V> Archive<V> {
    /// The layout the header was resolved to
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Every entry in index order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at a given position in index order
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Every entry with the given name, in index order
    pub fn entries_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |x| x.name() == name)
    }

    /// Total length in bytes of the archive
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns a reference to the underlying view
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Consume the archive and return the underlying view
    pub fn into_inner(self) -> V {
        self.view
    }
}

impl<V: ByteView> Archive<V> {
    /// Returns a reader over an entry's contents, decompressing packed
    /// entries.
    pub fn open_entry(&self, entry: &Entry) -> Result<EntryReader<'_, V>, ArchiveError> {
        reader::open_entry(&self.view, entry, &self.decompressor)
    }

    /// Read an entry's contents into memory
    pub fn read_entry(&self, entry: &Entry) -> Result<Vec<u8>, ArchiveError> {
        let reader = self.open_entry(entry)?;
        reader::read_entry(reader, entry)
    }

    /// Returns a decoder for an image entry
    pub fn open_image(&self, entry: &Entry) -> Result<EntryImage, ArchiveError> {
        let data = self.read_entry(entry)?;
        resolve_image(entry.name(), data, &self.image_suffix)
    }
}

impl<V> fmt::Debug for Archive<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("layout", &self.layout.kind())
            .field("size", &self.size)
            .field("entries", &self.entries)
            .finish()
    }
}
