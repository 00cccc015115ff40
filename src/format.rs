//! Plug archive decoders into a host's format dispatch.
//!
//! A host holding bytes of unknown type offers them to each registered
//! [ArchiveFormat] in turn. A format either recognizes the data and returns a
//! [Directory], or hands the bytes back untouched for the next format.

use crate::{
    Archive, ArchiveBuilder, ArchiveError, ByteView, Encoding, Entry, EntryImage, Probe,
    Utf8Encoding,
};
use rawzip::ReaderAt;
use std::{fmt, io, io::Read};

/// A type erased view that can be passed between formats and threads
pub struct DynView(Box<dyn ByteView + Send + Sync>);

impl DynView {
    /// Erase the type of a view
    pub fn new<V>(view: V) -> Self
    where
        V: ByteView + Send + Sync + 'static,
    {
        DynView(Box::new(view))
    }
}

impl ReaderAt for DynView {
    #[inline]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.0.read_at(buf, offset)
    }
}

impl ByteView for DynView {
    #[inline]
    fn size(&self) -> io::Result<u64> {
        self.0.size()
    }
}

impl fmt::Debug for DynView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynView")
            .field("size", &self.size().ok())
            .finish()
    }
}

/// The capabilities a host needs from an opened archive
pub trait Directory: Send + Sync {
    /// Every entry in index order
    fn entries(&self) -> &[Entry];

    /// Returns a reader over an entry's contents
    fn open_entry(&self, entry: &Entry) -> Result<Box<dyn Read + '_>, ArchiveError>;

    /// Returns a decoder for an image entry
    fn open_image(&self, entry: &Entry) -> Result<EntryImage, ArchiveError>;
}

impl<V> Directory for Archive<V>
where
    V: ByteView + Send + Sync,
{
    fn entries(&self) -> &[Entry] {
        Archive::entries(self)
    }

    fn open_entry(&self, entry: &Entry) -> Result<Box<dyn Read + '_>, ArchiveError> {
        let reader = Archive::open_entry(self, entry)?;
        Ok(Box::new(reader))
    }

    fn open_image(&self, entry: &Entry) -> Result<EntryImage, ArchiveError> {
        Archive::open_image(self, entry)
    }
}

/// A decoder that can be registered with a [FormatRegistry]
pub trait ArchiveFormat: Send + Sync {
    /// Short identifier of the format
    fn name(&self) -> &'static str;

    /// Decode the view if it is in this format, otherwise hand it back
    fn try_open(&self, view: DynView) -> Result<Probe<Box<dyn Directory>, DynView>, ArchiveError>;
}

/// This crate's archive family as a registrable format
#[derive(Clone)]
pub struct ResourceArchiveFormat<E = Utf8Encoding> {
    builder: ArchiveBuilder<E>,
}

impl Default for ResourceArchiveFormat {
    fn default() -> Self {
        ResourceArchiveFormat {
            builder: ArchiveBuilder::default(),
        }
    }
}

impl<E> ResourceArchiveFormat<E> {
    /// Register with a customized configuration
    pub fn with_builder(builder: ArchiveBuilder<E>) -> Self {
        ResourceArchiveFormat { builder }
    }
}

impl<E> ArchiveFormat for ResourceArchiveFormat<E>
where
    E: Encoding + Send + Sync,
{
    fn name(&self) -> &'static str {
        "resarc"
    }

    fn try_open(&self, view: DynView) -> Result<Probe<Box<dyn Directory>, DynView>, ArchiveError> {
        let probe = self.builder.open(view)?;
        Ok(probe.map(|archive| Box::new(archive) as Box<dyn Directory>))
    }
}

/// An archive recognized by one of the registered formats
pub struct OpenedArchive {
    /// Name of the format that recognized the data
    pub format: &'static str,

    /// The decoded directory
    pub directory: Box<dyn Directory>,
}

impl fmt::Debug for OpenedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedArchive")
            .field("format", &self.format)
            .field("entries", &self.directory.entries().len())
            .finish()
    }
}

/// Ordered collection of formats tried against unknown data.
///
/// ```
/// use resarc::format::{DynView, FormatRegistry};
/// use std::io::Cursor;
///
/// let registry = FormatRegistry::default();
/// assert_eq!(registry.names().collect::<Vec<_>>(), vec!["resarc"]);
///
/// let probe = registry.open(DynView::new(Cursor::new(vec![0u8; 3]))).unwrap();
/// assert!(!probe.is_recognized());
/// ```
pub struct FormatRegistry {
    formats: Vec<Box<dyn ArchiveFormat>>,
}

impl Default for FormatRegistry {
    /// A registry holding [ResourceArchiveFormat] with its default configuration
    fn default() -> Self {
        let mut registry = FormatRegistry::empty();
        registry.register(ResourceArchiveFormat::default());
        registry
    }
}

impl FormatRegistry {
    /// A registry with no formats
    pub fn empty() -> Self {
        FormatRegistry {
            formats: Vec::new(),
        }
    }

    /// Append a format, tried after every format registered before it
    pub fn register<F>(&mut self, format: F) -> &mut Self
    where
        F: ArchiveFormat + 'static,
    {
        self.formats.push(Box::new(format));
        self
    }

    /// Names of the registered formats in the order they are tried
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.formats.iter().map(|x| x.name())
    }

    /// Offer the view to each format in turn.
    ///
    /// The first format to recognize the data wins. A format that fails with
    /// an error stops the search, as the data claimed to be in that format.
    pub fn open(&self, view: DynView) -> Result<Probe<OpenedArchive, DynView>, ArchiveError> {
        let mut view = view;
        for format in &self.formats {
            match format.try_open(view)? {
                Probe::Recognized(directory) => {
                    return Ok(Probe::Recognized(OpenedArchive {
                        format: format.name(),
                        directory,
                    }))
                }
                Probe::Unrecognized(v) => {
                    log::trace!("format {} did not recognize data", format.name());
                    view = v;
                }
            }
        }

        Ok(Probe::Unrecognized(view))
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
