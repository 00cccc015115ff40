//! Decoding of image entries.
//!
//! Some producers of these archives write truecolor TGA images whose header
//! leaves the pixel depth and the alpha channel depth at zero, which no TGA
//! reader accepts. Entries carrying the configured image suffix get their
//! header repaired before decoding. Everything else, and any entry the
//! repaired header doesn't help, goes through ordinary format detection.

use crate::{util::ends_with_ignore_ascii_case, ArchiveError};
use image::{
    codecs::tga::TgaDecoder, ColorType, DynamicImage, ImageDecoder, ImageError, ImageFormat,
    ImageReader, ImageResult,
};
use std::io::{self, Cursor};

/// Length of a TGA file header
pub const TGA_HEADER_LEN: usize = 18;

const DEPTH: usize = 16;
const DESCRIPTOR: usize = 17;

/// Fill in the pixel depth and alpha depth of a truecolor TGA header when a
/// producer left them zeroed. A zero pixel depth means 32 bits, and a 32 bit
/// image without alpha bits has an 8 bit alpha channel. Returns whether the
/// header changed.
///
/// ```
/// use resarc::imaging::patch_header;
///
/// let mut header = [0u8; 18];
/// header[2] = 2;
/// assert!(patch_header(&mut header));
/// assert_eq!(header[16], 32);
/// assert_eq!(header[17] & 0x0f, 8);
///
/// let mut header = [0u8; 18];
/// header[16] = 24;
/// assert!(!patch_header(&mut header));
/// assert_eq!(header[16], 24);
/// ```
pub fn patch_header(header: &mut [u8; TGA_HEADER_LEN]) -> bool {
    let mut changed = false;
    if header[DEPTH] == 0 {
        header[DEPTH] = 32;
        changed = true;
    }

    if header[DEPTH] == 32 && header[DESCRIPTOR] & 0x0f == 0 {
        header[DESCRIPTOR] = (header[DESCRIPTOR] & 0xf0) | 8;
        changed = true;
    }

    changed
}

/// A decoder for an image entry
pub struct EntryImage {
    decoder: Box<dyn ImageDecoder>,
    patched: bool,
}

impl EntryImage {
    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.decoder.dimensions()
    }

    /// Pixel format the image decodes into
    pub fn color_type(&self) -> ColorType {
        self.decoder.color_type()
    }

    /// Whether the stored header had to be repaired
    pub fn was_patched(&self) -> bool {
        self.patched
    }

    /// Hand over the underlying decoder
    pub fn into_decoder(self) -> Box<dyn ImageDecoder> {
        self.decoder
    }

    /// Decode the pixels
    pub fn decode(self) -> Result<DynamicImage, ArchiveError> {
        Ok(DynamicImage::from_decoder(self.decoder)?)
    }
}

impl std::fmt::Debug for EntryImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryImage")
            .field("dimensions", &self.dimensions())
            .field("color_type", &self.color_type())
            .field("patched", &self.patched)
            .finish()
    }
}

/// Pick a decoder for an entry's bytes, repairing the header first when the
/// name ends with `suffix`.
pub(crate) fn resolve_image(
    name: &str,
    data: Vec<u8>,
    suffix: &str,
) -> Result<EntryImage, ArchiveError> {
    if ends_with_ignore_ascii_case(name, suffix) {
        match patched_tga(&data) {
            Ok(image) => return Ok(image),
            Err(e) => log::debug!("{}: header patch not usable, detecting format: {}", name, e),
        }
    }

    detect(name, data)
}

fn patched_tga(data: &[u8]) -> ImageResult<EntryImage> {
    let mut header = *data
        .first_chunk::<TGA_HEADER_LEN>()
        .ok_or_else(|| ImageError::IoError(io::Error::from(io::ErrorKind::UnexpectedEof)))?;
    let patched = patch_header(&mut header);

    let mut buf = Vec::with_capacity(data.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(&data[TGA_HEADER_LEN..]);

    let decoder = TgaDecoder::new(Cursor::new(buf))?;
    Ok(EntryImage {
        decoder: Box::new(decoder),
        patched,
    })
}

fn detect(name: &str, data: Vec<u8>) -> Result<EntryImage, ArchiveError> {
    let mut reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    if reader.format().is_none() {
        // formats without a signature, like tga, can only be told by name
        if let Ok(format) = ImageFormat::from_path(name) {
            reader.set_format(format);
        }
    }

    let decoder = reader.into_decoder()?;
    Ok(EntryImage {
        decoder: Box::new(decoder),
        patched: false,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ArchiveErrorKind;
    use rstest::*;

    /// A 2x1 uncompressed truecolor tga with the depth fields zeroed
    pub(crate) fn zeroed_tga() -> Vec<u8> {
        let mut data = vec![0u8; TGA_HEADER_LEN];
        data[2] = 2;
        data[12] = 2;
        data[14] = 1;
        data.extend_from_slice(&[0x10, 0x20, 0x30, 0xff, 0x40, 0x50, 0x60, 0x80]);
        data
    }

    #[rstest]
    #[case(0, 0x00, true, 32, 0x08)]
    #[case(0, 0x20, true, 32, 0x28)]
    #[case(32, 0x00, true, 32, 0x08)]
    #[case(32, 0x08, false, 32, 0x08)]
    #[case(24, 0x00, false, 24, 0x00)]
    #[case(16, 0x01, false, 16, 0x01)]
    fn test_patch_header(
        #[case] depth: u8,
        #[case] descriptor: u8,
        #[case] changed: bool,
        #[case] expected_depth: u8,
        #[case] expected_descriptor: u8,
    ) {
        let mut header = [0u8; TGA_HEADER_LEN];
        header[DEPTH] = depth;
        header[DESCRIPTOR] = descriptor;
        assert_eq!(patch_header(&mut header), changed);
        assert_eq!(header[DEPTH], expected_depth);
        assert_eq!(header[DESCRIPTOR], expected_descriptor);
    }

    #[test]
    fn test_zeroed_tga_is_patched() {
        let image = resolve_image("a.tga", zeroed_tga(), ".tga").unwrap();
        assert!(image.was_patched());
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.color_type(), ColorType::Rgba8);

        let pixels = image.decode().unwrap().to_rgba8();
        assert_eq!(pixels.get_pixel(0, 0).0, [0x30, 0x20, 0x10, 0xff]);
    }

    #[test]
    fn test_other_suffix_not_patched() {
        // without the patch the zeroed header is unreadable even with a hint
        let err = resolve_image("a.dat", zeroed_tga(), ".tga").unwrap_err();
        assert!(matches!(err.kind(), ArchiveErrorKind::Image(_)));
    }

    #[test]
    fn test_png_detected() {
        let mut png = Cursor::new(Vec::new());
        image::RgbaImage::new(3, 2)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        let image = resolve_image("face.png", png.into_inner(), ".tga").unwrap();
        assert!(!image.was_patched());
        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn test_png_with_image_suffix_falls_back() {
        let mut png = Cursor::new(Vec::new());
        image::RgbaImage::new(1, 1)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        let image = resolve_image("mislabeled.tga", png.into_inner(), ".tga").unwrap();
        assert!(!image.was_patched());
        assert_eq!(image.dimensions(), (1, 1));
    }

    #[test]
    fn test_short_tga_falls_back() {
        let err = resolve_image("stub.tga", vec![0u8; 5], ".tga").unwrap_err();
        assert!(matches!(err.kind(), ArchiveErrorKind::Image(_)));
    }
}
