/*!

A read-only decoder for the resource archives that a family of visual novel
and adventure game engines bundle their images, audio, and scripts into.

The archives carry no magic number or version field. Instead the header comes
in one of three layouts, and the right one is found by checking, for each, that
the declared entry count and record size put the end of the index exactly
where the header says the first payload starts. See [Layout] for the details.

## Features

- ✔ Detection: recognizes all three known header layouts, and hands back
  anything else untouched so another decoder can try it
- ✔ Lazy: entries are read straight from the underlying [ByteView] (memory
  or a [FileView]), with packed entries decompressed as they are streamed
- ✔ Strict: an index slot pointing outside of the archive rejects the archive
- ✔ Pluggable: bring your own [Decompressor] and name [Encoding]
- ✔ Images: TGA entries with zeroed depth fields are repaired before decoding

## Quick Start

```rust
use resarc::{Archive, Probe};
use std::io::Read;

// A layout A archive with a single unpacked entry
let mut data = vec![0u8; 8 + 0x24];
data[4..8].copy_from_slice(&1u32.to_le_bytes());
data[12..17].copy_from_slice(b"a.txt");
data[0x24..0x28].copy_from_slice(&0x2cu32.to_le_bytes());
data[0x28..0x2c].copy_from_slice(&5u32.to_le_bytes());
data.extend_from_slice(b"hello");

let Probe::Recognized(archive) = Archive::from_slice(data)? else {
    panic!("not an archive");
};

let entry = &archive.entries()[0];
assert_eq!(entry.name(), "a.txt");

let mut contents = String::new();
archive.open_entry(entry)?.read_to_string(&mut contents)?;
assert_eq!(contents, "hello");
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Hosting

Applications that dispatch over many container formats can register this one
with a [format::FormatRegistry], or implement [format::ArchiveFormat] for
their own decoders.

## Caveats

- Names are not unique, so entries are addressed by [Entry] rather than name.
- The length of a packed entry is unknown until the entry is first opened
  (see [Entry::unpacked_size]).
- Packed payloads are decompressed by the configured [Decompressor]. The
  default handles raw deflate and the `lz4` feature adds LZ4 blocks; engines
  using another scheme need their own.

*/

mod archive;
mod decompress;
mod encoding;
mod errors;
pub mod format;
pub mod imaging;
pub(crate) mod util;
mod view;

pub use self::archive::*;
pub use self::decompress::*;
pub use self::encoding::*;
pub use self::errors::*;
pub use self::imaging::{patch_header, EntryImage};
pub use self::view::{ByteView, FileView};
pub use rawzip::{RangeReader, ReaderAt};
