#![no_main]
use resarc::{Archive, Probe};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(Probe::Recognized(archive)) = Archive::from_slice(data) else {
        return;
    };

    // Every retained entry lies within the input
    for entry in archive.entries() {
        assert!(entry.payload_range().end <= data.len() as u64);
    }

    // Reading entries or images may fail but must not panic
    for entry in archive.entries() {
        if let Ok(mut reader) = archive.open_entry(entry) {
            let _ = std::io::copy(&mut reader, &mut std::io::sink());
        }
        let _ = archive.open_image(entry);
    }
});
