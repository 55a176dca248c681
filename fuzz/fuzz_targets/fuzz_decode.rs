#![no_main]
use guide_rs::{ArchBits, Guide};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for arch in [ArchBits::Bits32, ArchBits::Bits64] {
        // Anything that decodes must encode again and decode to the same size.
        if let Ok(guide) = Guide::decode(data, arch) {
            let bytes = guide.encode(arch).expect("decoded guide re-encodes");
            let again = Guide::decode(&bytes, arch).expect("re-encoded guide decodes");
            assert_eq!(again.len(), guide.len());
        }
    }
});
