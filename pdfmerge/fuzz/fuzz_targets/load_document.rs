#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfmerge::{Codec, LoadOptions, LopdfCodec};

fuzz_target!(|data: &[u8]| {
    let codec = LopdfCodec::new();

    for options in [LoadOptions::strict(), LoadOptions::tolerant()] {
        let Ok(mut source) = codec.load(data, options) else {
            continue;
        };

        // Whatever loads must survive being copied into a fresh output.
        let mut output = codec.create_empty().unwrap();
        let indices = codec.page_indices(&source);
        if let Ok(copied) = codec.copy_pages(&mut source, &indices, &mut output) {
            assert_eq!(copied, indices.len());
            let _ = codec.serialize(&mut output);
        }
    }
});
