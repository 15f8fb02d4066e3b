#![no_main]

use gitstream_core::{CommitStream, ParseOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The first byte picks the caps so small limits get exercised too.
    let (options, log) = match data.split_first() {
        Some((&selector, rest)) => (
            ParseOptions::unlimited()
                .with_max_files(usize::from(selector & 0x0f))
                .with_max_bytes(usize::from(selector) * 4),
            rest,
        ),
        None => (ParseOptions::unlimited(), data),
    };

    let max_files = options.max_files_per_commit;
    let max_bytes = options.max_bytes_per_file;
    for commit in CommitStream::new(log, options).flatten() {
        if let Some(cap) = max_files {
            assert!(commit.files.len() <= cap);
        }
        for file in &commit.files {
            if let Some(cap) = max_bytes {
                assert!(file.content.len() <= cap);
            }
        }
    }
});
