#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use wavshape_audio::WavStreamReader;

fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = WavStreamReader::open(Cursor::new(data)) else {
        return;
    };
    let _ = reader.chunks();
    let _ = reader.frames_per_channel();

    // decode when the format allows it, raw bytes otherwise
    while !reader.is_exhausted() {
        let decoded = reader.read_block(64).map(|block| block.valid_frames());
        match decoded {
            Ok(frames) => assert!(frames <= 64),
            Err(_) => {
                if reader.read_raw(64).is_err() {
                    break;
                }
            }
        }
    }
});
