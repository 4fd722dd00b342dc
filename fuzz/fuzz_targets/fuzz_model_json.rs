#![no_main]

use libfuzzer_sys::fuzz_target;
use wavshape_cli::config::{EqConfig, ModelConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(model) = serde_json::from_slice::<ModelConfig>(data) {
        let _ = model.param_count();
        if model.frame_length <= 1 << 16 {
            let _ = model.build(48000, model.frame_length, Some(0.5));
        }
    }
    let _ = serde_json::from_slice::<EqConfig>(data);
});
