#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs.
    if let Ok(nota) = gnre::nfe::extract_nfe(data) {
        let _ = gnre::evaluate(&nota, None);
    }
});
