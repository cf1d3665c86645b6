#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = gnre::soap::parse_receipt(s);
        let _ = gnre::soap::parse_status(s);
        let _ = gnre::soap::parse_guide_result(s);
        let _ = gnre::soap::is_soap_fault(s);
    }
});
