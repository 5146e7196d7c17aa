#![no_main]
use board_core::mac;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let id = mac::encode(Some(data));
    if id.is_available() {
        // Anything that encodes must render back to an address the codec accepts.
        let rendered = mac::to_mac_string(id);
        assert_eq!(mac::encode(Some(&rendered)), id);
    }
});
