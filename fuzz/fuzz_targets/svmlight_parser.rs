#![no_main]

use drifteval::dataset::{find_date, find_identifier, parse_svmlight};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must reject bad input with an error, never panic
        if let Ok(parsed) = parse_svmlight(input, None) {
            assert_eq!(parsed.features.n_rows(), parsed.labels.len());
        }
        let _ = parse_svmlight(input, Some(8));
        for line in input.lines() {
            let _ = find_date(line);
            let _ = find_identifier(line);
        }
    }
});
