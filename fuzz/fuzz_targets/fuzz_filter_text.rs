#![no_main]

use bulkapi_core::query::{compile, FilterNode, QueryOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (ignore invalid UTF-8)
    if let Ok(text) = std::str::from_utf8(data) {
        // Limit document size to prevent timeout
        if text.len() > 10_000 {
            return;
        }

        // Parsing and compiling must never panic
        if let Ok(filter) = FilterNode::from_text(text) {
            let canonical = filter.canonical();
            assert_eq!(canonical, filter);
            let _ = compile(&QueryOptions::new().with_filter(filter));
        }
    }
});
