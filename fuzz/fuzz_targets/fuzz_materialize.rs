#![no_main]

use bulkapi_core::query::{FieldSpec, Materializer, Page};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }

    // First line is a field spec document, the rest a page body
    let split = data.iter().position(|b| *b == b'\n').unwrap_or(data.len());
    let (spec, body) = data.split_at(split);

    let spec = std::str::from_utf8(spec)
        .ok()
        .and_then(|text| text.parse::<FieldSpec>().ok());

    if let Ok(page) = Page::from_slice(body) {
        let table = Materializer::new()
            .with_file_fields(["file"])
            .materialize(&page.results, spec.as_ref());
        assert_eq!(table.len(), page.results.len());
        if let Some(ref spec) = spec {
            assert_eq!(table.columns().len(), spec.len());
        }
    }
});
