//! Fuzz target for URI parsing and reference resolution.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use armature_uri_core::{UriParser, UriTemplate};

#[derive(Debug, Arbitrary)]
struct FuzzReference {
    base: String,
    reference: String,
}

fuzz_target!(|input: FuzzReference| {
    if let Ok(components) = UriParser::parse(&input.base) {
        let _ = components.to_string();
    }

    let _ = UriTemplate::normalize(&input.base);
    let _ = UriTemplate::resolve(&input.base, &input.reference);
    let _ = UriTemplate::relativize(&input.base, &input.reference);
});
