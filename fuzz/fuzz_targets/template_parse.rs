//! Fuzz target for URI template compilation and matching.
//!
//! Compiles arbitrary templates and matches arbitrary URIs against the ones
//! that compile, checking that neither panics.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use armature_uri_core::UriTemplate;
use std::collections::HashMap;

#[derive(Debug, Arbitrary)]
struct FuzzTemplate {
    template: String,
    uris: Vec<String>,
}

fuzz_target!(|input: FuzzTemplate| {
    let Ok(template) = UriTemplate::new(&input.template) else {
        return;
    };

    for uri in input.uris.iter().take(16) {
        if let Some(values) = template.match_map(uri) {
            for name in values.keys() {
                assert!(template.is_template_variable_present(name));
            }
        }
        let _ = template.match_values(uri);
    }

    let values: HashMap<String, String> = template
        .template_variables()
        .iter()
        .map(|name| (name.clone(), "x".to_string()))
        .collect();
    let _ = template.create_uri(&values);
});
