//! Fuzz target for UriBuilder.
//!
//! Applies arbitrary sequences of builder operations and builds the result,
//! checking that errors are returned rather than panics.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use armature_uri_core::UriBuilder;
use std::collections::HashMap;

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    Uri(String),
    Scheme(Option<String>),
    SchemeSpecificPart(String),
    UserInfo(Option<String>),
    Host(Option<String>),
    Port(i32),
    ReplacePath(Option<String>),
    Path(String),
    Segment(Vec<String>),
    ReplaceMatrix(Option<String>),
    MatrixParam(String, Vec<String>),
    ReplaceMatrixParam(String, Option<Vec<String>>),
    ReplaceQuery(Option<String>),
    QueryParam(String, Vec<String>),
    ReplaceQueryParam(String, Option<Vec<String>>),
    Fragment(Option<String>),
    Resolve(String, String),
}

#[derive(Debug, Arbitrary)]
struct FuzzBuilder {
    ops: Vec<FuzzOp>,
    values: Vec<String>,
}

fn refs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

fn apply(builder: UriBuilder, op: &FuzzOp) -> Option<UriBuilder> {
    let result = match op {
        FuzzOp::Uri(uri) => builder.uri(uri),
        FuzzOp::Scheme(scheme) => builder.scheme(scheme.as_deref()),
        FuzzOp::SchemeSpecificPart(ssp) => builder.scheme_specific_part(ssp),
        FuzzOp::UserInfo(user_info) => builder.user_info(user_info.as_deref()),
        FuzzOp::Host(host) => builder.host(host.as_deref()),
        FuzzOp::Port(port) => builder.port(*port),
        FuzzOp::ReplacePath(path) => builder.replace_path(path.as_deref()),
        FuzzOp::Path(path) => builder.path(path),
        FuzzOp::Segment(segments) => builder.segment(&refs(segments)),
        FuzzOp::ReplaceMatrix(matrix) => builder.replace_matrix(matrix.as_deref()),
        FuzzOp::MatrixParam(name, values) => builder.matrix_param(name, &refs(values)),
        FuzzOp::ReplaceMatrixParam(name, values) => {
            let values = values.as_deref().map(refs);
            builder.replace_matrix_param(name, values.as_deref())
        }
        FuzzOp::ReplaceQuery(query) => builder.replace_query(query.as_deref()),
        FuzzOp::QueryParam(name, values) => builder.query_param(name, &refs(values)),
        FuzzOp::ReplaceQueryParam(name, values) => {
            let values = values.as_deref().map(refs);
            builder.replace_query_param(name, values.as_deref())
        }
        FuzzOp::Fragment(fragment) => Ok(builder.fragment(fragment.as_deref())),
        FuzzOp::Resolve(name, value) => builder.resolve_template(name, value),
    };
    result.ok()
}

fuzz_target!(|input: FuzzBuilder| {
    let mut builder = UriBuilder::new();
    for op in input.ops.iter().take(32) {
        if let Some(next) = apply(builder.clone(), op) {
            builder = next;
        }
    }

    let _ = builder.to_template();
    let _ = builder.build(&refs(&input.values));

    let values: HashMap<&str, &str> = input
        .values
        .iter()
        .map(|v| (v.as_str(), v.as_str()))
        .collect();
    let _ = builder.build_from_map(&values);
    let _ = builder.build_from_encoded(&refs(&input.values));
});
