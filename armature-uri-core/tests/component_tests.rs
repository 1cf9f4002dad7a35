//! Integration and property tests for component encoding and decoding.

use armature_uri_core::component::{self, ComponentType};
use armature_uri_core::*;
use proptest::prelude::*;

#[test]
fn test_decode_full_path() {
    let segments = component::decode_path("/a%20b;x=1;y/c", true).unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].path(), "");
    assert_eq!(segments[1].path(), "a b");
    assert_eq!(segments[1].matrix_parameters().get_first("x"), Some("1"));
    assert_eq!(segments[1].matrix_parameters().get_first("y"), Some(""));
    assert_eq!(segments[2].path(), "c");
}

#[test]
fn test_decode_query_keeps_order() {
    let params = component::decode_query("b=2&a=1&b=3", true, true).unwrap();
    let pairs: Vec<_> = params.pairs().collect();
    assert_eq!(pairs, vec![("b", "2"), ("b", "3"), ("a", "1")]);
}

#[test]
fn test_malformed_escape_is_an_error() {
    let err = component::decode("100%", ComponentType::Path).unwrap_err();
    assert!(matches!(err, UriError::InvalidEncoding(_)));
}

#[test]
fn test_parse_components() {
    let parsed = UriParser::parse("https://user@example.com:8080/a/b?q=1#f").unwrap();

    assert_eq!(parsed.scheme.as_deref(), Some("https"));
    assert_eq!(parsed.user_info.as_deref(), Some("user"));
    assert_eq!(parsed.host.as_deref(), Some("example.com"));
    assert_eq!(parsed.port.as_deref(), Some("8080"));
    assert_eq!(parsed.path_str(), "/a/b");
    assert_eq!(parsed.query.as_deref(), Some("q=1"));
    assert_eq!(parsed.fragment.as_deref(), Some("f"));
}

// =============================================================================
// Properties
// =============================================================================

const COMPONENTS: [ComponentType; 6] = [
    ComponentType::Path,
    ComponentType::PathSegment,
    ComponentType::MatrixParam,
    ComponentType::Query,
    ComponentType::QueryParam,
    ComponentType::Fragment,
];

proptest! {
    #[test]
    fn test_encode_decode_round_trip(s in "\\PC{0,24}", index in 0usize..COMPONENTS.len()) {
        let component_type = COMPONENTS[index];
        let encoded = component::encode(&s, component_type);

        prop_assert!(!encoded.contains(' '));
        prop_assert_eq!(component::decode(&encoded, component_type).unwrap(), s);
    }

    #[test]
    fn test_contextual_encode_is_idempotent(s in "[a-z%0-9A-F /]{0,24}") {
        let once = component::contextual_encode(&s, ComponentType::Path);
        let twice = component::contextual_encode(&once, ComponentType::Path);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_builder_segment_round_trip(s in "[a-zA-Z0-9 /;=?&#:@~\u{e9}-]{1,16}") {
        let uri = UriBuilder::from_path("/base")
            .unwrap()
            .segment(&[s.as_str()])
            .unwrap()
            .build(&[])
            .unwrap();

        let segments = component::decode_path(&uri, true).unwrap();
        prop_assert_eq!(segments.len(), 3);
        prop_assert_eq!(segments[2].path(), s.as_str());
    }

    #[test]
    fn test_builder_query_round_trip(s in "[a-zA-Z0-9 /;=?&#+:@~\u{e9}-]{0,16}") {
        let uri = UriBuilder::from_path("/p")
            .unwrap()
            .query_param("k", &[s.as_str()])
            .unwrap()
            .build(&[])
            .unwrap();

        let (_, query) = uri.split_once('?').unwrap();
        let params = component::decode_query(query, true, true).unwrap();
        prop_assert_eq!(params.get_first("k"), Some(s.as_str()));
    }

    #[test]
    fn test_too_few_values_fails(count in 1usize..6) {
        let template: String = (0..count).map(|i| format!("/{{v{}}}", i)).collect();
        let builder = UriBuilder::from_path(&template).unwrap();
        let values: Vec<&str> = vec!["x"; count - 1];

        prop_assert!(matches!(builder.build(&values), Err(UriError::MissingValue(_))));
    }
}
