//! Integration tests for UriBuilder.

use armature_uri_core::*;
use std::collections::HashMap;

// =============================================================================
// Assembly
// =============================================================================

#[test]
fn test_build_from_parts() {
    let uri = UriBuilder::new()
        .scheme(Some("https"))
        .unwrap()
        .host(Some("api.example.com"))
        .unwrap()
        .port(8443)
        .unwrap()
        .path("v1")
        .unwrap()
        .segment(&["users", "{id}"])
        .unwrap()
        .query_param("fields", &["name", "email"])
        .unwrap()
        .fragment(Some("top"))
        .build(&["42"])
        .unwrap();

    assert_eq!(
        uri,
        "https://api.example.com:8443/v1/users/42?fields=name&fields=email#top"
    );
}

#[test]
fn test_values_are_encoded_per_component() {
    let uri = UriBuilder::from_uri("http://localhost/{segment}")
        .unwrap()
        .query_param("q", &["{query}"])
        .unwrap()
        .build(&["a b/c", "x&y z"])
        .unwrap();

    assert_eq!(uri, "http://localhost/a%20b%2Fc?q=x%26y+z");
}

#[test]
fn test_build_from_map() {
    let builder = UriBuilder::from_uri("http://{host}/{path: .+}").unwrap();
    let values = HashMap::from([("host", "example.com"), ("path", "a/b")]);

    assert_eq!(
        builder.build_from_map_with(&values, false).unwrap(),
        "http://example.com/a/b"
    );
    assert_eq!(
        builder.build_from_map(&values).unwrap(),
        "http://example.com/a%2Fb"
    );
}

#[test]
fn test_missing_values_are_reported() {
    let builder = UriBuilder::from_path("/{a}/{b}").unwrap();

    let err = builder.build(&["x"]).unwrap_err();
    assert!(matches!(err, UriError::MissingValue(ref name) if name == "b"));
    assert_eq!(err.to_string(), "The template variable, b, has no value");

    let values = HashMap::from([("a", "x")]);
    assert!(builder.build_from_map(&values).is_err());
}

#[test]
fn test_missing_values_in_query_list_are_reported() {
    let builder = UriBuilder::from_path("/search{?q,page}").unwrap();

    let err = builder.build(&["x"]).unwrap_err();
    assert!(matches!(err, UriError::MissingValue(ref name) if name == "page"));
    assert!(matches!(builder.build(&[]), Err(UriError::MissingValue(ref name)) if name == "q"));

    let values = HashMap::from([("q", "x")]);
    assert!(builder.build_from_map(&values).is_err());

    assert_eq!(builder.build(&["x", "2"]).unwrap(), "/search?q=x&page=2");
}

#[test]
fn test_missing_values_in_matrix_list_are_reported() {
    let builder = UriBuilder::from_path("/cars{;color,year}").unwrap();
    assert!(matches!(builder.build(&["red"]), Err(UriError::MissingValue(ref name)) if name == "year"));
    assert_eq!(builder.build(&["red", "2024"]).unwrap(), "/cars;color=red;year=2024");
}

#[test]
fn test_relative_path_after_scheme_gets_leading_slash() {
    let builder = UriBuilder::new().scheme(Some("s")).unwrap().path("a").unwrap();
    assert_eq!(builder.to_template(), "s:/a");
    assert_eq!(builder.build(&[]).unwrap(), "s:/a");

    let builder = UriBuilder::new().scheme(Some("s")).unwrap().path("{x}").unwrap();
    assert_eq!(builder.to_template(), "s:/{x}");
    assert_eq!(builder.build(&["v"]).unwrap(), "s:/v");
}

// =============================================================================
// Modification
// =============================================================================

#[test]
fn test_modify_existing_uri() {
    let uri = UriBuilder::from_uri("http://user@host:80/a/b?x=1&y=2#frag")
        .unwrap()
        .replace_query_param("x", Some(&["3"]))
        .unwrap()
        .replace_query_param("y", None)
        .unwrap()
        .replace_path(Some("/c"))
        .unwrap()
        .fragment(None)
        .build(&[])
        .unwrap();

    assert_eq!(uri, "http://user@host:80/c?x=3");
}

#[test]
fn test_partial_resolution_then_build() {
    let builder = UriBuilder::from_uri("http://localhost/{tenant}/items/{item}")
        .unwrap()
        .resolve_template("tenant", "acme corp")
        .unwrap();

    assert_eq!(builder.to_template(), "http://localhost/acme%20corp/items/{item}");
    assert_eq!(
        builder.build(&["7"]).unwrap(),
        "http://localhost/acme%20corp/items/7"
    );
}

#[test]
fn test_resolved_values_are_not_overridden_by_build() {
    let builder = UriBuilder::from_path("/{a}/{b}")
        .unwrap()
        .resolve_template("a", "x")
        .unwrap();

    assert_eq!(builder.build(&["y"]).unwrap(), "/x/y");

    let values = HashMap::from([("a", "z"), ("b", "y")]);
    assert_eq!(builder.build_from_map(&values).unwrap(), "/x/y");
}

#[test]
fn test_branching_with_clone() {
    let base = UriBuilder::from_uri("http://localhost/api").unwrap();
    let users = base.clone().path("users").unwrap();
    let orders = base.clone().path("orders").unwrap();

    assert_eq!(users.build(&[]).unwrap(), "http://localhost/api/users");
    assert_eq!(orders.build(&[]).unwrap(), "http://localhost/api/orders");
    assert_eq!(base.build(&[]).unwrap(), "http://localhost/api");
}

#[test]
fn test_opaque_uri_rejects_path_changes() {
    let builder = UriBuilder::from_uri("mailto:someone@example.com").unwrap();
    assert_eq!(builder.build(&[]).unwrap(), "mailto:someone@example.com");
    assert!(matches!(
        builder.clone().path("x"),
        Err(UriError::IllegalState(_))
    ));
}

#[test]
fn test_matrix_parameters() {
    let uri = UriBuilder::from_path("/cars")
        .unwrap()
        .matrix_param("color", &["red"])
        .unwrap()
        .matrix_param("year", &["2024"])
        .unwrap()
        .replace_matrix_param("color", Some(&["blue"]))
        .unwrap()
        .build(&[])
        .unwrap();

    assert_eq!(uri, "/cars;color=blue;year=2024");
}
