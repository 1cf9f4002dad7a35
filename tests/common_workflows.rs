//! Integration tests for common Armature URI workflows.
//!
//! These tests verify that the most common use cases work correctly.

use armature_uri::*;
use std::collections::HashMap;

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_route_request_paths() {
    let mut routes = TemplateSet::new();
    routes.add("/users").unwrap();
    routes.add("/users/{id: \\d+}").unwrap();
    routes.add("/users/{id: \\d+}/posts/{slug}").unwrap();

    let (route, params) = routes.match_first("/users/12/posts/hello-world").unwrap();
    assert_eq!(route.template(), "/users/{id: \\d+}/posts/{slug}");
    assert_eq!(params["id"], "12");
    assert_eq!(params["slug"], "hello-world");

    let (route, params) = routes.match_first("/users").unwrap();
    assert_eq!(route.template(), "/users");
    assert!(params.is_empty());

    assert!(routes.match_first("/users/abc").is_none());
}

// =============================================================================
// Link Building Tests
// =============================================================================

#[test]
fn test_build_link_from_route() {
    let route = UriTemplate::new("/users/{id}/posts/{slug}").unwrap();

    let link = UriBuilder::from_template(&route)
        .unwrap()
        .query_param("page", &["2"])
        .unwrap()
        .build(&["12", "hello world"])
        .unwrap();

    assert_eq!(link, "/users/12/posts/hello%20world?page=2");
}

#[test]
fn test_absolute_link_with_base() {
    let base = UriBuilder::from_uri("https://example.com/api/v1").unwrap();
    let values = HashMap::from([("id", "42")]);

    let link = base
        .path("orders/{id}")
        .unwrap()
        .build_from_map(&values)
        .unwrap();

    assert_eq!(link, "https://example.com/api/v1/orders/42");
}

// =============================================================================
// Reference Tests
// =============================================================================

#[test]
fn test_resolve_and_relativize() {
    let base = "http://example.com/a/b/";
    let absolute = UriTemplate::resolve(base, "c/d").unwrap();
    assert_eq!(absolute, "http://example.com/a/b/c/d");

    assert_eq!(UriTemplate::relativize(base, &absolute).unwrap(), "c/d");
}

#[cfg(feature = "config")]
#[test]
fn test_config_reexport() {
    let config = armature_uri_config::UriConfig::default();
    assert!(config.validate().is_ok());
}
