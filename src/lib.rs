// Armature URI - URI templates for Rust
//
// This library compiles URI templates into matchers, builds URIs component
// by component and percent-encodes each component per RFC 3986.

// Re-export core functionality
pub use armature_uri_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use armature_uri_config;
