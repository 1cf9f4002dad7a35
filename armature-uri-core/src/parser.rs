//! Template-aware URI parser
//!
//! Splits a URI reference into its RFC 3986 components without decoding
//! them. Template expressions are opaque to the parser, so `{a: [/?#]+}`
//! never splits a component, and IPv6 literals keep their colons.
//!
//! # Examples
//!
//! ```
//! use armature_uri_core::parser::UriParser;
//!
//! let uri = UriParser::parse("http://{host}:8080/a/{b: [^?]+}?q=1#f").unwrap();
//! assert_eq!(uri.scheme.as_deref(), Some("http"));
//! assert_eq!(uri.host.as_deref(), Some("{host}"));
//! assert_eq!(uri.port.as_deref(), Some("8080"));
//! assert_eq!(uri.path.as_deref(), Some("/a/{b: [^?]+}"));
//! assert_eq!(uri.query.as_deref(), Some("q=1"));
//! assert_eq!(uri.fragment.as_deref(), Some("f"));
//! ```

use crate::component::{self, ComponentType};
use crate::error::{Result, UriError};
use std::fmt;

/// The raw (still percent-encoded) components of a URI reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriComponents {
    pub scheme: Option<String>,
    /// Everything after `scheme:` up to the fragment
    pub ssp: Option<String>,
    pub authority: Option<String>,
    pub user_info: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
    /// `scheme:ssp` without a leading `/`, such as `mailto:a@b.com`
    pub opaque: bool,
}

impl UriComponents {
    /// Whether the reference has an authority (`//...`).
    pub fn has_authority(&self) -> bool {
        self.authority.is_some()
            || self.user_info.is_some()
            || self.host.is_some()
            || self.port.is_some()
    }

    pub fn path_str(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    fn write_authority(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user_info.is_none() && self.host.is_none() && self.port.is_none() {
            return match &self.authority {
                Some(authority) => write!(f, "//{}", authority),
                None => Ok(()),
            };
        }
        f.write_str("//")?;
        if let Some(user_info) = &self.user_info {
            write!(f, "{}@", user_info)?;
        }
        if let Some(host) = &self.host {
            f.write_str(host)?;
        }
        if let Some(port) = &self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

impl fmt::Display for UriComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}:", scheme)?;
        }
        if self.opaque {
            f.write_str(self.ssp.as_deref().unwrap_or(""))?;
        } else {
            self.write_authority(f)?;
            if let Some(path) = &self.path {
                if self.has_authority() && !path.is_empty() && !path.starts_with('/') {
                    f.write_str("/")?;
                }
                f.write_str(path)?;
            }
            if let Some(query) = &self.query {
                write!(f, "?{}", query)?;
            }
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

/// Cursor over the input being parsed.
pub struct UriParser<'a> {
    input: &'a str,
    pos: usize,
    components: UriComponents,
}

impl<'a> UriParser<'a> {
    /// Parse `input` into its components.
    ///
    /// # Errors
    ///
    /// Fails when a `:` appears before any scheme name, or when a port that
    /// is not a template contains anything but digits.
    pub fn parse(input: &'a str) -> Result<UriComponents> {
        let mut parser = UriParser {
            input,
            pos: 0,
            components: UriComponents::default(),
        };

        if input.is_empty() {
            parser.components.path = Some(String::new());
            parser.components.ssp = Some(String::new());
            return Ok(parser.components);
        }

        let (first, delimiter) = parser.scan(b":/?#", false);
        if delimiter == Some(b':') {
            let scheme = first.ok_or_else(|| {
                UriError::InvalidUri(format!("Expected scheme name at index 0: \"{}\"", input))
            })?;
            parser.components.scheme = Some(scheme.to_string());
            parser.pos += 1;
            parser.parse_scheme_specific_part()?;
        } else {
            parser.pos = 0;
            parser.parse_hierarchical()?;
        }

        Ok(parser.components)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Scan up to the first delimiter outside `{}` (and outside `[]` when
    /// `ip` is set), leaving the cursor on the delimiter.
    fn scan(&mut self, delimiters: &[u8], ip: bool) -> (Option<&'a str>, Option<u8>) {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let mut curly = 0i32;
        let mut square = 0i32;

        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            match b {
                b'{' => curly += 1,
                b'}' => curly -= 1,
                b'[' if ip => square += 1,
                b']' if ip => square -= 1,
                _ if curly == 0 && square == 0 && delimiters.contains(&b) => {
                    return (non_empty(&self.input[start..self.pos]), Some(b));
                }
                _ => {}
            }
            self.pos += 1;
        }

        (non_empty(&self.input[start..]), None)
    }

    fn parse_scheme_specific_part(&mut self) -> Result<()> {
        let rest = self.rest();
        if rest.is_empty() {
            self.components.path = Some(String::new());
            self.components.ssp = Some(String::new());
            return Ok(());
        }

        let start = self.pos;
        if rest.starts_with('/') {
            self.parse_hierarchical()?;
            let end = self
                .components
                .fragment
                .as_ref()
                .map_or(self.input.len(), |f| self.input.len() - f.len() - 1);
            self.components.ssp = Some(self.input[start..end].to_string());
        } else {
            self.components.opaque = true;
            let (ssp, delimiter) = self.scan(b"#", false);
            self.components.ssp = Some(ssp.unwrap_or("").to_string());
            if delimiter.is_some() {
                self.pos += 1;
                self.components.fragment = non_empty(self.rest()).map(str::to_string);
            }
        }
        Ok(())
    }

    fn parse_hierarchical(&mut self) -> Result<()> {
        if self.rest().starts_with("//") {
            self.pos += 2;
            self.parse_authority()?;
        }
        self.parse_path();
        Ok(())
    }

    fn parse_authority(&mut self) -> Result<()> {
        let start = self.pos;

        let (first, delimiter) = self.scan(b"@/?#", true);
        let (host, delimiter) = if delimiter == Some(b'@') {
            self.components.user_info = first.map(str::to_string);
            self.pos += 1;
            self.scan(b":/?#", true)
        } else {
            self.pos = start;
            self.scan(b":/?#", true)
        };
        self.components.host = host.map(str::to_string);

        if delimiter == Some(b':') {
            self.pos += 1;
            let (port, _) = self.scan(b"/?#", false);
            if let Some(port) = port {
                if !component::valid(port, ComponentType::Port, true) {
                    return Err(UriError::InvalidUri(format!(
                        "Illegal port \"{}\" in \"{}\"",
                        port, self.input
                    )));
                }
                self.components.port = Some(port.to_string());
            }
        }

        self.components.authority = non_empty(&self.input[start..self.pos]).map(str::to_string);
        Ok(())
    }

    fn parse_path(&mut self) {
        let (path, delimiter) = self.scan(b"?#", false);
        self.components.path = path.map(str::to_string);

        let delimiter = if delimiter == Some(b'?') {
            self.pos += 1;
            let (query, delimiter) = self.scan(b"#", false);
            self.components.query = query.map(str::to_string);
            delimiter
        } else {
            delimiter
        };

        if delimiter == Some(b'#') {
            self.pos += 1;
            self.components.fragment = non_empty(self.rest()).map(str::to_string);
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> UriComponents {
        UriParser::parse(input).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let uri = parse("");
        assert_eq!(uri.path.as_deref(), Some(""));
        assert_eq!(uri.ssp.as_deref(), Some(""));
        assert!(uri.scheme.is_none());
    }

    #[test]
    fn test_full_uri() {
        let uri = parse("http://user:pw@localhost:8080/a/b?x=1&y=2#frag");
        assert_eq!(uri.scheme.as_deref(), Some("http"));
        assert_eq!(uri.user_info.as_deref(), Some("user:pw"));
        assert_eq!(uri.host.as_deref(), Some("localhost"));
        assert_eq!(uri.port.as_deref(), Some("8080"));
        assert_eq!(uri.authority.as_deref(), Some("user:pw@localhost:8080"));
        assert_eq!(uri.path.as_deref(), Some("/a/b"));
        assert_eq!(uri.query.as_deref(), Some("x=1&y=2"));
        assert_eq!(uri.fragment.as_deref(), Some("frag"));
        assert_eq!(uri.ssp.as_deref(), Some("//user:pw@localhost:8080/a/b?x=1&y=2"));
        assert!(!uri.opaque);
    }

    #[test]
    fn test_relative_references() {
        let uri = parse("a/b?q");
        assert!(uri.scheme.is_none());
        assert_eq!(uri.path.as_deref(), Some("a/b"));
        assert_eq!(uri.query.as_deref(), Some("q"));

        let uri = parse("/a;x=1");
        assert_eq!(uri.path.as_deref(), Some("/a;x=1"));

        let uri = parse("?y");
        assert!(uri.path.is_none());
        assert_eq!(uri.query.as_deref(), Some("y"));

        let uri = parse("//g");
        assert_eq!(uri.host.as_deref(), Some("g"));
        assert!(uri.path.is_none());
    }

    #[test]
    fn test_opaque_uri() {
        let uri = parse("mailto:a@b.com#top");
        assert!(uri.opaque);
        assert_eq!(uri.scheme.as_deref(), Some("mailto"));
        assert_eq!(uri.ssp.as_deref(), Some("a@b.com"));
        assert_eq!(uri.fragment.as_deref(), Some("top"));
        assert!(uri.path.is_none());
    }

    #[test]
    fn test_ipv6_host() {
        let uri = parse("http://[fec0::abcd%251]:8080/p");
        assert_eq!(uri.host.as_deref(), Some("[fec0::abcd%251]"));
        assert_eq!(uri.port.as_deref(), Some("8080"));
    }

    #[test]
    fn test_templates_do_not_split() {
        let uri = parse("my{scheme}://my{host}:1{port}/my{path: [/?#]+}?{q}#{f}");
        assert_eq!(uri.scheme.as_deref(), Some("my{scheme}"));
        assert_eq!(uri.host.as_deref(), Some("my{host}"));
        assert_eq!(uri.port.as_deref(), Some("1{port}"));
        assert_eq!(uri.path.as_deref(), Some("/my{path: [/?#]+}"));
        assert_eq!(uri.query.as_deref(), Some("{q}"));
        assert_eq!(uri.fragment.as_deref(), Some("{f}"));
    }

    #[test]
    fn test_user_info_with_at_in_path() {
        let uri = parse("a@b");
        assert!(uri.user_info.is_none());
        assert_eq!(uri.path.as_deref(), Some("a@b"));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(UriParser::parse(":foo").is_err());
        assert!(UriParser::parse("http://host:80a/").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for uri in [
            "http://localhost:8080/a/b/c",
            "http://u@h/p;m=1?q=1#f",
            "mailto:a@b.com",
            "/a/b?x",
            "a/b",
            "//host",
            "#frag",
            "urn:isbn:096139210x",
        ] {
            assert_eq!(parse(uri).to_string(), uri);
        }
    }
}
