//! Percent-encoding and decoding of URI components
//!
//! Each URI component (RFC 3986) permits a different set of literal
//! characters. Encoding keeps the permitted characters as they are and
//! percent-encodes everything else as UTF-8 octets with uppercase hex.
//!
//! # Features
//!
//! - **Per-component tables**: scheme, user-info, host, port, path, path
//!   segment, matrix and query parameters, fragment
//! - **Template aware**: `{name}` expressions can be passed through untouched
//! - **Contextual encoding**: existing `%XX` escapes are preserved
//! - **Strict decoding**: malformed escapes are reported, never guessed
//!
//! # Examples
//!
//! ```
//! use armature_uri_core::component::{self, ComponentType};
//!
//! assert_eq!(component::encode("a b", ComponentType::QueryParam), "a+b");
//! assert_eq!(component::encode("a/b", ComponentType::PathSegment), "a%2Fb");
//! assert_eq!(component::contextual_encode("%2F x", ComponentType::Path), "%2F%20x");
//! ```

use crate::error::{Result, UriError};
use crate::multimap::ParamMap;
use percent_encoding::{percent_decode_str, percent_encode_byte};
use std::borrow::Cow;

// ============================================================================
// Component Types
// ============================================================================

/// The URI component a string is encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// ALPHA / DIGIT / `-` / `.` / `_` / `~`
    Unreserved,
    Scheme,
    Authority,
    UserInfo,
    Host,
    Port,
    /// A whole path, `/` kept literal
    Path,
    /// A single path segment, `/` and `;` encoded
    PathSegment,
    MatrixParam,
    Query,
    /// A query parameter name or value, space encoded as `+`
    QueryParam,
    /// A query parameter name or value, space encoded as `%20`
    QueryParamSpaceEncoded,
    Fragment,
}

impl ComponentType {
    fn table(self) -> &'static [bool; 128] {
        match self {
            ComponentType::Unreserved => &UNRESERVED,
            ComponentType::Scheme => &SCHEME,
            ComponentType::Authority => &AUTHORITY,
            ComponentType::UserInfo => &USER_INFO,
            ComponentType::Host => &HOST,
            ComponentType::Port => &PORT,
            ComponentType::Path => &PATH,
            ComponentType::PathSegment => &PATH_SEGMENT,
            ComponentType::MatrixParam => &MATRIX_PARAM,
            ComponentType::Query | ComponentType::Fragment => &QUERY,
            ComponentType::QueryParam | ComponentType::QueryParamSpaceEncoded => &QUERY_PARAM,
        }
    }

    /// Whether `c` may appear unencoded in this component.
    #[inline]
    pub fn allows(self, c: char) -> bool {
        c.is_ascii() && self.table()[c as usize]
    }
}

// ============================================================================
// Encoding Tables
// ============================================================================

const fn alphanumeric() -> [bool; 128] {
    let mut table = [false; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        table[i] = b.is_ascii_alphanumeric();
        i += 1;
    }
    table
}

const fn digits() -> [bool; 128] {
    let mut table = [false; 128];
    let mut i = b'0';
    while i <= b'9' {
        table[i as usize] = true;
        i += 1;
    }
    table
}

const fn allow(mut table: [bool; 128], chars: &[u8]) -> [bool; 128] {
    let mut i = 0;
    while i < chars.len() {
        table[chars[i] as usize] = true;
        i += 1;
    }
    table
}

const fn deny(mut table: [bool; 128], chars: &[u8]) -> [bool; 128] {
    let mut i = 0;
    while i < chars.len() {
        table[chars[i] as usize] = false;
        i += 1;
    }
    table
}

const UNRESERVED: [bool; 128] = allow(alphanumeric(), b"-._~");
const SCHEME: [bool; 128] = allow(alphanumeric(), b"+-.");
const HOST: [bool; 128] = allow(UNRESERVED, b"!$&'()*+,;=");
const PORT: [bool; 128] = digits();
const USER_INFO: [bool; 128] = allow(HOST, b":");
const AUTHORITY: [bool; 128] = allow(USER_INFO, b"@");
const PATH_SEGMENT: [bool; 128] = deny(AUTHORITY, b";");
const MATRIX_PARAM: [bool; 128] = deny(PATH_SEGMENT, b"=");
const PATH: [bool; 128] = allow(AUTHORITY, b"/");
const QUERY: [bool; 128] = allow(deny(PATH, b"!*'();:@$,"), b"/?");
const QUERY_PARAM: [bool; 128] = deny(QUERY, b"=+&");

// ============================================================================
// Encoding
// ============================================================================

/// Percent-encode every character not permitted in `component`.
///
/// `%` itself is encoded, so `encode("%20", ..)` yields `%2520`.
pub fn encode(s: &str, component: ComponentType) -> String {
    encode_with(s, component, false, false).into_owned()
}

/// Like [`encode`], but valid `%XX` escapes already in `s` are kept.
pub fn contextual_encode(s: &str, component: ComponentType) -> String {
    encode_with(s, component, false, true).into_owned()
}

/// Encode `s` while leaving `{...}` template expressions untouched.
pub fn encode_template(s: &str, component: ComponentType, contextual: bool) -> String {
    encode_with(s, component, true, contextual).into_owned()
}

/// Encode the braces of template expressions so a template string can be
/// embedded in a URI as literal text.
pub fn encode_template_names(s: &str) -> String {
    if !s.contains(['{', '}']) {
        return s.to_string();
    }
    s.replace('{', "%7B").replace('}', "%7D")
}

fn encode_with(s: &str, component: ComponentType, template: bool, contextual: bool) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let mut out: Option<String> = None;
    let mut inside_template = false;
    let mut skip = 0usize;

    for (offset, c) in s.char_indices() {
        if skip > 0 {
            skip -= 1;
            continue;
        }

        if component.allows(c) {
            if let Some(buf) = out.as_mut() {
                buf.push(c);
            }
            continue;
        }

        if template {
            let leaving = c == '}';
            if c == '{' {
                inside_template = true;
            } else if leaving {
                inside_template = false;
            }
            if inside_template || leaving {
                if let Some(buf) = out.as_mut() {
                    buf.push(c);
                }
                continue;
            }
        }

        if contextual
            && c == '%'
            && offset + 2 < bytes.len()
            && is_hex(bytes[offset + 1])
            && is_hex(bytes[offset + 2])
        {
            if let Some(buf) = out.as_mut() {
                buf.push_str(&s[offset..offset + 3]);
            }
            skip = 2;
            continue;
        }

        let buf = out.get_or_insert_with(|| {
            let mut buf = String::with_capacity(s.len() + 16);
            buf.push_str(&s[..offset]);
            buf
        });

        if c == ' ' && component == ComponentType::QueryParam {
            buf.push('+');
        } else {
            let mut utf8 = [0u8; 4];
            for byte in c.encode_utf8(&mut utf8).bytes() {
                buf.push_str(percent_encode_byte(byte));
            }
        }
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(s),
    }
}

#[inline]
pub fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

// ============================================================================
// Validation
// ============================================================================

/// Check that `s` only contains characters permitted in `component`.
///
/// With `template` set, anything inside `{...}` is accepted.
pub fn validate(s: &str, component: ComponentType, template: bool) -> Result<()> {
    match invalid_index(s, component, template) {
        Some(index) => Err(UriError::IllegalArgument(format!(
            "The string \"{}\" for the URI component {:?} contains an invalid character, '{}', at index {}",
            s,
            component,
            s[index..].chars().next().unwrap_or_default(),
            index
        ))),
        None => Ok(()),
    }
}

/// Returns true when `s` only contains characters permitted in `component`.
pub fn valid(s: &str, component: ComponentType, template: bool) -> bool {
    invalid_index(s, component, template).is_none()
}

fn invalid_index(s: &str, component: ComponentType, template: bool) -> Option<usize> {
    let mut inside_template = false;
    for (offset, c) in s.char_indices() {
        if template {
            match c {
                '{' => {
                    inside_template = true;
                    continue;
                }
                '}' => {
                    inside_template = false;
                    continue;
                }
                _ if inside_template => continue,
                _ => {}
            }
        }
        if !component.allows(c) {
            return Some(offset);
        }
    }
    None
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a percent-encoded component.
///
/// For [`ComponentType::QueryParam`] a `+` decodes to a space. For
/// [`ComponentType::Host`] an IP literal (`[...]`) is returned unchanged.
pub fn decode(s: &str, component: ComponentType) -> Result<String> {
    match component {
        ComponentType::Host if s.starts_with('[') => Ok(s.to_string()),
        ComponentType::QueryParam if s.contains('+') => decode_octets(&s.replace('+', " ")),
        _ => decode_octets(s),
    }
}

fn decode_octets(s: &str) -> Result<String> {
    if !s.contains('%') {
        return Ok(s.to_string());
    }

    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() || !is_hex(bytes[i + 1]) || !is_hex(bytes[i + 2]) {
                return Err(UriError::InvalidEncoding(format!(
                    "Malformed percent-encoded octet at index {} in \"{}\"",
                    i, s
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(s)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| UriError::InvalidEncoding(format!("\"{}\" is not valid UTF-8: {}", s, e)))
}

// ============================================================================
// Query, Matrix and Path Decoding
// ============================================================================

/// Split a query string into its parameters.
///
/// Empty parameters and parameters without a name (`=x`) are skipped; a
/// parameter without `=` maps to an empty value.
pub fn decode_query(query: &str, decode_names: bool, decode_values: bool) -> Result<ParamMap> {
    let mut params = ParamMap::new();

    for param in query.split('&') {
        if param.is_empty() {
            continue;
        }
        let (name, value) = match param.split_once('=') {
            Some(("", _)) => continue,
            Some((name, value)) => (name, value),
            None => (param, ""),
        };
        let name = if decode_names {
            decode(name, ComponentType::QueryParam)?
        } else {
            name.to_string()
        };
        let value = if decode_values {
            decode(value, ComponentType::QueryParam)?
        } else {
            value.to_string()
        };
        params.add(name, value);
    }

    Ok(params)
}

/// Read the matrix parameters of a path segment (everything after its first `;`).
pub fn decode_matrix(segment: &str, decode_values: bool) -> Result<ParamMap> {
    let mut params = ParamMap::new();
    let Some((_, matrix)) = segment.split_once(';') else {
        return Ok(params);
    };

    for param in matrix.split(';') {
        if param.is_empty() {
            continue;
        }
        let (name, value) = match param.split_once('=') {
            Some(("", _)) => continue,
            Some((name, value)) => (name, value),
            None => (param, ""),
        };
        if decode_values {
            params.add(
                decode(name, ComponentType::MatrixParam)?,
                decode(value, ComponentType::MatrixParam)?,
            );
        } else {
            params.add(name, value);
        }
    }

    Ok(params)
}

/// A path segment and its matrix parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    path: String,
    matrix_parameters: ParamMap,
}

impl PathSegment {
    pub fn new(path: impl Into<String>, matrix_parameters: ParamMap) -> Self {
        Self {
            path: path.into(),
            matrix_parameters,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matrix_parameters(&self) -> &ParamMap {
        &self.matrix_parameters
    }
}

/// Split a path into segments, separating each segment's matrix parameters.
///
/// A leading `/` produces an initial empty segment and `""` produces a
/// single empty segment.
pub fn decode_path(path: &str, decode_values: bool) -> Result<Vec<PathSegment>> {
    path.split('/')
        .map(|segment| decode_path_segment(segment, decode_values))
        .collect()
}

fn decode_path_segment(segment: &str, decode_values: bool) -> Result<PathSegment> {
    let raw = segment.split_once(';').map_or(segment, |(path, _)| path);
    let path = if decode_values {
        decode(raw, ComponentType::PathSegment)?
    } else {
        raw.to_string()
    };
    Ok(PathSegment::new(path, decode_matrix(segment, decode_values)?))
}
