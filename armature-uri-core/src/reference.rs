// URI reference normalization, resolution and relativization (RFC 3986 section 5)

use crate::error::Result;
use crate::parser::{UriComponents, UriParser};

/// Remove `.` and `..` segments from a path.
///
/// With `keep_leading_parent` set, `..` segments that would climb above
/// the start of a relative path are kept (`a/../../b` becomes `../b`);
/// otherwise they are dropped as RFC 3986 section 5.2.4 specifies.
pub fn remove_dot_segments(path: &str, keep_leading_parent: bool) -> String {
    let absolute = path.starts_with('/');
    let body = if absolute { &path[1..] } else { path };

    let mut output: Vec<&str> = Vec::new();
    let mut trailing_slash = false;
    let segments: Vec<&str> = body.split('/').collect();
    let last = segments.len().saturating_sub(1);

    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            "." => trailing_slash = i == last,
            ".." => {
                match output.last() {
                    Some(&prev) if prev != ".." => {
                        output.pop();
                    }
                    _ if keep_leading_parent && !absolute => output.push(".."),
                    _ => {}
                }
                trailing_slash = i == last;
            }
            segment => {
                output.push(segment);
                trailing_slash = false;
            }
        }
    }

    let mut result = String::with_capacity(path.len());
    if absolute {
        result.push('/');
    }
    result.push_str(&output.join("/"));
    if trailing_slash && !output.is_empty() {
        result.push('/');
    }
    result
}

/// Normalize a URI by removing dot segments from its path.
pub fn normalize(uri: &str) -> Result<String> {
    let mut components = UriParser::parse(uri)?;
    if !components.opaque {
        if let Some(path) = components.path.take() {
            components.path = Some(remove_dot_segments(&path, true));
        }
    }
    Ok(components.to_string())
}

/// Resolve `reference` against `base` (RFC 3986 section 5.2.2).
pub fn resolve(base: &str, reference: &str) -> Result<String> {
    let base = UriParser::parse(base)?;
    let reference = UriParser::parse(reference)?;
    Ok(resolve_components(&base, reference).to_string())
}

fn resolve_components(base: &UriComponents, reference: UriComponents) -> UriComponents {
    if base.opaque || reference.scheme.is_some() {
        let mut target = reference;
        if !target.opaque {
            target.path = target.path.map(|p| remove_dot_segments(&p, false));
        }
        return target;
    }

    let mut target = UriComponents {
        scheme: base.scheme.clone(),
        fragment: reference.fragment.clone(),
        ..UriComponents::default()
    };

    if reference.has_authority() {
        target.authority = reference.authority.clone();
        target.user_info = reference.user_info.clone();
        target.host = reference.host.clone();
        target.port = reference.port.clone();
        target.path = reference.path.map(|p| remove_dot_segments(&p, false));
        target.query = reference.query;
        return target;
    }

    target.authority = base.authority.clone();
    target.user_info = base.user_info.clone();
    target.host = base.host.clone();
    target.port = base.port.clone();

    let reference_path = reference.path_str();
    if reference_path.is_empty() {
        target.path = base.path.clone();
        target.query = reference.query.or_else(|| base.query.clone());
    } else {
        let merged = if reference_path.starts_with('/') {
            reference_path.to_string()
        } else {
            merge(base, reference_path)
        };
        target.path = Some(remove_dot_segments(&merged, false));
        target.query = reference.query;
    }

    target
}

fn merge(base: &UriComponents, reference_path: &str) -> String {
    let base_path = base.path_str();
    if base.has_authority() && base_path.is_empty() {
        return format!("/{}", reference_path);
    }
    match base_path.rfind('/') {
        Some(idx) => format!("{}{}", &base_path[..=idx], reference_path),
        None => reference_path.to_string(),
    }
}

/// Express `uri` relative to `base`.
///
/// Only succeeds when both share scheme and authority and the normalized
/// base path is a prefix of the normalized target path; otherwise `uri` is
/// returned unchanged.
pub fn relativize(base: &str, uri: &str) -> Result<String> {
    let base_components = UriParser::parse(base)?;
    let child = UriParser::parse(uri)?;

    if base_components.opaque || child.opaque {
        return Ok(uri.to_string());
    }

    let same_scheme = match (&base_components.scheme, &child.scheme) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    };
    if !same_scheme || base_components.authority != child.authority {
        return Ok(uri.to_string());
    }

    let mut base_path = remove_dot_segments(base_components.path_str(), true);
    let child_path = remove_dot_segments(child.path_str(), true);

    if base_path != child_path {
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        if !child_path.starts_with(&base_path) {
            return Ok(uri.to_string());
        }
    }

    let relative = UriComponents {
        path: Some(child_path[base_path.len().min(child_path.len())..].to_string()),
        query: child.query,
        fragment: child.fragment,
        ..UriComponents::default()
    };
    Ok(relative.to_string())
}
