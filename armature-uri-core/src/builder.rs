//! URI builder
//!
//! [`UriBuilder`] assembles a URI (or URI template) component by component
//! and then substitutes template values into it.
//!
//! Every value handed to a setter is stored percent-encoded for its
//! component. Template expressions such as `{id}` and existing `%XX`
//! escapes are kept as they are.
//!
//! # Examples
//!
//! ```
//! use armature_uri_core::builder::UriBuilder;
//!
//! let uri = UriBuilder::from_uri("http://localhost:8080/a/b/c")
//!     .unwrap()
//!     .port(9090)
//!     .unwrap()
//!     .build(&[])
//!     .unwrap();
//! assert_eq!(uri, "http://localhost:9090/a/b/c");
//!
//! let uri = UriBuilder::from_path("/users/{id}")
//!     .unwrap()
//!     .query_param("tag", &["a b"])
//!     .unwrap()
//!     .build(&["x/y"])
//!     .unwrap();
//! assert_eq!(uri, "/users/x%2Fy?tag=a+b");
//! ```

use crate::component::{self, ComponentType};
use crate::error::{Result, UriError};
use crate::logging::debug;
use crate::multimap::ParamMap;
use crate::parser::{UriComponents, UriParser};
use crate::template::{TemplateValues, UriTemplate};
use std::collections::HashMap;
use std::fmt;

/// Fluent builder for URIs and URI templates.
///
/// Setters consume the builder and hand it back, so calls chain with `?`.
/// `clone()` gives an independent copy to branch from.
#[derive(Debug, Clone, Default)]
pub struct UriBuilder {
    scheme: Option<String>,
    /// Set for opaque URIs such as `mailto:a@b.com`
    ssp: Option<String>,
    /// An authority that has no user-info, host or port form
    authority: Option<String>,
    user_info: Option<String>,
    host: Option<String>,
    port: Option<String>,
    path: String,
    /// Matrix parameters lifted out of the last path segment
    matrix_params: Option<ParamMap>,
    query: String,
    /// Query parameters lifted out of `query`
    query_params: Option<ParamMap>,
    fragment: Option<String>,
}

fn encode(s: &str, component_type: ComponentType) -> String {
    component::encode_template(s, component_type, true)
}

impl UriBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a URI or URI template.
    pub fn from_uri(uri: &str) -> Result<Self> {
        Self::new().uri(uri)
    }

    /// Start from a path.
    pub fn from_path(path: &str) -> Result<Self> {
        Self::new().path(path)
    }

    pub fn from_template(template: &UriTemplate) -> Result<Self> {
        Self::new().uri(template.template())
    }

    fn check_ssp(&self) -> Result<()> {
        if self.ssp.is_some() {
            return Err(UriError::IllegalState(
                "Schema specific part is opaque".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Scheme and Authority
    // ========================================================================

    /// Replace the builder's components with those of `uri`.
    ///
    /// The scheme and fragment are always replaced (cleared when `uri` has
    /// none). The authority, path and query are only replaced when `uri`
    /// has them.
    pub fn uri(self, uri: &str) -> Result<Self> {
        let parsed = UriParser::parse(uri)?;
        let mut builder = self.scheme(parsed.scheme.as_deref())?;
        builder.apply_scheme_specific_part(&parsed)?;
        Ok(builder.fragment(parsed.fragment.as_deref()))
    }

    /// Set the scheme; `None` clears it.
    pub fn scheme(mut self, scheme: Option<&str>) -> Result<Self> {
        if let Some(scheme) = scheme {
            component::validate(scheme, ComponentType::Scheme, true)?;
        }
        self.scheme = scheme.map(str::to_string);
        Ok(self)
    }

    /// Replace everything between the scheme and the fragment.
    ///
    /// # Errors
    ///
    /// Fails when `ssp` carries a scheme other than the builder's, or a
    /// fragment.
    pub fn scheme_specific_part(mut self, ssp: &str) -> Result<Self> {
        let uri = match &self.scheme {
            Some(scheme) => format!("{}:{}", scheme, ssp),
            None => ssp.to_string(),
        };
        let parsed = UriParser::parse(&uri)?;

        if let Some(scheme) = &parsed.scheme {
            if self.scheme.as_ref() != Some(scheme) {
                return Err(UriError::IllegalState(format!(
                    "Supplied scheme-specific URI part '{}' contains unexpected URI Scheme component: '{}'",
                    ssp, scheme
                )));
            }
        }
        if let Some(fragment) = &parsed.fragment {
            return Err(UriError::IllegalState(format!(
                "Supplied scheme-specific URI part '{}' contains URI Fragment component: '{}'",
                ssp, fragment
            )));
        }

        self.apply_scheme_specific_part(&parsed)?;
        Ok(self)
    }

    fn apply_scheme_specific_part(&mut self, parsed: &UriComponents) -> Result<()> {
        if parsed.opaque {
            if let Some(ssp) = &parsed.ssp {
                self.authority = None;
                self.host = None;
                self.port = None;
                self.path.clear();
                self.matrix_params = None;
                self.query.clear();
                self.query_params = None;
                self.ssp = Some(ssp.clone());
            }
            return Ok(());
        }

        self.ssp = None;
        if parsed.has_authority() {
            if parsed.user_info.is_none() && parsed.host.is_none() && parsed.port.is_none() {
                self.authority = parsed
                    .authority
                    .as_deref()
                    .map(|authority| encode(authority, ComponentType::Authority));
                self.user_info = None;
                self.host = None;
                self.port = None;
            } else {
                self.authority = None;
                if let Some(user_info) = &parsed.user_info {
                    self.user_info = Some(encode(user_info, ComponentType::UserInfo));
                }
                if let Some(host) = &parsed.host {
                    self.set_host(Some(host))?;
                }
                if let Some(port) = &parsed.port {
                    self.port = Some(port.clone());
                }
            }
        }

        if let Some(path) = &parsed.path {
            self.path.clear();
            self.matrix_params = None;
            self.append_path(path, false);
        }
        if let Some(query) = &parsed.query {
            self.query = query.clone();
            self.query_params = None;
        }
        Ok(())
    }

    /// Set the user-info; `None` clears it.
    pub fn user_info(mut self, user_info: Option<&str>) -> Result<Self> {
        self.check_ssp()?;
        self.user_info = user_info.map(|ui| encode(ui, ComponentType::UserInfo));
        Ok(self)
    }

    /// Set the host; `None` clears it. IP literals (`[::1]`) are kept as
    /// given.
    pub fn host(mut self, host: Option<&str>) -> Result<Self> {
        self.check_ssp()?;
        self.set_host(host)?;
        Ok(self)
    }

    fn set_host(&mut self, host: Option<&str>) -> Result<()> {
        self.host = match host {
            Some("") => return Err(UriError::IllegalArgument("Invalid host name".to_string())),
            Some(host) if host.starts_with('[') => Some(host.to_string()),
            Some(host) => Some(encode(host, ComponentType::Host)),
            None => None,
        };
        Ok(())
    }

    /// Set the port; `-1` clears it.
    pub fn port(mut self, port: i32) -> Result<Self> {
        self.check_ssp()?;
        if port < -1 {
            return Err(UriError::IllegalArgument(format!("Invalid port value {}", port)));
        }
        self.port = (port != -1).then(|| port.to_string());
        Ok(self)
    }

    // ========================================================================
    // Path and Matrix Parameters
    // ========================================================================

    /// Replace the path; `None` clears it.
    pub fn replace_path(mut self, path: Option<&str>) -> Result<Self> {
        self.check_ssp()?;
        self.path.clear();
        self.matrix_params = None;
        if let Some(path) = path {
            self.append_path(path, false);
        }
        Ok(self)
    }

    /// Append to the path, inserting or collapsing a `/` at the join.
    pub fn path(mut self, path: &str) -> Result<Self> {
        self.check_ssp()?;
        self.append_path(path, false);
        Ok(self)
    }

    /// Append path segments. `/` inside a segment is encoded as `%2F`.
    pub fn segment(mut self, segments: &[&str]) -> Result<Self> {
        self.check_ssp()?;
        for segment in segments {
            self.append_path(segment, true);
        }
        Ok(self)
    }

    fn append_path(&mut self, segments: &str, is_segment: bool) {
        if segments.is_empty() {
            return;
        }

        self.flush_matrix();

        let component_type = if is_segment {
            ComponentType::PathSegment
        } else {
            ComponentType::Path
        };
        let encoded = encode(segments, component_type);

        let path_ends_with_slash = self.path.ends_with('/');
        let segment_starts_with_slash = encoded.starts_with('/');

        if !self.path.is_empty() && !path_ends_with_slash && !segment_starts_with_slash {
            self.path.push('/');
            self.path.push_str(&encoded);
        } else if path_ends_with_slash && segment_starts_with_slash {
            self.path.push_str(&encoded[1..]);
        } else {
            self.path.push_str(&encoded);
        }
    }

    fn last_segment_start(&self) -> usize {
        self.path.rfind('/').map_or(0, |i| i + 1)
    }

    fn matrix_start(&self) -> Option<usize> {
        let start = self.last_segment_start();
        self.path[start..].find(';').map(|i| start + i)
    }

    fn flush_matrix(&mut self) {
        if let Some(params) = self.matrix_params.take() {
            write_matrix(&mut self.path, &params);
        }
    }

    /// Replace all matrix parameters of the last path segment with
    /// `matrix` (such as `a=1;b=2`); `None` removes them.
    pub fn replace_matrix(mut self, matrix: Option<&str>) -> Result<Self> {
        self.check_ssp()?;
        self.matrix_params = None;
        if let Some(index) = self.matrix_start() {
            self.path.truncate(index);
        }
        if let Some(matrix) = matrix {
            let matrix = matrix.strip_prefix(';').unwrap_or(matrix);
            if !matrix.is_empty() {
                self.path.push(';');
                self.path.push_str(&encode(matrix, ComponentType::Path));
            }
        }
        Ok(self)
    }

    /// Append a matrix parameter to the last path segment, once per value.
    /// An empty value is written without `=`.
    pub fn matrix_param(mut self, name: &str, values: &[&str]) -> Result<Self> {
        self.check_ssp()?;
        let name = encode(name, ComponentType::MatrixParam);
        let values = values.iter().map(|v| encode(v, ComponentType::MatrixParam));

        match self.matrix_params.as_mut() {
            Some(params) => {
                for value in values {
                    params.add(name.clone(), value);
                }
            }
            None => {
                for value in values {
                    write_param(&mut self.path, ';', &name, &value, false);
                }
            }
        }
        Ok(self)
    }

    /// Replace every value of a matrix parameter of the last path segment;
    /// `None` removes the parameter.
    pub fn replace_matrix_param(mut self, name: &str, values: Option<&[&str]>) -> Result<Self> {
        self.check_ssp()?;

        if self.matrix_params.is_none() {
            let start = self.last_segment_start();
            let params = component::decode_matrix(&self.path[start..], false)?;
            if let Some(index) = self.matrix_start() {
                self.path.truncate(index);
            }
            self.matrix_params = Some(params);
        }

        let name = encode(name, ComponentType::MatrixParam);
        let params = self.matrix_params.get_or_insert_with(ParamMap::new);
        match values {
            Some(values) => params.put(
                name,
                values.iter().map(|v| encode(v, ComponentType::MatrixParam)),
            ),
            None => {
                params.remove(&name);
            }
        }
        Ok(self)
    }

    // ========================================================================
    // Query Parameters
    // ========================================================================

    /// Replace the query; `None` clears it.
    pub fn replace_query(mut self, query: Option<&str>) -> Result<Self> {
        self.check_ssp()?;
        self.query_params = None;
        self.query = query
            .map(|q| encode(q, ComponentType::Query))
            .unwrap_or_default();
        Ok(self)
    }

    /// Append a query parameter, once per value. An empty value is written
    /// as `name=`.
    pub fn query_param(mut self, name: &str, values: &[&str]) -> Result<Self> {
        self.check_ssp()?;
        let name = encode(name, ComponentType::QueryParam);
        let values = values.iter().map(|v| encode(v, ComponentType::QueryParam));

        match self.query_params.as_mut() {
            Some(params) => {
                for value in values {
                    params.add(name.clone(), value);
                }
            }
            None => {
                for value in values {
                    write_param(&mut self.query, '&', &name, &value, true);
                }
            }
        }
        Ok(self)
    }

    /// Replace every value of a query parameter; `None` removes it.
    pub fn replace_query_param(mut self, name: &str, values: Option<&[&str]>) -> Result<Self> {
        self.check_ssp()?;

        if self.query_params.is_none() {
            let params = component::decode_query(&self.query, false, false)?;
            self.query.clear();
            self.query_params = Some(params);
        }

        let name = encode(name, ComponentType::QueryParam);
        let params = self.query_params.get_or_insert_with(ParamMap::new);
        match values {
            Some(values) => params.put(
                name,
                values.iter().map(|v| encode(v, ComponentType::QueryParam)),
            ),
            None => {
                params.remove(&name);
            }
        }
        Ok(self)
    }

    fn flush_query(&mut self) {
        if let Some(params) = self.query_params.take() {
            write_query(&mut self.query, &params);
        }
    }

    /// Set the fragment; `None` clears it.
    pub fn fragment(mut self, fragment: Option<&str>) -> Self {
        self.fragment = fragment.map(|f| encode(f, ComponentType::Fragment));
        self
    }

    // ========================================================================
    // Template Resolution
    // ========================================================================

    /// Substitute one template variable, encoding the value. `/` in a
    /// path value is encoded as `%2F`.
    pub fn resolve_template(self, name: &str, value: &str) -> Result<Self> {
        self.resolve_template_with(name, value, true)
    }

    pub fn resolve_template_with(self, name: &str, value: &str, encode_slash_in_path: bool) -> Result<Self> {
        let values = HashMap::from([(name.to_string(), value.to_string())]);
        self.resolve(&values, true, encode_slash_in_path)
    }

    /// Substitute one template variable whose value is already encoded.
    pub fn resolve_template_from_encoded(self, name: &str, value: &str) -> Result<Self> {
        let values = HashMap::from([(name.to_string(), value.to_string())]);
        self.resolve(&values, false, false)
    }

    /// Substitute every template variable that has a value in `values`.
    pub fn resolve_templates<K, V>(self, values: &HashMap<K, V>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.resolve(&value_map(values), true, true)
    }

    pub fn resolve_templates_with<K, V>(self, values: &HashMap<K, V>, encode_slash_in_path: bool) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.resolve(&value_map(values), true, encode_slash_in_path)
    }

    pub fn resolve_templates_from_encoded<K, V>(self, values: &HashMap<K, V>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.resolve(&value_map(values), false, false)
    }

    fn resolve(
        mut self,
        values: &HashMap<String, String>,
        encode: bool,
        encode_slash_in_path: bool,
    ) -> Result<Self> {
        if values.is_empty() {
            return Ok(self);
        }

        self.flush_matrix();
        self.flush_query();

        let resolve = |component_type, value: &Option<String>, encode_values| -> Result<Option<String>> {
            value
                .as_deref()
                .map(|v| UriTemplate::resolve_template_values(component_type, v, encode_values, values))
                .transpose()
        };

        self.scheme = resolve(ComponentType::Scheme, &self.scheme, false)?;
        self.user_info = resolve(ComponentType::UserInfo, &self.user_info, encode)?;
        self.host = resolve(ComponentType::Host, &self.host, encode)?;
        self.port = resolve(ComponentType::Port, &self.port, false)?;
        self.authority = resolve(ComponentType::Authority, &self.authority, encode)?;

        let path_type = if encode_slash_in_path {
            ComponentType::PathSegment
        } else {
            ComponentType::Path
        };
        self.path = UriTemplate::resolve_template_values(path_type, &self.path, encode, values)?;
        self.query =
            UriTemplate::resolve_template_values(ComponentType::QueryParam, &self.query, encode, values)?;
        self.fragment = resolve(ComponentType::Fragment, &self.fragment, encode)?;

        let template = self.to_template();
        debug!(resolved = values.len(), template = template.as_str(), "Resolved template values");
        Ok(self)
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the URI, substituting `values` positionally. Each distinct
    /// variable takes the next value; `/` in path values is encoded.
    ///
    /// # Errors
    ///
    /// Fails with [`UriError::MissingValue`] when there are fewer values
    /// than distinct variables.
    pub fn build(&self, values: &[&str]) -> Result<String> {
        self.build_positional(values, true, true)
    }

    pub fn build_with(&self, values: &[&str], encode_slash_in_path: bool) -> Result<String> {
        self.build_positional(values, true, encode_slash_in_path)
    }

    /// Build the URI from values that are already percent-encoded. Valid
    /// `%XX` escapes are kept and other characters are encoded.
    pub fn build_from_encoded(&self, values: &[&str]) -> Result<String> {
        self.build_positional(values, false, false)
    }

    /// Build the URI, substituting values by name. Unused entries are
    /// ignored.
    pub fn build_from_map<K, V>(&self, values: &HashMap<K, V>) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.build_named(&value_map(values), true, true)
    }

    pub fn build_from_map_with<K, V>(&self, values: &HashMap<K, V>, encode_slash_in_path: bool) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.build_named(&value_map(values), true, encode_slash_in_path)
    }

    pub fn build_from_encoded_map<K, V>(&self, values: &HashMap<K, V>) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.build_named(&value_map(values), false, false)
    }

    fn build_positional(&self, values: &[&str], encode: bool, encode_slash_in_path: bool) -> Result<String> {
        if values.is_empty() && self.ssp.is_some() {
            return Ok(self.to_template());
        }
        self.check_ssp()?;

        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let uri = UriTemplate::create_uri_from_components(
            &self.components(),
            TemplateValues::Positional(&values),
            encode,
            encode_slash_in_path,
        )?;
        debug!(uri = uri.as_str(), values = values.len(), "Built URI");
        Ok(uri)
    }

    fn build_named(
        &self,
        values: &HashMap<String, String>,
        encode: bool,
        encode_slash_in_path: bool,
    ) -> Result<String> {
        self.check_ssp()?;

        let uri = UriTemplate::create_uri_from_components(
            &self.components(),
            TemplateValues::Named(values),
            encode,
            encode_slash_in_path,
        )?;
        debug!(uri = uri.as_str(), values = values.len(), "Built URI from map");
        Ok(uri)
    }

    /// The builder's components with pending matrix and query parameters
    /// written out.
    fn components(&self) -> UriComponents {
        let mut path = self.path.clone();
        if let Some(params) = &self.matrix_params {
            write_matrix(&mut path, params);
        }
        let mut query = self.query.clone();
        if let Some(params) = &self.query_params {
            write_query(&mut query, params);
        }

        UriComponents {
            scheme: self.scheme.clone(),
            ssp: self.ssp.clone(),
            authority: self.authority.clone(),
            user_info: self.user_info.clone(),
            host: self.host.clone(),
            port: self.port.clone(),
            path: Some(path),
            query: Some(query),
            fragment: self.fragment.clone(),
            opaque: self.ssp.is_some(),
        }
    }

    /// The URI template the builder currently holds, variables unresolved.
    pub fn to_template(&self) -> String {
        let components = self.components();
        let path = components.path_str();
        let query = components.query.as_deref().unwrap_or("");
        let fragment = components.fragment.as_deref().unwrap_or("");

        let mut out = String::new();
        if let Some(scheme) = &components.scheme {
            out.push_str(scheme);
            out.push(':');
        }

        if let Some(ssp) = &components.ssp {
            out.push_str(ssp);
        } else {
            if components.user_info.is_some() || components.host.is_some() || components.port.is_some() {
                out.push_str("//");
                if let Some(user_info) = components.user_info.as_deref().filter(|ui| !ui.is_empty()) {
                    out.push_str(user_info);
                    out.push('@');
                }
                if let Some(host) = &components.host {
                    out.push_str(host);
                }
                if let Some(port) = &components.port {
                    out.push(':');
                    out.push_str(port);
                }
            } else if let Some(authority) = &components.authority {
                out.push_str("//");
                out.push_str(authority);
            }

            if !path.is_empty() {
                if !out.is_empty() && !path.starts_with('/') {
                    out.push('/');
                }
                out.push_str(path);
            } else if !out.is_empty() && (!query.is_empty() || !fragment.is_empty()) {
                out.push('/');
            }

            if !query.is_empty() {
                out.push('?');
                out.push_str(query);
            }
        }

        if !fragment.is_empty() {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

impl fmt::Display for UriBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_template())
    }
}

fn value_map<K, V>(values: &HashMap<K, V>) -> HashMap<String, String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    values
        .iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect()
}

fn write_param(out: &mut String, separator: char, name: &str, value: &str, always_assign: bool) {
    if separator == ';' || !out.is_empty() {
        out.push(separator);
    }
    out.push_str(name);
    if always_assign || !value.is_empty() {
        out.push('=');
        out.push_str(value);
    }
}

fn write_matrix(path: &mut String, params: &ParamMap) {
    for (name, value) in params.pairs() {
        write_param(path, ';', name, value, false);
    }
}

fn write_query(query: &mut String, params: &ParamMap) {
    for (name, value) in params.pairs() {
        write_param(query, '&', name, value, true);
    }
}
