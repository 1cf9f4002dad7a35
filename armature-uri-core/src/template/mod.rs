//! URI templates
//!
//! A [`UriTemplate`] is compiled once from a string such as
//! `/users/{id: \d+}/orders/{order}` and can then be matched against
//! request paths or expanded into URIs.
//!
//! # Features
//!
//! - **Regex constraints**: `{id: \d+}` restricts what a variable matches
//! - **Query and matrix lists**: `{?sort,limit}` and `{;lang}` expressions
//! - **Ordering**: templates sort from most to least specific
//! - **Component expansion**: values are percent-encoded per URI component
//!
//! # Examples
//!
//! ```
//! use armature_uri_core::template::UriTemplate;
//! use std::collections::HashMap;
//!
//! let template = UriTemplate::new("/users/{id: \\d+}/orders/{order}").unwrap();
//!
//! let values = template.match_map("/users/42/orders/abc").unwrap();
//! assert_eq!(values["id"], "42");
//! assert_eq!(values["order"], "abc");
//!
//! assert_eq!(template.create_uri_positional(&["7", "x"]), "/users/7/orders/x");
//! ```

mod parser;
mod pattern;
mod set;

pub use parser::{ParamKind, ParsedTemplate, TemplateParser, TemplatePart, TEMPLATE_VALUE_PATTERN};
pub use pattern::{GroupMatch, PatternWithGroups};
pub use set::TemplateSet;

use crate::component::{self, ComponentType};
use crate::error::{Result, UriError};
use crate::logging::{debug, trace};
use crate::parser::UriComponents;
use crate::reference;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Uri Template
// ============================================================================

/// A compiled URI template.
///
/// Cloning is cheap; the compiled state is shared.
#[derive(Clone)]
pub struct UriTemplate {
    inner: Arc<CompiledTemplate>,
}

struct CompiledTemplate {
    template: String,
    normalized: String,
    parts: Vec<TemplatePart>,
    pattern: PatternWithGroups,
    variables: Vec<String>,
    literal_chars: usize,
    explicit_regexes: usize,
    regex_groups: usize,
    ends_with_slash: bool,
}

impl UriTemplate {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// Returns a template error for an empty template, unbalanced braces,
    /// an invalid variable name or an invalid regex.
    pub fn new(template: &str) -> Result<Self> {
        let parsed = TemplateParser::parse(template)?;
        let pattern = PatternWithGroups::with_group_indexes(&parsed.regex, parsed.group_indexes)?;

        debug!(
            template = template,
            variables = parsed.names.len(),
            regex = pattern.regex(),
            "Compiled URI template"
        );

        Ok(Self {
            inner: Arc::new(CompiledTemplate {
                ends_with_slash: template.ends_with('/'),
                template: parsed.template,
                normalized: parsed.normalized,
                parts: parsed.parts,
                pattern,
                variables: parsed.names,
                literal_chars: parsed.literal_chars,
                explicit_regexes: parsed.explicit_regexes,
                regex_groups: parsed.regex_groups,
            }),
        })
    }

    /// The empty template, which only matches the empty string.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(CompiledTemplate {
                template: String::new(),
                normalized: String::new(),
                parts: Vec::new(),
                pattern: PatternWithGroups::EMPTY,
                variables: Vec::new(),
                literal_chars: 0,
                explicit_regexes: 0,
                regex_groups: 0,
                ends_with_slash: false,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.template.is_empty()
    }

    /// The template as it was written.
    pub fn template(&self) -> &str {
        &self.inner.template
    }

    /// The template with explicit regexes and whitespace removed.
    pub fn normalized_template(&self) -> &str {
        &self.inner.normalized
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.inner.parts
    }

    pub fn pattern(&self) -> &PatternWithGroups {
        &self.inner.pattern
    }

    /// Variable names in order of occurrence, duplicates included.
    pub fn template_variables(&self) -> &[String] {
        &self.inner.variables
    }

    pub fn is_template_variable_present(&self, name: &str) -> bool {
        self.inner.variables.iter().any(|v| v == name)
    }

    pub fn number_of_template_variables(&self) -> usize {
        self.inner.variables.len()
    }

    pub fn number_of_explicit_regexes(&self) -> usize {
        self.inner.explicit_regexes
    }

    pub fn number_of_regex_groups(&self) -> usize {
        self.inner.regex_groups
    }

    /// Number of literal characters, template expressions excluded.
    pub fn number_of_explicit_characters(&self) -> usize {
        self.inner.literal_chars
    }

    pub fn ends_with_slash(&self) -> bool {
        self.inner.ends_with_slash
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match the whole of `uri`, binding each variable name to its value.
    ///
    /// Returns `None` when `uri` does not match or when a repeated variable
    /// would bind two different values.
    pub fn match_map(&self, uri: &str) -> Option<HashMap<String, String>> {
        let values = self.inner.pattern.match_map(uri, &self.inner.variables);
        trace!(template = self.template(), uri = uri, matched = values.is_some(), "Matched URI template");
        values
    }

    /// Match the whole of `uri`, returning one value per variable occurrence.
    pub fn match_values(&self, uri: &str) -> Option<Vec<String>> {
        self.inner.pattern.match_values(uri)
    }

    // ========================================================================
    // Expansion
    // ========================================================================

    /// Substitute values by name. Values are inserted as given, without
    /// encoding. A variable with no value expands to `""` and is dropped
    /// from a `{?a,b}` or `{;a,b}` list.
    pub fn create_uri<V: AsRef<str>>(&self, values: &HashMap<String, V>) -> String {
        let mut out = String::with_capacity(self.inner.template.len());
        let mut lookup = |name: &str| -> Result<Option<String>> {
            Ok(values.get(name).map(|v| v.as_ref().to_string()))
        };
        // The lookup never fails
        let _ = expand(&self.inner.parts, &mut out, false, &mut lookup);
        out
    }

    /// Substitute values by position. Each distinct name takes the next
    /// value; a repeated name reuses the value it was first given. Names
    /// left over once `values` runs out are treated as having no value.
    pub fn create_uri_positional<V: AsRef<str>>(&self, values: &[V]) -> String {
        let mut out = String::with_capacity(self.inner.template.len());
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut offset = 0;
        let mut lookup = |name: &str| -> Result<Option<String>> {
            if let Some(value) = seen.get(name) {
                return Ok(Some(value.clone()));
            }
            let Some(value) = values.get(offset).map(|v| v.as_ref().to_string()) else {
                return Ok(None);
            };
            offset += 1;
            seen.insert(name.to_string(), value.clone());
            Ok(Some(value))
        };
        let _ = expand(&self.inner.parts, &mut out, false, &mut lookup);
        out
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Order templates from most to least specific: more literal
    /// characters first, then more variables, then more explicit regexes,
    /// then by regex in descending order. The empty template sorts last.
    pub fn compare(a: &UriTemplate, b: &UriTemplate) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        b.number_of_explicit_characters()
            .cmp(&a.number_of_explicit_characters())
            .then_with(|| {
                b.number_of_template_variables()
                    .cmp(&a.number_of_template_variables())
            })
            .then_with(|| {
                b.number_of_explicit_regexes()
                    .cmp(&a.number_of_explicit_regexes())
            })
            .then_with(|| b.pattern().regex().cmp(a.pattern().regex()))
    }

    // ========================================================================
    // URI Construction
    // ========================================================================

    /// Build a URI from template components, substituting `values`.
    ///
    /// With `encode` set values are percent-encoded for their component;
    /// otherwise existing `%XX` escapes are kept and other characters are
    /// encoded. Path values are encoded as path segments (so `/` becomes
    /// `%2F`) when `encode_slash_in_path` is set. Scheme and port values
    /// are never fully encoded.
    ///
    /// # Errors
    ///
    /// Fails when a variable has no value or a component is not a valid
    /// template.
    pub fn create_uri_from_components(
        components: &UriComponents,
        values: TemplateValues<'_>,
        encode: bool,
        encode_slash_in_path: bool,
    ) -> Result<String> {
        let mut resolver = ComponentResolver {
            values,
            offset: 0,
            seen: HashMap::new(),
        };
        let mut out = String::new();

        if let Some(scheme) = &components.scheme {
            resolver.component(ComponentType::Scheme, scheme, false, &mut out)?;
            out.push(':');
        }

        let user_info = non_empty(&components.user_info);
        let host = non_empty(&components.host);
        let port = non_empty(&components.port);

        if user_info.is_some() || host.is_some() || port.is_some() {
            out.push_str("//");
            if let Some(user_info) = user_info {
                resolver.component(ComponentType::UserInfo, user_info, encode, &mut out)?;
                out.push('@');
            }
            if let Some(host) = host {
                resolver.component(ComponentType::Host, host, encode, &mut out)?;
            }
            if let Some(port) = port {
                out.push(':');
                resolver.component(ComponentType::Port, port, false, &mut out)?;
            }
        } else if let Some(authority) = non_empty(&components.authority) {
            out.push_str("//");
            resolver.component(ComponentType::Authority, authority, encode, &mut out)?;
        }

        let path = non_empty(&components.path);
        let query = non_empty(&components.query);
        let fragment = non_empty(&components.fragment);

        if path.is_some() || query.is_some() || fragment.is_some() {
            if !out.is_empty() && !path.is_some_and(|p| p.starts_with('/')) {
                out.push('/');
            }
            if let Some(path) = path {
                let component_type = if encode_slash_in_path {
                    ComponentType::PathSegment
                } else {
                    ComponentType::Path
                };
                resolver.component(component_type, path, encode, &mut out)?;
            }
            if let Some(query) = query {
                out.push('?');
                resolver.component(ComponentType::QueryParam, query, encode, &mut out)?;
            }
            if let Some(fragment) = fragment {
                out.push('#');
                resolver.component(ComponentType::Fragment, fragment, encode, &mut out)?;
            }
        }

        trace!(uri = out.as_str(), "Created URI from template components");
        Ok(out)
    }

    /// Substitute the variables of `template` that have a value in
    /// `values`, leaving the others as `{name}` expressions.
    ///
    /// A `{?a,b}` or `{;a,b}` expression is only expanded once every name
    /// in it has a value.
    pub fn resolve_template_values(
        component_type: ComponentType,
        template: &str,
        encode: bool,
        values: &HashMap<String, String>,
    ) -> Result<String> {
        if !template.contains('{') {
            return Ok(template.to_string());
        }

        let parsed = TemplateParser::parse(template)?;
        let mut out = String::with_capacity(template.len());
        let mut lookup = |name: &str| -> Result<Option<String>> {
            Ok(values
                .get(name)
                .map(|value| encode_value(value, component_type, encode)))
        };
        expand(&parsed.parts, &mut out, true, &mut lookup)?;
        Ok(out)
    }

    /// Remove `.` and `..` segments from the path of `uri`.
    pub fn normalize(uri: &str) -> Result<String> {
        reference::normalize(uri)
    }

    /// Resolve a reference against a base URI (RFC 3986 section 5.2).
    pub fn resolve(base: &str, reference: &str) -> Result<String> {
        reference::resolve(base, reference)
    }

    /// Express `uri` relative to `base` when `base` is a prefix of it.
    pub fn relativize(base: &str, uri: &str) -> Result<String> {
        reference::relativize(base, uri)
    }
}

impl Default for UriTemplate {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for UriTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.inner.template == other.inner.template
    }
}

impl Eq for UriTemplate {}

impl fmt::Debug for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriTemplate")
            .field("template", &self.inner.template)
            .field("pattern", &self.inner.pattern)
            .finish()
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.template)
    }
}

// ============================================================================
// Value Resolution
// ============================================================================

/// Values supplied to [`UriTemplate::create_uri_from_components`].
#[derive(Debug, Clone, Copy)]
pub enum TemplateValues<'a> {
    /// Distinct names take values in order of first appearance
    Positional(&'a [String]),
    Named(&'a HashMap<String, String>),
}

struct ComponentResolver<'a> {
    values: TemplateValues<'a>,
    offset: usize,
    seen: HashMap<String, String>,
}

impl ComponentResolver<'_> {
    fn value_for(&mut self, name: &str) -> Result<String> {
        match self.values {
            TemplateValues::Named(values) => values.get(name).cloned(),
            TemplateValues::Positional(values) => match self.seen.get(name) {
                Some(value) => Some(value.clone()),
                None => {
                    let value = values.get(self.offset).cloned();
                    if let Some(value) = &value {
                        self.offset += 1;
                        self.seen.insert(name.to_string(), value.clone());
                    }
                    value
                }
            },
        }
        .ok_or_else(|| UriError::MissingValue(name.to_string()))
    }

    fn component(
        &mut self,
        component_type: ComponentType,
        template: &str,
        encode: bool,
        out: &mut String,
    ) -> Result<()> {
        if !template.contains('{') {
            out.push_str(template);
            return Ok(());
        }

        let parsed = TemplateParser::parse(template)?;
        let mut lookup = |name: &str| -> Result<Option<String>> {
            let value = self.value_for(name)?;
            Ok(Some(encode_value(&value, component_type, encode)))
        };
        expand(&parsed.parts, out, false, &mut lookup)
    }
}

fn encode_value(value: &str, component_type: ComponentType, encode: bool) -> String {
    if encode {
        component::encode(value, component_type)
    } else {
        component::contextual_encode(value, component_type)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Write `parts` to `out`, asking `lookup` for each variable.
///
/// `lookup` returning `Ok(None)` leaves the variable unresolved: with
/// `keep_unresolved` it is written back as `{name}`, otherwise it expands
/// to nothing, and inside a `{?a,b}` list the parameter is dropped.
fn expand(
    parts: &[TemplatePart],
    out: &mut String,
    keep_unresolved: bool,
    lookup: &mut dyn FnMut(&str) -> Result<Option<String>>,
) -> Result<()> {
    for part in parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Variable { name, .. } => match lookup(name)? {
                Some(value) => out.push_str(&value),
                None if keep_unresolved => out.push_str(&part.normalized()),
                None => {}
            },
            TemplatePart::Params { kind, names } => {
                let mut resolved = Vec::with_capacity(names.len());
                for name in names {
                    resolved.push((name, lookup(name)?));
                }

                if keep_unresolved && resolved.iter().any(|(_, value)| value.is_none()) {
                    out.push_str(&part.normalized());
                    continue;
                }

                let index = out.len();
                for (name, value) in resolved {
                    let Some(value) = value else { continue };
                    if out.len() != index {
                        out.push(kind.separator());
                    }
                    out.push_str(name);
                    if value.is_empty() {
                        out.push_str(kind.empty_assignment());
                    } else {
                        out.push('=');
                        out.push_str(&value);
                    }
                }
                if out.len() != index && !out[..index].ends_with(kind.prefix()) {
                    out.insert(index, kind.prefix());
                }
            }
        }
    }
    Ok(())
}
