//! Template compiler
//!
//! Turns a URI template such as `/users/{id: \d+}/items{?sort,limit}` into a
//! regular expression with one capturing group per template variable, the
//! ordered variable names and a normalized form of the template.

use crate::error::{Result, UriError};
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

/// Pattern used for `{name}` when no explicit regex is given.
pub const TEMPLATE_VALUE_PATTERN: &str = "[^/]+";

/// The list form of a `{?a,b}` or `{;a,b}` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `{?a,b}` expands to `?a=x&b=y`
    Query,
    /// `{;a,b}` expands to `;a=x;b=y`
    Matrix,
}

impl ParamKind {
    pub fn prefix(self) -> char {
        match self {
            ParamKind::Query => '?',
            ParamKind::Matrix => ';',
        }
    }

    pub fn separator(self) -> char {
        match self {
            ParamKind::Query => '&',
            ParamKind::Matrix => ';',
        }
    }

    /// Text written for a parameter whose value is empty.
    pub fn empty_assignment(self) -> &'static str {
        match self {
            ParamKind::Query => "=",
            ParamKind::Matrix => "",
        }
    }

    fn value_class(self) -> &'static str {
        match self {
            ParamKind::Query => "[^&]",
            ParamKind::Matrix => "[^;/?]",
        }
    }
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Variable { name: String, regex: Option<String> },
    Params { kind: ParamKind, names: Vec<String> },
}

impl TemplatePart {
    /// The normalized text of this part: literals as written, variables as
    /// `{name}` and parameter lists as `{?a,b}`.
    pub fn normalized(&self) -> String {
        match self {
            TemplatePart::Literal(text) => text.clone(),
            TemplatePart::Variable { name, .. } => format!("{{{}}}", name),
            TemplatePart::Params { kind, names } => {
                format!("{{{}{}}}", kind.prefix(), names.join(","))
            }
        }
    }
}

/// The result of compiling a template.
#[derive(Debug, Clone)]
pub struct ParsedTemplate {
    pub template: String,
    pub normalized: String,
    pub parts: Vec<TemplatePart>,
    /// Unanchored regular expression matching the template
    pub regex: String,
    /// Variable names in order of occurrence, duplicates included
    pub names: Vec<String>,
    /// Capturing group of each entry in `names`
    pub group_indexes: SmallVec<[usize; 4]>,
    pub regex_groups: usize,
    pub literal_chars: usize,
    pub explicit_regexes: usize,
}

/// Single-pass template parser.
pub struct TemplateParser<'a> {
    template: &'a str,
    chars: Peekable<CharIndices<'a>>,
    parts: Vec<TemplatePart>,
    literal: String,
    regex: String,
    names: Vec<String>,
    group_indexes: SmallVec<[usize; 4]>,
    groups: usize,
    name_to_pattern: HashMap<String, String>,
    literal_chars: usize,
    explicit_regexes: usize,
}

impl<'a> TemplateParser<'a> {
    /// Compile `template`.
    ///
    /// # Errors
    ///
    /// Fails for an empty template, unbalanced braces, an empty or illegal
    /// variable name, a variable declared twice with different regexes, or
    /// a regex that does not compile.
    pub fn parse(template: &'a str) -> Result<ParsedTemplate> {
        if template.is_empty() {
            return Err(UriError::syntax(template, 0, "template is empty"));
        }

        let mut parser = TemplateParser {
            template,
            chars: template.char_indices().peekable(),
            parts: Vec::new(),
            literal: String::new(),
            regex: String::with_capacity(template.len() * 2),
            names: Vec::new(),
            group_indexes: SmallVec::new(),
            groups: 0,
            name_to_pattern: HashMap::new(),
            literal_chars: 0,
            explicit_regexes: 0,
        };

        while let Some((pos, c)) = parser.chars.next() {
            match c {
                '{' => {
                    parser.flush_literal();
                    parser.parse_expression(pos)?;
                }
                '}' => {
                    return Err(UriError::syntax(
                        template,
                        pos,
                        "unbalanced '}' outside of a template variable",
                    ));
                }
                _ => parser.literal_char(pos, c),
            }
        }
        parser.flush_literal();

        let normalized = parser.parts.iter().map(TemplatePart::normalized).collect();

        Ok(ParsedTemplate {
            template: template.to_string(),
            normalized,
            parts: parser.parts,
            regex: parser.regex,
            names: parser.names,
            group_indexes: parser.group_indexes,
            regex_groups: parser.groups,
            literal_chars: parser.literal_chars,
            explicit_regexes: parser.explicit_regexes,
        })
    }

    fn error(&self, position: usize, message: impl Into<String>) -> UriError {
        UriError::syntax(self.template, position, message)
    }

    // ========================================================================
    // Literals
    // ========================================================================

    fn literal_char(&mut self, pos: usize, c: char) {
        let bytes = self.template.as_bytes();
        if c == '%'
            && pos + 2 < bytes.len()
            && bytes[pos + 1].is_ascii_hexdigit()
            && bytes[pos + 2].is_ascii_hexdigit()
        {
            // An escaped octet matches in either hex case
            self.regex.push('%');
            for &hex in &bytes[pos + 1..pos + 3] {
                let hex = hex as char;
                if hex.is_ascii_digit() {
                    self.regex.push(hex);
                } else {
                    self.regex.push('[');
                    self.regex.push(hex.to_ascii_lowercase());
                    self.regex.push(hex.to_ascii_uppercase());
                    self.regex.push(']');
                }
            }
            self.literal.push_str(&self.template[pos..pos + 3]);
            self.chars.next();
            self.chars.next();
            self.literal_chars += 3;
            return;
        }

        let mut buf = [0u8; 4];
        self.regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        self.literal.push(c);
        self.literal_chars += 1;
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.parts
                .push(TemplatePart::Literal(std::mem::take(&mut self.literal)));
        }
    }

    // ========================================================================
    // Template Expressions
    // ========================================================================

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn next_in_expression(&mut self, start: usize) -> Result<(usize, char)> {
        self.chars
            .next()
            .ok_or_else(|| self.error(start, "unterminated template variable"))
    }

    fn parse_expression(&mut self, start: usize) -> Result<()> {
        self.skip_whitespace();

        let kind = match self.chars.peek() {
            Some((_, '?')) => Some(ParamKind::Query),
            Some((_, ';')) => Some(ParamKind::Matrix),
            _ => None,
        };
        if kind.is_some() {
            self.chars.next();
        }

        let mut names: Vec<String> = Vec::new();
        let mut name = String::new();
        let mut regex = None;

        loop {
            let (pos, c) = self.next_in_expression(start)?;

            if name.is_empty() {
                match c {
                    c if c.is_whitespace() => continue,
                    c if c.is_alphanumeric() || c == '_' => name.push(c),
                    '}' | ',' | ':' => {
                        return Err(self.error(pos, "empty template variable name"));
                    }
                    c => {
                        return Err(self.error(
                            pos,
                            format!("illegal character '{}' at the start of a template variable name", c),
                        ));
                    }
                }
                continue;
            }

            let c = if c.is_whitespace() {
                self.skip_whitespace();
                let (pos, c) = self.next_in_expression(start)?;
                if !matches!(c, '}' | ':' | ',') {
                    return Err(self.error(
                        pos,
                        format!("illegal character '{}' after template variable name", c),
                    ));
                }
                c
            } else {
                c
            };

            match c {
                c if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') => name.push(c),
                ',' if kind.is_some() => names.push(std::mem::take(&mut name)),
                ':' if kind.is_none() => {
                    regex = Some(self.parse_regex(start)?);
                    break;
                }
                '}' => break,
                c => {
                    return Err(self.error(
                        pos,
                        format!("illegal character '{}' in template variable name", c),
                    ));
                }
            }
        }

        match kind {
            Some(kind) => {
                names.push(name);
                self.add_params(kind, names);
                Ok(())
            }
            None => self.add_variable(start, name, regex),
        }
    }

    fn parse_regex(&mut self, start: usize) -> Result<String> {
        let mut regex = String::new();
        let mut depth = 0usize;

        loop {
            let (_, c) = self.next_in_expression(start)?;
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => break,
                '}' => depth -= 1,
                _ => {}
            }
            regex.push(c);
        }

        Ok(regex.trim().to_string())
    }

    fn add_variable(&mut self, start: usize, name: String, regex: Option<String>) -> Result<()> {
        let explicit = regex.filter(|r| !r.is_empty());
        let pattern = explicit.as_deref().unwrap_or(TEMPLATE_VALUE_PATTERN).to_string();

        match self.name_to_pattern.get(&name) {
            Some(existing) if *existing != pattern => {
                return Err(self.error(
                    start,
                    format!(
                        "the template variable '{}' is declared more than once with different regular expressions",
                        name
                    ),
                ));
            }
            Some(_) => {}
            None => {
                self.name_to_pattern.insert(name.clone(), pattern.clone());
            }
        }

        let nested_groups = if explicit.is_some() {
            self.explicit_regexes += 1;
            Regex::new(&pattern)?.captures_len() - 1
        } else {
            0
        };

        self.groups += 1;
        self.group_indexes.push(self.groups);
        self.groups += nested_groups;

        self.regex.push('(');
        self.regex.push_str(&pattern);
        self.regex.push(')');

        self.names.push(name.clone());
        self.parts.push(TemplatePart::Variable {
            name,
            regex: explicit,
        });
        Ok(())
    }

    fn add_params(&mut self, kind: ParamKind, names: Vec<String>) {
        let mut buf = [0u8; 4];
        self.regex
            .push_str(&regex::escape(kind.prefix().encode_utf8(&mut buf)));

        for name in &names {
            let separator = regex::escape(kind.separator().encode_utf8(&mut buf));
            self.regex.push_str(&format!(
                "(?:{}?{}(?:=({}*))?)?",
                separator,
                regex::escape(name),
                kind.value_class()
            ));
            self.groups += 1;
            self.group_indexes.push(self.groups);
            self.names.push(name.clone());
        }

        self.parts.push(TemplatePart::Params { kind, names });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(template: &str) -> ParsedTemplate {
        TemplateParser::parse(template).unwrap()
    }

    #[test]
    fn test_plain_literal() {
        let parsed = parse("/a/b");
        assert_eq!(parsed.regex, "/a/b");
        assert!(parsed.names.is_empty());
        assert_eq!(parsed.literal_chars, 4);
        assert_eq!(parsed.normalized, "/a/b");
    }

    #[test]
    fn test_literal_escaping() {
        let parsed = parse("/a.b+c(d)");
        assert_eq!(parsed.regex, r"/a\.b\+c\(d\)");
    }

    #[test]
    fn test_escaped_octet_matches_any_case() {
        let parsed = parse("/a%2fb");
        assert_eq!(parsed.regex, "/a%2[fF]b");
        assert_eq!(parsed.normalized, "/a%2fb");
        assert_eq!(parsed.literal_chars, 6);
    }

    #[test]
    fn test_variables() {
        let parsed = parse("/{a}/{b}");
        assert_eq!(parsed.regex, "/([^/]+)/([^/]+)");
        assert_eq!(parsed.names, vec!["a", "b"]);
        assert_eq!(parsed.group_indexes.as_slice(), &[1, 2]);
        assert_eq!(parsed.literal_chars, 2);
        assert_eq!(parsed.explicit_regexes, 0);
    }

    #[test]
    fn test_explicit_regex_and_whitespace() {
        let parsed = parse("/{  par2 : \\d*  }/{ b }");
        assert_eq!(parsed.regex, "/(\\d*)/([^/]+)");
        assert_eq!(parsed.names, vec!["par2", "b"]);
        assert_eq!(parsed.normalized, "/{par2}/{b}");
        assert_eq!(parsed.explicit_regexes, 1);
    }

    #[test]
    fn test_empty_regex_uses_default() {
        let parsed = parse("{a:}");
        assert_eq!(parsed.regex, "([^/]+)");
        assert_eq!(parsed.explicit_regexes, 0);
    }

    #[test]
    fn test_regex_with_braces() {
        let parsed = parse("/{a: [0-9]{2,3}}/x");
        assert_eq!(parsed.regex, "/([0-9]{2,3})/x");
    }

    #[test]
    fn test_nested_groups_shift_indexes() {
        let parsed = parse("{a: (\\d)(\\d*)}-{b: (\\d)(\\d*)}-{c: (\\d)(\\d*)}");
        assert_eq!(parsed.group_indexes.as_slice(), &[1, 4, 7]);
        assert_eq!(parsed.regex_groups, 9);
    }

    #[test]
    fn test_name_characters() {
        let parsed = parse("/{a-b.c_d}");
        assert_eq!(parsed.names, vec!["a-b.c_d"]);
    }

    #[test]
    fn test_query_params_expression() {
        let parsed = parse("/test{?query,secondQuery}");
        assert_eq!(parsed.names, vec!["query", "secondQuery"]);
        assert_eq!(parsed.normalized, "/test{?query,secondQuery}");
        assert_eq!(
            parsed.parts[1],
            TemplatePart::Params {
                kind: ParamKind::Query,
                names: vec!["query".to_string(), "secondQuery".to_string()],
            }
        );
        assert_eq!(parsed.group_indexes.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_matrix_params_expression() {
        let parsed = parse("/a{;x, y}");
        assert_eq!(parsed.names, vec!["x", "y"]);
        assert_eq!(parsed.normalized, "/a{;x,y}");
    }

    #[test]
    fn test_duplicate_names() {
        let parsed = parse("/{a}/{a}");
        assert_eq!(parsed.names, vec!["a", "a"]);

        assert!(TemplateParser::parse("/{a}/{a: [^/]+}").is_ok());
        assert!(TemplateParser::parse("/{a}/{a: \\d+}").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        for template in ["", "{", "/{a", "/{a:", "/a}", "{}", "{ }", "/{-a}", "/{a b}", "/{a,b}", "/{?a:x}"] {
            let err = TemplateParser::parse(template).unwrap_err();
            assert!(err.is_template_error(), "expected error for {:?}", template);
        }
    }

    #[test]
    fn test_invalid_regex() {
        let err = TemplateParser::parse("/{a: (}").unwrap_err();
        assert!(matches!(err, UriError::InvalidTemplateRegex(_)));
    }
}
