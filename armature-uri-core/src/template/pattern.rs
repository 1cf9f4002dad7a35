// Compiled regular expression with template-variable group mapping

use crate::error::Result;
use regex::{Captures, Regex};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// A regex whose capturing groups are addressed through a group index
/// table, so nested groups inside explicit template regexes are skipped.
///
/// The compiled regex is anchored at both ends; [`regex`](Self::regex)
/// returns the unanchored source.
#[derive(Clone)]
pub struct PatternWithGroups {
    regex: String,
    compiled: Option<Regex>,
    group_indexes: SmallVec<[usize; 4]>,
}

impl PatternWithGroups {
    /// The empty pattern, which only matches the empty string.
    pub const EMPTY: PatternWithGroups = PatternWithGroups {
        regex: String::new(),
        compiled: None,
        group_indexes: SmallVec::new_const(),
    };

    /// Compile `regex`, addressing every capturing group in order.
    pub fn new(regex: &str) -> Result<Self> {
        Self::with_group_indexes(regex, SmallVec::new())
    }

    /// Compile `regex`; group `i + 1` of a match maps to capturing group
    /// `group_indexes[i]`.
    pub fn with_group_indexes(regex: &str, group_indexes: SmallVec<[usize; 4]>) -> Result<Self> {
        if regex.is_empty() {
            return Ok(Self::EMPTY);
        }
        let compiled = Regex::new(&format!("^(?:{})$", regex))?;
        Ok(Self {
            regex: regex.to_string(),
            compiled: Some(compiled),
            group_indexes,
        })
    }

    pub fn regex(&self) -> &str {
        &self.regex
    }

    pub fn group_indexes(&self) -> &[usize] {
        &self.group_indexes
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_none()
    }

    fn captures<'h>(&self, input: &'h str) -> Option<Option<Captures<'h>>> {
        match &self.compiled {
            None if input.is_empty() => Some(None),
            None => None,
            Some(_) if input.is_empty() => None,
            Some(regex) => regex.captures(input).map(Some),
        }
    }

    fn mapped_groups(&self, captures: &Captures<'_>) -> SmallVec<[usize; 4]> {
        if self.group_indexes.is_empty() {
            (1..captures.len()).collect()
        } else {
            self.group_indexes.clone()
        }
    }

    /// Match the whole of `input`, returning the mapped groups.
    pub fn match_result<'h>(&self, input: &'h str) -> Option<GroupMatch<'h>> {
        let captures = self.captures(input)?;
        let groups = match &captures {
            Some(captures) => self.mapped_groups(captures),
            None => SmallVec::new(),
        };
        Some(GroupMatch {
            input,
            captures,
            groups,
        })
    }

    /// Match the whole of `input`, returning one value per mapped group.
    ///
    /// A group that did not take part in the match yields `""`.
    pub fn match_values(&self, input: &str) -> Option<Vec<String>> {
        let result = self.match_result(input)?;
        Some(
            (1..=result.group_count())
                .map(|i| result.group(i).unwrap_or_default().to_string())
                .collect(),
        )
    }

    /// Match the whole of `input`, binding each mapped group to the name at
    /// the same position in `names`.
    ///
    /// A name that occurs more than once must bind the same value each time.
    pub fn match_map(&self, input: &str, names: &[String]) -> Option<HashMap<String, String>> {
        let result = self.match_result(input)?;
        let mut values = HashMap::with_capacity(names.len());

        for (i, name) in names.iter().enumerate().take(result.group_count()) {
            let Some(value) = result.group(i + 1) else {
                continue;
            };
            match values.get(name) {
                Some(previous) if previous != value => return None,
                Some(_) => {}
                None => {
                    values.insert(name.clone(), value.to_string());
                }
            }
        }

        Some(values)
    }
}

impl PartialEq for PatternWithGroups {
    fn eq(&self, other: &Self) -> bool {
        self.regex == other.regex && self.group_indexes == other.group_indexes
    }
}

impl Eq for PatternWithGroups {}

impl fmt::Debug for PatternWithGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternWithGroups")
            .field("regex", &self.regex)
            .field("group_indexes", &self.group_indexes)
            .finish()
    }
}

impl fmt::Display for PatternWithGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.regex)
    }
}

/// A successful whole-input match of a [`PatternWithGroups`].
///
/// Group 0 is the whole input; group `i` is the `i`-th mapped group.
pub struct GroupMatch<'h> {
    input: &'h str,
    captures: Option<Captures<'h>>,
    groups: SmallVec<[usize; 4]>,
}

impl<'h> GroupMatch<'h> {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn span(&self, group: usize) -> Option<(usize, usize)> {
        if group == 0 {
            return Some((0, self.input.len()));
        }
        let index = *self.groups.get(group - 1)?;
        let m = self.captures.as_ref()?.get(index)?;
        Some((m.start(), m.end()))
    }

    pub fn group(&self, group: usize) -> Option<&'h str> {
        self.span(group).map(|(start, end)| &self.input[start..end])
    }

    pub fn start(&self, group: usize) -> Option<usize> {
        self.span(group).map(|(start, _)| start)
    }

    pub fn end(&self, group: usize) -> Option<usize> {
        self.span(group).map(|(_, end)| end)
    }

    /// The whole matched input.
    pub fn as_str(&self) -> &'h str {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_empty_pattern() {
        let pattern = PatternWithGroups::EMPTY;
        assert!(pattern.match_values("").is_some());
        assert!(pattern.match_values("/").is_none());
    }

    #[test]
    fn test_non_empty_pattern_rejects_empty_input() {
        let pattern = PatternWithGroups::new("/([^/]+)").unwrap();
        assert!(pattern.match_values("").is_none());
        assert_eq!(pattern.match_values("/one").unwrap(), vec!["one"]);
    }

    #[test]
    fn test_match_is_anchored() {
        let pattern = PatternWithGroups::new("/a").unwrap();
        assert!(pattern.match_result("/a").is_some());
        assert!(pattern.match_result("/a/b").is_none());
        assert!(pattern.match_result("x/a").is_none());
    }

    #[test]
    fn test_group_indexes_skip_nested_groups() {
        let pattern =
            PatternWithGroups::with_group_indexes("((\\d)(\\d*))-((\\d)(\\d*))", smallvec![1, 4]).unwrap();
        let result = pattern.match_result("12-34").unwrap();

        assert_eq!(result.group_count(), 2);
        assert_eq!(result.group(0), Some("12-34"));
        assert_eq!(result.group(1), Some("12"));
        assert_eq!(result.group(2), Some("34"));
        assert_eq!(result.start(2), Some(3));
        assert_eq!(result.end(2), Some(5));
    }

    #[test]
    fn test_match_map_requires_consistent_duplicates() {
        let pattern = PatternWithGroups::new("/([^/]+)/([^/]+)").unwrap();
        let names = vec!["a".to_string(), "a".to_string()];

        let values = pattern.match_map("/x/x", &names).unwrap();
        assert_eq!(values.get("a").map(String::as_str), Some("x"));
        assert!(pattern.match_map("/x/y", &names).is_none());
    }

    #[test]
    fn test_invalid_regex() {
        assert!(PatternWithGroups::new("(").is_err());
    }
}
