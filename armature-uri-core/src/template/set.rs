// Ordered collection of templates for first-match dispatch

use super::UriTemplate;
use crate::error::Result;
use crate::logging::debug;
use std::collections::HashMap;

/// Templates kept in [`UriTemplate::compare`] order, so the first template
/// that matches a URI is the most specific one.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<UriTemplate>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template at its sorted position. Templates that compare
    /// equal keep insertion order.
    pub fn insert(&mut self, template: UriTemplate) {
        let index = self
            .templates
            .partition_point(|t| UriTemplate::compare(t, &template).is_le());
        self.templates.insert(index, template);
    }

    /// Compile and insert a template.
    pub fn add(&mut self, template: &str) -> Result<()> {
        self.insert(UriTemplate::new(template)?);
        Ok(())
    }

    /// Find the most specific template matching `uri`.
    pub fn match_first(&self, uri: &str) -> Option<(&UriTemplate, HashMap<String, String>)> {
        let found = self
            .templates
            .iter()
            .find_map(|t| t.match_map(uri).map(|values| (t, values)));
        if let Some((template, _)) = &found {
            debug!(uri = uri, template = template.template(), "Matched template set");
        }
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = &UriTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<UriTemplate> for TemplateSet {
    fn from_iter<I: IntoIterator<Item = UriTemplate>>(iter: I) -> Self {
        let mut set = TemplateSet::new();
        for template in iter {
            set.insert(template);
        }
        set
    }
}
