// Error types for URI templates and builders

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UriError {
    #[error("Invalid template \"{template}\" at index {position}: {message}")]
    TemplateSyntax {
        template: String,
        position: usize,
        message: String,
    },

    #[error("Invalid regular expression in template: {0}")]
    InvalidTemplateRegex(#[from] regex::Error),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("The template variable, {0}, has no value")]
    MissingValue(String),

    #[error("Invalid percent-encoding: {0}")]
    InvalidEncoding(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl UriError {
    pub(crate) fn syntax(template: &str, position: usize, message: impl Into<String>) -> Self {
        UriError::TemplateSyntax {
            template: template.to_string(),
            position,
            message: message.into(),
        }
    }

    /// Returns true for errors caused by a malformed template.
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            UriError::TemplateSyntax { .. } | UriError::InvalidTemplateRegex(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, UriError>;
