// URI templates for the Armature framework
// Template compilation and matching, URI building, and RFC 3986 component encoding

pub mod builder;
pub mod cache;
pub mod component;
pub mod error;
pub mod logging;
pub mod multimap;
pub mod parser;
pub mod reference;
pub mod template;

// Re-export commonly used types
pub use builder::UriBuilder;
pub use cache::{TemplateCache, TemplateCacheStats};
pub use component::{ComponentType, PathSegment};
pub use error::{Result, UriError};
pub use multimap::{ParamMap, ParamValues};
pub use parser::{UriComponents, UriParser};
pub use template::{
    GroupMatch, PatternWithGroups, TemplatePart, TemplateSet, TemplateValues, UriTemplate,
};
