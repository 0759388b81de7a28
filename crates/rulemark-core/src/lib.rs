mod convert;
mod inline;
mod language;
mod samples;
mod sanitize;
mod scan;

pub use convert::transform;
pub use language::Language;
pub use sanitize::{sanitize_fragment, transform_sanitized};
