//! Entry points layered over the engine
//!
//! [`InputValidator`] handles form input one field at a time: raw values are
//! turned into trimmed text, validated, and recorded into a changeset.
//! [`ResponseValidator`] validates structured payloads as they are.

mod input;
mod response;

pub use input::{InputField, InputValidator};
pub use response::ResponseValidator;
