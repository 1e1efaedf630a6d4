//! `hertpl_core` preprocesses smarty style templates before they are
//! compiled. It finds delimiter-bound tags, tokenizes the scripts inside
//! them to discover their `require` dependencies, and rewrites documents
//! through a small pipeline of transforms.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template file
//!   → replace-script-tag  (<script runat="server"> becomes {script})
//!   → expand-path         (relative paths become module ids)
//!   → analyse-script      ({script} gains sync=[..] async=[..])
//!   → define-widget       ({define} becomes a named {function})
//! ```
//!
//! ## Modules
//!
//! - [`tags`] finds `{name ...}` tags and `{name}...{/name}` blocks.
//! - [`lexer`] tokenizes script text into strings, comments and dependency
//!   calls.
//! - [`attributes`] finds `name="value"` pairs in a tag's attribute text.
//! - [`resolver`] maps raw paths to module ids.
//! - [`transforms`] holds the four document rewrites.
//! - [`pipeline`] runs those rewrites over documents.
//! - [`config`] loads `hertpl.toml`.
//!
//! ## Quick Start
//!
//! ```rust
//! use hertpl_core::Delimiters;
//! use hertpl_core::transforms::analyse_script;
//!
//! let content = r#"{script}require("a"); require.async("b");{/script}"#;
//! let output = analyse_script(content, &Delimiters::default()).unwrap();
//!
//! assert_eq!(
//! 	output,
//! 	r#"{script sync=["a"] async=["b"]}require("a"); require.async("b");{/script}"#
//! );
//! ```

pub use config::*;
pub use error::*;
pub use position::*;

pub mod attributes;
pub mod config;
#[allow(unused_assignments)]
mod error;
pub mod lexer;
pub mod pipeline;
mod position;
pub mod resolver;
pub mod tags;
pub mod tokens;
pub mod transforms;

#[cfg(test)]
mod __fixtures;
