use std::fmt::Display;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

/// A slice of script source together with its byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'a> {
	pub text: &'a str,
	pub span: Range<usize>,
}

/// Only the constructs that matter for dependency scanning are tokenized.
/// Everything else in the script is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptToken<'a> {
	/// `"..."` or `'...'`, quotes included. An unterminated literal that
	/// reaches the end of the input runs to the end.
	StringLiteral(Lexeme<'a>),
	/// `// ...` up to the line break, or `/* ... */`. An unterminated block
	/// comment runs to the end of the input.
	Comment(Lexeme<'a>),
	/// `require(...)`, `require.async(...)` or `require.defer(...)`.
	DependencyCall(DependencyCall<'a>),
}

impl ScriptToken<'_> {
	pub fn span(&self) -> Range<usize> {
		match self {
			Self::StringLiteral(lexeme) | Self::Comment(lexeme) => lexeme.span.clone(),
			Self::DependencyCall(call) => call.span.clone(),
		}
	}
}

/// The flavour of a `require` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequireKind {
	/// `require(...)`
	Require,
	/// `require.async(...)`
	Async,
	/// `require.defer(...)`
	Defer,
}

impl RequireKind {
	/// `require` loads synchronously; `.async` and `.defer` both load later.
	pub fn group(self) -> DependencyGroup {
		match self {
			Self::Require => DependencyGroup::Sync,
			Self::Async | Self::Defer => DependencyGroup::Async,
		}
	}
}

impl Display for RequireKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Require => write!(f, "require"),
			Self::Async => write!(f, "require.async"),
			Self::Defer => write!(f, "require.defer"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyGroup {
	Sync,
	Async,
}

/// A recognized dependency call.
///
/// ```text
/// require.async( ["a", 'b'] )
/// ^^^^^^^^^^^^^^^ prefix
///                ^^^^^^^^^^ arguments
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCall<'a> {
	/// From `require` up to the argument region, including the whitespace
	/// after the opening parenthesis.
	pub prefix: &'a str,
	pub kind: RequireKind,
	/// The single string literal or the bracketed list, as written.
	pub arguments: &'a str,
	/// Every path literal in the argument region, quotes included.
	pub paths: Vec<Lexeme<'a>>,
	/// Whether the arguments were written as an array.
	pub bracketed: bool,
	/// From the start of `require` to the end of the argument region. The
	/// closing parenthesis is not part of the call.
	pub span: Range<usize>,
}
