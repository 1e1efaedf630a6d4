use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum HertplError {
	#[error(transparent)]
	#[diagnostic(code(hertpl::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(hertpl::config_parse),
		help("check that hertpl.toml is valid TOML with [delimiters], [naming] and/or [resolve] sections")
	)]
	ConfigParse(String),

	#[error("the {0} delimiter must not be empty")]
	#[diagnostic(
		code(hertpl::empty_delimiter),
		help("set both `left` and `right` under [delimiters] in hertpl.toml")
	)]
	EmptyDelimiter(&'static str),

	#[error("unclosed block \"{preview}...\" opened on line {line} column {column}")]
	#[diagnostic(
		code(hertpl::unclosed_block_tag),
		help("add the matching closing tag; same-name blocks cannot be nested")
	)]
	UnclosedBlockTag {
		preview: String,
		line: usize,
		column: usize,
	},

	#[error("`{tag}` tag must define the `{attribute}` attribute")]
	#[diagnostic(code(hertpl::missing_required_attribute))]
	MissingRequiredAttribute {
		tag: &'static str,
		attribute: &'static str,
	},

	#[error("streaming input is not supported")]
	#[diagnostic(
		code(hertpl::streaming_unsupported),
		help("read the document into memory before running the pipeline")
	)]
	StreamingUnsupported,

	#[error("cannot resolve `{path}` from `{base}`: it escapes the project root")]
	#[diagnostic(code(hertpl::unresolvable_path))]
	UnresolvablePath { path: String, base: String },

	#[error("{path}: {source}")]
	#[diagnostic(code(hertpl::file))]
	InFile {
		path: String,
		#[source]
		source: Box<HertplError>,
	},
}

impl HertplError {
	/// Attach the identity of the file being processed.
	pub fn in_file(self, path: impl Into<String>) -> Self {
		match self {
			Self::InFile { .. } => self,
			other => {
				Self::InFile {
					path: path.into(),
					source: Box::new(other),
				}
			}
		}
	}

	/// The innermost error, skipping any file context.
	pub fn root_cause(&self) -> &HertplError {
		match self {
			Self::InFile { source, .. } => source.root_cause(),
			other => other,
		}
	}
}

pub type HertplResult<T> = Result<T, HertplError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
