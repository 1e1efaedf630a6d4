use std::fmt::Debug;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::Delimiters;
use crate::HertplError;
use crate::HertplResult;
use crate::TemplateSettings;
use crate::resolver::PathResolver;
use crate::transforms::analyse_script;
use crate::transforms::define_widget;
use crate::transforms::expand_path;
use crate::transforms::replace_script_tag;

/// The contents of a document entering the pipeline.
pub enum Contents {
	/// A placeholder with no contents (a directory, a deleted file).
	Null,
	/// The whole document, in memory.
	Buffer(String),
	/// Contents that can only be read incrementally. Always rejected.
	Stream(Box<dyn Read + Send>),
}

impl Contents {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}
}

impl Debug for Contents {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Null => write!(f, "Null"),
			Self::Buffer(content) => f.debug_tuple("Buffer").field(content).finish(),
			Self::Stream(_) => write!(f, "Stream(..)"),
		}
	}
}

impl From<String> for Contents {
	fn from(content: String) -> Self {
		Self::Buffer(content)
	}
}

impl From<&str> for Contents {
	fn from(content: &str) -> Self {
		Self::Buffer(content.to_string())
	}
}

/// A template file on its way through the pipeline.
#[derive(Debug)]
pub struct Document {
	/// Path of the file, used for error messages and as the base for
	/// relative paths.
	pub path: PathBuf,
	/// Module id of the file, used to name its `define` blocks.
	pub id: String,
	pub contents: Contents,
}

impl Document {
	pub fn new(path: impl Into<PathBuf>, id: impl Into<String>, contents: impl Into<Contents>) -> Self {
		Self {
			path: path.into(),
			id: id.into(),
			contents: contents.into(),
		}
	}

	/// The directory relative paths in this document are resolved against.
	pub fn dirname(&self) -> &Path {
		self.path.parent().unwrap_or_else(|| Path::new(""))
	}

	/// The buffered contents, if any.
	pub fn text(&self) -> Option<&str> {
		match &self.contents {
			Contents::Buffer(content) => Some(content),
			Contents::Null | Contents::Stream(_) => None,
		}
	}
}

/// One rewrite applied to every document in the pipeline.
pub trait Stage: Send + Sync {
	fn name(&self) -> &'static str;
	fn transform(&self, content: &str, document: &Document) -> HertplResult<String>;
}

/// Raw `<script runat="server">` tags become template script blocks.
#[derive(Debug, Clone)]
pub struct ReplaceScriptTag {
	pub delimiters: Delimiters,
}

impl Stage for ReplaceScriptTag {
	fn name(&self) -> &'static str {
		StageKind::ReplaceScriptTag.name()
	}

	fn transform(&self, content: &str, _document: &Document) -> HertplResult<String> {
		replace_script_tag(content, &self.delimiters)
	}
}

/// Relative paths in tag attributes and dependency calls become module ids.
#[derive(Clone)]
pub struct ExpandPath {
	pub delimiters: Delimiters,
	pub resolver: Arc<dyn PathResolver + Send + Sync>,
}

impl Stage for ExpandPath {
	fn name(&self) -> &'static str {
		StageKind::ExpandPath.name()
	}

	fn transform(&self, content: &str, document: &Document) -> HertplResult<String> {
		expand_path(
			content,
			document.dirname(),
			&self.delimiters,
			self.resolver.as_ref(),
		)
	}
}

/// Script blocks get `sync` and `async` dependency attributes.
#[derive(Debug, Clone)]
pub struct AnalyseScript {
	pub delimiters: Delimiters,
}

impl Stage for AnalyseScript {
	fn name(&self) -> &'static str {
		StageKind::AnalyseScript.name()
	}

	fn transform(&self, content: &str, _document: &Document) -> HertplResult<String> {
		analyse_script(content, &self.delimiters)
	}
}

/// `define` blocks become named functions and widgets point at them.
#[derive(Debug, Clone)]
pub struct DefineWidget {
	pub settings: TemplateSettings,
}

impl Stage for DefineWidget {
	fn name(&self) -> &'static str {
		StageKind::DefineWidget.name()
	}

	fn transform(&self, content: &str, document: &Document) -> HertplResult<String> {
		define_widget(content, &document.id, &self.settings)
	}
}

/// The built-in stages, in the order the standard pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
	ReplaceScriptTag,
	ExpandPath,
	AnalyseScript,
	DefineWidget,
}

impl StageKind {
	pub const ALL: [StageKind; 4] = [
		StageKind::ReplaceScriptTag,
		StageKind::ExpandPath,
		StageKind::AnalyseScript,
		StageKind::DefineWidget,
	];

	pub fn name(self) -> &'static str {
		match self {
			Self::ReplaceScriptTag => "replace-script-tag",
			Self::ExpandPath => "expand-path",
			Self::AnalyseScript => "analyse-script",
			Self::DefineWidget => "define-widget",
		}
	}

	pub fn build(
		self,
		settings: &TemplateSettings,
		resolver: &Arc<dyn PathResolver + Send + Sync>,
	) -> Box<dyn Stage> {
		let delimiters = settings.delimiters.clone();

		match self {
			Self::ReplaceScriptTag => Box::new(ReplaceScriptTag { delimiters }),
			Self::ExpandPath => {
				Box::new(ExpandPath {
					delimiters,
					resolver: Arc::clone(resolver),
				})
			}
			Self::AnalyseScript => Box::new(AnalyseScript { delimiters }),
			Self::DefineWidget => {
				Box::new(DefineWidget {
					settings: settings.clone(),
				})
			}
		}
	}
}

/// An ordered list of stages. Holds no mutable state, so one pipeline can
/// process many documents, including from several threads.
#[derive(Default)]
pub struct Pipeline {
	stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
		self.stages.push(Box::new(stage));
		self
	}

	/// replace-script-tag, expand-path, analyse-script, define-widget.
	pub fn standard(
		settings: &TemplateSettings,
		resolver: Arc<dyn PathResolver + Send + Sync>,
	) -> Self {
		Self::from_stages(&StageKind::ALL, settings, resolver)
	}

	/// Only the given stages, in the given order.
	pub fn from_stages(
		kinds: &[StageKind],
		settings: &TemplateSettings,
		resolver: Arc<dyn PathResolver + Send + Sync>,
	) -> Self {
		Self {
			stages: kinds
				.iter()
				.map(|kind| kind.build(settings, &resolver))
				.collect(),
		}
	}

	pub fn stage_names(&self) -> Vec<&'static str> {
		self.stages.iter().map(|stage| stage.name()).collect()
	}

	/// Run every stage over the document. Documents without contents are
	/// returned untouched and streams are rejected. Errors carry the
	/// document's path.
	pub fn run(&self, mut document: Document) -> HertplResult<Document> {
		let path = document.path.display().to_string();

		let mut content = match std::mem::replace(&mut document.contents, Contents::Null) {
			Contents::Null => return Ok(document),
			Contents::Stream(_) => return Err(HertplError::StreamingUnsupported.in_file(path)),
			Contents::Buffer(content) => content,
		};

		for stage in &self.stages {
			debug!(stage = stage.name(), path = %path, "running stage");
			content = stage
				.transform(&content, &document)
				.map_err(|error| error.in_file(&path))?;
		}

		document.contents = Contents::Buffer(content);

		Ok(document)
	}
}
