use std::path::Path;

use derive_more::Deref;
use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::Delimiters;
use crate::HertplError;
use crate::HertplResult;
use crate::Position;
use crate::TemplateSettings;
use crate::attributes::find_attribute;
use crate::attributes::replace_attributes;
use crate::attributes::split_quoted;
use crate::lexer::replace_dependency_calls;
use crate::lexer::tokenize;
use crate::resolver::PathResolver;
use crate::resolver::content_hash;
use crate::tags::ScanMode;
use crate::tags::TagScanner;
use crate::tags::filter_block;
use crate::tags::filter_tag;
use crate::tokens::DependencyGroup;
use crate::tokens::ScriptToken;

const SCRIPT_TAG: &str = "script";
const DEFINE_TAG: &str = "define";
const FUNCTION_TAG: &str = "function";
const WIDGET_TAG: &str = "widget";
/// Suffix of the generated name when no `method` is given.
const MAIN_METHOD: &str = "__main";

/// Template tags whose path attribute is expanded into a module id.
pub const PATH_ATTRIBUTES: [(&str, &str); 3] =
	[("html", "her"), ("require", "name"), ("widget", "name")];

/// Paths in first-discovery order. Inserting a path twice keeps the first
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize)]
pub struct PathSet(
	#[deref]
	IndexSet<String>,
);

impl PathSet {
	pub fn insert(&mut self, path: impl Into<String>) -> bool {
		self.0.insert(path.into())
	}

	/// `[a,b,c]`
	pub fn to_array_literal(&self) -> String {
		let paths: Vec<&str> = self.0.iter().map(String::as_str).collect();
		format!("[{}]", paths.join(","))
	}
}

/// Dependencies of a single script block, split by how they load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependencies {
	pub sync: PathSet,
	pub r#async: PathSet,
}

impl Dependencies {
	pub fn group_mut(&mut self, group: DependencyGroup) -> &mut PathSet {
		match group {
			DependencyGroup::Sync => &mut self.sync,
			DependencyGroup::Async => &mut self.r#async,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.sync.is_empty() && self.r#async.is_empty()
	}

	/// ` sync=[...] async=[...]`, appended to a script tag's attributes.
	pub fn to_attributes(&self) -> String {
		format!(
			" sync={} async={}",
			self.sync.to_array_literal(),
			self.r#async.to_array_literal()
		)
	}
}

/// Dependencies found in one script block, with the block's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDependencies {
	pub position: Position,
	pub dependencies: Dependencies,
}

/// Collect the paths of every dependency call in `script`. Paths are kept
/// exactly as written, quotes included.
pub fn collect_dependencies(script: &str) -> Dependencies {
	let mut dependencies = Dependencies::default();

	for token in tokenize(script) {
		let ScriptToken::DependencyCall(call) = token else {
			continue;
		};

		let group = dependencies.group_mut(call.kind.group());
		for path in &call.paths {
			if group.insert(path.text.trim()) {
				debug!(path = path.text, kind = %call.kind, "found dependency");
			}
		}
	}

	dependencies
}

/// The dependencies of every script block in a document.
pub fn scan_script_dependencies(
	content: &str,
	delimiters: &Delimiters,
) -> HertplResult<Vec<ScriptDependencies>> {
	TagScanner::new(content, SCRIPT_TAG, delimiters, ScanMode::Block)
		.map(|tag| {
			let tag = tag?;
			Ok(ScriptDependencies {
				position: tag.position(),
				dependencies: collect_dependencies(tag.inner_text().unwrap_or_default()),
			})
		})
		.collect()
}

/// Turn `<script runat="server">...</script>` into a template script block.
/// Script tags without `runat="server"` are left alone.
pub fn replace_script_tag(content: &str, delimiters: &Delimiters) -> HertplResult<String> {
	let html = Delimiters::html();

	filter_block(content, SCRIPT_TAG, &html, |tag| {
		let attributes = tag.attr_text();
		let runat = find_attribute(attributes, "runat")
			.filter(|runat| runat.quoted().body == "server" && !runat.quoted().quote.is_empty());

		let Some(runat) = runat else {
			return Ok(tag.outer_text().to_string());
		};

		let attributes = format!(
			"{}{}",
			&attributes[..runat.full.start],
			&attributes[runat.full.end..]
		);

		Ok(delimiters.block(
			SCRIPT_TAG,
			&attributes,
			tag.inner_text().unwrap_or_default(),
		))
	})
}

/// Expand every relative path in the document into a module id: the path
/// attributes of [`PATH_ATTRIBUTES`] tags and every dependency call inside
/// script blocks.
pub fn expand_path(
	content: &str,
	dirname: &Path,
	delimiters: &Delimiters,
	resolver: &dyn PathResolver,
) -> HertplResult<String> {
	let mut content = content.to_string();

	for (tag, attribute) in PATH_ATTRIBUTES {
		content = expand_tag_path_attribute(&content, tag, attribute, dirname, delimiters, resolver)?;
	}

	expand_script_requires(&content, dirname, delimiters, resolver)
}

/// Resolve the value of `attribute` on every `tag`, keeping its quotes.
pub fn expand_tag_path_attribute(
	content: &str,
	tag: &str,
	attribute: &str,
	dirname: &Path,
	delimiters: &Delimiters,
	resolver: &dyn PathResolver,
) -> HertplResult<String> {
	filter_tag(content, tag, delimiters, |found| {
		let attributes = replace_attributes(found.attr_text(), attribute, |path| {
			let value = path.quoted();
			let id = resolver.resolve(value.body, dirname)?;
			Ok(format!("{}{}", path.prefix_text(), value.requote(&id)))
		})?;

		Ok(delimiters.tag(tag, &attributes))
	})
}

/// Resolve the paths of every dependency call inside script blocks. String
/// literals and comments are left untouched.
pub fn expand_script_requires(
	content: &str,
	dirname: &Path,
	delimiters: &Delimiters,
	resolver: &dyn PathResolver,
) -> HertplResult<String> {
	let resolve = |literal: &str| -> HertplResult<String> {
		let value = split_quoted(literal);
		let id = resolver.resolve(value.body, dirname)?;
		Ok(value.requote(&id))
	};

	filter_block(content, SCRIPT_TAG, delimiters, |tag| {
		let inner = replace_dependency_calls(tag.inner_text().unwrap_or_default(), |call| {
			if call.bracketed {
				let ids = call
					.paths
					.iter()
					.map(|path| resolve(path.text))
					.collect::<HertplResult<Vec<_>>>()?;
				Ok(format!("{}[{}]", call.prefix, ids.join(",")))
			} else {
				let path = call.paths.first().map_or(call.arguments, |path| path.text);
				Ok(format!("{}{}", call.prefix, resolve(path)?))
			}
		})?;

		Ok(delimiters.block(SCRIPT_TAG, tag.attr_text(), &inner))
	})
}

/// Append the `sync` and `async` dependency lists of each script block to
/// its attributes. The script content is not modified.
pub fn analyse_script(content: &str, delimiters: &Delimiters) -> HertplResult<String> {
	filter_block(content, SCRIPT_TAG, delimiters, |tag| {
		let inner = tag.inner_text().unwrap_or_default();
		let dependencies = collect_dependencies(inner);
		let attributes = format!("{}{}", tag.attr_text(), dependencies.to_attributes());

		Ok(delimiters.block(SCRIPT_TAG, &attributes, inner))
	})
}

/// Turn `define` blocks into `function` blocks with generated names, and
/// point `widget` tags at those names.
///
/// A define block in the file with id `id` is named `C + hash(id) + C` plus
/// its `method` (or `__main`), where `C` is the connector. A widget with
/// `name="x"` calls `C + hash(x) + C` plus its `method` (or `__main`).
pub fn define_widget(
	content: &str,
	file_id: &str,
	settings: &TemplateSettings,
) -> HertplResult<String> {
	let delimiters = &settings.delimiters;
	let define_name = generated_name(file_id, settings);

	let content = filter_block(content, DEFINE_TAG, delimiters, |tag| {
		let attributes = tag.attr_text();

		let attributes = match find_attribute(attributes, "method") {
			Some(method) => {
				let value = method.quoted();
				format!(
					"{}name{}{}{}",
					&attributes[..method.name.start],
					method.assignment_text(),
					value.requote(&format!("{define_name}{}", value.body)),
					&attributes[method.value.end..]
				)
			}
			None => format!("{attributes} name='{define_name}{MAIN_METHOD}'"),
		};

		Ok(delimiters.block(
			FUNCTION_TAG,
			&attributes,
			tag.inner_text().unwrap_or_default(),
		))
	})?;

	filter_tag(&content, WIDGET_TAG, delimiters, |tag| {
		let attributes = tag.attr_text();

		let Some(name) = find_attribute(attributes, "name") else {
			return Err(HertplError::MissingRequiredAttribute {
				tag: WIDGET_TAG,
				attribute: "name",
			});
		};

		let widget_name = generated_name(name.quoted().body, settings);

		let attributes = match find_attribute(attributes, "method") {
			Some(method) => {
				let value = method.quoted();
				format!(
					"{}{}{}",
					&attributes[..method.prefix.end],
					value.requote(&format!("{widget_name}{}", value.body)),
					&attributes[method.value.end..]
				)
			}
			None => format!("{attributes} method='{widget_name}{MAIN_METHOD}'"),
		};

		Ok(delimiters.tag(WIDGET_TAG, &attributes))
	})
}

fn generated_name(identifier: &str, settings: &TemplateSettings) -> String {
	let connector = &settings.connector;
	format!(
		"{connector}{}{connector}",
		content_hash(identifier, settings.hash_length)
	)
}
