use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::HertplError;
use crate::HertplResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["hertpl.toml", ".hertpl.toml", ".config/hertpl.toml"];

pub const DEFAULT_LEFT_DELIMITER: &str = "{";
pub const DEFAULT_RIGHT_DELIMITER: &str = "}";
pub const DEFAULT_CONNECTOR: &str = "_";
/// Number of hex characters kept from a content hash when naming generated
/// functions.
pub const DEFAULT_HASH_LENGTH: usize = 32;

/// A left/right delimiter pair such as `{`/`}` or `<`/`>`. Both sides are
/// guaranteed to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
	left: String,
	right: String,
}

impl Delimiters {
	pub fn new(left: impl Into<String>, right: impl Into<String>) -> HertplResult<Self> {
		let left = left.into();
		let right = right.into();

		if left.is_empty() {
			return Err(HertplError::EmptyDelimiter("left"));
		}

		if right.is_empty() {
			return Err(HertplError::EmptyDelimiter("right"));
		}

		Ok(Self { left, right })
	}

	/// The `<`/`>` pair used for raw html tags.
	pub fn html() -> Self {
		Self {
			left: "<".to_string(),
			right: ">".to_string(),
		}
	}

	pub fn left(&self) -> &str {
		&self.left
	}

	pub fn right(&self) -> &str {
		&self.right
	}

	/// `left + name`, the prefix every opening tag starts with.
	pub fn open_tag(&self, name: &str) -> String {
		format!("{}{name}", self.left)
	}

	/// `left + "/" + name + right`.
	pub fn close_tag(&self, name: &str) -> String {
		format!("{}/{name}{}", self.left, self.right)
	}

	/// Rebuild an opening (or self-contained) tag from its name and raw
	/// attribute text.
	pub fn tag(&self, name: &str, attributes: &str) -> String {
		format!("{}{name}{attributes}{}", self.left, self.right)
	}

	/// Rebuild a block tag from its name, raw attribute text and inner content.
	pub fn block(&self, name: &str, attributes: &str, inner: &str) -> String {
		format!(
			"{}{inner}{}",
			self.tag(name, attributes),
			self.close_tag(name)
		)
	}
}

impl Default for Delimiters {
	fn default() -> Self {
		Self {
			left: DEFAULT_LEFT_DELIMITER.to_string(),
			right: DEFAULT_RIGHT_DELIMITER.to_string(),
		}
	}
}

/// Settings passed explicitly into every transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSettings {
	/// Delimiters of the template tags (`{script}`, `{widget}`, ...).
	pub delimiters: Delimiters,
	/// Joins the pieces of generated function names, e.g. `_<hash>_`.
	pub connector: String,
	/// Hex characters of the content hash used in generated names.
	pub hash_length: usize,
}

impl Default for TemplateSettings {
	fn default() -> Self {
		Self {
			delimiters: Delimiters::default(),
			connector: DEFAULT_CONNECTOR.to_string(),
			hash_length: DEFAULT_HASH_LENGTH,
		}
	}
}

/// Configuration loaded from a `hertpl.toml` file.
///
/// ```toml
/// [delimiters]
/// left = "{%"
/// right = "%}"
///
/// [naming]
/// connector = "_"
/// hash_length = 32
///
/// [resolve]
/// namespace = "home"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct HertplConfig {
	/// Delimiters of the template tags.
	#[serde(default)]
	pub delimiters: DelimiterConfig,
	/// Naming of generated `function` blocks and widget methods.
	#[serde(default)]
	pub naming: NamingConfig,
	/// Module id resolution.
	#[serde(default)]
	pub resolve: ResolveConfig,
}

#[derive(Debug, Deserialize)]
pub struct DelimiterConfig {
	#[serde(default = "default_left")]
	pub left: String,
	#[serde(default = "default_right")]
	pub right: String,
}

impl Default for DelimiterConfig {
	fn default() -> Self {
		Self {
			left: default_left(),
			right: default_right(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct NamingConfig {
	#[serde(default = "default_connector")]
	pub connector: String,
	#[serde(default = "default_hash_length")]
	pub hash_length: usize,
}

impl Default for NamingConfig {
	fn default() -> Self {
		Self {
			connector: default_connector(),
			hash_length: default_hash_length(),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveConfig {
	/// Prefix added to every resolved module id as `namespace:id`.
	#[serde(default)]
	pub namespace: Option<String>,
}

fn default_left() -> String {
	DEFAULT_LEFT_DELIMITER.to_string()
}

fn default_right() -> String {
	DEFAULT_RIGHT_DELIMITER.to_string()
}

fn default_connector() -> String {
	DEFAULT_CONNECTOR.to_string()
}

fn default_hash_length() -> usize {
	DEFAULT_HASH_LENGTH
}

impl HertplConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> HertplResult<Option<HertplConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;

		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Like [`HertplConfig::load`] but falls back to the built-in defaults.
	pub fn load_or_default(root: &Path) -> HertplResult<HertplConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn from_toml(content: &str) -> HertplResult<HertplConfig> {
		toml::from_str(content).map_err(|e| HertplError::ConfigParse(e.to_string()))
	}

	/// Validate the configured values and turn them into the settings the
	/// transforms expect.
	pub fn settings(&self) -> HertplResult<TemplateSettings> {
		Ok(TemplateSettings {
			delimiters: Delimiters::new(&self.delimiters.left, &self.delimiters.right)?,
			connector: self.naming.connector.clone(),
			hash_length: self.naming.hash_length,
		})
	}
}
