use std::fmt::Display;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use sha2::Digest;
use sha2::Sha256;

use crate::HertplError;
use crate::HertplResult;

/// A canonical module identifier such as `home:widgets/nav`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref)]
pub struct ModuleId(
	#[deref]
	String,
);

impl ModuleId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl Display for ModuleId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Maps a raw path literal, relative to the directory of the file it was
/// written in, to a module identifier.
pub trait PathResolver {
	fn resolve(&self, raw: &str, base_dir: &Path) -> HertplResult<ModuleId>;
}

impl<F> PathResolver for F
where
	F: Fn(&str, &Path) -> String,
{
	fn resolve(&self, raw: &str, base_dir: &Path) -> HertplResult<ModuleId> {
		Ok(ModuleId::new(self(raw, base_dir)))
	}
}

/// Resolves paths against a project root.
///
/// - `./x` and `../x` are joined with the base directory.
/// - `/x` is taken from the project root.
/// - Anything else is already an id and is only namespaced.
#[derive(Debug, Clone)]
pub struct ProjectResolver {
	root: PathBuf,
	namespace: Option<String>,
}

impl ProjectResolver {
	pub fn new(root: impl Into<PathBuf>, namespace: Option<String>) -> Self {
		Self {
			root: normalize(&root.into()).unwrap_or_default(),
			namespace,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// The id of a file inside the project, e.g. `home:pages/index.tpl`.
	pub fn file_id(&self, path: &Path) -> HertplResult<ModuleId> {
		let absolute = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root.join(path)
		};

		let id = self.relative_id(&absolute, path, &self.root)?;
		Ok(self.namespaced(id))
	}

	fn relative_id(&self, joined: &Path, raw: &Path, base: &Path) -> HertplResult<String> {
		let unresolvable = || {
			HertplError::UnresolvablePath {
				path: raw.display().to_string(),
				base: base.display().to_string(),
			}
		};

		let normalized = normalize(joined).ok_or_else(unresolvable)?;
		let relative = normalized.strip_prefix(&self.root).map_err(|_| unresolvable())?;

		Ok(relative
			.components()
			.map(|component| component.as_os_str().to_string_lossy())
			.collect::<Vec<_>>()
			.join("/"))
	}

	fn namespaced(&self, id: String) -> ModuleId {
		match &self.namespace {
			Some(namespace) if !id.contains(':') => ModuleId::new(format!("{namespace}:{id}")),
			_ => ModuleId::new(id),
		}
	}
}

impl PathResolver for ProjectResolver {
	fn resolve(&self, raw: &str, base_dir: &Path) -> HertplResult<ModuleId> {
		let id = if raw.starts_with("./") || raw.starts_with("../") {
			self.relative_id(&self.root.join(base_dir).join(raw), Path::new(raw), base_dir)?
		} else if let Some(from_root) = raw.strip_prefix('/') {
			self.relative_id(&self.root.join(from_root), Path::new(raw), &self.root)?
		} else {
			raw.to_string()
		};

		tracing::trace!(raw, %id, "resolved path");

		Ok(self.namespaced(id))
	}
}

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// file system. Returns `None` when `..` climbs above the start of the path.
fn normalize(path: &Path) -> Option<PathBuf> {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !normalized.pop() {
					return None;
				}
			}
			other => normalized.push(other),
		}
	}

	Some(normalized)
}

/// Lowercase hex SHA-256 of `identifier`, truncated to `length` characters.
pub fn content_hash(identifier: &str, length: usize) -> String {
	let digest = Sha256::digest(identifier.as_bytes());
	let mut hex = format!("{digest:x}");
	hex.truncate(length.min(hex.len()));
	hex
}
