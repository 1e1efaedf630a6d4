use std::fmt::Display;

use memchr::memchr_iter;
use memchr::memrchr;
use serde::Deserialize;
use serde::Serialize;

/// A 1-indexed line and column within a source text. Columns count
/// characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
	pub line: usize,
	pub column: usize,
}

impl Position {
	pub fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}

	/// Convert a byte offset into a line/column pair by counting the newlines
	/// that precede it. Offsets past the end are clamped to the end of the
	/// text.
	pub fn from_offset(source: &str, offset: usize) -> Self {
		let mut offset = offset.min(source.len());
		while !source.is_char_boundary(offset) {
			offset -= 1;
		}

		let before = &source.as_bytes()[..offset];
		let line = memchr_iter(b'\n', before).count() + 1;
		let line_start = memrchr(b'\n', before).map_or(0, |index| index + 1);
		let column = source[line_start..offset].chars().count() + 1;

		Self { line, column }
	}
}

impl Display for Position {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}
