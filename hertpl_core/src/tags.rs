use std::ops::Range;

use memchr::memmem;
use tracing::trace;
use tracing::warn;

use crate::Delimiters;
use crate::HertplError;
use crate::HertplResult;
use crate::Position;

/// Number of characters of an unclosed opening tag shown in the error.
const PREVIEW_LENGTH: usize = 20;

/// Whether a tag stands alone or wraps content up to a closing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
	/// A self-contained tag, e.g. `{widget name="a"}`.
	NonBlock,
	/// A tag closed by `left + "/" + name + right`, e.g. `{script}...{/script}`.
	Block,
}

/// One occurrence of a tag. All ranges are byte offsets into the scanned
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch<'a> {
	source: &'a str,
	/// The whole tag including delimiters and, for blocks, the closing tag.
	pub outer: Range<usize>,
	/// The text between the tag name and the right delimiter of the opening
	/// tag.
	pub attr: Range<usize>,
	/// Block content between the opening and closing tags.
	pub inner: Option<Range<usize>>,
}

impl<'a> TagMatch<'a> {
	pub fn outer_text(&self) -> &'a str {
		&self.source[self.outer.clone()]
	}

	pub fn attr_text(&self) -> &'a str {
		&self.source[self.attr.clone()]
	}

	pub fn inner_text(&self) -> Option<&'a str> {
		self.inner.clone().map(|inner| &self.source[inner])
	}

	/// The full text this tag was found in.
	pub fn source(&self) -> &'a str {
		self.source
	}

	/// Line and column of the opening tag.
	pub fn position(&self) -> Position {
		Position::from_offset(self.source, self.outer.start)
	}
}

/// Iterator over the top-level occurrences of a single tag name, left to
/// right.
///
/// Closing tags are located by their literal text, so a block tag cannot
/// contain another block of the same name.
pub struct TagScanner<'a> {
	source: &'a str,
	delimiters: &'a Delimiters,
	mode: ScanMode,
	open_tag: String,
	close_tag: String,
	cursor: usize,
	finished: bool,
}

impl<'a> TagScanner<'a> {
	pub fn new(source: &'a str, name: &str, delimiters: &'a Delimiters, mode: ScanMode) -> Self {
		Self {
			source,
			delimiters,
			mode,
			open_tag: delimiters.open_tag(name),
			close_tag: delimiters.close_tag(name),
			cursor: 0,
			finished: false,
		}
	}

	/// Find the end of the attribute region that starts at `attr_start`.
	///
	/// Attribute values may embed one delimited expression, as in
	/// `{script src={$url}}`. When a left delimiter appears before the first
	/// right delimiter both are stepped over by one character, once. Deeper
	/// nesting is not resolved.
	fn close_attribute_region(&self, attr_start: usize) -> Option<usize> {
		let right_at = find(self.source, self.delimiters.right(), attr_start)?;
		let left_at = find(self.source, self.delimiters.left(), attr_start);

		match left_at {
			Some(left_at) if left_at < right_at => Some(next_char_boundary(self.source, right_at)),
			_ => Some(right_at),
		}
	}

	fn unclosed_error(&self, outer_start: usize) -> HertplError {
		let position = Position::from_offset(self.source, outer_start);
		let preview = self.source[outer_start..]
			.chars()
			.take(PREVIEW_LENGTH)
			.collect();

		HertplError::UnclosedBlockTag {
			preview,
			line: position.line,
			column: position.column,
		}
	}
}

impl<'a> Iterator for TagScanner<'a> {
	type Item = HertplResult<TagMatch<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}

		let right = self.delimiters.right();

		loop {
			let Some(outer_start) = find(self.source, &self.open_tag, self.cursor) else {
				self.finished = true;
				return None;
			};

			let attr_start = outer_start + self.open_tag.len();
			let rest = &self.source[attr_start..];

			let attr_end = if rest.starts_with(right) {
				attr_start
			} else if rest.chars().next().is_some_and(char::is_whitespace) {
				let Some(attr_end) = self.close_attribute_region(attr_start) else {
					self.finished = true;

					// Without a right delimiter a block cannot have its closing tag
					// either. A lone tag leaves the rest of the text untouched.
					if self.mode == ScanMode::Block {
						return Some(Err(self.unclosed_error(outer_start)));
					}

					warn!(
						tag = %self.open_tag,
						position = %Position::from_offset(self.source, outer_start),
						"opening tag is never closed"
					);
					return None;
				};
				attr_end
			} else {
				// `{scriptX}` is a different tag.
				self.cursor = attr_start;
				continue;
			};

			let open_end = ceil_char_boundary(self.source, attr_end + right.len());

			let (outer_end, inner) = match self.mode {
				ScanMode::NonBlock => (open_end, None),
				ScanMode::Block => {
					let Some(inner_end) = find(self.source, &self.close_tag, open_end) else {
						self.finished = true;
						return Some(Err(self.unclosed_error(outer_start)));
					};
					(inner_end + self.close_tag.len(), Some(open_end..inner_end))
				}
			};

			trace!(
				tag = %self.open_tag,
				start = outer_start,
				end = outer_end,
				"matched tag"
			);

			self.cursor = outer_end;

			return Some(Ok(TagMatch {
				source: self.source,
				outer: outer_start..outer_end,
				attr: attr_start..attr_end,
				inner,
			}));
		}
	}
}

/// Replace every top-level occurrence of the tag `name` with the output of
/// `on_match`. Text outside the matches is copied through unchanged.
///
/// Returning [`TagMatch::outer_text`] from `on_match` leaves the tag as it
/// was.
pub fn replace_tags<F>(
	source: &str,
	name: &str,
	delimiters: &Delimiters,
	mode: ScanMode,
	on_match: F,
) -> HertplResult<String>
where
	F: Fn(&TagMatch<'_>) -> HertplResult<String>,
{
	let mut output = String::with_capacity(source.len());
	let mut last_end = 0;

	for tag in TagScanner::new(source, name, delimiters, mode) {
		let tag = tag?;
		output.push_str(&source[last_end..tag.outer.start]);
		output.push_str(&on_match(&tag)?);
		last_end = tag.outer.end;
	}

	output.push_str(&source[last_end..]);

	Ok(output)
}

/// [`replace_tags`] for self-contained tags.
pub fn filter_tag<F>(
	source: &str,
	name: &str,
	delimiters: &Delimiters,
	on_match: F,
) -> HertplResult<String>
where
	F: Fn(&TagMatch<'_>) -> HertplResult<String>,
{
	replace_tags(source, name, delimiters, ScanMode::NonBlock, on_match)
}

/// [`replace_tags`] for block tags.
pub fn filter_block<F>(
	source: &str,
	name: &str,
	delimiters: &Delimiters,
	on_match: F,
) -> HertplResult<String>
where
	F: Fn(&TagMatch<'_>) -> HertplResult<String>,
{
	replace_tags(source, name, delimiters, ScanMode::Block, on_match)
}

fn find(haystack: &str, needle: &str, from: usize) -> Option<usize> {
	memmem::find(&haystack.as_bytes()[from..], needle.as_bytes()).map(|offset| from + offset)
}

/// The offset just after the character that starts at `index`.
fn next_char_boundary(text: &str, index: usize) -> usize {
	text[index..]
		.chars()
		.next()
		.map_or(text.len(), |ch| index + ch.len_utf8())
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
	let mut index = index.min(text.len());
	while !text.is_char_boundary(index) {
		index += 1;
	}
	index
}
