use std::ops::Range;

use crate::HertplResult;

/// A raw literal split into its quote character and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedValue<'a> {
	/// `"`, `'`, or empty when the literal was not quoted.
	pub quote: &'a str,
	/// The text between the quotes, never unescaped.
	pub body: &'a str,
}

impl QuotedValue<'_> {
	/// Wrap `body` in the same quotes as the original literal.
	pub fn requote(&self, body: &str) -> String {
		format!("{}{body}{}", self.quote, self.quote)
	}
}

/// Split a raw quoted literal such as `"./a"` into quote and body. The
/// literal is trimmed first; unquoted text comes back whole with an empty
/// quote.
pub fn split_quoted(literal: &str) -> QuotedValue<'_> {
	let literal = literal.trim();

	for quote in ["\"", "'"] {
		if literal.len() >= 2 && literal.starts_with(quote) && literal.ends_with(quote) {
			return QuotedValue {
				quote,
				body: &literal[1..literal.len() - 1],
			};
		}
	}

	QuotedValue {
		quote: "",
		body: literal,
	}
}

/// One `name = "value"` pair inside a tag's attribute text. Ranges are byte
/// offsets into that attribute text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch<'a> {
	attributes: &'a str,
	/// From the start of the preceding whitespace character (if any) to the
	/// end of the value.
	pub full: Range<usize>,
	/// The attribute name as written.
	pub name: Range<usize>,
	/// From the start of the name up to the opening quote of the value.
	pub prefix: Range<usize>,
	/// The quoted value, quotes included.
	pub value: Range<usize>,
}

impl<'a> AttributeMatch<'a> {
	pub fn name_text(&self) -> &'a str {
		&self.attributes[self.name.clone()]
	}

	/// `name = ` with whatever spacing was used around the equals sign.
	pub fn prefix_text(&self) -> &'a str {
		&self.attributes[self.prefix.clone()]
	}

	/// Everything in the prefix after the attribute name.
	pub fn assignment_text(&self) -> &'a str {
		&self.attributes[self.name.end..self.prefix.end]
	}

	pub fn value_text(&self) -> &'a str {
		&self.attributes[self.value.clone()]
	}

	pub fn quoted(&self) -> QuotedValue<'a> {
		split_quoted(self.value_text())
	}
}

/// Find the first `name = "value"` pair. Names match exactly and must sit
/// at the start of the text or after whitespace.
pub fn find_attribute<'a>(attributes: &'a str, name: &str) -> Option<AttributeMatch<'a>> {
	AttributeScanner::new(attributes, name, false).next()
}

/// Every `name = "value"` pair, left to right.
pub fn find_attributes<'a>(attributes: &'a str, name: &str) -> Vec<AttributeMatch<'a>> {
	AttributeScanner::new(attributes, name, false).collect()
}

/// Replace each `name = "value"` pair (from the name to the closing quote)
/// with the output of `rewrite`. Unlike [`find_attribute`], names match
/// ASCII case-insensitively, so `NAME="./a"` is rewritten too.
pub fn replace_attributes<F>(attributes: &str, name: &str, mut rewrite: F) -> HertplResult<String>
where
	F: FnMut(&AttributeMatch<'_>) -> HertplResult<String>,
{
	let mut output = String::with_capacity(attributes.len());
	let mut last_end = 0;

	for found in AttributeScanner::new(attributes, name, true) {
		output.push_str(&attributes[last_end..found.name.start]);
		output.push_str(&rewrite(&found)?);
		last_end = found.value.end;
	}

	output.push_str(&attributes[last_end..]);

	Ok(output)
}

struct AttributeScanner<'a, 'n> {
	attributes: &'a str,
	name: &'n str,
	ignore_case: bool,
	cursor: usize,
}

impl<'a, 'n> AttributeScanner<'a, 'n> {
	fn new(attributes: &'a str, name: &'n str, ignore_case: bool) -> Self {
		Self {
			attributes,
			name,
			ignore_case,
			cursor: 0,
		}
	}

	fn match_at(&self, start: usize) -> Option<AttributeMatch<'a>> {
		let text = self.attributes;
		let name_end = start + self.name.len();

		let candidate = text.get(start..name_end)?;

		let same_name = if self.ignore_case {
			candidate.eq_ignore_ascii_case(self.name)
		} else {
			candidate == self.name
		};

		if !same_name {
			return None;
		}

		let leading = text[..start].chars().next_back();
		if leading.is_some_and(|ch| !ch.is_whitespace()) {
			return None;
		}

		let after_name = skip_whitespace(text, name_end);
		if !text[after_name..].starts_with('=') {
			return None;
		}

		let value_start = skip_whitespace(text, after_name + 1);
		let value_end = quoted_literal_end(text, value_start)?;

		Some(AttributeMatch {
			attributes: text,
			full: start - leading.map_or(0, char::len_utf8)..value_end,
			name: start..name_end,
			prefix: start..value_start,
			value: value_start..value_end,
		})
	}
}

impl<'a> Iterator for AttributeScanner<'a, '_> {
	type Item = AttributeMatch<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.name.is_empty() {
			return None;
		}

		while self.cursor < self.attributes.len() {
			let start = self.cursor;

			if let Some(found) = self.match_at(start) {
				self.cursor = found.value.end;
				return Some(found);
			}

			self.cursor = self.attributes[start..]
				.chars()
				.next()
				.map_or(self.attributes.len(), |ch| start + ch.len_utf8());
		}

		None
	}
}

fn skip_whitespace(text: &str, from: usize) -> usize {
	text[from..]
		.char_indices()
		.find(|(_, ch)| !ch.is_whitespace())
		.map_or(text.len(), |(offset, _)| from + offset)
}

/// End offset of the string literal starting at `start`, using the same
/// escape rules as script strings. Literals may not span lines.
fn quoted_literal_end(text: &str, start: usize) -> Option<usize> {
	let bytes = text.as_bytes();
	let quote = *bytes.get(start)?;

	if quote != b'"' && quote != b'\'' {
		return None;
	}

	let mut index = start + 1;
	while index < bytes.len() {
		match bytes[index] {
			b'\\' => index += 2,
			b'\r' | b'\n' | 0x0C => return None,
			byte if byte == quote => return Some(index + 1),
			_ => index += 1,
		}
	}

	None
}
