use std::ops::Range;

use logos::Lexer;
use logos::Logos;
use memchr::memmem;

use crate::HertplResult;
use crate::tokens::DependencyCall;
use crate::tokens::Lexeme;
use crate::tokens::RequireKind;
use crate::tokens::ScriptToken;

/// Raw tokens produced by logos for the script text. Only used to drive
/// [`ScriptLexer`]; most of them are skipped.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[regex(r#""([^"\\\r\n\f]|\\[^\n]|\\\n)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\\r\n\f]|\\[^\n]|\\\n)*'")]
	SingleQuotedString,
	/// A quote that does not start a complete string on its line.
	#[token("\"")]
	DoubleQuote,
	#[token("'")]
	SingleQuote,
	#[regex(r"//[^\r\n\f]*")]
	LineComment,
	#[token("/*")]
	BlockCommentOpen,
	#[token("require")]
	Require,
	#[regex(r"[A-Za-z0-9_$]+")]
	Word,
	#[regex(r"\s+")]
	Whitespace,
	#[token(".")]
	Dot,
	#[token("(")]
	ParenOpen,
	#[token("[")]
	BracketOpen,
	#[token("]")]
	BracketClose,
	#[token(",")]
	Comma,
}

impl RawToken {
	fn is_string(self) -> bool {
		matches!(self, Self::DoubleQuotedString | Self::SingleQuotedString)
	}
}

/// A single left-to-right pass over script text yielding string literals,
/// comments and dependency calls.
///
/// Strings and comments are recognized before calls at any position, so a
/// `require(` inside either is never reported as a call. Malformed strings
/// and comments never fail the scan.
pub struct ScriptLexer<'a> {
	source: &'a str,
	offset: usize,
}

impl<'a> ScriptLexer<'a> {
	pub fn new(source: &'a str) -> Self {
		Self { source, offset: 0 }
	}

	fn lexeme(&self, span: Range<usize>) -> Lexeme<'a> {
		Lexeme {
			text: &self.source[span.clone()],
			span,
		}
	}

	/// A quote that did not lex as a complete string. If nothing but the end
	/// of the input stops it, the literal runs to the end. A line break
	/// means it was not a string at all.
	fn unterminated_string(&self, start: usize) -> Option<Lexeme<'a>> {
		let bytes = self.source.as_bytes();
		let quote = bytes[start];
		let mut index = start + 1;

		while index < bytes.len() {
			match bytes[index] {
				b'\\' => index += 2,
				b'\r' | b'\n' | 0x0C => return None,
				byte if byte == quote => return None,
				_ => index += 1,
			}
		}

		Some(self.lexeme(start..self.source.len()))
	}

	fn block_comment(&self, start: usize) -> Lexeme<'a> {
		let body_start = start + 2;
		let end = memmem::find(&self.source.as_bytes()[body_start..], b"*/")
			.map_or(self.source.len(), |offset| body_start + offset + 2);

		self.lexeme(start..end)
	}

	/// `require` must not continue an identifier or a member access.
	fn starts_call(&self, start: usize) -> bool {
		self.source[..start]
			.chars()
			.next_back()
			.is_none_or(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '.')))
	}

	/// Try to read a full dependency call starting at the `require` keyword.
	/// `lexer` has just produced that keyword.
	fn dependency_call(
		&self,
		start: usize,
		mut lexer: Lexer<'a, RawToken>,
	) -> Option<DependencyCall<'a>> {
		if !self.starts_call(start) {
			return None;
		}

		// Whitespace is allowed between every part of the call.
		let mut significant = move || -> Option<(RawToken, Range<usize>)> {
			loop {
				let token = lexer.next()?.ok()?;
				if token != RawToken::Whitespace {
					let span = lexer.span();
					return Some((token, start + span.start..start + span.end));
				}
			}
		};

		let (mut token, _) = significant()?;
		let mut kind = RequireKind::Require;

		if token == RawToken::Dot {
			let (member, member_span) = significant()?;
			if member != RawToken::Word {
				return None;
			}

			kind = match &self.source[member_span] {
				"async" => RequireKind::Async,
				"defer" => RequireKind::Defer,
				_ => return None,
			};

			(token, _) = significant()?;
		}

		if token != RawToken::ParenOpen {
			return None;
		}

		let (token, span) = significant()?;
		let arguments_start = span.start;
		let mut paths = Vec::new();

		let (arguments_end, bracketed) = match token {
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
				paths.push(self.lexeme(span.clone()));
				(span.end, false)
			}
			RawToken::BracketOpen => {
				let end = loop {
					let (token, span) = significant()?;
					if !token.is_string() {
						return None;
					}
					paths.push(self.lexeme(span));

					let (token, span) = significant()?;
					match token {
						RawToken::Comma => {}
						RawToken::BracketClose => break span.end,
						_ => return None,
					}
				};
				(end, true)
			}
			_ => return None,
		};

		Some(DependencyCall {
			prefix: &self.source[start..arguments_start],
			kind,
			arguments: &self.source[arguments_start..arguments_end],
			paths,
			bracketed,
			span: start..arguments_end,
		})
	}
}

impl<'a> Iterator for ScriptLexer<'a> {
	type Item = ScriptToken<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		while self.offset < self.source.len() {
			let start = self.offset;
			let mut lexer = RawToken::lexer(&self.source[start..]);

			let Some(result) = lexer.next() else {
				self.offset = self.source.len();
				break;
			};

			let span = lexer.span();
			let span = start + span.start..start + span.end;
			self.offset = span.end;

			match result {
				Ok(RawToken::DoubleQuotedString | RawToken::SingleQuotedString) => {
					return Some(ScriptToken::StringLiteral(self.lexeme(span)));
				}
				Ok(RawToken::DoubleQuote | RawToken::SingleQuote) => {
					if let Some(lexeme) = self.unterminated_string(start) {
						self.offset = lexeme.span.end;
						return Some(ScriptToken::StringLiteral(lexeme));
					}
				}
				// logos does not always fall back to the bare quote token once a
				// longer string pattern fails partway, and reports an error for the
				// quote byte instead.
				Err(()) if matches!(self.source.as_bytes()[start], b'"' | b'\'') => {
					if let Some(lexeme) = self.unterminated_string(start) {
						self.offset = lexeme.span.end;
						return Some(ScriptToken::StringLiteral(lexeme));
					}
					self.offset = start + 1;
				}
				Ok(RawToken::LineComment) => {
					return Some(ScriptToken::Comment(self.lexeme(span)));
				}
				Ok(RawToken::BlockCommentOpen) => {
					let lexeme = self.block_comment(start);
					self.offset = lexeme.span.end;
					return Some(ScriptToken::Comment(lexeme));
				}
				Ok(RawToken::Require) => {
					if let Some(call) = self.dependency_call(start, lexer) {
						self.offset = call.span.end;
						return Some(ScriptToken::DependencyCall(call));
					}
				}
				Ok(_) | Err(()) => {}
			}
		}

		None
	}
}

/// Tokenize script text. The returned iterator is lazy and can be restarted
/// by calling this again.
pub fn tokenize(source: &str) -> ScriptLexer<'_> {
	ScriptLexer::new(source)
}

/// Replace every dependency call in `source` with the output of `rewrite`.
/// Strings, comments and all other text are copied through unchanged.
pub fn replace_dependency_calls<F>(source: &str, mut rewrite: F) -> HertplResult<String>
where
	F: FnMut(&DependencyCall<'_>) -> HertplResult<String>,
{
	let mut output = String::with_capacity(source.len());
	let mut last_end = 0;

	for token in tokenize(source) {
		let ScriptToken::DependencyCall(call) = token else {
			continue;
		};

		output.push_str(&source[last_end..call.span.start]);
		output.push_str(&rewrite(&call)?);
		last_end = call.span.end;
	}

	output.push_str(&source[last_end..]);

	Ok(output)
}
