//! Template tokenizer.

use std::fmt;

use crate::compile::PatternOptions;

/// Name of a capture key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyName {
	/// Explicitly named key (`:id`).
	Named(String),
	/// Unnamed key (`(\d+)` or `*`), numbered from zero in template order.
	Index(usize),
}

impl fmt::Display for KeyName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KeyName::Named(name) => f.write_str(name),
			KeyName::Index(index) => write!(f, "{}", index),
		}
	}
}

/// Descriptor of one capture group of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
	/// Key name.
	pub name: KeyName,
	/// Delimiter character consumed in front of the capture, if any.
	pub prefix: Option<char>,
	/// Separator between repeated values.
	pub delimiter: char,
	/// Whether the key may be absent.
	pub optional: bool,
	/// Whether the key captures one or more delimited values.
	pub repeat: bool,
	/// Regex source of a single value.
	pub pattern: String,
	/// Whether the key came from a bare `*` wildcard.
	pub asterisk: bool,
}

impl Key {
	/// Name under which a captured value is stored in route params.
	///
	/// The first unnamed key is exposed as `pathMatch` so that catch-all
	/// routes have a stable parameter name.
	pub fn param_name(&self) -> String {
		match &self.name {
			KeyName::Named(name) => name.clone(),
			KeyName::Index(0) => "pathMatch".to_string(),
			KeyName::Index(index) => index.to_string(),
		}
	}
}

/// A parsed template fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Literal text, already unescaped.
	Literal(String),
	/// A capture key.
	Key(Key),
}

struct ScannedParam {
	name: Option<String>,
	group: Option<String>,
	modifier: Option<char>,
	asterisk: bool,
	end: usize,
}

/// Splits a template into literal and key tokens.
pub fn parse(template: &str, options: &PatternOptions) -> Vec<Token> {
	let chars: Vec<char> = template.chars().collect();
	let mut tokens = Vec::new();
	let mut path = String::new();
	let mut path_escaped = false;
	let mut next_index = 0;
	let mut index = 0;

	while index < chars.len() {
		let c = chars[index];

		if c == '\\'
			&& let Some(&escaped) = chars.get(index + 1)
		{
			path.push(escaped);
			path_escaped = true;
			index += 2;
			continue;
		}

		let Some(param) = scan_param(&chars, index) else {
			path.push(c);
			index += 1;
			continue;
		};
		index = param.end;

		let mut prefix = None;
		if !path_escaped
			&& let Some(last) = path.chars().last()
			&& options.is_whitelisted(last)
		{
			prefix = Some(last);
			path.pop();
		}

		if !path.is_empty() {
			tokens.push(Token::Literal(std::mem::take(&mut path)));
			path_escaped = false;
		}

		let delimiter = prefix.unwrap_or(options.delimiter);
		let name = match param.name {
			Some(name) => KeyName::Named(name),
			None => {
				next_index += 1;
				KeyName::Index(next_index - 1)
			}
		};
		let pattern = match (param.group, param.asterisk) {
			(Some(group), _) => group,
			(None, true) => ".*".to_string(),
			(None, false) => default_pattern(delimiter, options.delimiter),
		};

		tokens.push(Token::Key(Key {
			name,
			prefix,
			delimiter,
			optional: matches!(param.modifier, Some('?') | Some('*')),
			repeat: matches!(param.modifier, Some('+') | Some('*')),
			pattern,
			asterisk: param.asterisk,
		}));
	}

	if !path.is_empty() {
		tokens.push(Token::Literal(path));
	}

	tokens
}

fn default_pattern(delimiter: char, default_delimiter: char) -> String {
	let excluded = if delimiter == default_delimiter {
		delimiter.to_string()
	} else {
		format!("{}{}", delimiter, default_delimiter)
	};
	format!("[^{}]+?", regex::escape(&excluded))
}

fn scan_param(chars: &[char], start: usize) -> Option<ScannedParam> {
	let mut cursor = start;
	let mut name = None;
	let mut group = None;

	match chars[start] {
		':' => {
			let name_end = chars[start + 1..]
				.iter()
				.position(|c| !is_word_char(*c))
				.map_or(chars.len(), |offset| start + 1 + offset);
			if name_end == start + 1 {
				return None;
			}
			name = Some(chars[start + 1..name_end].iter().collect());
			cursor = name_end;
			if let Some((content, end)) = scan_group(chars, cursor) {
				group = Some(content);
				cursor = end;
			}
		}
		'(' => {
			let (content, end) = scan_group(chars, start)?;
			group = Some(content);
			cursor = end;
		}
		'*' => {
			return Some(ScannedParam {
				name: None,
				group: None,
				modifier: None,
				asterisk: true,
				end: start + 1,
			});
		}
		_ => return None,
	}

	let modifier = chars
		.get(cursor)
		.copied()
		.filter(|c| matches!(c, '+' | '*' | '?'));
	if modifier.is_some() {
		cursor += 1;
	}

	Some(ScannedParam {
		name,
		group,
		modifier,
		asterisk: false,
		end: cursor,
	})
}

/// Reads a non-empty `( ... )` group without nested parentheses.
fn scan_group(chars: &[char], open: usize) -> Option<(String, usize)> {
	if chars.get(open) != Some(&'(') {
		return None;
	}
	let mut content = String::new();
	let mut cursor = open + 1;
	while let Some(&c) = chars.get(cursor) {
		match c {
			'\\' => {
				let escaped = chars.get(cursor + 1)?;
				content.push('\\');
				content.push(*escaped);
				cursor += 2;
			}
			')' if content.is_empty() => return None,
			')' => return Some((content, cursor + 1)),
			'(' => return None,
			_ => {
				content.push(c);
				cursor += 1;
			}
		}
	}
	None
}

fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}
