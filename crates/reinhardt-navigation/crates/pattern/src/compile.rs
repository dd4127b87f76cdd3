//! Template to regex compilation.

use regex::{Regex, RegexBuilder};

use crate::error::PatternError;
use crate::token::{Key, KeyName, Token, parse};

/// Maximum allowed length for a path template in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed size for a compiled template regex (in bytes).
pub(crate) const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// Options controlling how a template compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOptions {
	/// Match case-sensitively.
	pub sensitive: bool,
	/// Reject a trailing delimiter the template does not spell out.
	pub strict: bool,
	/// Anchor the end of the expression. When `false` the pattern matches
	/// any path that starts with it, up to a delimiter boundary.
	pub end: bool,
	/// Anchor the start of the expression.
	pub start: bool,
	/// Default segment delimiter.
	pub delimiter: char,
	/// Characters that may become a key prefix. `None` accepts any character.
	pub whitelist: Option<Vec<char>>,
}

impl Default for PatternOptions {
	fn default() -> Self {
		Self {
			sensitive: false,
			strict: false,
			end: true,
			start: true,
			delimiter: '/',
			whitelist: Some(vec!['/', '.']),
		}
	}
}

impl PatternOptions {
	/// Sets case sensitivity.
	pub fn with_sensitive(mut self, sensitive: bool) -> Self {
		self.sensitive = sensitive;
		self
	}

	/// Sets trailing-delimiter strictness.
	pub fn with_strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	/// Sets end anchoring.
	pub fn with_end(mut self, end: bool) -> Self {
		self.end = end;
		self
	}

	/// Sets start anchoring.
	pub fn with_start(mut self, start: bool) -> Self {
		self.start = start;
		self
	}

	/// Sets the default delimiter.
	pub fn with_delimiter(mut self, delimiter: char) -> Self {
		self.delimiter = delimiter;
		self
	}

	/// Sets the prefix whitelist.
	pub fn with_whitelist(mut self, whitelist: Option<Vec<char>>) -> Self {
		self.whitelist = whitelist;
		self
	}

	pub(crate) fn is_whitelisted(&self, c: char) -> bool {
		self.whitelist
			.as_ref()
			.is_none_or(|whitelist| whitelist.contains(&c))
	}
}

/// A compiled path template.
///
/// The regex holds one capture group per entry of [`PathPattern::keys`], in
/// the same order.
#[derive(Debug, Clone)]
pub struct PathPattern {
	source: String,
	regex: Regex,
	keys: Vec<Key>,
}

impl PathPattern {
	/// Compiles a template.
	///
	/// # Errors
	///
	/// Returns [`PatternError::TooLong`] for templates over 1024 bytes and
	/// [`PatternError::InvalidRegex`] when a custom group is not a valid
	/// expression.
	pub fn compile(template: &str, options: &PatternOptions) -> Result<Self, PatternError> {
		check_length(template)?;
		let tokens = parse(template, options);
		let source = tokens_to_source(&tokens, options);
		let regex = build_regex(template, &source, options.sensitive)?;
		let keys = tokens
			.into_iter()
			.filter_map(|token| match token {
				Token::Key(key) => Some(key),
				Token::Literal(_) => None,
			})
			.collect();

		Ok(Self {
			source: template.to_string(),
			regex,
			keys,
		})
	}

	/// Compiles several templates into a single alternation.
	///
	/// Keys of all templates are concatenated in order.
	pub fn compile_many(templates: &[&str], options: &PatternOptions) -> Result<Self, PatternError> {
		let mut parts = Vec::with_capacity(templates.len());
		let mut keys = Vec::new();
		for template in templates {
			check_length(template)?;
			let tokens = parse(template, options);
			parts.push(tokens_to_source(&tokens, options));
			keys.extend(tokens.into_iter().filter_map(|token| match token {
				Token::Key(key) => Some(key),
				Token::Literal(_) => None,
			}));
		}
		let joined = templates.join("|");
		let regex = build_regex(&joined, &format!("(?:{})", parts.join("|")), options.sensitive)?;

		Ok(Self {
			source: joined,
			regex,
			keys,
		})
	}

	/// Wraps a ready-made regex.
	///
	/// Every capture group becomes a key, named after the group when it has a
	/// name and numbered otherwise.
	pub fn from_regex(regex: Regex) -> Self {
		let mut next_index = 0;
		let keys = regex
			.capture_names()
			.skip(1)
			.map(|name| {
				let name = match name {
					Some(name) => KeyName::Named(name.to_string()),
					None => {
						next_index += 1;
						KeyName::Index(next_index - 1)
					}
				};
				Key {
					name,
					prefix: None,
					delimiter: '/',
					optional: false,
					repeat: false,
					pattern: String::new(),
					asterisk: false,
				}
			})
			.collect();

		Self {
			source: regex.as_str().to_string(),
			regex,
			keys,
		}
	}

	/// The template this pattern was compiled from.
	pub fn template(&self) -> &str {
		&self.source
	}

	/// The compiled expression.
	pub fn regex(&self) -> &Regex {
		&self.regex
	}

	/// Capture keys in group order.
	pub fn keys(&self) -> &[Key] {
		&self.keys
	}

	/// Checks whether a path matches.
	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Matches a path and returns the raw captures in key order.
	///
	/// Keys that did not participate in the match yield `None`.
	pub fn exec(&self, path: &str) -> Option<Vec<Option<String>>> {
		let captures = self.regex.captures(path)?;
		Some(
			captures
				.iter()
				.skip(1)
				.map(|group| group.map(|m| m.as_str().to_string()))
				.collect(),
		)
	}
}

fn check_length(template: &str) -> Result<(), PatternError> {
	if template.len() > MAX_PATTERN_LENGTH {
		return Err(PatternError::TooLong {
			length: template.len(),
			max: MAX_PATTERN_LENGTH,
		});
	}
	Ok(())
}

pub(crate) fn build_regex(template: &str, source: &str, sensitive: bool) -> Result<Regex, PatternError> {
	// Use RegexBuilder with size limits to prevent memory exhaustion
	RegexBuilder::new(source)
		.case_insensitive(!sensitive)
		.size_limit(MAX_REGEX_SIZE)
		.build()
		.map_err(|e| PatternError::InvalidRegex {
			template: template.to_string(),
			reason: e.to_string(),
		})
}

fn tokens_to_source(tokens: &[Token], options: &PatternOptions) -> String {
	let delimiter = regex::escape(&options.delimiter.to_string());
	let mut route = String::from(if options.start { "^" } else { "" });

	for (index, token) in tokens.iter().enumerate() {
		match token {
			Token::Literal(text) => {
				// The optional trailing delimiter added below covers this one
				let text = match text.strip_suffix(options.delimiter) {
					Some(stripped) if !options.strict && index == tokens.len() - 1 => stripped,
					_ => text.as_str(),
				};
				route.push_str(&regex::escape(text));
			}
			Token::Key(key) => {
				let capture = if key.repeat {
					format!(
						"(?:{pattern})(?:{delim}(?:{pattern}))*",
						pattern = key.pattern,
						delim = regex::escape(&key.delimiter.to_string())
					)
				} else {
					key.pattern.clone()
				};
				let prefix = key
					.prefix
					.map(|prefix| regex::escape(&prefix.to_string()))
					.unwrap_or_default();

				if key.optional {
					if prefix.is_empty() {
						route.push_str(&format!("({})?", capture));
					} else {
						route.push_str(&format!("(?:{}({}))?", prefix, capture));
					}
				} else {
					route.push_str(&format!("{}({})", prefix, capture));
				}
			}
		}
	}

	if options.end {
		if !options.strict {
			route.push_str(&format!("(?:{})?", delimiter));
		}
		route.push('$');
	} else {
		let end_delimited = match tokens.last() {
			Some(Token::Literal(text)) => text.ends_with(options.delimiter),
			Some(Token::Key(_)) => false,
			None => true,
		};
		// A prefix match has to stop at a segment boundary
		if !options.strict || !end_delimited {
			route.push_str(&format!("(?:{}|$)", delimiter));
		}
	}

	route
}
