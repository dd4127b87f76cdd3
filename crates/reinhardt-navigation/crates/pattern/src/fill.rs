//! Template filling (the reverse of matching).

use regex::{Regex, RegexBuilder};

use crate::compile::{MAX_REGEX_SIZE, PatternOptions};
use crate::encode::{encode_asterisk, encode_pretty};
use crate::error::{FillError, PatternError};
use crate::params::{ParamValue, Params};
use crate::token::{Key, KeyName, Token, parse};

/// Renders concrete paths from a template.
///
/// Every produced segment is checked against its key's own pattern, so a
/// filled path always matches the template it came from.
#[derive(Debug, Clone)]
pub struct PathFiller {
	template: String,
	tokens: Vec<Token>,
	checks: Vec<Option<Regex>>,
}

impl PathFiller {
	/// Compiles a filler with default options.
	pub fn compile(template: &str) -> Result<Self, PatternError> {
		Self::compile_with(template, &PatternOptions::default())
	}

	/// Compiles a filler with explicit options.
	pub fn compile_with(template: &str, options: &PatternOptions) -> Result<Self, PatternError> {
		let tokens = parse(template, options);
		let checks = tokens
			.iter()
			.map(|token| match token {
				Token::Key(key) => RegexBuilder::new(&format!("^(?:{})$", key.pattern))
					.size_limit(MAX_REGEX_SIZE)
					.build()
					.map(Some)
					.map_err(|e| PatternError::InvalidRegex {
						template: template.to_string(),
						reason: e.to_string(),
					}),
				Token::Literal(_) => Ok(None),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			template: template.to_string(),
			tokens,
			checks,
		})
	}

	/// The template this filler renders.
	pub fn template(&self) -> &str {
		&self.template
	}

	/// Keys of the template in order.
	pub fn keys(&self) -> impl Iterator<Item = &Key> {
		self.tokens.iter().filter_map(|token| match token {
			Token::Key(key) => Some(key),
			Token::Literal(_) => None,
		})
	}

	/// Renders the template with the given parameters.
	///
	/// The first unnamed key reads `pathMatch` before falling back to `"0"`.
	///
	/// # Errors
	///
	/// Fails when a parameter is missing, has the wrong shape or does not
	/// satisfy its key's pattern. The error names the parameter.
	pub fn fill(&self, params: &Params) -> Result<String, FillError> {
		let mut path = String::new();

		for (token, check) in self.tokens.iter().zip(&self.checks) {
			let (key, check) = match (token, check) {
				(Token::Literal(text), _) => {
					path.push_str(text);
					continue;
				}
				(Token::Key(key), Some(check)) => (key, check),
				(Token::Key(_), None) => continue,
			};

			match lookup(key, params) {
				Some(ParamValue::List(values)) => {
					if !key.repeat {
						return Err(FillError::UnexpectedList {
							name: key.name.to_string(),
						});
					}
					if values.is_empty() {
						if key.optional {
							continue;
						}
						return Err(FillError::EmptyList {
							name: key.name.to_string(),
						});
					}
					for (index, value) in values.iter().enumerate() {
						let segment = encode(key, value);
						verify(key, check, &segment)?;
						let separator = if index == 0 {
							key.prefix
						} else {
							Some(key.delimiter)
						};
						path.extend(separator);
						path.push_str(&segment);
					}
				}
				Some(ParamValue::Single(value)) => {
					if key.repeat {
						return Err(FillError::ExpectedList {
							name: key.name.to_string(),
						});
					}
					let segment = encode(key, value);
					verify(key, check, &segment)?;
					path.extend(key.prefix);
					path.push_str(&segment);
				}
				None if key.optional => {}
				None => {
					return Err(FillError::Missing {
						name: key.name.to_string(),
						expected: if key.repeat { "a list" } else { "a string" },
					});
				}
			}
		}

		Ok(path)
	}
}

fn lookup<'a>(key: &Key, params: &'a Params) -> Option<&'a ParamValue> {
	match &key.name {
		KeyName::Named(name) => params.get(name),
		KeyName::Index(0) => params.get("pathMatch").or_else(|| params.get("0")),
		KeyName::Index(index) => params.get(&index.to_string()),
	}
}

fn encode(key: &Key, value: &str) -> String {
	if key.asterisk {
		encode_asterisk(value)
	} else {
		encode_pretty(value)
	}
}

fn verify(key: &Key, check: &Regex, segment: &str) -> Result<(), FillError> {
	if check.is_match(segment) {
		Ok(())
	} else {
		Err(FillError::Mismatch {
			name: key.name.to_string(),
			pattern: key.pattern.clone(),
			segment: segment.to_string(),
		})
	}
}
