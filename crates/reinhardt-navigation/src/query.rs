//! Query string codec.
//!
//! Keys and values are percent-encoded like `encodeURIComponent`, with
//! `! ' ( ) *` escaped as well and commas left readable. A key that appears
//! several times collapses into a list; a key without `=` has no value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::QueryError;
use crate::logging::warn_log;

/// Parsed query parameters.
pub type Query = BTreeMap<String, QueryValue>;

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryValue {
	/// Key present without `=`.
	Null,
	/// A single value.
	Value(String),
	/// Values of a repeated key. `None` entries are bare keys.
	List(Vec<Option<String>>),
}

impl QueryValue {
	/// Returns the single value, if this is one.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			QueryValue::Value(value) => Some(value),
			_ => None,
		}
	}

	fn push(&mut self, value: Option<String>) {
		let previous = std::mem::replace(self, QueryValue::Null);
		*self = match previous {
			QueryValue::Null => QueryValue::List(vec![None, value]),
			QueryValue::Value(first) => QueryValue::List(vec![Some(first), value]),
			QueryValue::List(mut values) => {
				values.push(value);
				QueryValue::List(values)
			}
		};
	}
}

impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		QueryValue::Value(value.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		QueryValue::Value(value)
	}
}

impl From<Vec<&str>> for QueryValue {
	fn from(values: Vec<&str>) -> Self {
		QueryValue::List(values.into_iter().map(|value| Some(value.to_string())).collect())
	}
}

/// `encodeURIComponent` plus `! ' ( ) *`, keeping `,`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'~')
	.remove(b',');

fn encode(value: &str) -> String {
	utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

fn decode(value: &str) -> Result<String, QueryError> {
	percent_decode_str(value)
		.decode_utf8()
		.map(|decoded| decoded.into_owned())
		.map_err(|_| QueryError::Malformed(value.to_string()))
}

/// Parses a query string. A leading `?`, `#` or `&` is ignored and `+`
/// decodes to a space.
pub fn parse_query(query: &str) -> Result<Query, QueryError> {
	let mut result = Query::new();
	let trimmed = query.trim();
	let trimmed = trimmed
		.strip_prefix(['?', '#', '&'])
		.unwrap_or(trimmed);
	if trimmed.is_empty() {
		return Ok(result);
	}

	for param in trimmed.split('&') {
		let param = param.replace('+', " ");
		let (key, value) = match param.split_once('=') {
			Some((key, value)) => (decode(key)?, Some(decode(value)?)),
			None => (decode(&param)?, None),
		};

		match result.get_mut(&key) {
			Some(existing) => existing.push(value),
			None => {
				result.insert(
					key,
					match value {
						Some(value) => QueryValue::Value(value),
						None => QueryValue::Null,
					},
				);
			}
		}
	}

	Ok(result)
}

/// Serializes a query. Returns an empty string for an empty query and a
/// `?`-prefixed string otherwise.
pub fn stringify_query(query: &Query) -> String {
	let pairs: Vec<String> = query
		.iter()
		.map(|(key, value)| match value {
			QueryValue::Null => encode(key),
			QueryValue::Value(value) => format!("{}={}", encode(key), encode(value)),
			QueryValue::List(values) => values
				.iter()
				.map(|value| match value {
					Some(value) => format!("{}={}", encode(key), encode(value)),
					None => encode(key),
				})
				.collect::<Vec<_>>()
				.join("&"),
		})
		.filter(|pair| !pair.is_empty())
		.collect();

	if pairs.is_empty() {
		String::new()
	} else {
		format!("?{}", pairs.join("&"))
	}
}

/// Custom query parser.
pub type ParseQueryFn = Arc<dyn Fn(&str) -> Result<Query, QueryError> + Send + Sync>;

/// Custom query serializer.
pub type StringifyQueryFn = Arc<dyn Fn(&Query) -> String + Send + Sync>;

/// The query codec in use by a router.
///
/// Defaults to [`parse_query`] and [`stringify_query`]; either side can be
/// replaced.
#[derive(Clone, Default)]
pub struct QueryCodec {
	parse: Option<ParseQueryFn>,
	stringify: Option<StringifyQueryFn>,
}

impl QueryCodec {
	/// Creates the default codec.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the parser.
	pub fn with_parse<F>(mut self, parse: F) -> Self
	where
		F: Fn(&str) -> Result<Query, QueryError> + Send + Sync + 'static,
	{
		self.parse = Some(Arc::new(parse));
		self
	}

	/// Replaces the serializer.
	pub fn with_stringify<F>(mut self, stringify: F) -> Self
	where
		F: Fn(&Query) -> String + Send + Sync + 'static,
	{
		self.stringify = Some(Arc::new(stringify));
		self
	}

	/// Parses a raw query string.
	pub fn parse(&self, query: &str) -> Result<Query, QueryError> {
		match &self.parse {
			Some(parse) => parse(query),
			None => parse_query(query),
		}
	}

	/// Serializes a query.
	pub fn stringify(&self, query: &Query) -> String {
		match &self.stringify {
			Some(stringify) => stringify(query),
			None => stringify_query(query),
		}
	}

	/// Parses `query` and overlays `extra` on top of it.
	///
	/// A malformed query logs a warning and is treated as empty.
	pub fn resolve(&self, query: &str, extra: Option<&Query>) -> Query {
		let mut parsed = self.parse(query).unwrap_or_else(|error| {
			warn_log!("{}", error);
			Query::new()
		});
		if let Some(extra) = extra {
			for (key, value) in extra {
				parsed.insert(key.clone(), value.clone());
			}
		}
		parsed
	}
}

impl fmt::Debug for QueryCodec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QueryCodec")
			.field("custom_parse", &self.parse.is_some())
			.field("custom_stringify", &self.stringify.is_some())
			.finish()
	}
}
