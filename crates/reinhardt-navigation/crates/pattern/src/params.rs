use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Route parameters keyed by name.
pub type Params = BTreeMap<String, ParamValue>;

/// The value of a single route parameter.
///
/// Repeated keys (`:name+`, `:name*`) carry a [`ParamValue::List`]; every
/// other key carries a [`ParamValue::Single`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	/// One value.
	Single(String),
	/// Values of a repeated key, in path order.
	List(Vec<String>),
}

impl ParamValue {
	/// Returns the single value, or `None` for a list.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			ParamValue::Single(value) => Some(value),
			ParamValue::List(_) => None,
		}
	}

	/// Returns the list values, or `None` for a single value.
	pub fn as_list(&self) -> Option<&[String]> {
		match self {
			ParamValue::Single(_) => None,
			ParamValue::List(values) => Some(values),
		}
	}
}

impl fmt::Display for ParamValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParamValue::Single(value) => f.write_str(value),
			ParamValue::List(values) => f.write_str(&values.join(",")),
		}
	}
}

impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		ParamValue::Single(value.to_string())
	}
}

impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		ParamValue::Single(value)
	}
}

impl From<u64> for ParamValue {
	fn from(value: u64) -> Self {
		ParamValue::Single(value.to_string())
	}
}

impl From<Vec<String>> for ParamValue {
	fn from(values: Vec<String>) -> Self {
		ParamValue::List(values)
	}
}

impl From<Vec<&str>> for ParamValue {
	fn from(values: Vec<&str>) -> Self {
		ParamValue::List(values.into_iter().map(str::to_string).collect())
	}
}
