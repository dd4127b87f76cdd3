//! Errors raised while compiling or filling a path template.

use thiserror::Error;

/// Errors that can occur while compiling a path template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
	/// The template exceeds the maximum accepted length.
	#[error("pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Length of the rejected template.
		length: usize,
		/// Maximum accepted length.
		max: usize,
	},

	/// The generated expression was rejected by the regex engine.
	#[error("failed to compile pattern {template:?}: {reason}")]
	InvalidRegex {
		/// The template (or generated source) that failed.
		template: String,
		/// Message reported by the regex engine.
		reason: String,
	},
}

/// Errors that can occur while filling a template with parameters.
///
/// Every variant names the parameter that caused the failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FillError {
	/// A repeated parameter was given a single value.
	#[error("expected \"{name}\" to be a list")]
	ExpectedList {
		/// Parameter name.
		name: String,
	},

	/// A non-repeated parameter was given a list.
	#[error("expected \"{name}\" to not repeat, but got a list")]
	UnexpectedList {
		/// Parameter name.
		name: String,
	},

	/// A required repeated parameter was given an empty list.
	#[error("expected \"{name}\" to not be empty")]
	EmptyList {
		/// Parameter name.
		name: String,
	},

	/// A required parameter is absent.
	#[error("expected \"{name}\" to be {expected}")]
	Missing {
		/// Parameter name.
		name: String,
		/// Human readable shape of the expected value.
		expected: &'static str,
	},

	/// An encoded segment does not satisfy the parameter's own pattern.
	#[error("expected \"{name}\" to match \"{pattern}\", but got \"{segment}\"")]
	Mismatch {
		/// Parameter name.
		name: String,
		/// Pattern the segment was checked against.
		pattern: String,
		/// The encoded segment.
		segment: String,
	},

	/// The template itself could not be compiled.
	#[error(transparent)]
	Pattern(#[from] PatternError),
}
