//! Error types for route configuration and navigation.

use std::sync::Arc;

use reinhardt_route_pattern::PatternError;
use thiserror::Error;

/// Boxed error accepted from user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid route configuration. Raised eagerly while building the route tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
	/// A route configuration has no `path`.
	#[error("\"path\" is required in a route configuration")]
	MissingPath {
		/// Name of the offending route, when it has one.
		name: Option<String>,
	},

	/// A component was given as an unresolved string identifier.
	#[error(
		"route config \"component\" for path: {path} cannot be a string id. Use an actual component instead."
	)]
	StringComponent {
		/// Path of the offending route.
		path: String,
	},

	/// A route has neither components nor a redirect.
	#[error("route config for path: {path} needs a component, named components or a redirect")]
	MissingComponent {
		/// Path of the offending route.
		path: String,
	},

	/// The route path does not compile.
	#[error("invalid path pattern for route {path:?}: {source}")]
	Pattern {
		/// Path of the offending route.
		path: String,
		/// Compiler error.
		#[source]
		source: PatternError,
	},
}

/// Error that aborts a navigation.
///
/// Delivered to `on_error` handlers and abort callbacks, so it is cheap to
/// clone.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum NavigationError {
	/// A lazy component factory rejected.
	#[error("Failed to resolve async component {slot}: {reason}")]
	AsyncComponent {
		/// View slot of the component.
		slot: String,
		/// Rejection reason.
		reason: String,
	},

	/// A guard failed with its own error.
	#[error("{0}")]
	Guard(Arc<dyn std::error::Error + Send + Sync>),

	/// A guard failed with a plain message.
	#[error("{0}")]
	Message(String),
}

impl NavigationError {
	/// Wraps an arbitrary error raised by a guard.
	pub fn guard(error: impl Into<BoxError>) -> Self {
		NavigationError::Guard(Arc::from(error.into()))
	}

	/// Creates an error from a message.
	pub fn message(message: impl Into<String>) -> Self {
		NavigationError::Message(message.into())
	}
}

/// Outcome of an awaited navigation that did not commit.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum NavigationFailure {
	/// The navigation was cancelled, redirected, superseded or went to the
	/// current route.
	#[error("navigation aborted")]
	Aborted,

	/// The navigation was aborted by an error.
	#[error("navigation failed: {0}")]
	Failed(#[source] NavigationError),
}

impl From<Option<NavigationError>> for NavigationFailure {
	fn from(error: Option<NavigationError>) -> Self {
		match error {
			Some(error) => NavigationFailure::Failed(error),
			None => NavigationFailure::Aborted,
		}
	}
}

/// Malformed query string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryError {
	/// A percent sequence does not decode to UTF-8.
	#[error("URI malformed in query component {0:?}")]
	Malformed(String),
}
