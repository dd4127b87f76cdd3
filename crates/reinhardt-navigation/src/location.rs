//! Navigation targets and their normalization.

use reinhardt_route_pattern::{ParamValue, Params, PatternCache};

use crate::logging::warn_log;
use crate::path::{parse_path, resolve_path};
use crate::query::{Query, QueryCodec, QueryValue};
use crate::route::Route;

/// A structured navigation target.
///
/// Either `name` or `path` identifies the destination. A location carrying
/// only `params` is resolved relative to the current route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
	/// Name of a named route.
	pub name: Option<String>,
	/// Path, possibly relative and possibly carrying `?query#hash`.
	pub path: Option<String>,
	/// Hash. Path locations accept it with or without the leading `#`;
	/// named locations keep it verbatim, so it must carry the `#`.
	pub hash: Option<String>,
	/// Query parameters. Explicit entries win over those parsed from `path`.
	pub query: Option<Query>,
	/// Route parameters.
	pub params: Option<Params>,
	/// Resolve a relative `path` by appending to the current path.
	pub append: bool,
	/// Replace the current history entry instead of pushing.
	pub replace: bool,
	pub(crate) normalized: bool,
}

impl Location {
	/// Creates an empty location.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a location pointing at `path`.
	pub fn from_path(path: impl Into<String>) -> Self {
		Self {
			path: Some(path.into()),
			..Self::default()
		}
	}

	/// Creates a location pointing at the route named `name`.
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	/// Replaces all params.
	pub fn with_params(mut self, params: Params) -> Self {
		self.params = Some(params);
		self
	}

	/// Sets one param.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.params
			.get_or_insert_with(Params::new)
			.insert(key.into(), value.into());
		self
	}

	/// Replaces the whole query.
	pub fn with_query(mut self, query: Query) -> Self {
		self.query = Some(query);
		self
	}

	/// Sets one query parameter.
	pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.query
			.get_or_insert_with(Query::new)
			.insert(key.into(), value.into());
		self
	}

	/// Sets the hash.
	///
	/// Include the leading `#`. It is only added for path locations; a named
	/// location appends the hash to the filled path as given.
	pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
		self.hash = Some(hash.into());
		self
	}

	/// Resolves a relative path by appending to the current path.
	pub fn appending(mut self) -> Self {
		self.append = true;
		self
	}

	/// Requests a history replace instead of a push.
	pub fn replacing(mut self) -> Self {
		self.replace = true;
		self
	}

	/// Whether this location has already been normalized.
	pub fn is_normalized(&self) -> bool {
		self.normalized
	}

	fn has_path(&self) -> bool {
		self.path.as_deref().is_some_and(|path| !path.is_empty())
	}
}

/// A navigation target as accepted by the public API.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLocation {
	/// A path string such as `/users/1?tab=posts#bio`.
	Path(String),
	/// A structured location.
	Location(Location),
}

impl RawLocation {
	/// Converts into a structured location. A path string becomes `{ path }`.
	pub fn into_location(self) -> Location {
		match self {
			RawLocation::Path(path) => Location::from_path(path),
			RawLocation::Location(location) => location,
		}
	}

	/// Whether this target names a destination, either by path or by name.
	pub fn has_destination(&self) -> bool {
		match self {
			RawLocation::Path(_) => true,
			RawLocation::Location(location) => location.path.is_some() || location.name.is_some(),
		}
	}

	/// Whether the target asks for a history replace.
	pub fn wants_replace(&self) -> bool {
		matches!(self, RawLocation::Location(location) if location.replace)
	}
}

impl From<&str> for RawLocation {
	fn from(path: &str) -> Self {
		RawLocation::Path(path.to_string())
	}
}

impl From<String> for RawLocation {
	fn from(path: String) -> Self {
		RawLocation::Path(path)
	}
}

impl From<&String> for RawLocation {
	fn from(path: &String) -> Self {
		RawLocation::Path(path.clone())
	}
}

impl From<Location> for RawLocation {
	fn from(location: Location) -> Self {
		RawLocation::Location(location)
	}
}

/// Fills `template` with `params`. A failure is logged and yields an empty
/// path.
pub(crate) fn fill_params(cache: &PatternCache, template: &str, params: &Params, context: &str) -> String {
	cache.fill(template, params).unwrap_or_else(|error| {
		warn_log!("missing param for {}: {}", context, error);
		String::new()
	})
}

/// Normalizes a navigation target against the current route.
///
/// Named locations pass through untouched. A location carrying only
/// `params` keeps the current route and merges the params into it. Anything
/// else is resolved into an absolute path with a parsed query and a
/// `#`-prefixed hash.
pub fn normalize_location(
	raw: RawLocation,
	current: Option<&Route>,
	append: bool,
	codec: &QueryCodec,
	cache: &PatternCache,
) -> Location {
	let mut next = raw.into_location();
	if next.normalized || next.name.is_some() {
		return next;
	}

	if !next.has_path()
		&& let Some(extra) = next.params.take()
	{
		next.normalized = true;
		let Some(current) = current else {
			warn_log!("relative params navigation requires a current route.");
			next.params = Some(extra);
			return next;
		};

		let mut params = current.params().clone();
		params.extend(extra);
		if let Some(name) = current.name() {
			next.name = Some(name.to_string());
			next.params = Some(params);
		} else if let Some(leaf) = current.matched().last() {
			let context = format!("path {}", current.path());
			next.path = Some(fill_params(cache, leaf.path(), &params, &context));
			next.params = Some(params);
		} else {
			warn_log!("relative params navigation requires a current route.");
			next.params = Some(params);
		}
		return next;
	}

	let parsed = parse_path(next.path.as_deref().unwrap_or(""));
	let base = current.map(Route::path).unwrap_or("/");
	let path = if parsed.path.is_empty() {
		base.to_string()
	} else {
		resolve_path(&parsed.path, base, append || next.append)
	};
	let query = codec.resolve(&parsed.query, next.query.as_ref());
	let mut hash = next
		.hash
		.take()
		.filter(|hash| !hash.is_empty())
		.unwrap_or(parsed.hash);
	if !hash.is_empty() && !hash.starts_with('#') {
		hash.insert(0, '#');
	}

	Location {
		path: Some(path),
		query: Some(query),
		hash: Some(hash),
		normalized: true,
		..Location::default()
	}
}
