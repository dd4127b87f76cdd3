//! Resolved routes.

use std::sync::Arc;

use once_cell::sync::Lazy;
use reinhardt_route_pattern::Params;

use crate::location::Location;
use crate::query::{Query, QueryCodec};
use crate::record::{Meta, RouteRecord};

static START: Lazy<Arc<Route>> = Lazy::new(|| {
	Arc::new(Route {
		name: None,
		meta: Meta::new(),
		path: "/".to_string(),
		hash: String::new(),
		query: Query::new(),
		params: Params::new(),
		full_path: "/".to_string(),
		matched: Vec::new(),
		redirected_from: None,
	})
});

/// An immutable snapshot of a resolved location.
///
/// Routes are shared behind [`Arc`]; the router replaces its current route
/// wholesale on every committed navigation.
#[derive(Debug, Clone)]
pub struct Route {
	name: Option<String>,
	meta: Meta,
	path: String,
	hash: String,
	query: Query,
	params: Params,
	full_path: String,
	matched: Vec<Arc<RouteRecord>>,
	redirected_from: Option<String>,
}

impl Route {
	/// The route every router starts at: path `/` with nothing matched.
	pub fn start() -> Arc<Route> {
		Arc::clone(&START)
	}

	/// Whether `route` is the start route itself rather than an equal copy.
	pub fn is_start(route: &Arc<Route>) -> bool {
		Arc::ptr_eq(route, &START)
	}

	pub(crate) fn new(
		record: Option<&Arc<RouteRecord>>,
		location: &Location,
		redirected_from: Option<&Location>,
		codec: &QueryCodec,
	) -> Self {
		let matched = record.map(RouteRecord::chain).unwrap_or_default();
		Self::with_matched(matched, location, redirected_from, codec)
	}

	pub(crate) fn with_matched(
		matched: Vec<Arc<RouteRecord>>,
		location: &Location,
		redirected_from: Option<&Location>,
		codec: &QueryCodec,
	) -> Self {
		let leaf = matched.last();
		let name = location
			.name
			.clone()
			.or_else(|| leaf.and_then(|record| record.name().map(str::to_string)));
		let query = location.query.clone().unwrap_or_default();

		Self {
			name,
			meta: leaf.map(|record| record.meta().clone()).unwrap_or_default(),
			path: location
				.path
				.clone()
				.filter(|path| !path.is_empty())
				.unwrap_or_else(|| "/".to_string()),
			hash: location.hash.clone().unwrap_or_default(),
			full_path: full_path(location, codec),
			query,
			params: location.params.clone().unwrap_or_default(),
			matched,
			redirected_from: redirected_from.map(|from| full_path(from, codec)),
		}
	}

	/// Name of the route.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Meta of the matched leaf record.
	pub fn meta(&self) -> &Meta {
		&self.meta
	}

	/// Decoded path without query or hash.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Hash including `#`, or empty.
	pub fn hash(&self) -> &str {
		&self.hash
	}

	/// Query parameters.
	pub fn query(&self) -> &Query {
		&self.query
	}

	/// Route parameters.
	pub fn params(&self) -> &Params {
		&self.params
	}

	/// `path + ?query + #hash`.
	pub fn full_path(&self) -> &str {
		&self.full_path
	}

	/// Matched records ordered root to leaf.
	pub fn matched(&self) -> &[Arc<RouteRecord>] {
		&self.matched
	}

	/// Full path of the location that redirected here.
	pub fn redirected_from(&self) -> Option<&str> {
		self.redirected_from.as_deref()
	}

	/// The innermost matched record.
	pub fn leaf(&self) -> Option<&Arc<RouteRecord>> {
		self.matched.last()
	}

	/// A normalized location that navigates back to this route.
	pub fn location(&self) -> Location {
		Location {
			path: Some(self.path.clone()),
			query: Some(self.query.clone()),
			hash: Some(self.hash.clone()),
			normalized: true,
			..Location::default()
		}
	}
}

/// `path + stringify(query) + hash` of a location.
pub(crate) fn full_path(location: &Location, codec: &QueryCodec) -> String {
	let path = location
		.path
		.as_deref()
		.filter(|path| !path.is_empty())
		.unwrap_or("/");
	let query = location
		.query
		.as_ref()
		.map(|query| codec.stringify(query))
		.unwrap_or_default();
	let hash = location.hash.as_deref().unwrap_or("");
	format!("{}{}{}", path, query, hash)
}

fn strip_trailing_slash(path: &str) -> &str {
	path.strip_suffix('/').unwrap_or(path)
}

/// Whether `a` and `b` point at the same location.
///
/// Comparing against the start route checks identity. Otherwise paths are
/// compared ignoring one trailing slash, together with hash and query.
pub fn is_same_route(a: &Arc<Route>, b: &Arc<Route>) -> bool {
	if Route::is_start(b) {
		return Arc::ptr_eq(a, b);
	}
	if !a.path.is_empty() && !b.path.is_empty() {
		return strip_trailing_slash(&a.path) == strip_trailing_slash(&b.path)
			&& a.hash == b.hash
			&& a.query == b.query;
	}
	match (&a.name, &b.name) {
		(Some(left), Some(right)) => {
			left == right && a.hash == b.hash && a.query == b.query && a.params == b.params
		}
		_ => false,
	}
}

/// Whether `target` is an ancestor-or-self of `current`.
///
/// The path must be a prefix once both end in exactly one slash, the hash
/// must match when `target` has one, and every query key of `target` must be
/// present in `current`.
pub fn is_included_route(current: &Route, target: &Route) -> bool {
	let current_path = format!("{}/", strip_trailing_slash(&current.path));
	let target_path = format!("{}/", strip_trailing_slash(&target.path));

	current_path.starts_with(&target_path)
		&& (target.hash.is_empty() || current.hash == target.hash)
		&& target
			.query
			.keys()
			.all(|key| current.query.contains_key(key))
}
