//! Location to route resolution.

use std::sync::Arc;

use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use reinhardt_route_pattern::{ParamValue, Params, PatternCache};

use crate::error::ConfigError;
use crate::location::{Location, RawLocation, fill_params, normalize_location};
use crate::logging::warn_log;
use crate::path::{parse_path, resolve_path};
use crate::query::QueryCodec;
use crate::record::{Redirect, RouteConfig, RouteRecord};
use crate::route::Route;
use crate::tree::RouteTree;

/// Redirect and alias hops allowed while resolving one location.
const MAX_REDIRECT_DEPTH: usize = 32;

/// Resolves locations against a route tree.
///
/// The tree can grow at runtime through [`Matcher::add_routes`]; matching
/// never holds the tree lock while running user redirect callbacks.
#[derive(Debug)]
pub struct Matcher {
	tree: RwLock<RouteTree>,
	cache: PatternCache,
	codec: QueryCodec,
}

impl Matcher {
	/// Builds a matcher over `routes`.
	pub fn new(routes: &[RouteConfig], codec: QueryCodec) -> Result<Self, ConfigError> {
		Ok(Self {
			tree: RwLock::new(RouteTree::build(routes)?),
			cache: PatternCache::new(),
			codec,
		})
	}

	/// Adds routes to the tree.
	pub fn add_routes(&self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
		self.tree.write().add_routes(routes)
	}

	/// The query codec used to build routes.
	pub fn codec(&self) -> &QueryCodec {
		&self.codec
	}

	/// The fill cache.
	pub fn cache(&self) -> &PatternCache {
		&self.cache
	}

	/// Record registered under `name`.
	pub fn record_by_name(&self, name: &str) -> Option<Arc<RouteRecord>> {
		self.tree.read().by_name(name).cloned()
	}

	/// Record registered under the normalized `path`.
	pub fn record_by_path(&self, path: &str) -> Option<Arc<RouteRecord>> {
		self.tree.read().by_path(path).cloned()
	}

	/// Registered paths in match priority order.
	pub fn paths(&self) -> Vec<String> {
		self.tree.read().path_list().to_vec()
	}

	/// Registered records in match priority order.
	pub fn records(&self) -> Vec<Arc<RouteRecord>> {
		self.tree.read().records().cloned().collect()
	}

	/// Normalizes `raw` against `current`.
	pub fn normalize(&self, raw: impl Into<RawLocation>, current: Option<&Route>, append: bool) -> Location {
		normalize_location(raw.into(), current, append, &self.codec, &self.cache)
	}

	/// Resolves `raw` into a route. Unknown locations yield a route with
	/// nothing matched.
	pub fn match_route(&self, raw: impl Into<RawLocation>, current: Option<&Route>) -> Route {
		self.match_with(raw.into(), current, None, 0)
	}

	fn match_with(
		&self,
		raw: RawLocation,
		current: Option<&Route>,
		redirected_from: Option<&Location>,
		depth: usize,
	) -> Route {
		let mut location = self.normalize(raw, current, false);

		if let Some(name) = location.name.clone() {
			let Some(record) = self.record_by_name(&name) else {
				warn_log!("route with name '{}' does not exist", name);
				return self.create_route(None, location, None, depth);
			};

			let mut params = location.params.take().unwrap_or_default();
			if let Some(current) = current {
				for key in record.keys().iter().filter(|key| !key.optional) {
					let param = key.param_name();
					if !params.contains_key(&param)
						&& let Some(value) = current.params().get(&param)
					{
						params.insert(param, value.clone());
					}
				}
			}

			let context = format!("named route \"{}\"", name);
			location.path = Some(fill_params(&self.cache, record.path(), &params, &context));
			location.params = Some(params);
			return self.create_route(Some(&record), location, redirected_from, depth);
		}

		if let Some(path) = location.path.clone().filter(|path| !path.is_empty()) {
			let found = self
				.tree
				.read()
				.records()
				.find_map(|record| capture(record, &path).map(|params| (Arc::clone(record), params)));
			if let Some((record, params)) = found {
				location.params = Some(params);
				return self.create_route(Some(&record), location, redirected_from, depth);
			}
		}

		location.params = Some(Params::new());
		self.create_route(None, location, None, depth)
	}

	fn create_route(
		&self,
		record: Option<&Arc<RouteRecord>>,
		location: Location,
		redirected_from: Option<&Location>,
		depth: usize,
	) -> Route {
		if let Some(record) = record {
			if record.redirect().is_some() || record.match_as().is_some() {
				if depth >= MAX_REDIRECT_DEPTH {
					warn_log!(
						"redirect or alias chain deeper than {} at path \"{}\"",
						MAX_REDIRECT_DEPTH,
						record.path()
					);
					return Route::new(None, &location, None, &self.codec);
				}
				if record.redirect().is_some() {
					return self.redirect(record, location, redirected_from, depth + 1);
				}
				if let Some(match_as) = record.match_as() {
					return self.alias(record, location, match_as, depth + 1);
				}
			}
		}
		Route::new(record, &location, redirected_from, &self.codec)
	}

	fn redirect(
		&self,
		record: &Arc<RouteRecord>,
		location: Location,
		redirected_from: Option<&Location>,
		depth: usize,
	) -> Route {
		let target = match record.redirect() {
			Some(Redirect::To(target)) => Some(target.clone()),
			Some(Redirect::Dynamic(redirect)) => {
				redirect(&Route::new(Some(record), &location, None, &self.codec))
			}
			None => None,
		};
		let origin = redirected_from.unwrap_or(&location);

		let Some(target) = target.map(RawLocation::into_location) else {
			warn_log!("invalid redirect option at path \"{}\"", record.path());
			return Route::new(None, &location, None, &self.codec);
		};

		let mut query = target.query.clone().or_else(|| location.query.clone());
		let mut hash = target.hash.clone().or_else(|| location.hash.clone());
		let params = target
			.params
			.clone()
			.or_else(|| location.params.clone())
			.unwrap_or_default();

		if let Some(name) = target.name {
			if self.record_by_name(&name).is_none() {
				warn_log!("redirect failed: named route \"{}\" not found.", name);
			}
			let next = Location {
				name: Some(name),
				query,
				hash,
				params: Some(params),
				normalized: true,
				..Location::default()
			};
			return self.match_with(next.into(), None, Some(origin), depth);
		}

		if let Some(path) = target.path.filter(|path| !path.is_empty()) {
			let parsed = parse_path(&path);
			if !parsed.query.is_empty() {
				query = Some(self.codec.resolve(&parsed.query, target.query.as_ref()));
			}
			if !parsed.hash.is_empty() && target.hash.is_none() {
				hash = Some(parsed.hash);
			}

			let base = record.parent().map(|parent| parent.path()).unwrap_or("/");
			let raw_path = resolve_path(&parsed.path, base, true);
			let context = format!("redirect route with path \"{}\"", raw_path);
			let next = Location {
				path: Some(fill_params(&self.cache, &raw_path, &params, &context)),
				query,
				hash,
				normalized: true,
				..Location::default()
			};
			return self.match_with(next.into(), None, Some(origin), depth);
		}

		warn_log!("invalid redirect option at path \"{}\"", record.path());
		Route::new(None, &location, None, &self.codec)
	}

	fn alias(&self, record: &Arc<RouteRecord>, mut location: Location, match_as: &str, depth: usize) -> Route {
		let params = location.params.clone().unwrap_or_default();
		let context = format!("aliased route with path \"{}\"", match_as);
		let aliased_path = fill_params(&self.cache, match_as, &params, &context);
		let canonical = Location {
			path: Some(aliased_path),
			normalized: true,
			..Location::default()
		};
		let aliased = self.match_with(canonical.into(), None, None, depth);

		if aliased.matched().is_empty() {
			return Route::new(None, &location, None, &self.codec);
		}

		let mut matched = aliased.matched().to_vec();
		if let Some(leaf) = matched.last_mut() {
			*leaf = Arc::clone(record);
		}
		location.params = Some(aliased.params().clone());
		Route::with_matched(matched, &location, None, &self.codec)
	}
}

/// Runs `record`'s pattern against `path` and decodes the captures.
fn capture(record: &RouteRecord, path: &str) -> Option<Params> {
	let captures = record.pattern().exec(path)?;
	let mut params = Params::new();
	for (key, value) in record.keys().iter().zip(captures) {
		let Some(value) = value else {
			continue;
		};
		let value = if key.repeat {
			ParamValue::List(value.split(key.delimiter).map(decode_component).collect())
		} else {
			ParamValue::Single(decode_component(&value))
		};
		params.insert(key.param_name(), value);
	}
	Some(params)
}

fn decode_component(value: &str) -> String {
	match percent_decode_str(value).decode_utf8() {
		Ok(decoded) => decoded.into_owned(),
		Err(_) => {
			warn_log!("error decoding \"{}\". Leaving it intact.", value);
			value.to_string()
		}
	}
}
