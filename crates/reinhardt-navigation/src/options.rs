//! Router construction options.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::history::{HistoryMode, UrlBar};
use crate::query::{Query, QueryCodec};
use crate::record::RouteConfig;
use crate::scheduler::Scheduler;

/// Plain-data router settings, loadable from configuration files.
///
/// ```
/// use reinhardt_navigation::{HistoryMode, RouterSettings};
///
/// let settings: RouterSettings = serde_json::from_str(r#"{ "mode": "hash", "base": "/app" }"#).unwrap();
/// assert_eq!(settings.mode, Some(HistoryMode::Hash));
/// assert!(settings.fallback);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
	/// History mode. `None` picks the platform default.
	pub mode: Option<HistoryMode>,
	/// Base path every URL is prefixed with.
	pub base: String,
	/// Switch to hash mode when the address bar cannot push entries.
	pub fallback: bool,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			mode: None,
			base: "/".to_string(),
			fallback: true,
		}
	}
}

/// Everything needed to build a [`Router`](crate::Router).
pub struct RouterOptions {
	pub(crate) routes: Vec<RouteConfig>,
	pub(crate) settings: RouterSettings,
	pub(crate) codec: QueryCodec,
	pub(crate) url_bar: Option<Arc<dyn UrlBar>>,
	pub(crate) scheduler: Option<Arc<dyn Scheduler>>,
}

impl RouterOptions {
	/// Options with no routes and default settings.
	pub fn new() -> Self {
		Self::from_settings(RouterSettings::default())
	}

	/// Options built from loaded settings.
	pub fn from_settings(settings: RouterSettings) -> Self {
		Self {
			routes: Vec::new(),
			settings,
			codec: QueryCodec::new(),
			url_bar: None,
			scheduler: None,
		}
	}

	/// Adds one route.
	pub fn with_route(mut self, route: RouteConfig) -> Self {
		self.routes.push(route);
		self
	}

	/// Adds several routes.
	pub fn with_routes(mut self, routes: impl IntoIterator<Item = RouteConfig>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Sets the history mode.
	pub fn with_mode(mut self, mode: HistoryMode) -> Self {
		self.settings.mode = Some(mode);
		self
	}

	/// Sets the base path.
	pub fn with_base(mut self, base: impl Into<String>) -> Self {
		self.settings.base = base.into();
		self
	}

	/// Enables or disables the hash fallback.
	pub fn with_fallback(mut self, fallback: bool) -> Self {
		self.settings.fallback = fallback;
		self
	}

	/// Replaces the query string parser.
	pub fn with_parse_query<F>(mut self, parse: F) -> Self
	where
		F: Fn(&str) -> Result<Query, QueryError> + Send + Sync + 'static,
	{
		self.codec = self.codec.with_parse(parse);
		self
	}

	/// Replaces the query string serializer.
	pub fn with_stringify_query<F>(mut self, stringify: F) -> Self
	where
		F: Fn(&Query) -> String + Send + Sync + 'static,
	{
		self.codec = self.codec.with_stringify(stringify);
		self
	}

	/// Uses `url_bar` as the address bar for history and hash modes.
	pub fn with_url_bar(mut self, url_bar: Arc<dyn UrlBar>) -> Self {
		self.url_bar = Some(url_bar);
		self
	}

	/// Uses `scheduler` for lazy components and enter callbacks.
	pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
		self.scheduler = Some(scheduler);
		self
	}

	/// The configured settings.
	pub fn settings(&self) -> &RouterSettings {
		&self.settings
	}
}

impl Default for RouterOptions {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for RouterOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterOptions")
			.field("routes", &self.routes.len())
			.field("settings", &self.settings)
			.field("has_url_bar", &self.url_bar.is_some())
			.field("has_scheduler", &self.scheduler.is_some())
			.finish()
	}
}
