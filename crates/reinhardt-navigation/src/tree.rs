//! Flattened route tree built from nested configs.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use reinhardt_route_pattern::{PathPattern, PatternOptions};

use crate::error::ConfigError;
use crate::logging::{debug_log, warn_log};
use crate::path::{clean_path, normalize_path};
use crate::record::{Component, RecordParts, RouteConfig, RouteRecord};

/// Records indexed by path and by name, with paths kept in match priority
/// order.
///
/// Children are registered before their parent, so nested routes win over
/// their ancestors, and `*` is always tried last.
#[derive(Debug, Default)]
pub struct RouteTree {
	path_list: Vec<String>,
	path_map: HashMap<String, Arc<RouteRecord>>,
	name_map: HashMap<String, Arc<RouteRecord>>,
}

impl RouteTree {
	/// Creates an empty tree.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a tree from `configs`.
	pub fn build(configs: &[RouteConfig]) -> Result<Self, ConfigError> {
		let mut tree = Self::new();
		tree.add_routes(configs)?;
		Ok(tree)
	}

	/// Registers `configs` on top of the existing records.
	///
	/// A path that is already registered keeps its first record; so does a
	/// name, with a warning.
	pub fn add_routes(&mut self, configs: &[RouteConfig]) -> Result<(), ConfigError> {
		for config in configs {
			self.add_record(config, None, None, false)?;
		}
		self.wildcard_to_end();
		Ok(())
	}

	/// Paths in match priority order.
	pub fn path_list(&self) -> &[String] {
		&self.path_list
	}

	/// Record registered under `path`.
	pub fn by_path(&self, path: &str) -> Option<&Arc<RouteRecord>> {
		self.path_map.get(path)
	}

	/// Record registered under `name`.
	pub fn by_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
		self.name_map.get(name)
	}

	/// Records in match priority order.
	pub fn records(&self) -> impl Iterator<Item = &Arc<RouteRecord>> {
		self.path_list.iter().filter_map(|path| self.path_map.get(path))
	}

	/// Number of registered paths.
	pub fn len(&self) -> usize {
		self.path_list.len()
	}

	/// Whether no route is registered.
	pub fn is_empty(&self) -> bool {
		self.path_list.is_empty()
	}

	fn add_record(
		&mut self,
		config: &RouteConfig,
		parent: Option<&Arc<RouteRecord>>,
		match_as: Option<String>,
		alias_derived: bool,
	) -> Result<(), ConfigError> {
		let Some(raw_path) = config.path.as_deref() else {
			return Err(ConfigError::MissingPath {
				name: config.name.clone(),
			});
		};
		let components = config.slot_components();
		if components
			.values()
			.any(|component| matches!(component, Component::Id(_)))
		{
			return Err(ConfigError::StringComponent {
				path: raw_path.to_string(),
			});
		}
		if components.is_empty() && config.redirect.is_none() && !alias_derived {
			return Err(ConfigError::MissingComponent {
				path: raw_path.to_string(),
			});
		}

		let mut options = config.pattern_options.clone().unwrap_or_default();
		if let Some(sensitive) = config.case_sensitive {
			options = options.with_sensitive(sensitive);
		}
		let path = normalize_path(
			raw_path,
			parent.map(|parent| parent.path()),
			options.strict,
		);
		let pattern = compile(&path, &options)?;
		warn_duplicate_keys(&pattern, &path);

		let mut async_flags = BTreeMap::new();
		for slot in components.keys() {
			let flag = config
				.async_slots
				.get(slot)
				.copied()
				.unwrap_or(config.async_all);
			async_flags.insert(slot.clone(), flag);
		}

		let record = Arc::new(RouteRecord::from_parts(RecordParts {
			path: path.clone(),
			pattern,
			name: config.name.clone(),
			parent: parent.cloned(),
			match_as: match_as.clone(),
			redirect: config.redirect.clone(),
			before_enter: config.before_enter.clone(),
			meta: config.meta.clone(),
			props: config.slot_props_map(),
			components,
			async_flags,
		}));

		if let Some(name) = &config.name
			&& config.redirect.is_none()
			&& config
				.children
				.iter()
				.any(|child| matches!(child.path.as_deref(), Some("" | "/")))
		{
			warn_log!(
				"named route '{}' has a default child route. When navigating to this named route, the default child route will not be rendered. Remove the name from this route and use the name of the default child route for named links instead.",
				name
			);
		}

		for child in &config.children {
			let child_match_as = match_as.as_deref().map(|match_as| {
				clean_path(&format!("{}/{}", match_as, child.path.as_deref().unwrap_or("")))
			});
			self.add_record(child, Some(&record), child_match_as, alias_derived)?;
		}

		for alias in &config.aliases {
			let alias_config = config.alias_config(alias);
			let canonical = if record.path().is_empty() {
				"/".to_string()
			} else {
				record.path().to_string()
			};
			self.add_record(&alias_config, parent, Some(canonical), true)?;
		}

		if let Entry::Vacant(entry) = self.path_map.entry(path.clone()) {
			self.path_list.push(path.clone());
			entry.insert(Arc::clone(&record));
		} else {
			debug_log!("path {:?} is already registered, keeping the first record", path);
		}

		if let Some(name) = &config.name {
			match self.name_map.entry(name.clone()) {
				Entry::Vacant(entry) => {
					entry.insert(record);
				}
				Entry::Occupied(_) if match_as.is_none() => {
					warn_log!("duplicate named routes definition: {{ name: \"{}\", path: \"{}\" }}", name, path);
				}
				Entry::Occupied(_) => {}
			}
		}

		Ok(())
	}

	fn wildcard_to_end(&mut self) {
		if let Some(index) = self.path_list.iter().position(|path| path == "*") {
			let wildcard = self.path_list.remove(index);
			self.path_list.push(wildcard);
		}
	}
}

fn compile(path: &str, options: &PatternOptions) -> Result<PathPattern, ConfigError> {
	PathPattern::compile(path, options).map_err(|source| ConfigError::Pattern {
		path: path.to_string(),
		source,
	})
}

fn warn_duplicate_keys(pattern: &PathPattern, path: &str) {
	let mut seen = HashSet::new();
	for key in pattern.keys() {
		if !seen.insert(key.param_name()) {
			warn_log!("duplicate param keys in route with path: \"{}\"", path);
		}
	}
}
