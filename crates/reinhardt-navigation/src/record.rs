//! Route configuration and compiled route records.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use reinhardt_route_pattern::{Key, PathPattern, PatternOptions};
use serde_json::Value;

use crate::error::NavigationError;
use crate::guard::{NavigationGuard, Next};
use crate::location::RawLocation;
use crate::resolve::{ComponentResolver, FactoryOutput};
use crate::route::Route;

/// Free-form route metadata.
pub type Meta = serde_json::Map<String, Value>;

/// A live component instance registered by the view layer.
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// Name of the view slot used when a route has a single component.
pub const DEFAULT_SLOT: &str = "default";

/// A view component that can contribute in-component guards.
///
/// All hooks default to none.
pub trait RouteComponent: Send + Sync + 'static {
	/// Guards run before the component's route is entered.
	fn before_route_enter(&self) -> Vec<NavigationGuard> {
		Vec::new()
	}

	/// Guards run when the component is reused for a new route.
	fn before_route_update(&self) -> Vec<NavigationGuard> {
		Vec::new()
	}

	/// Guards run before the component's route is left.
	fn before_route_leave(&self) -> Vec<NavigationGuard> {
		Vec::new()
	}
}

/// Factory of a lazily loaded component.
pub type LazyComponent = Arc<dyn Fn(ComponentResolver) -> FactoryOutput + Send + Sync>;

/// A component bound to a view slot.
#[derive(Clone)]
pub enum Component {
	/// A ready component.
	View(Arc<dyn RouteComponent>),
	/// A factory resolved during navigation.
	Lazy(LazyComponent),
	/// An unresolved identifier. Rejected when building the route tree.
	Id(String),
}

impl Component {
	/// Wraps a ready component.
	pub fn view(component: impl RouteComponent) -> Self {
		Component::View(Arc::new(component))
	}

	/// Wraps a lazy factory.
	pub fn lazy<F>(factory: F) -> Self
	where
		F: Fn(ComponentResolver) -> FactoryOutput + Send + Sync + 'static,
	{
		Component::Lazy(Arc::new(factory))
	}

	/// Returns the ready component.
	pub fn as_view(&self) -> Option<&Arc<dyn RouteComponent>> {
		match self {
			Component::View(component) => Some(component),
			_ => None,
		}
	}

	/// Whether this is still an unresolved factory.
	pub fn is_lazy(&self) -> bool {
		matches!(self, Component::Lazy(_))
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Component::View(_) => f.write_str("Component::View"),
			Component::Lazy(_) => f.write_str("Component::Lazy"),
			Component::Id(id) => f.debug_tuple("Component::Id").field(id).finish(),
		}
	}
}

/// Dynamic redirect callback. Returning `None` is an invalid redirect.
pub type RedirectFn = Arc<dyn Fn(&Route) -> Option<RawLocation> + Send + Sync>;

/// Where a route redirects to.
#[derive(Clone)]
pub enum Redirect {
	/// A fixed target.
	To(RawLocation),
	/// A target computed from the route being redirected.
	Dynamic(RedirectFn),
}

impl fmt::Debug for Redirect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Redirect::To(target) => f.debug_tuple("Redirect::To").field(target).finish(),
			Redirect::Dynamic(_) => f.write_str("Redirect::Dynamic"),
		}
	}
}

/// Props passed to a view slot.
#[derive(Clone)]
pub enum RouteProps {
	/// `true` passes the route params as props.
	Params(bool),
	/// Fixed props.
	Static(Meta),
	/// Props computed from the current route.
	Dynamic(Arc<dyn Fn(&Route) -> Meta + Send + Sync>),
}

impl RouteProps {
	/// Resolves the props for `route`. `None` means no props.
	pub fn resolve(&self, route: &Route) -> Option<Meta> {
		match self {
			RouteProps::Params(false) => None,
			RouteProps::Params(true) => match serde_json::to_value(route.params()) {
				Ok(Value::Object(params)) => Some(params),
				_ => None,
			},
			RouteProps::Static(props) => Some(props.clone()),
			RouteProps::Dynamic(props) => Some(props(route)),
		}
	}
}

impl fmt::Debug for RouteProps {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RouteProps::Params(enabled) => f.debug_tuple("RouteProps::Params").field(enabled).finish(),
			RouteProps::Static(props) => f.debug_tuple("RouteProps::Static").field(props).finish(),
			RouteProps::Dynamic(_) => f.write_str("RouteProps::Dynamic"),
		}
	}
}

/// Declarative route definition.
///
/// ```
/// use reinhardt_navigation::{Component, RouteComponent, RouteConfig};
///
/// struct Users;
/// impl RouteComponent for Users {}
///
/// let config = RouteConfig::new("/users/:id")
/// 	.with_name("user")
/// 	.with_component(Component::view(Users))
/// 	.with_alias("/u/:id");
/// assert_eq!(config.path(), Some("/users/:id"));
/// ```
#[derive(Clone, Default)]
pub struct RouteConfig {
	pub(crate) path: Option<String>,
	pub(crate) name: Option<String>,
	pub(crate) component: Option<Component>,
	pub(crate) components: BTreeMap<String, Component>,
	pub(crate) redirect: Option<Redirect>,
	pub(crate) aliases: Vec<String>,
	pub(crate) children: Vec<RouteConfig>,
	pub(crate) meta: Meta,
	pub(crate) before_enter: Option<NavigationGuard>,
	pub(crate) props: Option<RouteProps>,
	pub(crate) slot_props: BTreeMap<String, RouteProps>,
	pub(crate) case_sensitive: Option<bool>,
	pub(crate) pattern_options: Option<PatternOptions>,
	pub(crate) async_all: bool,
	pub(crate) async_slots: BTreeMap<String, bool>,
}

impl RouteConfig {
	/// Creates a config for `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: Some(path.into()),
			..Self::default()
		}
	}

	/// Path of the config, if set.
	pub fn path(&self) -> Option<&str> {
		self.path.as_deref()
	}

	/// Name of the config, if set.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Sets the route name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the component of the `default` slot.
	pub fn with_component(mut self, component: Component) -> Self {
		self.component = Some(component);
		self
	}

	/// Sets the component of a named slot.
	pub fn with_named_component(mut self, slot: impl Into<String>, component: Component) -> Self {
		self.components.insert(slot.into(), component);
		self
	}

	/// Redirects to a fixed target.
	pub fn with_redirect(mut self, target: impl Into<RawLocation>) -> Self {
		self.redirect = Some(Redirect::To(target.into()));
		self
	}

	/// Redirects to a target computed from the matched route.
	pub fn with_redirect_fn<F>(mut self, redirect: F) -> Self
	where
		F: Fn(&Route) -> Option<RawLocation> + Send + Sync + 'static,
	{
		self.redirect = Some(Redirect::Dynamic(Arc::new(redirect)));
		self
	}

	/// Adds an alternate path that renders this route.
	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		self.aliases.push(alias.into());
		self
	}

	/// Adds a nested route.
	pub fn with_child(mut self, child: RouteConfig) -> Self {
		self.children.push(child);
		self
	}

	/// Adds nested routes.
	pub fn with_children(mut self, children: impl IntoIterator<Item = RouteConfig>) -> Self {
		self.children.extend(children);
		self
	}

	/// Sets one meta entry.
	pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Sets the per-route enter guard.
	pub fn with_before_enter<F>(mut self, guard: F) -> Self
	where
		F: Fn(&Route, &Route, Next) -> Result<(), NavigationError> + Send + Sync + 'static,
	{
		self.before_enter = Some(Arc::new(guard));
		self
	}

	/// Sets the props of the `default` slot.
	pub fn with_props(mut self, props: RouteProps) -> Self {
		self.props = Some(props);
		self
	}

	/// Sets the props of a named slot.
	pub fn with_slot_props(mut self, slot: impl Into<String>, props: RouteProps) -> Self {
		self.slot_props.insert(slot.into(), props);
		self
	}

	/// Matches the path case-sensitively.
	pub fn with_case_sensitive(mut self, sensitive: bool) -> Self {
		self.case_sensitive = Some(sensitive);
		self
	}

	/// Overrides the pattern compiler options.
	pub fn with_pattern_options(mut self, options: PatternOptions) -> Self {
		self.pattern_options = Some(options);
		self
	}

	/// Marks every slot of this route as async.
	pub fn with_async(mut self, enabled: bool) -> Self {
		self.async_all = enabled;
		self
	}

	/// Marks one slot as async.
	pub fn with_async_slot(mut self, slot: impl Into<String>, enabled: bool) -> Self {
		self.async_slots.insert(slot.into(), enabled);
		self
	}

	pub(crate) fn slot_components(&self) -> BTreeMap<String, Component> {
		let mut components = self.components.clone();
		if let Some(component) = &self.component {
			components.insert(DEFAULT_SLOT.to_string(), component.clone());
		}
		components
	}

	pub(crate) fn slot_props_map(&self) -> BTreeMap<String, RouteProps> {
		if !self.components.is_empty() {
			return self.slot_props.clone();
		}
		let mut props = self.slot_props.clone();
		if let Some(default) = &self.props {
			props.insert(DEFAULT_SLOT.to_string(), default.clone());
		}
		props
	}

	/// A config for `alias` that renders the same components as `self`.
	pub(crate) fn alias_config(&self, alias: &str) -> RouteConfig {
		RouteConfig {
			path: Some(alias.to_string()),
			name: None,
			redirect: None,
			aliases: Vec::new(),
			..self.clone()
		}
	}
}

impl fmt::Debug for RouteConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteConfig")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("components", &self.slot_components())
			.field("redirect", &self.redirect)
			.field("aliases", &self.aliases)
			.field("children", &self.children)
			.field("meta", &self.meta)
			.field("has_before_enter", &self.before_enter.is_some())
			.finish()
	}
}

pub(crate) struct RecordParts {
	pub path: String,
	pub pattern: PathPattern,
	pub name: Option<String>,
	pub parent: Option<Arc<RouteRecord>>,
	pub match_as: Option<String>,
	pub redirect: Option<Redirect>,
	pub before_enter: Option<NavigationGuard>,
	pub meta: Meta,
	pub props: BTreeMap<String, RouteProps>,
	pub components: BTreeMap<String, Component>,
	pub async_flags: BTreeMap<String, bool>,
}

/// A compiled route in the route tree.
///
/// Records are immutable except for their component slots, which lazy
/// loading fills in, and their instance slots, which the view layer
/// maintains.
pub struct RouteRecord {
	path: String,
	pattern: PathPattern,
	name: Option<String>,
	parent: Option<Arc<RouteRecord>>,
	match_as: Option<String>,
	redirect: Option<Redirect>,
	before_enter: Option<NavigationGuard>,
	meta: Meta,
	props: BTreeMap<String, RouteProps>,
	components: Mutex<BTreeMap<String, Component>>,
	async_flags: Mutex<BTreeMap<String, bool>>,
	instances: Mutex<BTreeMap<String, ComponentInstance>>,
}

impl RouteRecord {
	pub(crate) fn from_parts(parts: RecordParts) -> Self {
		Self {
			path: parts.path,
			pattern: parts.pattern,
			name: parts.name,
			parent: parts.parent,
			match_as: parts.match_as,
			redirect: parts.redirect,
			before_enter: parts.before_enter,
			meta: parts.meta,
			props: parts.props,
			components: Mutex::new(parts.components),
			async_flags: Mutex::new(parts.async_flags),
			instances: Mutex::new(BTreeMap::new()),
		}
	}

	/// Normalized absolute path template.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Compiled path pattern.
	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	/// Capture keys of the path pattern.
	pub fn keys(&self) -> &[Key] {
		self.pattern.keys()
	}

	/// Route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Parent record.
	pub fn parent(&self) -> Option<&Arc<RouteRecord>> {
		self.parent.as_ref()
	}

	/// Canonical path template this alias record renders.
	pub fn match_as(&self) -> Option<&str> {
		self.match_as.as_deref()
	}

	/// Whether this record was registered for an alias.
	pub fn is_alias(&self) -> bool {
		self.match_as.is_some()
	}

	/// Redirect target.
	pub fn redirect(&self) -> Option<&Redirect> {
		self.redirect.as_ref()
	}

	/// Per-route enter guard.
	pub fn before_enter(&self) -> Option<&NavigationGuard> {
		self.before_enter.as_ref()
	}

	/// Route metadata.
	pub fn meta(&self) -> &Meta {
		&self.meta
	}

	/// Props config of a slot.
	pub fn props(&self, slot: &str) -> Option<&RouteProps> {
		self.props.get(slot)
	}

	/// Resolves the props of `slot` for `route`.
	pub fn resolve_props(&self, slot: &str, route: &Route) -> Option<Meta> {
		self.props(slot).and_then(|props| props.resolve(route))
	}

	/// Snapshot of the slot components.
	pub fn components(&self) -> BTreeMap<String, Component> {
		self.components.lock().clone()
	}

	/// Component of one slot.
	pub fn component(&self, slot: &str) -> Option<Component> {
		self.components.lock().get(slot).cloned()
	}

	/// Whether `slot` is flagged async.
	pub fn is_async(&self, slot: &str) -> bool {
		self.async_flags.lock().get(slot).copied().unwrap_or(false)
	}

	/// Records the live instance rendered for `slot`.
	pub fn register_instance(&self, slot: impl Into<String>, instance: ComponentInstance) {
		self.instances.lock().insert(slot.into(), instance);
	}

	/// Forgets the instance of `slot`.
	pub fn unregister_instance(&self, slot: &str) -> Option<ComponentInstance> {
		self.instances.lock().remove(slot)
	}

	/// Live instance of `slot`.
	pub fn instance(&self, slot: &str) -> Option<ComponentInstance> {
		self.instances.lock().get(slot).cloned()
	}

	/// Records ordered from the root to `self`.
	pub fn chain(self: &Arc<Self>) -> Vec<Arc<RouteRecord>> {
		let mut chain = vec![Arc::clone(self)];
		let mut parent = self.parent.clone();
		while let Some(record) = parent {
			parent = record.parent.clone();
			chain.push(record);
		}
		chain.reverse();
		chain
	}

	/// Ready components with their slots.
	pub(crate) fn views(&self) -> Vec<(String, Arc<dyn RouteComponent>)> {
		self.components
			.lock()
			.iter()
			.filter_map(|(slot, component)| component.as_view().map(|view| (slot.clone(), Arc::clone(view))))
			.collect()
	}

	/// Unresolved factories with their slots.
	pub(crate) fn lazy_components(&self) -> Vec<(String, LazyComponent)> {
		self.components
			.lock()
			.iter()
			.filter_map(|(slot, component)| match component {
				Component::Lazy(factory) => Some((slot.clone(), Arc::clone(factory))),
				_ => None,
			})
			.collect()
	}

	/// Stores the resolved component of `slot` and clears its async flag.
	pub(crate) fn set_resolved(&self, slot: &str, component: Arc<dyn RouteComponent>) {
		self.components
			.lock()
			.insert(slot.to_string(), Component::View(component));
		self.async_flags.lock().insert(slot.to_string(), false);
	}
}

impl fmt::Debug for RouteRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRecord")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("parent", &self.parent.as_ref().map(|parent| parent.path()))
			.field("match_as", &self.match_as)
			.field("redirect", &self.redirect)
			.field("meta", &self.meta)
			.field("has_before_enter", &self.before_enter.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::location::Location;
	use crate::query::QueryCodec;
	use crate::testing::Blank;
	use reinhardt_route_pattern::ParamValue;
	use rstest::rstest;
	use serde_json::json;

	fn route_with_params() -> Route {
		let location = Location::from_path("/users/1").with_param("id", "1");
		Route::new(None, &location, None, &QueryCodec::new())
	}

	#[rstest]
	fn test_props_params_become_object() {
		// Act
		let props = RouteProps::Params(true).resolve(&route_with_params());

		// Assert
		assert_eq!(props.unwrap()["id"], json!("1"));
		assert!(RouteProps::Params(false).resolve(&route_with_params()).is_none());
	}

	#[rstest]
	fn test_props_dynamic_reads_route() {
		// Arrange
		let props = RouteProps::Dynamic(Arc::new(|route: &Route| {
			let mut props = Meta::new();
			props.insert("path".to_string(), json!(route.path()));
			props
		}));

		// Act
		let resolved = props.resolve(&route_with_params()).unwrap();

		// Assert
		assert_eq!(resolved["path"], json!("/users/1"));
	}

	#[rstest]
	fn test_default_props_apply_only_without_named_components() {
		// Arrange
		let single = RouteConfig::new("/a")
			.with_component(Blank::view())
			.with_props(RouteProps::Params(true));
		let named = RouteConfig::new("/b")
			.with_named_component("side", Blank::view())
			.with_props(RouteProps::Params(true));

		// Act & Assert
		assert!(single.slot_props_map().contains_key(DEFAULT_SLOT));
		assert!(named.slot_props_map().is_empty());
	}

	#[rstest]
	fn test_alias_config_drops_name_redirect_and_aliases() {
		// Arrange
		let config = RouteConfig::new("/a")
			.with_name("a")
			.with_component(Blank::view())
			.with_meta("auth", true)
			.with_alias("/b");

		// Act
		let alias = config.alias_config("/b");

		// Assert
		assert_eq!(alias.path(), Some("/b"));
		assert!(alias.name().is_none());
		assert!(alias.aliases.is_empty());
		assert!(alias.slot_components().contains_key(DEFAULT_SLOT));
		assert_eq!(alias.meta["auth"], json!(true));
	}

	#[rstest]
	fn test_instances_register_and_unregister() {
		// Arrange
		let record = RouteRecord::from_parts(RecordParts {
			path: "/a".to_string(),
			pattern: PathPattern::compile("/a", &PatternOptions::default()).unwrap(),
			name: None,
			parent: None,
			match_as: None,
			redirect: None,
			before_enter: None,
			meta: Meta::new(),
			props: BTreeMap::new(),
			components: BTreeMap::new(),
			async_flags: BTreeMap::new(),
		});
		let instance: ComponentInstance = Arc::new(42_u32);

		// Act
		record.register_instance(DEFAULT_SLOT, instance);
		let found = record.instance(DEFAULT_SLOT);
		let removed = record.unregister_instance(DEFAULT_SLOT);

		// Assert
		assert_eq!(found.unwrap().downcast_ref::<u32>(), Some(&42));
		assert!(removed.is_some());
		assert!(record.instance(DEFAULT_SLOT).is_none());
	}

	#[rstest]
	fn test_param_value_serializes_lists() {
		// Arrange
		let location = Location::from_path("/a/b").with_param("segments", ParamValue::List(vec!["a".into(), "b".into()]));
		let route = Route::new(None, &location, None, &QueryCodec::new());

		// Act
		let props = RouteProps::Params(true).resolve(&route).unwrap();

		// Assert
		assert_eq!(props["segments"], json!(["a", "b"]));
	}
}
