//! The router facade.

use std::fmt;
use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::error::{ConfigError, NavigationError, NavigationFailure};
use crate::guard::Next;
use crate::history::{BrowserHistory, HashHistory, HistoryBackend, HistoryMode, MemoryHistory, UrlBar};
use crate::hooks::{HookHandle, HookKind};
use crate::location::{Location, RawLocation};
use crate::logging::{debug_log, warn_log};
use crate::matcher::Matcher;
use crate::options::RouterOptions;
use crate::record::{Component, RouteConfig};
use crate::route::Route;
use crate::scheduler::Scheduler;
use crate::transition::{Navigator, OnAbort, OnComplete};

/// Result of [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
	/// The normalized target.
	pub location: Location,
	/// The route it resolves to.
	pub route: Route,
	/// Link target, with the base and mode applied.
	pub href: String,
}

/// Client-side router.
///
/// Cloning is cheap; clones share state.
///
/// # Examples
///
/// ```
/// use reinhardt_navigation::{Component, RouteComponent, RouteConfig, Router, RouterOptions};
///
/// struct Page;
/// impl RouteComponent for Page {}
///
/// let router = Router::new(
/// 	RouterOptions::new()
/// 		.with_route(RouteConfig::new("/").with_component(Component::view(Page)))
/// 		.with_route(RouteConfig::new("/users/:id").with_name("user").with_component(Component::view(Page))),
/// )
/// .unwrap();
///
/// router.push("/users/7?tab=posts");
/// assert_eq!(router.current_route().full_path(), "/users/7?tab=posts");
/// assert_eq!(router.current_route().name(), Some("user"));
/// ```
#[derive(Clone)]
pub struct Router {
	navigator: Arc<Navigator>,
}

impl Router {
	/// Builds a router.
	///
	/// History and hash modes need an address bar: the window's on wasm, or
	/// one supplied with [`RouterOptions::with_url_bar`]. Without one the
	/// router falls back to abstract mode. A history router whose address
	/// bar cannot push entries switches to hash mode unless the fallback is
	/// disabled.
	pub fn new(options: RouterOptions) -> Result<Self, ConfigError> {
		let RouterOptions {
			routes,
			settings,
			codec,
			url_bar,
			scheduler,
		} = options;
		let matcher = Matcher::new(&routes, codec)?;

		let url_bar = url_bar.or_else(default_url_bar);
		let requested = settings.mode.unwrap_or_default();
		let fallback = requested == HistoryMode::History
			&& settings.fallback
			&& url_bar.as_ref().is_some_and(|bar| !bar.supports_push_state());
		let mode = if fallback { HistoryMode::Hash } else { requested };

		let backend: Box<dyn HistoryBackend> = match (mode, url_bar) {
			(HistoryMode::History, Some(bar)) => Box::new(BrowserHistory::new(bar, &settings.base)),
			(HistoryMode::Hash, Some(bar)) => Box::new(HashHistory::new(bar, &settings.base, fallback)),
			(HistoryMode::Abstract, _) => Box::new(MemoryHistory::new(&settings.base)),
			(mode, None) => {
				warn_log!("{} mode needs an address bar; using abstract history", mode);
				Box::new(MemoryHistory::new(&settings.base))
			}
		};

		let navigator = Arc::new(Navigator::new(matcher, backend));
		if let Some(scheduler) = scheduler {
			navigator.attach_scheduler(scheduler);
		}
		if navigator.backend().mode() == HistoryMode::History {
			navigator.start_listening();
		}
		debug_log!(mode = %navigator.backend().mode(), routes = routes.len(), "router created");
		Ok(Self { navigator })
	}

	/// Runs the initial navigation from the address bar. Hash mode starts
	/// following address bar changes once it settles. Abstract routers wait
	/// for the first [`Router::push`].
	pub fn init(&self) {
		self.navigator.init();
	}

	/// The committed route.
	pub fn current_route(&self) -> Arc<Route> {
		self.navigator.current()
	}

	/// Whether a navigation is waiting on its guards.
	pub fn is_navigating(&self) -> bool {
		self.navigator.is_pending()
	}

	/// The active history mode.
	pub fn mode(&self) -> HistoryMode {
		self.navigator.backend().mode()
	}

	/// The normalized base path.
	pub fn base(&self) -> &str {
		self.navigator.backend().base()
	}

	/// The history backend.
	pub fn history(&self) -> &dyn HistoryBackend {
		self.navigator.backend()
	}

	/// Navigates to `to`, adding a history entry.
	pub fn push(&self, to: impl Into<RawLocation>) {
		self.navigator.push(to.into(), None, None);
	}

	/// Like [`Router::push`], reporting the outcome to callbacks.
	pub fn push_with<C, A>(&self, to: impl Into<RawLocation>, on_complete: C, on_abort: A)
	where
		C: FnOnce(&Arc<Route>) + Send + 'static,
		A: FnOnce(Option<&NavigationError>) + Send + 'static,
	{
		self.navigator
			.push(to.into(), Some(Box::new(on_complete)), Some(Box::new(on_abort)));
	}

	/// Like [`Router::push`], resolving once the navigation settles.
	pub fn push_async(
		&self,
		to: impl Into<RawLocation>,
	) -> impl Future<Output = Result<Arc<Route>, NavigationFailure>> + Send + 'static {
		let (on_complete, on_abort, outcome) = settle_channel();
		self.navigator.push(to.into(), Some(on_complete), Some(on_abort));
		outcome
	}

	/// Navigates to `to`, replacing the current history entry.
	pub fn replace(&self, to: impl Into<RawLocation>) {
		self.navigator.replace(to.into(), None, None);
	}

	/// Like [`Router::replace`], reporting the outcome to callbacks.
	pub fn replace_with<C, A>(&self, to: impl Into<RawLocation>, on_complete: C, on_abort: A)
	where
		C: FnOnce(&Arc<Route>) + Send + 'static,
		A: FnOnce(Option<&NavigationError>) + Send + 'static,
	{
		self.navigator
			.replace(to.into(), Some(Box::new(on_complete)), Some(Box::new(on_abort)));
	}

	/// Like [`Router::replace`], resolving once the navigation settles.
	pub fn replace_async(
		&self,
		to: impl Into<RawLocation>,
	) -> impl Future<Output = Result<Arc<Route>, NavigationFailure>> + Send + 'static {
		let (on_complete, on_abort, outcome) = settle_channel();
		self.navigator.replace(to.into(), Some(on_complete), Some(on_abort));
		outcome
	}

	/// Moves `delta` entries through history.
	pub fn go(&self, delta: isize) {
		self.navigator.go(delta);
	}

	/// One entry back.
	pub fn back(&self) {
		self.go(-1);
	}

	/// One entry forward.
	pub fn forward(&self) {
		self.go(1);
	}

	/// Registers a guard run before every navigation.
	pub fn before_each<F>(&self, guard: F) -> HookHandle
	where
		F: Fn(&Route, &Route, Next) -> Result<(), NavigationError> + Send + Sync + 'static,
	{
		let id = self
			.navigator
			.hooks()
			.write()
			.add_guard(HookKind::BeforeEach, Arc::new(guard));
		HookHandle::new(self.navigator.hooks(), HookKind::BeforeEach, id)
	}

	/// Registers a guard run after in-component enter guards and lazy
	/// components have resolved.
	pub fn before_resolve<F>(&self, guard: F) -> HookHandle
	where
		F: Fn(&Route, &Route, Next) -> Result<(), NavigationError> + Send + Sync + 'static,
	{
		let id = self
			.navigator
			.hooks()
			.write()
			.add_guard(HookKind::BeforeResolve, Arc::new(guard));
		HookHandle::new(self.navigator.hooks(), HookKind::BeforeResolve, id)
	}

	/// Registers a hook run after every committed navigation.
	pub fn after_each<F>(&self, hook: F) -> HookHandle
	where
		F: Fn(&Route, &Route) + Send + Sync + 'static,
	{
		let id = self.navigator.hooks().write().add_after(Arc::new(hook));
		HookHandle::new(self.navigator.hooks(), HookKind::AfterEach, id)
	}

	/// Registers a handler for navigation errors. Without any handler,
	/// errors are logged.
	pub fn on_error<F>(&self, handler: F) -> HookHandle
	where
		F: Fn(&NavigationError) + Send + Sync + 'static,
	{
		let id = self.navigator.hooks().write().add_error(Arc::new(handler));
		HookHandle::new(self.navigator.hooks(), HookKind::Error, id)
	}

	/// Runs `callback` once the initial navigation has committed, or right
	/// away if it already has.
	pub fn on_ready<F>(&self, callback: F)
	where
		F: FnOnce(&Arc<Route>) + Send + 'static,
	{
		self.navigator.on_ready(Box::new(callback), None);
	}

	/// Like [`Router::on_ready`]; `on_error` runs instead if the initial
	/// navigation fails with an error.
	pub fn on_ready_or_error<F, E>(&self, callback: F, on_error: E)
	where
		F: FnOnce(&Arc<Route>) + Send + 'static,
		E: FnOnce(&NavigationError) + Send + 'static,
	{
		self.navigator
			.on_ready(Box::new(callback), Some(Box::new(on_error)));
	}

	/// Sets the listener told about every committed route, replacing any
	/// previous one. This is where a view layer re-renders.
	pub fn listen<F>(&self, listener: F)
	where
		F: Fn(&Arc<Route>) + Send + Sync + 'static,
	{
		self.navigator.set_listener(Arc::new(listener));
	}

	/// Resolves `to` without navigating. Relative targets resolve against
	/// `current`, or the committed route.
	pub fn resolve(&self, to: impl Into<RawLocation>, current: Option<&Route>, append: bool) -> Resolved {
		let committed = self.current_route();
		let current = current.unwrap_or(&committed);
		let matcher = self.navigator.matcher();
		let location = matcher.normalize(to, Some(current), append);
		let route = matcher.match_route(location.clone(), Some(current));
		let full_path = route.redirected_from().unwrap_or(route.full_path());
		let href = self.navigator.backend().create_href(full_path);
		Resolved { location, route, href }
	}

	/// Resolves `to` into a route.
	pub fn match_route(&self, to: impl Into<RawLocation>, current: Option<&Route>) -> Route {
		self.navigator.matcher().match_route(to, current)
	}

	/// Adds routes. A router that has already navigated re-resolves its
	/// current location against the extended tree.
	pub fn add_routes(&self, routes: impl IntoIterator<Item = RouteConfig>) -> Result<(), ConfigError> {
		let routes: Vec<RouteConfig> = routes.into_iter().collect();
		self.navigator.matcher().add_routes(&routes)?;
		if !Route::is_start(&self.current_route()) {
			let location = self.navigator.backend().read_location();
			self.navigator.transition_to(location.into(), None, None);
		}
		Ok(())
	}

	/// Components of every record matched by `to`, or by the committed
	/// route.
	pub fn matched_components(&self, to: Option<RawLocation>) -> Vec<Component> {
		let route = match to {
			Some(to) => Arc::new(self.resolve(to, None, false).route),
			None => self.current_route(),
		};
		route
			.matched()
			.iter()
			.flat_map(|record| record.components().into_values())
			.collect()
	}

	/// Follows an address bar change made outside the router. Called by the
	/// registered change listener; hosts with their own event wiring may call
	/// it directly.
	pub fn handle_location_change(&self) {
		self.navigator.handle_location_change();
	}

	/// Uses `scheduler` for lazy components and enter callbacks.
	pub fn attach_scheduler(&self, scheduler: Arc<dyn Scheduler>) {
		self.navigator.attach_scheduler(scheduler);
	}
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("navigator", &self.navigator)
			.finish()
	}
}

#[cfg(target_arch = "wasm32")]
fn default_url_bar() -> Option<Arc<dyn UrlBar>> {
	web_sys::window().map(|_| Arc::new(crate::history::WindowUrlBar) as Arc<dyn UrlBar>)
}

#[cfg(not(target_arch = "wasm32"))]
fn default_url_bar() -> Option<Arc<dyn UrlBar>> {
	None
}

/// Callbacks that settle a future with the navigation outcome.
fn settle_channel() -> (
	OnComplete,
	OnAbort,
	impl Future<Output = Result<Arc<Route>, NavigationFailure>> + Send + 'static,
) {
	let (sender, receiver) = oneshot::channel();
	let sender = Arc::new(Mutex::new(Some(sender)));
	let completed = Arc::clone(&sender);

	let on_complete: OnComplete = Box::new(move |route| {
		let sender = completed.lock().take();
		if let Some(sender) = sender {
			let _ = sender.send(Ok(Arc::clone(route)));
		}
	});
	let on_abort: OnAbort = Box::new(move |error| {
		let sender = sender.lock().take();
		if let Some(sender) = sender {
			let _ = sender.send(Err(NavigationFailure::from(error.cloned())));
		}
	});
	let outcome = async move { receiver.await.unwrap_or(Err(NavigationFailure::Aborted)) };
	(on_complete, on_abort, outcome)
}
