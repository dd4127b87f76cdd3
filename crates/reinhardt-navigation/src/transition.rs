//! The navigation pipeline.
//!
//! A navigation resolves its target, diffs the matched records against the
//! current route, and runs the guard queue one guard at a time:
//!
//! 1. leave guards of deactivated components, innermost first
//! 2. global `before_each` hooks
//! 3. update guards of reused components
//! 4. `before_enter` of activated records
//! 5. lazy component resolution
//! 6. enter guards of activated components
//! 7. global `before_resolve` hooks
//!
//! Every navigation takes a fresh generation id. A guard continuation whose
//! id is no longer the pending one aborts instead of advancing, so a newer
//! navigation always wins.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::NavigationError;
use crate::guard::{EnterCallback, NavigationGuard, Next, NextAction, guard};
use crate::history::{HistoryBackend, HistoryMode, Traversal};
use crate::hooks::Hooks;
use crate::location::RawLocation;
use crate::logging::debug_log;
use crate::matcher::Matcher;
use crate::queue::{Advance, run_queue};
use crate::record::RouteRecord;
use crate::resolve::resolve_async_components;
use crate::route::{Route, is_same_route};
use crate::scheduler::{self, Scheduler, Task};

/// Interval between checks for a component instance awaited by an enter
/// callback.
const INSTANCE_POLL_INTERVAL: Duration = Duration::from_millis(16);

pub(crate) type RouteListener = Arc<dyn Fn(&Arc<Route>) + Send + Sync>;
pub(crate) type OnComplete = Box<dyn FnOnce(&Arc<Route>) + Send>;
pub(crate) type OnAbort = Box<dyn FnOnce(Option<&NavigationError>) + Send>;
pub(crate) type ReadyCallback = Box<dyn FnOnce(&Arc<Route>) + Send>;
pub(crate) type ReadyErrorCallback = Box<dyn FnOnce(&NavigationError) + Send>;

type Abort = Arc<dyn Fn(Option<NavigationError>) + Send + Sync>;

struct State {
	current: Arc<Route>,
	pending: Option<u64>,
	ready: bool,
	ready_callbacks: Vec<ReadyCallback>,
	ready_error_callbacks: Vec<ReadyErrorCallback>,
	listener: Option<RouteListener>,
}

/// Records split by how a navigation affects them.
#[derive(Debug, Default)]
struct QueueDiff {
	updated: Vec<Arc<RouteRecord>>,
	deactivated: Vec<Arc<RouteRecord>>,
	activated: Vec<Arc<RouteRecord>>,
}

/// Splits at the first position where the record chains differ.
fn resolve_queue(current: &[Arc<RouteRecord>], next: &[Arc<RouteRecord>]) -> QueueDiff {
	let shared = current
		.iter()
		.zip(next)
		.take_while(|(left, right)| Arc::ptr_eq(left, right))
		.count();
	QueueDiff {
		updated: next[..shared].to_vec(),
		deactivated: current[shared..].to_vec(),
		activated: next[shared..].to_vec(),
	}
}

fn leave_guards(records: &[Arc<RouteRecord>]) -> Vec<NavigationGuard> {
	let mut per_component: Vec<Vec<NavigationGuard>> = records
		.iter()
		.flat_map(|record| record.views())
		.map(|(_, component)| component.before_route_leave())
		.collect();
	per_component.reverse();
	per_component.into_iter().flatten().collect()
}

fn update_guards(records: &[Arc<RouteRecord>]) -> Vec<NavigationGuard> {
	records
		.iter()
		.flat_map(|record| record.views())
		.flat_map(|(_, component)| component.before_route_update())
		.collect()
}

fn enter_guards(
	records: &[Arc<RouteRecord>],
	callbacks: &Arc<Mutex<Vec<Task>>>,
	poller: &Arc<Poller>,
) -> Vec<NavigationGuard> {
	let mut guards = Vec::new();
	for record in records {
		for (slot, component) in record.views() {
			for inner in component.before_route_enter() {
				guards.push(bind_enter_guard(
					inner,
					Arc::clone(record),
					slot.clone(),
					Arc::clone(callbacks),
					Arc::clone(poller),
				));
			}
		}
	}
	guards
}

/// Collects `proceed_with` callbacks so they can run once the entered
/// component exists.
fn bind_enter_guard(
	inner: NavigationGuard,
	record: Arc<RouteRecord>,
	slot: String,
	callbacks: Arc<Mutex<Vec<Task>>>,
	poller: Arc<Poller>,
) -> NavigationGuard {
	guard(move |to, from, next| {
		let record = Arc::clone(&record);
		let slot = slot.clone();
		let callbacks = Arc::clone(&callbacks);
		let poller = Arc::clone(&poller);
		let next = next.intercept(move |action| match action {
			NextAction::ProceedWith(callback) => {
				callbacks
					.lock()
					.push(Box::new(move || poller.poll(record, slot, callback)));
				NextAction::Proceed
			}
			other => other,
		});
		inner(to, from, next)
	})
}

/// Waits for a component instance on behalf of an enter callback.
struct Poller {
	navigator: Weak<Navigator>,
	route: Arc<Route>,
	scheduler: Arc<dyn Scheduler>,
}

impl Poller {
	fn is_valid(&self) -> bool {
		self.navigator
			.upgrade()
			.is_some_and(|navigator| Arc::ptr_eq(&navigator.current(), &self.route))
	}

	fn poll(self: Arc<Self>, record: Arc<RouteRecord>, slot: String, callback: EnterCallback) {
		if let Some(instance) = record.instance(&slot) {
			callback(instance);
			return;
		}
		if !self.is_valid() {
			debug_log!("dropping enter callback for {}: route is no longer current", record.path());
			return;
		}
		let scheduler = Arc::clone(&self.scheduler);
		scheduler.schedule(
			INSTANCE_POLL_INTERVAL,
			Box::new(move || self.poll(record, slot, callback)),
		);
	}
}

/// Router state and the transition driver.
pub(crate) struct Navigator {
	matcher: Matcher,
	backend: Box<dyn HistoryBackend>,
	hooks: Arc<RwLock<Hooks>>,
	state: Mutex<State>,
	generation: AtomicU64,
	scheduler: RwLock<Option<Arc<dyn Scheduler>>>,
	initialized: AtomicBool,
	listening: AtomicBool,
}

impl Navigator {
	pub(crate) fn new(matcher: Matcher, backend: Box<dyn HistoryBackend>) -> Self {
		Self {
			matcher,
			backend,
			hooks: Arc::new(RwLock::new(Hooks::default())),
			state: Mutex::new(State {
				current: Route::start(),
				pending: None,
				ready: false,
				ready_callbacks: Vec::new(),
				ready_error_callbacks: Vec::new(),
				listener: None,
			}),
			generation: AtomicU64::new(0),
			scheduler: RwLock::new(None),
			initialized: AtomicBool::new(false),
			listening: AtomicBool::new(false),
		}
	}

	pub(crate) fn matcher(&self) -> &Matcher {
		&self.matcher
	}

	pub(crate) fn backend(&self) -> &dyn HistoryBackend {
		self.backend.as_ref()
	}

	pub(crate) fn hooks(&self) -> &Arc<RwLock<Hooks>> {
		&self.hooks
	}

	pub(crate) fn current(&self) -> Arc<Route> {
		Arc::clone(&self.state.lock().current)
	}

	pub(crate) fn is_pending(&self) -> bool {
		self.state.lock().pending.is_some()
	}

	pub(crate) fn set_listener(&self, listener: RouteListener) {
		self.state.lock().listener = Some(listener);
	}

	pub(crate) fn attach_scheduler(&self, scheduler: Arc<dyn Scheduler>) {
		*self.scheduler.write() = Some(scheduler);
	}

	/// The attached scheduler, or the platform default. Enter callbacks only
	/// run with an attached scheduler.
	pub(crate) fn scheduler(&self) -> Arc<dyn Scheduler> {
		self.scheduler.read().clone().unwrap_or_else(scheduler::fallback)
	}

	/// Runs the initial navigation from the backend's location.
	///
	/// Only the first call has an effect. The abstract backend has no
	/// location of its own, so it waits for the first explicit navigation.
	pub(crate) fn init(self: &Arc<Self>) {
		if self.initialized.swap(true, Ordering::SeqCst) {
			debug_log!("router already initialized");
			return;
		}
		match self.backend.mode() {
			HistoryMode::Abstract => {}
			HistoryMode::History => {
				let location = self.backend.read_location();
				self.transition_to(location.into(), None, None);
			}
			HistoryMode::Hash => {
				let location = self.backend.read_location();
				let on_complete = Arc::clone(self);
				let on_abort = Arc::clone(self);
				self.transition_to(
					location.into(),
					Some(Box::new(move |_| on_complete.start_listening())),
					Some(Box::new(move |_| on_abort.start_listening())),
				);
			}
		}
	}

	/// Subscribes to external URL changes. Only the first call registers.
	pub(crate) fn start_listening(self: &Arc<Self>) {
		if self.listening.swap(true, Ordering::SeqCst) {
			return;
		}
		let navigator = Arc::downgrade(self);
		self.backend.listen(Arc::new(move || {
			if let Some(navigator) = navigator.upgrade() {
				navigator.handle_location_change();
			}
		}));
	}

	/// Follows a URL change made outside the router.
	pub(crate) fn handle_location_change(self: &Arc<Self>) {
		let current = self.current();
		if let Some(location) = self.backend.external_location(&current) {
			debug_log!("external location change to {}", location);
			self.transition_to(location.into(), None, None);
		}
	}

	pub(crate) fn push(self: &Arc<Self>, to: RawLocation, on_complete: Option<OnComplete>, on_abort: Option<OnAbort>) {
		self.record(to, false, on_complete, on_abort);
	}

	pub(crate) fn replace(
		self: &Arc<Self>,
		to: RawLocation,
		on_complete: Option<OnComplete>,
		on_abort: Option<OnAbort>,
	) {
		self.record(to, true, on_complete, on_abort);
	}

	fn record(self: &Arc<Self>, to: RawLocation, replace: bool, on_complete: Option<OnComplete>, on_abort: Option<OnAbort>) {
		let navigator = Arc::clone(self);
		self.transition_to(
			to,
			Some(Box::new(move |route| {
				navigator.backend.persist(route, replace);
				if let Some(callback) = on_complete {
					callback(route);
				}
			})),
			on_abort,
		);
	}

	/// Moves `delta` entries through history.
	pub(crate) fn go(self: &Arc<Self>, delta: isize) {
		match self.backend.traverse(delta) {
			Traversal::Entry { index, route } => {
				let navigator = Arc::clone(self);
				let committed = Arc::clone(&route);
				self.confirm_transition(
					route,
					move || {
						navigator.backend.settle_traversal(index);
						navigator.update_route(committed);
					},
					|_| {},
				);
			}
			Traversal::Delegated => debug_log!("history move of {} handed to the address bar", delta),
			Traversal::None => debug_log!("history move of {} is out of range", delta),
		}
	}

	/// Resolves `to` and navigates to it without touching history entries.
	pub(crate) fn transition_to(
		self: &Arc<Self>,
		to: RawLocation,
		on_complete: Option<OnComplete>,
		on_abort: Option<OnAbort>,
	) {
		let current = self.current();
		let route = Arc::new(self.matcher.match_route(to, Some(&current)));
		let committed = Arc::clone(&route);
		let navigator = Arc::clone(self);
		let aborted = Arc::clone(self);
		self.confirm_transition(
			route,
			move || {
				navigator.update_route(Arc::clone(&committed));
				if let Some(callback) = on_complete {
					callback(&committed);
				}
				navigator.backend.ensure_synced(&navigator.current(), false);
				navigator.mark_ready(&committed);
			},
			move |error| {
				if let Some(callback) = on_abort {
					callback(error);
				}
				if let Some(error) = error {
					aborted.mark_ready_failed(error);
				}
			},
		);
	}

	fn confirm_transition<C, A>(self: &Arc<Self>, route: Arc<Route>, on_complete: C, on_abort: A)
	where
		C: FnOnce() + Send + 'static,
		A: FnOnce(Option<&NavigationError>) + Send + 'static,
	{
		let current = self.current();
		let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let settled = Arc::new(AtomicBool::new(false));
		let abort = self.abort_handle(id, Arc::clone(&settled), on_abort);

		if is_same_route(&route, &current) && route.matched().len() == current.matched().len() {
			debug_log!("navigation to {} stays on the current route", route.full_path());
			self.backend.ensure_synced(&current, false);
			abort(None);
			return;
		}

		let QueueDiff {
			updated,
			deactivated,
			activated,
		} = resolve_queue(current.matched(), route.matched());

		let mut queue = leave_guards(&deactivated);
		let before_each = self.hooks.read().before_each();
		queue.extend(before_each);
		queue.extend(update_guards(&updated));
		queue.extend(activated.iter().filter_map(|record| record.before_enter().cloned()));
		queue.push(resolve_async_components(activated.clone(), self.scheduler()));

		self.state.lock().pending = Some(id);
		let iterator = self.iterator(id, Arc::clone(&route), current, Arc::clone(&abort));
		let navigator = Arc::clone(self);

		run_queue(queue, Arc::clone(&iterator), move || {
			let callbacks: Arc<Mutex<Vec<Task>>> = Arc::default();
			let poller = Arc::new(Poller {
				navigator: Arc::downgrade(&navigator),
				route: Arc::clone(&route),
				scheduler: navigator.scheduler(),
			});
			let mut queue = enter_guards(&activated, &callbacks, &poller);
			let before_resolve = navigator.hooks.read().before_resolve();
			queue.extend(before_resolve);

			run_queue(queue, iterator, move || {
				if !navigator.take_pending(id) {
					abort(None);
					return;
				}
				settled.store(true, Ordering::SeqCst);
				on_complete();

				let callbacks = std::mem::take(&mut *callbacks.lock());
				if callbacks.is_empty() {
					return;
				}
				let attached = navigator.scheduler.read().clone();
				match attached {
					Some(scheduler) => scheduler.next_tick(Box::new(move || {
						for callback in callbacks {
							callback();
						}
					})),
					None => debug_log!("no scheduler attached; dropping {} enter callbacks", callbacks.len()),
				}
			});
		});
	}

	/// Builds the abort path of navigation `id`. The error, if any, always
	/// reaches the error handlers; `on_abort` runs at most once and never
	/// after completion.
	fn abort_handle<A>(self: &Arc<Self>, id: u64, settled: Arc<AtomicBool>, on_abort: A) -> Abort
	where
		A: FnOnce(Option<&NavigationError>) + Send + 'static,
	{
		let navigator = Arc::clone(self);
		let on_abort = Mutex::new(Some(on_abort));
		Arc::new(move |error: Option<NavigationError>| {
			navigator.take_pending(id);
			if let Some(error) = &error {
				navigator.report_error(error);
			}
			if settled.swap(true, Ordering::SeqCst) {
				return;
			}
			let callback = on_abort.lock().take();
			if let Some(callback) = callback {
				callback(error.as_ref());
			}
		})
	}

	fn iterator(
		self: &Arc<Self>,
		id: u64,
		route: Arc<Route>,
		current: Arc<Route>,
		abort: Abort,
	) -> Arc<impl Fn(NavigationGuard, Advance) + Send + Sync + 'static> {
		let navigator = Arc::clone(self);
		Arc::new(move |guard: NavigationGuard, advance: Advance| {
			if !navigator.is_pending_id(id) {
				debug_log!("navigation to {} was superseded", route.full_path());
				abort(None);
				return;
			}
			let called = Arc::new(AtomicBool::new(false));
			let next = Next::new(Arc::clone(&called), {
				let navigator = Arc::clone(&navigator);
				let abort = Arc::clone(&abort);
				move |action| navigator.resolve_action(action, &abort, advance)
			});
			if let Err(error) = guard(&route, &current, next) {
				debug_log!(
					next_called = called.load(Ordering::SeqCst),
					"navigation guard failed: {}",
					error
				);
				abort(Some(error));
			}
		})
	}

	fn resolve_action(self: &Arc<Self>, action: NextAction, abort: &Abort, advance: Advance) {
		match action {
			NextAction::Abort => {
				self.backend.ensure_synced(&self.current(), true);
				abort(None);
			}
			NextAction::Fail(error) => {
				self.backend.ensure_synced(&self.current(), true);
				abort(Some(error));
			}
			NextAction::Redirect(to) if to.has_destination() => {
				abort(None);
				if to.wants_replace() {
					self.replace(to, None, None);
				} else {
					self.push(to, None, None);
				}
			}
			NextAction::Redirect(_) | NextAction::Proceed | NextAction::ProceedWith(_) => advance(),
		}
	}

	fn is_pending_id(&self, id: u64) -> bool {
		self.state.lock().pending == Some(id)
	}

	/// Clears the pending navigation if it is `id`.
	fn take_pending(&self, id: u64) -> bool {
		let mut state = self.state.lock();
		if state.pending == Some(id) {
			state.pending = None;
			true
		} else {
			false
		}
	}

	fn update_route(&self, route: Arc<Route>) {
		let (previous, listener) = {
			let mut state = self.state.lock();
			let previous = std::mem::replace(&mut state.current, Arc::clone(&route));
			(previous, state.listener.clone())
		};
		if let Some(listener) = listener {
			listener(&route);
		}
		let after_each = self.hooks.read().after_each();
		for hook in after_each {
			hook(&route, &previous);
		}
	}

	fn report_error(&self, error: &NavigationError) {
		let handlers = self.hooks.read().errors();
		if handlers.is_empty() {
			tracing::error!(error = %error, "uncaught error during route navigation");
			return;
		}
		for handler in handlers {
			handler(error);
		}
	}

	pub(crate) fn on_ready(&self, callback: ReadyCallback, on_error: Option<ReadyErrorCallback>) {
		let current = {
			let mut state = self.state.lock();
			if !state.ready {
				state.ready_callbacks.push(callback);
				if let Some(on_error) = on_error {
					state.ready_error_callbacks.push(on_error);
				}
				return;
			}
			Arc::clone(&state.current)
		};
		callback(&current);
	}

	fn mark_ready(&self, route: &Arc<Route>) {
		let callbacks = {
			let mut state = self.state.lock();
			if state.ready {
				return;
			}
			state.ready = true;
			state.ready_error_callbacks.clear();
			std::mem::take(&mut state.ready_callbacks)
		};
		for callback in callbacks {
			callback(route);
		}
	}

	fn mark_ready_failed(&self, error: &NavigationError) {
		let callbacks = {
			let mut state = self.state.lock();
			if state.ready {
				return;
			}
			state.ready = true;
			state.ready_callbacks.clear();
			std::mem::take(&mut state.ready_error_callbacks)
		};
		for callback in callbacks {
			callback(error);
		}
	}
}

impl fmt::Debug for Navigator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("Navigator")
			.field("mode", &self.backend.mode())
			.field("current", &state.current.full_path())
			.field("pending", &state.pending)
			.field("ready", &state.ready)
			.field("has_listener", &state.listener.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::history::MemoryHistory;
	use crate::query::QueryCodec;
	use crate::record::{Component, RouteComponent, RouteConfig};
	use crate::testing::Blank;
	use rstest::rstest;

	fn records(routes: &[RouteConfig], path: &str) -> Vec<Arc<RouteRecord>> {
		let matcher = Matcher::new(routes, QueryCodec::new()).unwrap();
		matcher.match_route(path, None).matched().to_vec()
	}

	fn nested() -> Vec<RouteConfig> {
		vec![RouteConfig::new("/a").with_component(Blank::view()).with_children([
			RouteConfig::new("b").with_component(Blank::view()),
			RouteConfig::new("c").with_component(Blank::view()),
		])]
	}

	#[rstest]
	fn test_resolve_queue_splits_at_first_difference() {
		// Arrange
		let matcher = Matcher::new(&nested(), QueryCodec::new()).unwrap();
		let from = matcher.match_route("/a/b", None);
		let to = matcher.match_route("/a/c", None);

		// Act
		let diff = resolve_queue(from.matched(), to.matched());

		// Assert
		let paths = |records: &[Arc<RouteRecord>]| records.iter().map(|r| r.path().to_string()).collect::<Vec<_>>();
		assert_eq!(paths(&diff.updated), ["/a"]);
		assert_eq!(paths(&diff.deactivated), ["/a/b"]);
		assert_eq!(paths(&diff.activated), ["/a/c"]);
	}

	#[rstest]
	fn test_resolve_queue_from_empty_activates_all() {
		// Arrange
		let to = records(&nested(), "/a/b");

		// Act
		let diff = resolve_queue(&[], &to);

		// Assert
		assert!(diff.updated.is_empty());
		assert!(diff.deactivated.is_empty());
		assert_eq!(diff.activated.len(), 2);
	}

	struct Leaving(&'static str, Arc<Mutex<Vec<&'static str>>>);

	impl RouteComponent for Leaving {
		fn before_route_leave(&self) -> Vec<NavigationGuard> {
			let label = self.0;
			let seen = Arc::clone(&self.1);
			vec![guard(move |_, _, next| {
				seen.lock().push(label);
				next.proceed();
				Ok(())
			})]
		}
	}

	#[rstest]
	fn test_leave_guards_run_innermost_first() {
		// Arrange
		let seen = Arc::new(Mutex::new(Vec::new()));
		let routes = vec![
			RouteConfig::new("/a")
				.with_component(Component::view(Leaving("A", Arc::clone(&seen))))
				.with_child(
					RouteConfig::new("b")
						.with_component(Component::view(Leaving("B", Arc::clone(&seen))))
						.with_child(RouteConfig::new("c").with_component(Component::view(Leaving("C", Arc::clone(&seen))))),
				),
		];
		let deactivated = records(&routes, "/a/b/c");
		let route = Route::start();

		// Act
		for guard in leave_guards(&deactivated) {
			guard(&route, &route, Next::new(Arc::new(AtomicBool::new(false)), |_| {})).unwrap();
		}

		// Assert
		assert_eq!(*seen.lock(), vec!["C", "B", "A"]);
	}

	#[rstest]
	fn test_navigator_commits_and_tracks_pending() {
		// Arrange
		let matcher = Matcher::new(&nested(), QueryCodec::new()).unwrap();
		let navigator = Arc::new(Navigator::new(matcher, Box::new(MemoryHistory::new(""))));
		let held: Arc<Mutex<Option<Next>>> = Arc::new(Mutex::new(None));
		let hold = Arc::clone(&held);
		navigator.hooks().write().add_guard(
			crate::hooks::HookKind::BeforeEach,
			guard(move |_, _, next| {
				*hold.lock() = Some(next);
				Ok(())
			}),
		);

		// Act
		navigator.push("/a/b".into(), None, None);
		let pending_before = navigator.is_pending();
		let next = held.lock().take().unwrap();
		next.proceed();

		// Assert
		assert!(pending_before);
		assert!(!navigator.is_pending());
		assert_eq!(navigator.current().full_path(), "/a/b");
		assert_eq!(navigator.backend().read_location(), "/a/b");
	}
}
