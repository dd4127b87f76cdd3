//! Integration tests for the navigation guard pipeline
//!
//! These tests verify:
//! 1. Guard ordering across leave, global, update, enter and resolve hooks
//! 2. Abort, failure and redirect outcomes
//! 3. Same-route and superseded navigations
//! 4. Ready callbacks and route listeners
//! 5. Enter callbacks receiving component instances

use std::sync::Arc;

use parking_lot::Mutex;
use reinhardt_navigation::{
	Component, HistoryMode, Location, ManualScheduler, MemoryUrlBar, NavigationError, NavigationGuard, Next,
	Route, RouteComponent, RouteConfig, Router, RouterOptions, guard,
};
use rstest::rstest;

type Log = Arc<Mutex<Vec<String>>>;

struct Blank;

impl RouteComponent for Blank {}

fn new_log() -> Log {
	Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
	log.lock().clone()
}

fn logging_guard(log: &Log, entry: impl Into<String>) -> NavigationGuard {
	let log = Arc::clone(log);
	let entry = entry.into();
	guard(move |_, _, next| {
		log.lock().push(entry.clone());
		next.proceed();
		Ok(())
	})
}

/// Component recording its in-component guards.
struct Traced {
	label: &'static str,
	log: Log,
}

impl RouteComponent for Traced {
	fn before_route_enter(&self) -> Vec<NavigationGuard> {
		vec![logging_guard(&self.log, format!("enter {}", self.label))]
	}

	fn before_route_update(&self) -> Vec<NavigationGuard> {
		vec![logging_guard(&self.log, format!("update {}", self.label))]
	}

	fn before_route_leave(&self) -> Vec<NavigationGuard> {
		vec![logging_guard(&self.log, format!("leave {}", self.label))]
	}
}

fn traced(label: &'static str, log: &Log) -> Component {
	Component::view(Traced {
		label,
		log: Arc::clone(log),
	})
}

fn nested_routes(log: &Log) -> Vec<RouteConfig> {
	let enter_log = Arc::clone(log);
	vec![
		RouteConfig::new("/a").with_component(traced("A", log)).with_child(
			RouteConfig::new("b")
				.with_component(traced("B", log))
				.with_child(RouteConfig::new("c").with_component(traced("C", log))),
		),
		RouteConfig::new("/x")
			.with_component(traced("X", log))
			.with_before_enter(move |_, _, next| {
				enter_log.lock().push("before_enter X".to_string());
				next.proceed();
				Ok(())
			}),
	]
}

fn router(routes: Vec<RouteConfig>) -> Router {
	Router::new(RouterOptions::new().with_routes(routes)).unwrap()
}

#[rstest]
fn test_enter_guards_run_root_first() {
	// Arrange
	let log = new_log();
	let router = router(nested_routes(&log));

	// Act
	router.push("/a/b/c");

	// Assert
	assert_eq!(entries(&log), ["enter A", "enter B", "enter C"]);
	assert_eq!(router.current_route().path(), "/a/b/c");
}

fn logging_before_enter(log: &Log, label: &'static str) -> impl Fn(&Route, &Route, Next) -> Result<(), NavigationError> + Send + Sync + 'static {
	let log = Arc::clone(log);
	move |_, _, next| {
		log.lock().push(label.to_string());
		next.proceed();
		Ok(())
	}
}

#[rstest]
fn test_config_before_enter_runs_root_first() {
	// Arrange
	let log = new_log();
	let router = router(vec![
		RouteConfig::new("/a")
			.with_component(Component::view(Blank))
			.with_before_enter(logging_before_enter(&log, "A"))
			.with_child(
				RouteConfig::new("b")
					.with_component(Component::view(Blank))
					.with_before_enter(logging_before_enter(&log, "B"))
					.with_child(
						RouteConfig::new("c")
							.with_alias("z")
							.with_component(Component::view(Blank))
							.with_before_enter(logging_before_enter(&log, "C")),
					),
			),
	]);

	// Act
	router.push("/a/b/c");
	let nested = entries(&log);
	log.lock().clear();
	router.push("/a/b/z");

	// Assert
	assert_eq!(nested, ["A", "B", "C"]);
	assert_eq!(entries(&log), ["C"]);
	assert_eq!(router.current_route().path(), "/a/b/z");
	assert_eq!(router.current_route().leaf().map(|record| record.path()), Some("/a/b/z"));
}

#[rstest]
fn test_leave_guards_run_leaf_first() {
	// Arrange
	let log = new_log();
	let router = router(nested_routes(&log));
	router.push("/a/b/c");
	log.lock().clear();

	// Act
	router.push("/x");

	// Assert
	assert_eq!(
		entries(&log),
		["leave C", "leave B", "leave A", "before_enter X", "enter X"]
	);
}

#[rstest]
fn test_reused_records_get_update_guards() {
	// Arrange
	let log = new_log();
	let router = router(nested_routes(&log));
	router.push("/a/b/c");
	log.lock().clear();

	// Act
	router.push("/a/b");

	// Assert
	assert_eq!(entries(&log), ["leave C", "update A", "update B"]);
	assert_eq!(router.current_route().matched().len(), 2);
}

#[rstest]
fn test_global_hooks_interleave_with_route_guards() {
	// Arrange
	let log = new_log();
	let router = router(nested_routes(&log));
	router.push("/a/b/c");
	log.lock().clear();
	let each = Arc::clone(&log);
	router.before_each(move |_, _, next| {
		each.lock().push("before_each".to_string());
		next.proceed();
		Ok(())
	});
	let resolve = Arc::clone(&log);
	router.before_resolve(move |_, _, next| {
		resolve.lock().push("before_resolve".to_string());
		next.proceed();
		Ok(())
	});
	let after = Arc::clone(&log);
	router.after_each(move |to, from| {
		after.lock().push(format!("after_each {} <- {}", to.path(), from.path()));
	});

	// Act
	router.push("/x");

	// Assert
	assert_eq!(
		entries(&log),
		[
			"leave C",
			"leave B",
			"leave A",
			"before_each",
			"before_enter X",
			"enter X",
			"before_resolve",
			"after_each /x <- /a/b/c",
		]
	);
}

#[rstest]
fn test_abort_prevents_commit() {
	// Arrange
	let log = new_log();
	let router = router(nested_routes(&log));
	router.push("/a/b/c");
	router.before_each(|to, _, next| {
		if to.path() == "/x" {
			next.abort();
		} else {
			next.proceed();
		}
		Ok(())
	});
	let outcome = Arc::new(Mutex::new(None));
	let completed = Arc::clone(&outcome);
	let aborted = Arc::clone(&outcome);

	// Act
	router.push_with(
		"/x",
		move |_| *completed.lock() = Some("complete".to_string()),
		move |error| *aborted.lock() = Some(format!("abort {:?}", error.map(ToString::to_string))),
	);

	// Assert
	assert_eq!(outcome.lock().as_deref(), Some("abort None"));
	assert_eq!(router.current_route().path(), "/a/b/c");
	assert_eq!(router.history().read_location(), "/a/b/c");
	assert!(!router.is_navigating());
}

#[rstest]
fn test_navigating_to_current_route_aborts_without_error() {
	// Arrange
	let log = new_log();
	let router = router(nested_routes(&log));
	router.push("/x?tab=1");
	log.lock().clear();
	let commits = Arc::new(Mutex::new(0));
	let counter = Arc::clone(&commits);
	router.after_each(move |_, _| *counter.lock() += 1);
	let errors = new_log();
	let sink = Arc::clone(&errors);
	router.on_error(move |error| sink.lock().push(error.to_string()));
	let aborted = Arc::new(Mutex::new(false));
	let flag = Arc::clone(&aborted);

	// Act
	router.push_with("/x/?tab=1", |_| {}, move |error| *flag.lock() = error.is_none());

	// Assert
	assert!(*aborted.lock());
	assert!(entries(&log).is_empty());
	assert_eq!(*commits.lock(), 0);
	assert!(errors.lock().is_empty());
}

#[rstest]
fn test_guard_redirect_starts_new_navigation() {
	// Arrange
	let log = new_log();
	let bar = Arc::new(MemoryUrlBar::new("/"));
	let router = Router::new(
		RouterOptions::new()
			.with_routes(nested_routes(&log))
			.with_mode(HistoryMode::History)
			.with_url_bar(bar.clone()),
	)
	.unwrap();
	router.before_each(|to, _, next| {
		match to.path() {
			"/x" => next.redirect("/a/b"),
			"/a/b" if to.query().contains_key("replace") => next.redirect(Location::from_path("/a/b/c").replacing()),
			_ => next.proceed(),
		}
		Ok(())
	});

	// Act
	router.push("/x");
	let after_push_redirect = bar.entries();
	router.push("/a/b?replace");

	// Assert
	assert_eq!(after_push_redirect, ["/", "/a/b"]);
	assert_eq!(bar.entries(), ["/", "/a/b/c"]);
	assert_eq!(router.current_route().path(), "/a/b/c");
	assert!(router.current_route().redirected_from().is_none());
}

#[rstest]
#[case::returned_error(true)]
#[case::failed_next(false)]
fn test_guard_errors_reach_error_handlers(#[case] returned: bool) {
	// Arrange
	let router = router(nested_routes(&new_log()));
	router.before_each(move |_, _, next| {
		if returned {
			return Err(NavigationError::message("denied"));
		}
		next.fail(NavigationError::message("denied"));
		Ok(())
	});
	let errors = new_log();
	let sink = Arc::clone(&errors);
	router.on_error(move |error| sink.lock().push(error.to_string()));
	let aborted = new_log();
	let abort_sink = Arc::clone(&aborted);

	// Act
	router.push_with(
		"/x",
		|_| {},
		move |error| abort_sink.lock().push(error.map(ToString::to_string).unwrap_or_default()),
	);

	// Assert
	assert_eq!(entries(&errors), ["denied"]);
	assert_eq!(entries(&aborted), ["denied"]);
	assert!(router.current_route().matched().is_empty());
}

#[rstest]
fn test_error_after_next_is_reported_without_second_abort() {
	// Arrange
	let router = router(nested_routes(&new_log()));
	router.before_each(|_, _, next| {
		next.proceed();
		Err(NavigationError::message("late"))
	});
	let errors = new_log();
	let sink = Arc::clone(&errors);
	router.on_error(move |error| sink.lock().push(error.to_string()));
	let aborts = Arc::new(Mutex::new(0));
	let counter = Arc::clone(&aborts);

	// Act
	router.push_with("/x", |_| {}, move |_| *counter.lock() += 1);

	// Assert
	assert_eq!(entries(&errors), ["late"]);
	assert_eq!(*aborts.lock(), 0);
	assert_eq!(router.current_route().path(), "/x");
}

#[rstest]
fn test_superseded_navigation_is_dropped() {
	// Arrange
	let router = router(nested_routes(&new_log()));
	let held: Arc<Mutex<Option<Next>>> = Arc::new(Mutex::new(None));
	let hold = Arc::clone(&held);
	router.before_each(move |to, _, next| {
		if to.path() == "/x" {
			*hold.lock() = Some(next);
		} else {
			next.proceed();
		}
		Ok(())
	});
	let outcome = new_log();
	let completed = Arc::clone(&outcome);
	let aborted = Arc::clone(&outcome);
	router.push_with(
		"/x",
		move |_| completed.lock().push("complete".to_string()),
		move |error| aborted.lock().push(format!("abort {}", error.is_some())),
	);
	let waiting = router.is_navigating();

	// Act
	router.push("/a/b");
	let stale = held.lock().take().unwrap();
	stale.proceed();

	// Assert
	assert!(waiting);
	assert_eq!(entries(&outcome), ["abort false"]);
	assert_eq!(router.current_route().path(), "/a/b");
	assert!(!router.is_navigating());
}

#[rstest]
fn test_removed_hook_no_longer_runs() {
	// Arrange
	let router = router(nested_routes(&new_log()));
	let handle = router.before_each(|_, _, next| {
		next.abort();
		Ok(())
	});

	// Act
	let removed = handle.remove();
	router.push("/x");

	// Assert
	assert!(removed);
	assert_eq!(router.current_route().path(), "/x");
}

#[rstest]
fn test_listener_sees_every_commit() {
	// Arrange
	let router = router(nested_routes(&new_log()));
	let seen = new_log();
	let sink = Arc::clone(&seen);
	router.listen(move |route| sink.lock().push(route.full_path().to_string()));

	// Act
	router.push("/x");
	router.push("/a/b#top");
	router.replace("/a/b/c?q=1");

	// Assert
	assert_eq!(entries(&seen), ["/x", "/a/b#top", "/a/b/c?q=1"]);
}

#[rstest]
fn test_ready_callbacks_run_once_after_first_commit() {
	// Arrange
	let bar = Arc::new(MemoryUrlBar::new("/a/b"));
	let router = Router::new(
		RouterOptions::new()
			.with_routes(nested_routes(&new_log()))
			.with_mode(HistoryMode::History)
			.with_url_bar(bar),
	)
	.unwrap();
	let ready = new_log();
	let early = Arc::clone(&ready);
	router.on_ready(move |route| early.lock().push(format!("early {}", route.path())));

	// Act
	router.init();
	router.push("/x");
	let late = Arc::clone(&ready);
	router.on_ready(move |route| late.lock().push(format!("late {}", route.path())));

	// Assert
	assert_eq!(entries(&ready), ["early /a/b", "late /x"]);
}

#[rstest]
fn test_ready_error_callback_runs_when_initial_navigation_fails() {
	// Arrange
	let bar = Arc::new(MemoryUrlBar::new("/a"));
	let router = Router::new(
		RouterOptions::new()
			.with_routes(nested_routes(&new_log()))
			.with_mode(HistoryMode::History)
			.with_url_bar(bar),
	)
	.unwrap();
	router.before_each(|_, _, _| Err(NavigationError::message("offline")));
	router.on_error(|_| {});
	let outcome = new_log();
	let ok = Arc::clone(&outcome);
	let failed = Arc::clone(&outcome);
	router.on_ready_or_error(
		move |_| ok.lock().push("ready".to_string()),
		move |error| failed.lock().push(error.to_string()),
	);

	// Act
	router.init();

	// Assert
	assert_eq!(entries(&outcome), ["offline"]);
}

/// Component whose enter guard waits for its instance.
struct Greeter {
	received: Arc<Mutex<Option<u32>>>,
}

impl RouteComponent for Greeter {
	fn before_route_enter(&self) -> Vec<NavigationGuard> {
		let received = Arc::clone(&self.received);
		vec![guard(move |_, _, next| {
			let received = Arc::clone(&received);
			next.proceed_with(move |instance| {
				*received.lock() = instance.downcast_ref::<u32>().copied();
			});
			Ok(())
		})]
	}
}

#[rstest]
fn test_enter_callback_receives_instance_once_registered() {
	// Arrange
	let received = Arc::new(Mutex::new(None));
	let scheduler = Arc::new(ManualScheduler::new());
	let router = Router::new(
		RouterOptions::new()
			.with_route(RouteConfig::new("/greet").with_component(Component::view(Greeter {
				received: Arc::clone(&received),
			})))
			.with_scheduler(scheduler.clone()),
	)
	.unwrap();
	router.push("/greet");

	// Act
	let first_poll = scheduler.run_next();
	let before_instance = *received.lock();
	router
		.current_route()
		.leaf()
		.unwrap()
		.register_instance("default", Arc::new(7u32));
	scheduler.run_until_idle(10);

	// Assert
	assert!(first_poll);
	assert!(before_instance.is_none());
	assert_eq!(*received.lock(), Some(7));
	assert_eq!(scheduler.pending(), 0);
}

#[rstest]
fn test_enter_callback_is_dropped_when_route_changes() {
	// Arrange
	let received = Arc::new(Mutex::new(None));
	let scheduler = Arc::new(ManualScheduler::new());
	let router = Router::new(
		RouterOptions::new()
			.with_route(RouteConfig::new("/greet").with_component(Component::view(Greeter {
				received: Arc::clone(&received),
			})))
			.with_route(RouteConfig::new("/other").with_component(Component::view(Greeter {
				received: Arc::new(Mutex::new(None)),
			})))
			.with_scheduler(scheduler.clone()),
	)
	.unwrap();
	router.push("/greet");
	let record = Arc::clone(router.current_route().leaf().unwrap());
	scheduler.run_next();

	// Act
	router.push("/other");
	scheduler.run_next();
	record.register_instance("default", Arc::new(1u32));
	scheduler.run_until_idle(10);

	// Assert
	assert!(received.lock().is_none());
}
