//! Client-side navigation for Reinhardt applications.
//!
//! This crate maps URLs to nested route records, runs navigation guards in a
//! fixed order, resolves lazily loaded components, and keeps the address bar
//! in sync through one of three history backends:
//!
//! - `history`: path URLs through `pushState`
//! - `hash`: URLs kept in the fragment, as `#/path`
//! - `abstract`: an in-memory stack, for servers and tests
//!
//! ## Architecture
//!
//! ```text
//! RouteConfig ──▶ RouteTree ──▶ Matcher ──▶ Route
//!                                             │
//! Router::push ──▶ Navigator (guard queue) ◀──┘
//!                      │
//!                      ▼
//!               HistoryBackend ──▶ UrlBar
//! ```
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_navigation::{Component, Location, RouteComponent, RouteConfig, Router, RouterOptions};
//!
//! struct Page;
//! impl RouteComponent for Page {}
//!
//! let router = Router::new(
//! 	RouterOptions::new().with_route(
//! 		RouteConfig::new("/users/:id")
//! 			.with_name("user")
//! 			.with_component(Component::view(Page)),
//! 	),
//! )
//! .unwrap();
//!
//! router.before_each(|to, _from, next| {
//! 	if to.params().contains_key("id") {
//! 		next.proceed();
//! 	} else {
//! 		next.abort();
//! 	}
//! 	Ok(())
//! });
//!
//! router.push(Location::named("user").with_param("id", "42"));
//! assert_eq!(router.current_route().path(), "/users/42");
//! ```

pub mod error;
pub mod guard;
pub mod history;
pub mod hooks;
pub mod location;
mod logging;
pub mod matcher;
pub mod options;
pub mod path;
pub mod query;
mod queue;
pub mod record;
pub mod resolve;
pub mod route;
pub mod router;
pub mod scheduler;
mod transition;
pub mod tree;

pub use error::{BoxError, ConfigError, NavigationError, NavigationFailure, QueryError};
pub use guard::{AfterHook, EnterCallback, NavigationGuard, Next, NextAction, guard};
pub use history::{
	BrowserHistory, ChangeListener, HashHistory, HistoryBackend, HistoryMode, MemoryHistory, MemoryUrlBar, Traversal,
	UrlBar,
};
#[cfg(target_arch = "wasm32")]
pub use history::WindowUrlBar;
pub use hooks::{ErrorHandler, HookHandle};
pub use location::{Location, RawLocation, normalize_location};
pub use matcher::Matcher;
pub use options::{RouterOptions, RouterSettings};
pub use query::{Query, QueryCodec, QueryValue, parse_query, stringify_query};
pub use record::{
	Component, ComponentInstance, DEFAULT_SLOT, LazyComponent, Meta, Redirect, RedirectFn, RouteComponent, RouteConfig,
	RouteProps, RouteRecord,
};
pub use resolve::{ComponentFuture, ComponentResolver, FactoryOutput, LoadedComponent};
pub use route::{Route, is_included_route, is_same_route};
pub use router::{Resolved, Router};
#[cfg(target_arch = "wasm32")]
pub use scheduler::BrowserScheduler;
#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
pub use scheduler::TokioScheduler;
#[cfg(not(target_arch = "wasm32"))]
pub use scheduler::ThreadScheduler;
pub use scheduler::{ManualScheduler, Scheduler, Task};
pub use tree::RouteTree;

pub use reinhardt_route_pattern::{Key, KeyName, ParamValue, Params, PathPattern, PatternCache, PatternOptions};
