//! # Reinhardt Navigator
//!
//! Client-side navigation for Reinhardt frontends: nested route tables,
//! guarded transitions, lazily loaded views and three history backends.
//!
//! This crate bundles [`reinhardt_navigation`] with the path pattern engine
//! it is built on. Most applications only need the [`prelude`].
//!
//! ## Feature Flags
//!
//! - `tokio` (default) - [`TokioScheduler`] for lazy components and deferred
//!   enter callbacks on native targets
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_navigator::prelude::*;
//!
//! struct Home;
//! impl RouteComponent for Home {}
//!
//! let router = Router::new(
//! 	RouterOptions::new()
//! 		.with_route(RouteConfig::new("/").with_component(Component::view(Home)))
//! 		.with_route(RouteConfig::new("/home").with_redirect("/")),
//! )
//! .unwrap();
//!
//! router.push("/home");
//! assert_eq!(router.current_route().path(), "/");
//! assert_eq!(router.current_route().redirected_from(), Some("/home"));
//! ```

pub mod pattern;

// Re-export the router
pub use reinhardt_navigation::{Resolved, Router, RouterOptions, RouterSettings};

// Re-export routes and locations
pub use reinhardt_navigation::{
	Location, Query, QueryCodec, QueryValue, RawLocation, Route, is_included_route, is_same_route,
	normalize_location, parse_query, stringify_query,
};

// Re-export route configuration
pub use reinhardt_navigation::{
	Component, ComponentInstance, DEFAULT_SLOT, LazyComponent, Matcher, Meta, Redirect, RedirectFn,
	RouteComponent, RouteConfig, RouteProps, RouteRecord, RouteTree,
};

// Re-export guards and hooks
pub use reinhardt_navigation::{
	AfterHook, EnterCallback, ErrorHandler, HookHandle, NavigationGuard, Next, NextAction, guard,
};

// Re-export lazy components
pub use reinhardt_navigation::{
	ComponentFuture, ComponentResolver, FactoryOutput, LoadedComponent,
};

// Re-export history backends
pub use reinhardt_navigation::{
	BrowserHistory, ChangeListener, HashHistory, HistoryBackend, HistoryMode, MemoryHistory,
	MemoryUrlBar, Traversal, UrlBar,
};
#[cfg(target_arch = "wasm32")]
pub use reinhardt_navigation::WindowUrlBar;

// Re-export schedulers
#[cfg(target_arch = "wasm32")]
pub use reinhardt_navigation::BrowserScheduler;
#[cfg(not(target_arch = "wasm32"))]
pub use reinhardt_navigation::ThreadScheduler;
#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
pub use reinhardt_navigation::TokioScheduler;
pub use reinhardt_navigation::{ManualScheduler, Scheduler, Task};

// Re-export errors
pub use reinhardt_navigation::{BoxError, ConfigError, NavigationError, NavigationFailure, QueryError};

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		Component, HistoryMode, Location, NavigationError, NavigationFailure, Next, Route,
		RouteComponent, RouteConfig, Router, RouterOptions, guard,
	};

	// Lazy components
	pub use crate::{FactoryOutput, LoadedComponent};

	// Params
	pub use crate::pattern::{ParamValue, Params};
}
