//! Lazy component resolution.
//!
//! A lazy factory receives a [`ComponentResolver`] and may answer in one of
//! three ways: call the resolver itself later, return a future, or return a
//! descriptor whose `component` field is a future. Loaded values may be the
//! component itself or a module wrapper with a `default` export.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::error::{BoxError, NavigationError};
use crate::guard::{NavigationGuard, guard};
use crate::logging::warn_log;
use crate::record::{RouteComponent, RouteRecord};
use crate::scheduler::Scheduler;

/// A loaded lazy component.
#[derive(Clone)]
pub enum LoadedComponent {
	/// The component itself.
	Component(Arc<dyn RouteComponent>),
	/// A module whose `default` export is the component.
	Module {
		/// The default export.
		default: Arc<dyn RouteComponent>,
	},
}

impl LoadedComponent {
	/// Wraps a ready component.
	pub fn component(component: impl RouteComponent) -> Self {
		LoadedComponent::Component(Arc::new(component))
	}

	/// Wraps a module with a default export.
	pub fn module(default: impl RouteComponent) -> Self {
		LoadedComponent::Module {
			default: Arc::new(default),
		}
	}

	/// Unwraps a module to its default export.
	pub fn into_component(self) -> Arc<dyn RouteComponent> {
		match self {
			LoadedComponent::Component(component) => component,
			LoadedComponent::Module { default } => default,
		}
	}
}

impl fmt::Debug for LoadedComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LoadedComponent::Component(_) => f.write_str("LoadedComponent::Component"),
			LoadedComponent::Module { .. } => f.write_str("LoadedComponent::Module"),
		}
	}
}

/// Future returned by a lazy factory.
pub type ComponentFuture = BoxFuture<'static, Result<LoadedComponent, BoxError>>;

/// What a lazy factory returned.
pub enum FactoryOutput {
	/// The factory will call its resolver itself.
	Deferred,
	/// A future of the component.
	Future(ComponentFuture),
	/// A descriptor whose `component` is the future of the component.
	Descriptor {
		/// Future of the component, if any.
		component: Option<ComponentFuture>,
	},
}

impl FactoryOutput {
	/// Wraps a future.
	pub fn future<F>(future: F) -> Self
	where
		F: Future<Output = Result<LoadedComponent, BoxError>> + Send + 'static,
	{
		FactoryOutput::Future(Box::pin(future))
	}

	/// Wraps a future in a descriptor.
	pub fn descriptor<F>(component: F) -> Self
	where
		F: Future<Output = Result<LoadedComponent, BoxError>> + Send + 'static,
	{
		FactoryOutput::Descriptor {
			component: Some(Box::pin(component)),
		}
	}

	fn into_future(self) -> Option<ComponentFuture> {
		match self {
			FactoryOutput::Deferred => None,
			FactoryOutput::Future(future) => Some(future),
			FactoryOutput::Descriptor { component } => component,
		}
	}
}

impl fmt::Debug for FactoryOutput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FactoryOutput::Deferred => f.write_str("FactoryOutput::Deferred"),
			FactoryOutput::Future(_) => f.write_str("FactoryOutput::Future"),
			FactoryOutput::Descriptor { component } => f
				.debug_struct("FactoryOutput::Descriptor")
				.field("has_component", &component.is_some())
				.finish(),
		}
	}
}

struct ResolverState {
	resolved: AtomicBool,
	rejected: AtomicBool,
	on_resolve: Box<dyn Fn(LoadedComponent) + Send + Sync>,
	on_reject: Box<dyn Fn(String) + Send + Sync>,
}

/// Handle a lazy factory uses to deliver its component.
///
/// Resolving and rejecting each take effect at most once.
#[derive(Clone)]
pub struct ComponentResolver {
	state: Arc<ResolverState>,
}

impl ComponentResolver {
	pub(crate) fn new<R, E>(on_resolve: R, on_reject: E) -> Self
	where
		R: Fn(LoadedComponent) + Send + Sync + 'static,
		E: Fn(String) + Send + Sync + 'static,
	{
		Self {
			state: Arc::new(ResolverState {
				resolved: AtomicBool::new(false),
				rejected: AtomicBool::new(false),
				on_resolve: Box::new(on_resolve),
				on_reject: Box::new(on_reject),
			}),
		}
	}

	/// Delivers the loaded component.
	pub fn resolve(&self, component: LoadedComponent) {
		if !self.state.resolved.swap(true, Ordering::SeqCst) {
			(self.state.on_resolve)(component);
		}
	}

	/// Reports a load failure.
	pub fn reject(&self, reason: impl fmt::Display) {
		if !self.state.rejected.swap(true, Ordering::SeqCst) {
			(self.state.on_reject)(reason.to_string());
		}
	}
}

impl fmt::Debug for ComponentResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentResolver")
			.field("resolved", &self.state.resolved.load(Ordering::SeqCst))
			.field("rejected", &self.state.rejected.load(Ordering::SeqCst))
			.finish()
	}
}

/// Builds the guard that loads every lazy component of `activated`.
///
/// The guard continues once all factories have resolved and fails the
/// navigation on the first rejection. Resolved components replace their
/// factories on the record.
pub(crate) fn resolve_async_components(
	activated: Vec<Arc<RouteRecord>>,
	scheduler: Arc<dyn Scheduler>,
) -> NavigationGuard {
	guard(move |_to, _from, next| {
		let lazy: Vec<_> = activated
			.iter()
			.flat_map(|record| {
				record
					.lazy_components()
					.into_iter()
					.map(move |(slot, factory)| (Arc::clone(record), slot, factory))
			})
			.collect();
		if lazy.is_empty() {
			next.proceed();
			return Ok(());
		}

		let pending = Arc::new(AtomicUsize::new(lazy.len()));
		let next = Arc::new(Mutex::new(Some(next)));

		for (record, slot, factory) in lazy {
			let resolved_next = Arc::clone(&next);
			let rejected_next = Arc::clone(&next);
			let pending = Arc::clone(&pending);
			let resolved_slot = slot.clone();

			let resolver = ComponentResolver::new(
				move |loaded| {
					record.set_resolved(&resolved_slot, loaded.into_component());
					if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
						let next = resolved_next.lock().take();
						if let Some(next) = next {
							next.proceed();
						}
					}
				},
				move |reason| {
					let error = NavigationError::AsyncComponent {
						slot: slot.clone(),
						reason,
					};
					warn_log!("{}", error);
					let next = rejected_next.lock().take();
					if let Some(next) = next {
						next.fail(error);
					}
				},
			);

			if let Some(future) = factory(resolver.clone()).into_future() {
				scheduler.spawn(Box::pin(async move {
					match future.await {
						Ok(loaded) => resolver.resolve(loaded),
						Err(error) => resolver.reject(error),
					}
				}));
			}
		}
		Ok(())
	})
}
