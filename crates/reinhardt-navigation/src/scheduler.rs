//! Deferred work used by the navigation pipeline.
//!
//! The router needs a place to drive lazy component futures, to run enter
//! callbacks after the view layer has rendered, and to poll for component
//! instances. A [`Scheduler`] supplies all three.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs futures and deferred tasks for the router.
pub trait Scheduler: Send + Sync {
	/// Drives `future` to completion in the background.
	fn spawn(&self, future: BoxFuture<'static, ()>);

	/// Runs `task` after `delay`.
	fn schedule(&self, delay: Duration, task: Task);

	/// Runs `task` once the current synchronous work is done.
	fn next_tick(&self, task: Task) {
		self.schedule(Duration::ZERO, task)
	}
}

/// Scheduler backed by the ambient Tokio runtime.
///
/// Must be used from within a runtime context.
#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
	handle: Option<tokio::runtime::Handle>,
}

#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
impl TokioScheduler {
	/// Uses the runtime current at each call.
	pub fn new() -> Self {
		Self::default()
	}

	/// Uses a specific runtime.
	pub fn with_handle(handle: tokio::runtime::Handle) -> Self {
		Self {
			handle: Some(handle),
		}
	}

	fn handle(&self) -> tokio::runtime::Handle {
		match &self.handle {
			Some(handle) => handle.clone(),
			None => tokio::runtime::Handle::current(),
		}
	}
}

#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
impl Scheduler for TokioScheduler {
	fn spawn(&self, future: BoxFuture<'static, ()>) {
		self.handle().spawn(future);
	}

	fn schedule(&self, delay: Duration, task: Task) {
		self.handle().spawn(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			} else {
				tokio::task::yield_now().await;
			}
			task();
		});
	}
}

/// Scheduler that runs every job on its own OS thread.
///
/// Used when no scheduler has been attached to a router and no Tokio
/// runtime is current.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

#[cfg(not(target_arch = "wasm32"))]
impl Scheduler for ThreadScheduler {
	fn spawn(&self, future: BoxFuture<'static, ()>) {
		std::thread::spawn(move || futures::executor::block_on(future));
	}

	fn schedule(&self, delay: Duration, task: Task) {
		std::thread::spawn(move || {
			if !delay.is_zero() {
				std::thread::sleep(delay);
			}
			task();
		});
	}
}

/// Scheduler backed by the browser event loop.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

#[cfg(target_arch = "wasm32")]
impl Scheduler for BrowserScheduler {
	fn spawn(&self, future: BoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(future);
	}

	fn schedule(&self, delay: Duration, task: Task) {
		use wasm_bindgen::JsCast;
		use wasm_bindgen::closure::Closure;

		let Some(window) = web_sys::window() else {
			task();
			return;
		};
		let callback = Closure::once_into_js(task);
		let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
		let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref::<js_sys::Function>(), millis);
	}
}

/// The scheduler used when none is attached.
///
/// Prefers the Tokio runtime the caller is running in, if any.
pub(crate) fn fallback() -> std::sync::Arc<dyn Scheduler> {
	if let Some(scheduler) = ambient_runtime() {
		return scheduler;
	}
	#[cfg(not(target_arch = "wasm32"))]
	{
		std::sync::Arc::new(ThreadScheduler)
	}
	#[cfg(target_arch = "wasm32")]
	{
		std::sync::Arc::new(BrowserScheduler)
	}
}

#[cfg(all(feature = "tokio", not(target_arch = "wasm32")))]
fn ambient_runtime() -> Option<std::sync::Arc<dyn Scheduler>> {
	let handle = tokio::runtime::Handle::try_current().ok()?;
	Some(std::sync::Arc::new(TokioScheduler::with_handle(handle)))
}

#[cfg(not(all(feature = "tokio", not(target_arch = "wasm32"))))]
fn ambient_runtime() -> Option<std::sync::Arc<dyn Scheduler>> {
	None
}

enum Job {
	Future(BoxFuture<'static, ()>),
	Task { delay: Duration, task: Task },
}

/// Scheduler that queues work until it is explicitly run.
///
/// Delays are ignored; tasks run in submission order. Useful for
/// deterministic tests and for hosts with their own event loop.
#[derive(Default)]
pub struct ManualScheduler {
	queue: Mutex<VecDeque<Job>>,
}

impl ManualScheduler {
	/// Creates an empty scheduler.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of queued jobs.
	pub fn pending(&self) -> usize {
		self.queue.lock().len()
	}

	/// Runs the oldest queued job. Returns `false` when the queue was empty.
	pub fn run_next(&self) -> bool {
		let job = self.queue.lock().pop_front();
		match job {
			Some(Job::Future(future)) => {
				futures::executor::block_on(future);
				true
			}
			Some(Job::Task { task, .. }) => {
				task();
				true
			}
			None => false,
		}
	}

	/// Runs queued jobs, including jobs queued while running, until the
	/// queue is empty or `limit` jobs have run. Returns the number run.
	pub fn run_until_idle(&self, limit: usize) -> usize {
		let mut ran = 0;
		while ran < limit && self.run_next() {
			ran += 1;
		}
		ran
	}
}

impl Scheduler for ManualScheduler {
	fn spawn(&self, future: BoxFuture<'static, ()>) {
		self.queue.lock().push_back(Job::Future(future));
	}

	fn schedule(&self, delay: Duration, task: Task) {
		self.queue.lock().push_back(Job::Task { delay, task });
	}
}

impl fmt::Debug for ManualScheduler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let queue = self.queue.lock();
		let delays: Vec<Option<Duration>> = queue
			.iter()
			.map(|job| match job {
				Job::Future(_) => None,
				Job::Task { delay, .. } => Some(*delay),
			})
			.collect();
		f.debug_struct("ManualScheduler")
			.field("delays", &delays)
			.finish()
	}
}
