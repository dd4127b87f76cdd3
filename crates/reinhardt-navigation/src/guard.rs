//! Navigation guards and the `next` continuation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::NavigationError;
use crate::location::RawLocation;
use crate::record::ComponentInstance;
use crate::route::Route;

/// A guard receives the target route, the current route and a [`Next`]
/// continuation it must eventually call.
///
/// Returning `Err` aborts the navigation with that error.
pub type NavigationGuard = Arc<dyn Fn(&Route, &Route, Next) -> Result<(), NavigationError> + Send + Sync>;

/// A hook run after a navigation commits, with the new and previous routes.
pub type AfterHook = Arc<dyn Fn(&Route, &Route) + Send + Sync>;

/// Callback that receives the entered component's instance once it exists.
pub type EnterCallback = Box<dyn FnOnce(ComponentInstance) + Send>;

/// Wraps a closure as a [`NavigationGuard`].
pub fn guard<F>(guard: F) -> NavigationGuard
where
	F: Fn(&Route, &Route, Next) -> Result<(), NavigationError> + Send + Sync + 'static,
{
	Arc::new(guard)
}

/// What a guard decided.
pub enum NextAction {
	/// Continue with the next guard.
	Proceed,
	/// Cancel the navigation.
	Abort,
	/// Cancel the navigation with an error.
	Fail(NavigationError),
	/// Cancel the navigation and start a new one.
	Redirect(RawLocation),
	/// Continue, and hand the entered component's instance to the callback
	/// once it exists. Only meaningful in enter guards.
	ProceedWith(EnterCallback),
}

impl fmt::Debug for NextAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NextAction::Proceed => f.write_str("Proceed"),
			NextAction::Abort => f.write_str("Abort"),
			NextAction::Fail(error) => f.debug_tuple("Fail").field(error).finish(),
			NextAction::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
			NextAction::ProceedWith(_) => f.write_str("ProceedWith"),
		}
	}
}

/// Continuation handed to every guard. Consuming it resolves the guard.
///
/// Dropping it without a call leaves the navigation pending until a newer
/// navigation supersedes it.
pub struct Next {
	resolve: Box<dyn FnOnce(NextAction) + Send>,
	called: Arc<AtomicBool>,
}

impl Next {
	pub(crate) fn new<F>(called: Arc<AtomicBool>, resolve: F) -> Self
	where
		F: FnOnce(NextAction) + Send + 'static,
	{
		Self {
			resolve: Box::new(resolve),
			called,
		}
	}

	/// Resolves the guard with `action`.
	pub fn call(self, action: NextAction) {
		self.called.store(true, Ordering::SeqCst);
		(self.resolve)(action)
	}

	/// Continues the navigation.
	pub fn proceed(self) {
		self.call(NextAction::Proceed)
	}

	/// Cancels the navigation.
	pub fn abort(self) {
		self.call(NextAction::Abort)
	}

	/// Cancels the navigation with an error.
	pub fn fail(self, error: NavigationError) {
		self.call(NextAction::Fail(error))
	}

	/// Cancels the navigation and navigates to `to` instead. A target with
	/// `replace` set replaces the history entry.
	pub fn redirect(self, to: impl Into<RawLocation>) {
		self.call(NextAction::Redirect(to.into()))
	}

	/// Continues, and delivers the entered component's instance to
	/// `callback` once it exists.
	pub fn proceed_with<F>(self, callback: F)
	where
		F: FnOnce(ComponentInstance) + Send + 'static,
	{
		self.call(NextAction::ProceedWith(Box::new(callback)))
	}

	/// Rewrites the action before it reaches the original continuation.
	pub(crate) fn intercept<F>(self, rewrite: F) -> Next
	where
		F: FnOnce(NextAction) -> NextAction + Send + 'static,
	{
		let Next { resolve, called } = self;
		Next {
			resolve: Box::new(move |action| resolve(rewrite(action))),
			called,
		}
	}
}

impl fmt::Debug for Next {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Next")
			.field("called", &self.called.load(Ordering::SeqCst))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;
	use rstest::rstest;

	fn recording() -> (Next, Arc<AtomicBool>, Arc<Mutex<Vec<String>>>) {
		let called = Arc::new(AtomicBool::new(false));
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let next = Next::new(Arc::clone(&called), move |action| {
			sink.lock().push(format!("{:?}", action));
		});
		(next, called, seen)
	}

	#[rstest]
	fn test_call_marks_next_as_used() {
		// Arrange
		let (next, called, seen) = recording();

		// Act
		next.abort();

		// Assert
		assert!(called.load(Ordering::SeqCst));
		assert_eq!(*seen.lock(), vec!["Abort".to_string()]);
	}

	#[rstest]
	fn test_intercept_rewrites_action() {
		// Arrange
		let (next, called, seen) = recording();
		let next = next.intercept(|action| match action {
			NextAction::ProceedWith(_) => NextAction::Proceed,
			other => other,
		});

		// Act
		next.proceed_with(|_| {});

		// Assert
		assert!(called.load(Ordering::SeqCst));
		assert_eq!(*seen.lock(), vec!["Proceed".to_string()]);
	}

	#[rstest]
	fn test_redirect_carries_target() {
		// Arrange
		let (next, _, seen) = recording();

		// Act
		next.redirect("/login");

		// Assert
		assert_eq!(*seen.lock(), vec!["Redirect(Path(\"/login\"))".to_string()]);
	}
}
