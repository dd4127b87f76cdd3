//! Global hook registry.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::NavigationError;
use crate::guard::{AfterHook, NavigationGuard};

/// Handler for errors raised during navigation.
pub type ErrorHandler = Arc<dyn Fn(&NavigationError) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HookKind {
	BeforeEach,
	BeforeResolve,
	AfterEach,
	Error,
}

#[derive(Default)]
pub(crate) struct Hooks {
	next_id: u64,
	before_each: Vec<(u64, NavigationGuard)>,
	before_resolve: Vec<(u64, NavigationGuard)>,
	after_each: Vec<(u64, AfterHook)>,
	errors: Vec<(u64, ErrorHandler)>,
}

impl Hooks {
	fn allocate(&mut self) -> u64 {
		self.next_id += 1;
		self.next_id
	}

	pub(crate) fn add_guard(&mut self, kind: HookKind, guard: NavigationGuard) -> u64 {
		let id = self.allocate();
		match kind {
			HookKind::BeforeResolve => self.before_resolve.push((id, guard)),
			_ => self.before_each.push((id, guard)),
		}
		id
	}

	pub(crate) fn add_after(&mut self, hook: AfterHook) -> u64 {
		let id = self.allocate();
		self.after_each.push((id, hook));
		id
	}

	pub(crate) fn add_error(&mut self, handler: ErrorHandler) -> u64 {
		let id = self.allocate();
		self.errors.push((id, handler));
		id
	}

	fn remove(&mut self, kind: HookKind, id: u64) -> bool {
		fn drop_id<T>(list: &mut Vec<(u64, T)>, id: u64) -> bool {
			let before = list.len();
			list.retain(|(entry, _)| *entry != id);
			list.len() != before
		}
		match kind {
			HookKind::BeforeEach => drop_id(&mut self.before_each, id),
			HookKind::BeforeResolve => drop_id(&mut self.before_resolve, id),
			HookKind::AfterEach => drop_id(&mut self.after_each, id),
			HookKind::Error => drop_id(&mut self.errors, id),
		}
	}

	pub(crate) fn before_each(&self) -> Vec<NavigationGuard> {
		self.before_each.iter().map(|(_, guard)| Arc::clone(guard)).collect()
	}

	pub(crate) fn before_resolve(&self) -> Vec<NavigationGuard> {
		self.before_resolve.iter().map(|(_, guard)| Arc::clone(guard)).collect()
	}

	pub(crate) fn after_each(&self) -> Vec<AfterHook> {
		self.after_each.iter().map(|(_, hook)| Arc::clone(hook)).collect()
	}

	pub(crate) fn errors(&self) -> Vec<ErrorHandler> {
		self.errors.iter().map(|(_, handler)| Arc::clone(handler)).collect()
	}
}

/// Registration of a global hook. [`HookHandle::remove`] unregisters it;
/// dropping the handle keeps the hook installed.
pub struct HookHandle {
	hooks: Weak<RwLock<Hooks>>,
	kind: HookKind,
	id: u64,
}

impl HookHandle {
	pub(crate) fn new(hooks: &Arc<RwLock<Hooks>>, kind: HookKind, id: u64) -> Self {
		Self {
			hooks: Arc::downgrade(hooks),
			kind,
			id,
		}
	}

	/// Unregisters the hook. Returns `false` if it was already removed or
	/// the router is gone.
	pub fn remove(&self) -> bool {
		match self.hooks.upgrade() {
			Some(hooks) => hooks.write().remove(self.kind, self.id),
			None => false,
		}
	}
}

impl fmt::Debug for HookHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HookHandle")
			.field("kind", &self.kind)
			.field("id", &self.id)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::guard::guard;
	use rstest::rstest;

	#[rstest]
	fn test_remove_unregisters_once() {
		// Arrange
		let hooks = Arc::new(RwLock::new(Hooks::default()));
		let id = hooks
			.write()
			.add_guard(HookKind::BeforeEach, guard(|_, _, next| {
				next.proceed();
				Ok(())
			}));
		let handle = HookHandle::new(&hooks, HookKind::BeforeEach, id);

		// Act
		let first = handle.remove();
		let second = handle.remove();

		// Assert
		assert!(first);
		assert!(!second);
		assert!(hooks.read().before_each().is_empty());
	}

	#[rstest]
	fn test_handles_only_touch_their_own_list() {
		// Arrange
		let hooks = Arc::new(RwLock::new(Hooks::default()));
		let after = hooks.write().add_after(Arc::new(|_, _| {}));
		hooks.write().add_error(Arc::new(|_| {}));
		let wrong_kind = HookHandle::new(&hooks, HookKind::Error, after);

		// Act
		let removed = wrong_kind.remove();

		// Assert
		assert!(!removed);
		assert_eq!(hooks.read().after_each().len(), 1);
		assert_eq!(hooks.read().errors().len(), 1);
	}

	#[rstest]
	fn test_remove_after_router_dropped() {
		// Arrange
		let hooks = Arc::new(RwLock::new(Hooks::default()));
		let id = hooks.write().add_after(Arc::new(|_, _| {}));
		let handle = HookHandle::new(&hooks, HookKind::AfterEach, id);
		drop(hooks);

		// Act & Assert
		assert!(!handle.remove());
	}
}
