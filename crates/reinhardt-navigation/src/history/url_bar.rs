//! Address bar access shared by the browser and hash backends.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::path::parse_path;

/// Called when the address bar changes outside the router, as after a
/// back button press.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// The browser address bar and session history, as the router sees them.
pub trait UrlBar: Send + Sync {
	/// Raw, possibly percent-encoded pathname.
	fn pathname(&self) -> String;

	/// Search string including `?`, or empty.
	fn search(&self) -> String;

	/// Hash including `#`, or empty.
	fn hash(&self) -> String;

	/// Whole current URL.
	fn href(&self) -> String;

	/// Pushes a new session history entry.
	fn push(&self, url: &str);

	/// Replaces the current session history entry.
	fn replace(&self, url: &str);

	/// Moves through session history. The change is reported through the
	/// registered listeners.
	fn go(&self, delta: isize);

	/// Registers a listener for external changes.
	fn on_change(&self, listener: ChangeListener);

	/// Whether entries can be pushed without a page load.
	fn supports_push_state(&self) -> bool {
		true
	}
}

struct UrlBarState {
	entries: Vec<String>,
	index: usize,
}

/// In-process address bar with its own session history.
///
/// Entries are stored as `path?search#hash`. `go` and [`MemoryUrlBar::visit`]
/// notify listeners synchronously, the way `popstate` would.
pub struct MemoryUrlBar {
	state: Mutex<UrlBarState>,
	listeners: Mutex<Vec<ChangeListener>>,
	push_state: bool,
}

impl MemoryUrlBar {
	/// Starts at `initial`.
	pub fn new(initial: impl Into<String>) -> Self {
		Self {
			state: Mutex::new(UrlBarState {
				entries: vec![initial.into()],
				index: 0,
			}),
			listeners: Mutex::new(Vec::new()),
			push_state: true,
		}
	}

	/// Reports no `pushState` support, which makes a `History` router fall
	/// back to hash mode.
	pub fn without_push_state(mut self) -> Self {
		self.push_state = false;
		self
	}

	/// Current entry.
	pub fn current(&self) -> String {
		let state = self.state.lock();
		state.entries[state.index].clone()
	}

	/// All entries, oldest first.
	pub fn entries(&self) -> Vec<String> {
		self.state.lock().entries.clone()
	}

	/// Index of the current entry.
	pub fn index(&self) -> usize {
		self.state.lock().index
	}

	/// Navigates the bar itself, as a user typing a URL or following an
	/// anchor would, and notifies listeners.
	pub fn visit(&self, url: &str) {
		self.push(url);
		self.notify();
	}

	fn notify(&self) {
		let listeners = self.listeners.lock().clone();
		for listener in listeners {
			listener();
		}
	}
}

impl UrlBar for MemoryUrlBar {
	fn pathname(&self) -> String {
		parse_path(&self.current()).path
	}

	fn search(&self) -> String {
		let query = parse_path(&self.current()).query;
		if query.is_empty() {
			query
		} else {
			format!("?{}", query)
		}
	}

	fn hash(&self) -> String {
		parse_path(&self.current()).hash
	}

	fn href(&self) -> String {
		self.current()
	}

	fn push(&self, url: &str) {
		let mut state = self.state.lock();
		let keep = state.index + 1;
		state.entries.truncate(keep);
		state.entries.push(url.to_string());
		state.index = keep;
	}

	fn replace(&self, url: &str) {
		let mut state = self.state.lock();
		let index = state.index;
		state.entries[index] = url.to_string();
	}

	fn go(&self, delta: isize) {
		let moved = {
			let mut state = self.state.lock();
			match state.index.checked_add_signed(delta) {
				Some(target) if target < state.entries.len() && delta != 0 => {
					state.index = target;
					true
				}
				_ => false,
			}
		};
		if moved {
			self.notify();
		}
	}

	fn on_change(&self, listener: ChangeListener) {
		self.listeners.lock().push(listener);
	}

	fn supports_push_state(&self) -> bool {
		self.push_state
	}
}

impl fmt::Debug for MemoryUrlBar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("MemoryUrlBar")
			.field("entries", &state.entries)
			.field("index", &state.index)
			.field("listeners", &self.listeners.lock().len())
			.finish()
	}
}

/// The real browser address bar.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowUrlBar;

#[cfg(target_arch = "wasm32")]
impl WindowUrlBar {
	fn location(&self) -> Option<web_sys::Location> {
		web_sys::window().map(|window| window.location())
	}

	fn history(&self) -> Option<web_sys::History> {
		web_sys::window().and_then(|window| window.history().ok())
	}
}

#[cfg(target_arch = "wasm32")]
impl UrlBar for WindowUrlBar {
	fn pathname(&self) -> String {
		self.location()
			.and_then(|location| location.pathname().ok())
			.unwrap_or_else(|| "/".to_string())
	}

	fn search(&self) -> String {
		self.location()
			.and_then(|location| location.search().ok())
			.unwrap_or_default()
	}

	fn hash(&self) -> String {
		self.location()
			.and_then(|location| location.hash().ok())
			.unwrap_or_default()
	}

	fn href(&self) -> String {
		self.location()
			.and_then(|location| location.href().ok())
			.unwrap_or_default()
	}

	fn push(&self, url: &str) {
		let pushed = self
			.history()
			.map(|history| history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url)));
		if !matches!(pushed, Some(Ok(()))) {
			// Safari limits pushState calls; fall back to a full load
			if let Some(location) = self.location() {
				let _ = location.assign(url);
			}
		}
	}

	fn replace(&self, url: &str) {
		let replaced = self
			.history()
			.map(|history| history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url)));
		if !matches!(replaced, Some(Ok(()))) {
			if let Some(location) = self.location() {
				let _ = location.replace(url);
			}
		}
	}

	fn go(&self, delta: isize) {
		if let Some(history) = self.history() {
			let _ = history.go_with_delta(i32::try_from(delta).unwrap_or(0));
		}
	}

	fn on_change(&self, listener: ChangeListener) {
		use wasm_bindgen::JsCast;
		use wasm_bindgen::closure::Closure;

		let Some(window) = web_sys::window() else {
			return;
		};
		let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
			listener();
		}) as Box<dyn FnMut(_)>);
		let _ = window.add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref());
		handler.forget();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[rstest]
	fn test_parts_of_current_entry() {
		// Arrange
		let bar = MemoryUrlBar::new("/app/caf%C3%A9?x=1#top");

		// Act & Assert
		assert_eq!(bar.pathname(), "/app/caf%C3%A9");
		assert_eq!(bar.search(), "?x=1");
		assert_eq!(bar.hash(), "#top");
		assert_eq!(bar.href(), "/app/caf%C3%A9?x=1#top");
	}

	#[rstest]
	fn test_push_truncates_forward_entries() {
		// Arrange
		let bar = MemoryUrlBar::new("/a");
		bar.push("/b");
		bar.push("/c");
		bar.go(-2);

		// Act
		bar.push("/d");

		// Assert
		assert_eq!(bar.entries(), ["/a", "/d"]);
		assert_eq!(bar.index(), 1);
	}

	#[rstest]
	fn test_go_notifies_only_when_moving() {
		// Arrange
		let bar = MemoryUrlBar::new("/a");
		bar.push("/b");
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		bar.on_change(Arc::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}));

		// Act
		bar.go(-1);
		bar.go(-1);
		bar.go(5);

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(bar.current(), "/a");
	}

	#[rstest]
	fn test_visit_pushes_and_notifies() {
		// Arrange
		let bar = MemoryUrlBar::new("/a");
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		bar.on_change(Arc::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}));

		// Act
		bar.visit("/b");
		bar.replace("/c");

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(bar.entries(), ["/a", "/c"]);
	}
}
