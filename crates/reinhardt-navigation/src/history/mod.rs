//! History backends.
//!
//! A backend owns the persistent side of navigation: where the initial
//! location comes from, how committed routes are recorded, how the visible
//! URL is kept in sync, and how back/forward moves are performed. Guard
//! execution lives in the router; backends never run user code.

mod browser;
mod hash;
mod memory;
mod url_bar;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::route::Route;

pub use browser::BrowserHistory;
pub use hash::HashHistory;
pub use memory::MemoryHistory;
#[cfg(target_arch = "wasm32")]
pub use url_bar::WindowUrlBar;
pub use url_bar::{ChangeListener, MemoryUrlBar, UrlBar};

/// Which backend a router uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
	/// Path-based URLs through `pushState`.
	History,
	/// URLs kept in the fragment, as `#/path`.
	Hash,
	/// An in-memory stack with no URL.
	Abstract,
}

impl Default for HistoryMode {
	fn default() -> Self {
		if cfg!(target_arch = "wasm32") {
			HistoryMode::History
		} else {
			HistoryMode::Abstract
		}
	}
}

impl fmt::Display for HistoryMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			HistoryMode::History => "history",
			HistoryMode::Hash => "hash",
			HistoryMode::Abstract => "abstract",
		})
	}
}

/// Result of asking a backend to move through history.
#[derive(Debug, Clone)]
pub enum Traversal {
	/// Out of range; nothing happens.
	None,
	/// The move was handed to the address bar, which reports the resulting
	/// location through its change listener.
	Delegated,
	/// The router must confirm a move to this stack entry and then call
	/// [`HistoryBackend::settle_traversal`].
	Entry {
		/// Index of the target entry.
		index: usize,
		/// Route recorded at that entry.
		route: Arc<Route>,
	},
}

/// Persistence and URL synchronization for a router.
pub trait HistoryBackend: Send + Sync {
	/// The mode this backend implements.
	fn mode(&self) -> HistoryMode;

	/// Normalized base: leading `/`, no trailing `/`.
	fn base(&self) -> &str;

	/// The location the router should currently be at.
	fn read_location(&self) -> String;

	/// Records a committed route as a new entry or over the current one.
	fn persist(&self, route: &Arc<Route>, replace: bool);

	/// Makes the visible URL match `current`, pushing or replacing.
	fn ensure_synced(&self, current: &Route, push: bool);

	/// Moves `delta` entries through history.
	fn traverse(&self, delta: isize) -> Traversal;

	/// Commits a confirmed [`Traversal::Entry`] move.
	fn settle_traversal(&self, _index: usize) {}

	/// Link target for a full path.
	fn create_href(&self, full_path: &str) -> String;

	/// Reads the location after an external URL change. `None` means the
	/// change should be ignored.
	fn external_location(&self, current: &Arc<Route>) -> Option<String>;

	/// Registers the router's change listener with the address bar.
	fn listen(&self, _listener: ChangeListener) {}
}

/// Leading `/`, no trailing `/`. An empty base stays empty.
pub fn normalize_base(base: &str) -> String {
	let base = if base.starts_with('/') {
		base.to_string()
	} else {
		format!("/{}", base)
	};
	base.strip_suffix('/').unwrap_or(&base).to_string()
}

/// `base + "/" + path`, collapsed, or `path` itself without a base.
pub(crate) fn join_base(base: &str, path: &str) -> String {
	if base.is_empty() {
		path.to_string()
	} else {
		crate::path::clean_path(&format!("{}/{}", base, path))
	}
}
