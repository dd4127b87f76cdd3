//! Sequential execution of continuation-passing steps.

use std::collections::VecDeque;
use std::sync::Arc;

/// Continuation handed to each step; calling it advances the queue.
pub(crate) type Advance = Box<dyn FnOnce() + Send>;

/// Runs `iterator` over `queue` one item at a time.
///
/// Each item only starts once the previous one called its [`Advance`]. An
/// item that never advances stops the queue; `on_done` runs after the last
/// item advances.
pub(crate) fn run_queue<T, I, D>(queue: Vec<T>, iterator: Arc<I>, on_done: D)
where
	T: Send + 'static,
	I: Fn(T, Advance) + Send + Sync + 'static,
	D: FnOnce() + Send + 'static,
{
	step(VecDeque::from(queue), iterator, Box::new(on_done));
}

fn step<T, I>(mut queue: VecDeque<T>, iterator: Arc<I>, on_done: Advance)
where
	T: Send + 'static,
	I: Fn(T, Advance) + Send + Sync + 'static,
{
	match queue.pop_front() {
		None => on_done(),
		Some(item) => {
			let rest = Arc::clone(&iterator);
			iterator(item, Box::new(move || step(queue, rest, on_done)));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;
	use rstest::rstest;

	#[rstest]
	fn test_runs_items_in_order_then_done() {
		// Arrange
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let done = Arc::clone(&seen);

		// Act
		run_queue(
			vec![1, 2, 3],
			Arc::new(move |item: i32, advance: Advance| {
				sink.lock().push(item);
				advance();
			}),
			move || done.lock().push(0),
		);

		// Assert
		assert_eq!(*seen.lock(), vec![1, 2, 3, 0]);
	}

	#[rstest]
	fn test_item_that_does_not_advance_stops_queue() {
		// Arrange
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let done = Arc::clone(&seen);
		let held: Arc<Mutex<Option<Advance>>> = Arc::new(Mutex::new(None));
		let hold = Arc::clone(&held);

		// Act
		run_queue(
			vec![1, 2],
			Arc::new(move |item: i32, advance: Advance| {
				sink.lock().push(item);
				if item == 1 {
					*hold.lock() = Some(advance);
				} else {
					advance();
				}
			}),
			move || done.lock().push(0),
		);
		let before = seen.lock().clone();
		let advance = held.lock().take().unwrap();
		advance();

		// Assert
		assert_eq!(before, vec![1]);
		assert_eq!(*seen.lock(), vec![1, 2, 0]);
	}

	#[rstest]
	fn test_empty_queue_completes_immediately() {
		// Arrange
		let finished = Arc::new(Mutex::new(false));
		let flag = Arc::clone(&finished);

		// Act
		run_queue(Vec::<()>::new(), Arc::new(|_: (), advance: Advance| advance()), move || {
			*flag.lock() = true;
		});

		// Assert
		assert!(*finished.lock());
	}
}
