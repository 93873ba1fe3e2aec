//! Delayed task dispatch for single-threaded main loops.
//!
//! Firmware callbacks often fire in contexts where real work is unsafe
//! (interrupt handlers, TLS callbacks). [`Dispatcher`] queues closures with
//! an optional delay and runs the due ones from the main loop. There is no
//! internal clock: the caller passes its own millisecond counter, which
//! keeps the queue deterministic under test and agnostic about time
//! sources.
//!
//! Timestamps are `u32` milliseconds compared with wrapping arithmetic, so
//! a counter rollover (about every 49 days) does not stall queued tasks.

/// A queued closure plus its schedule.
struct DelayedTask {
    run: Box<dyn FnOnce()>,
    delay_ms: u32,
    scheduled_at_ms: u32,
}

/// A FIFO of delayed closures driven by the caller's loop.
#[derive(Default)]
pub struct Dispatcher {
    tasks: Vec<DelayedTask>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run once at least `delay_ms` milliseconds have
    /// passed beyond `now_ms`. A zero delay runs on the next
    /// [`run_due`](Self::run_due) call.
    pub fn dispatch(&mut self, now_ms: u32, delay_ms: u32, task: impl FnOnce() + 'static) {
        self.tasks.push(DelayedTask {
            run: Box::new(task),
            delay_ms,
            scheduled_at_ms: now_ms,
        });
    }

    /// Run every task whose delay has elapsed, in insertion order, and
    /// remove it from the queue. Returns how many tasks ran.
    pub fn run_due(&mut self, now_ms: u32) -> usize {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.tasks.len() {
            let task = &self.tasks[index];
            if now_ms.wrapping_sub(task.scheduled_at_ms) >= task.delay_ms {
                due.push(self.tasks.remove(index));
            } else {
                index += 1;
            }
        }
        let count = due.len();
        for task in due {
            (task.run)();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queued", &self.tasks.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, Rc<RefCell<Vec<&'static str>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn zero_delay_task_runs_on_the_next_pass() {
        let (log, handle) = recorder();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(100, 0, move || handle.borrow_mut().push("ran"));

        assert_eq!(dispatcher.run_due(100), 1);
        assert_eq!(*log.borrow(), vec!["ran"]);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn delayed_task_waits_for_its_delay() {
        let (log, handle) = recorder();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(100, 50, move || handle.borrow_mut().push("ran"));

        assert_eq!(dispatcher.run_due(120), 0);
        assert_eq!(dispatcher.len(), 1);
        assert!(log.borrow().is_empty());

        assert_eq!(dispatcher.run_due(150), 1);
        assert_eq!(*log.borrow(), vec!["ran"]);
    }

    #[test]
    fn due_tasks_run_in_insertion_order() {
        let (log, first) = recorder();
        let second = log.clone();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(0, 10, move || first.borrow_mut().push("first"));
        dispatcher.dispatch(0, 5, move || second.borrow_mut().push("second"));

        dispatcher.run_due(20);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn only_due_tasks_run() {
        let (log, near) = recorder();
        let far = log.clone();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(0, 10, move || near.borrow_mut().push("near"));
        dispatcher.dispatch(0, 1000, move || far.borrow_mut().push("far"));

        assert_eq!(dispatcher.run_due(20), 1);
        assert_eq!(*log.borrow(), vec!["near"]);
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn millis_rollover_does_not_stall_tasks() {
        let (log, handle) = recorder();
        let mut dispatcher = Dispatcher::new();
        // Scheduled just before the u32 counter wraps.
        dispatcher.dispatch(u32::MAX - 5, 10, move || handle.borrow_mut().push("ran"));

        assert_eq!(dispatcher.run_due(u32::MAX - 1), 0);
        // 4 ms past the wrap point: 10 ms have elapsed in wrapping time.
        assert_eq!(dispatcher.run_due(4), 1);
        assert_eq!(*log.borrow(), vec!["ran"]);
    }

    #[test]
    fn tasks_run_exactly_once() {
        let (log, handle) = recorder();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(0, 0, move || handle.borrow_mut().push("ran"));

        dispatcher.run_due(1);
        dispatcher.run_due(2);
        assert_eq!(log.borrow().len(), 1);
    }
}
