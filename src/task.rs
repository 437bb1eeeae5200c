use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    NotStarted,
    Running,

    /// The gate closed; running again continues where the task left off
    Paused,

    /// The task ran out of input that is still being produced
    NeedsData,
    Stopped,
    Completed,
    Error,
}

impl TaskStatus {
    /// Once terminal, a task never runs again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Error)
    }
}

/// A unit of resumable work, driven by repeated calls to `iterate`
pub trait Task: Send + 'static {
    /// Does one small step of work and reports the resulting status. Anything other than
    /// `Running` ends the current run
    fn iterate(&mut self) -> TaskStatus;

    /// Called by a worker thread after `NeedsData`, before it runs the task again
    fn wait_for_data(&self, timeout: Duration) {
        thread::sleep(timeout.min(Duration::from_millis(10)));
    }

    /// Observed by worker threads between runs, so a task whose output nobody wants can end
    fn is_abandoned(&self) -> bool {
        false
    }
}

/// Bounds how long a single run may go on for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Unbounded,
    Iterations(usize),
    Deadline(Instant),
}

impl Gate {
    pub fn for_duration(duration: Duration) -> Self {
        Gate::Deadline(Instant::now() + duration)
    }

    /// Consumes one iteration's worth of budget
    fn admit(&mut self) -> bool {
        match self {
            Gate::Unbounded => true,
            Gate::Iterations(0) => false,
            Gate::Iterations(n) => {
                *n -= 1;
                true
            }
            Gate::Deadline(deadline) => Instant::now() < *deadline,
        }
    }
}

/// Shares a task between the thread driving it and any number of observers
///
/// The task itself sits behind an execution lock held for the whole of a run. Its status sits
/// behind a separate lock, so observers never wait for an iteration to finish to read it
pub struct Watchable<T: Task> {
    task: Mutex<T>,
    status: Mutex<TaskStatus>,
    changed: Condvar,
    stop_requested: AtomicBool,
}

impl<T: Task> std::fmt::Debug for Watchable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchable")
            .field("status", &self.status())
            .finish()
    }
}

impl<T: Task> Watchable<T> {
    pub fn new(task: T) -> Arc<Self> {
        Arc::new(Self {
            task: Mutex::new(task),
            status: Mutex::new(TaskStatus::NotStarted),
            changed: Condvar::new(),
            stop_requested: AtomicBool::new(false),
        })
    }

    fn lock_status(&self) -> MutexGuard<'_, TaskStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> TaskStatus {
        *self.lock_status()
    }

    /// Terminal statuses are never replaced
    fn set_status(&self, status: TaskStatus) {
        let mut current = self.lock_status();

        if current.is_terminal() {
            return;
        }

        *current = status;
        self.changed.notify_all();
    }

    /// Asks the task to stop at its next iteration boundary. A task that isn't running stops
    /// immediately
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);

        if let Ok(_idle) = self.task.try_lock() {
            self.set_status(TaskStatus::Stopped);
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Runs the task in the calling thread until it leaves `Running` or the gate closes
    pub fn run(&self, mut gate: Gate) -> TaskStatus {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());

        let status = self.status();
        if status.is_terminal() {
            return status;
        }

        self.set_status(TaskStatus::Running);

        let status = loop {
            if self.stop_requested() {
                break TaskStatus::Stopped;
            }

            if !gate.admit() {
                break TaskStatus::Paused;
            }

            match task.iterate() {
                TaskStatus::Running => continue,
                other => break other,
            }
        };

        self.set_status(status);
        drop(task);

        self.status()
    }

    /// Drives the task to a terminal status on a new thread, waiting whenever it needs data
    pub fn go(self: &Arc<Self>) -> JoinHandle<TaskStatus> {
        let this = Arc::clone(self);

        thread::spawn(move || loop {
            let status = this.run(Gate::Unbounded);

            match status {
                TaskStatus::NeedsData => {
                    let abandoned = this.with_task(|task| {
                        if task.is_abandoned() {
                            return true;
                        }

                        task.wait_for_data(Duration::from_millis(50));
                        false
                    });

                    if abandoned {
                        this.stop();
                    }
                }
                TaskStatus::Paused => continue,
                status => return status,
            }
        })
    }

    /// Locks the task, waiting for any run in progress
    pub fn with_task<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut task)
    }

    /// Blocks until `done` accepts the status, or `timeout` passes. Returns the last status seen
    pub fn wait_until(&self, timeout: Duration, mut done: impl FnMut(TaskStatus) -> bool) -> TaskStatus {
        let guard = self.lock_status();

        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |status| !done(*status))
            .unwrap_or_else(|e| e.into_inner());

        *guard
    }

    /// Blocks until the task is terminal
    pub fn wait(&self) -> TaskStatus {
        let mut guard = self.lock_status();

        while !guard.is_terminal() {
            guard = self.changed.wait(guard).unwrap_or_else(|e| e.into_inner());
        }

        *guard
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Countdown {
        remaining: usize,
        iterations: usize,
    }

    impl Task for Countdown {
        fn iterate(&mut self) -> TaskStatus {
            self.iterations += 1;

            if self.remaining == 0 {
                return TaskStatus::Completed;
            }

            self.remaining -= 1;
            TaskStatus::Running
        }
    }

    fn countdown(n: usize) -> Arc<Watchable<Countdown>> {
        Watchable::new(Countdown {
            remaining: n,
            iterations: 0,
        })
    }

    #[test]
    fn iteration_gate_pauses() {
        let task = countdown(10);

        assert_eq!(task.status(), TaskStatus::NotStarted);
        assert_eq!(task.run(Gate::Iterations(4)), TaskStatus::Paused);
        assert_eq!(task.with_task(|t| t.remaining), 6);

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
    }

    #[test]
    fn terminal_tasks_do_not_run_again() {
        let task = countdown(1);

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        let iterations = task.with_task(|t| t.iterations);

        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Completed);
        assert_eq!(task.with_task(|t| t.iterations), iterations);
    }

    #[test]
    fn stop_between_runs() {
        let task = countdown(100);

        task.run(Gate::Iterations(1));
        task.stop();

        assert_eq!(task.status(), TaskStatus::Stopped);
        assert_eq!(task.run(Gate::Unbounded), TaskStatus::Stopped);
        assert_eq!(task.with_task(|t| t.remaining), 99);
    }

    #[test]
    fn worker_thread_completes() {
        let task = countdown(1000);
        let handle = task.go();

        assert_eq!(task.wait(), TaskStatus::Completed);
        assert_eq!(handle.join().unwrap(), TaskStatus::Completed);
    }

    #[test]
    fn expired_deadline_pauses_immediately() {
        let task = countdown(5);

        let status = task.run(Gate::Deadline(Instant::now() - Duration::from_millis(1)));

        assert_eq!(status, TaskStatus::Paused);
        assert_eq!(task.with_task(|t| t.iterations), 0);
    }
}
