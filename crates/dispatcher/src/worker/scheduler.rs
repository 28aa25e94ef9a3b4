//! Round-robin assignment of queued tasks to idle workers
//!
//! Pure bookkeeping with no I/O: the pool feeds it submissions and
//! responses and acts on the assignments it hands back.

use std::collections::VecDeque;

use crate::task::TaskId;

/// A queued task handed to a worker by [`Scheduler::schedule`]
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<T> {
    /// Index of the worker that now owns the task
    pub worker: usize,
    /// Task id
    pub id: TaskId,
    /// Task payload as enqueued
    pub task: T,
}

/// Outstanding work removed by [`Scheduler::drain`]
#[derive(Debug)]
pub struct Drained<T> {
    /// Ids that were assigned to a worker
    pub in_flight: Vec<TaskId>,
    /// Tasks still waiting, oldest first
    pub queued: Vec<(TaskId, T)>,
}

/// Worker slots, pending queue and rotating cursor
///
/// Each slot holds the id of the task its worker is running, so a worker
/// has at most one task in flight.
#[derive(Debug)]
pub struct Scheduler<T> {
    slots: Vec<Option<TaskId>>,
    queue: VecDeque<(TaskId, T)>,
    cursor: usize,
}

impl<T> Scheduler<T> {
    /// Scheduler for `workers` idle workers and an empty queue
    pub fn new(workers: usize) -> Self {
        Self {
            slots: vec![None; workers],
            queue: VecDeque::new(),
            cursor: 0,
        }
    }

    /// Append a task to the queue
    pub fn enqueue(&mut self, id: TaskId, task: T) {
        self.queue.push_back((id, task));
    }

    /// One scheduling pass
    ///
    /// Visits at most one full rotation of workers starting at the cursor.
    /// Every idle worker visited takes the oldest queued task; the pass
    /// stops early once the queue is empty. The cursor keeps advancing
    /// across passes so work spreads over all workers.
    pub fn schedule(&mut self) -> Vec<Assignment<T>> {
        let workers = self.slots.len();
        let mut assignments = Vec::new();

        for _ in 0..workers {
            let worker = self.cursor;
            self.cursor = (self.cursor + 1) % workers;

            if self.slots[worker].is_some() {
                continue;
            }

            let Some((id, task)) = self.queue.pop_front() else {
                break;
            };

            self.slots[worker] = Some(id);
            assignments.push(Assignment { worker, id, task });
        }

        assignments
    }

    /// Record that `worker` answered task `id`
    ///
    /// Returns `false`, changing nothing, when `id` is not the worker's
    /// current task (stale or duplicate response).
    pub fn complete(&mut self, worker: usize, id: TaskId) -> bool {
        match self.slots.get_mut(worker) {
            Some(slot) if *slot == Some(id) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Task currently assigned to `worker`
    pub fn current(&self, worker: usize) -> Option<TaskId> {
        self.slots.get(worker).copied().flatten()
    }

    /// Number of worker slots
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of busy workers
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of tasks waiting for a worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Empty every slot and the queue
    pub fn drain(&mut self) -> Drained<T> {
        Drained {
            in_flight: self.slots.iter_mut().filter_map(Option::take).collect(),
            queued: self.queue.drain(..).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<TaskId> {
        (0..n).map(|_| TaskId::new()).collect()
    }

    #[test]
    fn test_idle_scheduler_assigns_nothing() {
        let mut scheduler: Scheduler<&str> = Scheduler::new(2);
        assert!(scheduler.schedule().is_empty());
        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(scheduler.queued(), 0);
    }

    #[test]
    fn test_fifo_assignment_across_workers() {
        let mut scheduler = Scheduler::new(2);
        let ids = ids(3);
        for (i, id) in ids.iter().enumerate() {
            scheduler.enqueue(*id, i);
        }

        let assignments = scheduler.schedule();
        assert_eq!(assignments.len(), 2);
        assert_eq!((assignments[0].worker, assignments[0].task), (0, 0));
        assert_eq!((assignments[1].worker, assignments[1].task), (1, 1));
        assert_eq!(scheduler.queued(), 1);
        assert_eq!(scheduler.in_flight(), 2);

        // Both busy: nothing more to hand out
        assert!(scheduler.schedule().is_empty());

        assert!(scheduler.complete(1, ids[1]));
        let assignments = scheduler.schedule();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].worker, 1);
        assert_eq!(assignments[0].id, ids[2]);
    }

    #[test]
    fn test_never_more_in_flight_than_workers() {
        let mut scheduler = Scheduler::new(3);
        let ids = ids(10);
        for id in &ids {
            scheduler.enqueue(*id, ());
        }

        let mut done = 0;
        while done < ids.len() {
            let assigned = scheduler.schedule();
            assert!(scheduler.in_flight() <= 3);
            if assigned.is_empty() {
                // Finish whatever each worker holds
                for worker in 0..scheduler.worker_count() {
                    if let Some(id) = scheduler.current(worker) {
                        assert!(scheduler.complete(worker, id));
                        done += 1;
                    }
                }
            }
        }
        assert_eq!(scheduler.queued(), 0);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn test_cursor_rotates_between_passes() {
        let mut scheduler = Scheduler::new(3);
        let first = TaskId::new();
        scheduler.enqueue(first, ());
        assert_eq!(scheduler.schedule()[0].worker, 0);
        assert!(scheduler.complete(0, first));

        // Cursor moved past worker 0 and the empty-queue probe of worker 1
        let second = TaskId::new();
        scheduler.enqueue(second, ());
        assert_eq!(scheduler.schedule()[0].worker, 2);
    }

    #[test]
    fn test_stale_and_duplicate_completions_are_rejected() {
        let mut scheduler = Scheduler::new(1);
        let id = TaskId::new();
        scheduler.enqueue(id, ());
        scheduler.schedule();

        assert!(!scheduler.complete(0, TaskId::new()));
        assert_eq!(scheduler.current(0), Some(id));

        assert!(scheduler.complete(0, id));
        assert!(!scheduler.complete(0, id));
        assert!(!scheduler.complete(7, id));
    }

    #[test]
    fn test_drain_returns_outstanding_work() {
        let mut scheduler = Scheduler::new(2);
        let ids = ids(5);
        for (i, id) in ids.iter().enumerate() {
            scheduler.enqueue(*id, i);
        }
        scheduler.schedule();

        let drained = scheduler.drain();
        assert_eq!(drained.in_flight, vec![ids[0], ids[1]]);
        assert_eq!(
            drained.queued.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(scheduler.queued(), 0);
    }

    #[test]
    fn test_zero_workers_never_assigns() {
        let mut scheduler = Scheduler::new(0);
        scheduler.enqueue(TaskId::new(), ());
        assert!(scheduler.schedule().is_empty());
        assert_eq!(scheduler.queued(), 1);
    }
}
