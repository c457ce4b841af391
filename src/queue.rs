//! The unified event queue.
//!
//! Processes waiting for a delay and processes ready at the current instant
//! share one singly linked list, threaded through a per-process link. Each
//! entry stores its delay *relative to the entry before it*, so the head's
//! delay is exactly the time to the next wakeup and dequeuing costs a single
//! addition to the clock. Insertion walks the list, which stays short: it
//! never holds more entries than there are live processes.

use crate::types::{ProcessId, SimTime};

#[derive(Clone, Copy, Debug, Default)]
struct Link {
    next: Option<ProcessId>,
    delay: SimTime,
    queued: bool,
}

/// Time-ordered queue of processes.
#[derive(Debug, Default)]
pub struct EventQueue {
    links: Vec<Link>,
    head: Option<ProcessId>,
    len: usize,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a link for a newly registered process.
    pub fn add_process(&mut self) -> ProcessId {
        self.links.push(Link::default());
        ProcessId::from_index(self.links.len() - 1)
    }

    /// Puts a process at the head with zero delay (ready now).
    pub fn push_front(&mut self, pid: ProcessId) {
        debug_assert!(!self.is_queued(pid), "{pid} is already queued");
        self.links[pid.index()] = Link {
            next: self.head,
            delay: 0,
            queued: true,
        };
        self.head = Some(pid);
        self.len += 1;
    }

    /// Schedules a process `delay` ticks from now.
    ///
    /// The process lands behind every entry due at or before the same tick,
    /// including everything already ready at the current instant.
    pub fn insert_delayed(&mut self, pid: ProcessId, delay: SimTime) {
        debug_assert!(!self.is_queued(pid), "{pid} is already queued");
        let mut remaining = delay;
        let mut prev: Option<ProcessId> = None;
        let mut cursor = self.head;

        while let Some(p) = cursor {
            let link = &mut self.links[p.index()];
            if link.delay > remaining {
                link.delay -= remaining;
                break;
            }
            remaining -= link.delay;
            prev = cursor;
            cursor = link.next;
        }

        self.links[pid.index()] = Link {
            next: cursor,
            delay: remaining,
            queued: true,
        };
        match prev {
            Some(p) => self.links[p.index()].next = Some(pid),
            None => self.head = Some(pid),
        }
        self.len += 1;
    }

    /// Delay of the head entry, or `None` if the queue is empty.
    pub fn head_delay(&self) -> Option<SimTime> {
        self.head.map(|p| self.links[p.index()].delay)
    }

    /// Detaches the head, returning it with its delay relative to now.
    pub fn pop(&mut self) -> Option<(ProcessId, SimTime)> {
        let pid = self.head?;
        let link = std::mem::take(&mut self.links[pid.index()]);
        self.head = link.next;
        self.len -= 1;
        Some((pid, link.delay))
    }

    /// Returns true if the process is in the queue.
    pub fn is_queued(&self, pid: ProcessId) -> bool {
        self.links[pid.index()].queued
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    /// Number of queued processes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterates over queued processes with their absolute offset from now.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, SimTime)> + '_ {
        let mut cursor = self.head;
        let mut offset: SimTime = 0;
        std::iter::from_fn(move || {
            let pid = cursor?;
            let link = &self.links[pid.index()];
            offset += link.delay;
            cursor = link.next;
            Some((pid, offset))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(n: usize) -> (EventQueue, Vec<ProcessId>) {
        let mut queue = EventQueue::new();
        let pids = (0..n).map(|_| queue.add_process()).collect();
        (queue, pids)
    }

    fn order(queue: &EventQueue) -> Vec<(usize, SimTime)> {
        queue.iter().map(|(p, t)| (p.index(), t)).collect()
    }

    #[test]
    fn test_sorted_by_deadline() {
        let (mut queue, p) = queue_with(4);
        queue.insert_delayed(p[0], 30);
        queue.insert_delayed(p[1], 10);
        queue.insert_delayed(p[2], 20);
        queue.insert_delayed(p[3], 5);

        assert_eq!(order(&queue), vec![(3, 5), (1, 10), (2, 20), (0, 30)]);
        assert_eq!(queue.head_delay(), Some(5));
    }

    #[test]
    fn test_relative_delays_are_split() {
        let (mut queue, p) = queue_with(2);
        queue.insert_delayed(p[0], 10);
        queue.insert_delayed(p[1], 4);

        // p1 waits 4, p0 waits 6 more.
        assert_eq!(queue.pop(), Some((p[1], 4)));
        assert_eq!(queue.pop(), Some((p[0], 6)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_equal_deadlines_are_fifo() {
        let (mut queue, p) = queue_with(3);
        queue.insert_delayed(p[0], 7);
        queue.insert_delayed(p[1], 7);
        queue.insert_delayed(p[2], 7);

        assert_eq!(order(&queue), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn test_zero_delay_goes_behind_ready_entries() {
        let (mut queue, p) = queue_with(3);
        queue.push_front(p[0]);
        queue.insert_delayed(p[1], 3);
        queue.insert_delayed(p[2], 0);

        assert_eq!(order(&queue), vec![(0, 0), (2, 0), (1, 3)]);
    }

    #[test]
    fn test_push_front_is_lifo() {
        let (mut queue, p) = queue_with(3);
        queue.insert_delayed(p[0], 2);
        queue.push_front(p[1]);
        queue.push_front(p[2]);

        assert_eq!(order(&queue), vec![(2, 0), (1, 0), (0, 2)]);
    }

    #[test]
    fn test_membership_tracking() {
        let (mut queue, p) = queue_with(2);
        assert!(!queue.is_queued(p[0]));

        queue.insert_delayed(p[0], 1);
        assert!(queue.is_queued(p[0]));
        assert_eq!(queue.len(), 1);

        queue.pop();
        assert!(!queue.is_queued(p[0]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_resets_links() {
        let (mut queue, p) = queue_with(3);
        for (i, pid) in p.iter().enumerate() {
            queue.insert_delayed(*pid, i as SimTime);
        }
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(p.iter().all(|pid| !queue.is_queued(*pid)));

        // Links are reusable after a clear.
        queue.insert_delayed(p[2], 4);
        assert_eq!(order(&queue), vec![(2, 4)]);
    }
}
