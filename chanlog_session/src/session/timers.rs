use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Delayed actions on the session's single timeline.
///
/// Deadlines are offsets from the session clock's start. Actions with equal
/// deadlines come due in the order they were scheduled.
#[derive(Debug)]
pub struct Timeline<A> {
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), A>,
    deadlines: HashMap<TimerId, Duration>,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<A> Timeline<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a timer, returning its action if it hadn't fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<A> {
        let deadline = self.deadlines.remove(&id)?;
        self.queue.remove(&(deadline, id))
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// The earliest deadline still pending
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Take the earliest action whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, A)> {
        let (&(deadline, id), _) = self.queue.iter().next()?;
        if deadline > now {
            return None;
        }
        self.deadlines.remove(&id);
        self.queue.remove(&(deadline, id)).map(|action| (id, action))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
