use crate::pipeline::Sink;
use chanlog_proto::Line;

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Collected {
    lines: Vec<Line>,
    closed: usize,
}

/// Stores every line it receives.
///
/// Clones share one buffer, so a consumer can hand a clone to the pipeline
/// and read back what arrived through its own handle.
#[derive(Debug, Default, Clone)]
pub struct CollectSink(Rc<RefCell<Collected>>);

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in arrival order
    pub fn lines(&self) -> Vec<Line> {
        self.0.borrow().lines.clone()
    }

    /// The delivered lines, serialized
    pub fn serialized(&self) -> Vec<String> {
        self.0.borrow().lines.iter().map(Line::serialize).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().lines.is_empty()
    }

    /// Remove and return everything delivered so far
    pub fn take(&self) -> Vec<Line> {
        std::mem::take(&mut self.0.borrow_mut().lines)
    }

    /// How many times this sink has been closed
    pub fn close_count(&self) -> usize {
        self.0.borrow().closed
    }
}

impl Sink for CollectSink {
    fn handle_line(&mut self, line: &Line) {
        self.0.borrow_mut().lines.push(line.clone());
    }

    fn close(&mut self) {
        self.0.borrow_mut().closed += 1;
    }
}
