use super::Sink;
use chanlog_proto::Line;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// A sink that can be held in more than one place.
///
/// Everything runs on one thread, so shared ownership is `Rc<RefCell<_>>`.
/// A shared sink must not feed lines back into itself.
#[derive(Debug, Default)]
pub struct SharedSink<S>(Rc<RefCell<S>>);

impl<S> SharedSink<S> {
    pub fn new(sink: S) -> Self {
        Self(Rc::new(RefCell::new(sink)))
    }

    pub fn borrow(&self) -> Ref<'_, S> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.0.borrow_mut()
    }
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S: Sink> Sink for SharedSink<S> {
    fn handle_line(&mut self, line: &Line) {
        self.0.borrow_mut().handle_line(line)
    }

    fn close(&mut self) {
        self.0.borrow_mut().close()
    }
}
