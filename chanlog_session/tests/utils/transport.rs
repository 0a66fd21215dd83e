use chanlog_session::prelude::*;

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Sent {
    lines: Vec<String>,
    closed: bool,
    fail_next: bool,
}

/// A transport that records what is sent through it
#[derive(Debug, Default, Clone)]
pub struct Outbox(Rc<RefCell<Sent>>);

impl Outbox {
    /// Everything sent since the last call
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.0.borrow_mut().lines)
    }

    pub fn is_closed(&self) -> bool {
        self.0.borrow().closed
    }

    /// Make the next send fail without closing the transport
    pub fn fail_next_send(&self) {
        self.0.borrow_mut().fail_next = true;
    }
}

impl Transport for Outbox {
    fn send_raw(&mut self, line: &str) -> Result<(), TransportError> {
        let mut sent = self.0.borrow_mut();
        if sent.closed || std::mem::take(&mut sent.fail_next) {
            return Err(TransportError::Closed);
        }
        sent.lines.push(line.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.0.borrow_mut().closed = true;
    }
}
