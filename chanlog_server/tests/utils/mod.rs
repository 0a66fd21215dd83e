#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// An in-memory writer whose contents can be read back through a clone
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub const SAMPLE_LOG: &str = "\
2008-09-25T18:30:03+03:00 :irc.jyu.fi 001 sioc :Welcome to the Internet Relay Network sioc!sioc@kanto.jyu.fi\r
2008-09-25T18:30:04+03:00 :sioc!sioc@kanto.jyu.fi JOIN :#sioc\r
2008-09-25T18:30:05+03:00 :sioc!sioc@kanto.jyu.fi JOIN :#other\r
2008-09-25T18:31:00+03:00 :alice!a@example.net PRIVMSG #sioc :+hello\r
2008-09-25T18:31:30+03:00 :alice!a@example.net PRIVMSG #sioc :+[off] between us\r
2008-09-25T18:32:00+03:00 :bob!b@example.net PRIVMSG #Other :+over here\r
2008-09-26T12:00:00+03:00 :alice!a@example.net PRIVMSG #sioc :+next day\r
";
