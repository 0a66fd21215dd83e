use crate::errors::TransportError;

/// The outbound half of a connection to the server
pub trait Transport {
    /// Send one serialized line; the transport adds the line terminator
    fn send_raw(&mut self, line: &str) -> Result<(), TransportError>;

    /// Close the connection. Lines may no longer be sent afterwards.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_raw(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).send_raw(line)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
