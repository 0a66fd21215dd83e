//! Composable line-processing stages.
//!
//! A pipeline is a chain of stages, each holding the next one as its
//! downstream [`Sink`]. A stage is written as a [`Stage`]: its
//! [`handle`](Stage::handle) method is the mapping from command name to
//! handler, and returns [`Disposition::Fallback`] for anything it has no
//! handler for (or whose handler wants the default treatment). The
//! [`Pipe`] wrapper turns a `Stage` into a `Sink`, running the fallback when
//! asked and making sure shutdown reaches each stage only once.

use chanlog_proto::Line;

mod shared;
pub use shared::SharedSink;

/// Anything that can receive lines
pub trait Sink {
    /// Process one line
    fn handle_line(&mut self, line: &Line);

    /// Finish processing; no more lines will arrive
    fn close(&mut self) {}
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn handle_line(&mut self, line: &Line) {
        (**self).handle_line(line)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// What a stage's handler did with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The line was fully dealt with; skip the fallback
    Handled,
    /// Run the stage's fallback for this line
    Fallback,
}

impl From<bool> for Disposition {
    fn from(handled: bool) -> Self {
        if handled {
            Self::Handled
        } else {
            Self::Fallback
        }
    }
}

/// One step of a pipeline
pub trait Stage {
    /// Run the handler for this line's command, if there is one
    fn handle(&mut self, line: &Line) -> Disposition;

    /// Default treatment of a line: pass it downstream unchanged
    fn fallback(&mut self, line: &Line) {
        if let Some(sink) = self.downstream() {
            sink.handle_line(line);
        }
    }

    /// The sink this stage forwards to, if any
    fn downstream(&mut self) -> Option<&mut (dyn Sink + 'static)>;

    /// Stage-local shutdown work, run before the downstream sink is closed
    fn finish(&mut self) {}
}

/// Adapts a [`Stage`] into a [`Sink`]
#[derive(Debug)]
pub struct Pipe<S> {
    stage: S,
    closed: bool,
}

impl<S: Stage> Pipe<S> {
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            closed: false,
        }
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> S {
        self.stage
    }
}

impl<S: Stage> Sink for Pipe<S> {
    fn handle_line(&mut self, line: &Line) {
        if self.closed {
            tracing::debug!(%line, "Line arrived after close; dropping");
            return;
        }

        if self.stage.handle(line) == Disposition::Fallback {
            self.stage.fallback(line);
        }
    }

    fn close(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }

        self.stage.finish();
        if let Some(sink) = self.stage.downstream() {
            sink.close();
        }
    }
}

/// Wrap a stage so it can be used as a boxed sink
pub fn boxed<S: Stage + 'static>(stage: S) -> Box<dyn Sink> {
    Box::new(Pipe::new(stage))
}

/// A sink that drops everything
#[derive(Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn handle_line(&mut self, _line: &Line) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::CollectSink;

    /// Swallows PINGs, marks JOINs as unhandled, forwards the rest
    struct TestStage {
        sink: Box<dyn Sink>,
        finished: usize,
    }

    impl Stage for TestStage {
        fn handle(&mut self, line: &Line) -> Disposition {
            match line.command() {
                "PING" => Disposition::Handled,
                "JOIN" => false.into(),
                _ => Disposition::Fallback,
            }
        }

        fn downstream(&mut self) -> Option<&mut (dyn Sink + 'static)> {
            Some(self.sink.as_mut())
        }

        fn finish(&mut self) {
            self.finished += 1;
        }
    }

    fn pipe() -> (Pipe<TestStage>, CollectSink) {
        let collected = CollectSink::new();
        let stage = TestStage {
            sink: Box::new(collected.clone()),
            finished: 0,
        };
        (Pipe::new(stage), collected)
    }

    #[test]
    fn handled_lines_skip_fallback() {
        let (mut pipe, collected) = pipe();
        pipe.handle_line(&Line::new("PING", ["x"]));
        pipe.handle_line(&Line::new("JOIN", ["#a"]));
        pipe.handle_line(&Line::new("PRIVMSG", ["#a", "hi"]));

        let commands: Vec<_> = collected.lines().iter().map(|l| l.command().to_string()).collect();
        assert_eq!(commands, ["JOIN", "PRIVMSG"]);
    }

    #[test]
    fn close_is_idempotent() {
        let (mut pipe, collected) = pipe();
        pipe.close();
        pipe.close();
        pipe.close();

        assert!(pipe.is_closed());
        assert_eq!(pipe.stage().finished, 1);
        assert_eq!(collected.close_count(), 1);
    }

    #[test]
    fn nothing_passes_after_close() {
        let (mut pipe, collected) = pipe();
        pipe.close();
        pipe.handle_line(&Line::new("PRIVMSG", ["#a", "late"]));
        assert!(collected.lines().is_empty());
    }

    #[test]
    fn boxed_stage_is_a_sink() {
        let collected = CollectSink::new();
        let mut sink = boxed(TestStage {
            sink: Box::new(collected.clone()),
            finished: 0,
        });
        sink.handle_line(&Line::new("NOTICE", ["#a", "hi"]));
        sink.close();
        assert_eq!(collected.lines().len(), 1);
        assert_eq!(collected.close_count(), 1);
    }
}
