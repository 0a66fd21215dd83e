//! Feeding stored logs through a pipeline.
//!
//! A stored log holds one record per line: the arrival time, a space, and
//! the raw protocol line. Replaying a log runs every record through the same
//! parsing and pipeline as live traffic.

use crate::errors::ReplayError;
use crate::pipeline::Sink;
use chanlog_proto::errors::ParseError;
use chanlog_proto::Line;

use std::io::BufRead;

/// What happened during a replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records read
    pub records: usize,
    /// Lines delivered to the pipeline
    pub delivered: usize,
    /// Records skipped because they couldn't be parsed
    pub skipped: usize,
}

/// Split one stored record into its time and line
pub fn parse_record(record: &str) -> Result<Line, ParseError> {
    let record = record.trim_end_matches(['\r', '\n']);
    let Some((time, raw)) = record.split_once(' ') else {
        return Err(ParseError::MalformedRecord(record.to_string()));
    };
    Line::parse(raw, Some(time))
}

/// Run every record of `input` through `pipeline`, then close it.
///
/// Records that can't be parsed are reported and skipped. The pipeline is
/// closed even if reading fails part way.
pub fn run<R: BufRead>(mut input: R, pipeline: &mut dyn Sink) -> Result<ReplayStats, ReplayError> {
    let mut stats = ReplayStats::default();
    let mut buffer = Vec::new();

    let result = loop {
        buffer.clear();
        match input.read_until(b'\n', &mut buffer) {
            Ok(0) => break Ok(()),
            Ok(_) => (),
            Err(e) => break Err(e),
        }
        stats.records += 1;

        // Old logs aren't always valid UTF-8
        let record = String::from_utf8_lossy(&buffer);
        match parse_record(&record) {
            Ok(line) => {
                pipeline.handle_line(&line);
                stats.delivered += 1;
            }
            Err(error) => {
                tracing::warn!(%error, record = stats.records, "Skipping record");
                stats.skipped += 1;
            }
        }
    };

    pipeline.close();
    result?;

    tracing::debug!(?stats, "Replay finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::CollectSink;
    use pretty_assertions::assert_eq;

    #[test]
    fn records() {
        let line = parse_record("2008-09-25T18:32:40+03:00 :a!u@h PRIVMSG #c :hi\r\n").unwrap();
        assert_eq!(line.time(), Some("2008-09-25T18:32:40+03:00"));
        assert_eq!(line.utc_time(), Some("2008-09-25T15:32:40Z"));
        assert_eq!(line.args(), ["#c", "hi"]);

        assert_eq!(
            parse_record("nospace"),
            Err(ParseError::MalformedRecord("nospace".to_string()))
        );
        assert_eq!(parse_record("2008-09-25T18:32:40Z "), Err(ParseError::Empty));
    }

    #[test]
    fn skips_bad_records_and_closes() {
        let input = b"2008-09-25T18:32:40Z PING one\n\
                      garbage\n\
                      2008-09-25T18:32:41Z \xff\xfe PRIVMSG #c :latin-1\r\n\
                      2008-09-25T18:32:42Z :srv 001 bot :Welcome";
        let collected = CollectSink::new();
        let mut sink = collected.clone();

        let stats = run(&input[..], &mut sink).unwrap();
        assert_eq!(
            stats,
            ReplayStats {
                records: 4,
                delivered: 3,
                skipped: 1
            }
        );
        assert_eq!(
            collected.lines().iter().map(|l| l.command().to_string()).collect::<Vec<_>>(),
            ["PING", "\u{fffd}\u{fffd}", "RPL_WELCOME"]
        );
        assert_eq!(collected.close_count(), 1);
    }
}
