//! The `chanlog` subcommands.

use crate::config::{load_config, LoggingConfig};
use crate::connection::run_connection;
use chanlog_session::prelude::*;
use chanlog_session::replay;
use tracing_subscriber::util::SubscriberInitExt;

use std::{
    fs::{File, OpenOptions},
    io::{self, BufReader, Write},
    path::Path,
};

/// How a stored log is to be replayed
#[derive(Debug, Default, Clone)]
pub struct ReplayOptions {
    /// Only lines concerning this channel
    pub channel: Option<String>,
    /// Only lines whose UTC time starts with this
    pub time: Option<String>,
    /// Keep messages marked as off the record
    pub with_off_record: bool,
    /// Print a JSON index of channels and days instead of the lines
    pub index: bool,
}

/// Build the replay pipeline in front of `sink`: off-record removal, then
/// the channel, then the time
pub fn replay_pipeline(options: &ReplayOptions, sink: Box<dyn Sink>) -> Box<dyn Sink> {
    let mut pipeline = sink;
    if let Some(time) = &options.time {
        pipeline = boxed(TimeFilter::new(time.clone(), pipeline));
    }
    if let Some(channel) = &options.channel {
        pipeline = boxed(ChannelFilter::new(channel.as_str(), pipeline));
    }
    if !options.with_off_record {
        pipeline = boxed(OffRecordFilter::new(true, pipeline));
    }
    pipeline
}

/// Replay `input`, writing the result to `output`
pub fn replay_to<W: Write + 'static>(
    input: impl io::BufRead,
    options: &ReplayOptions,
    mut output: W,
) -> Result<replay::ReplayStats, anyhow::Error> {
    if options.index {
        let index = SharedSink::new(ChannelsAndDaysSink::new());
        let mut pipeline = replay_pipeline(options, Box::new(index.clone()));
        let stats = replay::run(input, &mut pipeline)?;

        serde_json::to_writer_pretty(&mut output, index.borrow().index())?;
        writeln!(output)?;
        Ok(stats)
    } else {
        let mut pipeline = replay_pipeline(options, Box::new(RawSink::new(output)));
        Ok(replay::run(input, &mut pipeline)?)
    }
}

/// `chanlog replay`: run a stored log through the filters to stdout
pub fn run_replay(log: &Path, options: ReplayOptions) -> Result<(), anyhow::Error> {
    crate::tracing_config::build_subscriber(LoggingConfig::for_replay())?.init();

    let input = BufReader::new(File::open(log)?);
    let stats = replay_to(input, &options, io::stdout())?;

    if stats.skipped > 0 {
        tracing::warn!(?stats, "Some records couldn't be replayed");
    }
    Ok(())
}

/// `chanlog connect`: log one live connection until it ends
pub fn run_connect(config_path: &Path) -> Result<(), anyhow::Error> {
    let config = load_config(config_path)?;
    crate::tracing_config::build_subscriber(config.logging.clone())?.init();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    let log = boxed_raw(log_file);

    let mut session = ServerSession::new(config.session.clone(), SystemClock::new(), log);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        let shutdown = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "Couldn't listen for interrupts");
                std::future::pending::<()>().await;
            }
        };
        run_connection(&mut session, &config.address(), shutdown).await
    });

    session.close();
    result
}

fn boxed_raw(file: File) -> Box<dyn Sink> {
    Box::new(RawSink::new(io::LineWriter::new(file)))
}
