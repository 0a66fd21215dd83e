use chanlog_server::run::{run_connect, run_replay, ReplayOptions};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab")]
enum Opts {
    /// Run a stored log through the filters and print the result
    Replay {
        /// Log file, one `<time> <line>` record per line
        log: PathBuf,

        /// Only lines concerning this channel
        #[structopt(short, long)]
        channel: Option<String>,

        /// Only lines whose UTC time starts with this, e.g. 2008-09-25
        #[structopt(short, long)]
        time: Option<String>,

        /// Keep messages marked [off] the record
        #[structopt(long)]
        with_off_record: bool,

        /// Print a JSON index of channels and days instead of lines
        #[structopt(long)]
        index: bool,
    },

    /// Connect to a server and log what happens
    Connect {
        /// Config file location
        #[structopt(short, long)]
        config: PathBuf,
    },
}

pub fn main() -> Result<(), anyhow::Error> {
    match Opts::from_args() {
        Opts::Replay {
            log,
            channel,
            time,
            with_off_record,
            index,
        } => run_replay(
            &log,
            ReplayOptions {
                channel,
                time,
                with_off_record,
                index,
            },
        ),
        Opts::Connect { config } => run_connect(&config),
    }
}
