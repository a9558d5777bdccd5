use beacon_records::StdinSource;
use beacon_records::app::{Options, run_with_io};
use clap::Parser;
use std::panic::{self, PanicHookInfo};
use tracing::info;

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Clean exit codes for process managers and shell pipelines
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        std::process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();

    let default_level = if options.verbose { "info" } else { "warn" };
    if let Err(why) = beacon_records::logging::init(default_level) {
        eprintln!("error: {}", why);
        std::process::exit(EXIT_ERROR);
    }

    info!(platform = %options.platform, format = %options.format, "reading beacon frames from stdin");

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    match run_with_io(options, &StdinSource, &mut out, &mut err).await {
        Ok(stats) => {
            info!(?stats, "done");
            std::process::exit(EXIT_SUCCESS)
        }
        Err(why) => {
            eprintln!("error: {}", why);
            std::process::exit(EXIT_ERROR);
        }
    }
}
