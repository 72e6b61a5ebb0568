mod app;
mod config;
mod error;
mod listing;
mod signals;
mod term;
#[cfg(test)]
mod test_support;
mod ui;
mod viewport;

use app::{App, Outcome};
use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use config::Config;
use signals::Signals;
use simplelog::{ConfigBuilder, WriteLogger};
use std::env;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::process::ExitCode;
use term::Tty;

const EXIT_USAGE: u8 = 1;
/// Quit without choosing anything.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "browse", version)]
#[command(about = "Pick an entry of the current directory and print its name")]
struct Args {
    /// Show hidden entries
    #[arg(short, long)]
    all: bool,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            e.print()?;
            return Ok(ExitCode::from(code));
        }
    };

    let config = Config::load();
    init_logging(&config);
    let show_hidden = args.all || config.show_hidden;

    let cwd = env::current_dir()?;
    let entries = listing::read_entries(&cwd, show_hidden)
        .wrap_err_with(|| format!("cannot read directory {}", cwd.display()))?;
    let signals = Signals::install()?;

    // The session is dropped before anything reaches stdout: the UI is
    // erased and the terminal restored, on errors too.
    let outcome = {
        let tty = Tty::open()?;
        let mut app = App::new(tty, &config, cwd, entries, show_hidden);
        app.run(&signals)?
    };

    match outcome {
        Outcome::Selected(name) => {
            write_selection(&mut io::stdout().lock(), &name)?;
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Cancelled => Ok(ExitCode::from(EXIT_CANCELLED)),
    }
}

/// Writes the name exactly as the filesystem returned it, plus a newline.
fn write_selection<W: Write>(out: &mut W, name: &OsStr) -> io::Result<()> {
    out.write_all(name.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Logs go to a file only: stderr and stdout are both shared with the shell.
fn init_logging(config: &Config) {
    let Some(path) = &config.log_file else {
        return;
    };

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let file = match File::options().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("browse: cannot open log file {}: {}", path.display(), e);
            return;
        }
    };
    if let Err(e) = WriteLogger::init(config.log_level, log_config, file) {
        eprintln!("browse: cannot start logging: {}", e);
        return;
    }
    log::info!("browse {} starting", env!("CARGO_PKG_VERSION"));
}
