use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use rusty_teller::{Directory, JsonStore};

/// A terminal teller: sign in, manage your money, and let the administrator
/// manage the user directory.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path of the JSON user directory. Created with the default accounts
    /// when missing.
    #[arg(long, default_value = "users.json")]
    file: PathBuf,

    /// Where the administrator's balance chart is written.
    #[arg(long, default_value = "balances.png")]
    chart: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut directory = Directory::load(JsonStore::new(&args.file))?;

    let stdin = io::stdin();
    rusty_teller::run(&mut directory, stdin.lock(), io::stdout(), &args.chart)?;
    Ok(())
}
