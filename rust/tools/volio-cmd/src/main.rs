use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use volio_io::{FileSystem, RetryPolicy};

mod commands;
mod logger;
mod utils;

#[derive(Parser)]
#[command(name = "volio")]
#[command(about = "File-system utility for the volunteer-computing client data directory")]
#[command(version)]
struct Cli {
    /// How long to keep retrying an operation while another process holds
    /// the file, in milliseconds
    #[arg(long, global = true, default_value_t = 5_000)]
    retry_window_ms: u64,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of a directory
    Ls {
        /// Also print the size of each entry
        #[arg(short, long)]
        long: bool,

        dir: PathBuf,
    },

    /// Print the total size of the files in a directory
    Du {
        /// Do not descend into subdirectories
        #[arg(short = 's', long)]
        shallow: bool,

        /// Print the exact byte count
        #[arg(short, long)]
        bytes: bool,

        dir: PathBuf,
    },

    /// Delete files
    Rm {
        /// Delete directories and everything below them
        #[arg(short, long)]
        recursive: bool,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove an empty directory, or only its contents with --contents
    Rmdir {
        /// Delete everything below the directory, keeping the directory
        #[arg(long)]
        contents: bool,

        dir: PathBuf,
    },

    /// Rename a file, replacing the destination
    Mv { from: PathBuf, to: PathBuf },

    /// Copy a file, replacing the destination
    Cp { from: PathBuf, to: PathBuf },

    /// Create a directory
    Mkdir {
        /// Create the parent directories of a file path below the base
        #[arg(short, long, value_name = "BASE")]
        parents: Option<PathBuf>,

        path: PathBuf,
    },

    /// Create a file or update its modification time
    Touch { path: PathBuf },

    /// Shrink or extend a file to the given size in bytes
    Truncate { path: PathBuf, size: u64 },

    /// Print total and free space of the file system holding a path
    Df {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the PATH directory holding an executable
    #[cfg(unix)]
    Which { name: String },

    /// Write standard input to a file in one commit
    Put {
        /// Append instead of replacing the file
        #[arg(short, long)]
        append: bool,

        path: PathBuf,
    },

    /// Take a lock file, hold it, then release it
    Lock {
        /// Seconds to hold the lock
        #[arg(short, long, default_value_t = 0)]
        seconds: u64,

        /// Leave the lock file in place when done
        #[arg(long)]
        keep: bool,

        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let fs = FileSystem::new(RetryPolicy::new(Duration::from_millis(cli.retry_window_ms)));

    match cli.command {
        Commands::Ls { long, dir } => commands::ls::run(&fs, &dir, long),
        Commands::Du {
            shallow,
            bytes,
            dir,
        } => commands::du::run(&fs, &dir, !shallow, bytes),
        Commands::Rm { recursive, paths } => commands::ops::rm(&fs, &paths, recursive),
        Commands::Rmdir { contents, dir } => commands::ops::rmdir(&fs, &dir, contents),
        Commands::Mv { from, to } => commands::ops::mv(&fs, &from, &to),
        Commands::Cp { from, to } => commands::ops::cp(&fs, &from, &to),
        Commands::Mkdir { parents, path } => commands::ops::mkdir(&fs, parents.as_deref(), &path),
        Commands::Touch { path } => commands::ops::touch(&fs, &path),
        Commands::Truncate { path, size } => commands::ops::truncate(&fs, &path, size),
        Commands::Df { path } => commands::df::run(&fs, &path),
        #[cfg(unix)]
        Commands::Which { name } => commands::which::run(&name),
        Commands::Put { append, path } => commands::put::run(&fs, &path, append),
        Commands::Lock {
            seconds,
            keep,
            path,
        } => commands::lock::run(&path, Duration::from_secs(seconds), keep),
    }
}
