use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ytplaylist::common::initialize_logging;
use ytplaylist::m3u_utils::{
    compat, copy_files, list_playlist, move_playlist, sanitize_playlist, xspf_list, xspf_to_m3u, PathEncoding,
};

/// M3U playlist maintenance tools.
#[derive(Parser, Debug)]
#[command(name = "m3u", version, about)]
struct Cli {
    /// Increase verbosity: -v for info, -vv for debug.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite playlist paths with a uniform encoding.
    Sanitize {
        /// Write absolute paths.
        #[arg(short, long)]
        absolute: bool,
        /// Path encoding: normal or url.
        #[arg(short = 'e', long, default_value = "normal")]
        encoding: PathEncoding,
        /// Resolve symlinks.
        #[arg(short, long)]
        resolve: bool,
        #[arg(required = true)]
        playlists: Vec<PathBuf>,
    },
    /// Print the files referenced by a playlist.
    List { playlist: PathBuf },
    /// Move a playlist, keeping its relative paths valid.
    Move { src: PathBuf, dst: PathBuf },
    /// Copy the files referenced by a playlist into a directory.
    Copy {
        /// Overwrite files already present in the destination.
        #[arg(short, long)]
        force: bool,
        src: PathBuf,
        dst: PathBuf,
    },
    /// Replace playlist paths by numbered symlinks in a directory.
    Compat { playlist: PathBuf, dest_dir: PathBuf },
    /// Convert an XSPF playlist to an extended M3U playlist.
    #[command(name = "xspf2m3u")]
    Xspf2m3u { src: PathBuf, dst: PathBuf },
    /// Print the files referenced by an XSPF playlist.
    XspfList { src: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _guard = initialize_logging(filter, None)?;

    match cli.command {
        Command::Sanitize { absolute, encoding, resolve, playlists } => {
            for playlist in &playlists {
                sanitize_playlist(playlist, absolute, encoding, resolve)?;
            }
        }
        Command::List { playlist } => {
            for file in list_playlist(&playlist)? {
                println!("{file}");
            }
        }
        Command::Move { src, dst } => {
            move_playlist(&src, &dst)?;
        }
        Command::Copy { force, src, dst } => {
            copy_files(&src, &dst, force)?;
        }
        Command::Compat { playlist, dest_dir } => {
            compat(&playlist, &dest_dir)?;
        }
        Command::Xspf2m3u { src, dst } => {
            xspf_to_m3u(&src, &dst)?;
        }
        Command::XspfList { src } => {
            for file in xspf_list(&src)? {
                println!("{file}");
            }
        }
    }
    Ok(())
}
