//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// venvpack - Bundle, relocate, and repair virtual environments
#[derive(Parser, Debug)]
#[command(name = "venvpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Pack an environment into a single relocatable archive
    ///
    /// Symlinks and permission bits are preserved exactly, so the
    /// archive can be unpacked and repaired on any host.
    ///
    /// Examples:
    ///   venvpack bundle ./venv                      # writes ./venv.tgz
    ///   venvpack bundle ./venv --output /tmp/v.tgz
    Bundle {
        /// Environment root (the directory containing bin/)
        root: PathBuf,

        /// Archive to write (defaults to the root's name with .tgz)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Unpack an archive and repair the restored environment
    ///
    /// Repair runs by default so the environment works at its new
    /// location; pass --no-repair to restore the tree untouched.
    Unpack {
        /// Archive produced by bundle
        archive: PathBuf,

        /// Directory to create (must not exist)
        output_dir: PathBuf,

        /// Skip the repair step after unpacking
        #[arg(long)]
        no_repair: bool,

        /// Shebang path to write into launcher scripts
        /// (defaults to <output-dir>/bin/python)
        #[arg(long)]
        shebang: Option<PathBuf>,

        /// Interpreter path the bin/python link should point at
        /// (defaults to the running executable)
        #[arg(long)]
        python: Option<PathBuf>,
    },

    /// Repair an already-unpacked environment in place
    ///
    /// Rewrites every launcher shebang in bin/ and re-points the
    /// bin/python link. Safe to re-run; targets are not required to
    /// exist yet.
    Repair {
        /// Environment root (the directory containing bin/)
        root: PathBuf,

        /// Shebang path to write into launcher scripts
        /// (defaults to <root>/bin/python)
        #[arg(long)]
        shebang: Option<PathBuf>,

        /// Interpreter path the bin/python link should point at
        /// (defaults to the running executable)
        #[arg(long)]
        python: Option<PathBuf>,
    },
}
