//! CLI tool for patching Electron asar archives.

mod commands;
mod exit_codes;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Patch an installed Electron application's app.asar
#[derive(Parser)]
#[command(name = "asarpatch")]
#[command(author, version, about = "Patch an installed Electron application's app.asar", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress informational output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply feature patch sets to the archive (alias: p)
    #[command(alias = "p")]
    Patch {
        /// Features to apply, in order (reads patches/<feature>.diff)
        #[arg(required = true)]
        features: Vec<String>,

        /// Archive to patch (discovered if omitted)
        #[arg(short = 'a', long)]
        asar: Option<PathBuf>,

        /// Working directory (defaults to the archive path without extension)
        #[arg(short = 'd', long)]
        dir: Option<PathBuf>,

        /// Directory containing the patches/ folder
        #[arg(short = 'b', long, env = "ASARPATCH_BASE_DIR", default_value = ".")]
        base_dir: PathBuf,

        /// Do not back up the archive first
        #[arg(long)]
        no_backup: bool,

        /// Keep the working directory after packing
        #[arg(long)]
        keep_dir: bool,

        /// Apply each feature in memory before writing any file
        #[arg(long)]
        staged: bool,
    },

    /// Print the discovered archive path
    Locate,

    /// Back up the archive next to itself
    Backup {
        /// Archive to back up (discovered if omitted)
        #[arg(short = 'a', long)]
        asar: Option<PathBuf>,
    },

    /// Extract an archive (alias: x)
    #[command(alias = "x")]
    Unpack {
        /// Archive to extract
        archive: PathBuf,

        /// Output directory (defaults to the archive path without extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Pack a directory into an archive (alias: a)
    #[command(alias = "a")]
    Pack {
        /// Directory to pack
        dir: PathBuf,

        /// Archive to write (defaults to <dir>.asar)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Omit SHA-256 integrity records
        #[arg(long)]
        no_integrity: bool,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive to list
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    // Set up Ctrl+C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Patch {
            features,
            asar,
            dir,
            base_dir,
            no_backup,
            keep_dir,
            staged,
        } => commands::patch(&commands::PatchConfig {
            features: &features,
            asar,
            dir,
            base_dir,
            backup: !no_backup,
            cleanup: !keep_dir,
            staged,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Locate => commands::locate(cli.format),

        Commands::Backup { asar } => commands::backup(asar, cli.format, cli.quiet),

        Commands::Unpack { archive, output } => {
            commands::unpack(&archive, output, cli.format, cli.quiet)
        }

        Commands::Pack {
            dir,
            output,
            no_integrity,
        } => commands::pack(&dir, output, !no_integrity, cli.format, cli.quiet),

        Commands::List { archive } => commands::list(&archive, cli.format),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
