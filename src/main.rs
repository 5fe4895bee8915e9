/*!
 * vfsctl - Disk Registry Command Line
 *
 * Builds the disk registry from the environment and runs one operation:
 * - Listing and inspecting entries
 * - Reading files
 * - Creating, deleting, copying and moving entries
 * - Mounting sub-trees as new disks
 */

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use script_vfs::{init_registry, init_tracing, DiskRegistry, VfsConfig};

#[derive(Parser, Debug)]
#[clap(name = "vfsctl", version, about = "Inspect and modify script disks")]
struct Cli {
    /// JSON configuration file; environment variables are used when absent
    #[clap(long, short)]
    config: Option<std::path::PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory (`/` lists disks)
    Ls { path: String },
    /// Print a file
    Cat { path: String },
    /// Print entry info as JSON
    Info { path: String },
    /// Create a directory
    Mkdir { path: String },
    /// Delete a file or empty directory
    Rm { path: String },
    /// Copy a file
    Cp {
        from: String,
        to: String,
        /// Replace an existing destination file
        #[clap(long, short)]
        force: bool,
    },
    /// Move a file
    Mv { from: String, to: String },
    /// Mount a directory as a new disk
    Mount { from: String, name: String },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VfsConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => VfsConfig::from_env(),
    };
    let registry = init_registry(&config).context("building disk registry")?;

    run(&registry, cli.command)
}

fn run(registry: &DiskRegistry, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ls { path } => {
            for name in registry.children(&path)? {
                println!("{}", name);
            }
        }
        Command::Cat { path } => {
            let text = registry
                .read_text(&path)?
                .with_context(|| format!("{} is not a file", path))?;
            print!("{}", text);
        }
        Command::Info { path } => {
            let info = registry.info(&path)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Mkdir { path } => registry.make_dir(&path)?,
        Command::Rm { path } => registry.delete(&path)?,
        Command::Cp { from, to, force } => registry.move_or_copy(&from, &to, false, force)?,
        Command::Mv { from, to } => registry.move_path(&from, &to)?,
        Command::Mount { from, name } => {
            registry.mount(&from, &name)?;
            info!(from = %from, disk = %name, "Mounted (registry lives for this invocation only)");
        }
    }
    Ok(())
}
