//! Command-line front end over the `xnb` library: unpack an `.xnb` file into
//! a JSON document plus sidecar media, or pack such a document back into a
//! fresh `.xnb` file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xnb-cli", about = "Inspect and convert XNA content (.xnb) files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Unpack an .xnb file into a JSON document and sidecar media files.
    Unpack {
        /// Path to the source .xnb file.
        input: PathBuf,
        /// Directory to write document.json and sidecar files into.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Pack a JSON document (and its sidecars) back into an .xnb file.
    Pack {
        /// Path to the document.json produced by `unpack`.
        input: PathBuf,
        /// Path to write the resulting .xnb file to.
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Unpack { input, out_dir } => run_unpack(&input, &out_dir),
        Command::Pack { input, output } => run_pack(&input, &output),
    }
}

fn run_unpack(input: &Path, out_dir: &Path) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let basename = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
        .to_string();

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut emit = |data: &[u8], name: &str| -> String {
        let path = out_dir.join(name);
        if let Err(e) = fs::write(&path, data) {
            log::error!("failed to write sidecar {}: {e}", path.display());
        }
        name.to_string()
    };

    let doc = xnb::document::unpack(&bytes, &basename, &mut emit)
        .with_context(|| format!("unpacking {}", input.display()))?;

    let json = serde_json::to_string_pretty(&doc).context("serializing document to JSON")?;
    let doc_path = out_dir.join(format!("{basename}.json"));
    fs::write(&doc_path, json).with_context(|| format!("writing {}", doc_path.display()))?;

    log::info!("unpacked {} into {}", input.display(), out_dir.display());
    Ok(())
}

fn run_pack(input: &Path, output: &Path) -> Result<()> {
    let json = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let doc: xnb::document::Document =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", input.display()))?;

    let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
    let mut load = |name: &str| -> std::io::Result<Vec<u8>> { fs::read(base_dir.join(name)) };

    let bytes = xnb::document::pack(&doc, &mut load)
        .with_context(|| format!("packing {}", input.display()))?;
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;

    log::info!("packed {} into {}", input.display(), output.display());
    Ok(())
}
