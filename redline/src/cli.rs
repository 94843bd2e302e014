//! Command-line arguments.
//!
//! Flags override the matching keys from the config file; see
//! [`crate::config::Config::apply_cli`].

use std::path::PathBuf;

use clap::Parser;

/// Review a proposed rewrite of a file block by block
#[derive(Parser, Debug)]
#[command(name = "redline", version, about)]
pub struct Cli {
    /// The file as it is now
    pub original: PathBuf,

    /// The rewrite to review against it
    pub proposed: PathBuf,

    /// Where the reviewed content is written [default: ORIGINAL.reviewed]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Where `e` writes the exported copy [default: ORIGINAL.export]
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Lines of unchanged context around each hunk
    #[arg(short = 'C', long)]
    pub context: Option<usize>,

    /// Name of the tool that produced the rewrite; keys stored decisions
    #[arg(long, default_value = "write_file")]
    pub tool: String,

    /// Conversation id keying stored decisions [default: resumed per file and tool]
    #[arg(long)]
    pub conversation: Option<String>,

    /// SQLite database holding decisions
    #[arg(long)]
    pub db: Option<PathBuf>,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| with_suffix(&self.original, "reviewed"))
    }

    pub fn export_path(&self) -> PathBuf {
        self.export
            .clone()
            .unwrap_or_else(|| with_suffix(&self.original, "export"))
    }
}

/// `notes.md` + `reviewed` -> `notes.md.reviewed`.
fn with_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
