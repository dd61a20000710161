use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for quire
#[derive(Parser, Debug)]
#[command(author, version, about = "quire: score, check and convert blog post markup")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Print reports as JSON instead of text
  #[arg(long, global = true)]
  pub json: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times). Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", global = true, action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the quire CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new quire configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "quire.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Score a post for search-engine quality.
  Analyze {
    /// Post body (HTML, Markdown or plain text).
    file: PathBuf,

    /// Post title. Defaults to the first heading of the body.
    #[arg(short = 'T', long)]
    title: Option<String>,

    /// Post description.
    #[arg(short, long, default_value = "")]
    description: String,

    /// URL slug. Defaults to the slugified title.
    #[arg(short, long)]
    slug: Option<String>,

    /// Target keyword (can be specified multiple times)
    #[arg(short, long = "keyword", action = clap::ArgAction::Append)]
    keywords: Vec<String>,
  },

  /// Check a post for accessibility problems.
  A11y {
    /// Post body (HTML, Markdown or plain text).
    file: PathBuf,
  },

  /// Number headings, assign anchors and insert a table of contents at the
  /// top of the post.
  Toc {
    /// Post markup.
    file: PathBuf,

    /// Where to write the updated markup. Prints it when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Convert an HTML, Markdown or text file into canonical post markup.
  Import {
    /// File to import; the format follows its extension.
    input: PathBuf,

    /// Where to write the markup. Prints it when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Export post markup as a standalone HTML page or approximate Markdown.
  Export {
    /// Post markup.
    input: PathBuf,

    /// Output file; `.md` writes Markdown, anything else HTML.
    output: PathBuf,

    /// Page title for HTML export.
    #[arg(short = 'T', long, default_value = "")]
    title: String,
  },

  /// Check that files hold markup the structured editor accepts.
  Validate {
    /// Files to check.
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },

  /// Score every `.html` post under a directory.
  Audit {
    /// Directory to walk.
    dir: PathBuf,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
