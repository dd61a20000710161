use std::io::{self, Write};

use color_eyre::eyre::{Result, bail};
use log::LevelFilter;
use quire::{
  cli::{Cli, Commands},
  commands::{self, PostMeta, render},
};
use quire_config::Config;

fn print(text: &str) -> Result<()> {
  let mut stdout = io::stdout().lock();
  if text.ends_with('\n') {
    write!(stdout, "{text}")?;
  } else {
    writeln!(stdout, "{text}")?;
  }
  Ok(())
}

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  // Init must work before any configuration exists
  if let Commands::Init {
    output,
    format,
    force,
  } = &cli.command
  {
    return commands::init(output, format, *force);
  }

  let config = Config::load(&cli.config_files, &cli.config_overrides)?;

  match cli.command {
    Commands::Init { .. } => Ok(()),
    Commands::Analyze {
      file,
      title,
      description,
      slug,
      keywords,
    } => {
      let meta = PostMeta {
        title,
        description,
        slug,
        keywords,
      };
      let report = commands::analyze_file(&file, meta, &config)?;
      print(&render(&report, cli.json)?)
    },
    Commands::A11y { file } => {
      let report = commands::a11y_file(&file)?;
      print(&render(&report, cli.json)?)
    },
    Commands::Toc { file, output } => {
      let report = commands::toc_file(&file, output.as_deref(), &config)?;
      print(&render(&report, cli.json)?)
    },
    Commands::Import { input, output } => {
      match commands::import(&input, output.as_deref())? {
        Some(markup) => print(&markup),
        None => Ok(()),
      }
    },
    Commands::Export {
      input,
      output,
      title,
    } => commands::export(&input, &output, &title),
    Commands::Validate { files } => {
      let report = commands::validate(&files);
      print(&render(&report, cli.json)?)?;
      if !report.all_valid() {
        bail!("Some files failed validation");
      }
      Ok(())
    },
    Commands::Audit { dir } => {
      let report = commands::audit(&dir, &config)?;
      print(&render(&report, cli.json)?)
    },
  }
}
