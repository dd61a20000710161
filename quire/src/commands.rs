//! Subcommand implementations. Each returns the rendered report so the
//! binary only has to print it.
use std::{
  fmt::Write as _,
  fs,
  path::{Path, PathBuf},
};

use color_eyre::eyre::{Context, Result, bail};
use log::{debug, info};
use quire_config::Config;
use quire_editor::{
  AccessibilityReport,
  ContentAnalysis,
  DocumentStats,
  EditorSession,
  Field,
  NodePath,
  PostFields,
  TocEntry,
  analysis::BodyFacts,
  analyze,
  check_accessibility,
  convert::{ImportFormat, export_file, import_file},
  parse,
};
use serde::Serialize;
use walkdir::WalkDir;

/// A report that can be printed as text or JSON.
pub trait Report: Serialize {
  fn to_text(&self) -> String;
}

/// Render `report` for the terminal.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(report: &impl Report, json: bool) -> Result<String> {
  if json {
    serde_json::to_string_pretty(report).wrap_err("Failed to serialize report")
  } else {
    Ok(report.to_text())
  }
}

/// Read a post body. HTML is taken as-is so that the analyzers see exactly
/// what is stored; other formats are converted first.
fn read_body(path: &Path) -> Result<String> {
  if ImportFormat::from_path(path) == ImportFormat::Html {
    fs::read_to_string(path)
      .wrap_err_with(|| format!("Failed to read {}", path.display()))
  } else {
    import_file(path).wrap_err_with(|| format!("Failed to import {}", path.display()))
  }
}

fn read_markup(path: &Path) -> Result<String> {
  fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
  }
  fs::write(path, content).wrap_err_with(|| format!("Failed to write {}", path.display()))
}

/// Write a default configuration file.
///
/// # Errors
///
/// Returns an error if `output` exists and `force` is not set, or the file
/// cannot be generated.
pub fn init(output: &Path, format: &str, force: bool) -> Result<()> {
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }
  Config::generate_default_config(format, output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;
  info!("Configuration file created successfully. Edit it to tune the editor and analyzers.");
  Ok(())
}

/// Post fields for `analyze` beyond the body.
#[derive(Debug, Clone, Default)]
pub struct PostMeta {
  pub title:       Option<String>,
  pub description: String,
  pub slug:        Option<String>,
  pub keywords:    Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReport {
  pub file:     PathBuf,
  pub analysis: ContentAnalysis,
  pub stats:    DocumentStats,
}

impl Report for AnalyzeReport {
  fn to_text(&self) -> String {
    let analysis = &self.analysis;
    let mut out = format!(
      "{}: {}% ({})\n{} words, about {} min read\n",
      self.file.display(),
      analysis.overall_score_percent,
      analysis.rating,
      self.stats.word_count,
      self.stats.estimated_read_minutes
    );
    for (section, score) in &analysis.sections {
      let _ = writeln!(
        out,
        "\n{:<12} {:>5.1} / {}",
        section.label(),
        score.points,
        score.weight
      );
      for finding in &score.findings {
        let _ = writeln!(out, "  - {finding}");
      }
    }
    if !analysis.top_recommendations.is_empty() {
      out.push_str("\nRecommendations:\n");
      for (i, recommendation) in analysis.top_recommendations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {recommendation}", i + 1);
      }
    }
    for warning in &analysis.warnings {
      let _ = writeln!(out, "\nWarning: {warning}");
    }
    out
  }
}

/// Score the post at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or imported.
pub fn analyze_file(path: &Path, meta: PostMeta, config: &Config) -> Result<AnalyzeReport> {
  let body = read_body(path)?;
  let facts = BodyFacts::extract(&body);

  let title = meta
    .title
    .or_else(|| facts.headings.first().map(|heading| heading.text.clone()))
    .unwrap_or_default();
  let mut fields = PostFields::default();
  fields.set_title(title);
  fields.set_description(meta.description);
  if let Some(slug) = meta.slug {
    fields.edit(Field::Slug, slug);
  }
  fields.tags = meta.keywords;

  let input = fields.analysis_input(body);
  debug!("Analyzing {} ({} bytes)", path.display(), input.body.len());
  Ok(AnalyzeReport {
    file:     path.to_path_buf(),
    analysis: analyze(&input),
    stats:    DocumentStats::from_facts(&facts, config.editor.words_per_minute),
  })
}

#[derive(Debug, Serialize)]
pub struct A11yReport {
  pub file:   PathBuf,
  #[serde(flatten)]
  pub report: AccessibilityReport,
}

impl Report for A11yReport {
  fn to_text(&self) -> String {
    let mut out = format!(
      "{}: accessibility score {}\n",
      self.file.display(),
      self.report.score
    );
    for finding in &self.report.findings {
      let _ = writeln!(out, "  [{}] {}", finding.severity, finding.message);
    }
    for pass in &self.report.passes {
      let _ = writeln!(out, "  [ok] {pass}");
    }
    out
  }
}

/// Check the post at `path` for accessibility problems.
///
/// # Errors
///
/// Returns an error if the file cannot be read or imported.
pub fn a11y_file(path: &Path) -> Result<A11yReport> {
  let body = read_body(path)?;
  Ok(A11yReport {
    file:   path.to_path_buf(),
    report: check_accessibility(&body),
  })
}

#[derive(Debug, Serialize)]
pub struct TocReport {
  pub entries: Vec<TocEntry>,
  /// The updated markup, unless it was written to a file.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub markup:  Option<String>,
}

impl Report for TocReport {
  fn to_text(&self) -> String {
    if let Some(markup) = &self.markup {
      return markup.clone();
    }
    let mut out = String::new();
    for entry in &self.entries {
      let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
      let _ = writeln!(out, "{indent}{} (#{})", entry.label(), entry.anchor_id);
    }
    out
  }
}

/// Index the headings of the post at `path` and insert a table of contents
/// at its top.
///
/// # Errors
///
/// Returns an error if the markup does not parse or cannot be written.
pub fn toc_file(path: &Path, output: Option<&Path>, config: &Config) -> Result<TocReport> {
  let markup = read_markup(path)?;
  let (mut session, error) = EditorSession::from_markup(&markup, config.session_options());
  if let Some(error) = error {
    bail!("{}: {error}", path.display());
  }
  session.document_mut()?.set_cursor(&NodePath::root(), 0)?;
  let entries = session.insert_toc()?;
  let updated = session.markup();

  let markup = match output {
    Some(output) => {
      write_output(output, &updated)?;
      info!("Wrote {} TOC entries to {}", entries.len(), output.display());
      None
    },
    None => Some(updated),
  };
  Ok(TocReport { entries, markup })
}

/// Convert `input` into canonical markup.
///
/// # Errors
///
/// Returns an error if the file cannot be imported or the output written.
pub fn import(input: &Path, output: Option<&Path>) -> Result<Option<String>> {
  let markup =
    import_file(input).wrap_err_with(|| format!("Failed to import {}", input.display()))?;
  match output {
    Some(output) => {
      write_output(output, &markup)?;
      info!("Imported {} into {}", input.display(), output.display());
      Ok(None)
    },
    None => Ok(Some(markup)),
  }
}

/// Export the markup in `input` to `output`.
///
/// # Errors
///
/// Returns an error if the markup cannot be read, parsed for Markdown, or
/// written.
pub fn export(input: &Path, output: &Path, title: &str) -> Result<()> {
  let markup = read_markup(input)?;
  export_file(output, &markup, title)
    .wrap_err_with(|| format!("Failed to export {}", output.display()))?;
  info!("Exported {} to {}", input.display(), output.display());
  Ok(())
}

#[derive(Debug, Serialize)]
pub struct ValidationResult {
  pub file:   PathBuf,
  pub valid:  bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub line:   Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub column: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
  pub results: Vec<ValidationResult>,
}

impl ValidationReport {
  #[must_use]
  pub fn all_valid(&self) -> bool {
    self.results.iter().all(|result| result.valid)
  }
}

impl Report for ValidationReport {
  fn to_text(&self) -> String {
    let mut out = String::new();
    for result in &self.results {
      match (&result.error, result.line, result.column) {
        (Some(error), Some(line), Some(column)) => {
          let _ = writeln!(out, "{}:{line}:{column}: {error}", result.file.display());
        },
        (Some(error), ..) => {
          let _ = writeln!(out, "{}: {error}", result.file.display());
        },
        (None, ..) => {
          let _ = writeln!(out, "{}: ok", result.file.display());
        },
      }
    }
    out
  }
}

/// Check that every file parses into the structured editor.
#[must_use]
pub fn validate(files: &[PathBuf]) -> ValidationReport {
  let results = files
    .iter()
    .map(|file| {
      let outcome = fs::read_to_string(file).map_err(|e| (e.to_string(), None)).and_then(
        |markup| {
          parse(&markup)
            .map(|_| ())
            .map_err(|e| (e.kind.to_string(), Some((e.line, e.column))))
        },
      );
      match outcome {
        Ok(()) => {
          ValidationResult {
            file:   file.clone(),
            valid:  true,
            error:  None,
            line:   None,
            column: None,
          }
        },
        Err((error, position)) => {
          ValidationResult {
            file:   file.clone(),
            valid:  false,
            error:  Some(error),
            line:   position.map(|(line, _)| line),
            column: position.map(|(_, column)| column),
          }
        },
      }
    })
    .collect();
  ValidationReport { results }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRow {
  pub file:                PathBuf,
  pub score_percent:       u8,
  pub rating:              String,
  pub accessibility_score: u8,
  pub word_count:          usize,
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
  pub posts: Vec<AuditRow>,
}

impl Report for AuditReport {
  fn to_text(&self) -> String {
    let width = self
      .posts
      .iter()
      .map(|row| row.file.display().to_string().len())
      .max()
      .unwrap_or(4)
      .max(4);
    let mut out = format!(
      "{:<width$}  {:>5}  {:<10}  {:>4}  {:>6}\n",
      "Post", "Score", "Rating", "A11y", "Words"
    );
    for row in &self.posts {
      let _ = writeln!(
        out,
        "{:<width$}  {:>4}%  {:<10}  {:>4}  {:>6}",
        row.file.display().to_string(),
        row.score_percent,
        row.rating,
        row.accessibility_score,
        row.word_count
      );
    }
    out
  }
}

/// Score every `.html` file under `dir`, worst first.
///
/// # Errors
///
/// Returns an error if `dir` is not a directory or a post cannot be read.
pub fn audit(dir: &Path, config: &Config) -> Result<AuditReport> {
  if !dir.is_dir() {
    bail!("Not a directory: {}", dir.display());
  }

  let mut files: Vec<PathBuf> = WalkDir::new(dir)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .map(walkdir::DirEntry::into_path)
    .filter(|path| ImportFormat::from_path(path) == ImportFormat::Html)
    .collect();
  files.sort();
  debug!("Auditing {} post(s) under {}", files.len(), dir.display());

  let mut posts = Vec::with_capacity(files.len());
  for file in files {
    let report = analyze_file(&file, PostMeta::default(), config)?;
    let body = read_markup(&file)?;
    posts.push(AuditRow {
      score_percent: report.analysis.overall_score_percent,
      rating: report.analysis.rating.to_string(),
      accessibility_score: check_accessibility(&body).score,
      word_count: report.stats.word_count,
      file: file.strip_prefix(dir).map(Path::to_path_buf).unwrap_or(file),
    });
  }
  posts.sort_by_key(|row| row.score_percent);
  Ok(AuditReport { posts })
}
