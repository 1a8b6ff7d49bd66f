//! # Shotframe CLI
//!
//! Renders a project file into app-store screenshots.
//!
//! ## Usage
//!
//! ```bash
//! shotframe --project shots.json --output dist export --format png
//! shotframe --project shots.json translations export --languages en,fr
//! shotframe --project shots.json translations import translations.json --language fr
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - What to run, resolved from the arguments
//! - `ProjectFile` - JSON description of the canvases, loaded into a store
//!   of raster surfaces

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

mod project;

pub use project::{CanvasSpec, OpenProject, ProjectFile};

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shotframe_core::translation::default_languages;
use shotframe_core::{ExportMode, Language, StorePreset, TranslationDocument};
use shotframe_renderer::{
    ExportPipeline, ExportSettings, Orientation, OutputFormat, ARCHIVE_NAME, TRANSLATIONS_FILE,
};

/// Command-line arguments for shotframe.
#[derive(Debug, Clone, Parser)]
#[command(name = "shotframe")]
#[command(about = "Compose and export app-store screenshots")]
#[command(version)]
pub struct CliArgs {
    /// Project file (JSON). Relative image paths resolve against its directory
    #[arg(long, short, env = "SHOTFRAME_PROJECT")]
    pub project: PathBuf,

    /// Directory the archive and translation files are written to
    #[arg(long, short, env = "SHOTFRAME_OUTPUT", default_value = ".")]
    pub output: PathBuf,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Rasterize every canvas and write the screenshot archive
    Export(ExportArgs),

    /// Translation JSON interchange
    #[command(subcommand)]
    Translations(TranslationsCommand),
}

/// Translation subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum TranslationsCommand {
    /// Write the text of every canvas as a translation document
    Export {
        /// Language codes; the first is pre-filled from the canvases
        #[arg(long, value_delimiter = ',', default_value = "en,fr,es,de,it,ar")]
        languages: Vec<String>,
    },

    /// Apply one language of a translation document, then export screenshots
    Import {
        /// Translation document
        file: PathBuf,

        /// Language section to apply
        #[arg(long)]
        language: String,

        /// Export settings for the translated screenshots
        #[command(flatten)]
        export: ExportArgs,
    },
}

/// Export settings flags.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Store resolution preset
    #[arg(long, value_enum, default_value_t = PresetArg::PhonePortrait)]
    pub preset: PresetArg,

    /// Custom base width; needs --height and overrides --preset
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Custom base height; needs --width
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Screenshot orientation
    #[arg(long, value_enum, default_value_t = OrientationArg::Portrait)]
    pub orientation: OrientationArg,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = FormatArg::Jpeg)]
    pub format: FormatArg,

    /// Export JPEG at full quality
    #[arg(long)]
    pub high_quality: bool,

    /// Completeness mode
    #[arg(long, value_enum, default_value_t = ModeArg::Minimum)]
    pub mode: ModeArg,
}

/// Resolution preset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// 1080 x 1920
    PhonePortrait,
    /// 1920 x 1080
    PhoneLandscape,
    /// 1200 x 1920
    TabletPortrait,
}

/// Orientation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    /// Taller than wide
    Portrait,
    /// Wider than tall
    Landscape,
}

/// Format names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Lossy
    Jpeg,
    /// Lossless
    Png,
}

/// Mode names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// At least 2 screenshots
    Minimum,
    /// At least 4 screenshots
    AppHighlyRecommended,
    /// At least 3 screenshots
    GameHighlyRecommended,
}

impl From<ExportArgs> for ExportSettings {
    fn from(args: ExportArgs) -> Self {
        let preset = match (args.width, args.height) {
            (Some(width), Some(height)) => StorePreset::Custom { width, height },
            _ => match args.preset {
                PresetArg::PhonePortrait => StorePreset::PhonePortrait,
                PresetArg::PhoneLandscape => StorePreset::PhoneLandscape,
                PresetArg::TabletPortrait => StorePreset::TabletPortrait,
            },
        };
        Self {
            preset,
            orientation: match args.orientation {
                OrientationArg::Portrait => Orientation::Portrait,
                OrientationArg::Landscape => Orientation::Landscape,
            },
            format: match args.format {
                FormatArg::Jpeg => OutputFormat::Jpeg,
                FormatArg::Png => OutputFormat::Png,
            },
            high_quality: args.high_quality,
            mode: match args.mode {
                ModeArg::Minimum => ExportMode::Minimum,
                ModeArg::AppHighlyRecommended => ExportMode::AppHighlyRecommended,
                ModeArg::GameHighlyRecommended => ExportMode::GameHighlyRecommended,
            },
        }
    }
}

/// A resolved unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Write the screenshot archive.
    Export(ExportSettings),
    /// Write the translation document.
    ExportTranslations(Vec<Language>),
    /// Apply a translation, then write the screenshot archive.
    ImportTranslations {
        /// Translation document path.
        file: PathBuf,
        /// Language to apply.
        language: String,
        /// Export settings.
        settings: ExportSettings,
    },
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Project file.
    pub project: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// What to run.
    pub task: Task,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        let task = match args.command {
            Command::Export(export) => Task::Export(export.into()),
            Command::Translations(TranslationsCommand::Export { languages }) => {
                let languages = languages.iter().map(String::as_str).map(language);
                Task::ExportTranslations(languages.collect())
            }
            Command::Translations(TranslationsCommand::Import {
                file,
                language,
                export,
            }) => Task::ImportTranslations {
                file,
                language: language.trim().to_lowercase(),
                settings: export.into(),
            },
        };
        Self {
            project: args.project,
            output_dir: args.output,
            task,
        }
    }
}

/// Resolve a language code to a named language. Unknown codes are named by
/// their code.
fn language(code: &str) -> Language {
    let wanted = Language::new(code, code);
    default_languages()
        .into_iter()
        .find(|l| l.code == wanted.code)
        .unwrap_or(wanted)
}

/// Run the configured task.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded, an editor operation
/// is rejected, or an output cannot be written.
pub async fn run(config: CliConfig) -> anyhow::Result<()> {
    let project = ProjectFile::load(&config.project).await?;
    let base_dir = config
        .project
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let open = project.open(&base_dir).await?;
    tracing::info!("Opened project with {} canvases", open.store().len());

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    match config.task {
        Task::Export(settings) => export_archive(&open, settings, &config.output_dir).await,
        Task::ExportTranslations(languages) => {
            let document = TranslationDocument::export(open.store(), &languages)?;
            let path = config.output_dir.join(TRANSLATIONS_FILE);
            tokio::fs::write(&path, document.to_json_pretty()?)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
            Ok(())
        }
        Task::ImportTranslations {
            file,
            language,
            settings,
        } => {
            let json = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let document = TranslationDocument::parse(&json)?;
            let applied = document.apply(open.store(), &language)?;
            tracing::info!("Applied {applied} {language} texts");
            export_archive(&open, settings, &config.output_dir).await
        }
    }
}

async fn export_archive(
    open: &OpenProject,
    settings: ExportSettings,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let archive = ExportPipeline::new(settings).export_all(open.store()).await?;
    let path = output_dir.join(ARCHIVE_NAME);
    tokio::fs::write(&path, &archive.bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Wrote {} ({} files)", path.display(), archive.file_names.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliArgs::try_parse_from(args).expect("args").into()
    }

    #[test]
    fn test_export_defaults() {
        let config = parse(&["shotframe", "--project", "p.json", "export"]);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.task, Task::Export(ExportSettings::default()));
    }

    #[test]
    fn test_custom_dimensions_override_preset() {
        let config = parse(&[
            "shotframe",
            "-p",
            "p.json",
            "export",
            "--width",
            "4000",
            "--height",
            "8000",
            "--orientation",
            "landscape",
            "--format",
            "png",
            "--mode",
            "app-highly-recommended",
        ]);
        let Task::Export(settings) = config.task else {
            panic!("expected export");
        };
        assert_eq!(
            settings.preset,
            StorePreset::Custom {
                width: 4000,
                height: 8000
            }
        );
        assert_eq!(settings.target_dimensions(), (3840, 3840));
        assert_eq!(settings.mode, ExportMode::AppHighlyRecommended);
    }

    #[test]
    fn test_custom_size_needs_both_sides() {
        let width_only =
            CliArgs::try_parse_from(["shotframe", "-p", "p.json", "export", "--width", "10"]);
        assert!(width_only.is_err());
        let height_only =
            CliArgs::try_parse_from(["shotframe", "-p", "p.json", "export", "--height", "10"]);
        assert!(height_only.is_err());
    }

    #[test]
    fn test_translation_languages_are_named() {
        let config = parse(&[
            "shotframe",
            "-p",
            "p.json",
            "translations",
            "export",
            "--languages",
            "EN,xx",
        ]);
        assert_eq!(
            config.task,
            Task::ExportTranslations(vec![
                Language::new("en", "English"),
                Language::new("xx", "xx"),
            ])
        );
    }

    #[test]
    fn test_import_normalizes_language() {
        let config = parse(&[
            "shotframe",
            "-p",
            "p.json",
            "translations",
            "import",
            "t.json",
            "--language",
            "FR",
        ]);
        assert!(matches!(
            config.task,
            Task::ImportTranslations { ref language, .. } if language == "fr"
        ));
    }
}
