//! folio CLI - build documentation sites and highlight code in generated HTML.

use anyhow::{Context, Result, bail};
use facet::Facet;
use facet_args as args;
use folio::{Config, DEFAULT_CONFIG_FILE, HighlightSettings, RunStats};
use folio_highlight::{HighlightConfig, Highlighter, HtmlFormat, Languages};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Static documentation pipeline with tree-sitter code highlighting.
#[derive(Debug, Facet)]
struct Args {
    #[facet(args::subcommand)]
    command: Command,
}

/// Available commands
#[derive(Debug, Facet)]
#[repr(u8)]
#[allow(dead_code)] // variants used by facet_args derive
enum Command {
    /// Run every step configured in folio.toml
    Build {
        /// Configuration file (defaults to ./folio.toml)
        #[facet(args::named, args::short = 'c', default)]
        config: Option<PathBuf>,
    },

    /// Convert markdown files to HTML pages
    Markdown {
        #[facet(args::named, args::short = 'c', default)]
        config: Option<PathBuf>,
    },

    /// Add a table of contents to HTML pages
    Toc {
        #[facet(args::named, args::short = 'c', default)]
        config: Option<PathBuf>,
    },

    /// Apply the configured HTML transforms
    Transform {
        #[facet(args::named, args::short = 'c', default)]
        config: Option<PathBuf>,
    },

    /// Copy front-end artifacts into the output tree
    Copy {
        #[facet(args::named, args::short = 'c', default)]
        config: Option<PathBuf>,
    },

    /// Highlight code[data-language] elements in a directory of HTML files
    Highlight {
        /// Directory containing HTML files
        #[facet(args::positional)]
        input: PathBuf,

        /// Output directory (defaults to modifying input in place)
        #[facet(args::positional, default)]
        output: Option<PathBuf>,

        /// Markup format: custom-elements, class-names, or either with :prefix
        #[facet(args::named, default)]
        format: Option<String>,

        /// Show verbose output
        #[facet(args::named, args::short = 'v', default)]
        verbose: bool,
    },

    /// List the language keys highlighting recognizes
    Languages,

    /// Print the highlighting stylesheet
    Css {
        /// Markup format the stylesheet targets
        #[facet(args::named, default)]
        format: Option<String>,
    },
}

fn main() {
    let args: Args = facet_args::from_std_args().unwrap_or_else(|e| {
        if let Some(text) = e.help_text() {
            eprintln!("{text}");
        } else {
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    });

    let verbose = matches!(args.command, Command::Highlight { verbose: true, .. });
    init_logging(verbose);

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Build { config } => {
            let config = load_config(config.as_deref())?;
            let start = Instant::now();
            let report = folio::build(&config)?;
            for (step, stats) in &report.steps {
                print_stats(step, stats);
            }
            if let Some(css) = &report.stylesheet {
                eprintln!("  {} Stylesheet: {}", "✓".green(), css.display());
            }
            eprintln!("\n  Completed in {:.2}s", start.elapsed().as_secs_f64());
        }
        Command::Markdown { config } => {
            let config = load_config(config.as_deref())?;
            let Some(options) = &config.markdown else {
                bail!("no [markdown] table in configuration");
            };
            print_stats("markdown", &folio::convert_markdown(options)?);
        }
        Command::Toc { config } => {
            let config = load_config(config.as_deref())?;
            let Some(options) = &config.toc else {
                bail!("no [toc] table in configuration");
            };
            print_stats("toc", &folio::add_table_of_contents(options)?);
        }
        Command::Transform { config } => {
            let config = load_config(config.as_deref())?;
            let Some(options) = &config.transform else {
                bail!("no [transform] table in configuration");
            };
            let registry = folio::registry(&config)?;
            print_stats("transform", &folio::transform_html(options, &registry)?);
        }
        Command::Copy { config } => {
            let config = load_config(config.as_deref())?;
            let Some(options) = &config.copy else {
                bail!("no [copy] table in configuration");
            };
            print_stats("copy", &folio::copy_artifacts(options)?);
        }
        Command::Highlight {
            input,
            output,
            format,
            verbose: _,
        } => highlight(&input, output.as_deref(), format.as_deref())?,
        Command::Languages => {
            let languages = Languages::builtin()?;
            for key in languages.keys() {
                println!("{key}");
            }
        }
        Command::Css { format } => {
            print!("{}", folio_highlight::stylesheet(&parse_format(format.as_deref())?));
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    Config::load(path).with_context(|| format!("loading configuration from {}", path.display()))
}

fn parse_format(format: Option<&str>) -> Result<HtmlFormat> {
    match format {
        Some(format) => format.parse().map_err(anyhow::Error::msg),
        None => Ok(HtmlFormat::default()),
    }
}

fn highlight(input: &Path, output: Option<&Path>, format: Option<&str>) -> Result<()> {
    if !input.exists() {
        bail!("Input directory does not exist: {}", input.display());
    }
    if !input.is_dir() {
        bail!("Input path is not a directory: {}", input.display());
    }

    eprintln!(
        "{} Highlighting: {}",
        "folio".green().bold(),
        input.display()
    );
    match output {
        Some(out) => eprintln!("  Output: {}", out.display()),
        None => eprintln!("  {} Modifying in place", "Note:".yellow()),
    }
    eprintln!();

    let config = HighlightConfig {
        html_format: parse_format(format)?,
        max_injection_depth: HighlightSettings::default().max_injection_depth,
    };
    let highlighter = Highlighter::new(Arc::new(Languages::builtin()?), config);

    let start = Instant::now();
    let stats = folio::highlight_directory(input, output, &highlighter)?;
    print_stats("highlight", &stats);
    eprintln!("\n  Completed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn print_stats(step: &str, stats: &RunStats) {
    eprintln!("{} {}", step.bold(), "results:".bold());
    eprintln!("  {} files processed", stats.files_processed.to_string().cyan());
    if stats.files_failed > 0 {
        eprintln!("  {} files failed", stats.files_failed.to_string().red());
    }
    if stats.blocks_highlighted > 0 || stats.blocks_skipped > 0 {
        eprintln!(
            "  {} code blocks highlighted",
            stats.blocks_highlighted.to_string().green()
        );
        eprintln!(
            "  {} code blocks skipped (unsupported language)",
            stats.blocks_skipped.to_string().yellow()
        );
        eprintln!(
            "  {:+.1}% output size, {:.1} MB/s",
            stats.inflation_percent(),
            stats.throughput_mb_s()
        );
    }
    if !stats.unsupported_languages.is_empty() {
        eprintln!(
            "  {} Unsupported languages: {}",
            "Note:".yellow(),
            stats.unsupported_languages.join(", ")
        );
    }
}
