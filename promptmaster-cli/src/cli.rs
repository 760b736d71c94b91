//! Command-line surface of the `promptmaster` binary.

use crate::ai_client::AiClient;
use crate::elementor;
use crate::error::{AppError, AppResult};
use crate::input::{detect_dialect, read_source};
use crate::portals::{PORTALS, SAMPLE_HTML};
use crate::prompt::build_prompt;
use crate::server::DEFAULT_PORT;
use crate::settings::SettingsStore;
use crate::watch::{self, WatchOptions};
use clap::{Parser, Subcommand};
use promptmaster_preview::{
    check_structure, Dialect, MemorySurfaces, PreviewError, PreviewScheduler, RenderHost,
    RenderOutcome, SchedulerConfig, SourceDocument,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "promptmaster", version, about = "Live preview and Elementor prompt builder")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check HTML files for unbalanced tags
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Render a file once and write the preview document
    Render {
        file: PathBuf,
        #[arg(long)]
        dialect: Option<Dialect>,
        #[arg(long, conflicts_with = "light")]
        dark: bool,
        #[arg(long)]
        light: bool,
        /// Output path (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Serve a live preview that follows a file
    Watch {
        file: PathBuf,
        #[arg(long)]
        dialect: Option<Dialect>,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Build the Elementor conversion prompt for a file
    Prompt {
        file: PathBuf,
        #[arg(long)]
        dialect: Option<Dialect>,
        #[arg(long)]
        no_rtl: bool,
        #[arg(long)]
        no_grids: bool,
        #[arg(long)]
        no_svg: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Send the prompt to the configured AI endpoint
        #[arg(long)]
        send: bool,
    },
    /// Validate AI output and write the Elementor import files
    Convert {
        file: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long)]
        site_url: Option<String>,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// List AI chat portals
    Portals,
    /// Print a sample snippet
    Sample,
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    Set { key: String, value: String },
    Path,
}

pub async fn run(cli: Cli) -> AppResult<ExitCode> {
    match cli.command {
        Command::Check { files } => Ok(if check(&files) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        Command::Render {
            file,
            dialect,
            dark,
            light,
            out,
        } => {
            let settings = SettingsStore::load().settings();
            let is_dark = if dark {
                true
            } else if light {
                false
            } else {
                settings.dark_mode
            };
            render(&file, dialect, is_dark, out.as_deref()).await
        }
        Command::Watch {
            file,
            dialect,
            port,
        } => {
            let options = WatchOptions {
                path: file,
                dialect,
                port,
                config: SchedulerConfig::default(),
            };
            watch::run(options, SettingsStore::load()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Prompt {
            file,
            dialect,
            no_rtl,
            no_grids,
            no_svg,
            out,
            send,
        } => {
            let settings = SettingsStore::load().settings();
            let text = read_source(&file)?;
            let dialect = dialect.unwrap_or_else(|| detect_dialect(&file, &text));

            let mut config = settings.prompt;
            config.include_rtl &= !no_rtl;
            config.use_grids &= !no_grids;
            config.optimize_svgs &= !no_svg;

            let prompt = build_prompt(settings.template(), &text, dialect, &config)?;
            match &out {
                Some(path) => {
                    std::fs::write(path, &prompt)?;
                    println!("Prompt written to {}", path.display());
                }
                None if !send => println!("{prompt}"),
                None => {}
            }

            if send {
                let client = AiClient::new(&settings.ai)?;
                let reply = client.complete(&prompt).await?;
                println!("{reply}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Convert {
            file,
            out_dir,
            site_url,
        } => {
            let settings = SettingsStore::load().settings();
            let text = read_source(&file)?;
            let site_url = site_url.or(settings.site_url);
            let files =
                elementor::export(&text, &out_dir, site_url.as_deref(), &chrono::Local::now())?;
            println!("{}", files.raw.display());
            println!("{}", files.import.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Settings { action } => {
            let mut store = SettingsStore::load();
            match action {
                SettingsAction::Show => {
                    println!("# {}", store.path().display());
                    println!("{}", serde_json::to_string_pretty(&store.settings().masked())?);
                }
                SettingsAction::Set { key, value } => {
                    store.set(&key, &value)?;
                    println!("{key} updated");
                }
                SettingsAction::Path => println!("{}", store.path().display()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Portals => {
            for portal in PORTALS {
                println!("{}  {:<18} {}", portal.icon, portal.name, portal.url);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Sample => {
            println!("{SAMPLE_HTML}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One line per file. False if any file is unreadable or unbalanced.
pub fn check(files: &[PathBuf]) -> bool {
    let mut failed = false;
    for path in files {
        match read_source(path).and_then(|text| Ok(check_structure(&text)?)) {
            Ok(()) => println!("✓ {}", path.display()),
            Err(AppError::Preview(PreviewError::Structure {
                line,
                column,
                message,
            })) => {
                failed = true;
                println!("✗ {}:{}:{}: {}", path.display(), line, column, message);
            }
            Err(e) => {
                failed = true;
                println!("✗ {}: {}", path.display(), e);
            }
        }
    }
    !failed
}

/// One-shot settings: no debounce, no settle wait.
pub const ONE_SHOT: SchedulerConfig = SchedulerConfig {
    quiet_period: Duration::ZERO,
    settle_delay: Duration::ZERO,
};

/// Run `file` through the scheduler and an in-memory host once.
pub async fn render_file(
    path: &Path,
    dialect: Option<Dialect>,
    is_dark: bool,
) -> AppResult<RenderOutcome> {
    let text = read_source(path)?;
    let dialect = dialect.unwrap_or_else(|| detect_dialect(path, &text));

    let (host, _host_task) = RenderHost::spawn(MemorySurfaces::new());
    let scheduler = PreviewScheduler::spawn_with_theme(ONE_SHOT, host, is_dark);
    scheduler.submit(SourceDocument::new(text, dialect))?;
    let outcome = scheduler.settled().await;
    scheduler.shutdown().await;
    Ok(outcome)
}

async fn render(
    path: &Path,
    dialect: Option<Dialect>,
    is_dark: bool,
    out: Option<&Path>,
) -> AppResult<ExitCode> {
    match render_file(path, dialect, is_dark).await? {
        RenderOutcome::Rendered(document) => {
            match out {
                Some(out) => {
                    std::fs::write(out, document.as_str())?;
                    println!("Preview written to {}", out.display());
                }
                None => print!("{document}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        RenderOutcome::Failed(message) => {
            eprintln!("✗ {}: {}", path.display(), message);
            Ok(ExitCode::FAILURE)
        }
        RenderOutcome::Empty | RenderOutcome::Pending => Err(AppError::EmptySource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "promptmaster",
            "render",
            "a.jsx",
            "--dialect",
            "component",
            "--dark",
        ])
        .unwrap();
        match cli.command {
            Command::Render { dialect, dark, light, .. } => {
                assert_eq!(dialect, Some(Dialect::Component));
                assert!(dark);
                assert!(!light);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn dark_and_light_conflict() {
        let parsed = Cli::try_parse_from(["promptmaster", "render", "a.html", "--dark", "--light"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let parsed = Cli::try_parse_from(["promptmaster", "watch", "a.html", "--dialect", "vue"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn watch_defaults_to_port() {
        let cli = Cli::try_parse_from(["promptmaster", "-v", "watch", "a.html"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Watch { port: DEFAULT_PORT, .. }));
    }

    #[tokio::test]
    async fn render_file_reports_structural_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.html");
        std::fs::write(&path, "<div><span>x</div>").unwrap();

        let outcome = render_file(&path, None, false).await.unwrap();
        assert!(outcome.error().is_some());
    }

    #[tokio::test]
    async fn render_file_produces_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Card.jsx");
        std::fs::write(&path, "export default function Card() { return <p>x</p>; }").unwrap();

        let outcome = render_file(&path, None, true).await.unwrap();
        let document = outcome.document().expect("rendered");
        assert!(document.as_str().contains("typeof Card"));
    }

    #[test]
    fn check_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.html");
        let bad = dir.path().join("bad.html");
        std::fs::write(&good, "<p>ok</p>").unwrap();
        std::fs::write(&bad, "<div>").unwrap();

        assert!(check(&[good.clone()]));
        assert!(!check(&[good, bad]));
    }
}
