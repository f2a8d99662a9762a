use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use innoguide_core::render;
use innoguide_core::{AnalysisResult, Config, Technique, UploadedImage};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::{App, NoticeKind};
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "innoguide")]
#[command(about = "Apply systematic innovation techniques to a problem with Gemini")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Prefill the problem statement
    #[arg(long, global = true)]
    problem: Option<String>,

    /// Attach an image (png, jpeg, webp)
    #[arg(long, global = true)]
    image: Option<PathBuf>,

    /// Model used for text techniques
    #[arg(long, global = true)]
    text_model: Option<String>,

    /// Model used for image variations
    #[arg(long, global = true)]
    image_model: Option<String>,

    /// Where downloaded images are written
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one technique and print the result
    Run {
        /// Technique id, e.g. five-whys or visual-prototyping
        technique: String,
        /// Directory for generated images (defaults to the download dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// List the available techniques
    Techniques,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal belongs to the UI, so logs go to a file
    init_logging();

    let (mut config, config_problem) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => {
            warn!("ignoring unreadable config: {:#}", err);
            (Config::default(), Some(format!("Config file ignored: {:#}", err)))
        }
    };
    if let Some(model) = &cli.text_model {
        config.text_model = Some(model.clone());
    }
    if let Some(model) = &cli.image_model {
        config.image_model = Some(model.clone());
    }
    if let Some(dir) = &cli.download_dir {
        config.download_dir = Some(dir.clone());
    }

    match cli.command {
        Some(Commands::Techniques) => {
            list_techniques();
            Ok(())
        }
        Some(Commands::Run { ref technique, ref out_dir }) => {
            if let Some(problem) = &config_problem {
                eprintln!("{}", problem);
            }
            run_once(&config, technique, cli.problem.as_deref(), cli.image.as_deref(), out_dir.clone()).await
        }
        None => run_tui(config, config_problem, cli.problem, cli.image).await,
    }
}

fn init_logging() {
    let Ok(dir) = Config::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("innoguide.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_env("INNOGUIDE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn list_techniques() {
    for technique in Technique::all() {
        let def = technique.definition();
        println!("{} {:<28} {}", def.icon.glyph(), technique.as_str(), def.description);
    }
}

async fn run_once(
    config: &Config,
    technique: &str,
    problem: Option<&str>,
    image: Option<&std::path::Path>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let technique = Technique::from_str(technique)
        .ok_or_else(|| anyhow!("Unknown technique '{}'. Try `innoguide techniques`.", technique))?;
    let analyzer = App::analyzer_from_config(config)
        .ok_or_else(|| anyhow!("No Gemini API key. Set GEMINI_API_KEY or save one from the UI."))?;

    let image = match image {
        Some(path) => Some(UploadedImage::from_path(path).await?),
        None => None,
    };

    info!(technique = technique.as_str(), "running single analysis");
    let result = analyzer
        .run_analysis(problem.unwrap_or(""), technique, image.as_ref())
        .await?;

    match result {
        AnalysisResult::Text(text) => println!("{}", text),
        AnalysisResult::Images(images) => {
            let dir = out_dir.unwrap_or_else(|| config.download_dir());
            let paths = render::save_all(&dir, &images, render::now_millis())
                .with_context(|| format!("Failed to save images to {}", dir.display()))?;
            for path in paths {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

async fn run_tui(
    config: Config,
    config_problem: Option<String>,
    problem: Option<String>,
    image: Option<PathBuf>,
) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let analyzer = App::analyzer_from_config(&config);
    let mut app = App::new(analyzer, config, events.sender());
    if let Some(text) = config_problem {
        app.notify(NoticeKind::Warning, text);
    }

    if let Some(problem) = problem {
        app.problem_cursor = problem.chars().count();
        app.input.set_problem_text(problem);
    }
    if let Some(path) = image {
        app.attach_image(&path).await;
    }

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
