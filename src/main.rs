#![deny(unused)]
//! ShopSeeker - find where an item is sold from a photo of it.
//!
//! Terminal front end over the search session: a one-shot `find` command and
//! an interactive `shell`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use shopseeker_controller::{AppStatus, SearchController, SessionState};
use shopseeker_core::{config::AppConfig, AnalysisResult, Coordinate, EncodedImage};
use shopseeker_gateway::{ImageIngestor, LocationHandle};

#[derive(Parser)]
#[command(name = "shopseeker")]
#[command(version, about = "Identify an item from a photo and find shops nearby", long_about = None)]
struct Cli {
    /// Extra config file, applied after config/default and config/{SHOPSEEKER_ENV}
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Latitude to search around (use with --lng)
    #[arg(long, global = true, value_name = "DEG", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude to search around (use with --lat)
    #[arg(long, global = true, value_name = "DEG", allow_hyphen_values = true)]
    lng: Option<f64>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the item in an image and list nearby shops
    Find {
        /// Image file; when several are given only the first is used
        #[arg(value_name = "IMAGE", required = true, num_args = 1..)]
        images: Vec<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Give the location lookup up to this many milliseconds before searching
        #[arg(long, value_name = "MS", default_value_t = 0)]
        wait_location: u64,
    },

    /// Interactive session: open, find, reset, status, quit
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    shopseeker_governance::configure_tracing(&config.telemetry)?;

    tracing::info!("Starting ShopSeeker v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = if cli.metrics {
        Some(shopseeker_governance::setup_metrics_recorder()?)
    } else {
        None
    };

    let explicit = match (cli.lat, cli.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)?),
        (None, None) => None,
        _ => anyhow::bail!("--lat and --lng must be given together"),
    };

    // Resolution starts now; a search only reads what is known when it begins.
    let location = LocationHandle::start(&config.location, explicit)?;

    let analyzer = Arc::new(shopseeker_model_gateway::create_client_from_config(
        &config.analysis,
    )?);
    tracing::info!(model = %analyzer.model(), "Analysis client ready");

    let mut controller = SearchController::builder()
        .with_analyzer(analyzer)
        .with_location(location)
        .build()?;
    let ingestor = ImageIngestor::from_config(&config.ingest);

    let succeeded = match cli.command {
        Commands::Find {
            images,
            json,
            wait_location,
        } => run_find(&mut controller, &ingestor, &images, json, wait_location).await?,
        Commands::Shell => {
            run_shell(&mut controller, &ingestor).await?;
            true
        }
    };

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// =============================================================================
// find
// =============================================================================

/// One search from the command line. Returns whether it succeeded.
async fn run_find(
    controller: &mut SearchController,
    ingestor: &ImageIngestor,
    images: &[PathBuf],
    json: bool,
    wait_location: u64,
) -> anyhow::Result<bool> {
    let Some((first, rest)) = images.split_first() else {
        anyhow::bail!("no image given");
    };
    if !rest.is_empty() {
        tracing::warn!(ignored = rest.len(), "Only the first image is used");
    }

    let image = match ingestor.ingest_file(first).await {
        Ok(image) => image,
        Err(e) => {
            let message = format!("Could not read that image: {}", e.message());
            if json {
                let value = serde_json::json!({ "error": message });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                eprintln!("{}", message);
            }
            return Ok(false);
        }
    };
    record_ingest(&image);

    if wait_location > 0 {
        let wait = Duration::from_millis(wait_location);
        if tokio::time::timeout(wait, controller.location().resolved())
            .await
            .is_err()
        {
            tracing::info!(waited_ms = wait_location, "Searching before location resolved");
        }
    }

    controller.select_image(image);
    let state = controller.search().await;

    if json {
        print_json(state)?;
    } else {
        render(state);
    }

    Ok(state.status() == AppStatus::Success)
}

fn print_json(state: &SessionState) -> anyhow::Result<()> {
    let value = match state {
        SessionState::Success { result, .. } => serde_json::to_value(result)?,
        SessionState::Error { message, .. } => serde_json::json!({ "error": message }),
        other => serde_json::json!({ "status": other.status() }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn record_ingest(image: &EncodedImage) {
    // base64 is 4 chars per 3 bytes
    shopseeker_governance::track_ingest(image.media_type(), image.encoded_len() / 4 * 3);
}

// =============================================================================
// shell
// =============================================================================

const HELP: &str = "\
Commands:
  open <path>   choose an image
  find          find nearby shops for the chosen image
  reset         clear the image and result
  status        show the session and location status
  quit          leave";

async fn run_shell(
    controller: &mut SearchController,
    ingestor: &ImageIngestor,
) -> anyhow::Result<()> {
    println!("ShopSeeker AI - found something stunning? Find where it's sold.");
    println!("{}", location_label(controller.location()));
    println!("{}", HELP);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, arg) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => {}
            "open" if arg.is_empty() => println!("Usage: open <path>"),
            "open" => open_image(controller, ingestor, Path::new(arg)).await,
            "find" => match controller.status() {
                AppStatus::Idle if controller.state().image().is_none() => {
                    println!("Choose an image first: open <path>");
                }
                AppStatus::Idle => {
                    println!("Analyzing your discovery...");
                    render(controller.search().await);
                }
                _ => println!("Start a new search with `reset` or `open <path>`."),
            },
            "reset" => {
                controller.reset();
                println!("Ready for another image.");
            }
            "status" => {
                println!("Session: {}", controller.status());
                println!("{}", location_label(controller.location()));
            }
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => println!("Unknown command `{}`. Type `help`.", other),
        }
    }

    Ok(())
}

async fn open_image(controller: &mut SearchController, ingestor: &ImageIngestor, path: &Path) {
    match ingestor.ingest_file(path).await {
        Ok(image) => {
            record_ingest(&image);
            let media_type = image.media_type().to_string();
            controller.select_image(image);
            println!("Image attached ({}). Type `find` to search.", media_type);
        }
        Err(e) => println!("Could not read that image: {}", e.message()),
    }
}

// =============================================================================
// rendering
// =============================================================================

fn location_label(location: &LocationHandle) -> &'static str {
    if location.is_active() {
        "Location Active"
    } else {
        "Location Hidden"
    }
}

fn render(state: &SessionState) {
    match state {
        SessionState::Success { result, .. } => render_result(result),
        SessionState::Error { message, .. } => {
            println!("Search Failed");
            println!("{}", message);
            println!("Try another image (`reset`).");
        }
        SessionState::Idle { .. } | SessionState::Analyzing { .. } => {
            println!("Session: {}", state.status());
        }
    }
}

fn render_result(result: &AnalysisResult) {
    println!("AI Description");
    println!("{}", result.description);
    println!();
    println!("Nearby Shops ({} results found)", result.shops.len());

    if result.shops.is_empty() {
        println!("No specific stores found in our local database.");
        println!("Try zooming out your search or using a different angle.");
        return;
    }

    for (idx, shop) in result.shops.iter().enumerate() {
        println!("{}. {}", idx + 1, shop.title);
        if let Some(snippet) = &shop.snippet {
            println!("   \"{}\"", snippet);
        }
        println!("   {}", shop.uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopseeker_core::mocks::MockAnalyzer;

    fn controller_with(analyzer: Arc<MockAnalyzer>) -> SearchController {
        SearchController::builder()
            .with_analyzer(analyzer)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_find_unreadable_image_fails_without_calling_service() -> anyhow::Result<()> {
        let analyzer = Arc::new(MockAnalyzer::succeeding(AnalysisResult {
            description: "unused".into(),
            shops: vec![],
        }));
        let mut controller = controller_with(analyzer.clone());
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.jpg");

        let ingestor = ImageIngestor::default();

        for json in [false, true] {
            let images = [missing.clone()];
            assert!(!run_find(&mut controller, &ingestor, &images, json, 0).await?);
        }
        assert_eq!(analyzer.call_count(), 0);
        assert_eq!(controller.status(), AppStatus::Idle);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_reports_search_outcome() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("mug.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n-not-decoded-here")?;

        let ingestor = ImageIngestor::default();
        let images = [path];

        let down = shopseeker_core::Error::service_unavailable("down");
        let mut controller = controller_with(Arc::new(MockAnalyzer::failing(down)));
        assert!(!run_find(&mut controller, &ingestor, &images, false, 0).await?);

        let analyzer = Arc::new(MockAnalyzer::succeeding(AnalysisResult {
            description: "A mug".into(),
            shops: vec![],
        }));
        let mut controller = controller_with(analyzer.clone());
        assert!(run_find(&mut controller, &ingestor, &images, true, 0).await?);
        assert_eq!(analyzer.call_count(), 1);
        Ok(())
    }
}
