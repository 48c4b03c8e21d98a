use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use autoedit_core::{
    BRollStatus, EditSession, EditorConfig, GeminiClient, GeminiConfig, SimulatedClock, Studio,
    cache::{get_analysis_path, get_cache_dir, get_root_cache_dir, load_analysis, save_analysis, save_image},
    format::format_analysis_readable,
    intake::load_upload,
};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod preview;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "autoedit")]
#[command(about = "Caption a short video and generate AI B-roll stills for it")]
struct Cli {
    /// Video file to analyze
    video: PathBuf,

    /// Generate images for every pending B-roll segment
    #[arg(short, long)]
    generate_broll: bool,

    /// Play the result back on a simulated clock
    #[arg(short, long)]
    preview: bool,

    /// Preview playback rate
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Directory for generated images (defaults to <video>_broll)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Model used for transcription and B-roll suggestions
    #[arg(long)]
    analysis_model: Option<String>,

    /// Model used for B-roll images
    #[arg(long)]
    image_model: Option<String>,

    /// Print the final session as JSON instead of the readable summary
    #[arg(long)]
    json: bool,

    /// Force re-analysis even if a cached result exists
    #[arg(short, long)]
    force: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

fn default_out_dir(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    video.with_file_name(format!("{stem}_broll"))
}

async fn generate_b_roll(session: &EditSession<SimulatedClock>, out_dir: &Path) -> Result<()> {
    let step_start = Instant::now();
    let handles = session.generate_all();
    if handles.is_empty() {
        println!(
            "{} B-roll {}",
            style("✓").green().bold(),
            style("(nothing to generate)").dim()
        );
        return Ok(());
    }

    let pb = ProgressBar::new(handles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Generating B-roll [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    for handle in handles {
        handle.await?;
        pb.inc(1);
    }

    let b_roll = session.b_roll();
    let completed = b_roll.count_where(|s| matches!(s, BRollStatus::Completed { .. }));
    let failed = b_roll.count_where(|s| *s == BRollStatus::Failed);

    for segment in b_roll.iter() {
        if let Some(image_url) = segment.generated_image_url() {
            save_image(out_dir, &segment.id, image_url).await?;
        }
    }

    pb.finish_and_clear();
    println!(
        "{} B-roll generated: {} ok, {} failed {}",
        style("✓").green().bold(),
        style(completed).green(),
        if failed > 0 { style(failed).red() } else { style(failed).dim() },
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    );
    if completed > 0 {
        println!("  {} {}", style("Images:").dim(), style(out_dir.display()).cyan());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut gemini = GeminiConfig::default();
    if let Some(model) = cli.analysis_model {
        gemini.analysis_model = model;
    }
    if let Some(model) = cli.image_model {
        gemini.image_model = model;
    }
    let analysis_model = gemini.analysis_model.clone();

    // Validate API key early
    let client = match GeminiClient::from_env(gemini) {
        Ok(client) => Arc::new(client),
        Err(e) => fail(e),
    };

    let config = EditorConfig::default();
    let mut studio = Studio::new(client.clone(), client, config.clone());

    println!(
        "\n{}  {}\n",
        style("autoedit").cyan().bold(),
        style("AI Captions & B-roll").dim()
    );

    let total_start = Instant::now();

    // Step 1: Intake
    let upload = match load_upload(&cli.video, config.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => fail(e),
    };
    println!(
        "{} Loaded: {} {}",
        style("✓").green().bold(),
        style(cli.video.display()).dim(),
        style(format!("[{}, {:.1} MB]", upload.mime_type, upload.bytes.len() as f64 / 1_048_576.0)).dim()
    );

    println!("{}", style("─".repeat(60)).dim());

    // Step 2: Analyze (check cache)
    let step_start = Instant::now();
    let cache_dir = get_cache_dir(&get_root_cache_dir(), &upload.bytes);
    let analysis_path = get_analysis_path(&cache_dir, &analysis_model);
    tracing::info!(cache = %analysis_path.display(), "Using analysis cache");

    let cached = if !cli.force && analysis_path.exists() {
        load_analysis(&analysis_path).await.ok()
    } else {
        None
    };

    let mut session = match cached {
        Some(result) => {
            let duration = preview::media_length(&result);
            println!(
                "{} Analyzed: {} captions, {} B-roll {}",
                style("✓").green().bold(),
                result.captions.len(),
                result.b_roll.len(),
                style("(cached)").dim()
            );
            studio.resume(result, SimulatedClock::new(duration).with_rate(cli.speed))
        }
        None => {
            let spinner = create_spinner("Analyzing video content...");
            let speed = cli.speed;
            let session = match studio
                .open(&upload, |result| {
                    SimulatedClock::new(preview::media_length(result)).with_rate(speed)
                })
                .await
            {
                Ok(session) => session,
                Err(e) => {
                    spinner.finish_and_clear();
                    fail(format!(
                        "Failed to analyze video. Please try a shorter video or check your API key.\n  {e}"
                    ));
                }
            };
            save_analysis(&session.to_result(), &analysis_path).await?;
            spinner.finish_with_message(format!(
                "{} Analyzed: {} captions, {} B-roll {}",
                style("✓").green().bold(),
                session.captions().len(),
                session.b_roll().len(),
                style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
            ));
            session
        }
    };

    // Step 3: B-roll images
    if cli.generate_broll {
        let out_dir = cli.out.clone().unwrap_or_else(|| default_out_dir(&cli.video));
        generate_b_roll(&session, &out_dir).await?;
        save_analysis(&session.to_result(), &analysis_path).await?;
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&session.to_result())?);
    } else {
        println!("{}", format_analysis_readable(&session.to_result()));
    }

    // Step 4: Preview
    if cli.preview {
        preview::run(&mut session, config.tick_interval).await;
    }

    studio.close();
    Ok(())
}
