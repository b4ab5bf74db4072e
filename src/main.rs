use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use scene_forge_lib::modules::generation::domain::{Backdrop, CreativeMode};
use scene_forge_lib::modules::generation::prompts::catalog::MAX_SEED;
use scene_forge_lib::modules::media::{export_named, import_files, DEFAULT_EXPORT_DELAY};
use scene_forge_lib::modules::story::StoryOptions;
use scene_forge_lib::modules::studio::BatchRequest;
use scene_forge_lib::shared::utils::init_logger;
use scene_forge_lib::{AppConfig, StudioService};

#[derive(Parser, Debug)]
#[command(name = "scene-forge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose every product onto the character in generated scenes.
    Generate(GenerateArgs),
    /// Remove the background of every product.
    RemoveBg(RemoveBgArgs),
    /// Break a story into scenes and render start and end frames.
    Story(StoryArgs),
    /// Show or change the saved API settings.
    Settings(SettingsArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Fashion,
    Custom,
}

impl From<ModeArg> for CreativeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fashion => CreativeMode::Fashion,
            ModeArg::Custom => CreativeMode::Custom,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackdropArg {
    Transparent,
    White,
    Black,
    Gray,
}

impl From<BackdropArg> for Backdrop {
    fn from(backdrop: BackdropArg) -> Self {
        match backdrop {
            BackdropArg::Transparent => Backdrop::Transparent,
            BackdropArg::White => Backdrop::White,
            BackdropArg::Black => Backdrop::Black,
            BackdropArg::Gray => Backdrop::Gray,
        }
    }
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Character image whose face and hair are kept.
    #[arg(long)]
    character: PathBuf,

    /// Product images.
    #[arg(required = true)]
    products: Vec<PathBuf>,

    /// Optional background reference image.
    #[arg(long)]
    background: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Fashion)]
    mode: ModeArg,

    /// Variants per product.
    #[arg(long, default_value_t = 1)]
    variants: usize,

    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=MAX_SEED))]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = BackdropArg::Transparent)]
    backdrop: BackdropArg,

    /// Output directory; results are written here even when auto-download is off.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RemoveBgArgs {
    #[arg(required = true)]
    products: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Fashion)]
    mode: ModeArg,

    #[arg(long, value_enum, default_value_t = BackdropArg::Transparent)]
    backdrop: BackdropArg,

    #[arg(long, default_value = "output")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct StoryArgs {
    /// Text file with the story.
    story: PathBuf,

    /// Generate every frame from text alone.
    #[arg(long, default_value_t = false)]
    no_consistency: bool,

    /// Output directory; frames are written here even when auto-download is off.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SettingsArgs {
    /// Replace the saved API keys (comma separated).
    #[arg(long, value_delimiter = ',')]
    keys: Option<Vec<String>>,

    /// Use the keys from GEMINI_API_KEYS instead of the saved ones.
    #[arg(long)]
    use_default_keys: Option<bool>,

    /// Concurrent requests per key during batch runs.
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();
    let studio = Arc::new(StudioService::from_config(AppConfig::from_env())?);

    let interrupt = studio.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.stop();
        }
    });

    match cli.cmd {
        Command::Generate(args) => cmd_generate(&studio, args).await,
        Command::RemoveBg(args) => cmd_remove_bg(&studio, args).await,
        Command::Story(args) => cmd_story(&studio, args).await,
        Command::Settings(args) => cmd_settings(&studio, args).await,
    }
}

async fn load_products(studio: &StudioService, paths: &[PathBuf]) -> anyhow::Result<()> {
    let report = import_files(paths).await;
    for failure in &report.failures {
        eprintln!("skipped {}: {}", failure.path.display(), failure.message);
    }
    anyhow::ensure!(!report.images.is_empty(), "no product image could be read");
    studio.add_products(report.images).await;
    Ok(())
}

async fn cmd_generate(studio: &StudioService, args: GenerateArgs) -> anyhow::Result<()> {
    let character = scene_forge_lib::modules::media::import::import_file(&args.character)
        .await
        .with_context(|| format!("read character '{}'", args.character.display()))?;
    let background = match &args.background {
        Some(path) => Some(
            scene_forge_lib::modules::media::import::import_file(path)
                .await
                .with_context(|| format!("read background '{}'", path.display()))?,
        ),
        None => None,
    };
    load_products(studio, &args.products).await?;

    let report = studio
        .generate_batch(BatchRequest {
            mode: args.mode.into(),
            character_image: character,
            background_image: background,
            variants: args.variants,
            seed: args.seed,
            backdrop: args.backdrop.into(),
        })
        .await?;

    let progress = report.outcome.progress;
    eprintln!(
        "{} of {} images generated, {} failed{}",
        progress.succeeded(),
        progress.total,
        progress.errors,
        if report.outcome.stopped { " (stopped)" } else { "" }
    );

    let written = studio
        .export_results(&report.images, args.out.as_deref(), report.outcome.stopped)
        .await?;
    eprintln!("wrote {} files", written.len());
    Ok(())
}

async fn cmd_remove_bg(studio: &StudioService, args: RemoveBgArgs) -> anyhow::Result<()> {
    load_products(studio, &args.products).await?;
    let outcome = studio
        .remove_backgrounds(args.mode.into(), args.backdrop.into())
        .await?;
    eprintln!(
        "{} of {} backgrounds removed",
        outcome.progress.succeeded(),
        outcome.progress.total
    );

    let files: Vec<_> = studio
        .products()
        .list()
        .await
        .into_iter()
        .filter_map(|product| {
            product
                .transparent
                .map(|image| (format!("transparent-{}", product.id), image))
        })
        .collect();
    let written = export_named(&files, &args.out, DEFAULT_EXPORT_DELAY).await?;
    eprintln!("wrote {} files to {}", written.len(), args.out.display());
    Ok(())
}

async fn cmd_story(studio: &StudioService, args: StoryArgs) -> anyhow::Result<()> {
    let story = tokio::fs::read_to_string(&args.story)
        .await
        .with_context(|| format!("read story '{}'", args.story.display()))?;
    let scenes = studio.advisory().analyze_story(&story).await?;
    eprintln!("story split into {} scenes", scenes.len());

    let preferences = studio.preferences().await;
    let outcome = studio
        .generate_story(
            &scenes,
            StoryOptions {
                keep_character_consistent: !args.no_consistency,
                aspect_ratio: preferences.fashion_aspect_ratio,
                auto_save: preferences.auto_save_to_gallery,
            },
        )
        .await?;
    if let Some(scene) = outcome.failed_scene {
        eprintln!("stopped at scene {} after an error", scene);
    }

    let written = studio
        .export_results(&outcome.frames, args.out.as_deref(), outcome.stopped)
        .await?;
    eprintln!("wrote {} frames", written.len());
    Ok(())
}

async fn cmd_settings(studio: &StudioService, args: SettingsArgs) -> anyhow::Result<()> {
    let current = studio.preferences().await;
    if args.keys.is_some() || args.use_default_keys.is_some() || args.concurrency.is_some() {
        studio
            .save_api_settings(
                args.keys.unwrap_or(current.api_keys),
                args.use_default_keys.unwrap_or(current.use_default_api_key),
                args.concurrency.unwrap_or(current.max_concurrency),
            )
            .await?;
    }

    let preferences = studio.preferences().await;
    println!("saved keys:        {}", preferences.api_keys.len());
    println!("use default keys:  {}", preferences.use_default_api_key);
    println!("active keys:       {}", studio.credentials().len());
    println!("concurrency:       {}", preferences.max_concurrency);
    println!("rate-limit pause:  {}s", preferences.rate_limit_cooldown_secs);
    Ok(())
}
