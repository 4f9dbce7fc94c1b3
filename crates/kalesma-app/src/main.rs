use std::path::Path;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use kalesma_app::cli::{AuthArgs, Cli, Commands, GenerateArgs};
use kalesma_app::config;
use kalesma_app::credentials::{
    CredentialChain, CredentialProvider, StaticCredentials, StoredCredentials,
};
use kalesma_app::error::AppError;
use kalesma_app::export::export_presentation;
use kalesma_app::gemini::GeminiClient;
use kalesma_app::invitation::{EventCategory, EventDetails, RunResult};
use kalesma_app::services::{
    GeminiExtractor, GeminiSlideGenerator, GeminiVideoBackend, GenerationRequest, Orchestrator,
    RunEvent, SlideGeneration, TextExtraction, VideoBackend, VideoGeneration, VideoGenerator,
};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{filter::LevelFilter, fmt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_level = determine_log_level(&cli);
    init_tracing(log_level);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt().with_max_level(level).with_target(false).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

fn determine_log_level(cli: &Cli) -> LevelFilter {
    match cli.verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let verbosity = cli.verbose;

    match cli.command {
        Some(Commands::Generate(args)) => run_generate(args, verbosity).await,
        Some(Commands::Auth(args)) => run_auth(args),
        None => {
            Cli::print_help();
            Ok(())
        }
    }
}

async fn run_generate(args: GenerateArgs, verbosity: u8) -> Result<(), AppError> {
    let cfg = config::load()?;
    let category = EventCategory::from_str(&args.category)?;

    // A missing credential disables submission before anything else happens.
    let chain = CredentialChain::default_chain()?;
    let Some(api_key) = chain.api_key()? else {
        eprintln!(
            "Configuration needed: no Gemini API key found. Run `kalesma auth` to save one, \
or set GEMINI_API_KEY in the environment."
        );
        return Err(AppError::MissingApiKey);
    };

    let client = Arc::new(
        GeminiClient::builder()
            .base_url(cfg.api.base_url.clone())
            .api_key(api_key.clone())
            .build(),
    );
    let extractor: Arc<dyn TextExtraction> = Arc::new(GeminiExtractor::new(
        Arc::clone(&client),
        cfg.api.content_model.clone(),
    ));
    let slides: Arc<dyn SlideGeneration> = Arc::new(GeminiSlideGenerator::new(
        Arc::clone(&client),
        cfg.api.content_model.clone(),
    ));
    let backend: Arc<dyn VideoBackend> = Arc::new(GeminiVideoBackend::new(
        Arc::clone(&client),
        cfg.api.video_model.clone(),
    ));

    // ctrl-c flips the cancel flag so the video poll loop can stop cleanly.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let video: Arc<dyn VideoGeneration> = Arc::new(
        VideoGenerator::builder()
            .backend(backend)
            .poll_interval(Duration::from_secs(cfg.video.poll_interval_secs))
            .timeout(Duration::from_secs(cfg.video.timeout_secs))
            .cancel(cancel_rx)
            .build(),
    );

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let progress = (verbosity == 0).then(make_progress_bar);
    if let Some(pb) = progress.clone() {
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let RunEvent::StageChanged(stage) = event;
                pb.set_message(stage.loading_message());
            }
        });
    }

    let mut orchestrator = Orchestrator::builder()
        .extractor(extractor)
        .slides(slides)
        .video(video)
        .credentials(Arc::new(StaticCredentials::new(api_key)) as Arc<dyn CredentialProvider>)
        .events(event_tx)
        .build();

    let details = EventDetails {
        category,
        name: args.event_name,
        recipient: args.recipient,
        designation: args.designation,
        message: args.message,
        date: args.date,
        time: args.time,
        venue: args.venue,
        host: args.host,
    };
    let request = GenerationRequest {
        details,
        message_file: args.message_file,
        visual_images: args.images,
        skip_video: args.skip_video,
    };

    let outcome = orchestrator.run(request).await;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    match outcome {
        Ok(result) => {
            report(&result, args.out.as_deref())?;
            Ok(())
        }
        Err(failure) => {
            // Outputs produced before the failing stage are still shown.
            if failure.partial.presentation.is_some() {
                report(&failure.partial, args.out.as_deref())?;
            }
            Err(AppError::Run {
                stage: failure.stage,
                source: failure.source,
            })
        }
    }
}

fn report(result: &RunResult, out: Option<&Path>) -> Result<(), AppError> {
    if let Some(presentation) = &result.presentation {
        println!("presentation: {} slide(s)", presentation.slide_count());
        for (index, slide) in presentation.slides.iter().enumerate() {
            println!("  {}. {}", index + 1, slide.title);
        }
        if let Some(dir) = out {
            let path = export_presentation(dir, presentation)?;
            println!("saved presentation to {}", path.display());
        }
    }
    if let Some(url) = &result.video_url {
        println!("video: {url}");
    }
    Ok(())
}

fn run_auth(_args: AuthArgs) -> Result<(), AppError> {
    let store = StoredCredentials::from_project_dirs()?;
    let key = inquire::Password::new("Gemini API key:")
        .without_confirmation()
        .prompt()
        .map_err(|source| AppError::Prompt { source })?;
    store.save(key.trim())?;
    println!("API key saved to {}", store.path().display());
    Ok(())
}

fn make_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
