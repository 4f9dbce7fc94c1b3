use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use kalesma_app::credentials::{CredentialProvider, StaticCredentials};
use kalesma_app::encode::EncodedFile;
use kalesma_app::invitation::{EventCategory, EventDetails, Presentation, Slide};
use kalesma_app::services::{
    ExtractError, GenerationRequest, Orchestrator, RunEvent, SlideError, SlideGeneration, Stage,
    TextExtraction, VideoError, VideoGeneration,
};
use kalesma_app::services::orchestrator::RunError;

#[derive(Default)]
struct StubExtractor {
    response: String,
    calls: AtomicUsize,
}

#[async_trait]
impl TextExtraction for StubExtractor {
    async fn extract_text(&self, _file: &EncodedFile) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

struct StubSlides {
    calls: AtomicUsize,
    seen_messages: Mutex<Vec<String>>,
}

impl StubSlides {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen_messages: Mutex::new(Vec::new()),
        }
    }

    fn deck() -> Presentation {
        Presentation {
            slides: vec![
                Slide {
                    title: "A Celebration for X".to_string(),
                    content: vec!["You are invited".to_string()],
                },
                Slide {
                    title: "The Details".to_string(),
                    content: vec!["Date: soon".to_string()],
                },
            ],
        }
    }
}

#[async_trait]
impl SlideGeneration for StubSlides {
    async fn generate(&self, details: &EventDetails) -> Result<Presentation, SlideError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_messages
            .lock()
            .expect("seen messages lock poisoned")
            .push(details.message.clone());
        Ok(Self::deck())
    }
}

struct StubVideo {
    calls: AtomicUsize,
    outcome: Result<&'static str, fn() -> VideoError>,
}

impl StubVideo {
    fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Ok("https://files.example/v?alt=media&key=stub"),
        }
    }

    fn failing(make_error: fn() -> VideoError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Err(make_error),
        }
    }
}

#[async_trait]
impl VideoGeneration for StubVideo {
    async fn generate(&self, _prompt: &str, _seed: &EncodedFile) -> Result<String, VideoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Ok(url) => Ok(url.to_string()),
            Err(make_error) => Err(make_error()),
        }
    }
}

struct Fixture {
    extractor: Arc<StubExtractor>,
    slides: Arc<StubSlides>,
    video: Arc<StubVideo>,
    orchestrator: Orchestrator,
    _temp: TempDir,
    image: PathBuf,
    message_file: PathBuf,
}

fn fixture_with(
    extractor: StubExtractor,
    video: StubVideo,
    credentials: StaticCredentials,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
) -> Fixture {
    let temp = TempDir::new().expect("temp dir");
    let image = temp.path().join("visual.jpg");
    fs::write(&image, b"jpeg bytes").expect("write image fixture");
    let message_file = temp.path().join("message.png");
    fs::write(&message_file, b"png bytes").expect("write message fixture");

    let extractor = Arc::new(extractor);
    let slides = Arc::new(StubSlides::new());
    let video = Arc::new(video);

    let orchestrator = Orchestrator::builder()
        .extractor(Arc::clone(&extractor) as Arc<dyn TextExtraction>)
        .slides(Arc::clone(&slides) as Arc<dyn SlideGeneration>)
        .video(Arc::clone(&video) as Arc<dyn VideoGeneration>)
        .credentials(Arc::new(credentials) as Arc<dyn CredentialProvider>)
        .maybe_events(events)
        .build();

    Fixture {
        extractor,
        slides,
        video,
        orchestrator,
        _temp: temp,
        image,
        message_file,
    }
}

fn birthday_request(image: &PathBuf) -> GenerationRequest {
    GenerationRequest {
        details: EventDetails {
            category: EventCategory::Birthday,
            name: "X".to_string(),
            message: "typed message".to_string(),
            ..EventDetails::default()
        },
        message_file: None,
        visual_images: vec![image.clone()],
        skip_video: false,
    }
}

#[tokio::test]
async fn birthday_run_produces_presentation_and_video() {
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        None,
    );

    let request = birthday_request(&fx.image);
    let result = fx.orchestrator.run(request).await.expect("run succeeds");

    assert_eq!(fx.extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.slides.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fx.video.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        result.presentation.as_ref().map(|p| p.slide_count()),
        Some(2)
    );
    assert_eq!(
        result.video_url.as_deref(),
        Some("https://files.example/v?alt=media&key=stub")
    );
    assert_eq!(fx.orchestrator.stage(), Stage::Done);
}

#[tokio::test]
async fn run_emits_stage_transitions_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        Some(tx),
    );

    fx.orchestrator
        .run(birthday_request(&fx.image))
        .await
        .expect("run succeeds");

    let mut stages = Vec::new();
    while let Ok(RunEvent::StageChanged(stage)) = rx.try_recv() {
        stages.push(stage);
    }
    assert_eq!(
        stages,
        vec![
            Stage::PreparingAssets,
            Stage::GeneratingSlides,
            Stage::ConvertingImages,
            Stage::GeneratingVideo,
            Stage::Done,
        ]
    );
}

#[tokio::test]
async fn extracted_text_replaces_typed_message() {
    let mut fx = fixture_with(
        StubExtractor {
            response: "transcribed words".to_string(),
            calls: AtomicUsize::new(0),
        },
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        None,
    );

    let mut request = birthday_request(&fx.image);
    request.message_file = Some(fx.message_file.clone());
    fx.orchestrator.run(request).await.expect("run succeeds");

    assert_eq!(fx.extractor.calls.load(Ordering::SeqCst), 1);
    let seen = fx.slides.seen_messages.lock().expect("lock");
    assert_eq!(seen.as_slice(), ["transcribed words"]);
}

#[tokio::test]
async fn empty_extraction_falls_back_to_typed_message() {
    let mut fx = fixture_with(
        StubExtractor {
            response: "   \n".to_string(),
            calls: AtomicUsize::new(0),
        },
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        None,
    );

    let mut request = birthday_request(&fx.image);
    request.message_file = Some(fx.message_file.clone());
    fx.orchestrator.run(request).await.expect("run succeeds");

    assert_eq!(fx.extractor.calls.load(Ordering::SeqCst), 1);
    let seen = fx.slides.seen_messages.lock().expect("lock");
    assert_eq!(seen.as_slice(), ["typed message"]);
}

#[tokio::test]
async fn missing_credential_blocks_before_any_client_call() {
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::succeeding(),
        StaticCredentials::missing(),
        None,
    );

    let failure = fx
        .orchestrator
        .run(birthday_request(&fx.image))
        .await
        .expect_err("run must be blocked");

    assert!(matches!(failure.source, RunError::MissingApiKey));
    assert_eq!(failure.stage, Stage::Idle);
    assert_eq!(fx.extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.slides.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.video.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.orchestrator.stage(), Stage::Failed);
}

#[tokio::test]
async fn missing_images_block_before_any_client_call() {
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        None,
    );

    let mut request = birthday_request(&fx.image);
    request.visual_images.clear();
    let failure = fx
        .orchestrator
        .run(request)
        .await
        .expect_err("run must be blocked");

    assert!(matches!(failure.source, RunError::NoVisualImages));
    assert_eq!(fx.slides.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.video.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn video_failure_retains_the_generated_presentation() {
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::failing(|| VideoError::MissingVideo),
        StaticCredentials::new("key"),
        None,
    );

    let failure = fx
        .orchestrator
        .run(birthday_request(&fx.image))
        .await
        .expect_err("video stage must fail");

    assert_eq!(failure.stage, Stage::GeneratingVideo);
    assert!(matches!(
        failure.source,
        RunError::Video(VideoError::MissingVideo)
    ));
    assert_eq!(
        failure.partial.presentation.as_ref().map(|p| p.slide_count()),
        Some(2)
    );
    assert!(failure.partial.video_url.is_none());
    assert_eq!(fx.orchestrator.stage(), Stage::Failed);
}

#[tokio::test]
async fn skip_video_completes_without_calling_the_video_client() {
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        None,
    );

    let mut request = birthday_request(&fx.image);
    request.skip_video = true;
    let result = fx.orchestrator.run(request).await.expect("run succeeds");

    assert_eq!(fx.video.calls.load(Ordering::SeqCst), 0);
    assert!(result.presentation.is_some());
    assert!(result.video_url.is_none());
}

#[tokio::test]
async fn unreadable_message_file_fails_the_extraction_stage() {
    let mut fx = fixture_with(
        StubExtractor::default(),
        StubVideo::succeeding(),
        StaticCredentials::new("key"),
        None,
    );

    let mut request = birthday_request(&fx.image);
    request.message_file = Some(fx._temp.path().join("missing.png"));
    let failure = fx
        .orchestrator
        .run(request)
        .await
        .expect_err("encode must fail");

    assert_eq!(failure.stage, Stage::ExtractingText);
    assert!(matches!(failure.source, RunError::Encode(_)));
    assert_eq!(fx.slides.calls.load(Ordering::SeqCst), 0);
}
