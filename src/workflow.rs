use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{DubError, Result};
use crate::language::LanguageEntry;
use crate::lipsync::{LipSyncer, LipSyncerFactory};
use crate::media::{check_duration, MediaProcessorFactory, MediaProcessorTrait};
use crate::run::{cleanup_files, RunArtifacts, RunId};
use crate::synthesize::{Synthesizer, SynthesizerFactory};
use crate::transcribe::{TranscriberFactory, TranscriberTrait, VIDEO_EXTENSIONS};
use crate::translate::{Translator, TranslatorFactory};

/// Status text shown when lip-sync fails and the plain remux is used instead
pub const LIPSYNC_FALLBACK_WARNING: &str =
    "Lip-sync encountered an error. Falling back to simple audio replacement.";

/// One dubbing request as submitted by the UI or CLI
#[derive(Debug, Clone)]
pub struct DubRequest {
    pub video: PathBuf,
    pub target_language: Option<String>,
    pub lip_sync: bool,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct DubOutcome {
    pub run_id: RunId,
    pub output_video: PathBuf,
    /// Non-fatal problems the user should see
    pub warnings: Vec<String>,
}

/// What the UI renders: a video or nothing, plus status text
#[derive(Debug, Clone, PartialEq)]
pub struct DubResponse {
    pub video: Option<PathBuf>,
    pub message: String,
}

pub struct Workflow {
    config: Arc<Config>,
    media: Arc<dyn MediaProcessorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    translator: Box<dyn Translator>,
    synthesizer: Box<dyn Synthesizer>,
    lipsync: Box<dyn LipSyncer>,
}

impl Workflow {
    pub fn new(
        config: Arc<Config>,
        media: Arc<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        translator: Box<dyn Translator>,
        synthesizer: Box<dyn Synthesizer>,
        lipsync: Box<dyn LipSyncer>,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
            translator,
            synthesizer,
            lipsync,
        }
    }

    /// Wire the real external tools described by the configuration
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let media: Arc<dyn MediaProcessorTrait> =
            Arc::from(MediaProcessorFactory::create_processor(config.media.clone()));
        let transcriber = TranscriberFactory::create_default(
            config.transcriber.clone(),
            config.media.work_dir.clone(),
            config.hf_token.clone(),
            media.clone(),
        );
        let translator = TranslatorFactory::create_translator(config.translate.clone())?;
        let synthesizer = SynthesizerFactory::create_synthesizer(config.synthesizer.clone());
        let lipsync = LipSyncerFactory::create_lipsyncer(config.lipsync.clone());

        Ok(Self::new(config, media, transcriber, translator, synthesizer, lipsync))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the media tools can be started
    pub async fn check_dependencies(&self) -> Result<()> {
        self.media.check_availability().await
    }

    /// Run the whole pipeline for one request.
    /// On failure no artifact of the run is left behind.
    pub async fn process(&self, request: &DubRequest) -> Result<DubOutcome> {
        let target_language = validate_request(request)?;
        let language = self.config.languages.lookup(target_language)?;

        let run_id = RunId::generate();
        let artifacts = RunArtifacts::new(&self.config.media.work_dir, &run_id);
        info!(
            "Run {}: dubbing {} into {} (lip-sync: {})",
            run_id,
            request.video.display(),
            language.name,
            request.lip_sync
        );

        let mut warnings = Vec::new();
        match self.run_stages(request, language, &artifacts, &mut warnings).await {
            Ok(()) => {
                cleanup_files(&artifacts.intermediates()).await;
                info!("Run {} completed: {}", run_id, artifacts.output_video.display());

                Ok(DubOutcome {
                    run_id,
                    output_video: artifacts.output_video,
                    warnings,
                })
            }
            Err(e) => {
                cleanup_files(&artifacts.intermediates()).await;
                cleanup_files(&[&artifacts.output_video]).await;
                Err(e)
            }
        }
    }

    /// Run the pipeline and fold any failure into a user-facing message
    pub async fn handle(&self, request: &DubRequest) -> DubResponse {
        match self.process(request).await {
            Ok(outcome) => DubResponse {
                video: Some(outcome.output_video),
                message: outcome.warnings.join("\n"),
            },
            Err(e) => {
                error!("Error in dubbing request: {}", e);
                DubResponse {
                    video: None,
                    message: format!("Error: {}", e),
                }
            }
        }
    }

    /// Dub every video found under a directory; failures are logged and skipped
    pub async fn process_directory<P: AsRef<Path>>(
        &self,
        input_dir: P,
        target_language: &str,
        lip_sync: bool,
    ) -> Result<Vec<DubOutcome>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(DubError::Config(format!(
                "{} is not a directory",
                input_dir.display()
            )));
        }

        let mut video_files = Vec::new();
        for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
            if let Some(ext) = entry.path().extension().and_then(|ext| ext.to_str()) {
                if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    video_files.push(entry.path().to_path_buf());
                }
            }
        }
        video_files.sort();

        info!("Found {} video files to process", video_files.len());

        let mut outcomes = Vec::new();
        for video in video_files {
            let request = DubRequest {
                video: video.clone(),
                target_language: Some(target_language.to_string()),
                lip_sync,
            };

            match self.process(&request).await {
                Ok(outcome) => {
                    info!("Successfully processed: {}", video.display());
                    outcomes.push(outcome);
                }
                Err(e) => warn!("Failed to process {}: {}", video.display(), e),
            }
        }

        Ok(outcomes)
    }

    async fn run_stages(
        &self,
        request: &DubRequest,
        language: &LanguageEntry,
        artifacts: &RunArtifacts,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        self.normalize(&request.video, &artifacts.resized_video).await?;

        self.media
            .extract_audio(&artifacts.resized_video, &artifacts.extracted_audio)
            .await?;
        self.media
            .filter_audio(&artifacts.extracted_audio, &artifacts.filtered_audio)
            .await?;

        let transcript = self.transcriber.transcribe(&artifacts.filtered_audio).await?;
        let source_text = transcript.full_text();
        info!("Transcription successful: {}", source_text);

        let translated = self.translator.translate(&source_text, &language.code).await?;
        info!("Translated text: {}", translated);

        self.synthesizer
            .synthesize(&translated, &language.voice, &artifacts.synth_audio)
            .await?;

        self.mux(request.lip_sync, artifacts, warnings).await
    }

    /// Resize, then enforce the duration ceiling on the resized file
    async fn normalize(&self, input: &Path, resized: &Path) -> Result<f64> {
        let media_config = &self.config.media;
        self.media.resize_video(input, resized, media_config.max_height).await?;

        if !resized.exists() {
            return Err(DubError::FileNotFound(format!("{} does not exist", resized.display())));
        }

        let duration = self.media.probe_duration(resized).await?;
        if let Err(e) = check_duration(duration, media_config.max_duration_secs) {
            cleanup_files(&[resized]).await;
            return Err(e);
        }

        Ok(duration)
    }

    async fn mux(&self, lip_sync: bool, artifacts: &RunArtifacts, warnings: &mut Vec<String>) -> Result<()> {
        let remux = || {
            self.media.replace_audio(
                &artifacts.resized_video,
                &artifacts.synth_audio,
                &artifacts.output_video,
            )
        };

        if lip_sync {
            match self
                .lipsync
                .resynthesize(&artifacts.resized_video, &artifacts.synth_audio, &artifacts.output_video)
                .await
            {
                Ok(()) => {}
                Err(e @ DubError::Process { .. }) => {
                    warn!("Wav2Lip error: {}", e);
                    warnings.push(LIPSYNC_FALLBACK_WARNING.to_string());
                    remux().await?;
                }
                Err(e) => return Err(e),
            }
        } else {
            remux().await?;
        }

        if !artifacts.output_video.exists() {
            return Err(DubError::FileNotFound(format!(
                "{} was not generated",
                artifacts.output_video.display()
            )));
        }

        Ok(())
    }
}

/// The target language must be chosen before any work starts
pub fn validate_request(request: &DubRequest) -> Result<&str> {
    match request.target_language.as_deref().map(str::trim) {
        Some(language) if !language.is_empty() => Ok(language),
        _ => Err(DubError::Validation(
            "Please select a Target Language for Dubbing.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lipsync::MockLipSyncer;
    use crate::media::MockMediaProcessorTrait;
    use crate::synthesize::MockSynthesizer;
    use crate::transcribe::{MockTranscriberTrait, Transcript, TranscriptChunk};
    use crate::translate::MockTranslator;
    use tempfile::TempDir;

    fn touch(path: &Path) -> Result<()> {
        std::fs::write(path, b"data")?;
        Ok(())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn config_for(work_dir: &TempDir) -> Arc<Config> {
        let mut config = Config::default();
        config.media.work_dir = work_dir.path().to_path_buf();
        Arc::new(config)
    }

    /// Media tool that produces every file it is asked for
    fn media_mock(duration: f64, remux_calls: usize) -> MockMediaProcessorTrait {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_resize_video().returning(|_, output, height| {
            assert_eq!(height, 720);
            touch(output)
        });
        media.expect_probe_duration().returning(move |_| Ok(duration));
        media.expect_extract_audio().returning(|_, output| touch(output));
        media.expect_filter_audio().returning(|_, output| touch(output));
        media
            .expect_replace_audio()
            .times(remux_calls)
            .returning(|_, _, output| touch(output));
        media
    }

    fn transcriber_mock() -> MockTranscriberTrait {
        let mut transcriber = MockTranscriberTrait::new();
        transcriber.expect_transcribe().returning(|path| {
            assert!(path.to_string_lossy().ends_with("_output_audio_final.wav"));
            Ok(Transcript {
                text: None,
                chunks: vec![
                    TranscriptChunk { text: "Hello".to_string(), timestamp: None },
                    TranscriptChunk { text: "world".to_string(), timestamp: None },
                ],
            })
        });
        transcriber
    }

    fn translator_mock() -> MockTranslator {
        let mut translator = MockTranslator::new();
        translator.expect_translate().returning(|text, code| {
            assert_eq!(text, "Hello world");
            assert_eq!(code, "fr");
            Ok("Bonjour le monde".to_string())
        });
        translator
    }

    fn synthesizer_mock() -> MockSynthesizer {
        let mut synthesizer = MockSynthesizer::new();
        synthesizer.expect_synthesize().returning(|text, voice, output| {
            assert_eq!(text, "Bonjour le monde");
            assert_eq!(voice, "fr-FR-HenriNeural");
            touch(output)
        });
        synthesizer
    }

    fn workflow(
        work_dir: &TempDir,
        media: MockMediaProcessorTrait,
        transcriber: MockTranscriberTrait,
        lipsync: MockLipSyncer,
    ) -> Workflow {
        Workflow::new(
            config_for(work_dir),
            Arc::new(media),
            Box::new(transcriber),
            Box::new(translator_mock()),
            Box::new(synthesizer_mock()),
            Box::new(lipsync),
        )
    }

    fn french_request(lip_sync: bool) -> DubRequest {
        DubRequest {
            video: PathBuf::from("/uploads/talk.mp4"),
            target_language: Some("French".to_string()),
            lip_sync,
        }
    }

    #[tokio::test]
    async fn test_dub_without_lipsync_leaves_only_output() {
        let work_dir = TempDir::new().unwrap();
        let subject = workflow(&work_dir, media_mock(10.0, 1), transcriber_mock(), MockLipSyncer::new());

        let outcome = subject.process(&french_request(false)).await.unwrap();

        let expected_name = format!("{}_output_video.mp4", outcome.run_id);
        assert_eq!(outcome.output_video, work_dir.path().join(&expected_name));
        assert!(outcome.warnings.is_empty());
        assert_eq!(files_in(work_dir.path()), vec![expected_name]);
    }

    #[tokio::test]
    async fn test_duration_at_ceiling_is_accepted() {
        let work_dir = TempDir::new().unwrap();
        let subject = workflow(&work_dir, media_mock(60.0, 1), transcriber_mock(), MockLipSyncer::new());

        assert!(subject.process(&french_request(false)).await.is_ok());
    }

    #[tokio::test]
    async fn test_too_long_video_fails_without_leftovers() {
        let work_dir = TempDir::new().unwrap();
        let subject = workflow(
            &work_dir,
            media_mock(90.0, 0),
            MockTranscriberTrait::new(),
            MockLipSyncer::new(),
        );

        let result = subject.process(&french_request(false)).await;
        assert!(matches!(result, Err(DubError::DurationExceeded { .. })));
        assert!(files_in(work_dir.path()).is_empty());

        let response = subject.handle(&french_request(false)).await;
        assert_eq!(response.video, None);
        assert_eq!(
            response.message,
            "Error: Video duration exceeds 60 seconds. Please upload a shorter video."
        );
        assert!(files_in(work_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_lipsync_failure_falls_back_to_remux() {
        let work_dir = TempDir::new().unwrap();
        let mut lipsync = MockLipSyncer::new();
        lipsync.expect_resynthesize().times(1).returning(|_, _, _| {
            Err(DubError::Process {
                tool: "python".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Face not detected!".to_string(),
            })
        });
        let subject = workflow(&work_dir, media_mock(10.0, 1), transcriber_mock(), lipsync);

        let outcome = subject.process(&french_request(true)).await.unwrap();
        assert!(outcome.output_video.exists());
        assert_eq!(outcome.warnings, vec![LIPSYNC_FALLBACK_WARNING.to_string()]);
    }

    #[tokio::test]
    async fn test_lipsync_fallback_warning_reaches_status_text() {
        let work_dir = TempDir::new().unwrap();
        let mut lipsync = MockLipSyncer::new();
        lipsync.expect_resynthesize().returning(|_, _, _| {
            Err(DubError::Process {
                tool: "python".to_string(),
                status: "exit status: 1".to_string(),
                stderr: String::new(),
            })
        });
        let subject = workflow(&work_dir, media_mock(10.0, 1), transcriber_mock(), lipsync);

        let response = subject.handle(&french_request(true)).await;
        assert!(response.video.is_some());
        assert_eq!(response.message, LIPSYNC_FALLBACK_WARNING);
    }

    #[tokio::test]
    async fn test_lipsync_success_skips_remux() {
        let work_dir = TempDir::new().unwrap();
        let mut lipsync = MockLipSyncer::new();
        lipsync.expect_resynthesize().times(1).returning(|face, audio, output| {
            assert!(face.to_string_lossy().ends_with("_resized_video.mp4"));
            assert!(audio.to_string_lossy().ends_with("_output_synth.wav"));
            touch(output)
        });
        let subject = workflow(&work_dir, media_mock(10.0, 0), transcriber_mock(), lipsync);

        let outcome = subject.process(&french_request(true)).await.unwrap();
        assert!(outcome.warnings.is_empty());
        assert_eq!(files_in(work_dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_lipsync_spawn_failure_is_fatal() {
        let work_dir = TempDir::new().unwrap();
        let mut lipsync = MockLipSyncer::new();
        lipsync.expect_resynthesize().returning(|_, _, _| {
            Err(DubError::Spawn {
                tool: "python".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        });
        let subject = workflow(&work_dir, media_mock(10.0, 0), transcriber_mock(), lipsync);

        assert!(matches!(
            subject.process(&french_request(true)).await,
            Err(DubError::Spawn { .. })
        ));
        assert!(files_in(work_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_target_language_is_rejected_before_any_work() {
        let work_dir = TempDir::new().unwrap();
        let subject = workflow(
            &work_dir,
            MockMediaProcessorTrait::new(),
            MockTranscriberTrait::new(),
            MockLipSyncer::new(),
        );

        let mut request = french_request(false);
        request.target_language = None;

        let response = subject.handle(&request).await;
        assert_eq!(response.video, None);
        assert_eq!(response.message, "Error: Please select a Target Language for Dubbing.");
    }

    #[tokio::test]
    async fn test_unsupported_language_is_rejected_before_any_work() {
        let work_dir = TempDir::new().unwrap();
        let subject = workflow(
            &work_dir,
            MockMediaProcessorTrait::new(),
            MockTranscriberTrait::new(),
            MockLipSyncer::new(),
        );

        let mut request = french_request(false);
        request.target_language = Some("Klingon".to_string());

        assert!(matches!(
            subject.process(&request).await,
            Err(DubError::UnsupportedLanguage(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_resized_video_is_not_found() {
        let work_dir = TempDir::new().unwrap();
        let mut media = MockMediaProcessorTrait::new();
        media.expect_resize_video().returning(|_, _, _| Ok(()));
        let subject = workflow(&work_dir, media, MockTranscriberTrait::new(), MockLipSyncer::new());

        assert!(matches!(
            subject.process(&french_request(false)).await,
            Err(DubError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_transcription_failure_removes_intermediates() {
        let work_dir = TempDir::new().unwrap();
        let mut media = MockMediaProcessorTrait::new();
        media.expect_resize_video().returning(|_, output, _| touch(output));
        media.expect_probe_duration().returning(|_| Ok(10.0));
        media.expect_extract_audio().returning(|_, output| touch(output));
        media.expect_filter_audio().returning(|_, output| touch(output));

        let mut transcriber = MockTranscriberTrait::new();
        transcriber.expect_transcribe().returning(|_| {
            Err(DubError::Process {
                tool: "insanely-fast-whisper".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "CUDA out of memory".to_string(),
            })
        });
        let subject = workflow(&work_dir, media, transcriber, MockLipSyncer::new());

        let response = subject.handle(&french_request(false)).await;
        assert!(response.video.is_none());
        assert!(response.message.starts_with("Error: insanely-fast-whisper failed"));
        assert!(files_in(work_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_is_not_found() {
        let work_dir = TempDir::new().unwrap();
        let mut media = MockMediaProcessorTrait::new();
        media.expect_resize_video().returning(|_, output, _| touch(output));
        media.expect_probe_duration().returning(|_| Ok(10.0));
        media.expect_extract_audio().returning(|_, output| touch(output));
        media.expect_filter_audio().returning(|_, output| touch(output));
        media.expect_replace_audio().returning(|_, _, _| Ok(()));
        let subject = workflow(&work_dir, media, transcriber_mock(), MockLipSyncer::new());

        match subject.process(&french_request(false)).await {
            Err(DubError::FileNotFound(message)) => assert!(message.ends_with("was not generated")),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
        assert!(files_in(work_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_process_directory_skips_failures() {
        let work_dir = TempDir::new().unwrap();
        let input_dir = TempDir::new().unwrap();
        std::fs::write(input_dir.path().join("a.mp4"), b"v").unwrap();
        std::fs::write(input_dir.path().join("b.mov"), b"v").unwrap();
        std::fs::write(input_dir.path().join("notes.txt"), b"t").unwrap();

        let mut transcriber = MockTranscriberTrait::new();
        let mut calls = 0;
        transcriber.expect_transcribe().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                return Err(DubError::Transcription("no speech detected".to_string()));
            }
            Ok(Transcript {
                text: Some("Hello world".to_string()),
                chunks: Vec::new(),
            })
        });
        let subject = workflow(&work_dir, media_mock(10.0, 1), transcriber, MockLipSyncer::new());

        let outcomes = subject
            .process_directory(input_dir.path(), "French", false)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(files_in(work_dir.path()).len(), 1);
    }

    #[test]
    fn test_validate_request() {
        let mut request = french_request(false);
        assert_eq!(validate_request(&request).unwrap(), "French");

        request.target_language = Some("  ".to_string());
        assert!(matches!(validate_request(&request), Err(DubError::Validation(_))));
    }
}
