use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    BoxError, Router,
};
use futures::{Stream, TryStreamExt};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
    sync::{AcquireError, Semaphore},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::language::{LanguageTable, DEFAULT_LANGUAGE};
use crate::workflow::{DubRequest, Workflow};

const OUTPUT_SUFFIX: &str = "_output_video.mp4";

#[derive(Clone)]
pub struct AppState {
    workflow: Arc<Workflow>,
    /// Bounds how many requests run the pipeline at once; others wait here
    queue: Arc<Semaphore>,
}

impl AppState {
    pub fn new(workflow: Arc<Workflow>) -> Self {
        let permits = workflow.config().server.max_concurrent_jobs;
        Self {
            workflow,
            queue: Arc::new(Semaphore::new(permits)),
        }
    }

    fn work_dir(&self) -> &Path {
        &self.workflow.config().media.work_dir
    }
}

pub fn router(state: AppState) -> Router {
    let max_upload = state.workflow.config().server.max_upload_mb * 1024 * 1024;

    Router::new()
        .route("/", get(index))
        .route("/dub", post(dub))
        .route("/outputs/:file", get(output))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

/// Bind and serve the web UI until the process is stopped
pub async fn serve(workflow: Arc<Workflow>) -> Result<()> {
    let server = workflow.config().server.clone();
    tokio::fs::create_dir_all(&workflow.config().media.work_dir).await?;

    let app = router(AppState::new(workflow));
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", server.addr, server.port)).await?;
    info!("Listening at http://{}:{}", server.addr, server.port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Values echoed back into the form after a submission
#[derive(Debug, Default)]
pub struct PageResult {
    pub video_url: Option<String>,
    pub message: String,
    pub selected_language: Option<String>,
    pub lip_sync: bool,
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.workflow.config().languages, None))
}

#[derive(Debug, Default)]
struct DubForm {
    video: Option<PathBuf>,
    target_language: Option<String>,
    lip_sync: bool,
}

/// Upload files of one request; removed when the request is done with them,
/// including when the handler bails out early or is dropped
#[derive(Debug, Default)]
struct SavedUploads(Vec<PathBuf>);

impl SavedUploads {
    fn track(&mut self, path: PathBuf) -> &Path {
        self.0.push(path);
        &self.0[self.0.len() - 1]
    }
}

impl Drop for SavedUploads {
    fn drop(&mut self) {
        for path in &self.0 {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed upload {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
            }
        }
    }
}

fn bad_request(e: impl ToString) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

async fn read_form(
    work_dir: &Path,
    multipart: &mut Multipart,
    uploads: &mut SavedUploads,
) -> std::result::Result<DubForm, (StatusCode, String)> {
    let mut form = DubForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                let file_name = match field.file_name() {
                    Some(file_name) if !file_name.is_empty() => file_name.to_owned(),
                    _ => continue,
                };

                let path = uploads.track(work_dir.join(upload_file_name(&file_name)));
                info!("Saving upload {} to {}", file_name, path.display());
                save_upload(path, field).await?;
                form.video = Some(path.to_path_buf());
            }
            "target_language" => {
                let value = field.text().await.map_err(bad_request)?;
                form.target_language = Some(value).filter(|v| !v.trim().is_empty());
            }
            "lip_sync" => {
                let value = field.text().await.map_err(bad_request)?;
                form.lip_sync = matches!(value.as_str(), "on" | "true" | "1");
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn dub(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Html<String>, (StatusCode, String)> {
    let mut uploads = SavedUploads::default();
    let form = read_form(state.work_dir(), &mut multipart, &mut uploads).await?;

    let languages = &state.workflow.config().languages;
    let Some(video) = form.video.clone() else {
        let result = PageResult {
            message: "Error: Please upload a video.".to_string(),
            selected_language: form.target_language,
            lip_sync: form.lip_sync,
            ..PageResult::default()
        };
        return Ok(Html(render_page(languages, Some(&result))));
    };

    let request = DubRequest {
        video,
        target_language: form.target_language.clone(),
        lip_sync: form.lip_sync,
    };

    // The run owns its uploads and queue slot, so it finishes and cleans up
    // even if the client goes away
    let job_state = state.clone();
    let job = tokio::spawn(async move {
        let _uploads = uploads;
        let _permit = job_state.queue.clone().acquire_owned().await?;
        Ok::<_, AcquireError>(job_state.workflow.handle(&request).await)
    });
    let response = job
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let result = PageResult {
        video_url: response
            .video
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| format!("/outputs/{}", name.to_string_lossy())),
        message: response.message,
        selected_language: form.target_language,
        lip_sync: form.lip_sync,
    };
    Ok(Html(render_page(languages, Some(&result))))
}

async fn output(
    State(state): State<AppState>,
    UrlPath(file_name): UrlPath<String>,
) -> std::result::Result<impl IntoResponse, (StatusCode, String)> {
    if !is_output_name(&file_name) {
        warn!("Rejected output request for {:?}", file_name);
        return Err((StatusCode::BAD_REQUEST, "Invalid file name".to_owned()));
    }

    let file = File::open(state.work_dir().join(&file_name))
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, "Output not found".to_owned()))?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok(([(header::CONTENT_TYPE, "video/mp4")], body))
}

/// Write an upload body to disk chunk by chunk.
/// A broken body is the client's fault; a failed write is ours.
async fn save_upload<S, E>(path: &Path, body: S) -> std::result::Result<(), (StatusCode, String)>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<BoxError>,
{
    let internal = |e: io::Error| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());

    futures::pin_mut!(body);
    let mut file = BufWriter::new(File::create(path).await.map_err(internal)?);
    let mut written = 0u64;

    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| bad_request(Into::<BoxError>::into(e)))?
    {
        file.write_all(&chunk).await.map_err(internal)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(internal)?;

    debug!("Wrote {} bytes to {}", written, path.display());
    Ok(())
}

/// Server-side name for an upload; only a short alphanumeric extension survives from the client name
fn upload_file_name(client_name: &str) -> String {
    let ext = Path::new(client_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_lowercase)
        .unwrap_or_else(|| "mp4".to_string());

    format!("{}_upload.{}", Uuid::new_v4().simple(), ext)
}

/// A single plain file name of a finished output
fn is_output_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && name.ends_with(OUTPUT_SUFFIX)
        && !name.contains('\\')
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the upload form, with the outcome of the last submission if any
pub fn render_page(languages: &LanguageTable, result: Option<&PageResult>) -> String {
    let selected = result
        .and_then(|r| r.selected_language.as_deref())
        .unwrap_or(DEFAULT_LANGUAGE);

    let mut options = String::from("<option value=\"\">Select a language</option>\n");
    for name in languages.names() {
        let name = escape_html(name);
        let marker = if name == escape_html(selected) { " selected" } else { "" };
        options.push_str(&format!("<option value=\"{name}\"{marker}>{name}</option>\n"));
    }

    let checked = if result.map(|r| r.lip_sync).unwrap_or(false) { " checked" } else { "" };

    let player = match result.and_then(|r| r.video_url.as_deref()) {
        Some(url) => format!(
            "<video controls src=\"{0}\"></video>\n<p><a href=\"{0}\" download>Download</a></p>",
            escape_html(url)
        ),
        None => String::new(),
    };
    let status = result.map(|r| escape_html(&r.message)).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>AI Video Dubbing</title>
</head>
<body>
<h1>AI Video Dubbing</h1>
<p>Upload a video, choose a target language, and get a dubbed version.</p>
<form action="/dub" method="post" enctype="multipart/form-data">
<label>Upload Video <input type="file" name="video" accept="video/*"></label><br>
<label>Target Language for Dubbing <select name="target_language">
{options}</select></label><br>
<label><input type="checkbox" name="lip_sync"{checked}> Use Wav2Lip for lip sync</label>
<small>Enable this if the video has close-up faces. May not work for all videos.</small><br>
<button type="submit">Process Video</button>
</form>
<h2>Processed Video</h2>
{player}
<h2>Status/Error Message</h2>
<pre>{status}</pre>
<h2>Notes</h2>
<ul>
<li>Video limit is 1 minute. The tool will dub all speakers using a single voice.</li>
<li>Processing may take up to 5 minutes.</li>
</ul>
</body>
</html>
"#
    )
}
