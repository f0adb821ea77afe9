use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};

use anyhow::Context;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{ARTIFACT_PREFIX, ARTIFACT_SUFFIX, SessionId, SessionStatus};
use crate::assets::RenderAssets;
use crate::catalog::model::{Catalog, Entry};
use crate::encode::EncoderMode;
use crate::encode::ffmpeg::EncodeSettings;
use crate::foundation::error::{WheelError, WheelResult};
use crate::pipeline::{self, GenerationOutcome, Job, Progress, Stage, VideoSettings};
use crate::selection::{self, GenerationRequest};

/// Where and how sessions produce their videos.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// Directory receiving `wheel_<id>.mp4`.
    pub output_dir: PathBuf,
    /// Parent of the per-session scratch directories.
    pub scratch_dir: PathBuf,
    /// Age after which sessions and their artifacts are evicted.
    pub ttl: Duration,
    /// Encoder backend.
    pub encoder: EncoderMode,
    /// ffmpeg options.
    pub encode: EncodeSettings,
    /// Frame budget, size and frame rate.
    pub video: VideoSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            scratch_dir: PathBuf::from("temp"),
            ttl: Duration::from_secs(3600),
            encoder: EncoderMode::default(),
            encode: EncodeSettings::default(),
            video: VideoSettings::default(),
        }
    }
}

/// Body of `/api/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusReport {
    /// The MP4 exists and can be downloaded.
    pub ready: bool,
    /// Artifact size in bytes when ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Lifecycle state, when the session is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct SessionRecord {
    entry: Entry,
    created: Instant,
    status: SessionStatus,
    progress: watch::Receiver<Progress>,
    cancel: CancellationToken,
}

struct Inner {
    catalog: Catalog,
    assets: Arc<RenderAssets>,
    settings: SessionSettings,
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    shutdown: CancellationToken,
}

/// Registry of generation sessions.
///
/// Cheap to clone; every clone shares the same registry. Each session's pipeline runs on a
/// blocking worker and reports through a `watch` channel read by [`SessionManager::progress`].
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create the registry and its output/scratch directories.
    pub fn new(
        catalog: Catalog,
        assets: Arc<RenderAssets>,
        settings: SessionSettings,
    ) -> WheelResult<Self> {
        for dir in [&settings.output_dir, &settings.scratch_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create directory '{}'", dir.display()))?;
        }
        Ok(Self {
            inner: Arc::new(Inner {
                catalog,
                assets,
                settings,
                sessions: RwLock::new(HashMap::new()),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Catalog the sessions draw from.
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Active settings.
    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    /// Number of sessions currently tracked.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// `true` when no session is tracked.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Output path of session `id`.
    pub fn artifact_path(&self, id: SessionId) -> PathBuf {
        self.inner.settings.output_dir.join(id.artifact_name())
    }

    /// Resolve the winner and start generating in the background.
    ///
    /// Resolution errors are returned synchronously and no session is created. Must be called
    /// from within a tokio runtime.
    pub fn create(&self, request: &GenerationRequest) -> WheelResult<(SessionId, Entry)> {
        if self.inner.shutdown.is_cancelled() {
            return Err(WheelError::Cancelled);
        }
        let entry = selection::resolve(&self.inner.catalog, request.selection)?;
        let id = SessionId::new_v4();
        let cancel = self.inner.shutdown.child_token();
        let (tx, rx) = watch::channel(Progress::queued());

        self.write().insert(
            id,
            SessionRecord {
                entry: entry.clone(),
                created: Instant::now(),
                status: SessionStatus::Pending,
                progress: rx,
                cancel: cancel.clone(),
            },
        );
        tracing::info!(
            session_id = %id,
            position = entry.position,
            speed = request.speed.get(),
            "session created"
        );

        let job = Job {
            entry: entry.clone(),
            speed: request.speed,
            spin_duration_ms: request.spin_duration_ms,
        };
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.run(id, job, cancel, tx));

        Ok((id, entry))
    }

    fn run(&self, id: SessionId, job: Job, cancel: CancellationToken, tx: watch::Sender<Progress>) {
        let span = tracing::info_span!("session", session_id = %id);
        let _guard = span.enter();

        let settings = &self.inner.settings;
        let out_path = self.artifact_path(id);
        let scratch = settings.scratch_dir.join(id.to_string());
        let mut sink =
            pipeline::make_sink(settings.encoder, &settings.encode, &scratch, &out_path, &cancel);

        // `Done` is published by `finish`, after the registry is updated.
        let mut forward = |p: Progress| {
            if p.stage != Stage::Done {
                tx.send_replace(p);
            }
        };
        let result = pipeline::generate(
            &settings.video,
            &self.inner.assets,
            &job,
            sink.as_mut(),
            &cancel,
            &mut forward,
        );
        drop(sink);
        self.finish(id, &out_path, result, &tx);
    }

    fn finish(
        &self,
        id: SessionId,
        out_path: &Path,
        result: WheelResult<GenerationOutcome>,
        tx: &watch::Sender<Progress>,
    ) {
        let last = tx.borrow().progress;
        let mut sessions = self.write();
        let Some(record) = sessions.get_mut(&id) else {
            // Deleted or evicted while running.
            drop(sessions);
            if result.is_ok() {
                remove_quiet(out_path);
            }
            tx.send_replace(Progress::cancelled(last));
            return;
        };

        let progress = match result {
            Ok(outcome) if !record.cancel.is_cancelled() => {
                tracing::info!(frames = outcome.frames, "session ready");
                record.status = SessionStatus::Ready;
                Progress::done()
            }
            Ok(_) | Err(WheelError::Cancelled) => {
                remove_quiet(out_path);
                record.status = SessionStatus::Cancelled;
                Progress::cancelled(last)
            }
            Err(e) => {
                let error = e.to_string();
                record.status = SessionStatus::Failed {
                    error: error.clone(),
                };
                Progress::failed(last, &error)
            }
        };
        drop(sessions);
        tx.send_replace(progress);
    }

    /// Readiness of `id`; readiness is the existence of its artifact.
    pub fn status(&self, id: &str) -> WheelResult<StatusReport> {
        let id: SessionId = id.parse()?;
        if let Some(size) = artifact_size(&self.artifact_path(id)) {
            return Ok(StatusReport {
                ready: true,
                size: Some(size),
                status: Some(SessionStatus::Ready.as_str().to_string()),
                error: None,
            });
        }

        let sessions = self.read();
        let Some(record) = sessions.get(&id) else {
            return Ok(StatusReport::default());
        };
        let error = match &record.status {
            SessionStatus::Failed { error } => Some(error.clone()),
            _ => None,
        };
        let status = match record.status {
            // Artifact removed behind our back.
            SessionStatus::Ready => None,
            ref s => Some(s.as_str().to_string()),
        };
        Ok(StatusReport {
            ready: false,
            size: None,
            status,
            error,
        })
    }

    /// Latest progress snapshot of `id`.
    pub fn progress(&self, id: &str) -> WheelResult<Progress> {
        let id: SessionId = id.parse()?;
        if let Some(record) = self.read().get(&id) {
            return Ok(record.progress.borrow().clone());
        }
        if artifact_size(&self.artifact_path(id)).is_some() {
            return Ok(Progress::done());
        }
        Err(WheelError::not_found(format!("session '{id}'")))
    }

    /// Winning entry of a tracked session.
    pub fn entry(&self, id: SessionId) -> Option<Entry> {
        self.read().get(&id).map(|r| r.entry.clone())
    }

    /// Wait until session `id` reaches a terminal stage and return that snapshot.
    pub async fn wait(&self, id: SessionId) -> WheelResult<Progress> {
        let mut rx = self
            .read()
            .get(&id)
            .map(|r| r.progress.clone())
            .ok_or_else(|| WheelError::not_found(format!("session '{id}'")))?;
        loop {
            let current = rx.borrow_and_update().clone();
            if current.stage.is_terminal() {
                return Ok(current);
            }
            if rx.changed().await.is_err() {
                return Ok(rx.borrow().clone());
            }
        }
    }

    /// Open the artifact of `id` for streaming.
    pub async fn open_download(&self, id: &str) -> WheelResult<(SessionId, tokio::fs::File, u64)> {
        let id: SessionId = id.parse()?;
        let path = self.artifact_path(id);
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| WheelError::not_found(format!("video for session '{id}'")))?;
        let size = file
            .metadata()
            .await
            .with_context(|| format!("stat '{}'", path.display()))?
            .len();
        Ok((id, file, size))
    }

    /// Cancel session `id` and remove its artifact.
    pub async fn delete(&self, id: &str) -> WheelResult<()> {
        let id: SessionId = id.parse()?;
        let record = self.write().remove(&id);
        if let Some(record) = &record {
            record.cancel.cancel();
        }

        let path = self.artifact_path(id);
        let removed = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("remove '{}'", path.display()))
                    .into());
            }
        };

        if record.is_none() && !removed {
            return Err(WheelError::not_found(format!("session '{id}'")));
        }
        tracing::info!(session_id = %id, "session deleted");
        Ok(())
    }

    /// Evict sessions older than the TTL and sweep orphaned artifacts and scratch directories.
    ///
    /// Returns the number of sessions evicted plus files and directories removed.
    pub fn evict_expired(&self) -> usize {
        let ttl = self.inner.settings.ttl;
        let expired: Vec<(SessionId, SessionRecord)> = {
            let mut sessions = self.write();
            let ids: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, r)| r.created.elapsed() >= ttl)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|r| (id, r)))
                .collect()
        };

        let mut removed = expired.len();
        for (id, record) in expired {
            record.cancel.cancel();
            remove_quiet(&self.artifact_path(id));
            tracing::debug!(session_id = %id, "session evicted");
        }

        removed += self.sweep_orphans(ttl);
        if removed > 0 {
            tracing::info!(removed, "retention sweep");
        }
        removed
    }

    fn sweep_orphans(&self, ttl: Duration) -> usize {
        let live: Vec<String> = self.read().keys().map(SessionId::to_string).collect();
        let is_live = |name: &str| live.iter().any(|id| name.contains(id.as_str()));
        let mut removed = 0;

        for (dir, want_dir) in [
            (&self.inner.settings.output_dir, false),
            (&self.inner.settings.scratch_dir, true),
        ] {
            let Ok(read) = std::fs::read_dir(dir) else {
                continue;
            };
            for item in read.flatten() {
                let name = item.file_name().to_string_lossy().into_owned();
                let Ok(meta) = item.metadata() else { continue };
                let ours = if want_dir {
                    meta.is_dir() && name.parse::<SessionId>().is_ok()
                } else {
                    meta.is_file() && is_artifact_name(&name)
                };
                if !ours || is_live(&name) || !older_than(&meta, ttl) {
                    continue;
                }
                let path = item.path();
                let res = if want_dir {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                match res {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "orphan removal failed")
                    }
                }
            }
        }
        removed
    }

    /// Cancel every running session; new sessions are refused afterwards.
    pub fn shutdown(&self) {
        tracing::info!(sessions = self.len(), "cancelling sessions");
        self.inner.shutdown.cancel();
    }

    /// Token cancelled by [`SessionManager::shutdown`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionRecord>> {
        self.inner.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionRecord>> {
        self.inner.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn artifact_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// Finished artifacts and the `.part` files an interrupted encode leaves behind.
fn is_artifact_name(name: &str) -> bool {
    let stem = name.strip_suffix(".part").unwrap_or(name);
    stem.starts_with(ARTIFACT_PREFIX) && stem.ends_with(ARTIFACT_SUFFIX)
}

fn older_than(meta: &std::fs::Metadata, ttl: Duration) -> bool {
    meta.modified()
        .ok()
        .and_then(|t| SystemTime::now().duration_since(t).ok())
        .is_some_and(|age| age >= ttl)
}

fn remove_quiet(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove artifact");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/registry.rs"]
mod tests;
