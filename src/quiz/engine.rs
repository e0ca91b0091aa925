use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::constants::{DEFAULT_SESSION_TTL_MINS, MAX_PROFILE_ID_LEN};
use crate::quiz::catalog::{ItemCatalog, LAYERS};
use crate::quiz::config::SchedulerConfig;
use crate::quiz::ledger::CategoryStats;
use crate::quiz::profile::{AnswerOutcome, ProfileSnapshot, CURRENT_SCHEMA_VERSION};
use crate::quiz::rewards::{score_exam, ExamResult, Title};
use crate::quiz::sampler::QuizRng;
use crate::quiz::session::{Progress, SessionDriver, SessionError, SessionState};
use crate::quiz::types::{AnswerRecord, Item, QuizMode, Tag};
use crate::store::StoreError;

/// Load/save of whole profile snapshots.
pub trait ProfileRepository: Send + Sync {
    /// Absent, corrupt or newer-schema blobs resolve to a fresh snapshot.
    fn load_profile(&self, profile_id: &str, today: NaiveDate) -> Result<ProfileSnapshot, StoreError>;
    fn save_profile(&self, profile_id: &str, snapshot: &ProfileSnapshot) -> Result<(), StoreError>;
    fn delete_profile(&self, profile_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("invalid profile id: {0:?}")]
    InvalidProfileId(String),
    #[error("profile schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Fixed seed for reproducible sets; entropy when `None`.
    pub seed: Option<u64>,
    pub session_ttl: Duration,
    pub clock: Clock,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seed: None,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_MINS * 60),
            clock: local_today,
        }
    }
}

struct LiveSession {
    profile_id: String,
    driver: SessionDriver,
    started_at: DateTime<Utc>,
    last_touched: Instant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub profile_id: String,
    pub mode: Option<QuizMode>,
    pub state: SessionState,
    pub progress: Progress,
    pub current_item: Option<Item>,
    pub started_at: DateTime<Utc>,
}

impl SessionView {
    fn of(session_id: Uuid, live: &LiveSession) -> Self {
        Self {
            session_id,
            profile_id: live.profile_id.clone(),
            mode: live.driver.mode(),
            state: live.driver.state(),
            progress: live.driver.progress(),
            current_item: live.driver.current_item().cloned(),
            started_at: live.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub session: SessionView,
    pub answer: AnswerOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam: Option<ExamResult>,
    pub exam_badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerProgress {
    pub depth: u8,
    pub name: &'static str,
    pub rate: f64,
    pub target_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub title: Title,
    pub study_streak: u32,
    pub total_correct: u32,
    pub tag_rates: BTreeMap<Tag, f64>,
    pub layers: Vec<LayerProgress>,
    pub bookmarks: Vec<String>,
    pub badges: Vec<String>,
    pub minerals: BTreeMap<String, u32>,
    pub best_exam_score: Option<u32>,
}

/// 调度引擎：持有题库、档案仓库与进行中的会话
pub struct QuizEngine {
    catalog: Arc<ItemCatalog>,
    repo: Arc<dyn ProfileRepository>,
    config: SchedulerConfig,
    settings: EngineSettings,
    session_counter: AtomicU64,
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<LiveSession>>>>,
    profile_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuizEngine {
    pub fn new(
        catalog: Arc<ItemCatalog>,
        repo: Arc<dyn ProfileRepository>,
        config: SchedulerConfig,
        settings: EngineSettings,
    ) -> Self {
        Self {
            catalog,
            repo,
            config,
            settings,
            session_counter: AtomicU64::new(0),
            sessions: Mutex::new(HashMap::new()),
            profile_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        (self.settings.clock)()
    }

    pub async fn live_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn acquire_profile_lock(&self, profile_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.profile_locks.lock().await;

        // strong_count == 1 时只剩 map 自己持有，可以回收
        if locks.len() > 1000 {
            locks.retain(|_, v| Arc::strong_count(v) > 1);
        }

        locks
            .entry(profile_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn next_rng(&self) -> QuizRng {
        let n = self.session_counter.fetch_add(1, Ordering::Relaxed);
        match self.settings.seed {
            Some(seed) => QuizRng::from_seed(seed.wrapping_add(n)),
            None => QuizRng::from_entropy(),
        }
    }

    async fn session_entry(&self, session_id: Uuid) -> Result<Arc<Mutex<LiveSession>>, EngineError> {
        self.sessions
            .lock()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(EngineError::SessionNotFound(session_id))
    }

    /// Drops sessions idle longer than the configured TTL. Sessions currently
    /// locked by a request are kept.
    pub async fn prune_sessions(&self) -> usize {
        let ttl = self.settings.session_ttl;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(live) => live.last_touched.elapsed() < ttl,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    pub async fn start_session(&self, profile_id: &str, mode: QuizMode) -> Result<SessionView, EngineError> {
        validate_profile_id(profile_id)?;
        self.prune_sessions().await;

        let lock = self.acquire_profile_lock(profile_id).await;
        let _guard = lock.lock().await;

        let today = self.today();
        let snapshot = self.repo.load_profile(profile_id, today)?;
        let mut rng = self.next_rng();
        let mut driver = SessionDriver::new();
        let state = driver.start(mode, &self.catalog, &snapshot.ledger, today, &self.config, &mut rng);

        let session_id = Uuid::new_v4();
        let live = LiveSession {
            profile_id: profile_id.to_string(),
            driver,
            started_at: Utc::now(),
            last_touched: Instant::now(),
        };
        let view = SessionView::of(session_id, &live);
        self.sessions
            .lock()
            .await
            .insert(session_id, Arc::new(Mutex::new(live)));

        tracing::info!(
            profile_id,
            %session_id,
            mode = mode.name(),
            items = view.progress.total,
            state = ?state,
            "Session started"
        );
        Ok(view)
    }

    pub async fn current(&self, session_id: Uuid) -> Result<SessionView, EngineError> {
        let entry = self.session_entry(session_id).await?;
        let mut live = entry.lock().await;
        live.last_touched = Instant::now();
        Ok(SessionView::of(session_id, &live))
    }

    /// 先写档案再推进会话；保存失败时两者都保持原样
    pub async fn submit(&self, session_id: Uuid, record: AnswerRecord) -> Result<SubmitOutcome, EngineError> {
        let entry = self.session_entry(session_id).await?;
        let mut live = entry.lock().await;

        let profile_lock = self.acquire_profile_lock(&live.profile_id).await;
        let _guard = profile_lock.lock().await;

        let item_tag = live.driver.check(&record)?.tag;
        let record = AnswerRecord {
            tag: item_tag,
            ..record
        }
        .normalized();

        let today = self.today();
        let mut snapshot = self.repo.load_profile(&live.profile_id, today)?;
        let answer = snapshot.apply_answer(record.clone(), today);

        let finishing = live.driver.answers().len() + 1 == live.driver.items().len();
        let mut exam = None;
        let mut exam_badges = Vec::new();
        if finishing && live.driver.mode().is_some_and(|m| m.is_exam()) {
            let mut answers = live.driver.answers().to_vec();
            answers.push(record.clone());
            let result = score_exam(live.driver.items(), &answers, today);
            exam_badges = snapshot.record_exam(result.clone());
            exam = Some(result);
        }

        self.repo.save_profile(&live.profile_id, &snapshot)?;
        let correct = record.correct;
        live.driver.submit(record)?;
        live.last_touched = Instant::now();

        tracing::debug!(
            %session_id,
            profile_id = %live.profile_id,
            correct,
            state = ?live.driver.state(),
            "Answer submitted"
        );
        if let Some(result) = &exam {
            tracing::info!(%session_id, score = result.score, total = result.total, "Exam finished");
        }

        Ok(SubmitOutcome {
            session: SessionView::of(session_id, &live),
            answer,
            exam,
            exam_badges,
        })
    }

    /// Abandons a session. Answers already submitted stay in the ledger.
    pub async fn end_session(&self, session_id: Uuid) -> Result<(), EngineError> {
        self.sessions
            .lock()
            .await
            .remove(&session_id)
            .map(|_| ())
            .ok_or(EngineError::SessionNotFound(session_id))
    }

    pub async fn toggle_bookmark(&self, profile_id: &str, item_id: &str) -> Result<Option<bool>, EngineError> {
        self.mutate_profile(profile_id, |snapshot| snapshot.toggle_bookmark(item_id))
            .await
    }

    pub async fn tag_rates(&self, profile_id: &str) -> Result<BTreeMap<Tag, f64>, EngineError> {
        Ok(self.snapshot(profile_id).await?.ledger.tag_rates())
    }

    pub async fn progress(&self, profile_id: &str) -> Result<ProgressReport, EngineError> {
        let snapshot = self.snapshot(profile_id).await?;
        let ledger = &snapshot.ledger;
        let layers = LAYERS
            .iter()
            .map(|layer| {
                let stats = layer.tags.iter().fold(CategoryStats::default(), |acc, &t| {
                    let s = ledger.category(t);
                    CategoryStats {
                        correct: acc.correct + s.correct,
                        miss: acc.miss + s.miss,
                    }
                });
                LayerProgress {
                    depth: layer.depth,
                    name: layer.name,
                    rate: stats.correct_rate(),
                    target_rate: layer.target_rate,
                }
            })
            .collect();

        Ok(ProgressReport {
            title: snapshot.profile.title,
            study_streak: snapshot.profile.streak,
            total_correct: ledger.total_correct(),
            tag_rates: ledger.tag_rates(),
            layers,
            bookmarks: ledger.bookmarked_ids(),
            badges: snapshot.badges.clone(),
            minerals: snapshot.minerals.clone(),
            best_exam_score: snapshot.best_exam_score(),
        })
    }

    pub async fn snapshot(&self, profile_id: &str) -> Result<ProfileSnapshot, EngineError> {
        validate_profile_id(profile_id)?;
        let lock = self.acquire_profile_lock(profile_id).await;
        let _guard = lock.lock().await;
        Ok(self.repo.load_profile(profile_id, self.today())?)
    }

    pub async fn rename_profile(&self, profile_id: &str, name: &str) -> Result<ProfileSnapshot, EngineError> {
        self.mutate_profile(profile_id, |snapshot| {
            snapshot.rename(name);
            snapshot.clone()
        })
        .await
    }

    /// Replaces the stored profile wholesale.
    pub async fn import_snapshot(
        &self,
        profile_id: &str,
        mut snapshot: ProfileSnapshot,
    ) -> Result<ProfileSnapshot, EngineError> {
        validate_profile_id(profile_id)?;
        if snapshot.version > CURRENT_SCHEMA_VERSION {
            return Err(EngineError::UnsupportedVersion {
                found: snapshot.version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        snapshot.normalize();
        let lock = self.acquire_profile_lock(profile_id).await;
        let _guard = lock.lock().await;
        self.repo.save_profile(profile_id, &snapshot)?;
        tracing::info!(profile_id, items = snapshot.ledger.history.len(), "Profile imported");
        Ok(snapshot)
    }

    pub async fn reset_profile(&self, profile_id: &str) -> Result<ProfileSnapshot, EngineError> {
        validate_profile_id(profile_id)?;
        let lock = self.acquire_profile_lock(profile_id).await;
        let _guard = lock.lock().await;

        self.repo.delete_profile(profile_id)?;
        let fresh = ProfileSnapshot::fresh(self.today());
        self.repo.save_profile(profile_id, &fresh)?;

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(live) => live.profile_id != profile_id,
            Err(_) => true,
        });
        tracing::info!(profile_id, "Profile reset");
        Ok(fresh)
    }

    async fn mutate_profile<T>(
        &self,
        profile_id: &str,
        f: impl FnOnce(&mut ProfileSnapshot) -> T,
    ) -> Result<T, EngineError> {
        validate_profile_id(profile_id)?;
        let lock = self.acquire_profile_lock(profile_id).await;
        let _guard = lock.lock().await;

        let mut snapshot = self.repo.load_profile(profile_id, self.today())?;
        let out = f(&mut snapshot);
        self.repo.save_profile(profile_id, &snapshot)?;
        Ok(out)
    }
}

pub fn validate_profile_id(profile_id: &str) -> Result<(), EngineError> {
    let ok = !profile_id.is_empty()
        && profile_id.len() <= MAX_PROFILE_ID_LEN
        && profile_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidProfileId(profile_id.to_string()))
    }
}
