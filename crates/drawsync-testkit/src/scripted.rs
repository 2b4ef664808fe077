use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use drawsync_schemas::DrawRecord;
use drawsync_source::{DrawSource, SourceError};

/// Snapshot of how often each capability was called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_all: usize,
    pub fetch_latest: usize,
    pub fetch_one: usize,
}

/// In-memory mirror with scripted answers.
///
/// By default it serves its draws for `fetch_one`, the highest draw for
/// `fetch_latest`, and every draw for `fetch_all`. Each capability can be
/// switched to fail with a fixed error.
pub struct ScriptedSource {
    name: String,
    draws: Mutex<BTreeMap<u32, DrawRecord>>,
    latest: Option<DrawRecord>,
    fail_all: Option<SourceError>,
    fail_latest: Option<SourceError>,
    fail_one: Option<SourceError>,
    calls_all: AtomicUsize,
    calls_latest: AtomicUsize,
    calls_one: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            draws: Mutex::new(BTreeMap::new()),
            latest: None,
            fail_all: None,
            fail_latest: None,
            fail_one: None,
            calls_all: AtomicUsize::new(0),
            calls_latest: AtomicUsize::new(0),
            calls_one: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a transport error.
    pub fn unreachable(name: impl Into<String>) -> Self {
        let err = SourceError::Transport("connection refused".to_string());
        Self::new(name)
            .failing_all(err.clone())
            .failing_latest(err.clone())
            .failing_one(err)
    }

    pub fn with_draws<I: IntoIterator<Item = DrawRecord>>(self, draws: I) -> Self {
        for d in draws {
            self.put(d);
        }
        self
    }

    /// Answer `fetch_latest` with `rec` instead of the highest draw.
    pub fn with_latest(mut self, rec: DrawRecord) -> Self {
        self.latest = Some(rec);
        self
    }

    pub fn failing_all(mut self, err: SourceError) -> Self {
        self.fail_all = Some(err);
        self
    }

    pub fn failing_latest(mut self, err: SourceError) -> Self {
        self.fail_latest = Some(err);
        self
    }

    pub fn failing_one(mut self, err: SourceError) -> Self {
        self.fail_one = Some(err);
        self
    }

    /// Mirror without a bulk endpoint.
    pub fn without_bulk(self) -> Self {
        let name = self.name.clone();
        self.failing_all(SourceError::Config(format!("source '{name}' has no bulk_url")))
    }

    /// Insert or replace one draw.
    pub fn put(&self, rec: DrawRecord) {
        self.lock().insert(rec.draw_no(), rec);
    }

    pub fn remove(&self, draw_no: u32) {
        self.lock().remove(&draw_no);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            fetch_all: self.calls_all.load(Ordering::SeqCst),
            fetch_latest: self.calls_latest.load(Ordering::SeqCst),
            fetch_one: self.calls_one.load(Ordering::SeqCst),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u32, DrawRecord>> {
        // A poisoned lock only means another test thread panicked.
        self.draws.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DrawSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self) -> Result<Vec<DrawRecord>, SourceError> {
        self.calls_all.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.fail_all {
            return Err(e.clone());
        }
        Ok(self.lock().values().cloned().collect())
    }

    async fn fetch_latest(&self) -> Result<DrawRecord, SourceError> {
        self.calls_latest.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.fail_latest {
            return Err(e.clone());
        }
        if let Some(r) = &self.latest {
            return Ok(r.clone());
        }
        self.lock()
            .values()
            .next_back()
            .cloned()
            .ok_or(SourceError::Status(404))
    }

    async fn fetch_one(&self, draw_no: u32) -> Result<DrawRecord, SourceError> {
        self.calls_one.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.fail_one {
            return Err(e.clone());
        }
        self.lock()
            .get(&draw_no)
            .cloned()
            .ok_or(SourceError::Status(404))
    }
}
