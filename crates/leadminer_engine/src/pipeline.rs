//! Sequential search → fetch → extract → filter → segment → report pipeline.

use std::sync::Arc;
use std::time::Duration;

use leadminer_core::{
    contains_url, filter_text, inject_separators, DocumentStatus, FilterMode, ProgressMsg, Report,
};
use miner_logging::{miner_debug, miner_info, miner_warn};

use crate::{
    BackoffPolicy, Clock, ExtractionError, Fetcher, PdfExtractor, ProgressSink, SearchProvider,
    SearchResult, Sleeper,
};

pub const MAX_LIMIT: usize = 100;
pub const MAX_DELAY_SECONDS: f64 = 60.0;

/// Parameters of one run, as submitted by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub keyword: String,
    pub limit: usize,
    pub mode: FilterMode,
    /// Segment the output every `n` lines when set.
    pub line_interval: Option<i64>,
    pub delay_seconds: f64,
    /// Skip documents whose raw text carries no URL at all.
    pub require_url: bool,
    /// Prefix each document block with its `SOURCE:`/`TITLE:` lines.
    pub include_headers: bool,
}

impl RunRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            limit: 10,
            mode: FilterMode::default(),
            line_interval: None,
            delay_seconds: 2.0,
            require_url: false,
            include_headers: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keyword.trim().is_empty() {
            return Err(ValidationError::EmptyKeyword);
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ValidationError::LimitOutOfRange(self.limit));
        }
        if let Some(interval) = self.line_interval {
            if interval <= 0 {
                return Err(ValidationError::InvalidInterval(interval));
            }
        }
        if !(0.0..=MAX_DELAY_SECONDS).contains(&self.delay_seconds) {
            return Err(ValidationError::InvalidDelay(self.delay_seconds));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("keyword must not be empty")]
    EmptyKeyword,
    #[error("limit must be between 1 and 100, got {0}")]
    LimitOutOfRange(usize),
    #[error("line interval must be positive, got {0}")]
    InvalidInterval(i64),
    #[error("delay must be between 0 and 60 seconds, got {0}")]
    InvalidDelay(f64),
}

/// Collaborators and limits shared by every run.
#[derive(Clone)]
pub struct Pipeline {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn PdfExtractor>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    time_budget: Option<Duration>,
    max_jitter: Duration,
}

/// What happened to one candidate; the report is updated from it.
enum Outcome {
    Success { url: String, body: String },
    Other {
        url: Option<String>,
        status: DocumentStatus,
        detail: Option<String>,
    },
    /// The budget ran out before the download could start.
    OutOfTime,
}

impl Outcome {
    fn other(url: Option<&str>, status: DocumentStatus, detail: Option<String>) -> Self {
        Outcome::Other {
            url: url.map(ToOwned::to_owned),
            status,
            detail,
        }
    }
}

/// Emits [`ProgressMsg::Completed`] on drop, including when the run future
/// is dropped before it finishes.
struct CompletionGuard<'a> {
    sink: &'a dyn ProgressSink,
    finished: bool,
}

impl CompletionGuard<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            miner_warn!("run abandoned before it finished");
        }
        self.sink.emit(ProgressMsg::Completed);
    }
}

impl Pipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn PdfExtractor>,
        sleeper: Arc<dyn Sleeper>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            search,
            fetcher,
            extractor,
            sleeper,
            clock,
            time_budget: None,
            max_jitter: Duration::ZERO,
        }
    }

    /// Stop starting new candidates once this much wall-clock time has passed.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = search;
        self
    }

    /// Run the whole pipeline for one request.
    ///
    /// Only invalid input is an error. Search failures, per-document failures and
    /// an exhausted time budget all still produce a report, and the sink always
    /// receives [`ProgressMsg::Completed`] once validation passed, even if this
    /// future is dropped early.
    pub async fn run(
        &self,
        request: &RunRequest,
        sink: &dyn ProgressSink,
    ) -> Result<Report, ValidationError> {
        request.validate()?;
        let started = self.clock.now();
        let keyword = request.keyword.trim();
        let mut report = Report::new(keyword, request.mode, request.include_headers);

        sink.emit(ProgressMsg::RunStarted {
            total: request.limit,
        });
        let completion = CompletionGuard {
            sink,
            finished: false,
        };
        miner_info!(
            "run started: keyword={:?} provider={} limit={} mode={}",
            keyword,
            self.search.name(),
            request.limit,
            request.mode
        );

        let candidates = match self.search.search(keyword, request.limit).await {
            Ok(mut candidates) => {
                candidates.truncate(request.limit);
                candidates
            }
            Err(err) => {
                miner_warn!("search via {} failed: {}", self.search.name(), err);
                report.search_error = Some(err.to_string());
                Vec::new()
            }
        };
        sink.emit(ProgressMsg::CandidatesFound {
            total: candidates.len(),
        });

        let backoff = BackoffPolicy::from_seconds(request.delay_seconds, self.max_jitter);
        for (index, candidate) in candidates.iter().enumerate() {
            if self.budget_exhausted(started, Duration::ZERO) {
                stop_for_budget(&mut report, sink, index, candidates.len());
                break;
            }
            sink.emit(ProgressMsg::CandidateStarted {
                index,
                title: candidate.title.clone(),
            });

            let pause = index > 0 && !backoff.is_disabled();
            let outcome = self
                .process(candidate, request, backoff, pause, started)
                .await;
            let (status, preview) = match outcome {
                Outcome::OutOfTime => {
                    stop_for_budget(&mut report, sink, index, candidates.len());
                    break;
                }
                Outcome::Success { url, body } => {
                    report.push_success(&candidate.title, &url, &body);
                    (DocumentStatus::Success, body)
                }
                Outcome::Other {
                    url,
                    status,
                    detail,
                } => {
                    let preview = detail.clone().unwrap_or_default();
                    report.push_outcome(&candidate.title, url.as_deref(), status, detail);
                    (status, preview)
                }
            };
            miner_debug!("candidate {:?} -> {}", candidate.title, status);
            sink.emit(ProgressMsg::CandidateFinished {
                title: candidate.title.clone(),
                status,
                preview,
            });
        }

        let counts = report.counts();
        miner_info!(
            "run finished: keyword={:?} success={} no_match={} error={} skipped={} blocked={} truncated={}",
            keyword,
            counts.success,
            counts.no_match,
            counts.error,
            counts.skipped,
            counts.blocked,
            report.truncated
        );
        completion.finish();
        Ok(report)
    }

    /// True once the budget is spent, or would be after waiting `ahead` more.
    fn budget_exhausted(&self, started: Duration, ahead: Duration) -> bool {
        self.time_budget.is_some_and(|budget| {
            self.clock
                .now()
                .saturating_sub(started)
                .saturating_add(ahead)
                >= budget
        })
    }

    async fn process(
        &self,
        candidate: &SearchResult,
        request: &RunRequest,
        backoff: BackoffPolicy,
        pause: bool,
        started: Duration,
    ) -> Outcome {
        let url = match self.search.resolve(candidate).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                return Outcome::other(None, DocumentStatus::Skipped, Some("no pdf file".into()))
            }
            Err(err) => return Outcome::other(None, DocumentStatus::Error, Some(err.to_string())),
        };

        if pause {
            let delay = backoff.next_delay(&mut rand::thread_rng());
            if self.budget_exhausted(started, delay) {
                return Outcome::OutOfTime;
            }
            miner_debug!("pausing {:?} before {}", delay, url);
            self.sleeper.sleep(delay).await;
        }
        if self.budget_exhausted(started, Duration::ZERO) {
            return Outcome::OutOfTime;
        }

        let fetched = match self.fetcher.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                let status = if err.is_blocked() {
                    DocumentStatus::Blocked
                } else {
                    DocumentStatus::Error
                };
                miner_warn!("fetch {} failed: {}", url, err);
                return Outcome::other(Some(&url), status, Some(err.to_string()));
            }
        };

        let raw = match self.extract(fetched.bytes).await {
            Ok(raw) => raw,
            Err(err) => {
                miner_warn!("extract {} failed: {}", url, err);
                return Outcome::other(Some(&url), DocumentStatus::Error, Some(err.to_string()));
            }
        };

        if request.require_url && !contains_url(&raw) {
            return Outcome::other(
                Some(&url),
                DocumentStatus::Skipped,
                Some("no links in document".into()),
            );
        }

        let filtered = filter_text(&raw, request.mode);
        let body = match request.line_interval {
            Some(interval) => match inject_separators(&filtered, interval) {
                Ok(segmented) => segmented,
                Err(err) => {
                    return Outcome::other(Some(&url), DocumentStatus::Error, Some(err.to_string()))
                }
            },
            None => filtered,
        };

        if body.trim().is_empty() {
            Outcome::other(Some(&url), DocumentStatus::NoMatch, None)
        } else {
            Outcome::Success { url, body }
        }
    }

    /// Extraction is CPU bound and the parser may panic on hostile input, so it
    /// runs on the blocking pool where a panic surfaces as an error.
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractionError> {
        let extractor = self.extractor.clone();
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
            .await
            .map_err(|err| ExtractionError::Aborted(err.to_string()))??;
        Ok(crate::join_pages(&pages))
    }
}

fn stop_for_budget(report: &mut Report, sink: &dyn ProgressSink, index: usize, total: usize) {
    miner_warn!("time budget exhausted after {} of {} candidates", index, total);
    report.truncated = true;
    sink.emit(ProgressMsg::BudgetExhausted);
}
