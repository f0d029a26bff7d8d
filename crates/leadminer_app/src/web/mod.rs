//! HTTP front-end: search form, progress stream and report download.

pub mod form;
mod render;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use leadminer_engine::{
    ArchiveOrgSearch, FetchSettings, GoogleSearch, PdfTextExtractor, Pipeline, ProviderKind,
    ReportStore, ReqwestFetcher, RunRegistry, SearchProvider, SystemClock, TokioSleeper,
};
use miner_logging::{miner_info, miner_warn};

use crate::config::{AppConfig, FormDefaults};

pub use routes::router;

/// Search backends the form can choose between.
#[derive(Clone)]
pub struct Providers {
    archive: Arc<dyn SearchProvider>,
    google: Option<Arc<dyn SearchProvider>>,
}

impl Providers {
    pub fn new(archive: Arc<dyn SearchProvider>, google: Option<Arc<dyn SearchProvider>>) -> Self {
        Self { archive, google }
    }

    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn SearchProvider>, String> {
        match kind {
            ProviderKind::Archive => Ok(self.archive.clone()),
            ProviderKind::Google => self.google.clone().ok_or_else(|| {
                "Google search needs GOOGLE_API_KEY and GOOGLE_CSE_ID to be configured".to_string()
            }),
        }
    }
}

/// Everything a request handler needs, shared across connections.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    pipeline: Pipeline,
    providers: Providers,
    runs: RunRegistry,
    reports: ReportStore,
    defaults: FormDefaults,
    stream_poll: Duration,
    stream_idle: Duration,
}

impl AppState {
    pub fn new(
        pipeline: Pipeline,
        providers: Providers,
        reports: ReportStore,
        config: &AppConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                pipeline,
                providers,
                runs: RunRegistry::with_capacity(config.max_runs),
                reports,
                defaults: config.defaults.clone(),
                stream_poll: config.stream_poll(),
                stream_idle: config.stream_idle(),
            }),
        }
    }

    /// Wire the real network collaborators from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let archive: Arc<dyn SearchProvider> = Arc::new(ArchiveOrgSearch::new(
            &config.archive_base_url,
            config.search_timeout(),
        )?);
        let google = match config.google_credentials() {
            Some((key, cx)) => {
                match GoogleSearch::new(&config.google_base_url, key, cx, config.search_timeout()) {
                    Ok(google) => Some(Arc::new(google) as Arc<dyn SearchProvider>),
                    Err(err) => {
                        miner_warn!("google search disabled: {}", err);
                        None
                    }
                }
            }
            None => {
                miner_info!("google search disabled: no credentials configured");
                None
            }
        };

        let fetcher = ReqwestFetcher::new(FetchSettings {
            request_timeout: config.fetch_timeout(),
            ..FetchSettings::default()
        });
        let pipeline = Pipeline::new(
            archive.clone(),
            Arc::new(fetcher),
            Arc::new(PdfTextExtractor),
            Arc::new(TokioSleeper),
            Arc::new(SystemClock::new()),
        )
        .with_time_budget(config.time_budget())
        .with_max_jitter(config.max_jitter());

        Ok(Self::new(
            pipeline,
            Providers::new(archive, google),
            ReportStore::new(config.output_dir.clone()),
            config,
        ))
    }

    fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    fn providers(&self) -> &Providers {
        &self.inner.providers
    }

    fn runs(&self) -> &RunRegistry {
        &self.inner.runs
    }

    fn reports(&self) -> &ReportStore {
        &self.inner.reports
    }

    fn defaults(&self) -> &FormDefaults {
        &self.inner.defaults
    }
}
