//! LeadMiner engine: search, download, PDF extraction and the run pipeline.
mod backoff;
mod extract;
mod fetch;
mod filename;
mod persist;
mod pipeline;
mod runs;
mod search;
mod types;

pub use backoff::{BackoffPolicy, Clock, Sleeper, SystemClock, TokioSleeper};
pub use extract::{join_pages, ExtractionError, PdfExtractor, PdfTextExtractor};
pub use fetch::{looks_like_pdf, FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use filename::report_filename;
pub use persist::{ensure_output_dir, PersistError, ReportStore};
pub use pipeline::{Pipeline, RunRequest, ValidationError, MAX_LIMIT};
pub use runs::{NullSink, ProgressSink, RunContext, RunId, RunRegistry, DEFAULT_MAX_RUNS};
pub use search::{
    is_pdf_link, ArchiveOrgSearch, GoogleSearch, ProviderKind, SearchError, SearchProvider,
    SearchResult, ARCHIVE_BASE_URL, GOOGLE_BASE_URL,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
