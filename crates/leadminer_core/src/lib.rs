//! LeadMiner core: pure text filtering, segmenting, report model and progress state machine.
mod filter;
mod msg;
mod preview;
mod report;
mod segment;
mod state;
mod update;

pub use filter::{
    classify, contains_url, email_domains, filter_text, is_generic_email_domain, FilterMode,
    ParseFilterModeError, GENERIC_EMAIL_DOMAINS,
};
pub use msg::ProgressMsg;
pub use preview::{prepare_preview, MAX_PREVIEW_CHARS};
pub use report::{DocumentStatus, Report, ReportEntry, StatusCounts};
pub use segment::{inject_separators, InjectError, SEPARATOR};
pub use state::{ProgressState, STATUS_COMPLETED, STATUS_IDLE};
pub use update::update;
