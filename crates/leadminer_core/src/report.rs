use std::fmt;

use serde::Serialize;

use crate::FilterMode;

const TITLE_RULE: &str = "--------------------";
const DOCUMENT_RULE: &str = "========================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentStatus {
    Success,
    NoMatch,
    Error,
    Skipped,
    Blocked,
}

impl DocumentStatus {
    pub fn label(self) -> &'static str {
        match self {
            DocumentStatus::Success => "Success",
            DocumentStatus::NoMatch => "No Match",
            DocumentStatus::Error => "Error",
            DocumentStatus::Skipped => "Skipped",
            DocumentStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub title: String,
    pub url: Option<String>,
    pub status: DocumentStatus,
    /// Failure or skip reason, for display only.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub success: usize,
    pub no_match: usize,
    pub error: usize,
    pub skipped: usize,
    pub blocked: usize,
}

/// Outcome of one run: per-document rows plus the concatenated text of every
/// successful document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub keyword: String,
    pub mode: FilterMode,
    pub entries: Vec<ReportEntry>,
    pub text: String,
    /// Set when the search provider itself failed (as opposed to finding nothing).
    pub search_error: Option<String>,
    /// Set when the run stopped early on its time budget.
    pub truncated: bool,
    #[serde(skip)]
    include_headers: bool,
}

impl Report {
    pub fn new(keyword: &str, mode: FilterMode, include_headers: bool) -> Self {
        let text = format!(
            "--- DATA COLLECTION: {} | FILTER: {} ---\n\n",
            keyword.to_uppercase(),
            mode
        );
        Self {
            keyword: keyword.to_string(),
            mode,
            entries: Vec::new(),
            text,
            search_error: None,
            truncated: false,
            include_headers,
        }
    }

    /// Append a document body to the text blob and record it as a success.
    pub fn push_success(&mut self, title: &str, url: &str, body: &str) {
        if self.include_headers {
            self.text.push_str(&format!(
                "SOURCE: {url}\nTITLE: {title}\n{TITLE_RULE}\n{body}\n\n{DOCUMENT_RULE}\n\n"
            ));
        } else {
            self.text.push_str(body);
            self.text.push_str("\n\n");
        }
        self.entries.push(ReportEntry {
            title: title.to_string(),
            url: Some(url.to_string()),
            status: DocumentStatus::Success,
            detail: None,
        });
    }

    /// Record a document that contributed no text.
    pub fn push_outcome(
        &mut self,
        title: &str,
        url: Option<&str>,
        status: DocumentStatus,
        detail: Option<String>,
    ) {
        self.entries.push(ReportEntry {
            title: title.to_string(),
            url: url.map(ToOwned::to_owned),
            status,
            detail,
        });
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in &self.entries {
            match entry.status {
                DocumentStatus::Success => counts.success += 1,
                DocumentStatus::NoMatch => counts.no_match += 1,
                DocumentStatus::Error => counts.error += 1,
                DocumentStatus::Skipped => counts.skipped += 1,
                DocumentStatus::Blocked => counts.blocked += 1,
            }
        }
        counts
    }

    pub fn has_content(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.status == DocumentStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_names_keyword_and_mode() {
        let report = Report::new("solar farms", FilterMode::UrlsOnly, true);
        assert_eq!(
            report.text,
            "--- DATA COLLECTION: SOLAR FARMS | FILTER: urls_only ---\n\n"
        );
        assert!(!report.has_content());
    }

    #[test]
    fn success_block_carries_source_and_title() {
        let mut report = Report::new("k", FilterMode::LeadsOnly, true);
        report.push_success("Annual Report", "https://x.org/a.pdf", "www.acme.com");
        assert!(report.text.ends_with(
            "SOURCE: https://x.org/a.pdf\nTITLE: Annual Report\n--------------------\nwww.acme.com\n\n========================================\n\n"
        ));
        assert!(report.has_content());
    }

    #[test]
    fn headerless_report_appends_bodies_only() {
        let mut report = Report::new("k", FilterMode::NoFilter, false);
        report.push_success("T", "https://x.org/a.pdf", "line");
        assert_eq!(
            report.text,
            "--- DATA COLLECTION: K | FILTER: no_filter ---\n\nline\n\n"
        );
    }

    #[test]
    fn counts_tally_each_status() {
        let mut report = Report::new("k", FilterMode::LeadsOnly, true);
        report.push_success("a", "u", "b");
        report.push_outcome("b", None, DocumentStatus::Skipped, Some("no pdf".into()));
        report.push_outcome("c", Some("u2"), DocumentStatus::Blocked, None);
        report.push_outcome("d", Some("u3"), DocumentStatus::Blocked, None);
        report.push_outcome("e", Some("u4"), DocumentStatus::NoMatch, None);
        assert_eq!(
            report.counts(),
            StatusCounts {
                success: 1,
                no_match: 1,
                error: 0,
                skipped: 1,
                blocked: 2,
            }
        );
    }

    #[test]
    fn status_labels_match_display() {
        assert_eq!(DocumentStatus::NoMatch.to_string(), "No Match");
        assert_eq!(DocumentStatus::Blocked.label(), "Blocked");
    }
}
