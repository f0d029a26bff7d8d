use std::panic::{self, AssertUnwindSafe};

use miner_logging::{miner_debug, miner_warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("pdf parsing failed: {0}")]
    PdfParsing(String),
    #[error("pdf extraction aborted: {0}")]
    Aborted(String),
}

/// Turns raw PDF bytes into per-page text. Pages may come back empty.
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Pure-Rust text extraction for PDFs with an embedded text layer.
///
/// `pdf-extract` reads the whole document in one go and gives up on the first
/// bad page. When that happens the document is reloaded and read page by page,
/// so one unreadable page only costs that page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let whole = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes));
        let reason = match whole {
            Ok(Ok(pages)) => return Ok(pages),
            Ok(Err(err)) => err.to_string(),
            Err(_) => "parser panicked".to_string(),
        };
        miner_debug!("whole-document extraction failed ({}), reading page by page", reason);

        let doc = lopdf::Document::load_mem(pdf_bytes)
            .map_err(|err| ExtractionError::PdfParsing(format!("{reason}; {err}")))?;
        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(read_each_page(&numbers, |number| {
            panic::catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[number])))
                .map_err(|_| "parser panicked".to_string())?
                .map_err(|err| err.to_string())
        }))
    }
}

/// Reads every page; a page that fails becomes an empty string.
fn read_each_page<F>(numbers: &[u32], mut read: F) -> Vec<String>
where
    F: FnMut(u32) -> Result<String, String>,
{
    numbers
        .iter()
        .map(|&number| {
            read(number).unwrap_or_else(|err| {
                miner_warn!("page {} unreadable: {}", number, err);
                String::new()
            })
        })
        .collect()
}

/// Concatenate page texts with newlines; pages without text contribute nothing.
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim_end())
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
