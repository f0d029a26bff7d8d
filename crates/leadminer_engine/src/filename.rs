use sha2::{Digest, Sha256};

use crate::RunId;

const MAX_KEYWORD_CHARS: usize = 60;

/// Windows-safe, per-run report filename: `leads_{keyword}--{short_hash(run)}.txt`
pub fn report_filename(keyword: &str, run_id: RunId) -> String {
    let sanitized = sanitize_keyword(keyword);
    let hash = short_hash(&run_id.to_string());
    format!("leads_{sanitized}--{hash}.txt")
}

fn sanitize_keyword(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.trim().chars() {
        let mapped = if c.is_alphanumeric() || c == '-' {
            c.to_ascii_lowercase()
        } else {
            '_'
        };
        if mapped == '_' {
            if !prev_underscore {
                compacted.push('_');
            }
            prev_underscore = true;
        } else {
            compacted.push(mapped);
            prev_underscore = false;
        }
    }
    let mut cleaned: String = compacted
        .trim_matches('_')
        .chars()
        .take(MAX_KEYWORD_CHARS)
        .collect();
    if cleaned.is_empty() {
        cleaned = "search".to_string();
    }
    cleaned
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
