/// Marker line emitted between segments.
pub const SEPARATOR: &str = "__SEP__";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("line interval must be positive, got {0}")]
    InvalidArgument(i64),
}

/// Re-emit the non-blank, trimmed lines of `text` with a [`SEPARATOR`] line after
/// every `interval`-th line. No separator follows the final line.
pub fn inject_separators(text: &str, interval: i64) -> Result<String, InjectError> {
    let step = usize::try_from(interval)
        .ok()
        .filter(|step| *step > 0)
        .ok_or(InjectError::InvalidArgument(interval))?;

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut out = Vec::with_capacity(lines.len() + lines.len() / step);
    for (i, line) in lines.iter().enumerate() {
        out.push(*line);
        let emitted = i + 1;
        if emitted % step == 0 && emitted < lines.len() {
            out.push(SEPARATOR);
        }
    }
    Ok(out.join("\n"))
}
