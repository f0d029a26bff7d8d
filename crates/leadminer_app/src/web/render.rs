//! Server-side HTML for the single search page.

use std::fmt::Write;

use leadminer_core::{Report, SEPARATOR};
use leadminer_engine::RunId;

use super::form::FormValues;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; color: #222; }
h1 { font-size: 1.5rem; }
form { display: grid; grid-template-columns: 10rem 1fr; gap: .5rem 1rem; align-items: center; }
form button { grid-column: 2; justify-self: start; padding: .4rem 1.2rem; }
.error { background: #fdecea; border: 1px solid #e0a0a0; padding: .5rem 1rem; }
.notice { background: #fff7e0; border: 1px solid #e0c080; padding: .5rem 1rem; }
#progress { margin: 1rem 0; font-family: monospace; white-space: pre-wrap; }
#progress-bar { width: 100%; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #ccc; padding: .3rem .5rem; text-align: left; vertical-align: top; }
td.status-Success { color: #1a7f37; }
td.status-Error, td.status-Blocked { color: #b42318; }
textarea { width: 100%; height: 24rem; font-family: monospace; }
"#;

const SCRIPT: &str = r#"
(function () {
  var form = document.getElementById('search');
  var box = document.getElementById('progress');
  var bar = document.getElementById('progress-bar');
  form.addEventListener('submit', function () {
    var run = form.querySelector('input[name=run_id]').value;
    var source = new EventSource('/progress-stream?run=' + encodeURIComponent(run));
    box.hidden = false;
    source.onmessage = function (event) {
      var state = JSON.parse(event.data);
      bar.max = Math.max(state.total, 1);
      bar.value = state.current;
      box.querySelector('.status').textContent =
        state.current + ' / ' + state.total + '  ' + state.status;
      box.querySelector('.preview').textContent = state.preview;
      if (state.status === 'Completed') { source.close(); }
    };
    source.onerror = function () { source.close(); };
  });
})();
"#;

const FILTER_MODES: [(&str, &str); 3] = [
    ("leads_only", "Leads only (business emails and links)"),
    ("urls_only", "Links only"),
    ("raw_mode", "Raw text"),
];

const PROVIDERS: [(&str, &str); 2] = [("archive", "Archive.org"), ("google", "Google")];

/// Escape text for use inside HTML element content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Finished run shown under the form.
pub struct Results<'a> {
    pub report: &'a Report,
    pub run_id: RunId,
    pub downloadable: bool,
}

pub fn page(
    values: &FormValues,
    run_id: RunId,
    error: Option<&str>,
    results: Option<&Results<'_>>,
) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>LeadMiner</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<h1>LeadMiner</h1>\n");

    if let Some(message) = error {
        let _ = writeln!(html, "<p class=\"error\">{}</p>", escape(message));
    }

    form(&mut html, values, run_id);

    html.push_str(
        "<div id=\"progress\" hidden>\n<progress id=\"progress-bar\" value=\"0\" max=\"1\"></progress>\n\
         <div class=\"status\"></div>\n<div class=\"preview\"></div>\n</div>\n",
    );

    if let Some(results) = results {
        report_section(&mut html, results);
    }

    html.push_str("<script>");
    html.push_str(SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn form(html: &mut String, values: &FormValues, run_id: RunId) {
    html.push_str("<form id=\"search\" method=\"post\" action=\"/\">\n");
    let _ = writeln!(html, "<input type=\"hidden\" name=\"run_id\" value=\"{run_id}\">");
    let _ = writeln!(
        html,
        "<label for=\"keyword\">Keyword</label><input id=\"keyword\" name=\"keyword\" value=\"{}\" required>",
        escape(&values.keyword)
    );
    let _ = writeln!(
        html,
        "<label for=\"limit\">Documents</label><input id=\"limit\" name=\"limit\" type=\"number\" min=\"1\" max=\"100\" value=\"{}\">",
        escape(&values.limit)
    );
    let _ = writeln!(
        html,
        "<label for=\"provider\">Search</label>{}",
        select("provider", &PROVIDERS, &values.provider)
    );
    let _ = writeln!(
        html,
        "<label for=\"filter_mode\">Filter</label>{}",
        select("filter_mode", &FILTER_MODES, &values.filter_mode)
    );
    let _ = writeln!(
        html,
        "<label for=\"delay\">Delay (s)</label><input id=\"delay\" name=\"delay\" type=\"number\" min=\"0\" max=\"60\" step=\"0.1\" value=\"{}\">",
        escape(&values.delay)
    );
    let _ = writeln!(
        html,
        "<label for=\"segment\">Segment output</label><span>{} every <input id=\"line_interval\" name=\"line_interval\" type=\"number\" min=\"1\" value=\"{}\"> lines</span>",
        checkbox("segment", values.segment),
        escape(&values.line_interval)
    );
    let _ = writeln!(
        html,
        "<label for=\"require_url\">Require links</label>{}",
        checkbox("require_url", values.require_url)
    );
    html.push_str("<button type=\"submit\">Mine</button>\n</form>\n");
}

fn select(name: &str, options: &[(&str, &str)], selected: &str) -> String {
    let mut out = format!("<select id=\"{name}\" name=\"{name}\">");
    for (value, label) in options {
        let marker = if *value == selected { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{value}\"{marker}>{label}</option>");
    }
    out.push_str("</select>");
    out
}

fn checkbox(name: &str, checked: bool) -> String {
    let marker = if checked { " checked" } else { "" };
    format!("<input id=\"{name}\" name=\"{name}\" type=\"checkbox\"{marker}>")
}

fn report_section(html: &mut String, results: &Results<'_>) {
    let report = results.report;
    let counts = report.counts();

    let _ = writeln!(
        html,
        "<h2>Results for &ldquo;{}&rdquo;</h2>",
        escape(&report.keyword)
    );
    if let Some(err) = &report.search_error {
        let _ = writeln!(html, "<p class=\"error\">Search failed: {}</p>", escape(err));
    }
    if report.truncated {
        html.push_str(
            "<p class=\"notice\">Time budget reached; the report covers only the documents processed so far.</p>\n",
        );
    }
    let _ = writeln!(
        html,
        "<p class=\"counts\">Success: {} &middot; No Match: {} &middot; Error: {} &middot; Skipped: {} &middot; Blocked: {}</p>",
        counts.success, counts.no_match, counts.error, counts.skipped, counts.blocked
    );

    if report.entries.is_empty() {
        html.push_str("<p>No documents found.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Document</th><th>Status</th><th>Detail</th></tr></thead>\n<tbody>\n");
        for entry in &report.entries {
            let title = match &entry.url {
                Some(url) => format!(
                    "<a href=\"{}\" rel=\"noreferrer\">{}</a>",
                    escape(url),
                    escape(&entry.title)
                ),
                None => escape(&entry.title),
            };
            let _ = writeln!(
                html,
                "<tr><td>{title}</td><td class=\"status-{}\">{}</td><td>{}</td></tr>",
                entry.status.label().replace(' ', ""),
                entry.status,
                escape(entry.detail.as_deref().unwrap_or(""))
            );
        }
        html.push_str("</tbody>\n</table>\n");
    }

    if results.downloadable {
        let _ = writeln!(
            html,
            "<p><a href=\"/download?run={}\">Download report</a></p>",
            results.run_id
        );
    }
    let _ = writeln!(
        html,
        "<p>Sections are divided by <code>{}</code> lines.</p>",
        escape(SEPARATOR)
    );
    let _ = writeln!(
        html,
        "<textarea readonly>{}</textarea>",
        escape(&report.text)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormDefaults;
    use leadminer_core::{DocumentStatus, FilterMode};

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn form_is_prefilled_and_carries_run_id() {
        let id = RunId::new();
        let html = page(&FormValues::from_defaults(&FormDefaults::default()), id, None, None);
        assert!(html.contains(&format!("name=\"run_id\" value=\"{id}\"")));
        assert!(html.contains("<option value=\"leads_only\" selected>"));
        assert!(html.contains("<option value=\"archive\" selected>"));
        assert!(html.contains("name=\"limit\" type=\"number\" min=\"1\" max=\"100\" value=\"10\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn results_show_rows_counts_and_escaped_text() {
        let mut report = Report::new("dentists", FilterMode::UrlsOnly, true);
        report.push_success("Guide <2020>", "https://a.org/g.pdf", "visit www.smile.com");
        report.push_outcome(
            "Locked",
            Some("https://b.org/l.pdf"),
            DocumentStatus::Blocked,
            Some("http status 403".into()),
        );
        let id = RunId::new();
        let results = Results {
            report: &report,
            run_id: id,
            downloadable: true,
        };
        let html = page(
            &FormValues::from_defaults(&FormDefaults::default()),
            RunId::new(),
            None,
            Some(&results),
        );
        assert!(html.contains("Guide &lt;2020&gt;"));
        assert!(html.contains("<td class=\"status-Blocked\">Blocked</td>"));
        assert!(html.contains("Success: 1 &middot; No Match: 0"));
        assert!(html.contains(&format!("/download?run={id}")));
        assert!(html.contains("visit www.smile.com"));
    }

    #[test]
    fn search_failure_and_truncation_are_called_out() {
        let mut report = Report::new("x", FilterMode::LeadsOnly, true);
        report.search_error = Some("provider down".into());
        report.truncated = true;
        let results = Results {
            report: &report,
            run_id: RunId::new(),
            downloadable: false,
        };
        let html = page(
            &FormValues::from_defaults(&FormDefaults::default()),
            RunId::new(),
            Some("bad <input>"),
            Some(&results),
        );
        assert!(html.contains("Search failed: provider down"));
        assert!(html.contains("Time budget reached"));
        assert!(html.contains("bad &lt;input&gt;"));
        assert!(html.contains("No documents found."));
        assert!(!html.contains("/download?run="));
    }
}
