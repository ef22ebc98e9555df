//! Renders filtered results as a terminal table or as JSON.

use crate::classifier::Verdict;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::models::{ProbeRecord, ProbeResult};
use std::fmt::Write as _;

const SITE_WIDTH: usize = 28;
const USERNAME_WIDTH: usize = 20;
const URL_WIDTH: usize = 60;

/// Renders `shown` in the requested format.
///
/// `total` is the number of probes dispatched, used in the table summary.
/// Raw bodies are only included when `verbose` is set.
pub(crate) fn render(shown: &[&ProbeResult], total: usize, format: OutputFormat, verbose: bool) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(shown, verbose),
        OutputFormat::Table => Ok(render_table(shown, total, verbose)),
    }
}

fn render_json(shown: &[&ProbeResult], verbose: bool) -> Result<String> {
    let records: Vec<ProbeRecord> = shown
        .iter()
        .map(|result| {
            let mut record = ProbeRecord::from(*result);
            if !verbose {
                record.raw_response_data = None;
            }
            record
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Found => "FOUND",
        Verdict::NotFound => "NOT FOUND",
        Verdict::Unexpected => "UNEXPECTED",
        Verdict::TransportFailure => "ERROR",
    }
}

fn render_table(shown: &[&ProbeResult], total: usize, verbose: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<sw$} {:<uw$} {:<7} {:<11} {}",
        "SITE",
        "USERNAME",
        "STATUS",
        "VERDICT",
        "URL",
        sw = SITE_WIDTH,
        uw = USERNAME_WIDTH
    );
    let _ = writeln!(out, "{}", "=".repeat(SITE_WIDTH + USERNAME_WIDTH + URL_WIDTH + 21));

    for result in shown {
        let _ = writeln!(
            out,
            "{:<sw$} {:<uw$} {:<7} {:<11} {}",
            truncate(&result.probe.site.name, SITE_WIDTH),
            truncate(&result.probe.username, USERNAME_WIDTH),
            result.outcome.status_code,
            verdict_label(result.verdict()),
            truncate(&result.probe.resolved_uri, URL_WIDTH),
            sw = SITE_WIDTH,
            uw = USERNAME_WIDTH
        );
        if verbose {
            if let Some(body) = &result.outcome.raw_body {
                let _ = writeln!(out, "{}", body);
            }
        }
    }

    let count = |verdict: Verdict| shown.iter().filter(|r| r.verdict() == verdict).count();
    let _ = writeln!(out);
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "   Found: {}", count(Verdict::Found));
    let _ = writeln!(out, "   Not found: {}", count(Verdict::NotFound));
    let _ = writeln!(out, "   Unexpected status: {}", count(Verdict::Unexpected));
    let _ = writeln!(out, "   Errors: {}", count(Verdict::TransportFailure));
    let _ = writeln!(out, "   Shown: {} of {} probes", shown.len(), total);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProbeDescriptor, ProbeFailure, ProbeOutcome, SiteDefinition};
    use std::sync::Arc;

    fn result(status: Option<u16>, body: Option<&str>) -> ProbeResult {
        let outcome = match status {
            Some(code) => ProbeOutcome::status(code, body.map(str::to_string)),
            None => ProbeOutcome::transport_failure(ProbeFailure::Timeout),
        };
        ProbeResult {
            probe: ProbeDescriptor {
                site: Arc::new(SiteDefinition {
                    name: "ExampleSite".to_string(),
                    category: "misc".to_string(),
                    uri_check: "https://example.com/{account}".to_string(),
                    e_code: 200,
                    m_code: 404,
                    known: vec![],
                    valid: true,
                    user_agent: String::new(),
                }),
                username: "alice".to_string(),
                resolved_uri: "https://example.com/alice".to_string(),
            },
            outcome,
        }
    }

    #[test]
    fn test_table_rows_and_summary() {
        let found = result(Some(200), None);
        let failed = result(None, None);
        let table = render(&[&found, &failed], 5, OutputFormat::Table, false).unwrap();

        assert!(table.contains("ExampleSite"));
        assert!(table.contains("FOUND"));
        assert!(table.contains("ERROR"));
        assert!(table.contains("-1"));
        assert!(table.contains("Shown: 2 of 5 probes"));
        assert!(table.contains("Found: 1"));
        assert!(table.contains("Errors: 1"));
    }

    #[test]
    fn test_table_prints_body_only_when_verbose() {
        let found = result(Some(200), Some("<html>profile</html>"));
        let quiet = render(&[&found], 1, OutputFormat::Table, false).unwrap();
        assert!(!quiet.contains("<html>profile</html>"));

        let loud = render(&[&found], 1, OutputFormat::Table, true).unwrap();
        assert!(loud.contains("<html>profile</html>"));
    }

    #[test]
    fn test_json_output() {
        let missing = result(Some(404), Some("gone"));
        let json = render(&[&missing], 1, OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["url"], "https://example.com/alice");
        assert_eq!(value[0]["http_status_code"], 404);
        assert_eq!(value[0]["verdict"], "not_found");
        assert!(value[0].get("raw_response_data").is_none());

        let verbose = render(&[&missing], 1, OutputFormat::Json, true).unwrap();
        assert!(verbose.contains("\"raw_response_data\": \"gone\""));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ääääääääääää", 6), "äää...");
    }
}
