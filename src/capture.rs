//! Writes a file per not-found result so the raw response can be inspected later.

use crate::classifier::{OutputMode, filter_results};
use crate::error::Result;
use crate::models::{ProbeRecord, ProbeResult};
use std::fs;
use std::path::{Path, PathBuf};

const CAPTURE_SUBDIR: &str = "whatsmyname";

/// Replaces characters that would let a name leave its directory or are not portable in file names.
fn sanitize_path_component(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".repeat(cleaned.len().max(1)),
        _ => cleaned,
    }
}

/// `<base>/whatsmyname/<username>/<site>.json`
pub(crate) fn capture_path(base: &Path, username: &str, site_name: &str) -> PathBuf {
    base.join(CAPTURE_SUBDIR)
        .join(sanitize_path_component(username))
        .join(format!("{}.json", sanitize_path_component(site_name)))
}

/// Writes one JSON file per result matching the site's missing code.
///
/// A stale file from an earlier run at the same path is removed first.
///
/// # Returns
/// * The paths written, in result order.
pub(crate) fn capture_errors(base: &Path, results: &[ProbeResult]) -> Result<Vec<PathBuf>> {
    let not_found = filter_results(OutputMode::NotFound, results);
    let mut written = Vec::with_capacity(not_found.len());

    for result in not_found {
        let path = capture_path(base, &result.probe.username, &result.probe.site.name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        if path.exists() {
            tracing::info!(target: "capture", "Removing stale capture error file {}", path.display());
            fs::remove_file(&path)?;
        }

        tracing::info!(target: "capture", "Writing capture error file {}", path.display());
        let records = [ProbeRecord::from(result)];
        fs::write(&path, serde_json::to_string_pretty(&records)?)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProbeDescriptor, ProbeFailure, ProbeOutcome, SiteDefinition};
    use std::sync::Arc;

    fn result(site_name: &str, username: &str, outcome: ProbeOutcome) -> ProbeResult {
        ProbeResult {
            probe: ProbeDescriptor {
                site: Arc::new(SiteDefinition {
                    name: site_name.to_string(),
                    category: "misc".to_string(),
                    uri_check: "https://example.com/{account}".to_string(),
                    e_code: 200,
                    m_code: 404,
                    known: vec![],
                    valid: true,
                    user_agent: String::new(),
                }),
                username: username.to_string(),
                resolved_uri: format!("https://example.com/{}", username),
            },
            outcome,
        }
    }

    #[test]
    fn test_capture_path_layout() {
        let path = capture_path(Path::new("/tmp"), "alice", "ExampleSite");
        assert_eq!(path, PathBuf::from("/tmp/whatsmyname/alice/ExampleSite.json"));
    }

    #[test]
    fn test_capture_path_cannot_escape() {
        let path = capture_path(Path::new("/tmp"), "..", "../../etc/passwd");
        assert_eq!(path, PathBuf::from("/tmp/whatsmyname/__/.._.._etc_passwd.json"));
        assert!(path.starts_with("/tmp/whatsmyname"));
    }

    #[test]
    fn test_only_not_found_results_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![
            result("Found", "alice", ProbeOutcome::status(200, Some("hi".to_string()))),
            result("Missing", "alice", ProbeOutcome::status(404, Some("nope".to_string()))),
            result("Down", "alice", ProbeOutcome::transport_failure(ProbeFailure::Connect)),
        ];

        let written = capture_errors(dir.path(), &results).unwrap();
        assert_eq!(written, vec![dir.path().join("whatsmyname/alice/Missing.json")]);

        let content = fs::read_to_string(&written[0]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["site"], "Missing");
        assert_eq!(value[0]["http_status_code"], 404);
        assert_eq!(value[0]["raw_response_data"], "nope");
    }

    #[test]
    fn test_stale_capture_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let stale = capture_path(dir.path(), "alice", "Missing");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "stale content that is much longer than the new file would ever be").unwrap();

        let results = vec![result("Missing", "alice", ProbeOutcome::status(404, None))];
        capture_errors(dir.path(), &results).unwrap();

        let content = fs::read_to_string(&stale).unwrap();
        assert!(!content.contains("stale"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["username"], "alice");
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("Archive.org"), "Archive.org");
        assert_eq!(sanitize_path_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_path_component(""), "_");
        assert_eq!(sanitize_path_component("."), "_");
    }
}
