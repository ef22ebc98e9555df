//! Defines the core data structures used in the whatsmyname-probe application.

use crate::classifier::Verdict;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The token in a site's `uri_check` template that stands for the account name.
pub(crate) const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Status code recorded for a probe that never produced an HTTP response.
pub(crate) const TRANSPORT_FAILURE_STATUS: i32 = -1;

/// Top level shape of the WhatsMyName corpus file.
/// Only the `sites` array is used; licence and author metadata are ignored.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct SiteCorpus {
    #[serde(default)]
    pub sites: Vec<SiteDefinition>,
}

/// A single site entry from the corpus.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct SiteDefinition {
    /// Unique site identifier, compared case-insensitively.
    pub name: String,
    /// Free-text grouping label (e.g. "social", "coding").
    #[serde(rename = "cat", default)]
    pub category: String,
    /// URL template containing exactly one `{account}` placeholder.
    pub uri_check: String,
    /// Status code meaning the account exists.
    pub e_code: u16,
    /// Status code meaning the account is absent.
    pub m_code: u16,
    /// Usernames previously recorded as registered on this site.
    #[serde(default)]
    pub known: Vec<String>,
    /// Entries marked invalid are never probed.
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// Assigned from the run configuration before probes are generated.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
}

fn default_valid() -> bool {
    true
}

/// One concrete request to make: a username checked against a site.
#[derive(Debug, Clone)]
pub(crate) struct ProbeDescriptor {
    /// The site the probe was generated from. Shared, never mutated.
    pub site: Arc<SiteDefinition>,
    /// The account name under test.
    pub username: String,
    /// `uri_check` with the placeholder replaced by `username`.
    pub resolved_uri: String,
}

/// Why a probe ended without a usable HTTP status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ProbeFailure {
    /// Connect or read phase exceeded the configured timeout.
    Timeout,
    /// Connection refused/reset, DNS or TLS handshake failure.
    Connect,
    /// The redirect policy gave up (e.g. a redirect loop).
    Redirect,
    /// Headers arrived but the body could not be read.
    Body,
    /// The request could not be built or sent (e.g. malformed URL).
    Request,
    /// The probe task panicked.
    Panicked,
    /// Anything reqwest did not classify further.
    Other,
}

/// What a single probe produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeOutcome {
    /// HTTP status, or `TRANSPORT_FAILURE_STATUS`.
    pub status_code: i32,
    /// Response text, only kept in verbose or error-capture runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
    /// Set whenever `status_code` is the sentinel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    /// An outcome carrying a real HTTP status.
    pub(crate) fn status(status_code: u16, raw_body: Option<String>) -> Self {
        Self {
            status_code: i32::from(status_code),
            raw_body,
            failure: None,
        }
    }

    /// An outcome for a probe that never got a usable response.
    pub(crate) fn transport_failure(failure: ProbeFailure) -> Self {
        Self {
            status_code: TRANSPORT_FAILURE_STATUS,
            raw_body: None,
            failure: Some(failure),
        }
    }

    pub(crate) fn is_transport_failure(&self) -> bool {
        self.status_code == TRANSPORT_FAILURE_STATUS
    }
}

/// A descriptor paired with its outcome; the unit handed to reporting.
#[derive(Debug, Clone)]
pub(crate) struct ProbeResult {
    pub probe: ProbeDescriptor,
    pub outcome: ProbeOutcome,
}

/// Flat, serializable view of a `ProbeResult` for reports and capture files.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct ProbeRecord<'a> {
    pub site: &'a str,
    pub category: &'a str,
    pub username: &'a str,
    pub url: &'a str,
    pub e_code: u16,
    pub m_code: u16,
    pub http_status_code: i32,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response_data: Option<&'a str>,
}

impl<'a> From<&'a ProbeResult> for ProbeRecord<'a> {
    fn from(result: &'a ProbeResult) -> Self {
        let site = &result.probe.site;
        ProbeRecord {
            site: &site.name,
            category: &site.category,
            username: &result.probe.username,
            url: &result.probe.resolved_uri,
            e_code: site.e_code,
            m_code: site.m_code,
            http_status_code: result.outcome.status_code,
            verdict: result.verdict(),
            failure: result.outcome.failure,
            raw_response_data: result.outcome.raw_body.as_deref(),
        }
    }
}
