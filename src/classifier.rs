//! Maps probe outcomes to verdicts and filters results by output mode.

use crate::models::ProbeResult;
use serde::{Deserialize, Serialize};

/// Which results the caller wants to see.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum OutputMode {
    /// Everything, including transport failures.
    All,
    /// Only results whose status matched the site's `e_code`.
    #[default]
    Found,
    /// Only results whose status matched the site's `m_code`.
    NotFound,
}

/// How a single result reads against its site's declared codes.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Verdict {
    Found,
    NotFound,
    /// A real HTTP status that is neither `e_code` nor `m_code`.
    Unexpected,
    TransportFailure,
}

impl ProbeResult {
    pub(crate) fn verdict(&self) -> Verdict {
        let status = self.outcome.status_code;
        let site = &self.probe.site;
        if self.outcome.is_transport_failure() {
            Verdict::TransportFailure
        } else if status == i32::from(site.e_code) {
            Verdict::Found
        } else if status == i32::from(site.m_code) {
            Verdict::NotFound
        } else {
            Verdict::Unexpected
        }
    }

    /// Whether this result belongs in the given view.
    ///
    /// Compares raw status codes, so the `-1` sentinel can never satisfy
    /// `Found` or `NotFound`.
    pub(crate) fn matches(&self, mode: OutputMode) -> bool {
        let status = self.outcome.status_code;
        let site = &self.probe.site;
        match mode {
            OutputMode::All => true,
            OutputMode::NotFound => status == i32::from(site.m_code),
            OutputMode::Found => status == i32::from(site.e_code),
        }
    }
}

/// Returns the subset of `results` visible under `mode`, in input order.
pub(crate) fn filter_results(mode: OutputMode, results: &[ProbeResult]) -> Vec<&ProbeResult> {
    let filtered: Vec<&ProbeResult> = results.iter().filter(|r| r.matches(mode)).collect();
    tracing::debug!(
        target: "classifier",
        "Classifier kept {} of {} results for mode {:?}",
        filtered.len(),
        results.len(),
        mode
    );
    filtered
}
