//! Executes probes concurrently over one shared HTTP client.

use crate::config::Config;
use crate::error::Result;
use crate::models::{ProbeDescriptor, ProbeFailure, ProbeOutcome, ProbeResult};
use futures::future::join_all;
use indicatif::ProgressBar;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use std::future::Future;
use std::time::{Duration, Instant};

/// Per-run request settings, applied uniformly to every probe.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatchOptions {
    /// Used as both the connect timeout and the read timeout.
    pub timeout: Duration,
    pub follow_redirects: bool,
    /// Read and keep response bodies. Otherwise responses are dropped unread.
    pub capture_body: bool,
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.timeout,
            follow_redirects: config.follow_redirects,
            capture_body: config.capture_body(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProbeDispatcher {
    http_client: Client,
    capture_body: bool,
    progress: Option<ProgressBar>,
}

impl ProbeDispatcher {
    /// Creates a dispatcher with a client whose pool is shared by every probe.
    ///
    /// Certificate verification is switched off for all probes. Many corpus
    /// sites serve self-signed or expired certificates and the run only needs
    /// their status codes, so reachability is chosen over authenticating the
    /// server. Nothing sent by a probe is secret.
    ///
    /// No total request timeout is set: only the connect phase and each read
    /// are bounded.
    pub(crate) fn new(options: DispatchOptions) -> Result<Self> {
        let redirect = if options.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };

        let http_client = Client::builder()
            .connect_timeout(options.timeout)
            .read_timeout(options.timeout)
            .redirect(redirect)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            http_client,
            capture_body: options.capture_body,
            progress: None,
        })
    }

    /// Ticks `bar` once per finished probe.
    pub(crate) fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Runs every probe and returns one result per probe, in input order.
    ///
    /// Each probe is its own tokio task, all started at once. A probe that
    /// fails, times out or panics yields a sentinel outcome and has no effect
    /// on the others.
    pub(crate) async fn dispatch(&self, probes: Vec<ProbeDescriptor>) -> Vec<ProbeResult> {
        let client = self.http_client.clone();
        let capture_body = self.capture_body;
        self.spawn_and_join(probes, move |probe| {
            let client = client.clone();
            async move { execute_probe(&client, &probe, capture_body).await }
        })
        .await
    }

    /// Spawns `task` once per probe and pairs each probe with its outcome.
    ///
    /// A task that panics or is cancelled becomes a `Panicked` sentinel.
    async fn spawn_and_join<F, Fut>(&self, probes: Vec<ProbeDescriptor>, task: F) -> Vec<ProbeResult>
    where
        F: Fn(ProbeDescriptor) -> Fut,
        Fut: Future<Output = ProbeOutcome> + Send + 'static,
    {
        let start_time = Instant::now();
        tracing::info!(target: "dispatch", "Dispatching {} probes", probes.len());

        let handles: Vec<_> = probes
            .iter()
            .map(|probe| {
                let future = task(probe.clone());
                let progress = self.progress.clone();
                tokio::spawn(async move {
                    let outcome = future.await;
                    if let Some(bar) = progress {
                        bar.inc(1);
                    }
                    outcome
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let results: Vec<ProbeResult> = probes
            .into_iter()
            .zip(joined)
            .map(|(probe, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    tracing::error!(target: "dispatch", "[{}] Probe task for {} did not complete: {}", probe.site.name, probe.resolved_uri, e);
                    if let Some(bar) = &self.progress {
                        bar.inc(1);
                    }
                    ProbeOutcome::transport_failure(ProbeFailure::Panicked)
                });
                ProbeResult { probe, outcome }
            })
            .collect();

        let failed = results.iter().filter(|r| r.outcome.is_transport_failure()).count();
        tracing::info!(
            target: "dispatch",
            "Dispatch finished in {:.2?}: {} probes, {} transport failures",
            start_time.elapsed(),
            results.len(),
            failed
        );

        results
    }
}

/// Performs one GET. Every path out of this function is an outcome.
async fn execute_probe(client: &Client, probe: &ProbeDescriptor, capture_body: bool) -> ProbeOutcome {
    let site = &probe.site.name;
    tracing::debug!(target: "probe_task", "[{}] GET {} as {}", site, probe.resolved_uri, probe.username);

    let response = match client
        .get(&probe.resolved_uri)
        .header(USER_AGENT, probe.site.user_agent.as_str())
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let failure = categorize_error(&e);
            tracing::warn!(target: "probe_task", "[{}] Site Connection Error ({:?}) for {}: {}", site, failure, probe.resolved_uri, e);
            return ProbeOutcome::transport_failure(failure);
        }
    };

    let status = response.status().as_u16();
    tracing::debug!(target: "probe_task", "[{}] {} returned {}", site, probe.resolved_uri, status);

    if !capture_body {
        return ProbeOutcome::status(status, None);
    }

    match response.text().await {
        Ok(body) => ProbeOutcome::status(status, Some(body)),
        Err(e) => {
            let failure = if e.is_timeout() {
                ProbeFailure::Timeout
            } else {
                ProbeFailure::Body
            };
            tracing::warn!(target: "probe_task", "[{}] Failed to read body from {} (status {}): {}", site, probe.resolved_uri, status, e);
            ProbeOutcome::transport_failure(failure)
        }
    }
}

fn categorize_error(error: &reqwest::Error) -> ProbeFailure {
    if error.is_timeout() {
        ProbeFailure::Timeout
    } else if error.is_redirect() {
        ProbeFailure::Redirect
    } else if error.is_connect() {
        ProbeFailure::Connect
    } else if error.is_builder() {
        ProbeFailure::Request
    } else if error.is_body() || error.is_decode() {
        ProbeFailure::Body
    } else if error.is_request() {
        ProbeFailure::Connect
    } else {
        ProbeFailure::Other
    }
}
