//! Runs one probe cycle: select sites, generate probes, dispatch them.

use crate::config::Config;
use crate::corpus::filter_sites;
use crate::dispatcher::{DispatchOptions, ProbeDispatcher};
use crate::error::Result;
use crate::generator::{generate_known_probes, generate_probes};
use crate::models::{ProbeDescriptor, ProbeResult, SiteDefinition};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Selects sites and expands them into probes.
///
/// All configuration errors surface here, before any request is made.
pub(crate) fn build_probes(config: &Config, corpus: &[SiteDefinition]) -> Result<Vec<ProbeDescriptor>> {
    let sites: Vec<Arc<SiteDefinition>> = filter_sites(config, corpus)?
        .into_iter()
        .map(Arc::new)
        .collect();

    let probes = if config.validate_knowns {
        tracing::info!("Validating known usernames for {} sites", sites.len());
        generate_known_probes(&sites)
    } else {
        tracing::info!(
            "Checking {} username(s) against {} sites",
            config.usernames.len(),
            sites.len()
        );
        generate_probes(&config.usernames, &sites)
    };

    Ok(probes)
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar
}

/// Builds and dispatches every probe for the run. Returns all results, unfiltered.
pub(crate) async fn process_run(config: &Config, corpus: &[SiteDefinition]) -> Result<Vec<ProbeResult>> {
    let probes = build_probes(config, corpus)?;
    if probes.is_empty() {
        tracing::warn!("No probes to run for the selected sites and usernames");
        return Ok(Vec::new());
    }

    let bar = progress_bar(probes.len());
    let dispatcher = ProbeDispatcher::new(DispatchOptions::from(config))?.with_progress(bar.clone());
    let results = dispatcher.dispatch(probes).await;
    bar.finish_with_message("Probing complete");

    Ok(results)
}
