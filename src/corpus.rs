//! Loading the WhatsMyName site corpus and selecting the sites for a run.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{ACCOUNT_PLACEHOLDER, SiteCorpus, SiteDefinition};
use std::fs;
use std::path::Path;
use url::Url;

/// Reads and parses the corpus file.
///
/// Templates that do not form a URL are logged but kept: the probe for such a
/// site fails at request time and is reported like any other transport failure.
pub(crate) fn load_corpus(path: &Path) -> Result<Vec<SiteDefinition>> {
    let content = fs::read_to_string(path)?;
    let corpus: SiteCorpus = serde_json::from_str(&content)?;

    for site in &corpus.sites {
        if let Err(e) = check_template(site) {
            tracing::warn!(target: "corpus", "Site {} has an unusable uri_check '{}': {}", site.name, site.uri_check, e);
        }
    }

    tracing::info!(target: "corpus", "Loaded {} sites from {}", corpus.sites.len(), path.display());
    Ok(corpus.sites)
}

/// Parses the site's template with a stand-in account name.
pub(crate) fn check_template(site: &SiteDefinition) -> Result<Url> {
    if !site.uri_check.contains(ACCOUNT_PLACEHOLDER) {
        return Err(AppError::Config(format!(
            "uri_check for {} has no {} placeholder",
            site.name, ACCOUNT_PLACEHOLDER
        )));
    }
    let sample = site.uri_check.replacen(ACCOUNT_PLACEHOLDER, "probe", 1);
    Ok(Url::parse(&sample)?)
}

/// Selects the sites to probe.
///
/// Drops invalid entries, stamps the configured user agent on the rest, then
/// applies the category filter and finally the site-name allow-list. An
/// allow-list that matches nothing is an error, not an empty run.
pub(crate) fn filter_sites(config: &Config, corpus: &[SiteDefinition]) -> Result<Vec<SiteDefinition>> {
    let mut sites: Vec<SiteDefinition> = corpus
        .iter()
        .filter(|site| site.valid)
        .cloned()
        .map(|mut site| {
            site.user_agent = config.user_agent.clone();
            site
        })
        .collect();

    if let Some(category) = &config.category {
        let category = category.to_lowercase();
        sites.retain(|site| site.category.to_lowercase() == category);
        tracing::debug!(target: "corpus", "{} sites left after category filter '{}'", sites.len(), category);
    }

    if config.sites.is_empty() {
        return Ok(sites);
    }

    let mut taken = vec![false; sites.len()];
    let mut selected: Vec<SiteDefinition> = Vec::new();
    for requested in &config.sites {
        let requested = requested.to_lowercase();
        for (index, site) in sites.iter().enumerate() {
            if !taken[index] && site.name.to_lowercase() == requested {
                taken[index] = true;
                selected.push(site.clone());
            }
        }
    }

    if selected.is_empty() {
        return Err(AppError::NoSitesMatched {
            sites: config.sites.clone(),
            input_file: config.input_file.clone(),
        });
    }

    tracing::debug!(target: "corpus", "{} sites selected by name", selected.len());
    Ok(selected)
}
