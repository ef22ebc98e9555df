//! Expands usernames and sites into concrete probe descriptors.

use crate::models::{ACCOUNT_PLACEHOLDER, ProbeDescriptor, SiteDefinition};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// A template whose account name lands straight after the scheme, i.e. in the hostname.
static HOST_PREFIX_TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\{account\}")
        .expect("Failed to compile host prefix regex pattern. This should not happen.")
});

/// True when the site puts the account name at the start of the hostname,
/// e.g. `https://{account}.example.com`.
pub(crate) fn is_host_prefix_template(uri_check: &str) -> bool {
    HOST_PREFIX_TEMPLATE.is_match(uri_check)
}

/// Dotted usernames are not valid as a single hostname label, so such pairs are never probed.
fn is_eligible(username: &str, site: &SiteDefinition) -> bool {
    !(username.contains('.') && is_host_prefix_template(&site.uri_check))
}

/// Builds one descriptor per eligible (username, site) pair.
///
/// # Arguments
/// * `usernames` - The account names under test.
/// * `sites` - The filtered sites, shared with every descriptor built from them.
///
/// # Returns
/// * Descriptors ordered username-major, then by site order.
pub(crate) fn generate_probes(usernames: &[String], sites: &[Arc<SiteDefinition>]) -> Vec<ProbeDescriptor> {
    let mut probes = Vec::with_capacity(usernames.len() * sites.len());

    for username in usernames {
        for site in sites {
            if !is_eligible(username, site) {
                tracing::debug!(target: "generator", "Skipping site {}, with username {}", site.uri_check, username);
                continue;
            }

            probes.push(ProbeDescriptor {
                site: Arc::clone(site),
                username: username.clone(),
                resolved_uri: site.uri_check.replacen(ACCOUNT_PLACEHOLDER, username, 1),
            });
        }
    }

    tracing::debug!(target: "generator", "Generated {} probes for {} usernames across {} sites", probes.len(), usernames.len(), sites.len());
    probes
}

/// Builds probes that check every site against its own `known` usernames.
pub(crate) fn generate_known_probes(sites: &[Arc<SiteDefinition>]) -> Vec<ProbeDescriptor> {
    let mut probes = Vec::new();
    for site in sites {
        if site.known.is_empty() {
            tracing::debug!(target: "generator", "Site {} has no known usernames", site.name);
        }
        probes.extend(generate_probes(&site.known, std::slice::from_ref(site)));
    }
    probes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, uri_check: &str, known: &[&str]) -> Arc<SiteDefinition> {
        Arc::new(SiteDefinition {
            name: name.to_string(),
            category: "misc".to_string(),
            uri_check: uri_check.to_string(),
            e_code: 200,
            m_code: 404,
            known: known.iter().map(|k| k.to_string()).collect(),
            valid: true,
            user_agent: "ua".to_string(),
        })
    }

    fn usernames(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_single_probe_for_path_template() {
        let sites = vec![site("ExampleSite", "https://example.com/{account}", &[])];
        let probes = generate_probes(&usernames(&["alice"]), &sites);

        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].resolved_uri, "https://example.com/alice");
        assert_eq!(probes[0].username, "alice");
        assert_eq!(probes[0].site.name, "ExampleSite");
    }

    #[test]
    fn test_dotted_username_kept_for_path_template() {
        let sites = vec![site("ExampleSite", "https://example.com/{account}", &[])];
        let probes = generate_probes(&usernames(&["al.ice"]), &sites);

        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].resolved_uri, "https://example.com/al.ice");
    }

    #[test]
    fn test_dotted_username_skipped_for_host_template() {
        let sites = vec![
            site("Subdomain", "http://{account}.example.com", &[]),
            site("SecureSubdomain", "https://{account}.example.com/profile", &[]),
        ];
        assert!(generate_probes(&usernames(&["al.ice"]), &sites).is_empty());

        let probes = generate_probes(&usernames(&["alice"]), &sites);
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].resolved_uri, "http://alice.example.com");
    }

    #[test]
    fn test_host_prefix_detection() {
        assert!(is_host_prefix_template("http://{account}.example.com"));
        assert!(is_host_prefix_template("https://{account}.example.com"));
        assert!(!is_host_prefix_template("https://example.com/{account}"));
        assert!(!is_host_prefix_template("https://www.{account}.example.com"));
        assert!(!is_host_prefix_template("https://example.com/?q={account}"));
    }

    #[test]
    fn test_resolved_uri_has_no_placeholder_and_username_once() {
        let sites = vec![
            site("A", "https://a.example/{account}", &[]),
            site("B", "https://b.example/u/{account}/about", &[]),
            site("C", "https://{account}.c.example", &[]),
        ];
        let names = usernames(&["zed", "quinn"]);
        for probe in generate_probes(&names, &sites) {
            assert!(!probe.resolved_uri.contains(ACCOUNT_PLACEHOLDER));
            assert_eq!(probe.resolved_uri.matches(probe.username.as_str()).count(), 1);
        }
    }

    #[test]
    fn test_order_is_username_major() {
        let sites = vec![
            site("A", "https://a.example/{account}", &[]),
            site("B", "https://b.example/{account}", &[]),
        ];
        let probes = generate_probes(&usernames(&["one", "two"]), &sites);
        let order: Vec<(&str, &str)> = probes
            .iter()
            .map(|p| (p.username.as_str(), p.site.name.as_str()))
            .collect();
        assert_eq!(order, vec![("one", "A"), ("one", "B"), ("two", "A"), ("two", "B")]);
    }

    #[test]
    fn test_sites_are_shared_not_copied() {
        let sites = vec![site("A", "https://a.example/{account}", &[])];
        let probes = generate_probes(&usernames(&["one", "two"]), &sites);
        assert!(probes.iter().all(|p| Arc::ptr_eq(&p.site, &sites[0])));
    }

    #[test]
    fn test_known_probes_use_each_sites_own_usernames() {
        let sites = vec![
            site("A", "https://a.example/{account}", &["ann", "amy"]),
            site("B", "https://{account}.b.example", &["b.ob", "bea"]),
            site("C", "https://c.example/{account}", &[]),
        ];
        let probes = generate_known_probes(&sites);
        let uris: Vec<&str> = probes.iter().map(|p| p.resolved_uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "https://a.example/ann",
                "https://a.example/amy",
                "https://bea.b.example",
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        let sites = vec![site("A", "https://a.example/{account}", &[])];
        assert!(generate_probes(&[], &sites).is_empty());
        assert!(generate_probes(&usernames(&["alice"]), &[]).is_empty());
    }
}
