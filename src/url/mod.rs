//! URL handling module
//!
//! This module provides URL normalization, host extraction, domain matching,
//! and the domain classifier that sorts links returned by the model into
//! authority, regional and general-news categories.

mod domain;
mod matcher;
mod normalize;

use crate::config::{ClassifierConfig, GeneralPolicy};
use crate::ConfigError;
use std::collections::HashSet;

// Re-export main functions
pub use domain::{canonical_key, extract_host};
pub use matcher::{matches_domain, RegionalPattern};
pub use normalize::normalize_url;

/// Link categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The authority domain or one of its subdomains
    Primary,
    /// A regional court of the authority
    Regional,
    /// A news outlet
    General,
    /// Anything else; dropped from the output
    Rejected,
}

/// Compiled classification rules
#[derive(Debug, Clone)]
pub struct DomainRules {
    authority_domain: String,
    authority_suffix: String,
    regional: RegionalPattern,
    general_domains: Vec<String>,
    general_policy: GeneralPolicy,
}

impl DomainRules {
    /// Builds the rules from the classifier section of the configuration
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let regional = RegionalPattern::new(&config.regional_prefix, &config.authority_suffix)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            authority_domain: config.authority_domain.to_lowercase(),
            authority_suffix: config.authority_suffix.to_lowercase(),
            regional,
            general_domains: config
                .general_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            general_policy: config.general_policy,
        })
    }

    /// Classifies a host (already lowercased, without `www.`)
    ///
    /// Rules are checked in priority order; the first match wins:
    /// 1. Authority domain or subdomain
    /// 2. Regional pattern
    /// 3. General-news allow-list (or, under the non-judicial policy, any
    ///    host outside the authority suffix)
    /// 4. Rejected
    pub fn classify_host(&self, host: &str) -> Category {
        if host.is_empty() {
            return Category::Rejected;
        }

        if matches_domain(&self.authority_domain, host) {
            return Category::Primary;
        }

        if self.regional.is_match(host) {
            return Category::Regional;
        }

        if self
            .general_domains
            .iter()
            .any(|domain| matches_domain(domain, host))
        {
            return Category::General;
        }

        if self.general_policy == GeneralPolicy::NonJudicial
            && !host.contains(&self.authority_suffix)
        {
            return Category::General;
        }

        Category::Rejected
    }

    /// Classifies an already-normalized URL
    pub fn classify(&self, url: &str) -> Category {
        match extract_host(url) {
            Some(host) => self.classify_host(&host),
            None => Category::Rejected,
        }
    }
}

/// Normalizes and classifies a raw URL candidate
///
/// Never fails: empty or unparseable candidates are `Rejected`.
///
/// # Examples
///
/// ```
/// use sessoes_enricher::config::ClassifierConfig;
/// use sessoes_enricher::url::{classify_url, Category, DomainRules};
///
/// let rules = DomainRules::from_config(&ClassifierConfig::default()).unwrap();
/// assert_eq!(classify_url("www.tse.jus.br/x", &rules), Category::Primary);
/// assert_eq!(classify_url("https://tre-sp.jus.br/", &rules), Category::Regional);
/// assert_eq!(classify_url("folha.uol.com.br/b", &rules), Category::General);
/// assert_eq!(classify_url("https://example.org", &rules), Category::Rejected);
/// ```
pub fn classify_url(raw: &str, rules: &DomainRules) -> Category {
    match normalize_url(raw) {
        Some(url) => rules.classify(&url),
        None => Category::Rejected,
    }
}

/// Links of one record, partitioned by category
///
/// Each link appears at most once across all three lists, in the order it
/// was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedUrls {
    pub primary: Vec<String>,
    pub regional: Vec<String>,
    pub general: Vec<String>,
}

impl ClassifiedUrls {
    /// Normalizes, deduplicates and classifies raw candidates
    pub fn from_candidates<I, S>(candidates: I, rules: &DomainRules) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classified = Self::default();
        let mut seen = HashSet::new();

        for candidate in candidates {
            let Some(url) = normalize_url(candidate.as_ref()) else {
                continue;
            };
            if !seen.insert(canonical_key(&url)) {
                continue;
            }

            match rules.classify(&url) {
                Category::Primary => classified.primary.push(url),
                Category::Regional => classified.regional.push(url),
                Category::General => classified.general.push(url),
                Category::Rejected => {
                    tracing::trace!("Dropping unclassified link {}", url);
                }
            }
        }

        classified
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.regional.is_empty() && self.general.is_empty()
    }

    pub fn total(&self) -> usize {
        self.primary.len() + self.regional.len() + self.general.len()
    }

    /// Joins a list of links into a single output cell
    pub fn join(links: &[String]) -> String {
        links.join(", ")
    }
}
