use regex::Regex;

/// Checks if a host is a domain or one of its subdomains
///
/// # Examples
///
/// ```
/// use sessoes_enricher::url::matches_domain;
///
/// assert!(matches_domain("tse.jus.br", "tse.jus.br"));
/// assert!(matches_domain("tse.jus.br", "www2.tse.jus.br"));
/// assert!(!matches_domain("tse.jus.br", "faketse.jus.br"));
/// ```
pub fn matches_domain(base: &str, host: &str) -> bool {
    host == base
        || host
            .strip_suffix(base)
            .map_or(false, |rest| rest.ends_with('.'))
}

/// Matcher for regional court hosts: `<prefix>-<two letters>.<suffix>`
///
/// The pattern is anchored at the end of the host; any subdomain depth before
/// the regional label is allowed.
#[derive(Debug, Clone)]
pub struct RegionalPattern {
    regex: Regex,
}

impl RegionalPattern {
    /// Builds the matcher from a label prefix (e.g. `tre`) and a suffix (e.g. `jus.br`)
    pub fn new(prefix: &str, suffix: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"(?:^|\.){}-[a-z]{{2}}\.{}$",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn is_match(&self, host: &str) -> bool {
        self.regex.is_match(host)
    }
}
