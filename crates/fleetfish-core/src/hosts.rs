//! Target host resolution
//!
//! Hosts come from command-line arguments or from piped input. Piped
//! input is a free-form token list: any run of Unicode whitespace, `,`,
//! `;` or `|` separates two hosts.

use serde::Serialize;

/// Characters that separate hosts in piped input, besides whitespace
const HOST_DELIMITERS: [char; 3] = [',', ';', '|'];

/// Error returned when no host survived parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no hosts given")]
pub struct NoHosts;

/// Ordered, de-duplicated set of target hosts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HostSet {
    hosts: Vec<String>,
}

impl HostSet {
    /// Build a set from already-split identifiers. Blank entries are
    /// skipped and the first occurrence of a duplicate wins.
    pub fn new<I, S>(hosts: I) -> Result<Self, NoHosts>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HostSet::default();
        for host in hosts {
            let host = host.as_ref().trim();
            if host.is_empty() || set.hosts.iter().any(|h| h == host) {
                continue;
            }
            set.hosts.push(host.to_string());
        }

        if set.hosts.is_empty() {
            return Err(NoHosts);
        }
        Ok(set)
    }

    /// Build a set from a raw token list such as piped stdin
    pub fn parse(input: &str) -> Result<Self, NoHosts> {
        Self::new(split_tokens(input))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.hosts
    }
}

impl IntoIterator for HostSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.into_iter()
    }
}

impl<'a> IntoIterator for &'a HostSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}

/// Split a token list on whitespace and the host delimiters
pub fn split_tokens(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_whitespace() || HOST_DELIMITERS.contains(&c))
        .filter(|token| !token.is_empty())
}

/// Base URL of a host's management endpoint.
///
/// A host that already names a scheme is used as-is; anything else is
/// reached over HTTPS.
///
/// ```
/// # use fleetfish_core::hosts::base_url;
/// assert_eq!(base_url("bmc-01"), "https://bmc-01");
/// assert_eq!(base_url("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
/// ```
pub fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_splits_on_all_delimiters() {
        let set = HostSet::parse("a,b;c|d e\tf\ng\u{00a0}h").unwrap();
        assert_eq!(
            set.as_slice(),
            &["a", "b", "c", "d", "e", "f", "g", "h"].map(String::from)
        );
    }

    #[test]
    fn test_parse_deduplicates_keeping_first() {
        let set = HostSet::parse("b a,b,,c a").unwrap();
        assert_eq!(set.as_slice(), &["b", "a", "c"].map(String::from));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(HostSet::parse(" ,;| \n"), Err(NoHosts));
        assert_eq!(HostSet::new(Vec::<String>::new()), Err(NoHosts));
        assert_eq!(NoHosts.to_string(), "no hosts given");
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        assert_eq!(base_url("10.0.0.5"), "https://10.0.0.5");
        assert_eq!(base_url("https://bmc"), "https://bmc");
        assert_eq!(base_url("http://127.0.0.1:8080"), "http://127.0.0.1:8080");
    }
}
