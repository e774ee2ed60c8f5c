//! Locator parsing
//!
//! A locator names an ensemble and a node path in one string:
//!
//! ```text
//! zk://10.20.30.10:2181,10.20.30.11:2181/testdemo
//! ```
//!
//! Endpoints keep the order they were written in; that order is the failover
//! priority. The path is normalized to a single leading `/`.

use std::fmt;

use crate::core::error::SettingsError;

/// Scheme accepted by this resolver
pub const SCHEME: &str = "zk";

/// A single `host:port` ensemble member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Parsed locator: ordered endpoints plus an absolute node path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    endpoints: Vec<Endpoint>,
    path: String,
}

impl Locator {
    /// Parse `zk://host1:port1[,host2:port2...]/path`
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        let malformed = |reason: &str| SettingsError::MalformedLocator {
            locator: raw.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| malformed("missing scheme separator '://'"))?;

        if scheme != SCHEME {
            return Err(malformed(&format!("unsupported scheme '{}'", scheme)));
        }

        let (hosts, raw_path) = rest
            .split_once('/')
            .ok_or_else(|| malformed("missing path"))?;

        if hosts.is_empty() {
            return Err(malformed("empty host list"));
        }

        let mut endpoints = Vec::new();
        for host in hosts.split(',') {
            if host.is_empty() || host.chars().any(char::is_whitespace) {
                return Err(malformed("empty or invalid endpoint in host list"));
            }
            let endpoint = Endpoint::new(host);
            // A repeated member keeps its first position only
            if !endpoints.contains(&endpoint) {
                endpoints.push(endpoint);
            }
        }

        let trimmed = raw_path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(malformed("empty path"));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(malformed("path contains an empty segment"));
        }

        Ok(Self {
            endpoints,
            path: format!("/{}", trimmed),
        })
    }

    pub fn scheme(&self) -> &'static str {
        SCHEME
    }

    /// Endpoints in failover order
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", SCHEME)?;
        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            f.write_str(endpoint.as_str())?;
        }
        f.write_str(&self.path)
    }
}

impl std::str::FromStr for Locator {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_parse_two_endpoints() {
        let locator = Locator::parse("zk://10.20.30.10:2181,10.20.30.11:2181/testdemo").unwrap();
        assert_eq!(
            locator.endpoints(),
            &[Endpoint::from("10.20.30.10:2181"), Endpoint::from("10.20.30.11:2181")]
        );
        assert_eq!(locator.path(), "/testdemo");
        assert_eq!(locator.scheme(), "zk");
    }

    #[test]
    fn test_parse_nested_path() {
        let locator = Locator::parse("zk://a:1,b:2/x/y").unwrap();
        assert_eq!(locator.endpoints(), &[Endpoint::from("a:1"), Endpoint::from("b:2")]);
        assert_eq!(locator.path(), "/x/y");
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(Locator::parse("zk://a:1//x/").unwrap().path(), "/x");
    }

    #[test]
    fn test_duplicate_endpoints_collapse() {
        let locator = Locator::parse("zk://a:1,b:2,a:1/x").unwrap();
        assert_eq!(locator.endpoints(), &[Endpoint::from("a:1"), Endpoint::from("b:2")]);
    }

    #[test]
    fn test_display_round_trips() {
        let raw = "zk://a:1,b:2/x/y";
        assert_eq!(Locator::parse(raw).unwrap().to_string(), raw);
    }

    #[test]
    fn test_malformed_locators() {
        for raw in [
            "a:1,b:2/x",
            "http://a:1/x",
            "zk:///x",
            "zk://a:1",
            "zk://a:1/",
            "zk://a:1,,b:2/x",
            "zk://a:1/x//y",
        ] {
            let err = Locator::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedLocator, "{raw}");
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = "zk://a:1,b:2,c:3/x";
        assert_eq!(Locator::parse(raw).unwrap(), raw.parse::<Locator>().unwrap());
    }
}
