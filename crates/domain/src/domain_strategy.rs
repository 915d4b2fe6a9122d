use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Controls which address families are queried and how A/AAAA results are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStrategy {
    #[default]
    AsIs,
    PreferIpv4,
    PreferIpv6,
    Ipv4Only,
    Ipv6Only,
}

impl DomainStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsIs => "as_is",
            Self::PreferIpv4 => "prefer_ipv4",
            Self::PreferIpv6 => "prefer_ipv6",
            Self::Ipv4Only => "ipv4_only",
            Self::Ipv6Only => "ipv6_only",
        }
    }

    pub fn is_as_is(&self) -> bool {
        matches!(self, Self::AsIs)
    }

    /// Returns `other` when this strategy is still unresolved.
    pub fn or(self, other: DomainStrategy) -> DomainStrategy {
        if self.is_as_is() {
            other
        } else {
            self
        }
    }

    pub fn wants_ipv4(&self) -> bool {
        !matches!(self, Self::Ipv6Only)
    }

    pub fn wants_ipv6(&self) -> bool {
        !matches!(self, Self::Ipv4Only)
    }
}

impl fmt::Display for DomainStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "as_is" | "asis" => Ok(Self::AsIs),
            "prefer_ipv4" => Ok(Self::PreferIpv4),
            "prefer_ipv6" => Ok(Self::PreferIpv6),
            "ipv4_only" => Ok(Self::Ipv4Only),
            "ipv6_only" => Ok(Self::Ipv6Only),
            other => Err(format!("unknown domain strategy: {}", other)),
        }
    }
}
