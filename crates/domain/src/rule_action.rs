use crate::domain_strategy::DomainStrategy;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option overrides carried by `route` and `route-options` actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOverrides {
    #[serde(default)]
    pub strategy: DomainStrategy,

    #[serde(default)]
    pub disable_cache: bool,

    #[serde(default)]
    pub rewrite_ttl: Option<u32>,

    #[serde(default)]
    pub client_subnet: Option<IpNetwork>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectMethod {
    /// Answer with an empty, successful response.
    #[default]
    Default,
    /// Send nothing back.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RuleAction {
    Route {
        server: String,
        #[serde(flatten)]
        overrides: RouteOverrides,
    },
    RouteOptions {
        #[serde(flatten)]
        overrides: RouteOverrides,
    },
    Reject {
        #[serde(default)]
        method: RejectMethod,
    },
}

impl RuleAction {
    pub fn route(server: impl Into<String>) -> Self {
        Self::Route {
            server: server.into(),
            overrides: RouteOverrides::default(),
        }
    }

    pub fn reject(method: RejectMethod) -> Self {
        Self::Reject { method }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route { server, overrides } => {
                write!(f, "route({}", server)?;
                write_overrides(f, overrides)?;
                f.write_str(")")
            }
            Self::RouteOptions { overrides } => {
                f.write_str("route-options(")?;
                write_overrides(f, overrides)?;
                f.write_str(")")
            }
            Self::Reject { method } => match method {
                RejectMethod::Default => f.write_str("reject"),
                RejectMethod::Drop => f.write_str("reject(drop)"),
            },
        }
    }
}

fn write_overrides(f: &mut fmt::Formatter<'_>, overrides: &RouteOverrides) -> fmt::Result {
    if !overrides.strategy.is_as_is() {
        write!(f, ",strategy={}", overrides.strategy)?;
    }
    if overrides.disable_cache {
        f.write_str(",disable-cache")?;
    }
    if let Some(ttl) = overrides.rewrite_ttl {
        write!(f, ",rewrite-ttl={}", ttl)?;
    }
    if let Some(subnet) = overrides.client_subnet {
        write!(f, ",client-subnet={}", subnet)?;
    }
    Ok(())
}
