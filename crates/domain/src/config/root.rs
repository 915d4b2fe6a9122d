use serde::{Deserialize, Serialize};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

/// Top-level configuration of the DNS router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// DNS client, cache and routing rules
    #[serde(default)]
    pub dns: DnsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file, falling back to defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dns.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "query_timeout cannot be 0".to_string(),
            ));
        }

        if self.dns.disable_expire && self.dns.stale_cache > 0 {
            return Err(ConfigError::Validation(
                "stale_cache has no effect when disable_expire is set".to_string(),
            ));
        }

        for (domain, values) in &self.dns.hosts {
            if values.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "hosts entry '{}' has no values",
                    domain
                )));
            }
        }

        for (index, rule) in self.dns.rules.iter().enumerate() {
            rule.validate()
                .map_err(|e| ConfigError::Validation(format!("dns rule[{}]: {}", index, e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_strategy::DomainStrategy;
    use crate::rule_action::{RejectMethod, RuleAction};

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.dns.query_timeout, 10_000);
        assert_eq!(config.dns.cache_capacity, 1024);
        assert_eq!(config.dns.max_cache_ttl, 86_400);
        assert_eq!(config.dns.strategy, DomainStrategy::AsIs);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_rules_and_hosts() {
        let config = Config::from_toml_str(
            r#"
[dns]
strategy = "prefer_ipv4"
final_server = "remote"
stale_cache = 60
reverse_mapping = true

[dns.hosts]
"router.lan" = ["192.168.1.1"]
"alias.lan" = ["router.lan"]

[[dns.rules]]
domain_suffix = ["ads.example"]
action = "reject"
method = "drop"

[[dns.rules]]
domain_suffix = ["cn"]
action = "route"
server = "local"
strategy = "ipv4_only"
rewrite_ttl = 30
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.dns.strategy, DomainStrategy::PreferIpv4);
        assert_eq!(config.dns.final_server.as_deref(), Some("remote"));
        assert_eq!(config.dns.hosts.len(), 2);
        assert_eq!(config.dns.rules.len(), 2);
        assert_eq!(
            config.dns.rules[0].action,
            RuleAction::reject(RejectMethod::Drop)
        );
        match &config.dns.rules[1].action {
            RuleAction::Route { server, overrides } => {
                assert_eq!(server, "local");
                assert_eq!(overrides.strategy, DomainStrategy::Ipv4Only);
                assert_eq!(overrides.rewrite_ttl, Some(30));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.dns.query_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_stale_without_expiry() {
        let mut config = Config::default();
        config.dns.disable_expire = true;
        config.dns.stale_cache = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            Config::from_toml_str("[dns]\nquery_timeout = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
