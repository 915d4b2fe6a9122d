mod default_rule;
mod matcher;

pub use default_rule::DefaultDnsRule;
pub use matcher::{MatchOutcome, MatchedRule, RuleMatcher};
