use compact_str::CompactString;
use hickory_proto::op::Query;
use hickory_proto::rr::{DNSClass, RecordType};

/// Cache key: question name, type and class, plus the transport tag when
/// every transport keeps its own keyspace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub dns_class: DNSClass,
    pub transport: Option<CompactString>,
}

impl CacheKey {
    #[inline]
    pub fn new(name: &str, record_type: RecordType, dns_class: DNSClass) -> Self {
        Self {
            name: normalize_name(name),
            record_type,
            dns_class,
            transport: None,
        }
    }

    pub fn from_query(query: &Query) -> Self {
        Self::new(
            &query.name().to_ascii(),
            query.query_type(),
            query.query_class(),
        )
    }

    pub fn with_transport(mut self, tag: &str) -> Self {
        self.transport = Some(CompactString::from(tag));
        self
    }
}

fn normalize_name(name: &str) -> CompactString {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.bytes().any(|b| b.is_ascii_uppercase()) {
        CompactString::from(trimmed.to_ascii_lowercase())
    } else {
        CompactString::from(trimmed)
    }
}
