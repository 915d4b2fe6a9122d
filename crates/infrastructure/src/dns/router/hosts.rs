use super::super::message::fixed_response;
use ferrous_router_domain::DomainError;
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::rdata::CNAME;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::IpAddr;

pub(super) const HOSTS_TTL: u32 = 10;

/// CNAME records leading from the queried name through every alias.
pub(super) fn alias_records(query: &Query, aliases: &[String]) -> Result<Vec<Record>, DomainError> {
    let mut owner = query.name().clone();
    let mut records = Vec::with_capacity(aliases.len());
    for alias in aliases {
        let target = Name::from_ascii(format!("{}.", alias)).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid alias '{}': {}", alias, e))
        })?;
        let mut record = Record::from_rdata(owner, HOSTS_TTL, RData::CNAME(CNAME(target.clone())));
        record.set_dns_class(query.query_class());
        records.push(record);
        owner = target;
    }
    Ok(records)
}

/// Copy of `message` asking for `name` instead.
pub(super) fn rewrite_query(
    message: &Message,
    query: &Query,
    name: &str,
) -> Result<Message, DomainError> {
    let name = Name::from_ascii(format!("{}.", name)).map_err(|e| {
        DomainError::InvalidDomainName(format!("Invalid alias '{}': {}", name, e))
    })?;
    let mut rewritten = query.clone();
    rewritten.set_name(name);

    let mut request = message.clone();
    request.take_queries();
    request.add_query(rewritten);
    Ok(request)
}

/// Puts the original question back and prepends the alias chain.
pub(super) fn restore_alias(response: &mut Message, original: &Query, aliases: &[Record]) {
    if aliases.is_empty() || response.answers().is_empty() {
        return;
    }
    response.take_queries();
    response.add_query(original.clone());
    let answers = response.take_answers();
    let mut merged = aliases.to_vec();
    merged.extend(answers);
    response.insert_answers(merged);
}

/// Direct answer from a hosts entry, keeping the queried name in the question.
pub(super) fn hosts_response(
    message: &Message,
    query: &Query,
    aliases: &[Record],
    addresses: &[IpAddr],
) -> Message {
    let matching: Vec<IpAddr> = addresses
        .iter()
        .copied()
        .filter(|address| match query.query_type() {
            RecordType::A => address.is_ipv4(),
            RecordType::AAAA => address.is_ipv6(),
            _ => false,
        })
        .collect();

    let mut answered = query.clone();
    if let Some(RData::CNAME(CNAME(target))) = aliases.last().map(Record::data) {
        answered.set_name(target.clone());
    }

    let mut response = fixed_response(message.id(), &answered, &matching, HOSTS_TTL);
    response.set_authoritative(true);
    response.take_queries();
    response.add_query(query.clone());
    let answers = response.take_answers();
    let mut merged = aliases.to_vec();
    merged.extend(answers);
    response.insert_answers(merged);
    response
}
