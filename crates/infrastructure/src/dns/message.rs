//! Helpers for building and inspecting DNS messages.

use ferrous_router_domain::{DomainError, DomainStrategy};
use hickory_proto::op::{Edns, Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsCode, EdnsOption};
use hickory_proto::rr::rdata::svcb::{SvcParamKey, SvcParamValue, SVCB};
use hickory_proto::rr::rdata::{A, AAAA, HTTPS};
use hickory_proto::rr::{RData, Record, RecordType};
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// FORMERR answer carrying the original ID and questions.
pub fn format_error_response(message: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(message.id())
        .set_message_type(MessageType::Response)
        .set_op_code(message.op_code())
        .set_response_code(ResponseCode::FormErr);
    response.add_queries(message.queries().iter().cloned());
    response
}

/// Synthesized NOERROR answer for `query` holding `addresses`.
pub fn fixed_response(id: u16, query: &Query, addresses: &[IpAddr], ttl: u32) -> Message {
    let mut response = Message::new();
    response
        .set_id(id)
        .set_message_type(MessageType::Response)
        .set_response_code(ResponseCode::NoError);
    response.add_query(query.clone());

    for address in addresses {
        let rdata = match address {
            IpAddr::V4(v4) => RData::A(A(*v4)),
            IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
        };
        let mut record = Record::from_rdata(query.name().clone(), ttl, rdata);
        record.set_dns_class(query.query_class());
        response.add_answer(record);
    }
    response
}

/// Attaches an EDNS client subnet option. An existing option is kept unless `replace` is set.
pub fn set_client_subnet(message: &mut Message, subnet: IpNetwork, replace: bool) {
    let edns = message.extensions_mut().get_or_insert_with(Edns::new);
    if !replace && edns.option(EdnsCode::Subnet).is_some() {
        return;
    }
    let options = edns.options_mut();
    options.remove(EdnsCode::Subnet);
    options.insert(EdnsOption::Subnet(ClientSubnet::new(
        subnet.ip(),
        subnet.prefix(),
        0,
    )));
}

pub fn has_client_subnet(message: &Message) -> bool {
    message
        .extensions()
        .as_ref()
        .is_some_and(|edns| edns.option(EdnsCode::Subnet).is_some())
}

/// Drops the address hints of the family excluded by an `*_only` strategy
/// from HTTPS answers.
pub fn strip_https_hints(message: &mut Message, strategy: DomainStrategy) {
    let excluded = match strategy {
        DomainStrategy::Ipv4Only => SvcParamKey::Ipv6Hint,
        DomainStrategy::Ipv6Only => SvcParamKey::Ipv4Hint,
        _ => return,
    };

    let answers = message
        .take_answers()
        .into_iter()
        .map(|record| match record.data() {
            RData::HTTPS(HTTPS(svcb)) => {
                let params = svcb
                    .svc_params()
                    .iter()
                    .filter(|(key, _)| *key != excluded)
                    .cloned()
                    .collect();
                let filtered = SVCB::new(svcb.svc_priority(), svcb.target_name().clone(), params);
                let mut rebuilt = Record::from_rdata(
                    record.name().clone(),
                    record.ttl(),
                    RData::HTTPS(HTTPS(filtered)),
                );
                rebuilt.set_dns_class(record.dns_class());
                rebuilt
            }
            _ => record,
        })
        .collect();
    message.insert_answers(answers);
}

/// Addresses carried by a NOERROR or NXDOMAIN response, including HTTPS hints.
pub fn message_to_addresses(response: &Message) -> Result<Vec<IpAddr>, DomainError> {
    match response.response_code() {
        ResponseCode::NoError | ResponseCode::NXDomain => {}
        code => return Err(DomainError::ResponseCode(code.to_string())),
    }

    let mut addresses = Vec::with_capacity(response.answers().len());
    for record in response.answers() {
        match record.data() {
            RData::A(A(v4)) => addresses.push(IpAddr::V4(*v4)),
            RData::AAAA(AAAA(v6)) => addresses.push(IpAddr::V6(*v6)),
            RData::HTTPS(HTTPS(svcb)) => {
                for (_, value) in svcb.svc_params() {
                    match value {
                        SvcParamValue::Ipv4Hint(hint) => {
                            addresses.extend(hint.0.iter().map(|a| IpAddr::V4(a.0)))
                        }
                        SvcParamValue::Ipv6Hint(hint) => {
                            addresses.extend(hint.0.iter().map(|a| IpAddr::V6(a.0)))
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    Ok(addresses)
}

/// PreferIpv6 puts IPv6 first, every other strategy puts IPv4 first.
pub fn sort_addresses(
    mut ipv4: Vec<IpAddr>,
    mut ipv6: Vec<IpAddr>,
    strategy: DomainStrategy,
) -> Vec<IpAddr> {
    if strategy == DomainStrategy::PreferIpv6 {
        ipv6.append(&mut ipv4);
        ipv6
    } else {
        ipv4.append(&mut ipv6);
        ipv4
    }
}

pub fn is_address_query(message: &Message) -> bool {
    message.queries().iter().any(|query| {
        matches!(
            query.query_type(),
            RecordType::A | RecordType::AAAA | RecordType::HTTPS
        )
    })
}

pub fn fqdn_to_domain(fqdn: &str) -> &str {
    fqdn.strip_suffix('.').unwrap_or(fqdn)
}

pub fn format_question(query: &Query) -> String {
    format!(
        "{} {} {}",
        query.name(),
        query.query_class(),
        query.query_type()
    )
}

/// Every record of the answer, authority and additional sections.
pub(crate) fn records(message: &Message) -> impl Iterator<Item = &Record> {
    message
        .answers()
        .iter()
        .chain(message.name_servers())
        .chain(message.additionals())
}

pub(crate) fn for_each_record_mut(message: &mut Message, mut f: impl FnMut(&mut Record)) {
    let mut answers = message.take_answers();
    let mut name_servers = message.take_name_servers();
    let mut additionals = message.take_additionals();
    answers
        .iter_mut()
        .chain(name_servers.iter_mut())
        .chain(additionals.iter_mut())
        .for_each(&mut f);
    message.insert_answers(answers);
    message.insert_name_servers(name_servers);
    message.insert_additionals(additionals);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::svcb::IpHint;
    use hickory_proto::rr::Name;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::str::FromStr;

    fn query(name: &str, record_type: RecordType) -> Query {
        Query::query(Name::from_str(name).unwrap(), record_type)
    }

    fn https_record() -> Record {
        let svcb = SVCB::new(
            1,
            Name::root(),
            vec![
                (
                    SvcParamKey::Ipv4Hint,
                    SvcParamValue::Ipv4Hint(IpHint(vec![A(Ipv4Addr::new(1, 1, 1, 1))])),
                ),
                (
                    SvcParamKey::Ipv6Hint,
                    SvcParamValue::Ipv6Hint(IpHint(vec![AAAA(Ipv6Addr::LOCALHOST)])),
                ),
            ],
        );
        Record::from_rdata(
            Name::from_str("example.com.").unwrap(),
            300,
            RData::HTTPS(HTTPS(svcb)),
        )
    }

    #[test]
    fn test_format_error_keeps_id_and_questions() {
        let mut message = Message::new();
        message.set_id(4242);
        message.add_query(query("a.example.", RecordType::A));
        message.add_query(query("b.example.", RecordType::A));

        let response = format_error_response(&message);
        assert_eq!(response.id(), 4242);
        assert_eq!(response.message_type(), MessageType::Response);
        assert_eq!(response.response_code(), ResponseCode::FormErr);
        assert_eq!(response.queries().len(), 2);
    }

    #[test]
    fn test_fixed_response_builds_both_families() {
        let q = query("example.com.", RecordType::A);
        let addresses: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap(), "::1".parse().unwrap()];
        let response = fixed_response(7, &q, &addresses, 10);

        assert_eq!(response.id(), 7);
        assert_eq!(response.answers().len(), 2);
        assert_eq!(response.answers()[0].record_type(), RecordType::A);
        assert_eq!(response.answers()[1].record_type(), RecordType::AAAA);
        assert!(response.answers().iter().all(|r| r.ttl() == 10));
        assert_eq!(message_to_addresses(&response).unwrap(), addresses);
    }

    #[test]
    fn test_message_to_addresses_rejects_servfail() {
        let mut response = Message::new();
        response.set_response_code(ResponseCode::ServFail);
        assert!(matches!(
            message_to_addresses(&response),
            Err(DomainError::ResponseCode(_))
        ));

        response.set_response_code(ResponseCode::NXDomain);
        assert_eq!(message_to_addresses(&response).unwrap(), Vec::<IpAddr>::new());
    }

    #[test]
    fn test_message_to_addresses_reads_https_hints() {
        let mut response = Message::new();
        response.add_answer(https_record());
        let addresses = message_to_addresses(&response).unwrap();
        assert_eq!(
            addresses,
            vec![
                IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
                IpAddr::V6(Ipv6Addr::LOCALHOST)
            ]
        );
    }

    #[test]
    fn test_strip_https_hints_for_ipv4_only() {
        let mut response = Message::new();
        response.add_answer(https_record());
        strip_https_hints(&mut response, DomainStrategy::Ipv4Only);

        assert_eq!(
            message_to_addresses(&response).unwrap(),
            vec![IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))]
        );
        assert_eq!(response.answers()[0].ttl(), 300);
    }

    #[test]
    fn test_client_subnet_replace_semantics() {
        let mut message = Message::new();
        set_client_subnet(&mut message, "10.0.0.0/24".parse().unwrap(), false);
        assert!(has_client_subnet(&message));

        set_client_subnet(&mut message, "192.168.0.0/16".parse().unwrap(), false);
        let edns = message.extensions().as_ref().unwrap();
        let expected =
            EdnsOption::Subnet(ClientSubnet::new("10.0.0.0".parse().unwrap(), 24, 0));
        assert_eq!(edns.option(EdnsCode::Subnet), Some(&expected));

        set_client_subnet(&mut message, "192.168.0.0/16".parse().unwrap(), true);
        let edns = message.extensions().as_ref().unwrap();
        let expected =
            EdnsOption::Subnet(ClientSubnet::new("192.168.0.0".parse().unwrap(), 16, 0));
        assert_eq!(edns.option(EdnsCode::Subnet), Some(&expected));
    }

    #[test]
    fn test_sort_addresses_by_strategy() {
        let v4: Vec<IpAddr> = vec!["1.2.3.4".parse().unwrap()];
        let v6: Vec<IpAddr> = vec!["::1".parse().unwrap()];

        assert_eq!(
            sort_addresses(v4.clone(), v6.clone(), DomainStrategy::PreferIpv6),
            vec![v6[0], v4[0]]
        );
        assert_eq!(
            sort_addresses(v4.clone(), v6.clone(), DomainStrategy::PreferIpv4),
            vec![v4[0], v6[0]]
        );
    }

    #[test]
    fn test_fqdn_to_domain() {
        assert_eq!(fqdn_to_domain("example.com."), "example.com");
        assert_eq!(fqdn_to_domain("example.com"), "example.com");
    }
}
