use super::super::message::{for_each_record_mut, records};
use hickory_proto::op::Message;

/// Smallest positive TTL across all sections. Zero only when every record is
/// zero or there are none.
pub(crate) fn min_ttl(message: &Message) -> u32 {
    records(message).fold(0, |current, record| {
        let ttl = record.ttl();
        if current == 0 || (ttl > 0 && ttl < current) {
            ttl
        } else {
            current
        }
    })
}

/// TTL written back onto a fresh upstream response.
pub(crate) fn effective_ttl(message: &Message, min: u32, max: u32, rewrite: Option<u32>) -> u32 {
    if let Some(ttl) = rewrite {
        return ttl;
    }
    min_ttl(message).clamp(min, max)
}

pub(crate) fn set_ttl(message: &mut Message, ttl: u32) {
    for_each_record_mut(message, |record| {
        record.set_ttl(ttl);
    });
}

/// Shifts the stored TTLs down by the time spent in cache.
///
/// `remaining` is what is left of the base lifetime. When the stored response
/// carries no positive TTL every record gets `remaining` instead.
pub(crate) fn age_ttl(message: &mut Message, remaining: u32) {
    let origin = min_ttl(message);
    if origin > 0 {
        let elapsed = origin.saturating_sub(remaining);
        for_each_record_mut(message, |record| {
            let ttl = record.ttl().saturating_sub(elapsed);
            record.set_ttl(ttl);
        });
    } else {
        set_ttl(message, remaining);
    }
}
