use hickory_proto::op::Message;
use hickory_proto::rr::{Record, RecordType};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;

/// A cached response with its base expiry and the round-robin counters for
/// its A and AAAA answers.
pub struct CachedMessage {
    message: Message,
    expire_at: Option<Instant>,
    ipv4_index: AtomicU32,
    ipv6_index: AtomicU32,
}

impl CachedMessage {
    pub fn new(message: Message, expire_at: Option<Instant>) -> Self {
        Self {
            message,
            expire_at,
            ipv4_index: AtomicU32::new(0),
            ipv6_index: AtomicU32::new(0),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Expiry of the original TTL, without any stale grace.
    pub fn expire_at(&self) -> Option<Instant> {
        self.expire_at
    }

    /// Copy of the stored response, rotated when `round_robin` is set.
    pub fn snapshot(&self, round_robin: bool) -> Message {
        let mut message = self.message.clone();
        if round_robin {
            let mut answers = message.take_answers();
            rotate_type(&mut answers, RecordType::A, &self.ipv4_index);
            rotate_type(&mut answers, RecordType::AAAA, &self.ipv6_index);
            message.insert_answers(answers);
        }
        message
    }
}

/// Rotates the records of one type among the slots they already occupy.
fn rotate_type(answers: &mut [Record], record_type: RecordType, counter: &AtomicU32) {
    let slots: Vec<usize> = answers
        .iter()
        .enumerate()
        .filter(|(_, record)| record.record_type() == record_type)
        .map(|(slot, _)| slot)
        .collect();
    if slots.len() <= 1 {
        return;
    }

    let step = counter.fetch_add(1, Ordering::Relaxed) as usize % slots.len();
    if step == 0 {
        return;
    }

    let mut rotated: Vec<Record> = slots.iter().map(|&slot| answers[slot].clone()).collect();
    rotated.rotate_left(step);
    for (slot, record) in slots.into_iter().zip(rotated) {
        answers[slot] = record;
    }
}
