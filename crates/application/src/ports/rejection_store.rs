use hickory_proto::rr::RecordType;

/// Remembers which transport returned answers rejected for a name and type.
pub trait RejectionStore: Send + Sync {
    fn load_rejected(&self, transport_tag: &str, name: &str, query_type: RecordType) -> bool;

    /// Must not block the caller.
    fn save_rejected_async(&self, transport_tag: &str, name: &str, query_type: RecordType);
}
