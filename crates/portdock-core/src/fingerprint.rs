//! Snapshot change detection.
//!
//! Polling returns a full server list every cycle. Most cycles the world
//! has not changed, and swapping the held snapshot anyway would ripple a
//! re-projection (and a re-render downstream) for nothing. Each record is
//! reduced to a cheap fingerprint, `(pid, port, uptime_seconds)`, and a
//! candidate snapshot replaces the current one only when the ordered
//! fingerprint sequences differ. Uptime is part of the fingerprint, so
//! genuine progression is still observed; display-only fields (names,
//! framework, description) are not, because the backend derives them from
//! the same identity and they cannot change while `(pid, port)` lives.

use crate::types::ServerRecord;

/// Per-record summary used for change detection. Not a hash.
pub type Fingerprint = (u32, u16, u64);

pub fn fingerprint(record: &ServerRecord) -> Fingerprint {
    (record.pid, record.port, record.uptime_seconds)
}

/// True when `candidate` should replace `previous` as the held snapshot:
/// the sequences differ in length or in any positional fingerprint.
/// O(n), short-circuits on the first difference.
pub fn should_replace(previous: &[ServerRecord], candidate: &[ServerRecord]) -> bool {
    previous.len() != candidate.len()
        || previous
            .iter()
            .zip(candidate)
            .any(|(a, b)| fingerprint(a) != fingerprint(b))
}
