//! Byte layouts for tree keys.
//!
//! Primary keys are big-endian ids. Index keys are
//! `owner (8) | timestamp millis (8) | log id (8)`, with the timestamp's
//! sign bit flipped so byte order matches time order.

use chrono::{DateTime, Utc};

pub const INDEX_KEY_LEN: usize = 24;

pub fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn time_bytes(ts: DateTime<Utc>) -> [u8; 8] {
    ((ts.timestamp_millis() as u64) ^ (1 << 63)).to_be_bytes()
}

pub fn index_key(owner: u64, ts: DateTime<Utc>, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_KEY_LEN);
    key.extend_from_slice(&owner.to_be_bytes());
    key.extend_from_slice(&time_bytes(ts));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Half-open key range for `owner` within `[since, until)`
pub fn index_range(
    owner: u64,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> (Vec<u8>, Vec<u8>) {
    let mut start = owner.to_be_bytes().to_vec();
    match since {
        Some(ts) => start.extend_from_slice(&time_bytes(ts)),
        None => start.extend_from_slice(&[0u8; 8]),
    }
    start.extend_from_slice(&[0u8; 8]);

    let end = match until {
        Some(ts) => {
            let mut end = owner.to_be_bytes().to_vec();
            end.extend_from_slice(&time_bytes(ts));
            end.extend_from_slice(&[0u8; 8]);
            end
        }
        // First key of the next owner; owner ids never reach u64::MAX
        None => {
            let mut end = owner.saturating_add(1).to_be_bytes().to_vec();
            end.extend_from_slice(&[0u8; 16]);
            end
        }
    };

    (start, end)
}

/// Log id stored in the last 8 bytes of an index key
pub fn key_id(key: &[u8]) -> u64 {
    let mut id = [0u8; 8];
    if key.len() >= INDEX_KEY_LEN {
        id.copy_from_slice(&key[16..INDEX_KEY_LEN]);
    }
    u64::from_be_bytes(id)
}
