//! Convenience functions throughout the crate go here
use rand::RngCore;
use time::OffsetDateTime;

/// Generate a vector of cryptographically secure random bytes of length `len`.
pub fn generate_random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}

/// Current UNIX time in seconds.
pub fn now_secs() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Reads an integer timestamp out of a claim value, tolerating float encodings.
pub(crate) fn timestamp(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
}
