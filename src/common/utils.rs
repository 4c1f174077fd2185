//! Utility functions for storefront

use crate::common::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::sync::{LockResult, PoisonError};

/// Percent-encoding set for a single URL path segment
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'&')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// Encode a value (e.g. a topic) for use as one path segment
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT_ENCODE_SET).to_string()
}

/// Parse an item number taken from a request path
pub fn parse_item_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid item number '{}'", raw)))
}

/// Recover the guard from a poisoned std lock. Record tables hold plain data
/// and are never left half-written across a panic.
pub fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("distributed systems"), "distributed%20systems");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("graduate school"), "graduate%20school");
        assert_eq!(encode_segment("plain"), "plain");
    }

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id("42").unwrap(), 42);
        assert!(matches!(parse_item_id("-1"), Err(Error::InvalidInput(_))));
        assert!(parse_item_id("abc").is_err());
    }
}
