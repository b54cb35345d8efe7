//! Ban tag codec.
//!
//! A banned value carries a fixed 4-byte header in front of its payload:
//!
//! ```text
//! reason (1) | 0xFF | 0xFF | 0xFF | payload...
//! ```
//!
//! The reason byte is unconstrained, so detection looks only at offsets
//! 1..4. A payload that itself starts with `?, 0xFF, 0xFF, 0xFF` reads as
//! banned. There is no escaping; the rule is kept byte-exact so existing
//! data keeps its meaning.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Length of the ban header.
pub const BAN_TAG_LEN: usize = 4;

/// Guard byte filling offsets 1..4 of the ban header.
pub const BAN_GUARD: u8 = 0xFF;

/// Policy reason recorded in a ban header. Opaque to this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BanReason(u8);

impl BanReason {
    /// Creates a reason code.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Returns the raw reason byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }
}

impl From<u8> for BanReason {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns true if `value` starts with a ban header.
#[must_use]
pub fn is_banned(value: &[u8]) -> bool {
    value.len() >= BAN_TAG_LEN && value[1..BAN_TAG_LEN] == [BAN_GUARD; BAN_TAG_LEN - 1]
}

/// Prefixes `value` with a ban header for `reason`.
///
/// Callers check [`is_banned`] first; tagging an already banned value
/// stacks a second header.
#[must_use]
pub fn apply_ban(value: &[u8], reason: BanReason) -> Vec<u8> {
    let mut tagged = Vec::with_capacity(BAN_TAG_LEN + value.len());
    tagged.extend_from_slice(&[reason.code(), BAN_GUARD, BAN_GUARD, BAN_GUARD]);
    tagged.extend_from_slice(value);
    tagged
}

/// Removes the ban header from `value`.
///
/// # Errors
///
/// Returns [`CoreError::MalformedValue`] if `value` is shorter than the header.
pub fn strip_ban(value: &[u8]) -> CoreResult<Vec<u8>> {
    value
        .get(BAN_TAG_LEN..)
        .map(<[u8]>::to_vec)
        .ok_or(CoreError::MalformedValue { len: value.len() })
}

/// Returns the reason code of a banned value.
#[must_use]
pub fn ban_reason(value: &[u8]) -> Option<BanReason> {
    is_banned(value).then(|| BanReason(value[0]))
}

/// Returns the payload with any ban header skipped.
#[must_use]
pub fn payload(value: &[u8]) -> &[u8] {
    if is_banned(value) {
        &value[BAN_TAG_LEN..]
    } else {
        value
    }
}
