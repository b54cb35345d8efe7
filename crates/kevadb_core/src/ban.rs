//! Ban and unban transitions.
//!
//! Both transitions read the current value and write back only when the
//! record changes state. The read and the write are two separate engine
//! calls; callers serialize mutations of the same key.

use crate::codec::{apply_ban, is_banned, strip_ban, BanReason};
use crate::error::CoreResult;
use crate::gateway::{read, write};
use crate::key::StorageKey;
use kevadb_storage::KvEngine;
use tracing::debug;

/// State of a record, derived from its stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// No value at the key.
    Absent,
    /// Value present without a ban header.
    Unbanned,
    /// Value present with a ban header.
    Banned,
}

impl RecordState {
    /// Classifies a lookup result.
    #[must_use]
    pub fn of(value: Option<&[u8]>) -> Self {
        match value {
            None => Self::Absent,
            Some(v) if is_banned(v) => Self::Banned,
            Some(_) => Self::Unbanned,
        }
    }
}

/// What a ban transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanOutcome {
    /// The ban header was written.
    Applied,
    /// The ban header was removed.
    Cleared,
    /// Already banned; the stored reason was kept.
    AlreadyBanned,
    /// Not banned; nothing to clear.
    NotBanned,
    /// No record at the key.
    Absent,
}

impl BanOutcome {
    /// Returns true if the transition wrote to the engine.
    #[must_use]
    pub const fn wrote(self) -> bool {
        matches!(self, Self::Applied | Self::Cleared)
    }
}

/// Bans the record at `key` with `reason`.
///
/// Absent and already banned records are left untouched.
///
/// # Errors
///
/// Returns an error if the engine read or write fails.
pub fn set_ban(
    engine: &dyn KvEngine,
    key: &StorageKey,
    reason: BanReason,
) -> CoreResult<BanOutcome> {
    let current = read(engine, key)?;
    let outcome = match RecordState::of(current.as_deref()) {
        RecordState::Absent => BanOutcome::Absent,
        RecordState::Banned => BanOutcome::AlreadyBanned,
        RecordState::Unbanned => {
            let value = current.unwrap_or_default();
            write(engine, key, &apply_ban(&value, reason))?;
            BanOutcome::Applied
        }
    };
    debug!(%key, %reason, ?outcome, "set ban");
    Ok(outcome)
}

/// Removes the ban from the record at `key`.
///
/// Absent and unbanned records are left untouched.
///
/// # Errors
///
/// Returns an error if the engine read or write fails.
pub fn clear_ban(engine: &dyn KvEngine, key: &StorageKey) -> CoreResult<BanOutcome> {
    let current = read(engine, key)?;
    let outcome = match RecordState::of(current.as_deref()) {
        RecordState::Absent => BanOutcome::Absent,
        RecordState::Unbanned => BanOutcome::NotBanned,
        RecordState::Banned => {
            let value = current.unwrap_or_default();
            write(engine, key, &strip_ban(&value)?)?;
            BanOutcome::Cleared
        }
    };
    debug!(%key, ?outcome, "clear ban");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use kevadb_storage::InMemoryEngine;

    const KEY: StorageKey = StorageKey::from_bytes([0x11; 16]);

    fn engine_with(value: &[u8]) -> InMemoryEngine {
        let engine = InMemoryEngine::new();
        engine.put(KEY.as_ref(), value).unwrap();
        engine
    }

    #[test]
    fn record_state_classification() {
        assert_eq!(RecordState::of(None), RecordState::Absent);
        assert_eq!(RecordState::of(Some(b"")), RecordState::Unbanned);
        assert_eq!(RecordState::of(Some(b"script")), RecordState::Unbanned);
        assert_eq!(
            RecordState::of(Some(&[9, 0xFF, 0xFF, 0xFF])),
            RecordState::Banned
        );
    }

    #[test]
    fn ban_absent_is_noop() {
        let engine = InMemoryEngine::new();
        let outcome = set_ban(&engine, &KEY, BanReason::new(1)).unwrap();
        assert_eq!(outcome, BanOutcome::Absent);
        assert!(engine.is_empty());
    }

    #[test]
    fn ban_unbanned_prepends_header() {
        let engine = engine_with(b"hello");
        let outcome = set_ban(&engine, &KEY, BanReason::new(7)).unwrap();
        assert_eq!(outcome, BanOutcome::Applied);
        assert_eq!(
            engine.get(KEY.as_ref()).unwrap().unwrap(),
            vec![7, 0xFF, 0xFF, 0xFF, b'h', b'e', b'l', b'l', b'o']
        );
    }

    #[test]
    fn ban_keeps_original_reason() {
        let engine = engine_with(b"hello");
        set_ban(&engine, &KEY, BanReason::new(7)).unwrap();
        let outcome = set_ban(&engine, &KEY, BanReason::new(9)).unwrap();
        assert_eq!(outcome, BanOutcome::AlreadyBanned);
        assert!(!outcome.wrote());
        assert_eq!(engine.get(KEY.as_ref()).unwrap().unwrap()[0], 7);
    }

    #[test]
    fn ban_empty_value() {
        let engine = engine_with(b"");
        assert_eq!(
            set_ban(&engine, &KEY, BanReason::default()).unwrap(),
            BanOutcome::Applied
        );
        assert_eq!(
            engine.get(KEY.as_ref()).unwrap(),
            Some(vec![0, 0xFF, 0xFF, 0xFF])
        );
    }

    #[test]
    fn unban_restores_payload() {
        let engine = engine_with(b"hello");
        set_ban(&engine, &KEY, BanReason::new(3)).unwrap();
        let outcome = clear_ban(&engine, &KEY).unwrap();
        assert_eq!(outcome, BanOutcome::Cleared);
        assert!(outcome.wrote());
        assert_eq!(engine.get(KEY.as_ref()).unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn unban_unbanned_is_noop() {
        let engine = engine_with(b"hello");
        assert_eq!(clear_ban(&engine, &KEY).unwrap(), BanOutcome::NotBanned);
        assert_eq!(engine.get(KEY.as_ref()).unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn unban_absent_is_noop() {
        let engine = InMemoryEngine::new();
        assert_eq!(clear_ban(&engine, &KEY).unwrap(), BanOutcome::Absent);
        assert!(engine.is_empty());
    }

    #[test]
    fn write_failure_propagates() {
        let engine = engine_with(b"hello");
        engine.fail_puts(true);
        let err = set_ban(&engine, &KEY, BanReason::new(1)).unwrap_err();
        assert!(matches!(err, CoreError::StoreWrite(_)));
        assert_eq!(engine.get(KEY.as_ref()).unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn read_failure_propagates() {
        let engine = engine_with(b"hello");
        engine.close().unwrap();
        let err = clear_ban(&engine, &KEY).unwrap_err();
        assert!(matches!(err, CoreError::StoreRead(_)));
    }
}
