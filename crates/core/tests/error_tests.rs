// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use rust_decimal_macros::dec;

use crypto_portfolio_core::errors::{CoreError, Rejection, RemoteError, RemoteErrorKind};

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn invalid_snapshot() {
        let err = CoreError::InvalidSnapshot("bad header".into());
        assert_eq!(err.to_string(), "Invalid snapshot: bad header");
    }

    #[test]
    fn unsupported_version() {
        let err = CoreError::UnsupportedVersion(99);
        assert_eq!(err.to_string(), "Unsupported snapshot version: 99");
    }

    #[test]
    fn storage() {
        let err = CoreError::Storage("coin 'bitcoin' already exists".into());
        assert_eq!(err.to_string(), "Storage error: coin 'bitcoin' already exists");
    }

    #[test]
    fn config() {
        let err = CoreError::Config("PRICE_SEARCH_LIMIT must be greater than zero".into());
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn remote_kinds() {
        assert_eq!(RemoteErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(RemoteErrorKind::Connection.to_string(), "connection");
        assert_eq!(RemoteErrorKind::HttpStatus.to_string(), "http-status");
        assert_eq!(RemoteErrorKind::Other.to_string(), "other");
    }

    #[test]
    fn remote_wrapped() {
        let err = CoreError::Remote(RemoteError::new(RemoteErrorKind::Connection, "refused"));
        assert_eq!(err.to_string(), "Price service error: connection error: refused");
    }

    #[test]
    fn insufficient_balance_names_available_amount() {
        let err = Rejection::InsufficientBalance {
            available: dec!(1.0),
            requested: dec!(2.0),
        };
        assert_eq!(err.to_string(), "insufficient balance, available: 1.0");
    }

    #[test]
    fn rejection_wrapped() {
        let err = CoreError::from(Rejection::NotHeld("bitcoin".into()));
        assert_eq!(
            err.to_string(),
            "Transaction rejected: coin not held, nothing to sell: bitcoin"
        );
    }

    #[test]
    fn invalid_quantity_mentions_precision() {
        let msg = Rejection::InvalidQuantity(dec!(0)).to_string();
        assert!(msg.contains("8 decimal places"), "{msg}");
        assert!(msg.contains("below 1000000000000"), "{msg}");
    }

    #[test]
    fn overflow_display() {
        let err = CoreError::Overflow("bought value out of range".into());
        assert_eq!(err.to_string(), "Arithmetic overflow: bought value out of range");
    }
}

// ── Conversions ─────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::FileIO(ref m) if m.contains("gone")));
    }

    #[test]
    fn from_json_error_is_malformed_remote() {
        let json = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json.into();
        match err {
            CoreError::Remote(remote) => assert_eq!(remote.kind, RemoteErrorKind::Other),
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn into_remote_passes_remote_through() {
        let remote = RemoteError::new(RemoteErrorKind::Timeout, "slow");
        assert_eq!(CoreError::Remote(remote.clone()).into_remote(), remote);
    }

    #[test]
    fn into_remote_collapses_others() {
        let remote = CoreError::Storage("disk".into()).into_remote();
        assert_eq!(remote.kind, RemoteErrorKind::Other);
        assert_eq!(remote.message, "Storage error: disk");
    }

    #[test]
    fn malformed_is_other() {
        assert_eq!(RemoteError::malformed("x").kind, RemoteErrorKind::Other);
    }
}

// ── Traits ──────────────────────────────────────────────────────────

#[test]
fn core_error_is_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
    assert_error::<CoreError>();
    assert_error::<RemoteError>();
    assert_error::<Rejection>();
}

#[test]
fn remote_error_serializes() {
    let err = RemoteError::new(RemoteErrorKind::HttpStatus, "503");
    let json = serde_json::to_string(&err).unwrap();
    let back: RemoteError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
}
