use paylock_core::{Amount, CredentialError, ErrorKind, EscrowError, PrivateKey, Result};

fn assert_kind<T: std::fmt::Debug>(res: Result<T>, expected: ErrorKind) {
    match res {
        Err(e) => assert_eq!(e.kind(), expected),
        Ok(v) => panic!("Expected {expected} error, got Ok({v:?})"),
    }
}

#[test]
fn amounts_round_trip_at_six_digits() {
    for s in ["0.000000", "0.001000", "1.000000", "99.999999", "123456.654321"] {
        let amount: Amount = s.parse().unwrap();
        assert_eq!(amount.to_string(), s);
    }
    // Shorter fractions are padded on the way back.
    let amount: Amount = "7.25".parse().unwrap();
    assert_eq!(amount.base_units(), 7_250_000);
    assert_eq!(amount.to_string(), "7.250000");
}

#[test]
fn malformed_amounts() {
    assert_kind(Amount::parse("-1"), ErrorKind::InvalidAmount);
    assert_kind(Amount::parse("abc"), ErrorKind::InvalidAmount);
    assert_kind(Amount::parse(""), ErrorKind::InvalidAmount);
    assert_kind(Amount::try_from(-0.5), ErrorKind::InvalidAmount);
}

#[test]
fn credential_validation() {
    let key = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    assert!(key.parse::<PrivateKey>().is_ok());
    assert!(format!("0x{key}").parse::<PrivateKey>().is_ok());
    assert_eq!(
        key[1..].parse::<PrivateKey>().unwrap_err(),
        CredentialError::InvalidLength(63)
    );
}

#[test]
fn fixed_messages_are_stable() {
    let err: EscrowError = ErrorKind::EscrowAlreadyCompleted.into();
    assert_eq!(
        err.to_string(),
        "Escrow already completed: cannot modify a completed escrow"
    );

    let unknown = EscrowError::unknown("execution reverted: paused");
    assert_eq!(unknown.kind(), ErrorKind::Unknown);
    assert_eq!(unknown.to_string(), "execution reverted: paused");
}
