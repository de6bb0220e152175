//! Session lifecycle behavior that does not require a live target.

use spyglass_core::{Address, AttachOptions, Error, Session, Signature};

#[test]
fn test_new_session_is_detached() {
    let session = Session::new();
    assert!(!session.is_attached());
    assert!(!session.did_exit());
}

#[test]
fn test_detached_queries_fail_with_not_attached() {
    let session = Session::new();

    assert!(matches!(session.pid(), Err(Error::NotAttached)));
    assert!(matches!(session.peb(), Err(Error::NotAttached)));
    assert!(matches!(session.base_address(), Err(Error::NotAttached)));
    assert!(matches!(session.memory(), Err(Error::NotAttached)));
    assert!(matches!(session.base_module(), Err(Error::NotAttached)));
    assert!(matches!(
        session.find_module("client.dll"),
        Err(Error::NotAttached)
    ));
}

#[test]
fn test_detached_scan_fails_with_not_attached() {
    let session = Session::new();
    let sig = Signature::parse("AA BB ?? DD").unwrap();

    assert!(matches!(
        session.find_signature(Address::new(0x1000), 0x1000, &sig),
        Err(Error::NotAttached)
    ));
}

#[test]
fn test_failed_attach_leaves_session_detached() {
    let mut session = Session::new();

    // No such pid on any reasonable system; on non-Windows hosts attachment
    // is rejected outright. Either way the attach signals, never panics.
    assert!(session.attach_pid(u32::MAX, AttachOptions::default()).is_err());
    assert!(!session.is_attached());
    assert!(matches!(session.pid(), Err(Error::NotAttached)));
}

#[test]
fn test_failed_attach_by_window_leaves_session_detached() {
    let mut session = Session::new();

    let result = session.attach_window(
        Some("spyglass-no-such-class"),
        Some("spyglass-no-such-title"),
        AttachOptions::default(),
    );
    assert!(result.is_err());
    assert!(!session.is_attached());
}

#[test]
fn test_detach_is_idempotent() {
    let mut session = Session::new();
    session.detach();
    session.detach();
    assert!(!session.is_attached());
}
