mod support;

use anyhow::Result;
use authkeep::{CredentialHelper, Credentials, Error};
use secrecy::ExposeSecret;

use support::memory_helper;

const IDP: &str = "https://idp.example.com";

#[test]
fn add_then_get_returns_username_and_secret() -> Result<()> {
    let (helper, _, _) = memory_helper();

    helper.add(&Credentials::new(IDP, "alice", "s3cr3t"))?;
    let (username, secret) = helper.get(IDP)?;

    assert_eq!(username, "alice");
    assert_eq!(secret.expose_secret(), "s3cr3t");
    Ok(())
}

#[test]
fn add_overwrites_previous_credentials() -> Result<()> {
    let (helper, keyring, _) = memory_helper();

    helper.add(&Credentials::new(IDP, "alice", "old-secret"))?;
    helper.add(&Credentials::new(IDP, "alice.admin", "new-secret"))?;

    let (username, secret) = helper.get(IDP)?;
    assert_eq!(username, "alice.admin");
    assert_eq!(secret.expose_secret(), "new-secret");
    assert_eq!(keyring.len(), 1);
    Ok(())
}

#[test]
fn credentials_are_keyed_by_server_url() -> Result<()> {
    let (helper, _, _) = memory_helper();

    helper.add(&Credentials::new(IDP, "alice", "one"))?;
    helper.add(&Credentials::new("https://other.example.com", "bob", "two"))?;

    assert_eq!(helper.get(IDP)?.0, "alice");
    assert_eq!(helper.get("https://other.example.com")?.0, "bob");
    Ok(())
}

#[test]
fn get_unknown_url_is_not_found() {
    let (helper, _, logs) = memory_helper();

    assert!(matches!(
        helper.get("unknown-url"),
        Err(Error::CredentialsNotFound)
    ));
    assert!(logs.contents().contains("Keyring lookup failed"));
}

#[test]
fn delete_then_get_is_not_found() -> Result<()> {
    let (helper, keyring, _) = memory_helper();

    helper.add(&Credentials::new(IDP, "alice", "s3cr3t"))?;
    helper.delete(IDP)?;

    assert!(matches!(helper.get(IDP), Err(Error::CredentialsNotFound)));
    assert!(keyring.is_empty());
    Ok(())
}

#[test]
fn delete_missing_propagates_backend_error() {
    let (helper, _, _) = memory_helper();

    match helper.delete(IDP) {
        Err(Error::BackendWrite { key, source }) => {
            assert_eq!(key, IDP);
            assert!(matches!(
                source,
                authkeep::backend::BackendError::NotFound { .. }
            ));
        }
        other => panic!("expected BackendWrite, got {other:?}"),
    }
}

#[test]
fn corrupt_payload_is_reported_as_not_found() {
    let (helper, keyring, logs) = memory_helper();
    keyring.insert_raw(IDP, "{not json");

    assert!(matches!(helper.get(IDP), Err(Error::CredentialsNotFound)));

    let logs = logs.contents();
    assert!(logs.contains("ERROR"));
    assert!(logs.contains("Stored credential malformed"));
    assert!(logs.contains(IDP));
}

#[test]
fn stored_payload_uses_wire_field_names() -> Result<()> {
    let (helper, keyring, _) = memory_helper();
    helper.add(&Credentials::new(IDP, "alice", "s3cr3t"))?;

    let raw = keyring.raw(IDP).expect("item stored");
    let value: serde_json::Value = serde_json::from_slice(&raw)?;

    assert_eq!(value["username"], "alice");
    assert_eq!(value["serverURL"], IDP);
    assert_eq!(value["secret"], "s3cr3t");
    assert_eq!(keyring.label(IDP).as_deref(), Some(authkeep::CREDS_LABEL));
    Ok(())
}

#[test]
fn legacy_payload_is_readable() -> Result<()> {
    let (helper, keyring, _) = memory_helper();
    keyring.insert_raw(
        IDP,
        r#"{"ServerURL":"https://idp.example.com","Username":"alice","Secret":"s3cr3t"}"#,
    );

    let (username, secret) = helper.get(IDP)?;
    assert_eq!(username, "alice");
    assert_eq!(secret.expose_secret(), "s3cr3t");
    Ok(())
}

#[test]
fn empty_server_url_is_rejected() {
    let (helper, keyring, _) = memory_helper();

    assert!(matches!(
        helper.add(&Credentials::new("", "alice", "s3cr3t")),
        Err(Error::MissingServerUrl)
    ));
    assert!(keyring.is_empty());
}

#[test]
fn secret_never_reaches_logs() -> Result<()> {
    let (helper, keyring, logs) = memory_helper();
    helper.add(&Credentials::new(IDP, "alice", "s3cr3t"))?;
    helper.get(IDP)?;

    keyring.insert_raw("https://broken.example.com", r#"{"username":"x","secret":5}"#);
    assert!(helper.get("https://broken.example.com").is_err());

    assert!(!logs.contents().contains("s3cr3t"));
    Ok(())
}
