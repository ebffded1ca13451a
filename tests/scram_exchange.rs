//! End-to-end SCRAM exchanges, driven purely through the public API.

use std::sync::Arc;

use sasl_scram::credential::{Credential, CredentialQuery, CredentialSecret, CredentialStore, ScramSecret};
use sasl_scram::mechanism::Role;
use sasl_scram::registry::StartOptions;
use sasl_scram::scram::HashAlgorithm;
use sasl_scram::{AuthManager, Error, ProtocolError};

struct FixedStore {
    username: &'static str,
    password: &'static str,
}

impl CredentialStore for FixedStore {
    fn lookup(&self, query: &CredentialQuery) -> Result<Option<Credential>, Error> {
        if query.username == self.username {
            Ok(Some(Credential {
                username: self.username.to_string(),
                secret: CredentialSecret::Cleartext(self.password.to_string().into()),
                iterations: Some(4096),
            }))
        } else {
            Ok(None)
        }
    }
}

struct PreDerivedStore {
    username: &'static str,
    secret: ScramSecret,
}

impl CredentialStore for PreDerivedStore {
    fn lookup(&self, query: &CredentialQuery) -> Result<Option<Credential>, Error> {
        if query.username == self.username {
            Ok(Some(Credential {
                username: self.username.to_string(),
                secret: CredentialSecret::Scram(self.secret.clone()),
                iterations: None,
            }))
        } else {
            Ok(None)
        }
    }
}

fn run_exchange(manager: &AuthManager, algo_name: &str, username: &str, password: &str) -> Result<(), Error> {
    let client_options = StartOptions::new().with_text("username", username).with_text("password", password);
    let mut client = manager.start(algo_name, Role::Client, &client_options)?;
    let mut server = manager.start(algo_name, Role::Server, &StartOptions::new())?;

    let first = client.next(None)?.unwrap();
    let server_first = server.next(Some(&first))?.unwrap();
    let client_final = client.next(Some(&server_first))?.unwrap();
    let server_final = server.next(Some(&client_final))?.unwrap();

    // A failure response is still `Ok(Some(...))` at the MechanismContext
    // layer (it's a valid wire message); parse it and surface any `e=`.
    let text = std::str::from_utf8(&server_final).unwrap();
    if let Some(err) = text.strip_prefix("e=") {
        return Err(ProtocolError::parse(err).into());
    }

    client.next(Some(&server_final))?;
    assert!(client.done());
    assert!(server.done());
    Ok(())
}

#[test]
fn succeeds_for_every_hash_algorithm_with_cleartext_store() {
    for algo_name in ["SCRAM-SHA-1", "SCRAM-SHA-256", "SCRAM-SHA-512"] {
        let store = Arc::new(FixedStore { username: "user", password: "pencil" });
        let manager = AuthManager::new(store);
        run_exchange(&manager, algo_name, "user", "pencil").unwrap();
    }
}

#[test]
fn succeeds_with_prederived_scram_secret() {
    let salt = vec![0xde, 0xad, 0xbe, 0xef];
    let iterations = 4096;
    let salted = HashAlgorithm::Sha256.salted_password(b"pencil", &salt, iterations);
    let client_key = HashAlgorithm::Sha256.client_key(&salted).unwrap();
    let stored_key = HashAlgorithm::Sha256.stored_key(&client_key);
    let server_key = HashAlgorithm::Sha256.server_key(&salted).unwrap();

    let store = Arc::new(PreDerivedStore {
        username: "user",
        secret: ScramSecret { algo: HashAlgorithm::Sha256, salt, iterations, stored_key, server_key },
    });
    let manager = AuthManager::new(store);
    run_exchange(&manager, "SCRAM-SHA-256", "user", "pencil").unwrap();
}

#[test]
fn wrong_password_fails_with_invalid_proof() {
    let store = Arc::new(FixedStore { username: "user", password: "pencil" });
    let manager = AuthManager::new(store);
    let err = run_exchange(&manager, "SCRAM-SHA-256", "user", "not-pencil").unwrap_err();
    assert!(matches!(err, Error::Protocol(ProtocolError::InvalidProof)));
}

#[test]
fn unknown_user_fails_with_unknown_user_not_a_distinguishable_error() {
    let store = Arc::new(FixedStore { username: "user", password: "pencil" });
    let manager = AuthManager::new(store);
    let err = run_exchange(&manager, "SCRAM-SHA-256", "nobody", "pencil").unwrap_err();
    assert!(matches!(err, Error::Protocol(ProtocolError::UnknownUser)));
}

#[test]
fn server_rejects_an_m_extension_attribute() {
    let store = Arc::new(FixedStore { username: "user", password: "pencil" });
    let manager = AuthManager::new(store);
    let mut server = manager.start("SCRAM-SHA-256", Role::Server, &StartOptions::new()).unwrap();
    let response = server.next(Some(b"n,,m=future-extension,n=user,r=abcdefghijklmnopqrstuvwx")).unwrap();
    let text = std::str::from_utf8(&response.unwrap()).unwrap();
    assert_eq!(text, "e=extensions-not-supported");
}

#[test]
fn tampered_channel_binding_is_rejected() {
    let store = Arc::new(FixedStore { username: "user", password: "pencil" });
    let manager = AuthManager::new(store);
    let mut client = manager
        .start(
            "SCRAM-SHA-256",
            Role::Client,
            &StartOptions::new().with_text("username", "user").with_text("password", "pencil"),
        )
        .unwrap();
    let mut server = manager.start("SCRAM-SHA-256", Role::Server, &StartOptions::new()).unwrap();

    let first = client.next(None).unwrap().unwrap();
    let server_first = server.next(Some(&first)).unwrap().unwrap();
    let client_final = client.next(Some(&server_first)).unwrap().unwrap();

    // Flip the channel-binding attribute to a value that base64-decodes to
    // something other than the GS2 header the client actually sent.
    let mut tampered = std::str::from_utf8(&client_final).unwrap().to_string();
    tampered = tampered.replacen("c=biws", "c=eSws", 1);

    let response = server.next(Some(tampered.as_bytes())).unwrap().unwrap();
    let text = std::str::from_utf8(&response).unwrap();
    assert_eq!(text, "e=channel-bindings-dont-match");
}

#[test]
fn reproduces_rfc_5802_worked_example_byte_for_byte() {
    // RFC 5802 §5, SCRAM-SHA-1, user "user" / password "pencil", fixing both
    // nonce contributions and the server's salt via the test-only
    // `random_sequence`/`salt` start options.
    let store = Arc::new(FixedStore { username: "user", password: "pencil" });
    let manager = AuthManager::new(store);

    let client_options = StartOptions::new()
        .with_text("username", "user")
        .with_text("password", "pencil")
        .with_text("random_sequence", "fyko+d2lbbFgONRv9qkxdawL");
    let server_options = StartOptions::new()
        .with_text("random_sequence", "3rfcNHYJY1ZVvWVs7j")
        .with_text("salt", "QSXCR+Q6sek8bf92");

    let mut client = manager.start("SCRAM-SHA-1", Role::Client, &client_options).unwrap();
    let mut server = manager.start("SCRAM-SHA-1", Role::Server, &server_options).unwrap();

    let first = client.next(None).unwrap().unwrap();
    assert_eq!(first, b"n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL");

    let server_first = server.next(Some(&first)).unwrap().unwrap();
    assert_eq!(
        std::str::from_utf8(&server_first).unwrap(),
        "r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096"
    );

    let client_final = client.next(Some(&server_first)).unwrap().unwrap();
    assert_eq!(
        std::str::from_utf8(&client_final).unwrap(),
        "c=biws,r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,p=v0X8v3Bz2T0CJGbJQyF0X+HI4Ts="
    );

    let server_final = server.next(Some(&client_final)).unwrap().unwrap();
    assert_eq!(std::str::from_utf8(&server_final).unwrap(), "v=rmF9pqV8S7suAoZWja4dJRkFsKQ=");

    client.next(Some(&server_final)).unwrap();
    assert!(client.done());
    assert!(server.done());
}

#[test]
fn anonymous_requires_no_credential_store() {
    let manager = AuthManager::without_store();
    let mut client = manager
        .start("ANONYMOUS", Role::Client, &StartOptions::new().with_text("trace_info", "guest@example.com"))
        .unwrap();
    let mut server = manager.start("ANONYMOUS", Role::Server, &StartOptions::new()).unwrap();

    let msg = client.next(None).unwrap().unwrap();
    assert!(server.next(Some(&msg)).unwrap().is_none());
    assert!(client.done());
    assert!(server.done());
}
