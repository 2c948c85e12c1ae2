use brokerkit::config::{MechanismKind, SecurityConfig};
use brokerkit::error::BrokerKitError;
use brokerkit::sasl::{Mechanism, SaslMechanism, select_mechanism};

#[test]
fn missing_credentials_select_nothing() {
    for (username, password) in [("", ""), ("u", ""), ("", "p")] {
        for mechanism in [MechanismKind::Plain, MechanismKind::ScramSha512] {
            let config = SecurityConfig::builder()
                .username(username)
                .password(password)
                .mechanism(mechanism)
                .build();
            assert!(select_mechanism(&config).unwrap().is_none());
        }
    }
}

#[test]
fn scram_selected_with_credentials() {
    let config = SecurityConfig::builder()
        .username("u")
        .password("p")
        .mechanism(MechanismKind::ScramSha512)
        .build();
    let mechanism = select_mechanism(&config).unwrap().unwrap();

    assert_eq!(mechanism.kind(), MechanismKind::ScramSha512);
    assert_eq!(mechanism.name(), "SCRAM-SHA-512");
    assert_eq!(mechanism.username(), "u");

    let (_, client_first) = mechanism.start().unwrap();
    let client_first = String::from_utf8(client_first).unwrap();
    assert!(client_first.starts_with("n,,n=u,r="), "{client_first}");
}

#[test]
fn plain_selected_by_default() {
    let config = SecurityConfig::builder().username("u").password("p").build();
    let mechanism = select_mechanism(&config).unwrap().unwrap();

    match &mechanism {
        SaslMechanism::Plain(plain) => {
            assert_eq!(plain.username(), "u");
            assert_eq!(plain.password(), "p");
        }
        other => panic!("expected PLAIN, got {other:?}"),
    }
    assert_eq!(mechanism.name(), "PLAIN");
}

#[test]
fn plain_carries_credentials_verbatim() {
    let config = SecurityConfig::builder()
        .username(" user=with,odd chars ")
        .password("pa\0ss")
        .mechanism(MechanismKind::Plain)
        .build();
    let mechanism = select_mechanism(&config).unwrap().unwrap();

    let (mut conversation, initial) = mechanism.start().unwrap();
    assert_eq!(initial, b"\0 user=with,odd chars \0pa\0ss".to_vec());
    let step = conversation.next(b"").unwrap();
    assert!(step.done);
    assert!(step.response.is_empty());
}

#[test]
fn scram_rejects_malformed_credentials() {
    let config = SecurityConfig::builder()
        .username("u")
        .password("bad\u{7}password")
        .mechanism(MechanismKind::ScramSha512)
        .build();
    assert!(matches!(
        select_mechanism(&config),
        Err(BrokerKitError::Sasl(_))
    ));
}

#[test]
fn debug_output_redacts_passwords() {
    let config = SecurityConfig::builder()
        .username("u")
        .password("hunter2")
        .mechanism(MechanismKind::ScramSha512)
        .build();
    assert!(!format!("{config:?}").contains("hunter2"));

    let mechanism = select_mechanism(&config).unwrap().unwrap();
    assert!(!format!("{mechanism:?}").contains("hunter2"));
}
