//! Full registry flow driven through signed transactions.

use registry_core::{
    Address, AuthorityStatus, InMemoryLedger, Instruction, Outcome, Registry, RegistryConfig,
    RegistryError, RegistryEvent, SchemaParams, Signer, Transaction,
};

const SCHEMA_CONTENT: &str = r#"{"name":"example","type":"object"}"#;
const PROGRAM_ID: Address = Address([7u8; 32]);

struct Harness {
    registry: Registry,
    admin: Signer,
    authority: Signer,
}

fn harness() -> Harness {
    let admin = Signer::generate();
    let config = RegistryConfig::new(PROGRAM_ID, admin.identity());
    Harness {
        registry: Registry::new(InMemoryLedger::new(), config),
        admin,
        authority: Signer::generate(),
    }
}

fn register_authority_tx(signer: &Signer) -> Transaction {
    Transaction::new(PROGRAM_ID, Instruction::FindOrSetAuthority {
        authority: signer.identity(),
        signer: signer.identity(),
    })
    .sign(signer)
    .unwrap()
}

fn verify_tx(authority: &Signer, admin: &Signer, signed_by: &Signer) -> Transaction {
    Transaction::new(PROGRAM_ID, Instruction::UpdateAuthority {
        authority: authority.identity(),
        verified: true,
        admin: admin.identity(),
    })
    .sign(signed_by)
    .unwrap()
}

fn register_schema_tx(deployer: &Signer, name: &str, content: &str) -> Transaction {
    Transaction::new(PROGRAM_ID, Instruction::Register {
        deployer: deployer.identity(),
        payer: deployer.identity(),
        schema: SchemaParams::new(name, content).revocable(true),
    })
    .sign(deployer)
    .unwrap()
}

#[test]
fn end_to_end_scenario() {
    let Harness {
        mut registry,
        admin,
        authority,
    } = harness();

    registry
        .process(&Transaction::new(PROGRAM_ID, Instruction::Initialize))
        .unwrap();

    let outcome = registry.process(&register_authority_tx(&authority)).unwrap();
    let Outcome::Authority(record) = outcome else {
        panic!("expected authority outcome, got {outcome:?}");
    };
    assert_eq!(record.authority, authority.identity());
    assert_eq!(record.status(), AuthorityStatus::Unverified);

    let outcome = registry.process(&verify_tx(&authority, &admin, &admin)).unwrap();
    assert!(matches!(outcome, Outcome::Authority(ref r) if r.is_verified));

    let outcome = registry
        .process(&register_schema_tx(&authority, "example-schema", SCHEMA_CONTENT))
        .unwrap();
    let Outcome::SchemaRegistered(uid) = outcome else {
        panic!("expected schema outcome, got {outcome:?}");
    };

    let schema = registry.fetch(&uid).unwrap();
    assert_eq!(schema.uid, uid);
    assert_eq!(schema.name, "example-schema");
    assert_eq!(schema.content, SCHEMA_CONTENT);
    assert_eq!(schema.resolver, None);
    assert!(schema.revocable);
    assert_eq!(schema.deployer, authority.identity());

    let events = registry.take_events();
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events.last(),
        Some(RegistryEvent::SchemaRegistered { name, .. }) if name == "example-schema"
    ));
}

#[test]
fn verification_signed_by_impostor_is_rejected() {
    let Harness {
        mut registry,
        admin,
        authority,
    } = harness();
    registry.process(&register_authority_tx(&authority)).unwrap();

    // names the admin but is signed by the authority itself
    let err = registry
        .process(&verify_tx(&authority, &admin, &authority))
        .unwrap_err();

    assert!(matches!(err, RegistryError::Unauthorized(_)));
    assert!(!registry
        .fetch_authority(&authority.identity())
        .unwrap()
        .is_verified);
}

#[test]
fn duplicate_schema_keeps_first_content() {
    let Harness {
        mut registry,
        authority,
        ..
    } = harness();
    registry
        .process(&Transaction::new(PROGRAM_ID, Instruction::Initialize))
        .unwrap();

    let first = registry
        .process(&register_schema_tx(&authority, "s1", "c1"))
        .unwrap();
    let err = registry
        .process(&register_schema_tx(&authority, "s1", "c2"))
        .unwrap_err();

    let Outcome::SchemaRegistered(uid) = first else {
        panic!("expected schema outcome");
    };
    assert!(matches!(err, RegistryError::AlreadyExists(_)));
    assert_eq!(registry.fetch(&uid).unwrap().content, "c1");
}

#[test]
fn transaction_survives_wire_encoding() {
    let Harness {
        mut registry,
        authority,
        ..
    } = harness();

    let bytes = register_authority_tx(&authority).to_bytes().unwrap();
    let decoded = Transaction::from_bytes(&bytes).unwrap();

    assert!(registry.process(&decoded).is_ok());
    assert_eq!(registry.ledger().allocations(), 1);
}

#[test]
fn admin_signature_does_not_carry_across_deployments() {
    let Harness {
        mut registry,
        admin,
        authority,
    } = harness();
    let other_program = Address([8u8; 32]);
    let config = RegistryConfig::new(other_program, admin.identity());
    let mut other = Registry::new(InMemoryLedger::new(), config);

    registry.process(&register_authority_tx(&authority)).unwrap();
    let verify = verify_tx(&authority, &admin, &admin);
    registry.process(&verify).unwrap();

    // same authority registered on the second deployment, then the first
    // deployment's admin transaction is replayed there
    let register_there = Transaction::new(
        other_program,
        Instruction::FindOrSetAuthority {
            authority: authority.identity(),
            signer: authority.identity(),
        },
    )
    .sign(&authority)
    .unwrap();
    other.process(&register_there).unwrap();

    let err = other.process(&verify).unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized(_)));

    // retargeting the replayed transaction breaks its signature
    let mut retargeted = verify.clone();
    retargeted.program_id = other_program;
    let err = other.process(&retargeted).unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized(_)));

    assert!(!other
        .fetch_authority(&authority.identity())
        .unwrap()
        .is_verified);
    assert_eq!(*other.derivator().program_id(), other_program);
}
