//! Example: registering and verifying an authority, then publishing a schema
//!
//! Run with: RUST_LOG=debug cargo run --example register_schema

use anyhow::Context;
use registry_core::{
    Address, InMemoryLedger, Instruction, Outcome, Registry, RegistryConfig, SchemaParams,
    Signer, Transaction,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Attestation Registry - Example Usage\n");
    println!("==============================================\n");

    // Step 1: Keys for the admin and for the party that wants to become an authority
    println!("1. Generating admin and authority keys...");
    let admin = Signer::generate();
    let authority = Signer::generate();
    println!("   Admin:     {}", admin.identity());
    println!("   Authority: {}\n", authority.identity());

    let program_id = Address([7u8; 32]);
    let config = RegistryConfig::new(program_id, admin.identity());
    let mut registry = Registry::new(InMemoryLedger::new(), config);

    // Step 2: One-time initialization
    println!("2. Initializing registry...");
    registry.process(&Transaction::new(program_id, Instruction::Initialize))?;
    println!("   Initialized\n");

    // Step 3: Self-registration
    println!("3. Registering authority...");
    let tx = Transaction::new(program_id, Instruction::FindOrSetAuthority {
        authority: authority.identity(),
        signer: authority.identity(),
    })
    .sign(&authority)?;
    if let Outcome::Authority(record) = registry.process(&tx)? {
        println!("   Status: {}\n", record.status());
    }

    // Step 4: Admin verification
    println!("4. Admin verifies the authority...");
    let tx = Transaction::new(program_id, Instruction::UpdateAuthority {
        authority: authority.identity(),
        verified: true,
        admin: admin.identity(),
    })
    .sign(&admin)?;
    if let Outcome::Authority(record) = registry.process(&tx)? {
        println!("   Status: {}\n", record.status());
    }

    // Step 5: Schema registration; the client derives the UID up front
    println!("5. Registering schema...");
    let expected_uid = registry
        .derivator()
        .schema(&authority.identity(), "example-schema")?;
    println!("   Expected UID: {}", expected_uid);

    let tx = Transaction::new(program_id, Instruction::Register {
        deployer: authority.identity(),
        payer: authority.identity(),
        schema: SchemaParams::new("example-schema", r#"{"name":"example","type":"object"}"#)
            .revocable(true),
    })
    .sign(&authority)?;
    let uid = match registry.process(&tx)? {
        Outcome::SchemaRegistered(uid) => uid,
        other => anyhow::bail!("unexpected outcome: {other:?}"),
    };
    println!("   Registered UID: {}\n", uid);

    // Step 6: Lookup by UID
    println!("6. Fetching schema by UID...");
    let schema = registry.fetch(&uid).context("schema should exist after registration")?;
    println!("   Name:      {}", schema.name);
    println!("   Content:   {}", schema.content);
    println!("   Deployer:  {}", schema.deployer);
    println!("   Resolver:  {:?}", schema.resolver);
    println!("   Revocable: {}\n", schema.revocable);

    println!("==============================================");
    println!("Events emitted:");
    for event in registry.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
