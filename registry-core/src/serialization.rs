//! Canonical CBOR encoding for stored records.
//!
//! Every record written to the ledger is an 8-byte discriminator followed by
//! the canonical CBOR body. The discriminator is the first 8 bytes of
//! `SHA-256("account:<TypeName>")`, so a record read back at an address is
//! checked against the type the caller expects.
//!
//! ## Canonicalization Rules (RFC 8949 Section 4.2)
//! 1. Struct fields are written in declaration order, so a type fixes its layout
//! 2. Integers and lengths encoded in minimal form
//! 3. No floating-point fields in records
//! 4. No indefinite-length encoding

use crate::crypto::sha256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Length of the type discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("CBOR encoding error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("CBOR decoding error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Non-canonical CBOR: {0}")]
    NonCanonical(&'static str),

    #[error("Record is {0} bytes, shorter than its discriminator")]
    Truncated(usize),

    #[error("Discriminator mismatch: expected {expected} record")]
    DiscriminatorMismatch { expected: &'static str },
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// A type that is stored as a ledger record.
pub trait Record: Serialize + DeserializeOwned {
    /// Type name hashed into the discriminator.
    const TYPE_NAME: &'static str;

    fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        let hash = sha256(format!("account:{}", Self::TYPE_NAME).as_bytes());
        let mut out = [0u8; DISCRIMINATOR_LEN];
        out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
        out
    }
}

/// Encode a record as discriminator + canonical CBOR.
pub fn encode_record<T: Record>(record: &T) -> Result<Vec<u8>> {
    let body = to_canonical_cbor(record)?;
    let mut buf = Vec::with_capacity(DISCRIMINATOR_LEN + body.len());
    buf.extend_from_slice(&T::discriminator());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode a record, checking its discriminator first.
pub fn decode_record<T: Record>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < DISCRIMINATOR_LEN {
        return Err(SerializationError::Truncated(bytes.len()));
    }
    let (prefix, body) = bytes.split_at(DISCRIMINATOR_LEN);
    if prefix != T::discriminator() {
        return Err(SerializationError::DiscriminatorMismatch {
            expected: T::TYPE_NAME,
        });
    }
    from_canonical_cbor(body)
}

/// Serialize a value to canonical CBOR bytes.
///
/// This produces a deterministic byte representation suitable for hashing.
pub fn to_canonical_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)?;

    // ciborium emits definite lengths; make sure nothing else slipped in
    verify_canonical(&buf)?;

    Ok(buf)
}

/// Deserialize a value from canonical CBOR bytes.
pub fn from_canonical_cbor<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    let value = ciborium::from_reader(bytes)?;
    Ok(value)
}

/// Verify that CBOR bytes are in canonical form.
///
/// Rejects indefinite-length items and non-minimal length/integer heads.
/// Map key ordering is left to ciborium, which writes keys in field order.
fn verify_canonical(bytes: &[u8]) -> Result<()> {
    let mut cursor = std::io::Cursor::new(bytes);
    verify_canonical_item(&mut cursor)
}

fn read_be<R: Read, const N: usize>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn verify_canonical_item<R: Read>(reader: &mut R) -> Result<()> {
    let mut head = [0u8; 1];
    reader.read_exact(&mut head)?;

    let major_type = head[0] >> 5;
    let additional_info = head[0] & 0x1F;

    let (argument, minimum) = match additional_info {
        0..=23 => (u64::from(additional_info), 0),
        24 => (read_be::<_, 1>(reader)?, 24),
        25 => (read_be::<_, 2>(reader)?, 1 << 8),
        26 => (read_be::<_, 4>(reader)?, 1 << 16),
        27 => (read_be::<_, 8>(reader)?, 1 << 32),
        31 => return Err(SerializationError::NonCanonical("indefinite-length encoding")),
        _ => return Err(SerializationError::NonCanonical("reserved additional info")),
    };

    // Major type 7 carries floats in 25..=27, which have no minimal form rule.
    if major_type != 7 && argument < minimum {
        return Err(SerializationError::NonCanonical("non-minimal length"));
    }

    match major_type {
        // byte / text string: skip the payload
        2 | 3 => {
            let skipped = std::io::copy(&mut reader.by_ref().take(argument), &mut std::io::sink())?;
            if skipped != argument {
                return Err(SerializationError::NonCanonical("truncated string"));
            }
        }
        4 => {
            for _ in 0..argument {
                verify_canonical_item(reader)?;
            }
        }
        5 => {
            for _ in 0..argument {
                verify_canonical_item(reader)?; // key
                verify_canonical_item(reader)?; // value
            }
        }
        6 => verify_canonical_item(reader)?,
        _ => {}
    }

    Ok(())
}
