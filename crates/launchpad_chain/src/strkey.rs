//! Stellar strkey addresses.
//!
//! A strkey is the RFC 4648 base32 encoding (no padding) of
//! `version byte || 32-byte payload || crc16-xmodem (little endian)`,
//! which always yields 56 characters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

pub const STRKEY_LEN: usize = 56;
const RAW_LEN: usize = 35;

const VERSION_ACCOUNT: u8 = 6 << 3; // 'G'
const VERSION_CONTRACT: u8 = 2 << 3; // 'C'

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrKeyError {
    #[error("address must be {STRKEY_LEN} characters, got {0}")]
    Length(usize),

    #[error("invalid base32 character {0:?}")]
    Alphabet(char),

    #[error("unexpected version byte (expected {expected}, got {found})")]
    Version { expected: char, found: char },

    #[error("checksum mismatch")]
    Checksum,
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Result<Vec<u8>, StrKeyError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for c in text.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(StrKeyError::Alphabet(c))? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Ok(out)
}

fn version_char(version: u8) -> char {
    ALPHABET[(version >> 3) as usize] as char
}

fn encode(version: u8, payload: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(RAW_LEN);
    raw.push(version);
    raw.extend_from_slice(payload);
    let crc = crc16_xmodem(&raw);
    raw.extend_from_slice(&crc.to_le_bytes());
    base32_encode(&raw)
}

fn decode(version: u8, text: &str) -> Result<[u8; 32], StrKeyError> {
    if text.len() != STRKEY_LEN {
        return Err(StrKeyError::Length(text.len()));
    }
    let raw = base32_decode(text)?;
    if raw.len() != RAW_LEN {
        return Err(StrKeyError::Length(text.len()));
    }
    if raw[0] != version {
        return Err(StrKeyError::Version {
            expected: version_char(version),
            found: text.chars().next().unwrap_or('?'),
        });
    }
    let (body, checksum) = raw.split_at(RAW_LEN - 2);
    if crc16_xmodem(body).to_le_bytes() != checksum {
        return Err(StrKeyError::Checksum);
    }
    let mut payload = [0u8; 32];
    payload.copy_from_slice(&body[1..]);
    Ok(payload)
}

// ---------------------------------------------------------------------------
// Typed keys
// ---------------------------------------------------------------------------

macro_rules! strkey_type {
    ($(#[$meta:meta])* $name:ident, $version:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = StrKeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode($version, s.trim()).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&encode($version, &self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

strkey_type!(
    /// An ed25519 account public key (`G...`).
    AccountId,
    VERSION_ACCOUNT
);

strkey_type!(
    /// A Soroban contract id (`C...`).
    ContractId,
    VERSION_CONTRACT
);

/// Either kind of on-chain address, as carried by `SCAddress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    Account(AccountId),
    Contract(ContractId),
}

impl FromStr for Address {
    type Err = StrKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.chars().next() {
            Some('C') => s.parse().map(Address::Contract),
            _ => s.parse().map(Address::Account),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Account(a) => fmt::Display::fmt(a, f),
            Address::Contract(c) => fmt::Display::fmt(c, f),
        }
    }
}

impl From<AccountId> for Address {
    fn from(a: AccountId) -> Self {
        Address::Account(a)
    }
}

impl From<ContractId> for Address {
    fn from(c: ContractId) -> Self {
        Address::Contract(c)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    #[test]
    fn zero_account_matches_known_encoding() {
        assert_eq!(AccountId([0u8; 32]).to_string(), ZERO_ACCOUNT);
        assert_eq!(ZERO_ACCOUNT.parse::<AccountId>().unwrap(), AccountId([0u8; 32]));
    }

    #[test]
    fn contract_ids_start_with_c() {
        let id = ContractId([7u8; 32]);
        let text = id.to_string();
        assert_eq!(text.len(), STRKEY_LEN);
        assert!(text.starts_with('C'));
        assert_eq!(text.parse::<ContractId>().unwrap(), id);
    }

    #[test]
    fn wrong_version_rejected() {
        let contract = ContractId([1u8; 32]).to_string();
        let err = contract.parse::<AccountId>().unwrap_err();
        assert!(matches!(err, StrKeyError::Version { expected: 'G', found: 'C' }));
    }

    #[test]
    fn bad_checksum_rejected() {
        let mut text = AccountId([9u8; 32]).to_string();
        // Flip a payload character.
        let replacement = if text.as_bytes()[10] == b'A' { "B" } else { "A" };
        text.replace_range(10..11, replacement);
        assert_eq!(text.parse::<AccountId>().unwrap_err(), StrKeyError::Checksum);
    }

    #[test]
    fn wrong_length_and_alphabet_rejected() {
        assert_eq!("GABC".parse::<AccountId>().unwrap_err(), StrKeyError::Length(4));
        let lower = ZERO_ACCOUNT.to_lowercase();
        assert!(matches!(
            lower.parse::<AccountId>().unwrap_err(),
            StrKeyError::Alphabet('g')
        ));
    }

    #[test]
    fn address_dispatches_on_prefix() {
        let account: Address = ZERO_ACCOUNT.parse().unwrap();
        assert!(matches!(account, Address::Account(_)));
        let contract: Address = ContractId([3u8; 32]).to_string().parse().unwrap();
        assert!(matches!(contract, Address::Contract(_)));
    }

    #[test]
    fn serde_uses_strkey_text() {
        let json = serde_json::to_string(&AccountId([0u8; 32])).unwrap();
        assert_eq!(json, format!("\"{ZERO_ACCOUNT}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Address::Account(AccountId([0u8; 32])));
    }
}
