//! Soroban contract values (`SCVal`) and their XDR encoding.
//!
//! Only the value kinds the launchpad contracts exchange are modelled. Anything
//! else decodes to [`XdrError::Discriminant`].

use crate::strkey::{AccountId, Address, ContractId};
use crate::xdr::{XdrError, XdrReader, XdrWriter, from_base64, to_base64};

const MAX_DEPTH: usize = 64;
const MAX_BYTES: u32 = 256 * 1024;
const MAX_SYMBOL: u32 = 32;

// SCValType discriminants.
const SCV_BOOL: i32 = 0;
const SCV_VOID: i32 = 1;
const SCV_U32: i32 = 3;
const SCV_I32: i32 = 4;
const SCV_U64: i32 = 5;
const SCV_I64: i32 = 6;
const SCV_TIMEPOINT: i32 = 7;
const SCV_DURATION: i32 = 8;
const SCV_U128: i32 = 9;
const SCV_I128: i32 = 10;
const SCV_BYTES: i32 = 13;
const SCV_STRING: i32 = 14;
const SCV_SYMBOL: i32 = 15;
const SCV_VEC: i32 = 16;
const SCV_MAP: i32 = 17;
const SCV_ADDRESS: i32 = 18;

const SC_ADDRESS_ACCOUNT: i32 = 0;
const SC_ADDRESS_CONTRACT: i32 = 1;
const PUBLIC_KEY_ED25519: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScVal {
    Bool(bool),
    Void,
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    Timepoint(u64),
    Duration(u64),
    U128(u128),
    I128(i128),
    Bytes(Vec<u8>),
    String(String),
    Symbol(String),
    Vec(Vec<ScVal>),
    Map(Vec<(ScVal, ScVal)>),
    Address(Address),
}

impl ScVal {
    // -- Constructors -------------------------------------------------------

    pub fn string(s: impl Into<String>) -> Self {
        ScVal::String(s.into())
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        ScVal::Symbol(s.into())
    }

    pub fn address(a: impl Into<Address>) -> Self {
        ScVal::Address(a.into())
    }

    // -- Accessors ----------------------------------------------------------

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScVal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer kind widened to `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            ScVal::U32(v) => Some(v as i128),
            ScVal::I32(v) => Some(v as i128),
            ScVal::U64(v) | ScVal::Timepoint(v) | ScVal::Duration(v) => Some(v as i128),
            ScVal::I64(v) => Some(v as i128),
            ScVal::U128(v) => i128::try_from(v).ok(),
            ScVal::I128(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_i128().and_then(|v| u32::try_from(v).ok())
    }

    /// Text of a `String` or `Symbol`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScVal::String(s) | ScVal::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            ScVal::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<&[ScVal]> {
        match self {
            ScVal::Vec(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a struct field. Contract structs encode as maps keyed by symbol.
    pub fn field(&self, name: &str) -> Option<&ScVal> {
        match self {
            ScVal::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(name))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// First field present among `names`, for structs whose field names drift
    /// between contract versions.
    pub fn field_any(&self, names: &[&str]) -> Option<&ScVal> {
        names.iter().find_map(|n| self.field(n))
    }

    /// Variant name of a contract unit enum, encoded as `Vec[Symbol(name)]`.
    pub fn enum_variant(&self) -> Option<&str> {
        match self {
            ScVal::Vec(items) => match items.first() {
                Some(ScVal::Symbol(name)) => Some(name),
                _ => None,
            },
            ScVal::Symbol(name) => Some(name),
            _ => None,
        }
    }

    // -- XDR ----------------------------------------------------------------

    pub fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            ScVal::Bool(b) => {
                w.i32(SCV_BOOL).bool(*b);
            }
            ScVal::Void => {
                w.i32(SCV_VOID);
            }
            ScVal::U32(v) => {
                w.i32(SCV_U32).u32(*v);
            }
            ScVal::I32(v) => {
                w.i32(SCV_I32).i32(*v);
            }
            ScVal::U64(v) => {
                w.i32(SCV_U64).u64(*v);
            }
            ScVal::I64(v) => {
                w.i32(SCV_I64).i64(*v);
            }
            ScVal::Timepoint(v) => {
                w.i32(SCV_TIMEPOINT).u64(*v);
            }
            ScVal::Duration(v) => {
                w.i32(SCV_DURATION).u64(*v);
            }
            ScVal::U128(v) => {
                w.i32(SCV_U128).u64((*v >> 64) as u64).u64(*v as u64);
            }
            ScVal::I128(v) => {
                w.i32(SCV_I128).i64((*v >> 64) as i64).u64(*v as u64);
            }
            ScVal::Bytes(b) => {
                w.i32(SCV_BYTES).var(b);
            }
            ScVal::String(s) => {
                w.i32(SCV_STRING).var(s.as_bytes());
            }
            ScVal::Symbol(s) => {
                w.i32(SCV_SYMBOL).var(s.as_bytes());
            }
            ScVal::Vec(items) => {
                w.i32(SCV_VEC).bool(true).u32(items.len() as u32);
                for item in items {
                    item.write_xdr(w);
                }
            }
            ScVal::Map(entries) => {
                w.i32(SCV_MAP).bool(true).u32(entries.len() as u32);
                for (k, v) in entries {
                    k.write_xdr(w);
                    v.write_xdr(w);
                }
            }
            ScVal::Address(a) => {
                w.i32(SCV_ADDRESS);
                write_sc_address(w, a);
            }
        }
    }

    pub fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        read_scval(r, 0)
    }

    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_xdr(&mut w);
        w.into_bytes()
    }

    pub fn to_xdr_base64(&self) -> String {
        to_base64(&self.to_xdr())
    }

    pub fn from_xdr(bytes: &[u8]) -> Result<Self, XdrError> {
        let mut r = XdrReader::new(bytes);
        let value = Self::read_xdr(&mut r)?;
        r.finish()?;
        Ok(value)
    }

    pub fn from_xdr_base64(text: &str) -> Result<Self, XdrError> {
        Self::from_xdr(&from_base64(text)?)
    }

    /// Render as JSON for display. 64/128-bit integers become strings so no
    /// precision is lost.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Value, json};
        match self {
            ScVal::Bool(b) => json!(b),
            ScVal::Void => Value::Null,
            ScVal::U32(v) => json!(v),
            ScVal::I32(v) => json!(v),
            ScVal::U64(v) | ScVal::Timepoint(v) | ScVal::Duration(v) => json!(v.to_string()),
            ScVal::I64(v) => json!(v.to_string()),
            ScVal::U128(v) => json!(v.to_string()),
            ScVal::I128(v) => json!(v.to_string()),
            ScVal::Bytes(b) => json!(hex::encode(b)),
            ScVal::String(s) | ScVal::Symbol(s) => json!(s),
            ScVal::Vec(items) => Value::Array(items.iter().map(ScVal::to_json).collect()),
            ScVal::Map(entries) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in entries {
                    let key = match k.as_str() {
                        Some(s) => s.to_string(),
                        None => k.to_json().to_string(),
                    };
                    obj.insert(key, v.to_json());
                }
                Value::Object(obj)
            }
            ScVal::Address(a) => json!(a.to_string()),
        }
    }
}

impl From<u32> for ScVal {
    fn from(v: u32) -> Self {
        ScVal::U32(v)
    }
}

impl From<u64> for ScVal {
    fn from(v: u64) -> Self {
        ScVal::U64(v)
    }
}

impl From<i128> for ScVal {
    fn from(v: i128) -> Self {
        ScVal::I128(v)
    }
}

impl From<bool> for ScVal {
    fn from(v: bool) -> Self {
        ScVal::Bool(v)
    }
}

pub(crate) fn write_sc_address(w: &mut XdrWriter, address: &Address) {
    match address {
        Address::Account(a) => {
            w.i32(SC_ADDRESS_ACCOUNT).i32(PUBLIC_KEY_ED25519).fixed(a.as_bytes());
        }
        Address::Contract(c) => {
            w.i32(SC_ADDRESS_CONTRACT).fixed(c.as_bytes());
        }
    }
}

pub(crate) fn read_sc_address(r: &mut XdrReader<'_>) -> Result<Address, XdrError> {
    match r.i32()? {
        SC_ADDRESS_ACCOUNT => match r.i32()? {
            PUBLIC_KEY_ED25519 => Ok(Address::Account(AccountId(r.fixed32()?))),
            value => Err(XdrError::Discriminant { what: "PublicKey", value }),
        },
        SC_ADDRESS_CONTRACT => Ok(Address::Contract(ContractId(r.fixed32()?))),
        value => Err(XdrError::Discriminant { what: "SCAddress", value }),
    }
}

fn utf8(bytes: &[u8], what: &'static str) -> Result<String, XdrError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| XdrError::Utf8(what))
}

fn read_scval(r: &mut XdrReader<'_>, depth: usize) -> Result<ScVal, XdrError> {
    if depth > MAX_DEPTH {
        return Err(XdrError::Length(depth as u32));
    }
    let value = match r.i32()? {
        SCV_BOOL => ScVal::Bool(r.bool()?),
        SCV_VOID => ScVal::Void,
        SCV_U32 => ScVal::U32(r.u32()?),
        SCV_I32 => ScVal::I32(r.i32()?),
        SCV_U64 => ScVal::U64(r.u64()?),
        SCV_I64 => ScVal::I64(r.i64()?),
        SCV_TIMEPOINT => ScVal::Timepoint(r.u64()?),
        SCV_DURATION => ScVal::Duration(r.u64()?),
        SCV_U128 => {
            let hi = r.u64()? as u128;
            let lo = r.u64()? as u128;
            ScVal::U128((hi << 64) | lo)
        }
        SCV_I128 => {
            let hi = r.i64()? as i128;
            let lo = r.u64()? as i128;
            ScVal::I128((hi << 64) | lo)
        }
        SCV_BYTES => ScVal::Bytes(r.var(MAX_BYTES)?.to_vec()),
        SCV_STRING => ScVal::String(utf8(r.var(MAX_BYTES)?, "SCString")?),
        SCV_SYMBOL => ScVal::Symbol(utf8(r.var(MAX_SYMBOL)?, "SCSymbol")?),
        SCV_VEC => {
            if !r.bool()? {
                ScVal::Vec(Vec::new())
            } else {
                let n = r.count()?;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(read_scval(r, depth + 1)?);
                }
                ScVal::Vec(items)
            }
        }
        SCV_MAP => {
            if !r.bool()? {
                ScVal::Map(Vec::new())
            } else {
                let n = r.count()?;
                let mut entries = Vec::with_capacity(n);
                for _ in 0..n {
                    let k = read_scval(r, depth + 1)?;
                    let v = read_scval(r, depth + 1)?;
                    entries.push((k, v));
                }
                ScVal::Map(entries)
            }
        }
        SCV_ADDRESS => ScVal::Address(read_sc_address(r)?),
        value => return Err(XdrError::Discriminant { what: "SCVal", value }),
    };
    Ok(value)
}
