//! Transaction envelopes for a single `InvokeHostFunction` operation.
//!
//! Soroban resource data and authorization entries come back from
//! `simulateTransaction` as opaque XDR and are spliced into the envelope
//! verbatim.

use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::scval::{ScVal, read_sc_address, write_sc_address};
use crate::strkey::{AccountId, Address, ContractId};
use crate::xdr::{XdrError, XdrReader, XdrWriter, from_base64, to_base64};

/// Fee attached to read-only simulations.
pub const SIMULATION_FEE: u32 = 100;
/// Base inclusion fee for state-changing invocations, before resource fees.
pub const INVOKE_FEE: u32 = 100_000;

const ENVELOPE_TYPE_TX: i32 = 2;
const KEY_TYPE_ED25519: i32 = 0;
const PRECOND_TIME: i32 = 1;
const MEMO_NONE: i32 = 0;
const OP_INVOKE_HOST_FUNCTION: i32 = 24;
const HOST_FUNCTION_INVOKE_CONTRACT: i32 = 0;

/// Call a contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeContract {
    pub contract: ContractId,
    pub function: String,
    pub args: Vec<ScVal>,
    /// Raw `SorobanAuthorizationEntry` XDR from simulation.
    pub auth: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source: AccountId,
    pub fee: u32,
    pub sequence: i64,
    /// Upper time bound, unix seconds.
    pub max_time: u64,
    pub operation: InvokeContract,
    /// Raw `SorobanTransactionData` XDR from simulation.
    pub soroban_data: Option<Vec<u8>>,
}

/// Builds a one-operation contract call.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    source: AccountId,
    sequence: i64,
    fee: u32,
    timeout: Duration,
}

impl TransactionBuilder {
    /// `current_sequence` is the account's sequence as stored on the ledger;
    /// the transaction uses the next one.
    pub fn new(source: AccountId, current_sequence: i64) -> Self {
        Self {
            source,
            sequence: current_sequence.saturating_add(1),
            fee: SIMULATION_FEE,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn invoke(self, contract: ContractId, function: &str, args: Vec<ScVal>) -> Transaction {
        let now = Utc::now().timestamp().max(0) as u64;
        Transaction {
            source: self.source,
            fee: self.fee,
            sequence: self.sequence,
            max_time: now + self.timeout.as_secs(),
            operation: InvokeContract {
                contract,
                function: function.to_string(),
                args,
                auth: Vec::new(),
            },
            soroban_data: None,
        }
    }
}

/// Resource data returned by a successful simulation, ready to attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedResources {
    pub transaction_data: Vec<u8>,
    pub min_resource_fee: u32,
    pub auth: Vec<Vec<u8>>,
}

impl Transaction {
    /// Attach simulated resources and raise the fee by the resource fee.
    pub fn apply_resources(&mut self, resources: PreparedResources) {
        self.fee = self.fee.saturating_add(resources.min_resource_fee);
        self.soroban_data = Some(resources.transaction_data);
        self.operation.auth = resources.auth;
    }

    fn write_xdr(&self, w: &mut XdrWriter) {
        w.i32(KEY_TYPE_ED25519).fixed(self.source.as_bytes());
        w.u32(self.fee);
        w.i64(self.sequence);
        w.i32(PRECOND_TIME).u64(0).u64(self.max_time);
        w.i32(MEMO_NONE);

        w.u32(1);
        w.bool(false);
        w.i32(OP_INVOKE_HOST_FUNCTION);
        w.i32(HOST_FUNCTION_INVOKE_CONTRACT);
        write_sc_address(w, &Address::Contract(self.operation.contract));
        w.var(self.operation.function.as_bytes());
        w.u32(self.operation.args.len() as u32);
        for arg in &self.operation.args {
            arg.write_xdr(w);
        }
        w.u32(self.operation.auth.len() as u32);
        for entry in &self.operation.auth {
            w.raw(entry);
        }

        match &self.soroban_data {
            Some(data) => {
                w.i32(1).raw(data);
            }
            None => {
                w.i32(0);
            }
        }
    }

    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_xdr(&mut w);
        w.into_bytes()
    }

    /// Unsigned `TransactionEnvelope` (v1), base64.
    pub fn to_envelope_base64(&self) -> String {
        let mut w = XdrWriter::new();
        w.i32(ENVELOPE_TYPE_TX);
        self.write_xdr(&mut w);
        w.u32(0);
        to_base64(&w.into_bytes())
    }

    /// Hash signed by the wallet: `sha256(network_id || ENVELOPE_TYPE_TX || tx)`.
    pub fn hash(&self, network_passphrase: &str) -> [u8; 32] {
        let network_id = Sha256::digest(network_passphrase.as_bytes());
        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(self.to_xdr());
        hasher.finalize().into()
    }

    pub fn hash_hex(&self, network_passphrase: &str) -> String {
        hex::encode(self.hash(network_passphrase))
    }
}

/// A wallet-signed envelope, checked to be a v1 transaction envelope from an
/// ed25519 source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub xdr: String,
    pub source: AccountId,
}

impl SignedEnvelope {
    pub fn parse(xdr: &str) -> Result<Self, XdrError> {
        let bytes = from_base64(xdr)?;
        let mut r = XdrReader::new(&bytes);
        match r.i32()? {
            ENVELOPE_TYPE_TX => {}
            value => return Err(XdrError::Discriminant { what: "TransactionEnvelope", value }),
        }
        let source = match r.i32()? {
            KEY_TYPE_ED25519 => AccountId(r.fixed32()?),
            value => return Err(XdrError::Discriminant { what: "MuxedAccount", value }),
        };
        Ok(Self {
            xdr: xdr.trim().to_string(),
            source,
        })
    }
}

/// Recover the contract call from an envelope built by [`Transaction`].
/// Authorization entries are not decoded.
pub fn decode_invocation(envelope_xdr: &str) -> Result<InvokeContract, XdrError> {
    let bytes = from_base64(envelope_xdr)?;
    let mut r = XdrReader::new(&bytes);
    match r.i32()? {
        ENVELOPE_TYPE_TX => {}
        value => return Err(XdrError::Discriminant { what: "TransactionEnvelope", value }),
    }
    match r.i32()? {
        KEY_TYPE_ED25519 => {
            r.fixed32()?;
        }
        value => return Err(XdrError::Discriminant { what: "MuxedAccount", value }),
    }
    r.u32()?; // fee
    r.i64()?; // sequence
    match r.i32()? {
        PRECOND_TIME => {
            r.u64()?;
            r.u64()?;
        }
        0 => {}
        value => return Err(XdrError::Discriminant { what: "Preconditions", value }),
    }
    match r.i32()? {
        MEMO_NONE => {}
        value => return Err(XdrError::Discriminant { what: "Memo", value }),
    }
    if r.u32()? != 1 {
        return Err(XdrError::Length(0));
    }
    if r.bool()? {
        return Err(XdrError::Discriminant { what: "Operation.sourceAccount", value: 1 });
    }
    match r.i32()? {
        OP_INVOKE_HOST_FUNCTION => {}
        value => return Err(XdrError::Discriminant { what: "OperationType", value }),
    }
    match r.i32()? {
        HOST_FUNCTION_INVOKE_CONTRACT => {}
        value => return Err(XdrError::Discriminant { what: "HostFunction", value }),
    }
    let contract = match read_sc_address(&mut r)? {
        Address::Contract(c) => c,
        Address::Account(_) => {
            return Err(XdrError::Discriminant { what: "contract address", value: 0 });
        }
    };
    let function =
        String::from_utf8(r.var(32)?.to_vec()).map_err(|_| XdrError::Utf8("SCSymbol"))?;
    let n = r.count()?;
    let mut args = Vec::with_capacity(n);
    for _ in 0..n {
        args.push(ScVal::read_xdr(&mut r)?);
    }
    Ok(InvokeContract {
        contract,
        function,
        args,
        auth: Vec::new(),
    })
}
