//! Decoding of `simulateTransaction` responses.
//!
//! RPC servers and SDK versions disagree on where the return value lives, so
//! the lookup walks a fixed list of locations and reports which one matched.

use serde_json::Value;
use tracing::debug;

use crate::scval::ScVal;
use crate::transaction::PreparedResources;
use crate::xdr::{XdrError, from_base64};

/// Where a simulation's return value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnValuePath {
    /// `results[0].retval`
    FirstResult,
    /// `result.retval`
    NestedResult,
    /// `retval`
    Retval,
    /// `returnValue`
    ReturnValue,
}

impl ReturnValuePath {
    pub const ORDER: [ReturnValuePath; 4] = [
        ReturnValuePath::FirstResult,
        ReturnValuePath::NestedResult,
        ReturnValuePath::Retval,
        ReturnValuePath::ReturnValue,
    ];

    fn lookup(self, response: &Value) -> Option<&Value> {
        match self {
            ReturnValuePath::FirstResult => response.get("results")?.get(0)?.get("retval"),
            ReturnValuePath::NestedResult => response.get("result")?.get("retval"),
            ReturnValuePath::Retval => response.get("retval"),
            ReturnValuePath::ReturnValue => response.get("returnValue"),
        }
        .filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    Found(ScVal, ReturnValuePath),
    NotFound,
    DecodeError(ReturnValuePath, XdrError),
}

impl SimulationOutcome {
    pub fn into_value(self) -> Option<ScVal> {
        match self {
            SimulationOutcome::Found(value, _) => Some(value),
            _ => None,
        }
    }
}

/// Find and decode the return value of a simulation response.
///
/// The first location that holds a value wins; a value that is present but
/// fails to decode is reported as [`SimulationOutcome::DecodeError`] without
/// falling through to later locations.
pub fn decode_simulate_result(response: &Value) -> SimulationOutcome {
    for path in ReturnValuePath::ORDER {
        let Some(raw) = path.lookup(response) else {
            continue;
        };
        let Some(text) = raw.as_str() else {
            return SimulationOutcome::DecodeError(
                path,
                XdrError::Base64(format!("expected base64 string, got {raw}")),
            );
        };
        return match ScVal::from_xdr_base64(text) {
            Ok(value) => {
                debug!(path = ?path, "decoded simulation return value");
                SimulationOutcome::Found(value, path)
            }
            Err(e) => SimulationOutcome::DecodeError(path, e),
        };
    }
    SimulationOutcome::NotFound
}

/// The simulation's own failure message, if it reported one.
pub fn simulation_error(response: &Value) -> Option<String> {
    response
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Extract the resources needed to turn a simulated call into a submittable
/// transaction.
pub fn prepared_resources(response: &Value) -> Result<PreparedResources, XdrError> {
    let data = response
        .get("transactionData")
        .and_then(Value::as_str)
        .ok_or_else(|| XdrError::Base64("simulation returned no transactionData".into()))?;
    let transaction_data = from_base64(data)?;

    let min_resource_fee = match response.get("minResourceFee") {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0).min(u32::MAX as u64) as u32,
        _ => 0,
    };

    let mut auth = Vec::new();
    if let Some(entries) = response
        .get("results")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("auth"))
        .and_then(Value::as_array)
    {
        for entry in entries {
            if let Some(text) = entry.as_str() {
                auth.push(from_base64(text)?);
            }
        }
    }

    Ok(PreparedResources {
        transaction_data,
        min_resource_fee,
        auth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encoded(v: &ScVal) -> String {
        v.to_xdr_base64()
    }

    #[test]
    fn every_location_is_recognised() {
        let v = ScVal::U32(3);
        let cases = [
            (json!({ "results": [{ "retval": encoded(&v) }] }), ReturnValuePath::FirstResult),
            (json!({ "result": { "retval": encoded(&v) } }), ReturnValuePath::NestedResult),
            (json!({ "retval": encoded(&v) }), ReturnValuePath::Retval),
            (json!({ "returnValue": encoded(&v) }), ReturnValuePath::ReturnValue),
        ];
        for (response, expected) in cases {
            assert_eq!(
                decode_simulate_result(&response),
                SimulationOutcome::Found(v.clone(), expected)
            );
        }
    }

    #[test]
    fn earlier_location_wins() {
        let response = json!({
            "results": [{ "retval": encoded(&ScVal::U32(1)) }],
            "returnValue": encoded(&ScVal::U32(2)),
        });
        assert_eq!(decode_simulate_result(&response).into_value(), Some(ScVal::U32(1)));
    }

    #[test]
    fn no_location_is_not_found() {
        let response = json!({ "latestLedger": 100, "results": [] });
        assert_eq!(decode_simulate_result(&response), SimulationOutcome::NotFound);
        assert_eq!(decode_simulate_result(&response).into_value(), None);
        assert_eq!(
            decode_simulate_result(&json!({ "retval": null })),
            SimulationOutcome::NotFound
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let outcome = decode_simulate_result(&json!({ "retval": "AAAA////" }));
        assert!(matches!(outcome, SimulationOutcome::DecodeError(ReturnValuePath::Retval, _)));
        let outcome = decode_simulate_result(&json!({ "returnValue": 5 }));
        assert!(matches!(outcome, SimulationOutcome::DecodeError(ReturnValuePath::ReturnValue, _)));
    }

    #[test]
    fn resources_extracted() {
        let response = json!({
            "transactionData": crate::xdr::to_base64(&[0, 0, 0, 0]),
            "minResourceFee": "12345",
            "results": [{ "auth": [crate::xdr::to_base64(&[1, 2, 3, 4])], "retval": encoded(&ScVal::Void) }],
        });
        let resources = prepared_resources(&response).unwrap();
        assert_eq!(resources.min_resource_fee, 12345);
        assert_eq!(resources.transaction_data, vec![0, 0, 0, 0]);
        assert_eq!(resources.auth, vec![vec![1, 2, 3, 4]]);

        assert!(prepared_resources(&json!({ "error": "HostError" })).is_err());
        assert_eq!(
            simulation_error(&json!({ "error": "HostError: insufficient balance" })).as_deref(),
            Some("HostError: insufficient balance")
        );
    }
}
