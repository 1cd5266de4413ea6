//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod wristevator;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// Internal
use wristevator::WristevatorCmd;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static TYPE_HAS_NO_PAYLOAD: [&str; 3] = ["HEARTBEAT", "SAFE", "UNSAFE"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the mechanism by an operator or
/// a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    Heartbeat,
    MakeSafe,
    MakeUnsafe,
    Wristevator(WristevatorCmd),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0} is expected to have a payload but it doesn't")]
    MissingPayload(String),

    #[error("TC of type {0} has an invalid payload: {1}")]
    InvalidPayload(String, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet.
    ///
    /// Packets have the form `{"type": "WRIST", "payload": {"Goal": {"name": "L4"}}}`. The
    /// `HEARTBEAT`, `SAFE` and `UNSAFE` types carry no payload.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        // Get the type of the TC
        let tc_type = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };

        // Get the payload. If it's null and the type does not have a payload
        // then an error is returned
        if val["payload"].is_null() && !TYPE_HAS_NO_PAYLOAD.contains(&tc_type) {
            return Err(TcParseError::MissingPayload(tc_type.to_string()));
        }

        match tc_type {
            "HEARTBEAT" => Ok(Tc::Heartbeat),
            "SAFE" => Ok(Tc::MakeSafe),
            "UNSAFE" => Ok(Tc::MakeUnsafe),
            "WRIST" => serde_json::from_value(val["payload"].clone())
                .map(Tc::Wristevator)
                .map_err(|e| TcParseError::InvalidPayload(tc_type.to_string(), e)),
            t => Err(TcParseError::InvalidType(format!(
                "{} is not a recognised TC type",
                t
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(
            Tc::from_json(r#"{"type": "SAFE"}"#).unwrap(),
            Tc::MakeSafe
        );

        assert_eq!(
            Tc::from_json(r#"{"type": "WRIST", "payload": {"Goal": {"name": "L4"}}}"#).unwrap(),
            Tc::Wristevator(WristevatorCmd::Goal {
                name: String::from("L4")
            })
        );

        assert_eq!(
            Tc::from_json(r#"{"type": "WRIST", "payload": "Release"}"#).unwrap(),
            Tc::Wristevator(WristevatorCmd::Release)
        );

        assert_eq!(
            Tc::from_json(
                r#"{"type": "WRIST", "payload": {"Speeds": {"height_rate_ms": 0.5, "angle_rate_rads": -1.0}}}"#
            )
            .unwrap(),
            Tc::Wristevator(WristevatorCmd::Speeds {
                height_rate_ms: 0.5,
                angle_rate_rads: -1.0
            })
        );
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            Tc::from_json("not json"),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "WRIST"}"#),
            Err(TcParseError::MissingPayload(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "MNVR", "payload": {}}"#),
            Err(TcParseError::InvalidType(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "WRIST", "payload": {"Fly": {}}}"#),
            Err(TcParseError::InvalidPayload(_, _))
        ));
    }
}
