use crate::{EntityIdentifier, HistoricalReference};
use alloy::primitives::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters of one call or gas-estimation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub from: EntityIdentifier,
    /// Absent target means contract deployment.
    pub to: Option<EntityIdentifier>,
    pub payload: Bytes,
    /// Attached value in tinybars.
    pub value: i64,
    pub gas_limit: u64,
    pub reference: HistoricalReference,
}

/// What the execution engine reported for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Success { gas_used: u64, output: Bytes },
    Revert { gas_used: u64, output: Bytes },
    Halt { reason: HaltReason, gas_used: u64 },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// True when the failure is attributable to an insufficient gas limit,
    /// the only failure the gas search is allowed to retry past.
    pub fn is_out_of_gas(&self) -> bool {
        matches!(
            self,
            Self::Halt {
                reason: HaltReason::OutOfGas,
                ..
            }
        )
    }

    pub fn gas_used(&self) -> u64 {
        match self {
            Self::Success { gas_used, .. }
            | Self::Revert { gas_used, .. }
            | Self::Halt { gas_used, .. } => *gas_used,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    OutOfGas,
    Other(String),
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfGas => write!(f, "out of gas"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Outcome handed back to the request-handling layer. Constructed once per
/// execution, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    pub gas_used: u64,
    pub output: Bytes,
    /// Revert reason or halt message on failure.
    pub error: Option<String>,
}

impl CallResult {
    pub fn successful(gas_used: u64, output: Bytes) -> Self {
        Self {
            success: true,
            gas_used,
            output,
            error: None,
        }
    }

    pub fn failed(gas_used: u64, output: Bytes, error: impl Into<String>) -> Self {
        Self {
            success: false,
            gas_used,
            output,
            error: Some(error.into()),
        }
    }
}
