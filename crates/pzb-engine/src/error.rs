/// Every recoverable failure the ledger and allocation engine can report.
///
/// None of these are fatal; transports render them back to the requester.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    /// Malformed, negative, or out-of-range unit count, an empty requester
    /// identity, or a withdrawal with nothing to withdraw.
    InvalidRequest { reason: String },
    /// Total or pricing query while aggregate demand is zero.
    EmptyLedger,
    /// Supplied total cost is negative, NaN, or infinite.
    InvalidCost { cost: f64 },
    /// Package size must be at least one unit.
    InvalidPackageSize,
}

impl EngineError {
    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::EmptyLedger => "empty_ledger",
            Self::InvalidCost { .. } => "invalid_cost",
            Self::InvalidPackageSize => "invalid_package_size",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::EmptyLedger => write!(f, "no slices have been requested yet"),
            Self::InvalidCost { cost } => {
                write!(f, "total cost must be a finite amount >= 0, got {cost}")
            }
            Self::InvalidPackageSize => write!(f, "package size must be >= 1"),
        }
    }
}

impl std::error::Error for EngineError {}
