use thiserror::Error;

/// Failure of a tunnel operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TunnelError {
    /// The SDN controller rejected the operation with this (negative) status.
    #[error("SDN controller returned status {0}")]
    Controller(i32),

    /// End marker emulation has been disabled after an earlier failure.
    #[error("end marker not supported on this switch")]
    NoDevice,

    #[error("end marker packet-out failed: {0}")]
    EndMarker(String),
}

impl TunnelError {
    /// The negative errno-style status used by the gateway's session layer.
    pub fn status(&self) -> i32 {
        match self {
            TunnelError::Controller(rc) => *rc,
            TunnelError::NoDevice => -libc::ENODEV,
            TunnelError::EndMarker(_) => -libc::EIO,
        }
    }
}

pub type TunnelResult = Result<(), TunnelError>;
