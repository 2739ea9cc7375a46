use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// The fixed set of operations a caller may invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Get,
    Put,
    Subscribe,
    Pop,
    Cancel,
    RequestStream,
    GetFeedRootHash,
    GetConnectionInfo,
    Version,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Self::Init,
        Self::Get,
        Self::Put,
        Self::Subscribe,
        Self::Pop,
        Self::Cancel,
        Self::RequestStream,
        Self::GetFeedRootHash,
        Self::GetConnectionInfo,
        Self::Version,
    ];

    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Get => "get",
            Self::Put => "put",
            Self::Subscribe => "subscribe",
            Self::Pop => "pop",
            Self::Cancel => "cancel",
            Self::RequestStream => "requestStream",
            Self::GetFeedRootHash => "getFeedRootHash",
            Self::GetConnectionInfo => "getConnectionInfo",
            Self::Version => "version",
        }
    }
}

impl FromStr for Operation {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| BridgeError::NotImplemented(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
