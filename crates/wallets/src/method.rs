use std::fmt;

/// Operations served by the signing facade, keyed by request method name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DapiMethod {
    /// `invokeFunction`, `invoke`, `multiInvoke`.
    Invoke,
    /// `testInvoke`, `multiTestInvoke`.
    TestInvoke,
    SignMessage,
    VerifyMessage,
    /// `getapplicationlog`, served by its own node endpoint.
    ApplicationLog,
    /// Any other method, forwarded to the node unchanged.
    Raw(String),
}

impl DapiMethod {
    /// Whether responses carry a signature rather than chain data.
    pub const fn is_message(&self) -> bool {
        matches!(self, Self::SignMessage | Self::VerifyMessage)
    }
}

impl From<&str> for DapiMethod {
    fn from(method: &str) -> Self {
        match method {
            "invokeFunction" | "invoke" | "multiInvoke" => Self::Invoke,
            "testInvoke" | "multiTestInvoke" => Self::TestInvoke,
            "signMessage" => Self::SignMessage,
            "verifyMessage" => Self::VerifyMessage,
            "getapplicationlog" => Self::ApplicationLog,
            other => Self::Raw(other.to_string()),
        }
    }
}

impl fmt::Display for DapiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invoke => "invokeFunction",
            Self::TestInvoke => "testInvoke",
            Self::SignMessage => "signMessage",
            Self::VerifyMessage => "verifyMessage",
            Self::ApplicationLog => "getapplicationlog",
            Self::Raw(method) => method,
        })
    }
}
