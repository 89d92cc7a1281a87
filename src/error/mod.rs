// error.rs
use std::{error::Error, fmt};

const ERR_MSG_COROUTINE: &str = "coroutine body failed";
const ERR_MSG_SUBROUTINE: &str = "subroutine call failed";
const ERR_MSG_INVALID_MEMBER: &str = "inactive member rejected";
const ERR_MSG_INVALID_DELTA: &str = "invalid time delta";

/// Kinds of faults a flow object can record or report.
///
/// Faults never unwind past the object that produced them; the
/// kernel keeps stepping the rest of the tree.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FaultKind {
    /// A user-supplied coroutine step returned `Step::Fail`.
    CoroutineBody,
    /// A user-supplied subroutine call returned `Err`.
    SubroutineBody,
    /// A composite dropped an already-inactive member on `add`.
    InvalidMember,
    /// The caller passed a negative or non-finite delta to `update`.
    InvalidDelta,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::CoroutineBody => write!(f, "{ERR_MSG_COROUTINE}"),
            FaultKind::SubroutineBody => write!(f, "{ERR_MSG_SUBROUTINE}"),
            FaultKind::InvalidMember => write!(f, "{ERR_MSG_INVALID_MEMBER}"),
            FaultKind::InvalidDelta => write!(f, "{ERR_MSG_INVALID_DELTA}"),
        }
    }
}

/// A recorded fault: the kind plus the underlying error.
///
/// User-step failure is an explicit value, not a caught panic; a
/// faulted generator stores one of these, reports it to the log and
/// completes.
#[derive(Debug)]
pub struct FlowFault {
    pub kind: FaultKind,
    pub source: anyhow::Error,
}

impl FlowFault {
    pub fn coroutine(source: anyhow::Error) -> Self {
        Self {
            kind: FaultKind::CoroutineBody,
            source,
        }
    }

    pub fn subroutine(source: anyhow::Error) -> Self {
        Self {
            kind: FaultKind::SubroutineBody,
            source,
        }
    }

    pub fn invalid_member(detail: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::InvalidMember,
            source: anyhow::anyhow!(detail.into()),
        }
    }

    pub fn invalid_delta(detail: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::InvalidDelta,
            source: anyhow::anyhow!(detail.into()),
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }
}

impl fmt::Display for FlowFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.source)
    }
}

impl Error for FlowFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}
