use alloc::borrow::Cow;

use crate::opcode::Opcode;

/// Exit result of a frame.
pub type ExitResult = Result<ExitSucceed, ExitError>;

/// Abort reason carried upward to the dispatcher.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// The frame returned a normal EVM error. All remaining gas of the
	/// frame is consumed.
	Exception(ExitException),
	/// The frame encountered an explicit revert. Remaining gas is
	/// preserved and return data is handed to the caller.
	Reverted,
	/// An error that is not a normal EVM error, such as a failure of the
	/// state manager. Aborts the entire transaction.
	Fatal(ExitFatal),
}

impl From<ExitError> for ExitResult {
	fn from(s: ExitError) -> Self {
		Err(s)
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ExitError {
	fn description(&self) -> &str {
		match self {
			Self::Exception(_) => "EVM exit exception",
			Self::Reverted => "EVM internal revert",
			Self::Fatal(_) => "EVM fatal error",
		}
	}
}

#[cfg(feature = "std")]
impl std::fmt::Display for ExitError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// The frame encountered an explicit stop.
	Stopped,
	/// The frame encountered an explicit return.
	Returned,
	/// The frame encountered an explicit selfdestruct.
	Suicided,
}

impl From<ExitSucceed> for ExitResult {
	fn from(s: ExitSucceed) -> Self {
		Ok(s)
	}
}

/// Normal EVM exception.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitException {
	/// Execution ran out of gas.
	OutOfGas,
	/// Trying to pop from an empty stack.
	StackUnderflow,
	/// Trying to push into a stack over the stack limit.
	StackOverflow,
	/// Jump destination is invalid.
	InvalidJump,
	/// Encountered an unknown opcode. Raised by the dispatcher, not by
	/// any operation of this crate.
	InvalidOpcode(Opcode),
	/// State mutation attempted inside a static frame.
	StaticStateChange,

	/// Other normal errors.
	Other(Cow<'static, str>),
}

impl From<ExitException> for ExitResult {
	fn from(s: ExitException) -> Self {
		Err(ExitError::Exception(s))
	}
}

impl From<ExitException> for ExitError {
	fn from(s: ExitException) -> Self {
		Self::Exception(s)
	}
}

/// Fatal error. Not consumed as a normal exception: the transaction as a
/// whole is aborted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitFatal {
	/// Failure of the state manager or storage layer, surfaced verbatim.
	Internal(Cow<'static, str>),
	/// The operation is not supported.
	NotSupported,

	/// Other fatal errors.
	Other(Cow<'static, str>),
}

impl From<ExitFatal> for ExitResult {
	fn from(s: ExitFatal) -> Self {
		Err(ExitError::Fatal(s))
	}
}

impl From<ExitFatal> for ExitError {
	fn from(s: ExitFatal) -> Self {
		Self::Fatal(s)
	}
}
