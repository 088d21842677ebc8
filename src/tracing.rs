//! Allows to listen to frame events.

use primitive_types::{H160, H256, U256};

#[cfg(feature = "tracing")]
environmental::environmental!(hook: dyn EventListener + 'static);

/// Listener for [Event]s emitted while a frame runs.
#[cfg(feature = "tracing")]
pub trait EventListener {
	/// Handle one event.
	fn event(&mut self, event: Event);
}

/// Observable effects of frame operations.
#[derive(Debug, Copy, Clone)]
pub enum Event {
	/// Gas was deducted.
	Charge {
		/// Deducted amount.
		cost: U256,
		/// Remaining gas after the deduction.
		gas_left: U256,
	},
	/// The refund counter was credited.
	RefundAdd {
		/// Credited amount.
		refund: U256,
		/// Counter value afterwards.
		total: U256,
	},
	/// The refund counter was debited.
	RefundSub {
		/// Debited amount.
		refund: U256,
		/// Counter value afterwards.
		total: U256,
	},
	/// Frame memory grew.
	MemoryExpand {
		/// New size in 32-byte words.
		word_count: usize,
		/// Total expansion cost after the growth.
		cost: U256,
	},
	/// A storage write was metered.
	SStore {
		/// Account written to.
		address: H160,
		/// Slot index.
		index: H256,
		/// Written value.
		value: H256,
	},
	/// A nested frame is about to be dispatched.
	SubCall {
		/// Code target; `None` for creates.
		target: Option<H160>,
		/// Gas forwarded.
		gas_limit: U256,
		/// Depth of the nested frame.
		depth: usize,
	},
}

impl Event {
	#[cfg(feature = "tracing")]
	pub(crate) fn emit(self) {
		hook::with(|hook| hook.event(self));
	}

	#[cfg(not(feature = "tracing"))]
	pub(crate) fn emit(self) {
		// no op.
	}
}

/// Run closure with provided listener.
#[cfg(feature = "tracing")]
pub fn using<R, F: FnOnce() -> R>(listener: &mut (dyn EventListener + 'static), f: F) -> R {
	hook::using(listener, f)
}
