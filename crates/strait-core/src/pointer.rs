//! Opaque native pointers and the callback slot state machine.
//!
//! A [`NativePointer`] is a raw integer address minted by the native side
//! (typically the address of a leaked channel sender). The runtime never
//! dereferences it; it is handed back verbatim to the native entry points
//! when a callback fires.

use parking_lot::Mutex;

/// An opaque address identifying a native-side callback handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativePointer(u64);

impl NativePointer {
    /// Wrap a raw address.
    pub const fn new(address: u64) -> Self {
        NativePointer(address)
    }

    /// The raw address.
    pub const fn address(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default, Clone, Copy)]
enum SlotState {
    #[default]
    Unarmed,
    Armed(NativePointer),
}

/// The target slot of a callback bridge: unarmed until a pointer is wired
/// in, after which deliveries may flow.
///
/// Re-arming is legal (last writer wins, reconfiguration). Arming must
/// happen-before any delivery that uses the slot; the lock only prevents
/// torn reads, not init-vs-use races.
#[derive(Debug, Default)]
pub struct CallbackSlot {
    state: Mutex<SlotState>,
}

impl CallbackSlot {
    /// A new, unarmed slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire a native pointer into the slot.
    pub fn arm(&self, pointer: NativePointer) {
        *self.state.lock() = SlotState::Armed(pointer);
    }

    /// The armed pointer, if any.
    pub fn target(&self) -> Option<NativePointer> {
        match *self.state.lock() {
            SlotState::Unarmed => None,
            SlotState::Armed(p) => Some(p),
        }
    }

    /// Whether a pointer has been wired in.
    pub fn is_armed(&self) -> bool {
        self.target().is_some()
    }
}
