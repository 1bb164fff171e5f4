//! Callback bridges and their native entry points.
//!
//! The opaque pointer handed across the boundary is the address of a
//! leaked channel sender. The entry points reinterpret the address and
//! transmit without consuming the sender, so a channel pointer stays
//! valid for repeated deliveries. The receiving halves
//! ([`InstanceReceiver`], [`FutureReceiver`]) are what the native side
//! holds on to.
//!
//! Two flavors exist:
//!
//! - **Channel** (flavor A): repeatable fire-and-forget deliveries of
//!   non-absent values.
//! - **Future** (flavor B): a terminal success or failure per logical
//!   asynchronous operation. An absent success value is delivered as the
//!   null sentinel rather than rejected.

use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use log::error;

use strait_core::{CallError, CallbackSlot, NativePointer, Value};

use crate::errors::{Error, Result};
use crate::instance::Instance;

type FutureResult = std::result::Result<Instance, String>;

const NOT_INITIALIZED: &str = "cannot perform the callback: no native pointer has been wired in \
     (is the callback used from inside the object's own constructor?)";

// ============================================================================
// Native entry points
// ============================================================================

/// Deliver an instance through a channel pointer (flavor A).
///
/// # Safety contract
/// `pointer` must originate from [`InstanceReceiver::channel`]; the
/// runtime hands it back verbatim and never fabricates addresses.
pub fn deliver_to_channel(pointer: NativePointer, instance: Instance) -> Result<()> {
    let sender = unsafe { &*(pointer.address() as *const Sender<Instance>) };
    sender.send(instance).map_err(|_| {
        error!("callback delivery to a closed channel (pointer {:#x})", pointer.address());
        Error::Invocation("the callback channel is closed".to_string())
    })
}

/// Complete a future pointer with a success instance (flavor B).
///
/// # Safety contract
/// `pointer` must originate from [`FutureReceiver::channel`].
pub fn complete_future(pointer: NativePointer, instance: Instance) -> Result<()> {
    send_future_result(pointer, Ok(instance))
}

/// Complete a future pointer with a rendered failure trace (flavor B).
///
/// # Safety contract
/// `pointer` must originate from [`FutureReceiver::channel`].
pub fn fail_future(pointer: NativePointer, trace: String) -> Result<()> {
    send_future_result(pointer, Err(trace))
}

fn send_future_result(pointer: NativePointer, result: FutureResult) -> Result<()> {
    let sender = unsafe { &*(pointer.address() as *const Sender<FutureResult>) };
    sender.try_send(result).map_err(|_| {
        error!("future completion lost (pointer {:#x})", pointer.address());
        Error::Invocation("the future channel is closed or already completed".to_string())
    })
}

// ============================================================================
// Receiving halves
// ============================================================================

/// Native-side endpoint of a flavor-A callback channel.
///
/// The sender half is leaked to mint the pointer and is reclaimed only at
/// process exit, mirroring the boxed-sender convention of the reference
/// boundary.
pub struct InstanceReceiver {
    pointer: NativePointer,
    rx: Receiver<Instance>,
}

impl InstanceReceiver {
    /// Create a channel and mint its native pointer.
    pub fn channel() -> (NativePointer, InstanceReceiver) {
        let (tx, rx) = unbounded::<Instance>();
        let pointer = NativePointer::new(Box::into_raw(Box::new(tx)) as u64);
        (pointer, InstanceReceiver { pointer, rx })
    }

    /// The pointer to hand to `initialize_callback_channel`.
    pub fn pointer(&self) -> NativePointer {
        self.pointer
    }

    /// Block until the next delivery.
    pub fn recv(&self) -> Result<Instance> {
        self.rx
            .recv()
            .map_err(|_| Error::Invocation("the callback channel was torn down".to_string()))
    }

    /// Block until the next delivery or until `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Instance> {
        self.rx.recv_timeout(timeout).map_err(|_| {
            Error::Invocation("no callback was delivered within the timeout".to_string())
        })
    }

    /// Take a delivery if one is already pending.
    pub fn try_recv(&self) -> Option<Instance> {
        self.rx.try_recv().ok()
    }
}

/// Native-side endpoint of a flavor-B future channel.
pub struct FutureReceiver {
    pointer: NativePointer,
    rx: Receiver<FutureResult>,
}

impl FutureReceiver {
    /// Create a one-shot future channel and mint its native pointer.
    pub fn channel() -> (NativePointer, FutureReceiver) {
        let (tx, rx) = bounded::<FutureResult>(1);
        let pointer = NativePointer::new(Box::into_raw(Box::new(tx)) as u64);
        (pointer, FutureReceiver { pointer, rx })
    }

    /// The pointer to hand to `invoke_async`.
    pub fn pointer(&self) -> NativePointer {
        self.pointer
    }

    /// Block until the operation completes. A failure completion surfaces
    /// as an [`Error::Invocation`] carrying the rendered trace.
    pub fn recv(&self) -> Result<Instance> {
        match self.rx.recv() {
            Ok(Ok(instance)) => Ok(instance),
            Ok(Err(trace)) => Err(Error::Invocation(trace)),
            Err(_) => Err(Error::Invocation(
                "the future channel was torn down".to_string(),
            )),
        }
    }

    /// Block until completion or until `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Instance> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(instance)) => Ok(instance),
            Ok(Err(trace)) => Err(Error::Invocation(trace)),
            Err(_) => Err(Error::Invocation(
                "the operation did not complete within the timeout".to_string(),
            )),
        }
    }
}

// ============================================================================
// Bridges over an object's callback slots
// ============================================================================

/// Flavor A: repeatable fire-and-forget deliveries through an object's
/// channel slot.
///
/// Concurrent deliveries through the same pointer are not serialized
/// beyond the slot read; ordering between racing callers is the caller's
/// responsibility.
pub struct ChannelBridge<'a> {
    slot: &'a CallbackSlot,
}

impl<'a> ChannelBridge<'a> {
    /// The channel bridge of a managed object value.
    pub fn of(value: &'a Value) -> Result<ChannelBridge<'a>> {
        let object = value.as_object().ok_or_else(|| {
            Error::Invocation("only managed objects can deliver callbacks".to_string())
        })?;
        Ok(ChannelBridge {
            slot: object.channel_slot(),
        })
    }

    /// Deliver a non-absent value, wrapped as an Instance of its concrete
    /// class.
    pub fn deliver(&self, value: Value) -> Result<()> {
        let pointer = self
            .slot
            .target()
            .ok_or_else(|| Error::Invocation(NOT_INITIALIZED.to_string()))?;
        if value.is_null() {
            return Err(Error::Invocation(
                "cannot deliver an absent value through the callback channel".to_string(),
            ));
        }
        deliver_to_channel(pointer, Instance::wrap(value))
    }
}

/// Flavor B: terminal success/failure completion through an object's
/// future slot.
pub struct FutureBridge<'a> {
    slot: &'a CallbackSlot,
}

impl<'a> FutureBridge<'a> {
    /// The future bridge of a managed object value.
    pub fn of(value: &'a Value) -> Result<FutureBridge<'a>> {
        let object = value.as_object().ok_or_else(|| {
            Error::Invocation("only managed objects can complete futures".to_string())
        })?;
        Ok(FutureBridge {
            slot: object.future_slot(),
        })
    }

    /// Transmit a success. An absent value is delivered as the null
    /// sentinel instance, unlike flavor A.
    pub fn succeed(&self, value: Option<Value>) -> Result<()> {
        let pointer = self
            .slot
            .target()
            .ok_or_else(|| Error::Invocation(NOT_INITIALIZED.to_string()))?;
        complete_future(pointer, Instance::wrap(value.unwrap_or(Value::Null)))
    }

    /// Transmit a failure as its rendered diagnostic trace.
    pub fn fail(&self, e: &CallError) -> Result<()> {
        let pointer = self
            .slot
            .target()
            .ok_or_else(|| Error::Invocation(NOT_INITIALIZED.to_string()))?;
        fail_future(pointer, e.trace())
    }
}
