//! Business services containing the verification state machine.

pub mod access_guard;
pub mod clock;
pub mod code_manager;
pub mod notification;
pub mod throttle_gate;

// Re-export commonly used types
pub use access_guard::AccessGuard;
pub use clock::{Clock, ManualClock, SystemClock};
pub use code_manager::{CodeManager, IssuedCode};
pub use notification::{DispatchError, NotificationDispatcher, RecordingDispatcher};
pub use throttle_gate::ThrottleGate;
