mod clock;
mod engine;
mod mode;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{TimerEngine, Transition};
pub use mode::{format_mm_ss, SoundKind, TimerMode, TimerStatus};
