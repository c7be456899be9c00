//! Rate limiting logic and state management.

mod limiter;
mod window;

pub use limiter::FixedWindowLimiter;
pub use window::TimeWindow;
