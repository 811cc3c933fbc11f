mod clock;
mod errors;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{StoreError, StoreResult};
