pub mod clock;
pub mod locks;
pub mod tickets;

pub use clock::{Clock, FixedClock, SystemClock};
pub use locks::DoctorLockRegistry;
pub use tickets::TicketCounters;
