//! Core business rules, independent of storage and transport.

pub mod billing;
pub mod clock;
pub mod error;
pub mod reservation;

pub use billing::{compute_cost, CostBreakdown};
pub use clock::{Clock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use reservation::ReservationStatus;
