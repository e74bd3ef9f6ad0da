pub mod allocator;
pub mod analytics;
pub mod lots;
pub mod reservations;

pub use analytics::AnalyticsService;
pub use lots::{LotService, LotUpdate, NewLot};
pub use reservations::{HistoryFilter, ReservationService};
