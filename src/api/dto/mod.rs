pub mod common;
pub mod models;

pub use common::{ApiResponse, EmptyData, PaginatedResponse, PaginationParams};
pub use models::{LotDto, ReservationDto, SpotDto, UserDto};
