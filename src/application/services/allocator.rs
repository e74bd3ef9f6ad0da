//! Spot allocator.
//!
//! Picks the first free, active spot of a lot in ascending spot-id order
//! so that allocation is deterministic under identical state. The caller
//! runs this read inside the same transaction as the reservation write;
//! a separate read would let two concurrent reservations race for one
//! spot.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{parking_lot, parking_spot};

/// Resolve a lot that exists and is active.
pub async fn find_active_lot<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
) -> DomainResult<parking_lot::Model> {
    let lot = parking_lot::Entity::find_by_id(lot_id).one(conn).await?;

    match lot {
        Some(lot) if lot.is_active => Ok(lot),
        _ => Err(DomainError::not_found("ParkingLot", "id", lot_id)),
    }
}

/// First available spot in the lot: not occupied, active, lowest id.
pub async fn first_available_spot<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
) -> DomainResult<parking_spot::Model> {
    let spot = parking_spot::Entity::find()
        .filter(parking_spot::Column::LotId.eq(lot_id))
        .filter(parking_spot::Column::IsOccupied.eq(false))
        .filter(parking_spot::Column::IsActive.eq(true))
        .order_by_asc(parking_spot::Column::Id)
        .one(conn)
        .await?;

    spot.ok_or_else(|| {
        DomainError::Conflict("No available spots in this parking lot".to_string())
    })
}

/// `allocate(lot_id)`: active-lot check plus first-available scan.
pub async fn allocate<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
) -> DomainResult<(parking_lot::Model, parking_spot::Model)> {
    let lot = find_active_lot(conn, lot_id).await?;
    let spot = first_available_spot(conn, lot.id).await?;
    Ok((lot, spot))
}
