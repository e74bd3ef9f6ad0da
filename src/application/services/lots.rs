//! Parking lot and spot administration.
//!
//! Spots are generated together with their lot (numbered A01..Ann) and
//! never added or removed afterwards; capacity changes go through the
//! per-spot active flag.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::domain::clock::Clock;
use crate::domain::{DomainError, DomainResult, ReservationStatus};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};
use std::sync::Arc;

pub struct LotService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

/// Input for creating a lot
#[derive(Debug, Clone)]
pub struct NewLot {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub total_spots: i32,
    pub price_per_hour: f64,
}

/// Mutable lot fields; `total_spots` is deliberately absent
#[derive(Debug, Clone, Default)]
pub struct LotUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub price_per_hour: Option<f64>,
    pub is_active: Option<bool>,
}

/// A lot together with its current availability numbers
#[derive(Debug, Clone)]
pub struct LotAvailability {
    pub lot: parking_lot::Model,
    pub available_spots: u64,
    pub occupied_spots: u64,
}

impl LotService {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Create a lot and generate its full set of spots in one
    /// transaction.
    pub async fn create(&self, input: NewLot) -> DomainResult<parking_lot::Model> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        if input.total_spots < 1 {
            return Err(DomainError::Validation(
                "total_spots must be at least 1".to_string(),
            ));
        }
        if input.price_per_hour <= 0.0 {
            return Err(DomainError::Validation(
                "price_per_hour must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let now = self.clock.now();

        let lot = parking_lot::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            address: Set(input.address.trim().to_string()),
            pin_code: Set(input.pin_code.trim().to_string()),
            total_spots: Set(input.total_spots),
            price_per_hour: Set(input.price_per_hour),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let lot = lot.insert(&txn).await?;

        // Zero-padded to the capacity's width so numbers sort lexically
        let width = input.total_spots.to_string().len().max(2);
        for i in 1..=input.total_spots {
            let spot = parking_spot::ActiveModel {
                id: NotSet,
                lot_id: Set(lot.id),
                spot_number: Set(format!("A{:0width$}", i)),
                is_occupied: Set(false),
                is_active: Set(true),
                vehicle_number: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            spot.insert(&txn).await?;
        }

        txn.commit().await?;

        info!(lot_id = lot.id, spots = input.total_spots, "Parking lot created");
        Ok(lot)
    }

    /// Update a lot's mutable fields. Capacity cannot change here.
    pub async fn update(&self, lot_id: i32, update: LotUpdate) -> DomainResult<parking_lot::Model> {
        let found = parking_lot::Entity::find_by_id(lot_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", "id", lot_id))?;

        if let Some(price) = update.price_per_hour {
            if price <= 0.0 {
                return Err(DomainError::Validation(
                    "price_per_hour must be positive".to_string(),
                ));
            }
        }

        let mut active: parking_lot::ActiveModel = found.into();
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::Validation("name is required".to_string()));
            }
            active.name = Set(name);
        }
        if let Some(address) = update.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(pin_code) = update.pin_code {
            active.pin_code = Set(pin_code.trim().to_string());
        }
        if let Some(price) = update.price_per_hour {
            active.price_per_hour = Set(price);
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(self.clock.now());

        Ok(active.update(&self.db).await?)
    }

    /// Delete a lot and its spots. Refused while any spot is occupied
    /// or any live reservation still points into the lot.
    pub async fn delete(&self, lot_id: i32) -> DomainResult<()> {
        let txn = self.db.begin().await?;

        parking_lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", "id", lot_id))?;

        let spot_ids: Vec<i32> = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let occupied = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .filter(parking_spot::Column::IsOccupied.eq(true))
            .count(&txn)
            .await?;
        if occupied > 0 {
            return Err(DomainError::Conflict(
                "Cannot delete a parking lot with occupied spots".to_string(),
            ));
        }

        if !spot_ids.is_empty() {
            let live = reservation::Entity::find()
                .filter(reservation::Column::SpotId.is_in(spot_ids))
                .filter(reservation::Column::Status.is_in([
                    ReservationStatus::Reserved.as_str(),
                    ReservationStatus::Active.as_str(),
                ]))
                .count(&txn)
                .await?;
            if live > 0 {
                return Err(DomainError::Conflict(
                    "Cannot delete a parking lot with live reservations".to_string(),
                ));
            }
        }

        // Spots go with the lot via FK cascade
        parking_lot::Entity::delete_by_id(lot_id).exec(&txn).await?;
        txn.commit().await?;

        info!(lot_id, "Parking lot deleted");
        Ok(())
    }

    /// Toggle a spot's active flag. An occupied spot cannot be
    /// deactivated.
    pub async fn toggle_spot_active(&self, spot_id: i32) -> DomainResult<parking_spot::Model> {
        let found = parking_spot::Entity::find_by_id(spot_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", spot_id))?;

        if found.is_active && found.is_occupied {
            return Err(DomainError::Conflict(
                "Cannot deactivate an occupied spot".to_string(),
            ));
        }

        let next = !found.is_active;
        let mut active: parking_spot::ActiveModel = found.into();
        active.is_active = Set(next);
        active.updated_at = Set(self.clock.now());
        Ok(active.update(&self.db).await?)
    }

    /// Find one lot by id.
    pub async fn get(&self, lot_id: i32) -> DomainResult<parking_lot::Model> {
        parking_lot::Entity::find_by_id(lot_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", "id", lot_id))
    }

    /// Spots of one lot, in spot-number order.
    pub async fn spots(&self, lot_id: i32) -> DomainResult<Vec<parking_spot::Model>> {
        self.get(lot_id).await?;
        Ok(parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .order_by_asc(parking_spot::Column::SpotNumber)
            .all(&self.db)
            .await?)
    }

    /// All lots with availability counts. `active_only` drops inactive
    /// lots (the user-facing listing); admins see everything.
    pub async fn list_with_availability(
        &self,
        active_only: bool,
    ) -> DomainResult<Vec<LotAvailability>> {
        let mut query = parking_lot::Entity::find().order_by_asc(parking_lot::Column::Id);
        if active_only {
            query = query.filter(parking_lot::Column::IsActive.eq(true));
        }
        let lots = query.all(&self.db).await?;
        let spots = parking_spot::Entity::find().all(&self.db).await?;

        Ok(lots
            .into_iter()
            .map(|lot| {
                let mut available = 0u64;
                let mut occupied = 0u64;
                for s in spots.iter().filter(|s| s.lot_id == lot.id) {
                    if s.is_occupied {
                        occupied += 1;
                    } else if s.is_active {
                        available += 1;
                    }
                }
                LotAvailability {
                    lot,
                    available_spots: available,
                    occupied_spots: occupied,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use crate::domain::clock::FixedClock;
    use crate::infrastructure::database::migrator::Migrator;

    async fn setup() -> (LotService, DatabaseConnection) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        (LotService::new(db.clone(), clock), db)
    }

    fn new_lot(spots: i32) -> NewLot {
        NewLot {
            name: "Downtown Mall".to_string(),
            address: "123 Main Street".to_string(),
            pin_code: "500001".to_string(),
            total_spots: spots,
            price_per_hour: 50.0,
        }
    }

    #[tokio::test]
    async fn create_generates_numbered_spots() {
        let (service, _db) = setup().await;
        let lot = service.create(new_lot(3)).await.unwrap();

        let spots = service.spots(lot.id).await.unwrap();
        let numbers: Vec<&str> = spots.iter().map(|s| s.spot_number.as_str()).collect();
        assert_eq!(numbers, vec!["A01", "A02", "A03"]);
        assert!(spots.iter().all(|s| s.is_active && !s.is_occupied));
    }

    #[tokio::test]
    async fn create_pads_spot_numbers_to_capacity_width() {
        let (service, _db) = setup().await;
        let lot = service.create(new_lot(100)).await.unwrap();

        let spots = service.spots(lot.id).await.unwrap();
        assert_eq!(spots.len(), 100);
        assert_eq!(spots[0].spot_number, "A001");
        assert_eq!(spots[9].spot_number, "A010");
        assert_eq!(spots[99].spot_number, "A100");
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let (service, _db) = setup().await;

        let mut bad = new_lot(0);
        assert!(matches!(
            service.create(bad.clone()).await.unwrap_err(),
            DomainError::Validation(_)
        ));

        bad = new_lot(3);
        bad.price_per_hour = 0.0;
        assert!(matches!(
            service.create(bad).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn update_changes_price_but_never_capacity() {
        let (service, _db) = setup().await;
        let lot = service.create(new_lot(2)).await.unwrap();

        let updated = service
            .update(
                lot.id,
                LotUpdate {
                    price_per_hour: Some(80.0),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price_per_hour, 80.0);
        assert!(!updated.is_active);
        assert_eq!(updated.total_spots, 2);
        assert_eq!(service.spots(lot.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_refused_while_a_spot_is_occupied() {
        let (service, db) = setup().await;
        let lot = service.create(new_lot(1)).await.unwrap();

        let spot = service.spots(lot.id).await.unwrap().remove(0);
        let mut active: parking_spot::ActiveModel = spot.into();
        active.is_occupied = Set(true);
        active.update(&db).await.unwrap();

        let err = service.delete(lot.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(service.get(lot.id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_removes_lot_and_spots() {
        let (service, db) = setup().await;
        let lot = service.create(new_lot(2)).await.unwrap();

        service.delete(lot.id).await.unwrap();
        assert!(matches!(
            service.get(lot.id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
        let remaining = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn occupied_spot_cannot_be_deactivated() {
        let (service, db) = setup().await;
        let lot = service.create(new_lot(1)).await.unwrap();
        let spot = service.spots(lot.id).await.unwrap().remove(0);
        let spot_id = spot.id;

        let mut active: parking_spot::ActiveModel = spot.into();
        active.is_occupied = Set(true);
        active.update(&db).await.unwrap();

        let err = service.toggle_spot_active(spot_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn toggle_flips_active_flag_both_ways() {
        let (service, _db) = setup().await;
        let lot = service.create(new_lot(1)).await.unwrap();
        let spot_id = service.spots(lot.id).await.unwrap()[0].id;

        let off = service.toggle_spot_active(spot_id).await.unwrap();
        assert!(!off.is_active);
        let on = service.toggle_spot_active(spot_id).await.unwrap();
        assert!(on.is_active);
    }

    #[tokio::test]
    async fn availability_counts_skip_inactive_spots() {
        let (service, _db) = setup().await;
        let lot = service.create(new_lot(3)).await.unwrap();
        let spot_id = service.spots(lot.id).await.unwrap()[0].id;
        service.toggle_spot_active(spot_id).await.unwrap();

        let listing = service.list_with_availability(true).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].lot.id, lot.id);
        assert_eq!(listing[0].available_spots, 2);
        assert_eq!(listing[0].occupied_spots, 0);
    }

    #[tokio::test]
    async fn inactive_lots_hidden_from_user_listing() {
        let (service, _db) = setup().await;
        let lot = service.create(new_lot(1)).await.unwrap();
        service
            .update(
                lot.id,
                LotUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(service.list_with_availability(true).await.unwrap().is_empty());
        assert_eq!(service.list_with_availability(false).await.unwrap().len(), 1);
    }
}
