//! Reservation lifecycle service.
//!
//! Reserve → Occupy → Release (plus the administrative ForceRelease).
//! Every operation runs inside a single database transaction: the
//! allocator read and the reservation/occupancy writes commit or roll
//! back together, so a spot can never end up occupied without an active
//! reservation or vice versa.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::allocator;
use crate::domain::billing::{compute_cost, round2};
use crate::domain::{Clock, DomainError, DomainResult, ReservationStatus};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};

/// Service for the reservation/spot lifecycle
pub struct ReservationService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

/// Result of a successful Reserve
#[derive(Debug, Clone)]
pub struct ReserveOutcome {
    pub reservation: reservation::Model,
    pub spot: parking_spot::Model,
    pub lot: parking_lot::Model,
}

/// Result of a successful Occupy
#[derive(Debug, Clone)]
pub struct OccupyOutcome {
    pub reservation: reservation::Model,
    pub spot: parking_spot::Model,
}

/// Result of a successful Release
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub reservation: reservation::Model,
    pub spot: parking_spot::Model,
    pub total_cost: f64,
    pub duration_hours: f64,
}

/// Result of ForceRelease; `reservation` is None when the spot had no
/// active reservation and only its occupancy flags were cleared.
#[derive(Debug, Clone)]
pub struct ForceReleaseOutcome {
    pub spot: parking_spot::Model,
    pub reservation: Option<reservation::Model>,
}

/// Optional filters for the parking history listing
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub status: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

/// Aggregate statistics attached to a history page
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct HistoryStats {
    pub total_cost: f64,
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub active_sessions: u64,
}

/// One page of a user's reservation history
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub reservations: Vec<reservation::Model>,
    pub total: u64,
    pub stats: HistoryStats,
}

impl ReservationService {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Reserve a spot in a lot (auto-allocation).
    ///
    /// Fails when the user already holds a live (reserved or active)
    /// reservation, when the lot is missing/inactive, or when the lot
    /// has no free active spot. The allocated spot is not yet marked
    /// occupied; occupancy starts at [`Self::occupy`].
    pub async fn reserve(
        &self,
        user_id: i32,
        lot_id: i32,
        vehicle_number: &str,
    ) -> DomainResult<ReserveOutcome> {
        let vehicle_number = vehicle_number.trim();
        if vehicle_number.is_empty() {
            return Err(DomainError::Validation(
                "vehicle_number is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let live = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::Status.is_in([
                ReservationStatus::Reserved.as_str(),
                ReservationStatus::Active.as_str(),
            ]))
            .one(&txn)
            .await?;
        if live.is_some() {
            return Err(DomainError::Conflict(
                "You already have an active reservation".to_string(),
            ));
        }

        let (lot, spot) = allocator::allocate(&txn, lot_id).await?;

        let now = self.clock.now();
        let new_reservation = reservation::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            spot_id: Set(spot.id),
            vehicle_number: Set(vehicle_number.to_string()),
            status: Set(ReservationStatus::Reserved.as_str().to_string()),
            reservation_time: Set(now),
            parking_start_time: Set(None),
            parking_end_time: Set(None),
            // Rate snapshot: later lot price changes never affect this record
            hourly_rate: Set(lot.price_per_hour),
            total_cost: Set(0.0),
            created_at: Set(now),
        };
        let created = new_reservation.insert(&txn).await?;

        txn.commit().await?;

        info!(
            reservation_id = created.id,
            user_id,
            lot_id,
            spot_id = created.spot_id,
            "Spot reserved"
        );

        Ok(ReserveOutcome {
            reservation: created,
            spot,
            lot,
        })
    }

    /// Start parking: `reserved` → `active`, spot marked occupied.
    ///
    /// Wrong id, wrong owner and wrong status all collapse into the same
    /// NotFound so a caller cannot probe other users' reservations.
    /// Admins may occupy on behalf of the owner.
    pub async fn occupy(
        &self,
        reservation_id: i32,
        actor_id: i32,
        actor_is_admin: bool,
    ) -> DomainResult<OccupyOutcome> {
        let txn = self.db.begin().await?;

        let found = Self::find_for_actor(
            &txn,
            reservation_id,
            actor_id,
            actor_is_admin,
            ReservationStatus::Reserved,
        )
        .await?;

        let spot = parking_spot::Entity::find_by_id(found.spot_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", found.spot_id))?;

        // Another reservation on the same spot may have started first;
        // the partial unique index on active reservations backstops this.
        if spot.is_occupied {
            return Err(DomainError::Conflict(
                "Spot is already occupied".to_string(),
            ));
        }

        let now = self.clock.now();
        let vehicle_number = found.vehicle_number.clone();

        let mut res_active: reservation::ActiveModel = found.into();
        res_active.status = Set(ReservationStatus::Active.as_str().to_string());
        res_active.parking_start_time = Set(Some(now));
        let updated = res_active.update(&txn).await?;

        let mut spot_active: parking_spot::ActiveModel = spot.into();
        spot_active.is_occupied = Set(true);
        spot_active.vehicle_number = Set(Some(vehicle_number));
        spot_active.updated_at = Set(now);
        let spot = spot_active.update(&txn).await?;

        txn.commit().await?;

        info!(
            reservation_id,
            spot_id = spot.id,
            "Parking started"
        );

        Ok(OccupyOutcome {
            reservation: updated,
            spot,
        })
    }

    /// End parking: `active` → `completed`, cost billed, spot freed.
    ///
    /// Same collapsed NotFound rule as [`Self::occupy`]; releasing an
    /// already-completed reservation fails with NotFound rather than
    /// double-charging.
    pub async fn release(
        &self,
        reservation_id: i32,
        actor_id: i32,
        actor_is_admin: bool,
    ) -> DomainResult<ReleaseOutcome> {
        let txn = self.db.begin().await?;

        let found = Self::find_for_actor(
            &txn,
            reservation_id,
            actor_id,
            actor_is_admin,
            ReservationStatus::Active,
        )
        .await?;

        let spot = parking_spot::Entity::find_by_id(found.spot_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", found.spot_id))?;

        let outcome = Self::complete_session(&txn, found, spot, self.clock.now()).await?;

        txn.commit().await?;

        info!(
            reservation_id,
            total_cost = outcome.total_cost,
            duration_hours = outcome.duration_hours,
            "Parking ended"
        );

        Ok(outcome)
    }

    /// Administrative override: release whatever active reservation the
    /// spot holds. When the spot has none, its occupancy flags are still
    /// cleared (recovery path for inconsistent state) and no reservation
    /// is returned.
    pub async fn force_release(
        &self,
        spot_id: i32,
        admin_id: i32,
    ) -> DomainResult<ForceReleaseOutcome> {
        let txn = self.db.begin().await?;

        let spot = parking_spot::Entity::find_by_id(spot_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", spot_id))?;

        let active = reservation::Entity::find()
            .filter(reservation::Column::SpotId.eq(spot_id))
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .one(&txn)
            .await?;

        let now = self.clock.now();
        let outcome = match active {
            Some(found) => {
                let released = Self::complete_session(&txn, found, spot, now).await?;
                info!(
                    spot_id,
                    admin_id,
                    reservation_id = released.reservation.id,
                    total_cost = released.total_cost,
                    "Spot force-released"
                );
                ForceReleaseOutcome {
                    spot: released.spot,
                    reservation: Some(released.reservation),
                }
            }
            None => {
                let mut spot_active: parking_spot::ActiveModel = spot.into();
                spot_active.is_occupied = Set(false);
                spot_active.vehicle_number = Set(None);
                spot_active.updated_at = Set(now);
                let spot = spot_active.update(&txn).await?;
                info!(spot_id, admin_id, "Spot occupancy cleared (no active reservation)");
                ForceReleaseOutcome {
                    spot,
                    reservation: None,
                }
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    /// The user's current live reservation (`active` preferred over
    /// `reserved`), with its spot and lot.
    pub async fn active_reservation(
        &self,
        user_id: i32,
    ) -> DomainResult<Option<(reservation::Model, parking_spot::Model, parking_lot::Model)>> {
        let mut found = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .one(&self.db)
            .await?;

        if found.is_none() {
            found = reservation::Entity::find()
                .filter(reservation::Column::UserId.eq(user_id))
                .filter(reservation::Column::Status.eq(ReservationStatus::Reserved.as_str()))
                .one(&self.db)
                .await?;
        }

        let Some(found) = found else {
            return Ok(None);
        };

        let spot = parking_spot::Entity::find_by_id(found.spot_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", found.spot_id))?;
        let lot = parking_lot::Entity::find_by_id(spot.lot_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLot", "id", spot.lot_id))?;

        Ok(Some((found, spot, lot)))
    }

    /// Paginated reservation history for a user, newest first, with
    /// aggregate statistics over the full (unfiltered) history.
    pub async fn history(
        &self,
        user_id: i32,
        page: u32,
        limit: u32,
        filter: &HistoryFilter,
    ) -> DomainResult<HistoryPage> {
        let mut query = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id));

        if let Some(status) = &filter.status {
            query = query.filter(reservation::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.from_date {
            query = query.filter(reservation::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to_date {
            query = query.filter(reservation::Column::CreatedAt.lte(to));
        }

        let total = query.clone().count(&self.db).await?;

        let page = page.max(1);
        let reservations = query
            .order_by_desc(reservation::Column::CreatedAt)
            .order_by_desc(reservation::Column::Id)
            .offset((page as u64 - 1) * limit as u64)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        let all = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let total_sessions = all.len() as u64;
        let completed_sessions = all
            .iter()
            .filter(|r| !ReservationStatus::from_str(&r.status).is_live())
            .count() as u64;
        let total_cost = round2(
            all.iter()
                .filter(|r| !ReservationStatus::from_str(&r.status).is_live())
                .map(|r| r.total_cost)
                .sum(),
        );

        Ok(HistoryPage {
            reservations,
            total,
            stats: HistoryStats {
                total_cost,
                total_sessions,
                completed_sessions,
                active_sessions: total_sessions - completed_sessions,
            },
        })
    }

    // ── Internals ──────────────────────────────────────────────

    /// Locate a reservation for an actor. Ownership is enforced unless
    /// the actor is an admin; a mismatch is indistinguishable from a
    /// missing id.
    async fn find_for_actor<C: ConnectionTrait>(
        conn: &C,
        reservation_id: i32,
        actor_id: i32,
        actor_is_admin: bool,
        expected_status: ReservationStatus,
    ) -> DomainResult<reservation::Model> {
        let mut query = reservation::Entity::find()
            .filter(reservation::Column::Id.eq(reservation_id))
            .filter(reservation::Column::Status.eq(expected_status.as_str()));

        if !actor_is_admin {
            query = query.filter(reservation::Column::UserId.eq(actor_id));
        }

        query
            .one(conn)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))
    }

    /// Shared completion path for Release and ForceRelease: bill the
    /// session, mark the reservation completed and free the spot.
    async fn complete_session<C: ConnectionTrait>(
        conn: &C,
        found: reservation::Model,
        spot: parking_spot::Model,
        now: DateTime<Utc>,
    ) -> DomainResult<ReleaseOutcome> {
        let start = found.parking_start_time.ok_or_else(|| {
            DomainError::Conflict("Active reservation has no parking start time".to_string())
        })?;

        let total_cost = compute_cost(start, now, found.hourly_rate);
        let duration_hours = round2((now - start).num_seconds() as f64 / 3600.0);

        let mut res_active: reservation::ActiveModel = found.into();
        res_active.status = Set(ReservationStatus::Completed.as_str().to_string());
        res_active.parking_end_time = Set(Some(now));
        res_active.total_cost = Set(total_cost);
        let reservation = res_active.update(conn).await?;

        let mut spot_active: parking_spot::ActiveModel = spot.into();
        spot_active.is_occupied = Set(false);
        spot_active.vehicle_number = Set(None);
        spot_active.updated_at = Set(now);
        let spot = spot_active.update(conn).await?;

        Ok(ReleaseOutcome {
            reservation,
            spot,
            total_cost,
            duration_hours,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use crate::domain::clock::FixedClock;
    use crate::infrastructure::database::entities::user;
    use crate::infrastructure::database::migrator::Migrator;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    async fn setup() -> (ReservationService, DatabaseConnection, Arc<FixedClock>) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let clock = Arc::new(FixedClock::at(t0()));
        let service = ReservationService::new(db.clone(), clock.clone());
        (service, db, clock)
    }

    async fn seed_user(db: &DatabaseConnection, username: &str) -> i32 {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(username.to_string()),
            email: Set(format!("{}@test.local", username)),
            password_hash: Set("x".to_string()),
            full_name: Set(username.to_string()),
            phone: Set("0000000000".to_string()),
            address: Set("-".to_string()),
            pin_code: Set("000000".to_string()),
            is_admin: Set(false),
            is_active: Set(true),
            created_at: Set(t0()),
            last_login_at: Set(None),
        };
        model.insert(db).await.unwrap().id
    }

    async fn seed_lot(db: &DatabaseConnection, name: &str, spots: u32, price: f64) -> i32 {
        let lot = parking_lot::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            address: Set("123 Main Street".to_string()),
            pin_code: Set("500001".to_string()),
            total_spots: Set(spots as i32),
            price_per_hour: Set(price),
            is_active: Set(true),
            created_at: Set(t0()),
            updated_at: Set(t0()),
        };
        let lot = lot.insert(db).await.unwrap();

        for i in 1..=spots {
            let spot = parking_spot::ActiveModel {
                id: NotSet,
                lot_id: Set(lot.id),
                spot_number: Set(format!("A{:02}", i)),
                is_occupied: Set(false),
                is_active: Set(true),
                vehicle_number: Set(None),
                created_at: Set(t0()),
                updated_at: Set(t0()),
            };
            spot.insert(db).await.unwrap();
        }
        lot.id
    }

    #[tokio::test]
    async fn reserve_allocates_first_free_spot() {
        let (service, db, _) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 3, 50.0).await;

        let outcome = service.reserve(user, lot, "KA01AB1234").await.unwrap();

        assert_eq!(outcome.reservation.status, "reserved");
        assert_eq!(outcome.reservation.hourly_rate, 50.0);
        assert_eq!(outcome.reservation.total_cost, 0.0);
        assert_eq!(outcome.spot.spot_number, "A01");
        // Occupancy begins only at occupy
        assert!(!outcome.spot.is_occupied);
    }

    #[tokio::test]
    async fn duplicate_live_reservation_is_rejected() {
        let (service, db, _) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 3, 50.0).await;

        service.reserve(user, lot, "KA01AB1234").await.unwrap();
        let err = service.reserve(user, lot, "KA01AB1234").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn reserve_on_missing_or_inactive_lot_is_not_found() {
        let (service, db, _) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 1, 50.0).await;

        let err = service.reserve(user, 999, "KA01AB1234").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let found = parking_lot::Entity::find_by_id(lot).one(&db).await.unwrap().unwrap();
        let mut lot_active: parking_lot::ActiveModel = found.into();
        lot_active.is_active = Set(false);
        lot_active.update(&db).await.unwrap();

        let err = service.reserve(user, lot, "KA01AB1234").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn full_lot_is_a_conflict_distinct_from_missing_lot() {
        let (service, db, _) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let lot = seed_lot(&db, "Tiny Lot", 1, 50.0).await;

        let r = service.reserve(alice, lot, "KA01AB1234").await.unwrap();
        service.occupy(r.reservation.id, alice, false).await.unwrap();

        let err = service.reserve(bob, lot, "KA02CD5678").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn occupy_marks_spot_and_activates_reservation() {
        let (service, db, _) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        let occupied = service.occupy(r.reservation.id, user, false).await.unwrap();

        assert_eq!(occupied.reservation.status, "active");
        assert!(occupied.reservation.parking_start_time.is_some());
        assert!(occupied.spot.is_occupied);
        assert_eq!(occupied.spot.vehicle_number.as_deref(), Some("KA01AB1234"));
    }

    #[tokio::test]
    async fn occupy_by_another_user_collapses_to_not_found() {
        let (service, db, _) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(alice, lot, "KA01AB1234").await.unwrap();
        let err = service.occupy(r.reservation.id, bob, false).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn occupy_on_an_already_occupied_spot_is_a_conflict() {
        let (service, db, _) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let lot = seed_lot(&db, "Downtown Mall", 1, 50.0).await;

        // Both reservations land on the single spot: allocation only
        // skips occupied spots, not reserved ones
        let ra = service.reserve(alice, lot, "KA01AB1234").await.unwrap();
        let rb = service.reserve(bob, lot, "KA02CD5678").await.unwrap();
        assert_eq!(ra.spot.id, rb.spot.id);

        service.occupy(ra.reservation.id, alice, false).await.unwrap();

        let err = service.occupy(rb.reservation.id, bob, false).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn release_after_ninety_minutes_bills_one_and_a_half_hours() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        service.occupy(r.reservation.id, user, false).await.unwrap();

        clock.advance(Duration::minutes(90));
        let released = service.release(r.reservation.id, user, false).await.unwrap();

        assert_eq!(released.reservation.status, "completed");
        assert_eq!(released.total_cost, 75.0);
        assert_eq!(released.duration_hours, 1.5);
        assert!(!released.spot.is_occupied);
        assert!(released.spot.vehicle_number.is_none());
    }

    #[tokio::test]
    async fn short_stay_gets_minimum_one_hour_charge() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        service.occupy(r.reservation.id, user, false).await.unwrap();

        clock.advance(Duration::minutes(40));
        let released = service.release(r.reservation.id, user, false).await.unwrap();
        assert_eq!(released.total_cost, 50.0);
    }

    #[tokio::test]
    async fn second_release_fails_without_double_charging() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        service.occupy(r.reservation.id, user, false).await.unwrap();
        clock.advance(Duration::minutes(90));
        service.release(r.reservation.id, user, false).await.unwrap();

        let err = service.release(r.reservation.id, user, false).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let stored = reservation::Entity::find_by_id(r.reservation.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_cost, 75.0);
    }

    #[tokio::test]
    async fn rate_snapshot_survives_lot_price_change() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        service.occupy(r.reservation.id, user, false).await.unwrap();

        let found = parking_lot::Entity::find_by_id(lot).one(&db).await.unwrap().unwrap();
        let mut lot_active: parking_lot::ActiveModel = found.into();
        lot_active.price_per_hour = Set(100.0);
        lot_active.update(&db).await.unwrap();

        clock.advance(Duration::hours(2));
        let released = service.release(r.reservation.id, user, false).await.unwrap();
        assert_eq!(released.total_cost, 100.0); // 2h at the snapshotted 50.0
    }

    #[tokio::test]
    async fn force_release_bills_the_active_session() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let admin = seed_user(&db, "root").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        let occupied = service.occupy(r.reservation.id, user, false).await.unwrap();

        clock.advance(Duration::minutes(90));
        let forced = service.force_release(occupied.spot.id, admin).await.unwrap();

        let released = forced.reservation.unwrap();
        assert_eq!(released.status, "completed");
        assert_eq!(released.total_cost, 75.0);
        assert!(!forced.spot.is_occupied);
    }

    #[tokio::test]
    async fn force_release_clears_flags_even_without_reservation() {
        let (service, db, _) = setup().await;
        let admin = seed_user(&db, "root").await;
        let lot = seed_lot(&db, "Downtown Mall", 1, 50.0).await;

        // Manufacture inconsistent state: occupied flag without a reservation
        let spot = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let spot_id = spot.id;
        let mut spot_active: parking_spot::ActiveModel = spot.into();
        spot_active.is_occupied = Set(true);
        spot_active.vehicle_number = Set(Some("GHOST".to_string()));
        spot_active.update(&db).await.unwrap();

        let forced = service.force_release(spot_id, admin).await.unwrap();
        assert!(forced.reservation.is_none());
        assert!(!forced.spot.is_occupied);
        assert!(forced.spot.vehicle_number.is_none());
    }

    #[tokio::test]
    async fn force_release_on_missing_spot_is_not_found() {
        let (service, db, _) = setup().await;
        let admin = seed_user(&db, "root").await;
        let err = service.force_release(999, admin).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn allocation_skips_occupied_spots_deterministically() {
        let (service, db, clock) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let lot = seed_lot(&db, "Downtown Mall", 3, 50.0).await;

        let r1 = service.reserve(alice, lot, "KA01AB1234").await.unwrap();
        service.occupy(r1.reservation.id, alice, false).await.unwrap();
        assert_eq!(r1.spot.spot_number, "A01");

        let r2 = service.reserve(bob, lot, "KA02CD5678").await.unwrap();
        assert_eq!(r2.spot.spot_number, "A02");

        // After alice leaves, her spot is first again
        clock.advance(Duration::hours(1));
        service.release(r1.reservation.id, alice, false).await.unwrap();

        let r3 = service.reserve(alice, lot, "KA01AB1234").await.unwrap();
        assert_eq!(r3.spot.spot_number, "A01");
    }

    #[tokio::test]
    async fn history_paginates_and_aggregates() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 2, 50.0).await;

        for _ in 0..3 {
            let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
            service.occupy(r.reservation.id, user, false).await.unwrap();
            clock.advance(Duration::hours(1));
            service.release(r.reservation.id, user, false).await.unwrap();
        }

        let page = service
            .history(user, 1, 2, &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.reservations.len(), 2);
        assert_eq!(page.stats.total_sessions, 3);
        assert_eq!(page.stats.completed_sessions, 3);
        assert_eq!(page.stats.active_sessions, 0);
        assert_eq!(page.stats.total_cost, 150.0);

        let completed_only = HistoryFilter {
            status: Some("completed".to_string()),
            ..Default::default()
        };
        let filtered = service.history(user, 1, 10, &completed_only).await.unwrap();
        assert_eq!(filtered.total, 3);
    }

    #[tokio::test]
    async fn history_far_past_the_last_page_is_empty() {
        let (service, db, clock) = setup().await;
        let user = seed_user(&db, "alice").await;
        let lot = seed_lot(&db, "Downtown Mall", 1, 50.0).await;

        let r = service.reserve(user, lot, "KA01AB1234").await.unwrap();
        service.occupy(r.reservation.id, user, false).await.unwrap();
        clock.advance(Duration::hours(1));
        service.release(r.reservation.id, user, false).await.unwrap();

        let page = service
            .history(user, u32::MAX, 100, &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.reservations.is_empty());
    }
}
