//! Create reservations table
//!
//! Holds the full lifecycle record (reserved → active → completed) with
//! the rate snapshot taken at reservation time. A partial unique index
//! backs the one-active-reservation-per-spot invariant at the storage
//! layer; application checks alone are race-prone.

use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_users::Users;
use super::m20240301_000003_create_parking_spots::ParkingSpots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::UserId).integer().not_null())
                    .col(ColumnDef::new(Reservations::SpotId).integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::VehicleNumber)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::Status)
                            .string()
                            .not_null()
                            .default("reserved"),
                    )
                    .col(
                        ColumnDef::new(Reservations::ReservationTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::ParkingStartTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reservations::ParkingEndTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reservations::HourlyRate)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::TotalCost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_user")
                            .from(Reservations::Table, Reservations::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_spot")
                            .from(Reservations::Table, Reservations::SpotId)
                            .to(ParkingSpots::Table, ParkingSpots::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_user")
                    .table(Reservations::Table)
                    .col(Reservations::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_status")
                    .table(Reservations::Table)
                    .col(Reservations::Status)
                    .to_owned(),
            )
            .await?;

        // At most one active reservation per spot (SQLite and PostgreSQL
        // both support partial indexes).
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_reservations_spot_active \
                 ON reservations (spot_id) WHERE status = 'active'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    UserId,
    SpotId,
    VehicleNumber,
    Status,
    ReservationTime,
    ParkingStartTime,
    ParkingEndTime,
    HourlyRate,
    TotalCost,
    CreatedAt,
}
