//! Create parking_lots table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingLots::Name).string().not_null())
                    .col(ColumnDef::new(ParkingLots::Address).string().not_null())
                    .col(ColumnDef::new(ParkingLots::PinCode).string().not_null())
                    .col(
                        ColumnDef::new(ParkingLots::TotalSpots)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::PricePerHour)
                            .double()
                            .not_null()
                            .default(50.0),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLots {
    Table,
    Id,
    Name,
    Address,
    PinCode,
    TotalSpots,
    PricePerHour,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
