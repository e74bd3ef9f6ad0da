//! Revenue and occupancy analytics.
//!
//! All reports are computed from completed reservations. Aggregation
//! groups by lot/user id and attaches display names at the end, so a
//! renamed lot never splits its own history into two series.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::billing::round2;
use crate::domain::{Clock, DomainResult, ReservationStatus};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation, user};

/// Service for the admin analytics reports and per-user statistics
pub struct AnalyticsService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

// ── Report shapes ──────────────────────────────────────────────

/// One period bucket of the revenue report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueBucket {
    /// Bucket key, e.g. "2024-03-01", "2024-W09" or "2024-03"
    pub period: String,
    pub revenue: f64,
    pub session_count: u64,
}

/// Revenue attributed to one parking lot
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotRevenue {
    pub lot_id: i32,
    pub lot_name: String,
    pub revenue: f64,
    pub session_count: u64,
}

/// Revenue over a look-back window, bucketed by period and by lot
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueReport {
    /// "day", "week" or "month"
    pub granularity: String,
    pub buckets: Vec<RevenueBucket>,
    pub by_lot: Vec<LotRevenue>,
    pub total_revenue: f64,
    pub total_sessions: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeekdayRevenue {
    /// "Monday" .. "Sunday"
    pub weekday: String,
    pub revenue: f64,
    pub session_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DurationBracketRevenue {
    /// "<1h", "1-2h", "2-4h", "4-8h" or ">8h"
    pub bracket: String,
    pub revenue: f64,
    pub session_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HourlyRevenue {
    /// Hour of day the session started (0..=23, UTC)
    pub hour: u32,
    pub revenue: f64,
    pub session_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopSpender {
    pub user_id: i32,
    pub username: String,
    pub total_spent: f64,
    pub session_count: u64,
}

/// Multi-dimensional revenue breakdown for the admin dashboard charts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueBreakdown {
    pub by_weekday: Vec<WeekdayRevenue>,
    pub by_duration: Vec<DurationBracketRevenue>,
    pub by_start_hour: Vec<HourlyRevenue>,
    pub top_spenders: Vec<TopSpender>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotOccupancy {
    pub lot_id: i32,
    pub lot_name: String,
    pub total_spots: u64,
    pub active_spots: u64,
    pub occupied_spots: u64,
    /// Percentage of active spots currently occupied
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OccupancyReport {
    pub lots: Vec<LotOccupancy>,
    pub overall_rate: f64,
}

/// Headline numbers for the admin dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_lots: u64,
    pub total_spots: u64,
    pub occupied_spots: u64,
    pub available_spots: u64,
    pub total_users: u64,
    pub active_reservations: u64,
    pub reservations_today: u64,
    pub revenue_today: f64,
    pub revenue_month: f64,
    pub total_revenue: f64,
}

/// Personal statistics shown on the user dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserStatistics {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub active_sessions: u64,
    pub total_spent: f64,
    pub total_hours: f64,
    pub average_cost: f64,
    pub average_duration_hours: f64,
    pub most_used_lot: Option<String>,
    pub first_parking: Option<DateTime<Utc>>,
    pub last_parking: Option<DateTime<Utc>>,
}

impl AnalyticsService {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Revenue report over a granularity-dependent look-back window:
    /// 30 days for "day", 90 for "week", 365 for "month".
    pub async fn revenue(&self, granularity: &str) -> DomainResult<RevenueReport> {
        let granularity = match granularity {
            "week" | "month" => granularity,
            _ => "day",
        };
        let lookback_days: i64 = match granularity {
            "month" => 365,
            "week" => 90,
            _ => 30,
        };
        let since = self.clock.now() - Duration::days(lookback_days);

        let completed: Vec<reservation::Model> = reservation::Entity::find()
            .filter(
                Condition::all()
                    .add(reservation::Column::Status.eq(ReservationStatus::Completed.as_str()))
                    .add(reservation::Column::ParkingEndTime.gte(since)),
            )
            .order_by_asc(reservation::Column::ParkingEndTime)
            .all(&self.db)
            .await?;

        let lot_of_spot = self.spot_to_lot_map().await?;
        let lot_names = self.lot_name_map().await?;

        let mut period_map: BTreeMap<String, (f64, u64)> = BTreeMap::new();
        let mut lot_map: BTreeMap<i32, (f64, u64)> = BTreeMap::new();
        let mut total_revenue = 0.0;

        for r in &completed {
            let Some(ended) = r.parking_end_time else {
                continue;
            };
            total_revenue += r.total_cost;

            let entry = period_map.entry(bucket_key(granularity, ended)).or_insert((0.0, 0));
            entry.0 += r.total_cost;
            entry.1 += 1;

            if let Some(&lot_id) = lot_of_spot.get(&r.spot_id) {
                let entry = lot_map.entry(lot_id).or_insert((0.0, 0));
                entry.0 += r.total_cost;
                entry.1 += 1;
            }
        }

        let buckets = period_map
            .into_iter()
            .map(|(period, (revenue, count))| RevenueBucket {
                period,
                revenue: round2(revenue),
                session_count: count,
            })
            .collect();

        let mut by_lot: Vec<LotRevenue> = lot_map
            .into_iter()
            .map(|(lot_id, (revenue, count))| LotRevenue {
                lot_id,
                lot_name: lot_names.get(&lot_id).cloned().unwrap_or_default(),
                revenue: round2(revenue),
                session_count: count,
            })
            .collect();
        by_lot.sort_by(|a, b| b.revenue.partial_cmp(&a.revenue).unwrap_or(std::cmp::Ordering::Equal));

        Ok(RevenueReport {
            granularity: granularity.to_string(),
            buckets,
            by_lot,
            total_revenue: round2(total_revenue),
            total_sessions: completed.len() as u64,
        })
    }

    /// Revenue breakdown across weekday, session duration bracket and
    /// start hour, plus the top `top_n` spenders (all time).
    pub async fn revenue_breakdown(&self, top_n: u32) -> DomainResult<RevenueBreakdown> {
        let completed: Vec<reservation::Model> = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(ReservationStatus::Completed.as_str()))
            .all(&self.db)
            .await?;

        let mut weekday_map: HashMap<String, (f64, u64)> = HashMap::new();
        let mut duration_map: HashMap<&'static str, (f64, u64)> = HashMap::new();
        let mut hour_map: BTreeMap<u32, (f64, u64)> = BTreeMap::new();
        let mut spender_map: HashMap<i32, (f64, u64)> = HashMap::new();

        for r in &completed {
            let spender = spender_map.entry(r.user_id).or_insert((0.0, 0));
            spender.0 += r.total_cost;
            spender.1 += 1;

            let (Some(start), Some(end)) = (r.parking_start_time, r.parking_end_time) else {
                continue;
            };

            let weekday = weekday_map
                .entry(end.format("%A").to_string())
                .or_insert((0.0, 0));
            weekday.0 += r.total_cost;
            weekday.1 += 1;

            let hours = (end - start).num_seconds() as f64 / 3600.0;
            let bracket = duration_map.entry(duration_bracket(hours)).or_insert((0.0, 0));
            bracket.0 += r.total_cost;
            bracket.1 += 1;

            let hour = hour_map.entry(start.hour()).or_insert((0.0, 0));
            hour.0 += r.total_cost;
            hour.1 += 1;
        }

        // Weekdays in calendar order, empty days omitted
        let by_weekday = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ]
        .iter()
        .filter_map(|name| {
            weekday_map.get(*name).map(|&(revenue, count)| WeekdayRevenue {
                weekday: name.to_string(),
                revenue: round2(revenue),
                session_count: count,
            })
        })
        .collect();

        let by_duration = DURATION_BRACKETS
            .iter()
            .filter_map(|name| {
                duration_map.get(*name).map(|&(revenue, count)| DurationBracketRevenue {
                    bracket: name.to_string(),
                    revenue: round2(revenue),
                    session_count: count,
                })
            })
            .collect();

        let by_start_hour = hour_map
            .into_iter()
            .map(|(hour, (revenue, count))| HourlyRevenue {
                hour,
                revenue: round2(revenue),
                session_count: count,
            })
            .collect();

        let usernames: HashMap<i32, String> = user::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut top_spenders: Vec<TopSpender> = spender_map
            .into_iter()
            .map(|(user_id, (total, count))| TopSpender {
                user_id,
                username: usernames.get(&user_id).cloned().unwrap_or_default(),
                total_spent: round2(total),
                session_count: count,
            })
            .collect();
        top_spenders.sort_by(|a, b| {
            b.total_spent
                .partial_cmp(&a.total_spent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.user_id.cmp(&b.user_id))
        });
        top_spenders.truncate(top_n as usize);

        Ok(RevenueBreakdown {
            by_weekday,
            by_duration,
            by_start_hour,
            top_spenders,
        })
    }

    /// Current occupancy per lot. The rate denominator counts only
    /// active spots, so maintenance closures do not drag the rate down.
    pub async fn occupancy(&self) -> DomainResult<OccupancyReport> {
        let lots = parking_lot::Entity::find()
            .order_by_asc(parking_lot::Column::Id)
            .all(&self.db)
            .await?;
        let spots = parking_spot::Entity::find().all(&self.db).await?;

        let mut per_lot: HashMap<i32, (u64, u64, u64)> = HashMap::new();
        for s in &spots {
            let entry = per_lot.entry(s.lot_id).or_insert((0, 0, 0));
            entry.0 += 1;
            if s.is_active {
                entry.1 += 1;
            }
            if s.is_occupied {
                entry.2 += 1;
            }
        }

        let mut total_active = 0u64;
        let mut total_occupied = 0u64;
        let report_lots = lots
            .into_iter()
            .map(|lot| {
                let (total, active, occupied) = per_lot.get(&lot.id).copied().unwrap_or((0, 0, 0));
                total_active += active;
                total_occupied += occupied;
                LotOccupancy {
                    lot_id: lot.id,
                    lot_name: lot.name,
                    total_spots: total,
                    active_spots: active,
                    occupied_spots: occupied,
                    occupancy_rate: occupancy_rate(occupied, active),
                }
            })
            .collect();

        Ok(OccupancyReport {
            lots: report_lots,
            overall_rate: occupancy_rate(total_occupied, total_active),
        })
    }

    /// Headline numbers for the admin dashboard.
    pub async fn dashboard_summary(&self) -> DomainResult<DashboardSummary> {
        let now = self.clock.now();
        let today_start = now
            .date_naive()
            .and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default())
            .and_utc();
        let month_start = now
            .date_naive()
            .with_day(1)
            .unwrap_or(now.date_naive())
            .and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default())
            .and_utc();

        let total_lots = parking_lot::Entity::find().count(&self.db).await?;
        let total_spots = parking_spot::Entity::find().count(&self.db).await?;
        let occupied_spots = parking_spot::Entity::find()
            .filter(parking_spot::Column::IsOccupied.eq(true))
            .count(&self.db)
            .await?;
        let total_users = user::Entity::find()
            .filter(user::Column::IsAdmin.eq(false))
            .count(&self.db)
            .await?;
        let active_reservations = reservation::Entity::find()
            .filter(reservation::Column::Status.is_in([
                ReservationStatus::Reserved.as_str(),
                ReservationStatus::Active.as_str(),
            ]))
            .count(&self.db)
            .await?;
        let reservations_today = reservation::Entity::find()
            .filter(reservation::Column::CreatedAt.gte(today_start))
            .count(&self.db)
            .await?;

        let completed: Vec<reservation::Model> = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(ReservationStatus::Completed.as_str()))
            .all(&self.db)
            .await?;

        let mut revenue_today = 0.0;
        let mut revenue_month = 0.0;
        let mut total_revenue = 0.0;
        for r in &completed {
            total_revenue += r.total_cost;
            if let Some(ended) = r.parking_end_time {
                if ended >= month_start {
                    revenue_month += r.total_cost;
                }
                if ended >= today_start {
                    revenue_today += r.total_cost;
                }
            }
        }

        Ok(DashboardSummary {
            total_lots,
            total_spots,
            occupied_spots,
            available_spots: total_spots.saturating_sub(occupied_spots),
            total_users,
            active_reservations,
            reservations_today,
            revenue_today: round2(revenue_today),
            revenue_month: round2(revenue_month),
            total_revenue: round2(total_revenue),
        })
    }

    /// Personal statistics for one user.
    pub async fn user_statistics(&self, user_id: i32) -> DomainResult<UserStatistics> {
        let all: Vec<reservation::Model> = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let completed: Vec<&reservation::Model> =
            all.iter()
                .filter(|r| r.status == ReservationStatus::Completed.as_str())
                .collect();

        let total_spent: f64 = completed.iter().map(|r| r.total_cost).sum();
        let total_hours: f64 = completed
            .iter()
            .filter_map(|r| match (r.parking_start_time, r.parking_end_time) {
                (Some(start), Some(end)) => Some((end - start).num_seconds() as f64 / 3600.0),
                _ => None,
            })
            .sum();
        let average_cost = if completed.is_empty() {
            0.0
        } else {
            total_spent / completed.len() as f64
        };
        let average_duration_hours = if completed.is_empty() {
            0.0
        } else {
            total_hours / completed.len() as f64
        };

        let active_sessions = all
            .iter()
            .filter(|r| ReservationStatus::from_str(&r.status) == ReservationStatus::Active)
            .count() as u64;
        let first_parking = all.iter().filter_map(|r| r.parking_start_time).min();
        let last_parking = all.iter().filter_map(|r| r.parking_start_time).max();

        let lot_of_spot = self.spot_to_lot_map().await?;
        let lot_names = self.lot_name_map().await?;
        let mut visits: HashMap<i32, u64> = HashMap::new();
        for r in &all {
            if let Some(&lot_id) = lot_of_spot.get(&r.spot_id) {
                *visits.entry(lot_id).or_insert(0) += 1;
            }
        }
        let most_used_lot = visits
            .into_iter()
            .max_by_key(|&(lot_id, count)| (count, std::cmp::Reverse(lot_id)))
            .and_then(|(lot_id, _)| lot_names.get(&lot_id).cloned());

        Ok(UserStatistics {
            total_sessions: all.len() as u64,
            completed_sessions: completed.len() as u64,
            active_sessions,
            total_spent: round2(total_spent),
            total_hours: round2(total_hours),
            average_cost: round2(average_cost),
            average_duration_hours: round2(average_duration_hours),
            most_used_lot,
            first_parking,
            last_parking,
        })
    }

    async fn spot_to_lot_map(&self) -> DomainResult<HashMap<i32, i32>> {
        Ok(parking_spot::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.lot_id))
            .collect())
    }

    async fn lot_name_map(&self) -> DomainResult<HashMap<i32, String>> {
        Ok(parking_lot::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|l| (l.id, l.name))
            .collect())
    }
}

const DURATION_BRACKETS: [&str; 5] = ["<1h", "1-2h", "2-4h", "4-8h", ">8h"];

fn duration_bracket(hours: f64) -> &'static str {
    if hours < 1.0 {
        "<1h"
    } else if hours < 2.0 {
        "1-2h"
    } else if hours < 4.0 {
        "2-4h"
    } else if hours < 8.0 {
        "4-8h"
    } else {
        ">8h"
    }
}

fn occupancy_rate(occupied: u64, active: u64) -> f64 {
    if active == 0 {
        0.0
    } else {
        round2(occupied as f64 / active as f64 * 100.0)
    }
}

fn bucket_key(granularity: &str, at: DateTime<Utc>) -> String {
    match granularity {
        "month" => at.format("%Y-%m").to_string(),
        "week" => at.format("%G-W%V").to_string(),
        _ => at.format("%Y-%m-%d").to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{ActiveModelTrait, Database, NotSet, Set};
    use sea_orm_migration::MigratorTrait;

    use crate::domain::clock::FixedClock;
    use crate::infrastructure::database::migrator::Migrator;

    fn t0() -> DateTime<Utc> {
        // A Friday
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    async fn setup() -> (AnalyticsService, DatabaseConnection) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let clock = Arc::new(FixedClock::at(t0()));
        (AnalyticsService::new(db.clone(), clock), db)
    }

    async fn seed_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> i32 {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(username.to_string()),
            email: Set(format!("{}@test.local", username)),
            password_hash: Set("x".to_string()),
            full_name: Set(username.to_string()),
            phone: Set("0000000000".to_string()),
            address: Set("-".to_string()),
            pin_code: Set("000000".to_string()),
            is_admin: Set(is_admin),
            is_active: Set(true),
            created_at: Set(t0()),
            last_login_at: Set(None),
        };
        model.insert(db).await.unwrap().id
    }

    async fn seed_lot_with_spot(db: &DatabaseConnection, name: &str) -> (i32, i32) {
        let lot = parking_lot::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            address: Set("123 Main Street".to_string()),
            pin_code: Set("500001".to_string()),
            total_spots: Set(1),
            price_per_hour: Set(50.0),
            is_active: Set(true),
            created_at: Set(t0()),
            updated_at: Set(t0()),
        };
        let lot = lot.insert(db).await.unwrap();
        let spot = parking_spot::ActiveModel {
            id: NotSet,
            lot_id: Set(lot.id),
            spot_number: Set("A01".to_string()),
            is_occupied: Set(false),
            is_active: Set(true),
            vehicle_number: Set(None),
            created_at: Set(t0()),
            updated_at: Set(t0()),
        };
        let spot = spot.insert(db).await.unwrap();
        (lot.id, spot.id)
    }

    async fn seed_completed(
        db: &DatabaseConnection,
        user_id: i32,
        spot_id: i32,
        start: DateTime<Utc>,
        hours: i64,
        cost: f64,
    ) {
        let end = start + Duration::hours(hours);
        let model = reservation::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            spot_id: Set(spot_id),
            vehicle_number: Set("KA01AB1234".to_string()),
            status: Set("completed".to_string()),
            reservation_time: Set(start),
            parking_start_time: Set(Some(start)),
            parking_end_time: Set(Some(end)),
            hourly_rate: Set(50.0),
            total_cost: Set(cost),
            created_at: Set(start),
        };
        model.insert(db).await.unwrap();
    }

    #[tokio::test]
    async fn revenue_buckets_by_day_and_lot() {
        let (service, db) = setup().await;
        let user = seed_user(&db, "alice", false).await;
        let (lot_a, spot_a) = seed_lot_with_spot(&db, "Lot A").await;
        let (_lot_b, spot_b) = seed_lot_with_spot(&db, "Lot B").await;

        seed_completed(&db, user, spot_a, t0() - Duration::days(2), 2, 100.0).await;
        seed_completed(&db, user, spot_a, t0() - Duration::days(1), 1, 50.0).await;
        seed_completed(&db, user, spot_b, t0() - Duration::days(1), 1, 50.0).await;
        // Outside the 30-day window, must not count
        seed_completed(&db, user, spot_b, t0() - Duration::days(45), 1, 999.0).await;

        let report = service.revenue("day").await.unwrap();
        assert_eq!(report.total_revenue, 200.0);
        assert_eq!(report.total_sessions, 3);
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.buckets[0].period, "2024-02-28");
        assert_eq!(report.buckets[0].revenue, 100.0);
        assert_eq!(report.buckets[1].revenue, 100.0);

        assert_eq!(report.by_lot.len(), 2);
        assert_eq!(report.by_lot[0].lot_id, lot_a);
        assert_eq!(report.by_lot[0].lot_name, "Lot A");
        assert_eq!(report.by_lot[0].revenue, 150.0);
    }

    #[tokio::test]
    async fn breakdown_brackets_and_top_spenders() {
        let (service, db) = setup().await;
        let alice = seed_user(&db, "alice", false).await;
        let bob = seed_user(&db, "bob", false).await;
        let (_lot, spot) = seed_lot_with_spot(&db, "Lot A").await;

        seed_completed(&db, alice, spot, t0(), 1, 50.0).await; // 1-2h
        seed_completed(&db, alice, spot, t0(), 3, 150.0).await; // 2-4h
        seed_completed(&db, bob, spot, t0(), 10, 500.0).await; // >8h

        let breakdown = service.revenue_breakdown(5).await.unwrap();

        assert_eq!(breakdown.by_duration.len(), 3);
        let brackets: Vec<&str> = breakdown
            .by_duration
            .iter()
            .map(|b| b.bracket.as_str())
            .collect();
        assert_eq!(brackets, vec!["1-2h", "2-4h", ">8h"]);

        assert_eq!(breakdown.top_spenders.len(), 2);
        assert_eq!(breakdown.top_spenders[0].username, "bob");
        assert_eq!(breakdown.top_spenders[0].total_spent, 500.0);
        assert_eq!(breakdown.top_spenders[1].total_spent, 200.0);

        // All three ended on the same Friday
        assert_eq!(breakdown.by_weekday.len(), 1);
        assert_eq!(breakdown.by_weekday[0].weekday, "Friday");
        assert_eq!(breakdown.by_weekday[0].session_count, 3);
        assert_eq!(breakdown.by_start_hour.len(), 1);
        assert_eq!(breakdown.by_start_hour[0].hour, 12);
    }

    #[test]
    fn duration_bracket_edges() {
        assert_eq!(duration_bracket(0.5), "<1h");
        assert_eq!(duration_bracket(1.0), "1-2h");
        assert_eq!(duration_bracket(2.0), "2-4h");
        assert_eq!(duration_bracket(4.0), "4-8h");
        assert_eq!(duration_bracket(8.0), ">8h");
    }

    #[tokio::test]
    async fn occupancy_counts_only_active_spots_in_rate() {
        let (service, db) = setup().await;
        let (lot, spot) = seed_lot_with_spot(&db, "Lot A").await;

        // Second spot, inactive but occupied (maintenance edge case)
        let extra = parking_spot::ActiveModel {
            id: NotSet,
            lot_id: Set(lot),
            spot_number: Set("A02".to_string()),
            is_occupied: Set(false),
            is_active: Set(false),
            vehicle_number: Set(None),
            created_at: Set(t0()),
            updated_at: Set(t0()),
        };
        extra.insert(&db).await.unwrap();

        let found = parking_spot::Entity::find_by_id(spot).one(&db).await.unwrap().unwrap();
        let mut spot_active: parking_spot::ActiveModel = found.into();
        spot_active.is_occupied = Set(true);
        spot_active.update(&db).await.unwrap();

        let report = service.occupancy().await.unwrap();
        assert_eq!(report.lots.len(), 1);
        assert_eq!(report.lots[0].total_spots, 2);
        assert_eq!(report.lots[0].active_spots, 1);
        assert_eq!(report.lots[0].occupied_spots, 1);
        assert_eq!(report.lots[0].occupancy_rate, 100.0);
        assert_eq!(report.overall_rate, 100.0);
    }

    #[tokio::test]
    async fn dashboard_summary_windows_revenue() {
        let (service, db) = setup().await;
        let user = seed_user(&db, "alice", false).await;
        let _admin = seed_user(&db, "root", true).await;
        let (_lot, spot) = seed_lot_with_spot(&db, "Lot A").await;

        seed_completed(&db, user, spot, t0() - Duration::hours(3), 1, 50.0).await; // today
        seed_completed(&db, user, spot, t0() - Duration::days(10), 1, 50.0).await; // last month
        seed_completed(&db, user, spot, t0() - Duration::days(400), 1, 50.0).await; // long ago

        let summary = service.dashboard_summary().await.unwrap();
        assert_eq!(summary.total_lots, 1);
        assert_eq!(summary.total_spots, 1);
        assert_eq!(summary.total_users, 1); // admin excluded
        assert_eq!(summary.revenue_today, 50.0);
        assert_eq!(summary.revenue_month, 50.0);
        assert_eq!(summary.total_revenue, 150.0);
    }

    #[tokio::test]
    async fn user_statistics_aggregate_completed_sessions() {
        let (service, db) = setup().await;
        let user = seed_user(&db, "alice", false).await;
        let (_lot, spot) = seed_lot_with_spot(&db, "Lot A").await;

        seed_completed(&db, user, spot, t0(), 2, 100.0).await;
        seed_completed(&db, user, spot, t0(), 1, 50.0).await;

        let stats = service.user_statistics(user).await.unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_sessions, 2);
        assert_eq!(stats.active_sessions, 0);
        assert_eq!(stats.total_spent, 150.0);
        assert_eq!(stats.total_hours, 3.0);
        assert_eq!(stats.average_cost, 75.0);
        assert_eq!(stats.average_duration_hours, 1.5);
        assert_eq!(stats.most_used_lot.as_deref(), Some("Lot A"));
        assert_eq!(stats.first_parking, Some(t0()));
        assert_eq!(stats.last_parking, Some(t0()));
    }
}
