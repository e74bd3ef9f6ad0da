//! API router with Swagger UI

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::dto::{
    common, ApiResponse, LotDto, PaginatedResponse, ReservationDto, SpotDto, UserDto,
};
use crate::api::handlers::{admin, analytics, auth, health, user};
use crate::application::services::{
    analytics as analytics_service, reservations, AnalyticsService, LotService, ReservationService,
};
use crate::auth::middleware::{admin_middleware, auth_middleware, AuthState};
use crate::auth::JwtConfig;
use crate::domain::{Clock, CostBreakdown};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::register,
        auth::get_current_user,
        // User
        user::user_dashboard,
        user::list_parking_lots,
        user::reserve_spot,
        user::occupy_spot,
        user::release_spot,
        user::active_reservation,
        user::parking_history,
        user::user_statistics,
        // Admin
        admin::admin_dashboard,
        admin::list_lots,
        admin::create_lot,
        admin::get_lot,
        admin::update_lot,
        admin::delete_lot,
        admin::list_users,
        admin::toggle_user_status,
        admin::list_reservations,
        admin::force_release_spot,
        admin::toggle_spot_active,
        // Analytics
        analytics::revenue,
        analytics::revenue_breakdown,
        analytics::occupancy,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            common::EmptyData,
            common::PaginationParams,
            PaginatedResponse<ReservationDto>,
            PaginatedResponse<UserDto>,
            // Entities
            UserDto,
            LotDto,
            SpotDto,
            ReservationDto,
            CostBreakdown,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            // User
            user::ReserveSpotRequest,
            user::ReleaseResponse,
            user::UserDashboard,
            user::ParkingHistoryResponse,
            reservations::HistoryStats,
            analytics_service::UserStatistics,
            // Admin
            admin::CreateLotRequest,
            admin::UpdateLotRequest,
            admin::LotDetail,
            admin::ForceReleaseResponse,
            analytics_service::DashboardSummary,
            // Analytics
            analytics_service::RevenueReport,
            analytics_service::RevenueBucket,
            analytics_service::LotRevenue,
            analytics_service::RevenueBreakdown,
            analytics_service::WeekdayRevenue,
            analytics_service::DurationBracketRevenue,
            analytics_service::HourlyRevenue,
            analytics_service::TopSpender,
            analytics_service::OccupancyReport,
            analytics_service::LotOccupancy,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "User registration and JWT login"),
        (name = "User", description = "Parking lot discovery and the reservation lifecycle"),
        (name = "Admin", description = "Lot, spot and user administration"),
        (name = "Analytics", description = "Revenue and occupancy reports"),
    ),
    info(
        title = "ParkWise API",
        version = "1.0.0",
        description = "REST API for the vehicle parking reservation service",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    db: DatabaseConnection,
    jwt_config: JwtConfig,
    clock: Arc<dyn Clock>,
) -> Router {
    let reservations = Arc::new(ReservationService::new(db.clone(), clock.clone()));
    let lots = Arc::new(LotService::new(db.clone(), clock.clone()));
    let analytics_svc = Arc::new(AnalyticsService::new(db.clone(), clock));

    let middleware_state = AuthState {
        jwt_config: jwt_config.clone(),
        db: db.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_state = auth::AuthHandlerState {
        db: db.clone(),
        jwt_config,
    };
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .with_state(auth_state.clone());

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::get_current_user))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    // User routes (protected)
    let user_state = user::UserApiState {
        db: db.clone(),
        reservations: reservations.clone(),
        lots: lots.clone(),
        analytics: analytics_svc.clone(),
    };
    let user_routes = Router::new()
        .route("/dashboard", get(user::user_dashboard))
        .route("/parking-lots", get(user::list_parking_lots))
        .route("/reserve-spot", post(user::reserve_spot))
        .route("/reservations/{id}/occupy", post(user::occupy_spot))
        .route("/reservations/{id}/release", post(user::release_spot))
        .route("/active-reservation", get(user::active_reservation))
        .route("/parking-history", get(user::parking_history))
        .route("/statistics", get(user::user_statistics))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(user_state);

    // Analytics routes, nested under /admin (admin check applied below)
    let analytics_routes = Router::new()
        .route("/revenue", get(analytics::revenue))
        .route("/revenue-breakdown", get(analytics::revenue_breakdown))
        .route("/occupancy", get(analytics::occupancy))
        .with_state(analytics::AnalyticsApiState {
            analytics: analytics_svc.clone(),
        });

    // Admin routes (protected, admin only). The admin check reads the
    // extension set by auth_middleware, so auth is layered last
    // (outermost).
    let admin_state = admin::AdminApiState {
        db: db.clone(),
        reservations,
        lots,
        analytics: analytics_svc,
    };
    let admin_routes = Router::new()
        .route("/dashboard", get(admin::admin_dashboard))
        .route(
            "/parking-lots",
            get(admin::list_lots).post(admin::create_lot),
        )
        .route(
            "/parking-lots/{id}",
            get(admin::get_lot)
                .put(admin::update_lot)
                .delete(admin::delete_lot),
        )
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}/toggle-status",
            post(admin::toggle_user_status),
        )
        .route("/reservations", get(admin::list_reservations))
        .route(
            "/spots/{spot_id}/force-release",
            post(admin::force_release_spot),
        )
        .route(
            "/spots/{spot_id}/toggle-active",
            post(admin::toggle_spot_active),
        )
        .with_state(admin_state)
        .nest("/analytics", analytics_routes)
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/auth", auth_protected_routes)
        .nest("/api/v1/user", user_routes)
        .nest("/api/v1/admin", admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
