use chrono::Utc;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};

use crate::database::{
    models::{ClockAction, ClockOutcome, ClockRequest, CloseShiftInput, Location, OpenShiftInput},
    repositories::{LocationRepository, ShiftRepository},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;
use crate::geofence::{Coordinates, match_location};
use crate::services::auth::AuthService;

/// Clock in/out: resolves the employee, matches the geofence and toggles the
/// open shift.
#[derive(Clone)]
pub struct ClockService {
    pool: SqlitePool,
    auth_service: AuthService,
    location_repository: LocationRepository,
    active_locations: Cache<(), Arc<Vec<Location>>>,
}

impl ClockService {
    pub fn new(
        pool: SqlitePool,
        auth_service: AuthService,
        location_repository: LocationRepository,
        location_cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            pool,
            auth_service,
            location_repository,
            active_locations: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(location_cache_ttl_seconds))
                .build(),
        }
    }

    /// Active locations in id order, served from cache when warm.
    pub async fn active_locations(&self) -> Result<Arc<Vec<Location>>, AppError> {
        if let Some(locations) = self.active_locations.get(&()).await {
            return Ok(locations);
        }

        let locations = Arc::new(self.location_repository.list_active_for_matching().await?);
        self.active_locations.insert((), locations.clone()).await;
        Ok(locations)
    }

    /// Must follow every location write.
    pub async fn invalidate_locations(&self) {
        self.active_locations.invalidate(&()).await;
    }

    pub async fn clock(&self, request: ClockRequest) -> Result<(i64, ClockOutcome), AppError> {
        // Reject bad coordinates before touching credentials or the database.
        let point = Coordinates::new(request.lat, request.lng)?;

        let user = self
            .auth_service
            .authenticate_pin(request.employee_code.trim(), &request.pin)
            .await?;

        let locations = self.active_locations().await?;
        let matched = match_location(point, &locations);

        let user_id = user.id;
        let location_id = matched.location_id();
        let is_adhoc = matched.is_adhoc();
        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let (action, shift) = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let now = Utc::now();
                match ShiftRepository::find_open_for_user(&mut **tx, user_id).await? {
                    Some(open) => {
                        let input = CloseShiftInput {
                            clock_out: now,
                            latitude: point.latitude(),
                            longitude: point.longitude(),
                            location_id,
                            notes,
                        };
                        let closed = ShiftRepository::close_shift(&mut **tx, open.id, &input)
                            .await?
                            .ok_or_else(|| {
                                AppError::Conflict("Shift was already closed".to_string())
                            })?;
                        Ok::<_, AppError>((ClockAction::ClockOut, closed))
                    }
                    None => {
                        let input = OpenShiftInput {
                            user_id,
                            location_id,
                            clock_in: now,
                            latitude: point.latitude(),
                            longitude: point.longitude(),
                            is_adhoc,
                            notes,
                        };
                        let opened = ShiftRepository::open_shift(&mut **tx, &input).await?;
                        Ok::<_, AppError>((ClockAction::ClockIn, opened))
                    }
                }
            })
        })
        .await?;

        log::info!(
            "Employee {} {} shift {} (location: {:?}, adhoc: {})",
            user.employee_code,
            action.as_str(),
            shift.id,
            shift.location_id,
            shift.is_adhoc
        );

        // A deactivated location drops out of the active list but stays on the shift.
        let location = match shift.location_id {
            Some(id) => match locations.iter().find(|l| l.id == id) {
                Some(location) => Some(location.clone()),
                None => self.location_repository.find_by_id(id).await?,
            },
            None => None,
        };

        // The punch's distance only describes the shift's own location.
        let distance_meters = matched
            .distance_meters()
            .filter(|_| location_id.is_some() && location_id == shift.location_id);
        let adhoc = shift.is_adhoc;

        Ok((
            user_id,
            ClockOutcome {
                action,
                shift,
                location,
                adhoc,
                distance_meters,
            },
        ))
    }
}
