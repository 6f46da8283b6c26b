//! Application state: one shared store plus every domain service.

use std::sync::Arc;

use edulife_config::{CommerceConfig, DatabaseConfig, JwtConfig, ProgressConfig, SecurityConfig};

use crate::db;
use crate::modules::access::AccessService;
use crate::modules::assessments::AssessmentService;
use crate::modules::auth::AuthService;
use crate::modules::catalog::CatalogService;
use crate::modules::commerce::CommerceService;
use crate::modules::media::MediaService;
use crate::modules::payouts::PayoutService;
use crate::modules::progress::ProgressService;
use crate::modules::reviews::ReviewService;
use crate::store::{PostgresStore, Store};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub access: AccessService,
    pub catalog: CatalogService,
    pub progress: ProgressService,
    pub assessments: AssessmentService,
    pub commerce: CommerceService,
    pub payouts: PayoutService,
    pub reviews: ReviewService,
    pub media: MediaService,
}

impl AppState {
    /// Builds every service over one store, with policies read from the
    /// environment.
    pub fn new(store: Arc<dyn Store>) -> Self {
        let jwt = JwtConfig::from_env();
        let security = SecurityConfig::from_env();
        let progress = ProgressConfig::from_env();
        let commerce = CommerceConfig::from_env();
        Self {
            auth: AuthService::new(store.clone(), jwt, security),
            access: AccessService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            progress: ProgressService::new(store.clone(), progress),
            assessments: AssessmentService::new(store.clone()),
            commerce: CommerceService::new(store.clone(), commerce),
            payouts: PayoutService::new(store.clone(), commerce),
            reviews: ReviewService::new(store.clone()),
            media: MediaService::new(store.clone()),
            store,
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let pool = db::init_db_pool(&DatabaseConfig::from_env()).await?;
    Ok(AppState::new(Arc::new(PostgresStore::new(pool))))
}
