use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::public_profile::repository::PublicProfileRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// Storage seam for the public-profile store and assembler.
    /// Postgres-backed in production, in-memory in tests.
    pub public_profiles: Arc<dyn PublicProfileRepository>,
}
