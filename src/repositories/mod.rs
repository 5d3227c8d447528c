pub mod assignment_repository;
pub mod catalog_repository;
pub mod directory_repository;
pub mod notification_repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use assignment_repository::{AssignmentRepository, PgAssignmentRepository};
pub use catalog_repository::{CatalogRepository, PgCatalogRepository};
pub use directory_repository::{DirectoryRepository, PgDirectoryRepository};
pub use notification_repository::{NotificationRepository, PgNotificationRepository};

/// Storage backends shared by every service.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub directory: Arc<dyn DirectoryRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
            assignments: Arc::new(PgAssignmentRepository::new(pool.clone())),
            directory: Arc::new(PgDirectoryRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        }
    }
}
