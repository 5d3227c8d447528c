pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::repositories::Repositories;
use crate::services::{
    assignment_service::AssignmentService, catalog_service::CatalogService,
    directory_service::DirectoryService, notification_service::NotificationService,
    report_service::ReportService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assignments: AssignmentService,
    pub catalog: CatalogService,
    pub directory: DirectoryService,
    pub notifications: NotificationService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories) -> Self {
        let assignments = AssignmentService::new(
            repos.catalog.clone(),
            repos.assignments.clone(),
            repos.directory.clone(),
        );
        let catalog = CatalogService::new(repos.catalog.clone());
        let directory =
            DirectoryService::new(repos.directory.clone(), config.invitation.clone());
        let notifications = NotificationService::new(repos.notifications.clone());
        let reports = ReportService::new(
            repos.catalog,
            repos.assignments,
            repos.directory,
            repos.notifications,
        );

        Self {
            config: Arc::new(config),
            assignments,
            catalog,
            directory,
            notifications,
            reports,
        }
    }
}
