pub mod assignment_service;
pub mod catalog_service;
pub mod directory_service;
pub mod notification_service;
pub mod report_service;
pub mod scoring_service;
