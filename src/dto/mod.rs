pub mod assessment_dto;
pub mod catalog_dto;
pub mod directory_dto;
pub mod report_dto;
