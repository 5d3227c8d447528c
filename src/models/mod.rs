pub mod actor;
pub mod answer;
pub mod assignment;
pub mod category;
pub mod company;
pub mod notification;
pub mod question;
pub mod user;
