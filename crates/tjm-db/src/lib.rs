pub mod config;
pub mod database;
pub mod offer_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use offer_repository::OfferRepository;
