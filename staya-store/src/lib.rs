pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod hotel_repo;
pub mod memory;
pub mod rate_limit;
pub mod redis_repo;
pub mod route_repo;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use hotel_repo::PgHotelRepository;
pub use memory::MemoryStore;
pub use rate_limit::{MemoryRateLimiter, RateLimiter, RedisRateLimiter};
pub use redis_repo::RedisClient;
pub use route_repo::PgRouteRepository;
pub use user_repo::PgUserRepository;
