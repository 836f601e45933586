pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod payment_repo;
pub mod memory;
pub mod redis_repo;
pub mod events;
pub mod chapa;
pub mod mailer;

pub use database::DbClient;
pub use booking_repo::StoreBookingRepository;
pub use payment_repo::StorePaymentRepository;
pub use memory::{ChannelQueue, MemoryStore};
pub use redis_repo::RedisClient;
pub use events::NotificationProducer;
pub use chapa::{ChapaClient, ChapaConfig};
pub use mailer::{LogMailer, SmtpMailer};
