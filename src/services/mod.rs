pub mod banner_service;
pub mod collection_service;
pub mod delivery_service;
pub mod history_service;
pub mod idempotency_service;
pub mod pity_service;
pub mod player_service;
pub mod pull_service;
pub mod stardust_service;
pub mod target_path_service;

pub use banner_service::*;
pub use collection_service::*;
pub use delivery_service::*;
pub use history_service::*;
pub use idempotency_service::*;
pub use pity_service::*;
pub use player_service::*;
pub use pull_service::*;
pub use stardust_service::*;
pub use target_path_service::*;
