pub mod banners;
pub mod collection_entries;
pub mod idempotency_records;
pub mod pending_rewards;
pub mod pity_records;
pub mod players;
pub mod pool_entries;
pub mod pull_history;
pub mod stardust_accounts;
pub mod stardust_transactions;
pub mod target_paths;

pub use banners as banner_entity;
pub use collection_entries as collection_entry_entity;
pub use idempotency_records as idempotency_record_entity;
pub use pending_rewards as pending_reward_entity;
pub use pity_records as pity_record_entity;
pub use players as player_entity;
pub use pool_entries as pool_entry_entity;
pub use pull_history as pull_history_entity;
pub use stardust_accounts as stardust_account_entity;
pub use stardust_transactions as stardust_transaction_entity;
pub use target_paths as target_path_entity;

pub use banners::BannerKind;
pub use idempotency_records::IdempotencyStatus;
pub use pending_rewards::{DeliveryStatus, RewardKind, RewardSource};
pub use pity_records::FeaturedGuarantee;
pub use pool_entries::{OutcomeKind, Tier};
pub use stardust_transactions::StardustTransactionType;
