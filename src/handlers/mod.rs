pub mod admin;
pub mod delivery;
pub mod gacha;
pub mod stardust;

pub use admin::admin_config;
pub use delivery::delivery_config;
pub use gacha::gacha_config;
pub use stardust::stardust_config;
