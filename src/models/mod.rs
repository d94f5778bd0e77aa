pub mod banner;
pub mod collection;
pub mod common;
pub mod delivery;
pub mod pagination;
pub mod pity;
pub mod player;
pub mod pull;
pub mod stardust;
pub mod target_path;

pub use banner::*;
pub use collection::*;
pub use common::*;
pub use delivery::*;
pub use pagination::*;
pub use pity::*;
pub use player::*;
pub use pull::*;
pub use stardust::*;
pub use target_path::*;
