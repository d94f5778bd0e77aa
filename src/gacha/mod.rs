//! Pure draw engine: randomness, pool construction, pity, target path and
//! single-draw resolution. Nothing in here touches the database.

pub mod draw;
pub mod fate;
pub mod pity;
pub mod pool;
pub mod random;

pub use draw::{DrawContext, DrawResult, DrawState, FeaturedResolution, resolve_draw};
pub use fate::{FateProgress, TargetPath};
pub use pity::{PityCounters, PityRules};
pub use pool::{Outcome, PoolBuilder, PoolEntry, PoolSnapshot, TierRates, TierWeights};
pub use random::{OsRandomSource, RandomError, RandomExt, SecureRandomSource, SeededRandomSource};
