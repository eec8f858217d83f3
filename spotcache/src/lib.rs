// spotcache: time-bounded memoization with request deduplication.
//
// The façade (`MemoCache`) is what callers use; the store behind it is a
// port (`CacheStore`) so the in-process map can be swapped for a networked
// store without touching callers.

pub mod fingerprint;
pub mod memo;
pub mod ports;
pub mod singleflight;
pub mod sweeper;

pub use fingerprint::{fingerprint, normalize_city, round_coord, CacheKey, RequestKind};
pub use memo::{CacheOutcome, CacheStats, MemoCache};
pub use ports::{CacheStore, Sweepable};
pub use singleflight::SingleFlight;
pub use sweeper::{Sweeper, SweeperHandle};
