//! Shard storage for collections.
//!
//! A collection's records are split across shard files, each a JSON array of
//! at most `shard_size` records:
//!
//! ```text
//! <collection>/
//! ├─ schema.json       # field -> declared kind
//! ├─ index.json        # reserved placeholder
//! ├─ data_1.shard      # full shards...
//! ├─ data_2.shard
//! └─ data_3.shard      # latest shard, the only one appended to
//! ```
//!
//! Shards are never split or merged; update and remove rewrite a shard in
//! place, insert only ever touches the latest one.

mod cache;
mod name;
mod store;

pub use cache::{ShardCache, ShardData};
pub use name::{ShardName, SHARD_SUFFIX};
pub use store::ShardStore;
