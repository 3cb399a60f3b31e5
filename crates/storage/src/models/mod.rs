//! Database table schemas used by the orchestrator.
//!
//! This module defines the value types, keys, and table layouts for all data
//! persisted by the orchestrator: epoch consensus schedules, per-slot
//! verdicts, and the two verification cursors.
//!
//! Tables are registered through [`TableInfo`](reth_db_api::table::TableInfo)
//! and grouped into a [`TableSet`](reth_db_api::TableSet) for initialization
//! via `init_db_for`.

mod epoch;
pub use epoch::{EpochInfos, StoredEpochInfo};
mod verdict;
pub use verdict::{SlotVerdicts, StoredSlotVerdict};
mod cursor;
pub use cursor::{CursorKey, CursorValue, Cursors};

use reth_codecs::Compact;
use reth_db::table::Table;
use reth_db_api::table::{Compress, Decompress};

/// Implements [`Compress`] and [`Decompress`] for types that implement
/// [`Compact`], so they can be stored as table values.
macro_rules! impl_compression_for_compact {
    ($($name:ident),+ $(,)?) => {
        $(
            impl Compress for $name {
                type Compressed = Vec<u8>;

                fn compress_to_buf<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) {
                    let _ = Compact::to_compact(self, buf);
                }
            }

            impl Decompress for $name {
                fn decompress(value: &[u8]) -> Result<$name, reth_db_api::DatabaseError> {
                    let (obj, _) = Compact::from_compact(value, value.len());
                    Ok(obj)
                }
            }
        )+
    };
}

/// Implements [`TableInfo`](reth_db_api::table::TableInfo) for one or more
/// table types, so they can be introspected by the schema system.
macro_rules! impl_table_info {
    ($($table:ty),+ $(,)?) => {
        $(
            impl reth_db_api::table::TableInfo for $table {
                fn name(&self) -> &'static str {
                    <$table>::NAME
                }

                fn is_dupsort(&self) -> bool {
                    <$table>::DUPSORT
                }
            }
        )+
    };
}

/// Declares a struct representing the orchestrator's table collection and
/// implements [`TableSet`](reth_db_api::TableSet) for it, for use with
/// `init_db_for::<_, Tables>`.
macro_rules! impl_table_set {
    ($set_name:ident, $($table:ty),+ $(,)?) => {
        /// The set of tables initialized in the orchestrator database.
        #[derive(Debug)]
        pub struct $set_name;

        impl reth_db_api::TableSet for $set_name {
            fn tables() -> Box<dyn Iterator<Item = Box<dyn reth_db_api::table::TableInfo>>> {
                Box::new(
                    vec![
                        $(
                            Box::new(<$table>::default()) as Box<dyn reth_db_api::table::TableInfo>
                        ),*
                    ]
                    .into_iter(),
                )
            }
        }
    };
}

impl_compression_for_compact!(StoredEpochInfo, StoredSlotVerdict, CursorValue);

impl_table_info!(EpochInfos, SlotVerdicts, Cursors);

impl_table_set!(Tables, EpochInfos, SlotVerdicts, Cursors);
