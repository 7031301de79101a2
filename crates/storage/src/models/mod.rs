//! Table schemas used by the epoch store.
//!
//! Each table is registered through [`reth_db_api::table::TableInfo`] and grouped into a
//! [`reth_db_api::TableSet`] for database initialization.

mod epoch;
pub(crate) use epoch::{EpochRow, Epochs};
mod slot;
pub(crate) use slot::{SlotRow, Slots};
mod block;
pub(crate) use block::{BlockRow, Blocks};

/// Implements [`reth_db_api::table::Compress`] and [`reth_db_api::table::Decompress`] for
/// types that implement [`reth_codecs::Compact`].
macro_rules! impl_compression_for_compact {
    ($($name:ident),+) => {
        $(
            impl reth_db_api::table::Compress for $name {
                type Compressed = Vec<u8>;

                fn compress_to_buf<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) {
                    let _ = reth_codecs::Compact::to_compact(self, buf);
                }
            }

            impl reth_db_api::table::Decompress for $name {
                fn decompress(value: &[u8]) -> Result<$name, reth_db_api::DatabaseError> {
                    let (obj, _) = reth_codecs::Compact::from_compact(value, value.len());
                    Ok(obj)
                }
            }
        )+
    };
}

/// Implements [`reth_db_api::table::TableInfo`] for one or more [`reth_db_api::table::Table`]s.
macro_rules! impl_table_info {
    ($($table:ty),+ $(,)?) => {
        $(
            impl reth_db_api::table::TableInfo for $table {
                fn name(&self) -> &'static str {
                    <$table as reth_db_api::table::Table>::NAME
                }

                fn is_dupsort(&self) -> bool {
                    <$table as reth_db_api::table::Table>::DUPSORT
                }
            }
        )+
    };
}

/// Declares a table collection usable with `init_db_for::<_, Set>()`.
macro_rules! impl_table_set {
    (
        $(#[$outer:meta])*
        $set_name:ident, $($table:ty),+ $(,)?
    ) => {
        $(#[$outer])*
        #[derive(Debug)]
        pub(crate) struct $set_name;

        impl reth_db_api::TableSet for $set_name {
            fn tables() -> Box<dyn Iterator<Item = Box<dyn reth_db_api::table::TableInfo>>> {
                Box::new(vec![
                    $(
                        Box::new(<$table>::default()) as Box<dyn reth_db_api::table::TableInfo>
                    ),*
                ].into_iter())
            }
        }
    };
}

impl_compression_for_compact!(EpochRow, SlotRow, BlockRow);

impl_table_info!(Epochs, Slots, Blocks);

impl_table_set!(
    /// Every table of the epoch store.
    Tables,
    Epochs,
    Slots,
    Blocks
);
