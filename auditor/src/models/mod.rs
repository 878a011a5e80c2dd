pub mod job;

pub use job::{
    ColumnSchema, DatasetInfo, DictionaryRow, JobRecord, SessionUserRow, StorageProposal,
    StorageRow, TableMeta, TableRef, TimePartitioning,
};
