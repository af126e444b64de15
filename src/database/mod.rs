pub mod collection;
pub mod record;
pub mod seed;
pub mod store;

pub use collection::Collection;
pub use record::{timestamp, Record, RecordError, SYSTEM_FIELDS};
pub use store::{SchoolStats, Store, StoreError};
