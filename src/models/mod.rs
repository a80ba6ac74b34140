mod category;
mod entry;
mod period;
mod settings;
mod spending;
mod template;
mod transfer;

pub use category::Category;
pub use entry::{materialized_id, EntryDate, LedgerEntry, MATERIALIZED_PREFIX};
pub use period::Period;
pub use settings::Settings;
pub use spending::SharedSpending;
pub use template::{end_period, ActiveWindow, IntField, RecurrenceTemplate};
pub use transfer::Transfer;
