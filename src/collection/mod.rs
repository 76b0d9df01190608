pub mod store;
pub mod types;
mod writer;

pub use store::{CollectionStore, SubscriptionId, DEFAULT_COLLECTION_KEY};
pub use types::{Advisory, CityRecord, CollectionState, LoadOutcome, WriteTicket};
pub use writer::WriteProgress;
