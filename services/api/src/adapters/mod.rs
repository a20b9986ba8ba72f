pub mod places;
pub mod sqlite;

pub use places::GooglePlacesAdapter;
pub use sqlite::SqliteStorage;
