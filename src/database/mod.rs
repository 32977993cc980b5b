// Database module
// Dual database system: SQLite for job records, LanceDB for vectors

pub mod lancedb;
pub mod sqlite;
