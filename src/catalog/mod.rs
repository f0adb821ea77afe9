/// Catalog entry model and in-memory lookup.
pub mod model;
/// JSON catalog loading (array and legacy map formats).
pub mod load;
