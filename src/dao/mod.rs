/// Competition, restaurant and rating persistence operations.
pub mod competition_store;
/// Wire model definitions exchanged with the backing data service.
pub mod models;
/// Storage abstraction layer for backend operations.
pub mod storage;
