#[cfg(feature = "http-store")]
pub mod http;
pub mod memory;

use crate::dao::models::{
    CompetitionEntity, NewRestaurantEntity, RatingEntity, RatingSubmissionEntity,
    RestaurantEntity, UserEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::competition::CompetitionStatus;
use futures::future::BoxFuture;

/// Abstraction over the backing service holding competitions, restaurants and ratings.
pub trait CompetitionStore: Send + Sync {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<UserEntity>>;
    fn find_competition(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<CompetitionEntity>>>;
    fn list_restaurants(
        &self,
        competition_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RestaurantEntity>>>;
    fn list_ratings(&self, restaurant_id: i64)
    -> BoxFuture<'static, StorageResult<Vec<RatingEntity>>>;
    fn submit_rating(
        &self,
        submission: RatingSubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<RatingEntity>>;
    fn create_restaurant(
        &self,
        restaurant: NewRestaurantEntity,
    ) -> BoxFuture<'static, StorageResult<RestaurantEntity>>;
    fn join_competition(&self, competition_id: i64) -> BoxFuture<'static, StorageResult<()>>;
    fn set_competition_status(
        &self,
        competition_id: i64,
        status: CompetitionStatus,
    ) -> BoxFuture<'static, StorageResult<CompetitionEntity>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
