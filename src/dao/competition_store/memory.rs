//! In-process [`CompetitionStore`] used for local runs and tests.
//!
//! Every operation can be made to fail on demand to exercise rollback paths.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    dao::{
        competition_store::CompetitionStore,
        models::{
            CompetitionEntity, NewRestaurantEntity, RatingEntity, RatingSubmissionEntity,
            RestaurantEntity, UserEntity,
        },
        storage::{StorageError, StorageResult},
    },
    state::competition::CompetitionStatus,
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentUser,
    FindCompetition,
    ListRestaurants,
    ListRatings,
    SubmitRating,
    CreateRestaurant,
    JoinCompetition,
    SetCompetitionStatus,
    HealthCheck,
}

/// Failures produced by the in-memory backend.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// A failure was injected for the operation.
    #[error("injected failure for {0:?}")]
    Injected(Operation),
    /// The seed file could not be read.
    #[error("failed to read seed file `{path}`")]
    SeedRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The seed file is not valid JSON.
    #[error("failed to parse seed file `{path}`")]
    SeedParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Initial content of the in-memory backend.
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySeed {
    /// User every request is attributed to.
    pub current_user: UserEntity,
    /// Competitions, with their restaurants.
    #[serde(default)]
    pub competitions: Vec<CompetitionEntity>,
    /// Ratings of any restaurant.
    #[serde(default)]
    pub ratings: Vec<RatingEntity>,
}

impl MemorySeed {
    /// Load a seed from a JSON file.
    pub fn from_path(path: &str) -> Result<Self, MemoryStoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| MemoryStoreError::SeedRead {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| MemoryStoreError::SeedParse {
            path: path.to_string(),
            source,
        })
    }
}

struct MemoryData {
    current_user: UserEntity,
    competitions: HashMap<i64, CompetitionEntity>,
    ratings: HashMap<i64, Vec<RatingEntity>>,
    next_id: i64,
    failing: HashSet<Operation>,
    latency: Option<Duration>,
}

/// [`CompetitionStore`] keeping everything in memory.
#[derive(Clone)]
pub struct MemoryCompetitionStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryCompetitionStore {
    /// Empty store acting on behalf of `current_user`.
    pub fn new(current_user: UserEntity) -> Self {
        Self::from_seed(MemorySeed {
            current_user,
            competitions: Vec::new(),
            ratings: Vec::new(),
        })
    }

    /// Store pre-populated with `seed`.
    pub fn from_seed(seed: MemorySeed) -> Self {
        let mut next_id = 1;
        let mut competitions = HashMap::new();
        for competition in seed.competitions {
            next_id = next_id.max(competition.id + 1);
            for restaurant in &competition.restaurants {
                next_id = next_id.max(restaurant.id + 1);
            }
            competitions.insert(competition.id, competition);
        }

        let mut ratings: HashMap<i64, Vec<RatingEntity>> = HashMap::new();
        for rating in seed.ratings {
            next_id = next_id.max(rating.id + 1);
            ratings.entry(rating.restaurant).or_default().push(rating);
        }

        Self {
            data: Arc::new(Mutex::new(MemoryData {
                current_user: seed.current_user,
                competitions,
                ratings,
                next_id,
                failing: HashSet::new(),
                latency: None,
            })),
        }
    }

    /// Add or replace a competition.
    pub fn insert_competition(&self, competition: CompetitionEntity) {
        let mut data = self.data();
        data.next_id = data.next_id.max(competition.id + 1);
        data.competitions.insert(competition.id, competition);
    }

    /// Add a rating as if it had been persisted earlier.
    pub fn insert_rating(&self, rating: RatingEntity) {
        let mut data = self.data();
        data.next_id = data.next_id.max(rating.id + 1);
        data.ratings.entry(rating.restaurant).or_default().push(rating);
    }

    /// Act on behalf of another user from now on.
    pub fn switch_user(&self, user: UserEntity) {
        self.data().current_user = user;
    }

    /// Make every call to `operation` fail until [`Self::recover`] is called.
    pub fn fail(&self, operation: Operation) {
        self.data().failing.insert(operation);
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: Operation) {
        self.data().failing.remove(&operation);
    }

    /// Delay every operation by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.data().latency = latency;
    }

    /// Ratings currently persisted for a restaurant.
    pub fn persisted_ratings(&self, restaurant_id: i64) -> Vec<RatingEntity> {
        self.data()
            .ratings
            .get(&restaurant_id)
            .cloned()
            .unwrap_or_default()
    }

    fn data(&self) -> MutexGuard<'_, MemoryData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run<T, F>(&self, operation: Operation, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut MemoryData) -> StorageResult<T> + Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move {
            let latency = store.data().latency;
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let mut data = store.data();
            if data.failing.contains(&operation) {
                return Err(StorageError::unavailable(
                    format!("{operation:?} failed"),
                    MemoryStoreError::Injected(operation),
                ));
            }
            f(&mut data)
        })
    }
}

impl MemoryData {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn restaurant_mut(&mut self, restaurant_id: i64) -> Option<&mut RestaurantEntity> {
        self.competitions
            .values_mut()
            .flat_map(|competition| competition.restaurants.iter_mut())
            .find(|restaurant| restaurant.id == restaurant_id)
    }

    fn refresh_average(&mut self, restaurant_id: i64) {
        let ratings = self.ratings.get(&restaurant_id).cloned().unwrap_or_default();
        if let Some(restaurant) = self.restaurant_mut(restaurant_id) {
            restaurant.average_rating = if ratings.is_empty() {
                0.0
            } else {
                let sum: u32 = ratings.iter().map(|r| u32::from(r.overall_score)).sum();
                f64::from(sum) / ratings.len() as f64
            };
        }
    }
}

fn same_user(left: &UserEntity, right: &UserEntity) -> bool {
    left.id.or(left.pk).is_some() && left.id.or(left.pk) == right.id.or(right.pk)
}

impl CompetitionStore for MemoryCompetitionStore {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<UserEntity>> {
        self.run(Operation::CurrentUser, |data| Ok(data.current_user.clone()))
    }

    fn find_competition(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<CompetitionEntity>>> {
        self.run(Operation::FindCompetition, move |data| {
            Ok(data.competitions.get(&id).cloned())
        })
    }

    fn list_restaurants(
        &self,
        competition_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RestaurantEntity>>> {
        self.run(Operation::ListRestaurants, move |data| {
            data.competitions
                .get(&competition_id)
                .map(|competition| competition.restaurants.clone())
                .ok_or_else(|| {
                    StorageError::rejected(format!("competition {competition_id} not found"))
                })
        })
    }

    fn list_ratings(
        &self,
        restaurant_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RatingEntity>>> {
        self.run(Operation::ListRatings, move |data| {
            Ok(data.ratings.get(&restaurant_id).cloned().unwrap_or_default())
        })
    }

    fn submit_rating(
        &self,
        submission: RatingSubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<RatingEntity>> {
        self.run(Operation::SubmitRating, move |data| {
            if data.restaurant_mut(submission.restaurant).is_none() {
                return Err(StorageError::rejected(format!(
                    "restaurant {} not found",
                    submission.restaurant
                )));
            }
            let scores = [
                submission.food_score,
                submission.service_score,
                submission.ambiance_score,
                submission.value_score,
            ];
            if scores.iter().any(|score| !(1..=10).contains(score)) {
                return Err(StorageError::rejected("scores must be between 1 and 10"));
            }
            let sum: u16 = scores.iter().map(|score| u16::from(*score)).sum();

            let user = data.current_user.clone();
            let existing_id = data
                .ratings
                .get(&submission.restaurant)
                .and_then(|ratings| ratings.iter().find(|rating| same_user(&rating.user, &user)))
                .map(|rating| rating.id);
            let id = match existing_id {
                Some(id) => id,
                None => data.allocate_id(),
            };

            let rating = RatingEntity {
                id,
                restaurant: submission.restaurant,
                user,
                food_score: submission.food_score,
                service_score: submission.service_score,
                ambiance_score: submission.ambiance_score,
                value_score: submission.value_score,
                comment: submission.comment,
                overall_score: ((sum + 2) / 4) as u8,
                created_at: OffsetDateTime::now_utc(),
            };

            let ratings = data.ratings.entry(submission.restaurant).or_default();
            match ratings.iter_mut().find(|existing| existing.id == id) {
                Some(existing) => *existing = rating.clone(),
                None => ratings.push(rating.clone()),
            }
            data.refresh_average(submission.restaurant);
            Ok(rating)
        })
    }

    fn create_restaurant(
        &self,
        restaurant: NewRestaurantEntity,
    ) -> BoxFuture<'static, StorageResult<RestaurantEntity>> {
        self.run(Operation::CreateRestaurant, move |data| {
            let id = data.allocate_id();
            let suggested_by = Some(data.current_user.clone());
            let competition = data
                .competitions
                .get_mut(&restaurant.competition)
                .ok_or_else(|| {
                    StorageError::rejected(format!(
                        "competition {} not found",
                        restaurant.competition
                    ))
                })?;

            let created = RestaurantEntity {
                id,
                name: restaurant.name,
                address: restaurant.address,
                cuisine_type: restaurant.cuisine_type,
                suggested_by,
                visit_date: restaurant.visit_date,
                image: None,
                average_rating: 0.0,
                created_at: OffsetDateTime::now_utc(),
            };
            competition.restaurants.push(created.clone());
            Ok(created)
        })
    }

    fn join_competition(&self, competition_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        self.run(Operation::JoinCompetition, move |data| {
            let user = data.current_user.clone();
            let competition = data.competitions.get_mut(&competition_id).ok_or_else(|| {
                StorageError::rejected(format!("competition {competition_id} not found"))
            })?;
            if !competition
                .participants
                .iter()
                .any(|participant| same_user(participant, &user))
            {
                competition.participants.push(user);
            }
            Ok(())
        })
    }

    fn set_competition_status(
        &self,
        competition_id: i64,
        status: CompetitionStatus,
    ) -> BoxFuture<'static, StorageResult<CompetitionEntity>> {
        self.run(Operation::SetCompetitionStatus, move |data| {
            let competition = data.competitions.get_mut(&competition_id).ok_or_else(|| {
                StorageError::rejected(format!("competition {competition_id} not found"))
            })?;
            if !competition.status.can_advance_to(status) {
                return Err(StorageError::rejected(format!(
                    "cannot move competition from {:?} to {status:?}",
                    competition.status
                )));
            }
            competition.status = status;
            Ok(competition.clone())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(Operation::HealthCheck, |_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn user(id: i64) -> UserEntity {
        UserEntity {
            id: Some(id),
            pk: None,
            username: format!("user-{id}"),
            email: None,
        }
    }

    fn store() -> MemoryCompetitionStore {
        let store = MemoryCompetitionStore::new(user(1));
        store.insert_competition(CompetitionEntity {
            id: 1,
            name: "Spring tour".into(),
            description: String::new(),
            creator: user(1),
            status: CompetitionStatus::Active,
            start_date: date!(2025 - 02 - 01),
            end_date: date!(2025 - 04 - 30),
            participants: vec![user(1)],
            restaurants: vec![RestaurantEntity {
                id: 10,
                name: "Chez Lou".into(),
                address: "2 quai Rive".into(),
                cuisine_type: "bistro".into(),
                suggested_by: Some(user(1)),
                visit_date: date!(2025 - 03 - 01),
                image: None,
                average_rating: 0.0,
                created_at: OffsetDateTime::UNIX_EPOCH,
            }],
        });
        store
    }

    fn submission(food: u8) -> RatingSubmissionEntity {
        RatingSubmissionEntity {
            restaurant: 10,
            food_score: food,
            service_score: 8,
            ambiance_score: 8,
            value_score: 8,
            comment: None,
            replaces: None,
        }
    }

    #[tokio::test]
    async fn resubmission_replaces_existing_rating() {
        let store = store();
        let first = store.submit_rating(submission(4)).await.unwrap();
        let second = store.submit_rating(submission(10)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.overall_score, 9);
        assert_eq!(store.persisted_ratings(10).len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_reported_as_unavailable() {
        let store = store();
        store.fail(Operation::SubmitRating);

        let err = store.submit_rating(submission(5)).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        assert!(store.persisted_ratings(10).is_empty());

        store.recover(Operation::SubmitRating);
        assert!(store.submit_rating(submission(5)).await.is_ok());
    }

    #[tokio::test]
    async fn status_only_moves_forward() {
        let store = store();
        let completed = store
            .set_competition_status(1, CompetitionStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, CompetitionStatus::Completed);

        let err = store
            .set_competition_status(1, CompetitionStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected { .. }));
    }

    #[tokio::test]
    async fn join_is_idempotent_for_same_user() {
        let store = store();
        store.switch_user(UserEntity {
            id: None,
            pk: Some(2),
            username: "user-2".into(),
            email: None,
        });
        store.join_competition(1).await.unwrap();
        store.join_competition(1).await.unwrap();

        let competition = store.find_competition(1).await.unwrap().unwrap();
        assert_eq!(competition.participants.len(), 2);
    }
}
