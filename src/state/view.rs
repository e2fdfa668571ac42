use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use serde::Deserialize;
use time::{Date, OffsetDateTime};
use tokio::{
    sync::{Mutex, OwnedMutexGuard, RwLock},
    time::timeout,
};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::{
    error::ServiceError,
    scoring::{
        aggregator::{FetchTicket, RatingCache, StaleResponse},
        lifecycle::{self, Lifecycle},
        ranking::{self, RankingEntry, RestaurantScore},
    },
    state::{
        clock::Clock,
        competition::{Competition, Participant, Rating, RecordId, Restaurant},
        reconciler::{Confirmation, Mutation, MutationId, MutationKey, Reconciler, Resolved},
    },
};

/// Ordering applied to the restaurant listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RestaurantSort {
    /// Suggestion order.
    #[default]
    Default,
    /// Earliest visit first.
    DateAsc,
    /// Latest visit first.
    DateDesc,
}

/// Restaurant annotated for a given viewer and day.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantSummary {
    /// The restaurant itself.
    pub restaurant: Restaurant,
    /// Visit lifecycle.
    pub lifecycle: Lifecycle,
    /// Average overall score, `None` while unrated.
    pub average: Option<f64>,
    /// Number of ratings received.
    pub rating_count: usize,
    /// Rating left by the viewer.
    pub own_rating: Option<Rating>,
    /// Whether the viewer may rate it today.
    pub can_rate: bool,
}

/// Share of restaurants already visited and rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Restaurants in the [`Lifecycle::Visited`] state.
    pub visited: usize,
    /// All restaurants.
    pub total: usize,
    /// Rounded percentage, 0 when there are no restaurants.
    pub percent: u8,
}

/// In-memory state of one competition as seen by the current viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionView {
    /// Competition aggregate.
    pub competition: Competition,
    /// Ratings per restaurant.
    pub ratings: RatingCache,
    /// User the view is rendered for.
    pub viewer: Participant,
}

impl CompetitionView {
    /// Build a view without any rating loaded yet.
    pub fn new(competition: Competition, viewer: Participant) -> Self {
        Self {
            competition,
            ratings: RatingCache::new(),
            viewer,
        }
    }

    /// Restaurant with the given identity.
    pub fn restaurant(&self, id: &RecordId) -> Option<&Restaurant> {
        self.competition
            .restaurants
            .iter()
            .find(|restaurant| &restaurant.id == id)
    }

    /// Whether the viewer joined the competition.
    pub fn viewer_is_participant(&self) -> bool {
        self.competition.has_participant(self.viewer.id)
    }

    /// Whether the viewer created the competition.
    pub fn viewer_is_creator(&self) -> bool {
        self.competition.creator.id == self.viewer.id
    }

    /// Annotate a single restaurant.
    pub fn summarize(&self, restaurant: &Restaurant, today: Date) -> RestaurantSummary {
        let ratings = self.ratings.ratings(&restaurant.id);
        let own_rating = self.ratings.own_rating(&restaurant.id, self.viewer.id).cloned();
        let can_rate = !restaurant.id.is_temporary()
            && lifecycle::ensure_ratable(self.competition.status, restaurant.visit_date, today)
                .is_ok();

        RestaurantSummary {
            restaurant: restaurant.clone(),
            lifecycle: lifecycle::classify(restaurant.visit_date, !ratings.is_empty(), today),
            average: self.ratings.average(&restaurant.id),
            rating_count: ratings.len(),
            own_rating,
            can_rate,
        }
    }

    /// Annotated restaurant listing.
    ///
    /// `upcoming_only` drops visited restaurants; sorting by date is stable.
    pub fn restaurants(
        &self,
        today: Date,
        upcoming_only: bool,
        sort: RestaurantSort,
    ) -> Vec<RestaurantSummary> {
        let mut summaries: Vec<RestaurantSummary> = self
            .competition
            .restaurants
            .iter()
            .map(|restaurant| self.summarize(restaurant, today))
            .filter(|summary| !upcoming_only || summary.lifecycle != Lifecycle::Visited)
            .collect();

        match sort {
            RestaurantSort::Default => {}
            RestaurantSort::DateAsc => {
                summaries.sort_by_key(|summary| summary.restaurant.visit_date);
            }
            RestaurantSort::DateDesc => {
                summaries.sort_by(|left, right| {
                    right.restaurant.visit_date.cmp(&left.restaurant.visit_date)
                });
            }
        }

        summaries
    }

    /// Visit progress of the competition.
    pub fn progress(&self, today: Date) -> Progress {
        let total = self.competition.restaurants.len();
        let visited = self
            .competition
            .restaurants
            .iter()
            .filter(|restaurant| {
                lifecycle::classify(
                    restaurant.visit_date,
                    !self.ratings.ratings(&restaurant.id).is_empty(),
                    today,
                ) == Lifecycle::Visited
            })
            .count();

        let percent = if total == 0 {
            0
        } else {
            ((visited * 200 + total) / (2 * total)) as u8
        };

        Progress {
            visited,
            total,
            percent,
        }
    }

    /// Leaderboard recomputed from the current ratings.
    pub fn rankings(&self) -> Vec<RankingEntry> {
        let scores: Vec<RestaurantScore> = self
            .competition
            .restaurants
            .iter()
            .map(|restaurant| RestaurantScore {
                proposer: restaurant.proposer.as_ref().map(|proposer| proposer.id),
                average: self.ratings.average(&restaurant.id),
            })
            .collect();

        ranking::rank(&self.competition.participants, &scores)
    }
}

struct ViewInner {
    view: CompetitionView,
    reconciler: Reconciler,
}

struct ViewShared {
    competition_id: i64,
    inner: RwLock<ViewInner>,
    gates: DashMap<MutationKey, Arc<Mutex<()>>>,
    clock: Arc<dyn Clock>,
    mutation_timeout: Option<Duration>,
}

/// Shared handle on a [`CompetitionView`] and its pending mutations.
///
/// The view lock is only held for local reads and writes; backend calls run
/// outside of it. Mutations on the same key are serialized in arrival order.
#[derive(Clone)]
pub struct ViewHandle {
    shared: Arc<ViewShared>,
}

impl ViewHandle {
    /// Wrap a freshly loaded view.
    pub fn new(
        view: CompetitionView,
        clock: Arc<dyn Clock>,
        mutation_timeout: Option<Duration>,
    ) -> Self {
        Self {
            shared: Arc::new(ViewShared {
                competition_id: view.competition.id,
                inner: RwLock::new(ViewInner {
                    view,
                    reconciler: Reconciler::new(),
                }),
                gates: DashMap::new(),
                clock,
                mutation_timeout,
            }),
        }
    }

    /// Identifier of the viewed competition.
    pub fn competition_id(&self) -> i64 {
        self.shared.competition_id
    }

    /// Current UTC date, computed on every call.
    pub fn today(&self) -> Date {
        self.shared.clock.today()
    }

    /// Current instant.
    pub fn now(&self) -> OffsetDateTime {
        self.shared.clock.now()
    }

    /// Run `f` against the current view.
    pub async fn read<R>(&self, f: impl FnOnce(&CompetitionView) -> R) -> R {
        let inner = self.shared.inner.read().await;
        f(&inner.view)
    }

    /// Number of mutations awaiting the backend.
    pub async fn pending_mutations(&self) -> usize {
        self.shared.inner.read().await.reconciler.pending_count()
    }

    /// Stamp a rating fetch for `restaurant`.
    pub async fn begin_fetch(&self, restaurant: &RecordId) -> FetchTicket {
        let mut inner = self.shared.inner.write().await;
        inner.view.ratings.begin_fetch(restaurant)
    }

    /// Apply a fetched rating list unless it is stale.
    ///
    /// Ratings still awaiting the backend are laid back over the fetched list.
    pub async fn complete_fetch(
        &self,
        ticket: FetchTicket,
        ratings: Vec<Rating>,
    ) -> Result<(), StaleResponse> {
        let mut inner = self.shared.inner.write().await;
        let ViewInner { view, reconciler } = &mut *inner;
        let restaurant = ticket.restaurant.clone();
        view.ratings.complete_fetch(ticket, ratings)?;

        let reapplied = reconciler.reapply_ratings(view, &restaurant);
        if reapplied > 0 {
            debug!(
                competition_id = self.shared.competition_id,
                restaurant = %restaurant,
                reapplied,
                "pending ratings kept over fetched list"
            );
        }
        Ok(())
    }

    /// Wait for the key's turn, then predict the mutation built by `prepare`.
    ///
    /// `prepare` runs under the view lock with the current clock and returns the
    /// mutation together with the request to send. Nothing is applied when it fails.
    pub async fn begin<R, E>(
        &self,
        key: MutationKey,
        prepare: impl FnOnce(&CompetitionView, &dyn Clock) -> Result<(Mutation, R), E>,
    ) -> Result<PendingMutation<R>, E>
    where
        E: From<crate::state::reconciler::PredictError>,
    {
        let gate = self
            .shared
            .gates
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock_owned().await;

        let mut inner = self.shared.inner.write().await;
        let ViewInner { view, reconciler } = &mut *inner;
        let (mutation, request) = match prepare(view, self.shared.clock.as_ref()) {
            Ok(prepared) => prepared,
            Err(err) => {
                drop(inner);
                self.release_gate(&key, guard);
                return Err(err);
            }
        };
        debug_assert_eq!(mutation.key(), key);

        let prediction = match reconciler.predict(view, mutation) {
            Ok(prediction) => prediction,
            Err(err) => {
                drop(inner);
                self.release_gate(&key, guard);
                return Err(err.into());
            }
        };
        debug!(
            competition_id = self.shared.competition_id,
            key = %prediction.key,
            mutation_id = %prediction.id,
            "mutation predicted"
        );

        Ok(PendingMutation {
            handle: self.clone(),
            key: prediction.key,
            id: prediction.id,
            request: Some(request),
            gate: Some(guard),
        })
    }

    async fn confirm(
        &self,
        key: &MutationKey,
        id: MutationId,
        confirmation: Confirmation,
    ) -> Result<Resolved, ServiceError> {
        let mut inner = self.shared.inner.write().await;
        let ViewInner { view, reconciler } = &mut *inner;
        Ok(reconciler.confirm(view, key, id, confirmation)?)
    }

    async fn roll_back(&self, key: &MutationKey, id: MutationId) -> Option<Resolved> {
        let mut inner = self.shared.inner.write().await;
        let ViewInner { view, reconciler } = &mut *inner;
        match reconciler.roll_back(view, key, id) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                warn!(
                    competition_id = self.shared.competition_id,
                    key = %key,
                    mutation_id = %id,
                    error = %err,
                    "failed to roll back mutation"
                );
                None
            }
        }
    }

    fn release_gate(&self, key: &MutationKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.shared
            .gates
            .remove_if(key, |_, gate| Arc::strong_count(gate) == 1);
    }
}

/// A predicted mutation holding its key's turn until it is resolved.
///
/// Dropping it without calling [`PendingMutation::submit`] or
/// [`PendingMutation::discard`] rolls the prediction back.
pub struct PendingMutation<R> {
    handle: ViewHandle,
    key: MutationKey,
    id: MutationId,
    request: Option<R>,
    gate: Option<OwnedMutexGuard<()>>,
}

impl<R> PendingMutation<R> {
    /// Identifier of the prediction.
    pub fn id(&self) -> MutationId {
        self.id
    }

    /// Key touched by the prediction.
    pub fn key(&self) -> &MutationKey {
        &self.key
    }

    /// Send the request through `work` and resolve the prediction with its outcome.
    ///
    /// Failures and timeouts roll the prediction back and are returned unchanged.
    pub async fn submit<F, Fut>(mut self, work: F) -> Result<Resolved, ServiceError>
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<Confirmation, ServiceError>>,
    {
        let (Some(request), Some(gate)) = (self.request.take(), self.gate.take()) else {
            return Err(ServiceError::InvalidState(
                "mutation was already resolved".into(),
            ));
        };
        let handle = self.handle.clone();
        let key = self.key.clone();
        let id = self.id;

        let work_future = work(request);
        let outcome = match handle.shared.mutation_timeout {
            Some(limit) => match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout),
            },
            None => work_future.await,
        };

        let result = match outcome {
            Ok(confirmation) => match handle.confirm(&key, id, confirmation).await {
                Ok(resolved) => Ok(resolved),
                Err(err) => {
                    handle.roll_back(&key, id).await;
                    Err(err)
                }
            },
            Err(err) => {
                warn!(
                    competition_id = handle.shared.competition_id,
                    key = %key,
                    mutation_id = %id,
                    error = %err,
                    "mutation failed, rolling back"
                );
                handle.roll_back(&key, id).await;
                Err(err)
            }
        };

        handle.release_gate(&key, gate);
        result
    }

    /// Roll the prediction back without sending anything.
    pub async fn discard(mut self) -> Option<Resolved> {
        self.request.take();
        let gate = self.gate.take()?;
        let resolved = self.handle.roll_back(&self.key, self.id).await;
        self.handle.release_gate(&self.key, gate);
        resolved
    }
}

impl<R> Drop for PendingMutation<R> {
    fn drop(&mut self) {
        let Some(gate) = self.gate.take() else {
            return;
        };
        let handle = self.handle.clone();
        let key = self.key.clone();
        let id = self.id;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    handle.roll_back(&key, id).await;
                    handle.release_gate(&key, gate);
                });
            }
            Err(_) => {
                match handle.shared.inner.try_write() {
                    Ok(mut inner) => {
                        let ViewInner { view, reconciler } = &mut *inner;
                        if let Err(err) = reconciler.roll_back(view, &key, id) {
                            warn!(
                                competition_id = handle.shared.competition_id,
                                key = %key,
                                mutation_id = %id,
                                error = %err,
                                "failed to roll back dropped mutation"
                            );
                        }
                    }
                    Err(_) => warn!(
                        competition_id = handle.shared.competition_id,
                        key = %key,
                        mutation_id = %id,
                        "view busy, dropped mutation left pending"
                    ),
                }
                drop(gate);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use time::macros::{date, datetime};

    use super::*;
    use crate::state::competition::{CompetitionStatus, UserId};

    pub(crate) fn participant(id: i64, name: &str) -> Participant {
        Participant {
            id: UserId(id),
            username: name.into(),
        }
    }

    pub(crate) fn restaurant(id: i64, proposer: i64, visit_date: Date) -> Restaurant {
        Restaurant {
            id: RecordId::Persisted(id),
            name: format!("Restaurant {id}"),
            address: "1 rue de la Paix".into(),
            cuisine_type: "bistro".into(),
            proposer: Some(participant(proposer, &format!("user-{proposer}"))),
            visit_date,
            image: None,
            created_at: datetime!(2025-02-01 10:00 UTC),
        }
    }

    /// Active competition with participants 1 and 2; restaurant 1 (by 1) was visited on
    /// 2025-03-01 and restaurant 2 (by 2) is planned for 2025-03-20.
    pub(crate) fn sample_view() -> CompetitionView {
        let competition = Competition {
            id: 7,
            name: "Spring tour".into(),
            description: String::new(),
            creator: participant(1, "user-1"),
            status: CompetitionStatus::Active,
            start_date: date!(2025 - 02 - 01),
            end_date: date!(2025 - 04 - 30),
            participants: vec![participant(1, "user-1"), participant(2, "user-2")],
            restaurants: vec![
                restaurant(1, 1, date!(2025 - 03 - 01)),
                restaurant(2, 2, date!(2025 - 03 - 20)),
            ],
        };
        CompetitionView::new(competition, participant(2, "user-2"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::macros::date;

    use super::{fixtures::*, *};
    use crate::{
        scoring::aggregator::tests::rating,
        state::{
            clock::FixedClock,
            competition::{CompetitionStatus, UserId},
        },
    };

    const TODAY: Date = date!(2025 - 03 - 10);

    fn handle(view: CompetitionView) -> ViewHandle {
        ViewHandle::new(view, Arc::new(FixedClock::on(TODAY)), None)
    }

    fn rating_key(restaurant: i64, rater: i64) -> MutationKey {
        MutationKey::Rating {
            restaurant: RecordId::Persisted(restaurant),
            rater: UserId(rater),
        }
    }

    fn predict_rating(
        rater: i64,
        overall: u8,
    ) -> impl FnOnce(&CompetitionView, &dyn Clock) -> Result<(Mutation, ()), ServiceError> {
        move |_, _| Ok((Mutation::SubmitRating(rating(0, 1, rater, overall)), ()))
    }

    #[test]
    fn two_participant_scenario_ranks_rated_proposer_first() {
        let mut view = sample_view();
        view.ratings.upsert(rating(1, 1, 1, 8));
        view.ratings.upsert(rating(2, 1, 2, 6));

        let rankings = view.rankings();
        assert_eq!(rankings[0].participant.id, UserId(1));
        assert_eq!(rankings[0].score, 7.0);
        assert_eq!(rankings[1].participant.id, UserId(2));
        assert_eq!(rankings[1].score, 0.0);
        assert!(rankings[1].not_yet_rated());
    }

    #[test]
    fn summaries_reflect_lifecycle_and_viewer() {
        let mut view = sample_view();
        view.ratings.upsert(rating(1, 1, 2, 6));

        let listing = view.restaurants(TODAY, false, RestaurantSort::Default);
        assert_eq!(listing[0].lifecycle, Lifecycle::Visited);
        assert_eq!(listing[0].own_rating.as_ref().unwrap().overall, 6);
        assert!(listing[0].can_rate);
        assert_eq!(listing[1].lifecycle, Lifecycle::Upcoming);
        assert!(!listing[1].can_rate);
        assert!(view.viewer_is_participant());
        assert!(!view.viewer_is_creator());

        let upcoming = view.restaurants(TODAY, true, RestaurantSort::Default);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].restaurant.id, RecordId::Persisted(2));
    }

    #[test]
    fn listing_sorts_by_visit_date() {
        let mut view = sample_view();
        view.competition
            .restaurants
            .push(restaurant(3, 1, date!(2025 - 02 - 15)));

        let ids = |sort| -> Vec<RecordId> {
            view.restaurants(TODAY, false, sort)
                .into_iter()
                .map(|summary| summary.restaurant.id)
                .collect()
        };

        assert_eq!(
            ids(RestaurantSort::DateAsc),
            vec![3.into(), 1.into(), 2.into()]
        );
        assert_eq!(
            ids(RestaurantSort::DateDesc),
            vec![2.into(), 1.into(), 3.into()]
        );
        assert_eq!(
            ids(RestaurantSort::Default),
            vec![1.into(), 2.into(), 3.into()]
        );
    }

    #[test]
    fn progress_counts_visited_restaurants() {
        let mut view = sample_view();
        assert_eq!(view.progress(TODAY).percent, 0);

        view.ratings.upsert(rating(1, 1, 2, 6));
        view.competition
            .restaurants
            .push(restaurant(3, 1, date!(2025 - 02 - 15)));
        let progress = view.progress(TODAY);
        assert_eq!((progress.visited, progress.total, progress.percent), (1, 3, 33));

        let empty = CompetitionView::new(
            Competition {
                restaurants: vec![],
                ..sample_view().competition
            },
            participant(1, "user-1"),
        );
        assert_eq!(empty.progress(TODAY).percent, 0);
    }

    #[tokio::test]
    async fn failed_submission_rolls_back_and_surfaces_error() {
        let handle = handle(sample_view());
        let before = handle.read(|view| view.clone()).await;

        let pending = handle
            .begin(rating_key(1, 2), predict_rating(2, 9))
            .await
            .unwrap();
        assert_eq!(
            handle
                .read(|view| view.ratings.ratings(&RecordId::Persisted(1)).len())
                .await,
            1
        );

        let err = pending
            .submit(|_| async { Err(ServiceError::Transport("connection reset".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
        assert_eq!(handle.read(|view| view.clone()).await, before);
        assert_eq!(handle.pending_mutations().await, 0);
    }

    #[tokio::test]
    async fn timed_out_submission_rolls_back() {
        let handle = ViewHandle::new(
            sample_view(),
            Arc::new(FixedClock::on(TODAY)),
            Some(Duration::from_millis(20)),
        );

        let pending = handle
            .begin(rating_key(1, 2), predict_rating(2, 9))
            .await
            .unwrap();
        let err = pending
            .submit(|_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Confirmation::Rating(rating(3, 1, 2, 9)))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Timeout));
        assert!(
            handle
                .read(|view| view.ratings.ratings(&RecordId::Persisted(1)).is_empty())
                .await
        );
    }

    #[tokio::test]
    async fn same_key_submissions_run_in_arrival_order() {
        let handle = handle(sample_view());
        let order = Arc::new(AtomicUsize::new(0));

        let first = handle
            .begin(rating_key(1, 2), predict_rating(2, 4))
            .await
            .unwrap();

        let second_handle = handle.clone();
        let second_order = order.clone();
        let second = tokio::spawn(async move {
            let pending = second_handle
                .begin(rating_key(1, 2), predict_rating(2, 9))
                .await
                .unwrap();
            let position = second_order.fetch_add(1, Ordering::SeqCst);
            pending
                .submit(|_| async { Ok(Confirmation::Rating(rating(5, 1, 2, 9))) })
                .await
                .unwrap();
            position
        });

        tokio::task::yield_now().await;
        let first_position = order.fetch_add(1, Ordering::SeqCst);
        first
            .submit(|_| async { Ok(Confirmation::Rating(rating(5, 1, 2, 4))) })
            .await
            .unwrap();

        assert_eq!(first_position, 0);
        assert_eq!(second.await.unwrap(), 1);

        let ratings = handle
            .read(|view| view.ratings.ratings(&RecordId::Persisted(1)).to_vec())
            .await;
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].overall, 9);
    }

    #[tokio::test]
    async fn dropped_prediction_is_rolled_back() {
        let handle = handle(sample_view());
        let before = handle.read(|view| view.clone()).await;

        let pending = handle
            .begin(rating_key(1, 2), predict_rating(2, 9))
            .await
            .unwrap();
        drop(pending);

        let pending = handle
            .begin(rating_key(1, 2), predict_rating(2, 3))
            .await
            .unwrap();
        let resolved = pending.discard().await.unwrap();

        assert_eq!(resolved.phase, crate::state::reconciler::MutationPhase::RolledBack);
        assert_eq!(handle.read(|view| view.clone()).await, before);
    }

    #[test]
    fn prediction_dropped_outside_runtime_is_rolled_back() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let handle = handle(sample_view());
        let before = runtime.block_on(handle.read(|view| view.clone()));

        let pending = runtime
            .block_on(handle.begin(rating_key(1, 2), predict_rating(2, 9)))
            .unwrap();
        drop(pending);

        assert_eq!(runtime.block_on(handle.read(|view| view.clone())), before);
        assert_eq!(runtime.block_on(handle.pending_mutations()), 0);
    }

    #[tokio::test]
    async fn failed_preparation_leaves_view_untouched() {
        let handle = handle(sample_view());
        let before = handle.read(|view| view.clone()).await;

        let err = handle
            .begin(rating_key(2, 2), |view, clock| -> Result<_, ServiceError> {
                let restaurant = view.restaurant(&RecordId::Persisted(2)).unwrap();
                lifecycle::ensure_ratable(
                    view.competition.status,
                    restaurant.visit_date,
                    clock.today(),
                )?;
                Ok((Mutation::SubmitRating(rating(0, 2, 2, 5)), ()))
            })
            .await
            .map(|_| ())
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotRatable(_)));
        assert_eq!(handle.read(|view| view.clone()).await, before);
    }

    #[tokio::test]
    async fn stale_fetch_does_not_override_newer_state() {
        let handle = handle(sample_view());
        let restaurant = RecordId::Persisted(1);

        let early = handle.begin_fetch(&restaurant).await;
        let late = handle.begin_fetch(&restaurant).await;
        handle
            .complete_fetch(late, vec![rating(1, 1, 1, 8)])
            .await
            .unwrap();
        assert!(handle.complete_fetch(early, vec![]).await.is_err());

        let average = handle.read(|view| view.ratings.average(&restaurant)).await;
        assert_eq!(average, Some(8.0));
    }

    #[tokio::test]
    async fn fetch_keeps_pending_rating_until_it_resolves() {
        let handle = handle(sample_view());
        let restaurant = RecordId::Persisted(1);

        let pending = handle
            .begin(rating_key(1, 2), predict_rating(2, 9))
            .await
            .unwrap();
        let ticket = handle.begin_fetch(&restaurant).await;
        handle
            .complete_fetch(ticket, vec![rating(1, 1, 1, 8)])
            .await
            .unwrap();

        let own = handle
            .read(|view| view.ratings.own_rating(&restaurant, UserId(2)).cloned())
            .await;
        assert_eq!(own.map(|rating| rating.overall), Some(9));
        assert_eq!(
            handle.read(|view| view.ratings.average(&restaurant)).await,
            Some(8.5)
        );

        pending
            .submit(|_| async { Err(ServiceError::Transport("connection reset".into())) })
            .await
            .unwrap_err();
        let ratings = handle
            .read(|view| view.ratings.ratings(&restaurant).to_vec())
            .await;
        assert_eq!(ratings, vec![rating(1, 1, 1, 8)]);
    }

    #[tokio::test]
    async fn status_change_is_confirmed_by_backend_value() {
        let handle = handle(sample_view());
        let pending = handle
            .begin(MutationKey::Status, |_, _| {
                Ok::<_, ServiceError>((Mutation::ChangeStatus(CompetitionStatus::Completed), ()))
            })
            .await
            .unwrap();

        pending
            .submit(|_| async { Ok(Confirmation::Status(CompetitionStatus::Completed)) })
            .await
            .unwrap();

        assert_eq!(
            handle.read(|view| view.competition.status).await,
            CompetitionStatus::Completed
        );
    }
}
