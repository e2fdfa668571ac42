use std::collections::HashMap;

use thiserror::Error;

use crate::state::competition::{Rating, RecordId, UserId};

/// Mean overall score of a rating list, `None` when nobody rated.
pub fn average(ratings: &[Rating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|rating| u32::from(rating.overall)).sum();
    Some(f64::from(sum) / ratings.len() as f64)
}

/// Rating left by `user`, if any.
pub fn own_rating(ratings: &[Rating], user: UserId) -> Option<&Rating> {
    ratings.iter().find(|rating| rating.rater.id == user)
}

/// Ticket stamped on a rating fetch so late responses can be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Restaurant whose ratings are fetched.
    pub restaurant: RecordId,
    /// Monotonic sequence number for this restaurant.
    pub sequence: u64,
}

/// A fetch response arrived after a newer write was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stale ratings response #{sequence} for restaurant {restaurant}, latest applied is #{applied}")]
pub struct StaleResponse {
    /// Restaurant concerned by the response.
    pub restaurant: RecordId,
    /// Sequence carried by the discarded response.
    pub sequence: u64,
    /// Sequence of the latest applied write.
    pub applied: u64,
}

#[derive(Debug, Clone, Default)]
struct RatingSlot {
    ratings: Vec<Rating>,
    issued: u64,
    applied: u64,
}

impl RatingSlot {
    // Any write newer than the outstanding fetches makes their responses stale.
    fn invalidate_fetches(&mut self) {
        self.applied = self.issued;
    }

    fn put(&mut self, rating: Rating) -> Option<Rating> {
        match self
            .ratings
            .iter_mut()
            .find(|existing| existing.rater.id == rating.rater.id)
        {
            Some(existing) => Some(std::mem::replace(existing, rating)),
            None => {
                self.ratings.push(rating);
                None
            }
        }
    }
}

/// Per-restaurant rating lists with fetch sequencing.
#[derive(Debug, Clone, Default)]
pub struct RatingCache {
    slots: HashMap<RecordId, RatingSlot>,
}

// Equality compares rating content only; a missing slot equals an empty one.
impl PartialEq for RatingCache {
    fn eq(&self, other: &Self) -> bool {
        self.slots
            .keys()
            .chain(other.slots.keys())
            .all(|restaurant| self.ratings(restaurant) == other.ratings(restaurant))
    }
}

impl RatingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ratings currently known for `restaurant`, in arrival order.
    pub fn ratings(&self, restaurant: &RecordId) -> &[Rating] {
        self.slots
            .get(restaurant)
            .map(|slot| slot.ratings.as_slice())
            .unwrap_or_default()
    }

    /// Average overall score for `restaurant`.
    pub fn average(&self, restaurant: &RecordId) -> Option<f64> {
        average(self.ratings(restaurant))
    }

    /// Rating left by `user` for `restaurant`.
    pub fn own_rating(&self, restaurant: &RecordId, user: UserId) -> Option<&Rating> {
        own_rating(self.ratings(restaurant), user)
    }

    /// Stamp a new fetch for `restaurant`.
    pub fn begin_fetch(&mut self, restaurant: &RecordId) -> FetchTicket {
        let slot = self.slots.entry(restaurant.clone()).or_default();
        slot.issued += 1;
        FetchTicket {
            restaurant: restaurant.clone(),
            sequence: slot.issued,
        }
    }

    /// Replace the list wholesale with a fetched one unless a newer write already landed.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        ratings: Vec<Rating>,
    ) -> Result<(), StaleResponse> {
        let slot = self.slots.entry(ticket.restaurant.clone()).or_default();
        if ticket.sequence <= slot.applied {
            return Err(StaleResponse {
                restaurant: ticket.restaurant,
                sequence: ticket.sequence,
                applied: slot.applied,
            });
        }

        slot.ratings = ratings;
        slot.applied = ticket.sequence;
        Ok(())
    }

    /// Insert or replace the rating of its rater, returning the replaced entry.
    ///
    /// Outstanding fetches for the restaurant become stale.
    pub fn upsert(&mut self, rating: Rating) -> Option<Rating> {
        let slot = self.slots.entry(rating.restaurant.clone()).or_default();
        slot.invalidate_fetches();
        slot.put(rating)
    }

    /// Like [`RatingCache::upsert`], but leaves outstanding fetches valid.
    ///
    /// Used to lay a still-pending rating over a list that was just fetched.
    pub fn overlay(&mut self, rating: Rating) -> Option<Rating> {
        self.slots
            .entry(rating.restaurant.clone())
            .or_default()
            .put(rating)
    }

    /// Undo a locally applied rating.
    ///
    /// The entry of `rater` is reverted to `previous` only if it still holds `applied`;
    /// anything written since is left untouched. Returns whether a change was made.
    pub fn revert(&mut self, applied: &Rating, previous: Option<Rating>) -> bool {
        let Some(slot) = self.slots.get_mut(&applied.restaurant) else {
            return false;
        };
        let Some(position) = slot
            .ratings
            .iter()
            .position(|existing| existing == applied)
        else {
            return false;
        };

        slot.invalidate_fetches();
        match previous {
            Some(previous) => slot.ratings[position] = previous,
            None => {
                slot.ratings.remove(position);
            }
        }
        true
    }

    /// Move the ratings cached under `from` to `to`.
    pub fn rekey(&mut self, from: &RecordId, to: RecordId) {
        if let Some(mut slot) = self.slots.remove(from) {
            for rating in &mut slot.ratings {
                rating.restaurant = to.clone();
            }
            self.slots.insert(to, slot);
        }
    }

    /// Drop everything cached for `restaurant`.
    pub fn forget(&mut self, restaurant: &RecordId) {
        self.slots.remove(restaurant);
    }
}
