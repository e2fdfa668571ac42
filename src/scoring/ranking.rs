use crate::state::competition::{Participant, UserId};

/// Score contribution of a single restaurant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestaurantScore {
    /// Participant who suggested the restaurant.
    pub proposer: Option<UserId>,
    /// Average overall score, `None` while unrated.
    pub average: Option<f64>,
}

/// Leaderboard line for a participant.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    /// Ranked participant.
    pub participant: Participant,
    /// Mean of the averages of the participant's rated restaurants, one decimal.
    pub score: f64,
    /// Number of the participant's restaurants that received at least one rating.
    pub rated_restaurants: usize,
}

impl RankingEntry {
    /// Whether none of the participant's restaurants has been rated yet.
    pub fn not_yet_rated(&self) -> bool {
        self.rated_restaurants == 0
    }
}

/// Compute the leaderboard from scratch.
///
/// Entries are sorted by descending score; ties keep the order of `participants`.
pub fn rank(participants: &[Participant], restaurants: &[RestaurantScore]) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = participants
        .iter()
        .map(|participant| {
            let averages: Vec<f64> = restaurants
                .iter()
                .filter(|restaurant| restaurant.proposer == Some(participant.id))
                .filter_map(|restaurant| restaurant.average)
                .collect();

            let score = if averages.is_empty() {
                0.0
            } else {
                round_one_decimal(averages.iter().sum::<f64>() / averages.len() as f64)
            };

            RankingEntry {
                participant: participant.clone(),
                score,
                rated_restaurants: averages.len(),
            }
        })
        .collect();

    // `sort_by` is stable
    entries.sort_by(|left, right| right.score.total_cmp(&left.score));
    entries
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
