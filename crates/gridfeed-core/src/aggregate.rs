// Weekly stat aggregation: season totals and per-game averages.

use crate::model::RawWeeklyStatRow;
use std::collections::{BTreeSet, HashMap};

/// Season-level totals for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeasonTotals {
    /// Sum of weekly PPR points, floored at zero.
    pub points: f64,
    /// Number of distinct weeks with a stat row, whether or not it had points.
    pub games: u32,
}

impl SeasonTotals {
    /// Points per game; equals `points` when the player has no games.
    pub fn avg_points(&self) -> f64 {
        if self.games > 0 {
            self.points / f64::from(self.games)
        } else {
            self.points
        }
    }
}

/// Reduce weekly stat rows to one `SeasonTotals` per player id.
///
/// Missing or non-finite point values count as zero. A player with several
/// rows for the same week (regular season and postseason share week numbers
/// in some feeds) is still credited with one game for that week.
pub fn aggregate_weekly(rows: &[RawWeeklyStatRow]) -> HashMap<String, SeasonTotals> {
    let mut sums: HashMap<&str, (f64, BTreeSet<u32>)> = HashMap::new();

    for row in rows {
        let entry = sums.entry(row.player_id.as_str()).or_default();
        entry.0 += row.fantasy_points_ppr.filter(|p| p.is_finite()).unwrap_or(0.0);
        entry.1.insert(row.week);
    }

    sums.into_iter()
        .map(|(id, (points, weeks))| {
            let totals = SeasonTotals {
                points: points.max(0.0),
                games: weeks.len() as u32,
            };
            (id.to_string(), totals)
        })
        .collect()
}

/// Left-join lookup: players without weekly rows get zero totals.
pub fn totals_for(totals: &HashMap<String, SeasonTotals>, raw_id: &str) -> SeasonTotals {
    totals.get(raw_id).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(id: &str, week: u32, points: Option<f64>) -> RawWeeklyStatRow {
        RawWeeklyStatRow {
            player_id: id.to_string(),
            week,
            fantasy_points_ppr: points,
        }
    }

    #[test]
    fn null_points_still_count_as_a_game() {
        let rows = vec![
            stat("00-2", 1, Some(10.0)),
            stat("00-2", 2, None),
            stat("00-2", 3, Some(5.0)),
        ];
        let totals = aggregate_weekly(&rows);
        let t = totals["00-2"];
        assert!((t.points - 15.0).abs() < 1e-9);
        assert_eq!(t.games, 3);
        assert!((t.avg_points() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_week_counts_once() {
        let rows = vec![stat("a", 1, Some(4.0)), stat("a", 1, Some(6.0))];
        let t = aggregate_weekly(&rows)["a"];
        assert!((t.points - 10.0).abs() < 1e-9);
        assert_eq!(t.games, 1);
    }

    #[test]
    fn players_are_kept_separate() {
        let rows = vec![
            stat("a", 1, Some(4.0)),
            stat("b", 1, Some(20.0)),
            stat("a", 2, Some(6.0)),
        ];
        let totals = aggregate_weekly(&rows);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["a"].games, 2);
        assert_eq!(totals["b"].games, 1);
        assert!((totals["b"].points - 20.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let rows = vec![stat("a", 1, Some(f64::NAN)), stat("a", 2, Some(3.0))];
        let t = aggregate_weekly(&rows)["a"];
        assert!((t.points - 3.0).abs() < 1e-9);
        assert_eq!(t.games, 2);
    }

    #[test]
    fn negative_season_total_floors_at_zero() {
        let rows = vec![stat("a", 1, Some(-2.0)), stat("a", 2, Some(0.5))];
        let t = aggregate_weekly(&rows)["a"];
        assert_eq!(t.points, 0.0);
        assert_eq!(t.games, 2);
    }

    #[test]
    fn missing_player_defaults_to_zero() {
        let totals = aggregate_weekly(&[]);
        let t = totals_for(&totals, "nobody");
        assert_eq!(t, SeasonTotals::default());
        assert_eq!(t.avg_points(), 0.0);
    }

    #[test]
    fn zero_games_average_equals_points() {
        let t = SeasonTotals {
            points: 7.5,
            games: 0,
        };
        assert_eq!(t.avg_points(), 7.5);
    }
}
