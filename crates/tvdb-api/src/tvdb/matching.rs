//! Closest-title selection over search results.

use difflib::sequencematcher::SequenceMatcher;

use super::types::{SeriesRecord, series_name};

/// Minimum similarity ratio for a title to count as a match.
pub const DEFAULT_CUTOFF: f32 = 0.6;

/// Picks the record whose `seriesName` is most similar to `query`.
///
/// Similarity is the Ratcliff/Obershelp ratio (case and whitespace
/// sensitive). Equal ratios go to the lexicographically greater title, and
/// the first record carrying that title. Records without a name never
/// match. When no title reaches [`DEFAULT_CUTOFF`], the first record is
/// returned; an empty list yields `None`.
#[must_use]
pub fn closest_match(query: &str, series: Vec<SeriesRecord>) -> Option<SeriesRecord> {
    let best = series
        .iter()
        .enumerate()
        .filter_map(|(position, record)| series_name(record).map(|name| (position, name)))
        .filter(|(_, name)| !name.is_empty())
        .map(|(position, name)| (position, name, similarity(name, query)))
        .filter(|(_, _, ratio)| *ratio >= DEFAULT_CUTOFF)
        .max_by(|a, b| {
            a.2.total_cmp(&b.2)
                .then_with(|| a.1.cmp(b.1))
                .then_with(|| b.0.cmp(&a.0))
        });

    match best {
        Some((position, name, ratio)) => {
            tracing::info!(series_name = %name, ratio, "Closest match found");
            series.into_iter().nth(position)
        }
        None => {
            tracing::debug!(query, "No close title match, using first result");
            series.into_iter().next()
        }
    }
}

/// Ratio of matching bytes between `candidate` and `query`, in `0.0..=1.0`.
fn similarity(candidate: &str, query: &str) -> f32 {
    SequenceMatcher::<u8>::new(candidate, query).ratio()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::Value;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn fixture() -> Vec<SeriesRecord> {
        let json = include_str!("../../../../fixtures/tvdb/search_game_of_thrones.json");
        let value: Value = serde_json::from_str(json).unwrap();
        serde_json::from_value(value["data"].clone()).unwrap()
    }

    fn record(name: Option<&str>) -> SeriesRecord {
        let mut record = SeriesRecord::new();
        record.insert(
            String::from("seriesName"),
            name.map_or(Value::Null, |n| Value::String(String::from(n))),
        );
        record
    }

    #[test]
    fn test_exact_title_wins_over_earlier_records() {
        // Arrange
        let series = fixture();

        // Act
        let best = closest_match("Game of Thrones", series).unwrap();

        // Assert
        assert_eq!(best["id"], 121_361);
        assert_eq!(series_name(&best), Some("Game of Thrones"));
    }

    #[test]
    fn test_partial_title_above_cutoff() {
        // Arrange
        let series = fixture();

        // Act
        let best = closest_match("After Thrones", series).unwrap();

        // Assert
        assert_eq!(series_name(&best), Some("After the Thrones"));
    }

    #[test]
    fn test_no_match_falls_back_to_first_record() {
        // Arrange
        let series = fixture();

        // Act
        let best = closest_match("Breaking Bad", series).unwrap();

        // Assert
        assert_eq!(series_name(&best), Some("Game of Thrones: The Last Watch"));
    }

    #[test]
    fn test_empty_results_yield_none() {
        // Arrange & Act & Assert
        assert!(closest_match("Game of Thrones", Vec::new()).is_none());
    }

    #[test]
    fn test_unnamed_records_fall_back_to_first() {
        // Arrange
        let series = vec![record(None), record(Some(""))];

        // Act
        let best = closest_match("Lost", series).unwrap();

        // Assert
        assert_eq!(best["seriesName"], Value::Null);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        // Arrange
        let series = vec![record(Some("lost")), record(Some("Lost"))];

        // Act
        let best = closest_match("Lost", series).unwrap();

        // Assert
        assert_eq!(series_name(&best), Some("Lost"));
    }

    #[test]
    fn test_equal_ratios_prefer_greater_title() {
        // Arrange
        let series = vec![record(Some("Lose")), record(Some("Lust"))];

        // Act
        let best = closest_match("Lost", series).unwrap();

        // Assert
        assert_eq!(series_name(&best), Some("Lust"));
    }

    #[test]
    fn test_equal_ratios_ignore_result_order() {
        // Arrange
        let series = vec![
            record(Some("The Office (UK)")),
            record(Some("The Office (US)")),
        ];
        let mut reversed = series.clone();
        reversed.reverse();

        // Act
        let best = closest_match("The Office", series).unwrap();
        let best_reversed = closest_match("The Office", reversed).unwrap();

        // Assert
        assert_eq!(series_name(&best), Some("The Office (US)"));
        assert_eq!(series_name(&best_reversed), Some("The Office (US)"));
    }

    #[test]
    fn test_duplicate_titles_pick_first_record() {
        // Arrange
        let mut first = record(Some("Lost"));
        first.insert(String::from("id"), Value::from(1));
        let mut second = record(Some("Lost"));
        second.insert(String::from("id"), Value::from(2));

        // Act
        let best = closest_match("Lost", vec![first, second]).unwrap();

        // Assert
        assert_eq!(best["id"], 1);
    }

    #[test]
    fn test_match_is_logged() {
        // Arrange
        let (subscriber, handle) = subscriber::mock()
            .event(
                expect::event()
                    .at_level(tracing::Level::INFO)
                    .with_fields(expect::msg("Closest match found")),
            )
            .only()
            .run_with_handle();

        // Act
        with_default(subscriber, || {
            let best = closest_match("Game of Thrones", fixture());
            assert!(best.is_some());
        });

        // Assert
        handle.assert_finished();
    }
}
