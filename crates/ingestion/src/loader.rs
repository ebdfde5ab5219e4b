//! Record loading: untyped capture rows into typed observations.
//!
//! The capture layer hands over raw rows (any number of batches per side,
//! concatenated in order; batch boundaries carry no meaning). This module
//! validates each row into an [`Observation`] and counts what it skips, so
//! silent data loss never goes unnoticed.

use chrono::{DateTime, Utc};
use gpumarket_core::{Error, Observation, RawObservation, RawTimestamp, Result, Side};
use tracing::{debug, warn};

/// Counters describing one side's load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Rows seen across all batches.
    pub rows_seen: u64,
    /// Rows that validated into observations.
    pub rows_loaded: u64,
    /// Rows skipped for failing schema validation.
    pub rows_skipped: u64,
}

/// One side's loaded observations plus its counters.
#[derive(Debug, Clone)]
pub struct SideLoad {
    /// Which side this is.
    pub side: Side,
    /// Validated observations, in input order.
    pub observations: Vec<Observation>,
    /// Load counters.
    pub stats: LoadStats,
}

/// Both sides of the book, loaded together.
///
/// Matching requires both sides, so a failure on either side fails the
/// whole load.
#[derive(Debug, Clone)]
pub struct LoadedBook {
    pub asks: Vec<Observation>,
    pub bids: Vec<Observation>,
    pub ask_stats: LoadStats,
    pub bid_stats: LoadStats,
}

/// Validate a single raw row into a typed observation.
///
/// Strict per-row entry point: callers wanting reject-the-run semantics can
/// apply this themselves; [`load_side`] uses it with skip-and-count.
pub fn validate_row(row: &RawObservation) -> Result<Observation> {
    let observed_at = parse_timestamp(&row.timestamp)?;

    if row.num_gpus <= 0 {
        return Err(Error::malformed(format!(
            "non-positive num_gpus {}",
            row.num_gpus
        )));
    }
    let config_size = u32::try_from(row.num_gpus)
        .map_err(|_| Error::malformed(format!("num_gpus {} out of range", row.num_gpus)))?;

    if !row.dph_total.is_finite() || row.dph_total < 0.0 {
        return Err(Error::malformed(format!(
            "invalid dph_total {}",
            row.dph_total
        )));
    }

    Ok(Observation {
        observed_at,
        host_id: row.machine_id.canonical(),
        config_size,
        total_price: row.dph_total,
        listing_id: row.id.canonical(),
    })
}

/// Load one side from raw batches, skipping and counting malformed rows.
///
/// Zero batches, or batches whose every row is skipped, yield
/// [`Error::SourceUnavailable`]: downstream matching needs the side.
pub fn load_side(side: Side, batches: &[Vec<RawObservation>]) -> Result<SideLoad> {
    if batches.is_empty() {
        return Err(Error::SourceUnavailable(side));
    }

    let mut stats = LoadStats::default();
    let mut observations = Vec::with_capacity(batches.iter().map(Vec::len).sum());

    for batch in batches {
        for row in batch {
            stats.rows_seen += 1;
            match validate_row(row) {
                Ok(obs) => {
                    stats.rows_loaded += 1;
                    observations.push(obs);
                }
                Err(err) => {
                    stats.rows_skipped += 1;
                    warn!(%side, row = stats.rows_seen, %err, "skipping malformed row");
                }
            }
        }
    }

    if observations.is_empty() {
        return Err(Error::SourceUnavailable(side));
    }

    debug!(
        %side,
        rows_seen = stats.rows_seen,
        rows_loaded = stats.rows_loaded,
        rows_skipped = stats.rows_skipped,
        "loaded side"
    );

    Ok(SideLoad {
        side,
        observations,
        stats,
    })
}

/// Load both sides of the book. Partial success is a failure.
pub fn load(
    ask_batches: &[Vec<RawObservation>],
    bid_batches: &[Vec<RawObservation>],
) -> Result<LoadedBook> {
    let asks = load_side(Side::Ask, ask_batches)?;
    let bids = load_side(Side::Bid, bid_batches)?;

    Ok(LoadedBook {
        asks: asks.observations,
        bids: bids.observations,
        ask_stats: asks.stats,
        bid_stats: bids.stats,
    })
}

/// Parse a capture timestamp: RFC 3339 text or numeric epoch seconds.
fn parse_timestamp(raw: &RawTimestamp) -> Result<DateTime<Utc>> {
    match raw {
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::malformed(format!("unparseable timestamp {s:?}: {e}"))),
        RawTimestamp::EpochSecs(secs) => {
            if !secs.is_finite() || *secs < 0.0 {
                return Err(Error::malformed(format!(
                    "unparseable epoch timestamp {secs}"
                )));
            }
            let whole = secs.trunc() as i64;
            // Rounding can carry up to a full second; cap at the nanosecond range.
            let nanos = ((secs.fract() * 1e9).round() as u32).min(999_999_999);
            DateTime::from_timestamp(whole, nanos)
                .ok_or_else(|| Error::malformed(format!("epoch timestamp {secs} out of range")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpumarket_core::RawId;

    fn make_row(timestamp: &str, machine_id: i64, num_gpus: i64, dph_total: f64) -> RawObservation {
        RawObservation {
            timestamp: RawTimestamp::Text(timestamp.to_string()),
            machine_id: RawId::Int(machine_id),
            num_gpus,
            dph_total,
            id: RawId::Int(machine_id * 10),
        }
    }

    #[test]
    fn test_validate_row() {
        let row = make_row("2024-01-01T00:01:30.500Z", 42, 2, 0.70);
        let obs = validate_row(&row).unwrap();

        assert_eq!(obs.host_id, "42");
        assert_eq!(obs.config_size, 2);
        assert!((obs.total_price - 0.70).abs() < 1e-10);
        assert_eq!(obs.observed_at.timestamp(), 1704067290);
        assert_eq!(obs.observed_at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_epoch_timestamp() {
        let row = RawObservation {
            timestamp: RawTimestamp::EpochSecs(1704067290.5),
            machine_id: RawId::Text("h-1".to_string()),
            num_gpus: 1,
            dph_total: 0.35,
            id: RawId::Int(1),
        };
        let obs = validate_row(&row).unwrap();
        assert_eq!(obs.observed_at.timestamp(), 1704067290);
        assert_eq!(obs.observed_at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let bad_ts = make_row("yesterday", 1, 1, 0.35);
        assert!(validate_row(&bad_ts).is_err());

        let zero_gpus = make_row("2024-01-01T00:00:00Z", 1, 0, 0.35);
        assert!(validate_row(&zero_gpus).is_err());

        let negative_price = make_row("2024-01-01T00:00:00Z", 1, 1, -0.10);
        assert!(validate_row(&negative_price).is_err());

        let nan_price = make_row("2024-01-01T00:00:00Z", 1, 1, f64::NAN);
        assert!(validate_row(&nan_price).is_err());
    }

    #[test]
    fn test_skip_and_count() {
        let batches = vec![vec![
            make_row("2024-01-01T00:00:00Z", 1, 1, 0.35),
            make_row("not a timestamp", 2, 1, 0.40),
            make_row("2024-01-01T00:00:05Z", 3, 1, -1.0),
            make_row("2024-01-01T00:00:10Z", 4, 1, 0.45),
        ]];

        let loaded = load_side(Side::Ask, &batches).unwrap();
        assert_eq!(loaded.observations.len(), 2);
        assert_eq!(loaded.stats.rows_seen, 4);
        assert_eq!(loaded.stats.rows_loaded, 2);
        assert_eq!(loaded.stats.rows_skipped, 2);
    }

    #[test]
    fn test_no_batches_is_fatal() {
        let err = load_side(Side::Bid, &[]).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(Side::Bid)));
    }

    #[test]
    fn test_all_rows_skipped_is_fatal() {
        let batches = vec![vec![make_row("garbage", 1, 1, 0.35)]];
        let err = load_side(Side::Ask, &batches).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(Side::Ask)));
    }

    #[test]
    fn test_one_failing_side_fails_the_load() {
        let good = vec![vec![make_row("2024-01-01T00:00:00Z", 1, 1, 0.35)]];
        let result = load(&good, &[]);
        assert!(matches!(result, Err(Error::SourceUnavailable(Side::Bid))));
    }

    #[test]
    fn test_batches_concatenate_in_order() {
        let batches = vec![
            vec![make_row("2024-01-01T00:00:00Z", 1, 1, 0.35)],
            vec![make_row("2024-01-01T00:05:00Z", 2, 1, 0.40)],
        ];
        let loaded = load_side(Side::Ask, &batches).unwrap();
        assert_eq!(loaded.observations[0].host_id, "1");
        assert_eq!(loaded.observations[1].host_id, "2");
    }
}
