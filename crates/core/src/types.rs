//! Core data types for the GPU rental market pipeline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the order book an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Seller-side listing offering capacity.
    Ask,
    /// Buyer-side listing requesting capacity.
    Bid,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => write!(f, "ask"),
            Side::Bid => write!(f, "bid"),
        }
    }
}

/// A capture timestamp floored to the alignment granularity.
///
/// Ask and bid snapshots are captured by separate passes moments apart;
/// flooring both to the same boundary is what lets an exact join treat
/// them as simultaneous.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeBucket(DateTime<Utc>);

impl TimeBucket {
    /// Floor a timestamp to the given bucket width in seconds.
    ///
    /// Floor, never round: a bucket represents "captured no earlier than
    /// this boundary, before the next".
    ///
    /// # Panics
    ///
    /// Panics if `width_secs` is not positive. Callers take the width
    /// from an [`AlignmentConfig`](crate::config::AlignmentConfig),
    /// whose `validate()` rejects such values with a proper error.
    pub fn floor(ts: DateTime<Utc>, width_secs: i64) -> Self {
        assert!(width_secs > 0, "bucket width must be positive");
        let into_bucket = ts.timestamp().rem_euclid(width_secs);
        let floored = ts
            - Duration::seconds(into_bucket)
            - Duration::nanoseconds(i64::from(ts.timestamp_subsec_nanos()));
        TimeBucket(floored)
    }

    /// The bucket's lower boundary.
    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

/// A single validated order-book observation (one listing, one side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Capture time, UTC, sub-second precision as captured.
    pub observed_at: DateTime<Utc>,
    /// Identity of the physical machine behind the listing.
    pub host_id: String,
    /// Number of GPUs bundled in the listing.
    pub config_size: u32,
    /// Total price for the whole listing ($/hr).
    pub total_price: f64,
    /// Listing identity within its source set; used for counting, never joining.
    pub listing_id: String,
}

/// An observation with its capture time floored to a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedObservation {
    /// Original observation.
    pub obs: Observation,
    /// Assigned time bucket.
    pub bucket: TimeBucket,
}

impl AlignedObservation {
    /// Identity of "the same observation" within one side.
    #[inline]
    pub fn key(&self) -> DedupKey {
        DedupKey {
            bucket: self.bucket,
            host_id: self.obs.host_id.clone(),
            config_size: self.obs.config_size,
        }
    }
}

/// Normalized offer: aligned, deduplicated, with derived per-unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// Capture time, UTC.
    pub observed_at: DateTime<Utc>,
    /// Assigned time bucket.
    pub bucket: TimeBucket,
    /// Host identity.
    pub host_id: String,
    /// Number of GPUs in the listing.
    pub config_size: u32,
    /// Total price for the listing ($/hr).
    pub total_price: f64,
    /// Price per GPU ($/hr), total_price / config_size.
    pub unit_price: f64,
    /// Listing identity.
    pub listing_id: String,
}

impl Offer {
    /// The (bucket, host, size) key this offer joins and dedups on.
    #[inline]
    pub fn key(&self) -> DedupKey {
        DedupKey {
            bucket: self.bucket,
            host_id: self.host_id.clone(),
            config_size: self.config_size,
        }
    }
}

/// Deduplication / join key: (time bucket, host identity, configuration size).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub bucket: TimeBucket,
    pub host_id: String,
    pub config_size: u32,
}

/// An ask and a bid sharing the same (bucket, host, size) key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Surviving ask offer for the key.
    pub ask: Offer,
    /// Surviving bid offer for the key.
    pub bid: Offer,
}

impl MatchedPair {
    /// Spread, ask total price minus bid total price.
    ///
    /// Near-zero or negative spreads are meaningful data points and are
    /// never clamped.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask.total_price - self.bid.total_price
    }

    /// Shared time bucket.
    #[inline]
    pub fn bucket(&self) -> TimeBucket {
        self.ask.bucket
    }

    /// Shared host identity.
    #[inline]
    pub fn host_id(&self) -> &str {
        &self.ask.host_id
    }

    /// Shared configuration size.
    #[inline]
    pub fn config_size(&self) -> u32 {
        self.ask.config_size
    }
}

/// Identifier that may arrive as a JSON string or integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Int(i64),
}

impl RawId {
    /// Canonical string form used in typed records.
    pub fn canonical(&self) -> String {
        match self {
            RawId::Text(s) => s.clone(),
            RawId::Int(n) => n.to_string(),
        }
    }
}

/// Capture timestamp as supplied: ISO-8601 text or numeric epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    EpochSecs(f64),
}

/// Untyped wire row as supplied by the capture layer, either side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObservation {
    /// Capture time.
    pub timestamp: RawTimestamp,
    /// Host identity.
    pub machine_id: RawId,
    /// Configuration size; validated positive at the load boundary.
    pub num_gpus: i64,
    /// Total price for the listing; validated non-negative.
    pub dph_total: f64,
    /// Listing identity.
    pub id: RawId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn utc(secs: i64, nanos: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, nanos).unwrap()
    }

    fn make_offer(total_price: f64) -> Offer {
        let ts = utc(1704067290, 0);
        Offer {
            observed_at: ts,
            bucket: TimeBucket::floor(ts, 60),
            host_id: "h1".to_string(),
            config_size: 1,
            total_price,
            unit_price: total_price,
            listing_id: "l1".to_string(),
        }
    }

    #[test]
    fn test_floor_to_minute() {
        // 2024-01-01 00:01:30.500 -> 2024-01-01 00:01:00.000
        let ts = utc(1704067290, 500_000_000);
        let bucket = TimeBucket::floor(ts, 60);
        assert_eq!(bucket.start(), utc(1704067260, 0));
    }

    #[test]
    fn test_floor_on_boundary() {
        let ts = utc(1704067260, 0);
        let bucket = TimeBucket::floor(ts, 60);
        assert_eq!(bucket.start(), ts);
    }

    #[test]
    fn test_floor_strips_subsecond() {
        let ts = utc(1704067260, 4_000_000); // 4ms into the minute
        let bucket = TimeBucket::floor(ts, 60);
        assert_eq!(bucket.start(), utc(1704067260, 0));
    }

    #[test]
    #[should_panic(expected = "bucket width must be positive")]
    fn test_floor_rejects_nonpositive_width() {
        TimeBucket::floor(utc(1704067290, 0), 0);
    }

    #[test]
    fn test_skewed_captures_share_bucket() {
        // Ask and bid passes a few seconds apart land in the same bucket.
        let ask_ts = utc(1704067262, 0);
        let bid_ts = utc(1704067265, 123_000_000);
        assert_eq!(TimeBucket::floor(ask_ts, 60), TimeBucket::floor(bid_ts, 60));
    }

    #[test]
    fn test_spread_sign() {
        let pair = MatchedPair {
            ask: make_offer(1.10),
            bid: make_offer(0.80),
        };
        assert_relative_eq!(pair.spread(), 0.30, epsilon = 1e-10);

        let inverted = MatchedPair {
            ask: make_offer(0.70),
            bid: make_offer(0.80),
        };
        // Negative spreads are valid, never clamped
        assert_relative_eq!(inverted.spread(), -0.10, epsilon = 1e-10);
    }

    #[test]
    fn test_raw_id_canonical() {
        assert_eq!(RawId::Int(12345).canonical(), "12345");
        assert_eq!(RawId::Text("h-12".to_string()).canonical(), "h-12");
    }

    #[test]
    fn test_raw_observation_from_json() {
        let row: RawObservation = serde_json::from_str(
            r#"{"timestamp":"2024-01-01T00:01:30.500Z","machine_id":42,"num_gpus":1,"dph_total":0.35,"id":"9001"}"#,
        )
        .unwrap();
        assert_eq!(row.machine_id, RawId::Int(42));
        assert_eq!(row.id, RawId::Text("9001".to_string()));
        assert_eq!(row.num_gpus, 1);
    }
}
