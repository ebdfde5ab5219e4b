//! Exact-key matching of ask offers to bid offers.
//!
//! Inner equi-join on (time bucket, host, configuration size). Alignment
//! already absorbed the capture skew, so the join itself has no tolerance
//! window. Hosts present on only one side produce no pair; that is absent
//! output, not an error.

use gpumarket_core::{DedupKey, MatchedPair, Offer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Join asks to bids on the exact (bucket, host, size) key.
///
/// Normalization guarantees at most one offer per key per side, so each
/// ask joins to at most one bid and vice versa. Matched bids are consumed,
/// keeping the cardinality bound even on unnormalized input. Output order
/// follows ask input order, so results are deterministic.
pub fn match_offers(asks: &[Offer], bids: &[Offer]) -> Vec<MatchedPair> {
    let mut bids_by_key: HashMap<DedupKey, &Offer> = HashMap::with_capacity(bids.len());
    for bid in bids {
        match bids_by_key.entry(bid.key()) {
            Entry::Vacant(slot) => {
                slot.insert(bid);
            }
            Entry::Occupied(_) => {
                // First-seen wins, mirroring the normalizer's tie-break.
                debug!(
                    host = %bid.host_id,
                    size = bid.config_size,
                    "duplicate bid key in matcher input"
                );
            }
        }
    }

    let mut pairs = Vec::new();
    for ask in asks {
        if let Some(bid) = bids_by_key.remove(&ask.key()) {
            pairs.push(MatchedPair {
                ask: ask.clone(),
                bid: bid.clone(),
            });
        }
    }
    pairs
}

/// Join restricted to one configuration size.
///
/// The canonical spread report uses size 1 (single-GPU listings are the
/// apples-to-apples baseline); other sizes are accepted for diagnostics.
pub fn match_offers_at_size(asks: &[Offer], bids: &[Offer], size: u32) -> Vec<MatchedPair> {
    let asks: Vec<Offer> = asks
        .iter()
        .filter(|o| o.config_size == size)
        .cloned()
        .collect();
    let bids: Vec<Offer> = bids
        .iter()
        .filter(|o| o.config_size == size)
        .cloned()
        .collect();
    match_offers(&asks, &bids)
}
