//! Per-symbol order book.
//!
//! Each book guards its fields with one small mutex; writers hold it for a
//! single `update_top`/`apply_*` call and readers only ever receive value
//! copies, so no reference to guarded state escapes the lock.
//!
//! Update discipline:
//! - `update_top` is an atomic replacement of the top of book. Inputs with
//!   non-finite or non-positive fields, a crossed book, or a timestamp older
//!   than the stored one are dropped without touching state.
//! - `apply_snapshot` replaces the depth ladders wholesale.
//! - `apply_delta` upserts per price level; a quantity below `LEVEL_EPSILON`
//!   removes the level.
//!
//! A book starts empty (`has_data == false`) and flips to populated on its
//! first accepted update; it never transitions back.

use parking_lot::Mutex;

/// Identity and removal tolerance for depth levels.
const LEVEL_EPSILON: f64 = 1e-9;

/// One depth level. A zero quantity acts as a deletion marker in deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

impl PriceLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

/// Book side selector for depth queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// Value copy of the best bid/ask with the ingest timestamp.
///
/// When `has_data` is set, all four numeric fields are finite and positive
/// and `bid_price <= ask_price`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TopOfBook {
    pub bid_price: f64,
    pub bid_qty: f64,
    pub ask_price: f64,
    pub ask_qty: f64,
    pub last_update_ms: u64,
    pub has_data: bool,
}

impl TopOfBook {
    /// True when the book has data no older than `max_age_ms` at `now_ms`.
    pub fn is_fresh(&self, max_age_ms: u64, now_ms: u64) -> bool {
        self.has_data && now_ms.saturating_sub(self.last_update_ms) <= max_age_ms
    }
}

#[derive(Debug, Default)]
struct BookInner {
    top: TopOfBook,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

/// Thread-safe order book for a single symbol.
#[derive(Debug, Default)]
pub struct OrderBook {
    inner: Mutex<BookInner>,
}

fn valid_price(p: f64) -> bool {
    p.is_finite() && p > 0.0
}

fn valid_qty(q: f64) -> bool {
    q.is_finite() && q > 0.0
}

fn sort_ladder(bids: &mut Vec<PriceLevel>, asks: &mut Vec<PriceLevel>) {
    bids.sort_by(|a, b| b.price.total_cmp(&a.price));
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the top of book. Returns whether the update was
    /// accepted; rejected inputs leave the book untouched.
    pub fn update_top(
        &self,
        bid_price: f64,
        bid_qty: f64,
        ask_price: f64,
        ask_qty: f64,
        ts_ms: u64,
    ) -> bool {
        if !valid_price(bid_price)
            || !valid_price(ask_price)
            || !valid_qty(bid_qty)
            || !valid_qty(ask_qty)
            || bid_price > ask_price
        {
            return false;
        }

        let mut inner = self.inner.lock();
        if inner.top.has_data && ts_ms < inner.top.last_update_ms {
            return false;
        }
        inner.top = TopOfBook {
            bid_price,
            bid_qty,
            ask_price,
            ask_qty,
            last_update_ms: ts_ms,
            has_data: true,
        };
        true
    }

    /// Replaces the full depth ladders. Levels with a non-positive price or
    /// quantity are dropped; the remainder is re-sorted (bids descending,
    /// asks ascending) and the top of book is refreshed from the new heads.
    pub fn apply_snapshot(&self, bids: &[PriceLevel], asks: &[PriceLevel], now_ms: u64) {
        let mut new_bids: Vec<PriceLevel> = bids
            .iter()
            .copied()
            .filter(|l| valid_price(l.price) && valid_qty(l.quantity))
            .collect();
        let mut new_asks: Vec<PriceLevel> = asks
            .iter()
            .copied()
            .filter(|l| valid_price(l.price) && valid_qty(l.quantity))
            .collect();
        sort_ladder(&mut new_bids, &mut new_asks);

        let mut inner = self.inner.lock();
        inner.bids = new_bids;
        inner.asks = new_asks;
        Self::refresh_top(&mut inner, now_ms);
    }

    /// Applies incremental depth changes. Levels are matched by approximate
    /// price equality; a quantity below the removal tolerance deletes the
    /// level, anything else upserts it.
    pub fn apply_delta(&self, bids: &[PriceLevel], asks: &[PriceLevel], now_ms: u64) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        for level in bids {
            Self::upsert(&mut inner.bids, *level);
        }
        for level in asks {
            Self::upsert(&mut inner.asks, *level);
        }
        sort_ladder(&mut inner.bids, &mut inner.asks);
        Self::refresh_top(inner, now_ms);
    }

    fn upsert(ladder: &mut Vec<PriceLevel>, level: PriceLevel) {
        if !valid_price(level.price) || !level.quantity.is_finite() || level.quantity < 0.0 {
            return;
        }
        let existing = ladder
            .iter()
            .position(|l| (l.price - level.price).abs() < LEVEL_EPSILON);
        if level.quantity < LEVEL_EPSILON {
            if let Some(idx) = existing {
                ladder.remove(idx);
            }
        } else {
            match existing {
                Some(idx) => ladder[idx].quantity = level.quantity,
                None => ladder.push(level),
            }
        }
    }

    /// Rebuilds the top of book from the ladder heads, subject to the same
    /// validation and timestamp monotonicity as `update_top`.
    fn refresh_top(inner: &mut BookInner, now_ms: u64) {
        let (Some(best_bid), Some(best_ask)) = (inner.bids.first(), inner.asks.first()) else {
            return;
        };
        if best_bid.price > best_ask.price {
            return;
        }
        if inner.top.has_data && now_ms < inner.top.last_update_ms {
            return;
        }
        inner.top = TopOfBook {
            bid_price: best_bid.price,
            bid_qty: best_bid.quantity,
            ask_price: best_ask.price,
            ask_qty: best_ask.quantity,
            last_update_ms: now_ms,
            has_data: true,
        };
    }

    /// Value copy of the current top of book.
    pub fn snapshot(&self) -> TopOfBook {
        self.inner.lock().top
    }

    /// Up to `n` best levels on one side, best first.
    pub fn top_n(&self, side: Side, n: usize) -> Vec<PriceLevel> {
        let inner = self.inner.lock();
        let ladder = match side {
            Side::Bid => &inner.bids,
            Side::Ask => &inner.asks,
        };
        ladder.iter().take(n).copied().collect()
    }

    /// True when the book has data no older than `max_age_ms` at `now_ms`.
    pub fn is_fresh(&self, max_age_ms: u64, now_ms: u64) -> bool {
        self.snapshot().is_fresh(max_age_ms, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn lv(price: f64, qty: f64) -> PriceLevel {
        PriceLevel::new(price, qty)
    }

    #[test]
    fn starts_empty_and_flips_on_first_accepted_update() {
        let book = OrderBook::new();
        assert!(!book.snapshot().has_data);

        assert!(book.update_top(0.52, 100.0, 0.53, 50.0, 1_000));
        let snap = book.snapshot();
        assert!(snap.has_data);
        assert_eq!(snap.bid_price, 0.52);
        assert_eq!(snap.ask_qty, 50.0);
        assert_eq!(snap.last_update_ms, 1_000);
    }

    #[test]
    fn rejects_invalid_inputs_without_state_change() {
        let book = OrderBook::new();
        assert!(book.update_top(0.52, 100.0, 0.53, 50.0, 1_000));
        let before = book.snapshot();

        assert!(!book.update_top(f64::NAN, 100.0, 0.53, 50.0, 2_000));
        assert!(!book.update_top(0.52, 100.0, f64::INFINITY, 50.0, 2_000));
        assert!(!book.update_top(-0.52, 100.0, 0.53, 50.0, 2_000));
        assert!(!book.update_top(0.0, 100.0, 0.53, 50.0, 2_000));
        assert!(!book.update_top(0.52, 0.0, 0.53, 50.0, 2_000));
        // crossed book
        assert!(!book.update_top(0.54, 100.0, 0.53, 50.0, 2_000));

        assert_eq!(book.snapshot(), before);
    }

    #[test]
    fn rejects_timestamps_older_than_stored() {
        let book = OrderBook::new();
        assert!(book.update_top(0.52, 100.0, 0.53, 50.0, 2_000));
        assert!(!book.update_top(0.50, 100.0, 0.51, 50.0, 1_999));
        assert_eq!(book.snapshot().bid_price, 0.52);

        // equal timestamps are allowed; observed time never decreases
        assert!(book.update_top(0.50, 100.0, 0.51, 50.0, 2_000));
        assert_eq!(book.snapshot().last_update_ms, 2_000);
    }

    #[test]
    fn observed_timestamps_are_monotonic_across_threads() {
        let book = Arc::new(OrderBook::new());

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let book = Arc::clone(&book);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        book.update_top(1.0, 1.0, 2.0, 1.0, w * 10_000 + i);
                    }
                })
            })
            .collect();

        let reader = {
            let book = Arc::clone(&book);
            std::thread::spawn(move || {
                let mut last = 0u64;
                for _ in 0..2_000 {
                    let snap = book.snapshot();
                    if snap.has_data {
                        assert!(snap.last_update_ms >= last);
                        assert!(snap.bid_price <= snap.ask_price);
                        last = snap.last_update_ms;
                    }
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();
    }

    #[test]
    fn snapshot_sorts_and_drops_bad_levels() {
        let book = OrderBook::new();
        book.apply_snapshot(
            &[lv(0.50, 10.0), lv(0.52, 5.0), lv(-1.0, 3.0), lv(0.51, 0.0)],
            &[lv(0.55, 2.0), lv(0.53, 4.0)],
            1_000,
        );

        assert_eq!(book.top_n(Side::Bid, 5), vec![lv(0.52, 5.0), lv(0.50, 10.0)]);
        assert_eq!(book.top_n(Side::Ask, 1), vec![lv(0.53, 4.0)]);

        let snap = book.snapshot();
        assert!(snap.has_data);
        assert_eq!(snap.bid_price, 0.52);
        assert_eq!(snap.ask_price, 0.53);
        assert_eq!(snap.last_update_ms, 1_000);
    }

    #[test]
    fn delta_upserts_and_removes_levels() {
        let book = OrderBook::new();
        book.apply_snapshot(&[lv(0.50, 10.0)], &[lv(0.53, 4.0)], 1_000);

        // upsert an existing level and add a better one
        book.apply_delta(&[lv(0.50, 7.0), lv(0.51, 2.0)], &[], 1_100);
        assert_eq!(book.top_n(Side::Bid, 5), vec![lv(0.51, 2.0), lv(0.50, 7.0)]);

        // zero quantity removes the level at that price
        book.apply_delta(&[lv(0.51, 0.0)], &[], 1_200);
        assert_eq!(book.top_n(Side::Bid, 5), vec![lv(0.50, 7.0)]);

        // removing a level that is not there is a no-op
        book.apply_delta(&[lv(0.49, 0.0)], &[], 1_300);
        assert_eq!(book.top_n(Side::Bid, 5), vec![lv(0.50, 7.0)]);
    }

    #[test]
    fn empty_delta_is_idempotent() {
        let book = OrderBook::new();
        book.apply_snapshot(&[lv(0.50, 10.0)], &[lv(0.53, 4.0)], 1_000);
        let bids = book.top_n(Side::Bid, 5);
        let asks = book.top_n(Side::Ask, 5);

        book.apply_delta(&[], &[], 2_000);
        assert_eq!(book.top_n(Side::Bid, 5), bids);
        assert_eq!(book.top_n(Side::Ask, 5), asks);
    }

    #[test]
    fn freshness_is_inclusive_of_the_limit() {
        let book = OrderBook::new();
        assert!(!book.is_fresh(500, 10_000));

        book.update_top(1.0, 1.0, 2.0, 1.0, 10_000);
        assert!(book.is_fresh(500, 10_500));
        assert!(!book.is_fresh(500, 10_501));
    }
}
