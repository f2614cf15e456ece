//! List ordering for questions and answers.
//!
//! Both orders are descending over a composite key and always end with the
//! row id, so the order is total and page boundaries do not shift between
//! requests.

use std::cmp::Ordering;

use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

/// Ordering policy for question and answer lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Newest first, then by vote total.
    #[default]
    New,
    /// Highest vote total first, then newest.
    Hot,
}

/// One column of the composite sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    Votes,
    CreationDate,
    Id,
}

/// The values a list row is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey<'a> {
    pub votes: i64,
    pub creation_date: DateTimeWithTimeZone,
    pub id: &'a str,
}

impl ListOrder {
    /// Parse the `sort` query parameter. Anything other than `hot` is "new".
    #[must_use]
    pub fn from_query(sort: Option<&str>) -> Self {
        match sort {
            Some(s) if s.eq_ignore_ascii_case("hot") => Self::Hot,
            _ => Self::New,
        }
    }

    /// Sort columns from most to least significant, all descending.
    const fn keys(self) -> [SortKey; 3] {
        match self {
            Self::Hot => [SortKey::Votes, SortKey::CreationDate, SortKey::Id],
            Self::New => [SortKey::CreationDate, SortKey::Votes, SortKey::Id],
        }
    }

    /// SQL `ORDER BY` body for a query whose vote total is selected as `votes`
    /// and whose target table is aliased `alias`.
    #[must_use]
    pub fn order_by_clause(self, alias: &str) -> String {
        self.keys()
            .iter()
            .map(|key| match key {
                SortKey::Votes => "votes DESC".to_string(),
                SortKey::CreationDate => format!("{alias}.creation_date DESC"),
                SortKey::Id => format!("{alias}.id DESC"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// In-memory equivalent of [`order_by_clause`](Self::order_by_clause).
    /// `Ordering::Less` means `a` is listed before `b`.
    #[must_use]
    pub fn compare(self, a: &RankKey<'_>, b: &RankKey<'_>) -> Ordering {
        self.keys().iter().fold(Ordering::Equal, |acc, key| {
            acc.then_with(|| match key {
                SortKey::Votes => b.votes.cmp(&a.votes),
                SortKey::CreationDate => b.creation_date.cmp(&a.creation_date),
                SortKey::Id => b.id.cmp(a.id),
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn key(votes: i64, secs: i64, id: &str) -> RankKey<'_> {
        RankKey {
            votes,
            creation_date: Utc.timestamp_opt(secs, 0).unwrap().fixed_offset(),
            id,
        }
    }

    #[test]
    fn test_from_query() {
        assert_eq!(ListOrder::from_query(Some("hot")), ListOrder::Hot);
        assert_eq!(ListOrder::from_query(Some("HOT")), ListOrder::Hot);
        assert_eq!(ListOrder::from_query(Some("new")), ListOrder::New);
        assert_eq!(ListOrder::from_query(Some("whatever")), ListOrder::New);
        assert_eq!(ListOrder::from_query(None), ListOrder::New);
    }

    #[test]
    fn test_order_by_clause() {
        assert_eq!(
            ListOrder::Hot.order_by_clause("q"),
            "votes DESC, q.creation_date DESC, q.id DESC"
        );
        assert_eq!(
            ListOrder::New.order_by_clause("a"),
            "a.creation_date DESC, votes DESC, a.id DESC"
        );
    }

    #[test]
    fn test_hot_prefers_votes_then_date() {
        let older_popular = key(5, 100, "a");
        let newer_unpopular = key(1, 200, "b");
        let newer_equal = key(5, 200, "c");

        assert_eq!(
            ListOrder::Hot.compare(&older_popular, &newer_unpopular),
            Ordering::Less
        );
        assert_eq!(
            ListOrder::Hot.compare(&newer_equal, &older_popular),
            Ordering::Less
        );
    }

    #[test]
    fn test_new_prefers_date_then_votes() {
        let older_popular = key(5, 100, "a");
        let newer_unpopular = key(1, 200, "b");
        let same_time_popular = key(9, 200, "c");

        assert_eq!(
            ListOrder::New.compare(&newer_unpopular, &older_popular),
            Ordering::Less
        );
        assert_eq!(
            ListOrder::New.compare(&same_time_popular, &newer_unpopular),
            Ordering::Less
        );
    }

    #[test]
    fn test_id_breaks_full_ties() {
        let a = key(0, 100, "01a");
        let b = key(0, 100, "01b");

        assert_eq!(ListOrder::Hot.compare(&b, &a), Ordering::Less);
        assert_eq!(ListOrder::New.compare(&b, &a), Ordering::Less);
        assert_eq!(ListOrder::Hot.compare(&a, &a), Ordering::Equal);
    }

    fn arb_key() -> impl Strategy<Value = (i64, i64, String)> {
        (-3i64..3, 0i64..4, "[a-c]{1,2}")
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(
            (v1, t1, i1) in arb_key(),
            (v2, t2, i2) in arb_key(),
            hot in any::<bool>(),
        ) {
            let order = if hot { ListOrder::Hot } else { ListOrder::New };
            let a = key(v1, t1, &i1);
            let b = key(v2, t2, &i2);
            prop_assert_eq!(order.compare(&a, &b), order.compare(&b, &a).reverse());
            prop_assert_eq!(order.compare(&a, &b) == Ordering::Equal, a == b);
        }

        #[test]
        fn prop_compare_is_transitive(
            (v1, t1, i1) in arb_key(),
            (v2, t2, i2) in arb_key(),
            (v3, t3, i3) in arb_key(),
            hot in any::<bool>(),
        ) {
            let order = if hot { ListOrder::Hot } else { ListOrder::New };
            let a = key(v1, t1, &i1);
            let b = key(v2, t2, &i2);
            let c = key(v3, t3, &i3);
            if order.compare(&a, &b) != Ordering::Greater
                && order.compare(&b, &c) != Ordering::Greater
            {
                prop_assert_ne!(order.compare(&a, &c), Ordering::Greater);
            }
        }

        #[test]
        fn prop_sorted_list_is_deterministic(
            keys in prop::collection::vec(arb_key(), 0..12),
            hot in any::<bool>(),
        ) {
            let order = if hot { ListOrder::Hot } else { ListOrder::New };
            let mut forward: Vec<_> = keys.iter().map(|(v, t, i)| key(*v, *t, i)).collect();
            let mut backward: Vec<_> = forward.iter().rev().copied().collect();
            forward.sort_by(|a, b| order.compare(a, b));
            backward.sort_by(|a, b| order.compare(a, b));
            prop_assert_eq!(forward, backward);
        }
    }
}
