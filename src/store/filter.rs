//! Turns a [`TodoFilter`] into bounded, deterministic list constraints.
//!
//! Nothing here knows about SQL; backends render [`ListQuery`] themselves.
//! Results are always ordered by `id` ascending so pages are stable.

use chrono::NaiveDate;

use crate::todos::model::TodoFilter;

/// Page size used when the requested limit is missing or out of range.
pub const DEFAULT_LIMIT: u64 = 100;

/// Largest page size a caller may ask for.
pub const MAX_LIMIT: u64 = 10_000;

/// A single row constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    DateEq(NaiveDate),
    StatusEq(String),
}

impl Predicate {
    /// Column the predicate applies to.
    pub fn column(&self) -> &'static str {
        match self {
            Self::DateEq(_) => "date",
            Self::StatusEq(_) => "status",
        }
    }
}

/// Normalized list constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub predicates: Vec<Predicate>,
    pub limit: u64,
    pub offset: u64,
}

impl ListQuery {
    pub fn from_filter(filter: &TodoFilter) -> Self {
        let mut predicates = Vec::new();
        if let Some(date) = filter.date {
            predicates.push(Predicate::DateEq(date));
        }
        if let Some(status) = filter.status {
            predicates.push(Predicate::StatusEq(status.as_str().to_string()));
        }

        let page = if filter.page <= 0 { 1 } else { filter.page as u64 };
        let limit = match u64::try_from(filter.limit) {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
            _ => DEFAULT_LIMIT,
        };
        let offset = (page - 1).saturating_mul(limit);

        Self {
            predicates,
            limit,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todos::model::TodoStatus;

    fn paged(page: i64, limit: i64) -> ListQuery {
        ListQuery::from_filter(&TodoFilter {
            page,
            limit,
            ..TodoFilter::default()
        })
    }

    #[test]
    fn empty_filter_is_first_default_page() {
        let q = ListQuery::from_filter(&TodoFilter::default());
        assert!(q.predicates.is_empty());
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
    }

    #[test]
    fn non_positive_page_means_first_page() {
        assert_eq!(paged(0, 10), paged(1, 10));
        assert_eq!(paged(-5, 10), paged(1, 10));
    }

    #[test]
    fn out_of_range_limit_means_default() {
        assert_eq!(paged(1, 0).limit, 100);
        assert_eq!(paged(1, -1).limit, 100);
        assert_eq!(paged(1, 50_000).limit, 100);
        assert_eq!(paged(1, MAX_LIMIT as i64).limit, MAX_LIMIT);
        assert_eq!(paged(1, MAX_LIMIT as i64 + 1).limit, DEFAULT_LIMIT);
        assert_eq!(paged(1, 1).limit, 1);
    }

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        assert_eq!(paged(2, 2).offset, 2);
        assert_eq!(paged(3, 25).offset, 50);
        assert_eq!(paged(2, 0).offset, 100);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let q = paged(i64::MAX, 10_000);
        assert_eq!(q.offset, u64::MAX);
    }

    #[test]
    fn predicates_follow_set_fields() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let q = ListQuery::from_filter(&TodoFilter {
            date: Some(date),
            status: Some(TodoStatus::Completed),
            ..TodoFilter::default()
        });
        assert_eq!(
            q.predicates,
            vec![
                Predicate::DateEq(date),
                Predicate::StatusEq("completed".to_string()),
            ]
        );
        assert_eq!(q.predicates[0].column(), "date");
        assert_eq!(q.predicates[1].column(), "status");
    }
}
