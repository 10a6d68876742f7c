use super::ItemResult;
use crate::api::{ApiError, Backend};
use crate::expression::{Comparator, DateTimeRange, ExpressionField, QueryComposer};

pub const PROCESSED: &str = "processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Total,
    TopN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBy {
    pub field: &'static str,
    pub sep: Option<&'static str>,
}

type FilterSpec = (&'static str, Comparator, &'static str);

#[derive(Debug, Clone)]
pub struct DashboardItem {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ItemKind,
    filters: &'static [FilterSpec],
    pub group_by: Option<GroupBy>,
}

impl DashboardItem {
    const fn total(key: &'static str, label: &'static str, filters: &'static [FilterSpec]) -> Self {
        Self {
            key,
            label,
            kind: ItemKind::Total,
            filters,
            group_by: None,
        }
    }

    const fn top(
        key: &'static str,
        label: &'static str,
        filters: &'static [FilterSpec],
        group_by: GroupBy,
    ) -> Self {
        Self {
            key,
            label,
            kind: ItemKind::TopN,
            filters,
            group_by: Some(group_by),
        }
    }

    /// Category filters of this item.
    pub fn filters(&self) -> Vec<ExpressionField> {
        self.filters
            .iter()
            .map(|(field, comparator, value)| ExpressionField::new(*field, *comparator, *value))
            .collect()
    }

    pub fn run(
        &self,
        backend: &dyn Backend,
        window: DateTimeRange,
        top_n: usize,
    ) -> Result<ItemResult, ApiError> {
        let composer = QueryComposer::new(window).category(self.filters());
        match (self.kind, self.group_by) {
            (ItemKind::TopN, Some(group)) => {
                let query = composer
                    .group_by(group.field, group.sep.map(String::from))
                    .build();
                Ok(ItemResult::TopN(backend.adv_count(&query, top_n)?))
            }
            _ => Ok(ItemResult::Total(backend.count(&composer.build())?)),
        }
    }
}

const TAG: Comparator = Comparator::RegexInsensitive;

/// The fixed battery shown on the overview.
pub fn default_items() -> Vec<DashboardItem> {
    vec![
        DashboardItem::total(PROCESSED, "Processed", &[]),
        DashboardItem::total(
            "virus",
            "Virus",
            &[("virusresult", Comparator::RegexInsensitive, "INFECTED")],
        ),
        DashboardItem::total("rejected", "Rejected", &[("action", Comparator::Equal, "reject")]),
        DashboardItem::total("spam", "Spam", &[("tags", TAG, "spam")]),
        DashboardItem::total("deferred", "Deferred", &[("tags", TAG, "deferred")]),
        DashboardItem::total("bounced", "Bounced", &[("tags", TAG, "bounced")]),
        DashboardItem::total("greylisted", "Greylisted", &[("tags", TAG, "greylisted")]),
        DashboardItem::top(
            "senders",
            "Top senders",
            &[],
            GroupBy {
                field: "sender",
                sep: None,
            },
        ),
        DashboardItem::top(
            "sender_domains",
            "Top sender domains",
            &[],
            GroupBy {
                field: "sender",
                sep: Some("@"),
            },
        ),
        DashboardItem::top(
            "reject_reasons",
            "Top reject reasons",
            &[("action", Comparator::Equal, "reject")],
            GroupBy {
                field: "rejectreason",
                sep: None,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackend;

    #[test]
    fn test_keys_are_unique() {
        let items = default_items();
        for (i, item) in items.iter().enumerate() {
            assert!(!items[i + 1..].iter().any(|other| other.key == item.key));
        }
    }

    #[test]
    fn test_top_n_sends_group_by_and_limit() {
        let backend = MockBackend::new();
        let items = default_items();
        let domains = items.iter().find(|i| i.key == "sender_domains").unwrap();

        let result = domains
            .run(&backend, DateTimeRange::default(), 5)
            .unwrap();
        assert!(matches!(result, ItemResult::TopN(_)));
        assert_eq!(backend.calls("adv_count"), 1);
        assert_eq!(backend.calls("count"), 0);
    }

    #[test]
    fn test_total_uses_count() {
        let mut backend = MockBackend::new();
        backend.counts.insert("action:reject".into(), 3);
        let items = default_items();
        let rejected = items.iter().find(|i| i.key == "rejected").unwrap();
        assert_eq!(
            rejected.run(&backend, DateTimeRange::default(), 5).unwrap(),
            ItemResult::Total(3)
        );
    }
}
