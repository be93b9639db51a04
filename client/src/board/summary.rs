use shared::types::{FeedbackItem, FeedbackType, Status};

/// Dashboard figures for one board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSummary {
    pub total: usize,
    pub total_upvotes: u64,
    /// One entry per status, in column order.
    pub by_status: Vec<(Status, usize)>,
    /// One entry per type, in `FeedbackType::ALL` order.
    pub by_type: Vec<(FeedbackType, usize)>,
    /// Most upvoted item; the first one wins a tie.
    pub top_voted: Option<FeedbackItem>,
}

impl BoardSummary {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a FeedbackItem>) -> Self {
        let mut by_status: Vec<(Status, usize)> = Status::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_type: Vec<(FeedbackType, usize)> =
            FeedbackType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut total = 0;
        let mut total_upvotes = 0u64;
        let mut top_voted: Option<&FeedbackItem> = None;

        for item in items {
            total += 1;
            total_upvotes += u64::from(item.upvote_count);
            if let Some(entry) = by_status.iter_mut().find(|(s, _)| *s == item.status) {
                entry.1 += 1;
            }
            if let Some(entry) = by_type.iter_mut().find(|(t, _)| *t == item.feedback_type) {
                entry.1 += 1;
            }
            if top_voted.is_none_or(|best| item.upvote_count > best.upvote_count) {
                top_voted = Some(item);
            }
        }

        Self {
            total,
            total_upvotes,
            by_status,
            by_type,
            top_voted: top_voted.cloned(),
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }

    pub fn count_type(&self, feedback_type: FeedbackType) -> usize {
        self.by_type
            .iter()
            .find(|(t, _)| *t == feedback_type)
            .map_or(0, |(_, n)| *n)
    }
}
