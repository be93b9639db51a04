use std::collections::BTreeMap;

use shared::types::{FeedbackType, Status};

/// Columns the list endpoint accepts in `ordering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    CreatedAt,
    Upvotes,
    Title,
    Status,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::CreatedAt,
        SortField::Upvotes,
        SortField::Title,
        SortField::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Upvotes => "upvotes",
            SortField::Title => "title",
            SortField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// `field` or `-field`.
    pub fn ordering(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.field.as_str().to_string(),
            SortDirection::Descending => format!("-{}", self.field.as_str()),
        }
    }
}

/// Server-side filters; `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    pub status: Option<Status>,
    pub feedback_type: Option<FeedbackType>,
    pub board: Option<i64>,
    pub tag: Option<i64>,
}

/// One filter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Status(Option<Status>),
    FeedbackType(Option<FeedbackType>),
    Board(Option<i64>),
    Tag(Option<i64>),
}

impl Filters {
    pub fn apply(&mut self, filter: Filter) {
        match filter {
            Filter::Status(v) => self.status = v,
            Filter::FeedbackType(v) => self.feedback_type = v,
            Filter::Board(v) => self.board = v,
            Filter::Tag(v) => self.tag = v,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Table view state: page, sort and filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// 0-based.
    pub page_index: u32,
    pub page_size: u32,
    pub sort: Option<Sort>,
    pub filters: Filters,
}

impl QueryState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            sort: None,
            filters: Filters::default(),
        }
    }

    /// Change one filter and go back to the first page.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filters.apply(filter);
        self.page_index = 0;
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.sort = sort;
        self.page_index = 0;
    }

    /// Header click: ascending, then descending, then unsorted. Clicking a
    /// different column starts that column at ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        let next = match self.sort {
            Some(Sort {
                field: current,
                direction: SortDirection::Ascending,
            }) if current == field => Some(Sort::descending(field)),
            Some(Sort {
                field: current,
                direction: SortDirection::Descending,
            }) if current == field => None,
            _ => Some(Sort::ascending(field)),
        };
        self.set_sort(next);
    }

    /// Query parameters, sorted by key. `page` is 1-based on the wire and
    /// `ordering` is omitted when unsorted.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
        params.insert("page", (self.page_index + 1).to_string());
        params.insert("page_size", self.page_size.to_string());
        if let Some(sort) = &self.sort {
            params.insert("ordering", sort.ordering());
        }
        if let Some(status) = self.filters.status {
            params.insert("status", status.as_str().to_string());
        }
        if let Some(feedback_type) = self.filters.feedback_type {
            params.insert("feedback_type", feedback_type.as_str().to_string());
        }
        if let Some(board) = self.filters.board {
            params.insert("board", board.to_string());
        }
        if let Some(tag) = self.filters.tag {
            params.insert("tags", tag.to_string());
        }

        params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }
}
