//! Typed calls for each API endpoint.

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::types::{
    AddMemberRequest, Board, Comment, Detail, FeedbackItem, Listing, MoveRequest, MoveResponse,
    NewBoard, NewComment, NewFeedback, NewTag, Page, Status, Tag,
};
use tracing::warn;

use super::RequestGateway;
use super::transport::ApiRequest;
use crate::error::{ClientError, ClientResult};

/// Upper bound on pages walked by the "fetch everything" helpers.
pub const MAX_PAGES: u32 = 200;

pub(crate) fn encode<T: Serialize>(path: impl Into<String>, body: &T) -> ClientResult<ApiRequest> {
    ApiRequest::post(path, body).map_err(|e| ClientError::Encode(e.to_string()))
}

impl RequestGateway {
    // -----------------------------------------------------------------------
    // Boards
    // -----------------------------------------------------------------------

    /// Every board visible to the caller, across all pages.
    pub async fn list_boards(&self) -> ClientResult<Vec<Board>> {
        self.collect_pages("boards/", Vec::new()).await
    }

    pub async fn get_board(&self, board: i64) -> ClientResult<Board> {
        self.call(ApiRequest::get(format!("boards/{}/", board))).await
    }

    pub async fn create_board(&self, board: &NewBoard) -> ClientResult<Board> {
        self.call(encode("boards/", board)?).await
    }

    pub async fn add_board_member(&self, board: i64, username: &str) -> ClientResult<Detail> {
        let body = AddMemberRequest {
            username: username.to_string(),
        };
        self.call(encode(format!("boards/{}/add-member/", board), &body)?)
            .await
    }

    pub async fn delete_board(&self, board: i64) -> ClientResult<()> {
        self.send(ApiRequest::delete(format!("boards/{}/", board)))
            .await
            .map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    /// One page of `/feedback/` for the given query parameters.
    pub async fn query_feedback(&self, query: &[(String, String)]) -> ClientResult<Page<FeedbackItem>> {
        self.call(ApiRequest::get("feedback/").with_query(query.to_vec()))
            .await
    }

    /// Every item on `board`, in server order.
    pub async fn board_feedback(&self, board: i64) -> ClientResult<Vec<FeedbackItem>> {
        self.collect_pages("feedback/", vec![("board".to_string(), board.to_string())])
            .await
    }

    pub async fn create_feedback(&self, item: &NewFeedback) -> ClientResult<FeedbackItem> {
        if item.title.trim().is_empty() {
            return Err(ClientError::InvalidArgument("title must not be empty".into()));
        }
        self.call(encode("feedback/", item)?).await
    }

    /// Toggle the caller's upvote; the server decides the direction.
    pub async fn upvote(&self, item: i64) -> ClientResult<Detail> {
        self.call(ApiRequest::post_empty(format!("feedback/{}/upvote/", item)))
            .await
    }

    pub async fn move_feedback(&self, item: i64, status: Status) -> ClientResult<MoveResponse> {
        self.call(encode(
            format!("feedback/{}/move/", item),
            &MoveRequest { status },
        )?)
        .await
    }

    // -----------------------------------------------------------------------
    // Comments and tags
    // -----------------------------------------------------------------------

    pub async fn list_comments(&self, feedback: i64) -> ClientResult<Vec<Comment>> {
        let listing: Listing<Comment> = self
            .call(
                ApiRequest::get("comments/")
                    .with_query(vec![("feedback".to_string(), feedback.to_string())]),
            )
            .await?;
        Ok(listing.into_vec())
    }

    pub async fn create_comment(&self, feedback: i64, content: &str) -> ClientResult<Comment> {
        if content.trim().is_empty() {
            return Err(ClientError::InvalidArgument("comment must not be empty".into()));
        }
        let body = NewComment {
            feedback,
            content: content.to_string(),
        };
        self.call(encode("comments/", &body)?).await
    }

    pub async fn list_tags(&self) -> ClientResult<Vec<Tag>> {
        let listing: Listing<Tag> = self.call(ApiRequest::get("tags/")).await?;
        Ok(listing.into_vec())
    }

    pub async fn create_tag(&self, name: &str) -> ClientResult<Tag> {
        let body = NewTag {
            name: name.trim().to_string(),
        };
        if body.name.is_empty() {
            return Err(ClientError::InvalidArgument("tag name must not be empty".into()));
        }
        self.call(encode("tags/", &body)?).await
    }

    // -----------------------------------------------------------------------
    // Paging
    // -----------------------------------------------------------------------

    /// Walk `page=1..` until the envelope has no `next` link. A bare array
    /// answer is taken as the whole collection.
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        base_query: Vec<(String, String)>,
    ) -> ClientResult<Vec<T>> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut query = base_query.clone();
            query.push(("page".to_string(), page.to_string()));

            let listing: Listing<T> = self
                .call(ApiRequest::get(path).with_query(query))
                .await?;

            match listing {
                Listing::Bare(all) => return Ok(all),
                Listing::Paged(chunk) => {
                    let done = chunk.next.is_none();
                    items.extend(chunk.results);
                    if done {
                        return Ok(items);
                    }
                }
            }
        }

        warn!("{} has more than {} pages; truncating", path, MAX_PAGES);
        Ok(items)
    }
}
