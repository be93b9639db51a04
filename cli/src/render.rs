//! Plain-text views for the terminal.

use std::fmt::Write;

use client::{BoardSnapshot, BoardSummary, PageView, QueryState};
use shared::types::{AccessClaims, Board, Comment, FeedbackItem, Status, Tag};

pub fn principal(claims: &AccessClaims) -> String {
    let mut out = format!("{} ({})", claims.username, claims.role());
    if claims.is_elevated() {
        out.push_str(", may move items");
    }
    out
}

pub fn boards(boards: &[Board]) -> String {
    let mut out = String::new();
    for board in boards {
        let visibility = if board.is_public { "public" } else { "private" };
        let _ = writeln!(
            out,
            "#{:<4} {:<24} {:<8} {} member(s)",
            board.id,
            board.name,
            visibility,
            board.members.len()
        );
    }
    if boards.is_empty() {
        out.push_str("No boards\n");
    }
    out
}

fn item_line(item: &FeedbackItem) -> String {
    let mut line = format!(
        "#{} [{}] {} (+{})",
        item.id, item.feedback_type, item.title, item.upvote_count
    );
    if !item.tags.is_empty() {
        let names: Vec<&str> = item.tags.iter().map(|t| t.name.as_str()).collect();
        let _ = write!(line, " {{{}}}", names.join(", "));
    }
    line
}

pub fn kanban(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();
    match snapshot.board {
        Some(board) => {
            let _ = writeln!(out, "Board #{}", board);
        }
        None => return "No board selected\n".to_string(),
    }
    for status in Status::ALL {
        let column = snapshot.columns.column(status);
        let _ = writeln!(out, "== {} ({}) ==", status.title(), column.len());
        for item in column {
            let _ = writeln!(out, "  {}", item_line(item));
        }
    }
    if let Some(err) = &snapshot.last_error {
        let _ = writeln!(out, "! {}", err);
    }
    out
}

pub fn table(view: &PageView, state: &QueryState) -> String {
    let mut out = format!(
        "{:<6} {:<12} {:<11} {:>5}  {}\n",
        "ID", "STATUS", "TYPE", "VOTES", "TITLE"
    );
    for item in &view.items {
        let _ = writeln!(
            out,
            "{:<6} {:<12} {:<11} {:>5}  {}",
            item.id,
            item.status.as_str(),
            item.feedback_type.as_str(),
            item.upvote_count,
            item.title
        );
    }
    let page = if view.page_count == 0 {
        0
    } else {
        state.page_index + 1
    };
    let _ = writeln!(
        out,
        "page {}/{}, {} item(s)",
        page, view.page_count, view.total_count
    );
    out
}

pub fn summary(summary: &BoardSummary) -> String {
    let mut out = format!(
        "{} item(s), {} upvote(s)\n",
        summary.total, summary.total_upvotes
    );
    for (status, n) in &summary.by_status {
        let _ = writeln!(out, "  {:<12} {}", status.title(), n);
    }
    for (feedback_type, n) in &summary.by_type {
        let _ = writeln!(out, "  {:<12} {}", feedback_type.as_str(), n);
    }
    if let Some(top) = &summary.top_voted {
        let _ = writeln!(out, "Top voted: {}", item_line(top));
    }
    out
}

pub fn comments(comments: &[Comment]) -> String {
    let mut out = String::new();
    for comment in comments {
        let author = comment
            .created_by
            .as_ref()
            .map_or("anonymous", |u| u.username.as_str());
        let _ = writeln!(out, "{}: {}", author, comment.content);
    }
    if comments.is_empty() {
        out.push_str("No comments\n");
    }
    out
}

pub fn tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| format!("#{} {}\n", t.id, t.name))
        .collect()
}
