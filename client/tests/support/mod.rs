#![allow(dead_code)]

//! In-process stand-in for the feedback API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use client::gateway::{ApiRequest, ApiResponse, RequestGateway, Transport, TransportError};
use client::{BoardSyncEngine, SessionStore};
use futures_util::future::BoxFuture;
use http::StatusCode;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use shared::types::{
    Board, Comment, FeedbackItem, FeedbackType, MoveRequest, Status, Tag, TokenPair, UserSummary,
};
use tokio::sync::Semaphore;

static TOKEN_SEQ: AtomicU64 = AtomicU64::new(1);

/// A signed access token; every call yields a distinct token.
pub fn access_token(username: &str, role: &str) -> String {
    let jti = TOKEN_SEQ.fetch_add(1, Ordering::SeqCst);
    encode(
        &Header::default(),
        &json!({
            "token_type": "access",
            "jti": jti.to_string(),
            "user_id": 1,
            "username": username,
            "role": role,
            "is_superuser": false,
        }),
        &EncodingKey::from_secret(b"fake-server-secret"),
    )
    .expect("sign access token")
}

pub fn item(id: i64, status: Status, board: i64) -> FeedbackItem {
    FeedbackItem {
        id,
        title: format!("Item {id}"),
        description: String::new(),
        status,
        feedback_type: FeedbackType::Feature,
        upvote_count: 0,
        tags: Vec::new(),
        board,
        created_by: None,
        created_at: Some(format!("2024-01-{:02}T00:00:00Z", (id % 28) + 1)),
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
}

struct Account {
    id: i64,
    password: String,
    role: String,
}

#[derive(Default)]
struct World {
    accounts: HashMap<String, Account>,
    refresh_tokens: HashMap<String, String>,
    access_tokens: HashMap<String, String>,
    items: Vec<FeedbackItem>,
    boards: Vec<Board>,
    tags: Vec<Tag>,
    comments: Vec<Comment>,
    upvoters: HashSet<(i64, String)>,
    failing_moves: HashSet<i64>,
    garbled: HashSet<String>,
    refresh_broken: bool,
    reject_all_access: bool,
    next_id: i64,
}

impl World {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn role_of(&self, username: &str) -> String {
        self.accounts
            .get(username)
            .map(|a| a.role.clone())
            .unwrap_or_else(|| "contributor".into())
    }

    fn summary_of(&self, username: &str) -> UserSummary {
        UserSummary {
            id: self.accounts.get(username).map_or(0, |a| a.id),
            username: username.to_string(),
            email: String::new(),
            role: self.role_of(username),
        }
    }
}

pub struct FakeServer {
    world: Mutex<World>,
    log: Mutex<Vec<Recorded>>,
    refresh_calls: AtomicUsize,
    refresh_delay: Mutex<Duration>,
    move_gate: Mutex<Option<Arc<Semaphore>>>,
    load_gate: Mutex<Option<Arc<Semaphore>>>,
    blocked_moves: AtomicUsize,
    blocked_loads: AtomicUsize,
    page_size: usize,
}

impl FakeServer {
    /// Users `admin` (admin) and `alice` (contributor), board 1 with items
    /// 42 and 7 open, 8 in progress, 9 completed, board 2 with item 50.
    pub fn new() -> Arc<Self> {
        let server = Self::empty();
        server.add_user("admin", "secret", "admin");
        server.add_user("alice", "secret", "contributor");
        server.add_board(1, "Roadmap");
        server.add_board(2, "Bugs");
        server.add_items(vec![
            item(42, Status::Open, 1),
            item(7, Status::Open, 1),
            item(8, Status::InProgress, 1),
            item(9, Status::Completed, 1),
            item(50, Status::Open, 2),
        ]);
        Arc::new(server)
    }

    pub fn empty() -> Self {
        Self {
            world: Mutex::new(World {
                next_id: 1000,
                ..World::default()
            }),
            log: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay: Mutex::new(Duration::ZERO),
            move_gate: Mutex::new(None),
            load_gate: Mutex::new(None),
            blocked_moves: AtomicUsize::new(0),
            blocked_loads: AtomicUsize::new(0),
            page_size: 10,
        }
    }

    // -----------------------------------------------------------------------
    // Fixture control
    // -----------------------------------------------------------------------

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    pub fn add_user(&self, username: &str, password: &str, role: &str) {
        let mut world = self.world();
        let id = world.next_id();
        world.accounts.insert(
            username.to_string(),
            Account {
                id,
                password: password.to_string(),
                role: role.to_string(),
            },
        );
    }

    pub fn add_board(&self, id: i64, name: &str) {
        self.world().boards.push(Board {
            id,
            name: name.to_string(),
            description: String::new(),
            is_public: true,
            members: Vec::new(),
            created_at: None,
        });
    }

    pub fn add_items(&self, items: Vec<FeedbackItem>) {
        self.world().items.extend(items);
    }

    pub fn remove_items(&self, ids: &[i64]) {
        self.world().items.retain(|i| !ids.contains(&i.id));
    }

    pub fn add_tag(&self, id: i64, name: &str) {
        self.world().tags.push(Tag {
            id,
            name: name.to_string(),
        });
    }

    /// Another principal moving an item.
    pub fn set_status(&self, id: i64, status: Status) {
        if let Some(item) = self.world().items.iter_mut().find(|i| i.id == id) {
            item.status = status;
        }
    }

    pub fn item(&self, id: i64) -> Option<FeedbackItem> {
        self.world().items.iter().find(|i| i.id == id).cloned()
    }

    pub fn fail_moves_of(&self, id: i64) {
        self.world().failing_moves.insert(id);
    }

    pub fn garble(&self, path: &str) {
        self.world().garbled.insert(path.trim_matches('/').to_string());
    }

    /// Issue a token pair, as a login would.
    pub fn issue(&self, username: &str) -> TokenPair {
        let mut world = self.world();
        let role = world.role_of(username);
        let access = access_token(username, &role);
        let refresh = format!("refresh-{}-{}", username, world.next_id());
        world
            .access_tokens
            .insert(access.clone(), username.to_string());
        world
            .refresh_tokens
            .insert(refresh.clone(), username.to_string());
        TokenPair::new(access, refresh)
    }

    /// Every access token issued so far stops working.
    pub fn expire_access_tokens(&self) {
        self.world().access_tokens.clear();
    }

    pub fn break_refresh(&self) {
        self.world().refresh_broken = true;
    }

    pub fn reject_all_access(&self) {
        self.world().reject_all_access = true;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    // -----------------------------------------------------------------------
    // Gates
    // -----------------------------------------------------------------------

    pub fn hold_moves(&self) {
        *self.move_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_moves(&self, n: usize) {
        if let Some(gate) = self.move_gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    pub fn hold_loads(&self) {
        *self.load_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_loads(&self, n: usize) {
        if let Some(gate) = self.load_gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    pub fn open_loads(&self) {
        *self.load_gate.lock().unwrap() = None;
    }

    pub async fn wait_blocked_moves(&self, n: usize) {
        wait_for(&self.blocked_moves, n).await;
    }

    pub async fn wait_blocked_loads(&self, n: usize) {
        wait_for(&self.blocked_loads, n).await;
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        let path = path.trim_matches('/');
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self, method: &str, path: &str) -> Option<Recorded> {
        let path = path.trim_matches('/');
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Request handling
    // -----------------------------------------------------------------------

    async fn handle(&self, req: ApiRequest) -> ApiResponse {
        let path = req.path.trim_matches('/').to_string();
        self.log.lock().unwrap().push(Recorded {
            method: req.method.as_str().to_string(),
            path: path.clone(),
            query: req.query.clone(),
            bearer: req.bearer.clone(),
        });

        if self.world().garbled.contains(&path) {
            return respond(200, json!({"unexpected": true}));
        }

        let segments: Vec<&str> = path.split('/').collect();
        match (req.method.as_str(), segments.as_slice()) {
            ("POST", ["auth", "token"]) => return self.login(&req),
            ("POST", ["auth", "token", "refresh"]) => return self.refresh(&req).await,
            ("POST", ["register"]) => return self.register(&req),
            _ => {}
        }

        let Some(user) = self.authenticate(&req) else {
            return respond(
                401,
                json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
            );
        };

        match (req.method.as_str(), segments.as_slice()) {
            ("GET", ["boards"]) => self.list_boards(&req),
            ("POST", ["boards"]) => self.create_board(&req),
            ("GET", ["boards", id]) => self.get_board(id),
            ("DELETE", ["boards", id]) => self.delete_board(id),
            ("POST", ["boards", id, "add-member"]) => self.add_member(id, &req),
            ("GET", ["feedback"]) => self.list_feedback(&req).await,
            ("POST", ["feedback"]) => self.create_feedback(&req, &user),
            ("POST", ["feedback", id, "upvote"]) => self.upvote(id, &user),
            ("POST", ["feedback", id, "move"]) => self.move_item(id, &req, &user).await,
            ("GET", ["comments"]) => self.list_comments(&req),
            ("POST", ["comments"]) => self.create_comment(&req, &user),
            ("GET", ["tags"]) => self.list_tags(),
            ("POST", ["tags"]) => self.create_tag(&req),
            _ => respond(404, json!({"detail": "Not found."})),
        }
    }

    fn authenticate(&self, req: &ApiRequest) -> Option<String> {
        let world = self.world();
        if world.reject_all_access {
            return None;
        }
        let bearer = req.bearer.as_ref()?;
        world.access_tokens.get(bearer).cloned()
    }

    fn login(&self, req: &ApiRequest) -> ApiResponse {
        let body = body_json(req);
        let username = body["username"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default();

        let known = self
            .world()
            .accounts
            .get(&username)
            .is_some_and(|a| a.password == password);
        if !known {
            return respond(
                401,
                json!({"detail": "No active account found with the given credentials"}),
            );
        }

        let pair = self.issue(&username);
        respond(200, json!({"access": pair.access, "refresh": pair.refresh}))
    }

    async fn refresh(&self, req: &ApiRequest) -> ApiResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let body = body_json(req);
        let refresh = body["refresh"].as_str().unwrap_or_default().to_string();

        let mut world = self.world();
        let username = match world.refresh_tokens.get(&refresh) {
            Some(username) if !world.refresh_broken => username.clone(),
            _ => {
                return respond(
                    401,
                    json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
                );
            }
        };
        let role = world.role_of(&username);
        let access = access_token(&username, &role);
        world.access_tokens.insert(access.clone(), username);
        respond(200, json!({"access": access}))
    }

    fn register(&self, req: &ApiRequest) -> ApiResponse {
        let body = body_json(req);
        let username = body["username"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default().to_string();

        let mut errors = serde_json::Map::new();
        if username.is_empty() {
            errors.insert("username".into(), json!(["This field may not be blank."]));
        } else if self.world().accounts.contains_key(&username) {
            errors.insert(
                "username".into(),
                json!(["A user with that username already exists."]),
            );
        }
        if password.len() < 8 {
            errors.insert(
                "password".into(),
                json!(["Ensure this field has at least 8 characters."]),
            );
        }
        if !errors.is_empty() {
            return respond(400, Value::Object(errors));
        }

        self.add_user(&username, &password, "contributor");
        let world = self.world();
        let mut user = world.summary_of(&username);
        user.email = body["email"].as_str().unwrap_or_default().to_string();
        respond(201, serde_json::to_value(user).unwrap())
    }

    fn list_boards(&self, req: &ApiRequest) -> ApiResponse {
        let boards: Vec<Value> = self
            .world()
            .boards
            .iter()
            .map(|b| serde_json::to_value(b).unwrap())
            .collect();
        paginate(req, "boards", boards, 100)
    }

    fn create_board(&self, req: &ApiRequest) -> ApiResponse {
        let body = body_json(req);
        let name = body["name"].as_str().unwrap_or_default().to_string();
        if name.trim().is_empty() {
            return respond(400, json!({"name": ["This field may not be blank."]}));
        }
        let mut world = self.world();
        let board = Board {
            id: world.next_id(),
            name,
            description: body["description"].as_str().unwrap_or_default().to_string(),
            is_public: body["is_public"].as_bool().unwrap_or(true),
            members: Vec::new(),
            created_at: None,
        };
        world.boards.push(board.clone());
        respond(201, serde_json::to_value(board).unwrap())
    }

    fn get_board(&self, id: &str) -> ApiResponse {
        let id: i64 = id.parse().unwrap_or(-1);
        match self.world().boards.iter().find(|b| b.id == id) {
            Some(board) => respond(200, serde_json::to_value(board).unwrap()),
            None => respond(404, json!({"detail": "No Board matches the given query."})),
        }
    }

    fn delete_board(&self, id: &str) -> ApiResponse {
        let id: i64 = id.parse().unwrap_or(-1);
        let mut world = self.world();
        let before = world.boards.len();
        world.boards.retain(|b| b.id != id);
        if world.boards.len() == before {
            return respond(404, json!({"detail": "No Board matches the given query."}));
        }
        ApiResponse::new(StatusCode::NO_CONTENT, Vec::new())
    }

    fn add_member(&self, id: &str, req: &ApiRequest) -> ApiResponse {
        let id: i64 = id.parse().unwrap_or(-1);
        let username = body_json(req)["username"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let mut world = self.world();
        if !world.accounts.contains_key(&username) {
            return respond(404, json!({"detail": "User not found."}));
        }
        let member = world.summary_of(&username);
        match world.boards.iter_mut().find(|b| b.id == id) {
            Some(board) => {
                board.members.push(member);
                respond(200, json!({"detail": "User added to board."}))
            }
            None => respond(404, json!({"detail": "No Board matches the given query."})),
        }
    }

    async fn list_feedback(&self, req: &ApiRequest) -> ApiResponse {
        // Answer with the data as it was when the request arrived.
        let mut items: Vec<FeedbackItem> = {
            let world = self.world();
            world
                .items
                .iter()
                .filter(|i| {
                    req.query_param("board")
                        .is_none_or(|b| b == i.board.to_string())
                })
                .filter(|i| req.query_param("status").is_none_or(|s| s == i.status.as_str()))
                .filter(|i| {
                    req.query_param("feedback_type")
                        .is_none_or(|t| t == i.feedback_type.as_str())
                })
                .filter(|i| {
                    req.query_param("tags")
                        .is_none_or(|t| i.tags.iter().any(|tag| tag.id.to_string() == t))
                })
                .cloned()
                .collect()
        };

        match req.query_param("ordering") {
            Some("title") => items.sort_by(|a, b| a.title.cmp(&b.title)),
            Some("-title") => items.sort_by(|a, b| b.title.cmp(&a.title)),
            Some("upvotes") => items.sort_by_key(|i| i.upvote_count),
            Some("-upvotes") => items.sort_by_key(|i| std::cmp::Reverse(i.upvote_count)),
            Some("created_at") => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Some("-created_at") => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Some("status") => items.sort_by_key(|i| i.status),
            Some("-status") => items.sort_by_key(|i| std::cmp::Reverse(i.status)),
            _ => {}
        }

        let gate = self.load_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.blocked_loads.fetch_add(1, Ordering::SeqCst);
            let permit = gate.acquire_owned().await;
            self.blocked_loads.fetch_sub(1, Ordering::SeqCst);
            if let Ok(permit) = permit {
                permit.forget();
            }
        }

        let values = items
            .into_iter()
            .map(|i| serde_json::to_value(i).unwrap())
            .collect();
        paginate(req, "feedback", values, self.page_size)
    }

    fn create_feedback(&self, req: &ApiRequest, user: &str) -> ApiResponse {
        let body = body_json(req);
        let title = body["title"].as_str().unwrap_or_default().to_string();
        if title.trim().is_empty() {
            return respond(400, json!({"title": ["This field may not be blank."]}));
        }
        let feedback_type: FeedbackType =
            serde_json::from_value(body["feedback_type"].clone()).unwrap_or(FeedbackType::Feature);

        let mut world = self.world();
        let mut tags = Vec::new();
        for id in body["tag_ids"].as_array().into_iter().flatten() {
            if let Some(tag) = world.tags.iter().find(|t| Some(t.id) == id.as_i64()) {
                tags.push(tag.clone());
            }
        }
        for name in body["tag_names"].as_array().into_iter().flatten() {
            let name = name.as_str().unwrap_or_default().trim().to_string();
            if name.is_empty() {
                continue;
            }
            let existing = world.tags.iter().find(|t| t.matches_name(&name)).cloned();
            let tag = match existing {
                Some(tag) => tag,
                None => {
                    let tag = Tag {
                        id: world.next_id(),
                        name,
                    };
                    world.tags.push(tag.clone());
                    tag
                }
            };
            tags.push(tag);
        }

        let created = FeedbackItem {
            id: world.next_id(),
            title,
            description: body["description"].as_str().unwrap_or_default().to_string(),
            status: Status::Open,
            feedback_type,
            upvote_count: 0,
            tags,
            board: body["board"].as_i64().unwrap_or_default(),
            created_by: Some(world.summary_of(user)),
            created_at: None,
        };
        world.items.push(created.clone());
        respond(201, serde_json::to_value(created).unwrap())
    }

    fn upvote(&self, id: &str, user: &str) -> ApiResponse {
        let id: i64 = id.parse().unwrap_or(-1);
        let mut world = self.world();
        let key = (id, user.to_string());
        let removing = world.upvoters.contains(&key);
        let Some(item) = world.items.iter_mut().find(|i| i.id == id) else {
            return respond(404, json!({"detail": "Not found."}));
        };
        if removing {
            item.upvote_count = item.upvote_count.saturating_sub(1);
            world.upvoters.remove(&key);
            respond(200, json!({"detail": "Upvote removed."}))
        } else {
            item.upvote_count += 1;
            world.upvoters.insert(key);
            respond(200, json!({"detail": "Upvoted."}))
        }
    }

    async fn move_item(&self, id: &str, req: &ApiRequest, user: &str) -> ApiResponse {
        let gate = self.move_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.blocked_moves.fetch_add(1, Ordering::SeqCst);
            let permit = gate.acquire_owned().await;
            self.blocked_moves.fetch_sub(1, Ordering::SeqCst);
            if let Ok(permit) = permit {
                permit.forget();
            }
        }

        let id: i64 = id.parse().unwrap_or(-1);
        let mut world = self.world();
        if world.role_of(user) != "admin" {
            return respond(403, json!({"detail": "Only admins can move feedbacks."}));
        }
        if world.failing_moves.contains(&id) {
            return respond(400, json!({"status": ["Transition rejected."]}));
        }
        let Ok(body) = serde_json::from_value::<MoveRequest>(body_json(req)) else {
            return respond(400, json!({"status": ["Invalid status."]}));
        };
        match world.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.status = body.status;
                respond(
                    200,
                    json!({"detail": "Feedback moved.", "new_status": body.status}),
                )
            }
            None => respond(404, json!({"detail": "Not found."})),
        }
    }

    fn list_comments(&self, req: &ApiRequest) -> ApiResponse {
        let comments = self
            .world()
            .comments
            .iter()
            .filter(|c| {
                req.query_param("feedback")
                    .is_none_or(|f| f == c.feedback.to_string())
            })
            .map(|c| serde_json::to_value(c).unwrap())
            .collect();
        paginate(req, "comments", comments, 100)
    }

    fn create_comment(&self, req: &ApiRequest, user: &str) -> ApiResponse {
        let body = body_json(req);
        let mut world = self.world();
        let comment = Comment {
            id: world.next_id(),
            content: body["content"].as_str().unwrap_or_default().to_string(),
            feedback: body["feedback"].as_i64().unwrap_or_default(),
            created_by: Some(world.summary_of(user)),
            created_at: None,
        };
        world.comments.push(comment.clone());
        respond(201, serde_json::to_value(comment).unwrap())
    }

    fn list_tags(&self) -> ApiResponse {
        respond(200, serde_json::to_value(&self.world().tags).unwrap())
    }

    fn create_tag(&self, req: &ApiRequest) -> ApiResponse {
        let name = body_json(req)["name"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();
        let mut world = self.world();
        if world.tags.iter().any(|t| t.matches_name(&name)) {
            return respond(400, json!({"name": ["tag with this name already exists."]}));
        }
        let tag = Tag {
            id: world.next_id(),
            name,
        };
        world.tags.push(tag.clone());
        respond(201, serde_json::to_value(tag).unwrap())
    }
}

impl Transport for FakeServer {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        Box::pin(async move { Ok(self.handle(request).await) })
    }
}

/// A transport whose every call fails at the network level.
pub struct Unreachable;

impl Transport for Unreachable {
    fn send(&self, _request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        Box::pin(async { Err(TransportError::Connect("connection refused".into())) })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn respond(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(
        StatusCode::from_u16(status).unwrap(),
        serde_json::to_vec(&body).unwrap(),
    )
}

fn body_json(req: &ApiRequest) -> Value {
    req.body
        .as_deref()
        .and_then(|b| serde_json::from_slice(b).ok())
        .unwrap_or(Value::Null)
}

fn paginate(req: &ApiRequest, path: &str, all: Vec<Value>, default_size: usize) -> ApiResponse {
    let size = req
        .query_param("page_size")
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default_size);
    let page = req
        .query_param("page")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1);

    let total = all.len();
    let pages = total.div_ceil(size).max(1);
    if page == 0 || page > pages {
        return respond(404, json!({"detail": "Invalid page."}));
    }

    let results: Vec<Value> = all.into_iter().skip((page - 1) * size).take(size).collect();
    let link = |p: usize| format!("http://testserver/api/{}/?page={}", path, p);
    let next = (page < pages).then(|| link(page + 1));
    let previous = (page > 1).then(|| link(page - 1));
    respond(
        200,
        json!({
            "count": total,
            "next": next,
            "previous": previous,
            "results": results,
        }),
    )
}

async fn wait_for(counter: &AtomicUsize, n: usize) {
    for _ in 0..10_000 {
        if counter.load(Ordering::SeqCst) >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} blocked requests, saw {}", n, counter.load(Ordering::SeqCst));
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub server: Arc<FakeServer>,
    pub session: SessionStore,
    pub gateway: RequestGateway,
}

impl Harness {
    pub fn new() -> Self {
        let server = FakeServer::new();
        let session = SessionStore::in_memory();
        let gateway = RequestGateway::new(server.clone(), session.clone());
        Self {
            server,
            session,
            gateway,
        }
    }

    /// Establish a session for `username` directly, skipping the login call.
    pub fn sign_in(&self, username: &str) -> TokenPair {
        let pair = self.server.issue(username);
        self.session
            .establish(pair.access.clone(), pair.refresh.clone())
            .unwrap();
        pair
    }

    pub fn engine(&self) -> BoardSyncEngine {
        BoardSyncEngine::new(self.gateway.clone(), Duration::from_secs(15))
    }
}
