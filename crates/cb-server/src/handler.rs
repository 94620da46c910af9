use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use cb_model::{Comment, Community, CommunityUpdate, Post, PostKind, ProfileUpdate, User, VoteTally};
use cb_repo::{ListScope, SortOrder, DEFAULT_LIMIT};
use cb_retention::{load_config, save_config, RetentionConfig, RetentionReport};
use cb_types::Actor;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Acting;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

type Created<T> = (StatusCode, Json<T>);

fn forbidden(actor: &Actor, action: &str) -> ServerError {
    ServerError::Forbidden {
        actor: actor.name.clone(),
        action: action.to_string(),
    }
}

fn require_self_or_admin(actor: &Actor, username: &str, action: &str) -> ServerResult<()> {
    if actor.is(username) || actor.is_admin {
        Ok(())
    } else {
        Err(forbidden(actor, action))
    }
}

/// A user document as returned over HTTP: everything but the password hash.
fn public_user(user: &User) -> ServerResult<Value> {
    let mut value = serde_json::to_value(user).map_err(|e| ServerError::Internal(e.to_string()))?;
    if let Some(fields) = value.as_object_mut() {
        fields.remove("passwordHash");
    }
    Ok(value)
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "cb-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---- Users ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ServerResult<Created<Value>> {
    let user = state.board.create_user(&req.username, &req.password_hash, &req.email).await?;
    Ok((StatusCode::CREATED, Json(public_user(&user)?)))
}

pub async fn get_user(State(state): State<AppState>, Path(username): Path<String>) -> ServerResult<Json<Value>> {
    let user = state.board.get_user(&username).await?;
    Ok(Json(public_user(&user)?))
}

pub async fn update_user_profile(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(username): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ServerResult<Json<Value>> {
    require_self_or_admin(&actor, &username, "edit this profile")?;
    let user = state.board.update_user_profile(&username, &update).await?;
    Ok(Json(public_user(&user)?))
}

pub async fn toggle_saved_post(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path((username, post_id)): Path<(String, String)>,
) -> ServerResult<Json<Value>> {
    require_self_or_admin(&actor, &username, "change saved posts")?;
    let saved = state.board.toggle_saved_post(&username, &post_id).await?;
    Ok(Json(json!({ "postId": post_id, "saved": saved })))
}

// ---- Communities ----

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create_community(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Json(req): Json<CreateCommunityRequest>,
) -> ServerResult<Created<Community>> {
    let community = state.board.create_community(&req.name, &req.description, &actor.name).await?;
    Ok((StatusCode::CREATED, Json(community)))
}

pub async fn get_community(State(state): State<AppState>, Path(name): Path<String>) -> ServerResult<Json<Community>> {
    Ok(Json(state.board.get_community(&name).await?))
}

pub async fn update_community(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(name): Path<String>,
    Json(update): Json<CommunityUpdate>,
) -> ServerResult<Json<Community>> {
    Ok(Json(state.board.update_community(&name, &update, &actor).await?))
}

pub async fn join_community(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(name): Path<String>,
) -> ServerResult<Json<Value>> {
    let member_count = state.board.join_community(&name, &actor.name).await?;
    Ok(Json(json!({ "memberCount": member_count })))
}

pub async fn leave_community(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(name): Path<String>,
) -> ServerResult<Json<Value>> {
    let member_count = state.board.leave_community(&name, &actor.name).await?;
    Ok(Json(json!({ "memberCount": member_count })))
}

// ---- Posts ----

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub community: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: PostKind,
}

pub async fn create_post(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Json(req): Json<CreatePostRequest>,
) -> ServerResult<Created<Post>> {
    let post = state
        .board
        .create_post_with_kind(&req.community, &req.title, &req.content, req.kind, &actor.name)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `all` (default), `community` or `user`.
    pub scope: Option<String>,
    /// Community or username for the narrower scopes.
    pub name: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

impl ListQuery {
    fn scope(&self) -> ServerResult<ListScope> {
        let name = || {
            self.name
                .as_deref()
                .ok_or_else(|| ServerError::BadRequest("this scope needs a name".into()))
        };
        match self.scope.as_deref().unwrap_or("all") {
            "all" => Ok(ListScope::All),
            "community" => Ok(ListScope::community(name()?)),
            "user" => Ok(ListScope::user(name()?)),
            other => Err(ServerError::BadRequest(format!("unknown scope: {other}"))),
        }
    }

    fn sort(&self) -> ServerResult<SortOrder> {
        match &self.sort {
            Some(raw) => raw.parse().map_err(|_| ServerError::BadRequest(format!("unknown sort: {raw}"))),
            None => Ok(SortOrder::New),
        }
    }
}

pub async fn list_posts(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ServerResult<Json<Vec<Post>>> {
    let scope = query.scope()?;
    let sort = query.sort()?;
    let posts = state
        .board
        .list_posts(&scope, sort, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(posts))
}

pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<Post>> {
    Ok(Json(state.board.get_post(&id).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    state.board.soft_delete_post(&id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteMode {
    #[default]
    Set,
    Toggle,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i64,
    #[serde(default)]
    pub mode: VoteMode,
}

pub async fn vote_post(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> ServerResult<Json<VoteTally>> {
    let tally = match req.mode {
        VoteMode::Set => state.board.vote(&id, &actor.name, req.value).await?,
        VoteMode::Toggle => state.board.toggle_vote(&id, &actor.name, req.value).await?,
    };
    Ok(Json(tally))
}

// ---- Comments ----

pub async fn list_comments(State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<Vec<Comment>>> {
    Ok(Json(state.board.list_comments(&id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> ServerResult<Created<Comment>> {
    let comment = state
        .board
        .add_comment(&id, &req.content, &actor.name, req.parent_id.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// ---- Admin ----

pub async fn get_retention_config(State(state): State<AppState>) -> ServerResult<Json<RetentionConfig>> {
    Ok(Json(load_config(state.board.store()).await?))
}

pub async fn set_retention_config(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Json(config): Json<RetentionConfig>,
) -> ServerResult<Json<RetentionConfig>> {
    save_config(state.board.store(), &config, &actor).await?;
    Ok(Json(config))
}

/// Run one retention sweep now with the stored config.
pub async fn run_retention(State(state): State<AppState>, Acting(actor): Acting) -> ServerResult<Json<RetentionReport>> {
    if !actor.is_admin {
        return Err(forbidden(&actor, "run retention"));
    }
    let config = load_config(state.board.store()).await?;
    Ok(Json(state.retention.run(&config).await?))
}
