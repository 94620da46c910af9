use std::collections::HashSet;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cb_types::{validate_username, Actor};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Header naming the acting user. Authentication is expected upstream.
pub const ACTOR_HEADER: &str = "x-actor";

/// Turns the caller's claimed name into an [`Actor`].
#[async_trait]
pub trait ActorSource: Send + Sync {
    async fn identify(&self, claimed: &str) -> ServerResult<Actor>;
}

/// Trusts the header and grants admin rights to a fixed set of names.
#[derive(Clone, Debug, Default)]
pub struct HeaderActorSource {
    admins: HashSet<String>,
}

impl HeaderActorSource {
    pub fn new(admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ActorSource for HeaderActorSource {
    async fn identify(&self, claimed: &str) -> ServerResult<Actor> {
        validate_username(claimed).map_err(|_| ServerError::Unauthenticated)?;
        if self.admins.contains(claimed) {
            Ok(Actor::admin(claimed))
        } else {
            Ok(Actor::user(claimed))
        }
    }
}

/// Extractor for the acting user. Rejects requests without a usable header.
#[derive(Clone, Debug)]
pub struct Acting(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for Acting {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claimed = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ServerError::Unauthenticated)?;
        Ok(Self(state.actors.identify(claimed).await?))
    }
}
