//! Account actions: registration, login, profile, sharing flag

use super::{parse, AppState};
use crate::error::DomainError;
use crate::protocol::{
    EmailParams, LoginParams, RegisterParams, Response, ToggleSharingParams, UserProfile,
    UserSummary,
};
use serde_json::Value;

pub async fn register(state: &AppState, rid: &str, data: Value) -> Response {
    let params: RegisterParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state
        .store
        .register(&params.email, &params.username, &params.password)
        .await
    {
        Ok(user) => Response::success_with(rid, "User registered", &user),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn login(state: &AppState, rid: &str, data: Value) -> Response {
    let params: LoginParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.store.login(&params.email, &params.password).await {
        Ok(user) => Response::success_with(rid, "Login successful", &user),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn get_user(state: &AppState, rid: &str, data: Value) -> Response {
    let params: EmailParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.store.get_by_email(&params.email).await {
        Some(user) => Response::success_with(rid, "User retrieved", UserProfile::from_user(&user)),
        None => Response::error(rid, DomainError::UserNotFound.to_string()),
    }
}

pub async fn update_user(state: &AppState, rid: &str, data: Value) -> Response {
    let params: RegisterParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state
        .store
        .update_user(&params.email, &params.username, &params.password)
        .await
    {
        Ok(user) => Response::success_with(rid, "User updated", &user),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn delete_user(state: &AppState, rid: &str, data: Value) -> Response {
    let params: EmailParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.store.delete_user(&params.email).await {
        Ok(()) => Response::success(rid, "User deleted"),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

pub async fn toggle_sharing(state: &AppState, rid: &str, data: Value) -> Response {
    let params: ToggleSharingParams = match parse(rid, data) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = state
        .store
        .mutate(|store, _| {
            let user = store
                .find_user_mut(&params.email)
                .ok_or(DomainError::UserNotFound)?;
            user.allow_sharing = params.allow_sharing;
            Ok(())
        })
        .await;
    match result {
        Ok(()) => Response::success(rid, "Sharing settings updated"),
        Err(e) => Response::error(rid, e.to_string()),
    }
}

/// Lists users who have sharing enabled; the rest are invisible here.
pub async fn list_users(state: &AppState, rid: &str) -> Response {
    let users = state.store.snapshot_users().await;
    let summaries: Vec<UserSummary> = users
        .iter()
        .filter(|u| u.allow_sharing)
        .map(UserSummary::from_user)
        .collect();
    Response::success_with(rid, "Users retrieved", summaries)
}
