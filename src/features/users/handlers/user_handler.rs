use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::users::dtos::{CreateUserDto, UserResponseDto};
use crate::features::users::models::NewUser;
use crate::features::users::repositories::{RepositoryError, UserRepository};
use crate::shared::types::ApiResponse;

/// List all users with their attachments
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "All stored users", body = Vec<UserResponseDto>),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(repo): State<Arc<dyn UserRepository>>,
) -> Result<Json<Vec<UserResponseDto>>> {
    let users = repo.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponseDto),
        (status = 400, description = "Id is not an integer"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(repo): State<Arc<dyn UserRepository>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<UserResponseDto>> {
    let user = repo.get_user_by_id(id).await?;
    Ok(Json(user.into()))
}

/// Create a user together with its attachments
///
/// `file_bytes` of each attachment is standard base64.
#[utoipa::path(
    post,
    path = "/create",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Malformed body or invalid base64 payload"),
        (status = 422, description = "User could not be stored")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(repo): State<Arc<dyn UserRepository>>,
    AppJson(dto): AppJson<CreateUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let new_user = NewUser::try_from(dto)?;

    let user = repo.create_user(new_user).await.map_err(|e| match e {
        RepositoryError::Persistence(e) => {
            AppError::Unprocessable(format!("User could not be stored: {}", e))
        }
        other => other.into(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user.into()),
            Some("User created".to_string()),
        )),
    ))
}

/// Delete a user and its attachments
///
/// Succeeds with 204 whether or not the user existed.
#[utoipa::path(
    delete,
    path = "/delete/{id}",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User absent after the call"),
        (status = 400, description = "Id missing or not an integer")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(repo): State<Arc<dyn UserRepository>>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    repo.delete_user_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /delete` without an id
pub async fn delete_user_missing_id() -> AppError {
    AppError::BadRequest("User id is required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::routes::routes;
    use crate::features::users::SqliteUserRepository;
    use crate::shared::test_helpers::{test_pool, RecordingUserRepository};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn sqlite_server() -> TestServer {
        let repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(test_pool().await));
        TestServer::new(routes(repo, 1024 * 1024)).unwrap()
    }

    fn recording_server(repo: Arc<RecordingUserRepository>) -> TestServer {
        TestServer::new(routes(repo, 1024 * 1024)).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let server = sqlite_server().await;

        let created = server
            .post("/create")
            .json(&json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "attachs": [{"file_id": 1, "file_bytes": "aGVsbG8="}]
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let body: Value = created.json();
        assert_eq!(body["success"], json!(true));
        let id = body["data"]["id"].as_i64().unwrap();

        let fetched = server.get(&format!("/user/{}", id)).await;
        fetched.assert_status_ok();
        let user: UserResponseDto = fetched.json();
        assert_eq!(
            format!("{} {}", user.first_name, user.last_name),
            "Ada Lovelace"
        );
        assert_eq!(user.attachs.len(), 1);
        assert_eq!(user.attachs[0].file_id, 1);
        assert_eq!(user.attachs[0].file_bytes, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_list_on_empty_store_is_empty_array() {
        let server = sqlite_server().await;

        let response = server.get("/").await;

        response.assert_status_ok();
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn test_list_includes_attachments() {
        let server = sqlite_server().await;
        for (first, attachs) in [
            ("Ada", json!([{"file_id": 1, "file_bytes": "YQ=="}, {"file_id": 2, "file_bytes": "Yg=="}])),
            ("Grace", json!([])),
        ] {
            server
                .post("/create")
                .json(&json!({"first_name": first, "last_name": "X", "attachs": attachs}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let users: Vec<UserResponseDto> = server.get("/").await.json();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].first_name, "Ada");
        assert_eq!(users[0].attachs.len(), 2);
        assert_eq!(users[1].first_name, "Grace");
        assert!(users[1].attachs.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_404() {
        let server = sqlite_server().await;

        let response = server.get("/user/12345").await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_non_integer_id_never_reaches_repository() {
        let repo = Arc::new(RecordingUserRepository::default());
        let server = recording_server(repo.clone());

        server.get("/user/abc").await.assert_status_bad_request();
        server.delete("/delete/abc").await.assert_status_bad_request();
        server.delete("/delete").await.assert_status_bad_request();
        server.delete("/delete/").await.assert_status_bad_request();

        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_create_bodies_are_400() {
        let repo = Arc::new(RecordingUserRepository::default());
        let server = recording_server(repo.clone());

        let bodies = [
            json!({"last_name": "Lovelace"}),
            json!({"first_name": "Ada", "last_name": ""}),
            json!({"first_name": "Ada", "last_name": "Lovelace", "attachs": [{"file_id": 1}]}),
            json!({"first_name": "Ada", "last_name": "Lovelace", "attachs": [{"file_id": "x", "file_bytes": ""}]}),
            json!({"first_name": "Ada", "last_name": "Lovelace", "attachs": [{"file_id": 1, "file_bytes": "%%%"}]}),
        ];
        for body in bodies {
            server
                .post("/create")
                .json(&body)
                .await
                .assert_status_bad_request();
        }
        server
            .post("/create")
            .text("{not json")
            .content_type("application/json")
            .await
            .assert_status_bad_request();

        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_on_create_is_422() {
        let repo = Arc::new(RecordingUserRepository::failing());
        let server = recording_server(repo.clone());

        server
            .post("/create")
            .json(&json!({"first_name": "Ada", "last_name": "Lovelace"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_is_500() {
        let repo = Arc::new(RecordingUserRepository::failing());
        let server = recording_server(repo);

        server
            .get("/")
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_delete_twice_is_204_both_times() {
        let server = sqlite_server().await;
        let body: Value = server
            .post("/create")
            .json(&json!({"first_name": "Ada", "last_name": "Lovelace"}))
            .await
            .json();
        let id = body["data"]["id"].as_i64().unwrap();

        for _ in 0..2 {
            server
                .delete(&format!("/delete/{}", id))
                .await
                .assert_status(StatusCode::NO_CONTENT);
        }

        server
            .get(&format!("/user/{}", id))
            .await
            .assert_status_not_found();
        server.get("/").await.assert_json(&json!([]));
    }
}
