use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GameResponse, VisibilityResponse};
use super::services;
use crate::{
    auth::AuthUser,
    error::{json_body, AppError},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route(
            "/games/:id",
            get(get_game).patch(update_game).delete(delete_game),
        )
        .route("/games/:id/visibility", patch(set_visibility))
}

/// Malformed ids answer exactly like ids that exist but belong to someone else.
fn record_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

#[instrument(skip(state, payload))]
pub async fn create_game(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<GameResponse>), AppError> {
    let body = json_body(payload)?;
    let game = services::create_game(&state, user_id, &body).await?;
    let location = format!("/games/{}", game.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(game.into()),
    ))
}

#[instrument(skip(state))]
pub async fn list_games(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    let games = services::list_games(&state, user_id).await?;
    Ok(Json(games.into_iter().map(GameResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    let game = services::get_game(&state, user_id, record_id(&id)?).await?;
    Ok(Json(game.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_game(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GameResponse>, AppError> {
    let id = record_id(&id)?;
    let body = json_body(payload)?;
    let game = services::update_game(&state, user_id, id, &body).await?;
    Ok(Json(game.into()))
}

#[instrument(skip(state, payload))]
pub async fn set_visibility(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VisibilityResponse>, AppError> {
    let id = record_id(&id)?;
    let body = json_body(payload)?;
    let is_public = services::set_visibility(&state, user_id, id, &body).await?;
    Ok(Json(VisibilityResponse { is_public }))
}

#[instrument(skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    let game = services::delete_game(&state, user_id, record_id(&id)?).await?;
    Ok(Json(game.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::test_support::{register, send, test_app};

    fn portal() -> Value {
        json!({
            "externalId": 620,
            "title": "Portal 2",
            "category": "puzzle",
            "difficulty": "medium",
            "hoursPlayed": 25,
            "progressPercent": 99
        })
    }

    #[tokio::test]
    async fn requires_bearer_token() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/games", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing Authorization header");

        let (status, _) = send(&app, "GET", "/games", Some("Bearer nonsense"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/games", Some("Token abc"), Some(portal())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let app = test_app();
        let (auth, user_id) = register(&app, "alice").await;

        let (status, created) = send(&app, "POST", "/games", Some(&auth), Some(portal())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["owner"], user_id.as_str());
        assert_eq!(created["isCompleted"], false);
        assert_eq!(created["isPublic"], false);
        assert_eq!(
            created["imageUrl"],
            "https://cdn.cloudflare.steamstatic.com/steam/apps/620/header.jpg"
        );

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = send(&app, "GET", &format!("/games/{id}"), Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
        for (field, expected) in portal().as_object().unwrap() {
            match expected.as_f64() {
                Some(n) => assert_eq!(fetched[field].as_f64(), Some(n), "{field}"),
                None => assert_eq!(&fetched[field], expected, "{field}"),
            }
        }
    }

    #[tokio::test]
    async fn portal_scenario_completion_and_public_projection() {
        let app = test_app();
        let (auth, user_id) = register(&app, "alice").await;
        let (_, created) = send(&app, "POST", "/games", Some(&auth), Some(portal())).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["isCompleted"], false);

        let (status, updated) = send(
            &app,
            "PATCH",
            &format!("/games/{id}"),
            Some(&auth),
            Some(json!({ "progressPercent": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["isCompleted"], true);
        assert_eq!(updated["hoursPlayed"], created["hoursPlayed"]);
        assert_eq!(updated["difficulty"], created["difficulty"]);
        assert_eq!(updated["title"], created["title"]);

        let public_uri = format!("/public/games/{user_id}");
        let (status, before) = send(&app, "GET", &public_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(before, json!([]));

        let (status, vis) = send(
            &app,
            "PATCH",
            &format!("/games/{id}/visibility"),
            Some(&auth),
            Some(json!({ "isPublic": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vis, json!({ "isPublic": true }));

        let (status, public) = send(&app, "GET", &public_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            public,
            json!([{
                "externalId": 620,
                "title": "Portal 2",
                "progressPercent": 100.0,
                "difficulty": "medium",
                "hoursPlayed": 25.0,
                "isCompleted": true,
                "imageUrl": "https://cdn.cloudflare.steamstatic.com/steam/apps/620/header.jpg"
            }])
        );
    }

    #[tokio::test]
    async fn other_users_cannot_touch_records() {
        let app = test_app();
        let (alice, _) = register(&app, "alice").await;
        let (bob, _) = register(&app, "bob").await;
        let (_, created) = send(&app, "POST", "/games", Some(&alice), Some(portal())).await;
        let uri = format!("/games/{}", created["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            "PATCH",
            &uri,
            Some(&bob),
            Some(json!({ "progressPercent": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (missing_status, missing_body) = send(
            &app,
            "PATCH",
            &format!("/games/{}", uuid::Uuid::new_v4()),
            Some(&bob),
            Some(json!({ "progressPercent": 100 })),
        )
        .await;
        assert_eq!((missing_status, missing_body), (status, body));

        let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app,
            "PATCH",
            &format!("{uri}/visibility"),
            Some(&bob),
            Some(json!({ "isPublic": true })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, bobs) = send(&app, "GET", "/games", Some(&bob), None).await;
        assert_eq!(bobs, json!([]));

        let (status, unchanged) = send(&app, "GET", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn missing_difficulty_persists_nothing() {
        let app = test_app();
        let (auth, _) = register(&app, "alice").await;
        let mut body = portal();
        body.as_object_mut().unwrap().remove("difficulty");

        let (status, err) = send(&app, "POST", "/games", Some(&auth), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "validation failed");
        assert_eq!(err["details"][0]["field"], "difficulty");

        let (_, games) = send(&app, "GET", "/games", Some(&auth), None).await;
        assert_eq!(games, json!([]));
    }

    #[tokio::test]
    async fn duplicate_external_id_is_rejected_across_users() {
        let app = test_app();
        let (alice, _) = register(&app, "alice").await;
        let (bob, _) = register(&app, "bob").await;

        let (status, _) = send(&app, "POST", "/games", Some(&alice), Some(portal())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, err) = send(&app, "POST", "/games", Some(&bob), Some(portal())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "externalId 620 already exists");

        let (_, bobs) = send(&app, "GET", "/games", Some(&bob), None).await;
        assert_eq!(bobs, json!([]));
    }

    #[tokio::test]
    async fn list_returns_only_own_records_in_insertion_order() {
        let app = test_app();
        let (alice, _) = register(&app, "alice").await;
        let (bob, _) = register(&app, "bob").await;
        for (auth, ext) in [(&alice, 300), (&bob, 100), (&alice, 200)] {
            let mut body = portal();
            body["externalId"] = json!(ext);
            let (status, _) = send(&app, "POST", "/games", Some(auth), Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, games) = send(&app, "GET", "/games", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = games
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["externalId"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![300, 200]);
    }

    #[tokio::test]
    async fn update_validates_before_touching_the_store() {
        let app = test_app();
        let (auth, _) = register(&app, "alice").await;
        let (_, created) = send(&app, "POST", "/games", Some(&auth), Some(portal())).await;
        let uri = format!("/games/{}", created["id"].as_str().unwrap());

        let (status, err) = send(
            &app,
            "PATCH",
            &uri,
            Some(&auth),
            Some(json!({ "progressPercent": 150, "title": "Portal 3" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["details"].as_array().unwrap().len(), 2);

        let (_, after) = send(&app, "GET", &uri, Some(&auth), None).await;
        assert_eq!(after, created);
    }

    #[tokio::test]
    async fn delete_returns_the_record_then_404s() {
        let app = test_app();
        let (auth, _) = register(&app, "alice").await;
        let (_, created) = send(&app, "POST", "/games", Some(&auth), Some(portal())).await;
        let uri = format!("/games/{}", created["id"].as_str().unwrap());

        let (status, deleted) = send(&app, "DELETE", &uri, Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, created);

        let (status, _) = send(&app, "DELETE", &uri, Some(&auth), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", &uri, Some(&auth), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ids_and_bodies() {
        let app = test_app();
        let (auth, _) = register(&app, "alice").await;

        let (status, _) = send(&app, "GET", "/games/not-a-uuid", Some(&auth), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, err) = send(
            &app,
            "PATCH",
            &format!("/games/{}/visibility", uuid::Uuid::new_v4()),
            Some(&auth),
            Some(json!({ "isPublic": "yes" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["details"][0]["field"], "isPublic");

        let (status, err) = send(&app, "POST", "/games", Some(&auth), Some(json!("portal"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["details"][0]["field"], "body");
    }
}
