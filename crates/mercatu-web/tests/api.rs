//! End-to-end API tests running the real router over in-memory services.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use mercatu_store::seed::DEMO_PASSWORD;
use mercatu_store::DemoData;
use mercatu_web::config::Config;
use mercatu_web::router::build_router;
use mercatu_web::state::AppState;

fn empty_app() -> Router {
    build_router(AppState::new(Config::default()))
}

async fn demo_app() -> (Router, DemoData) {
    let state = AppState::new(Config::default());
    let demo = mercatu_store::demo_seed(state.store.clone()).await.unwrap();
    (build_router(state), demo)
}

/// Fire one request and return (status, body, session cookie if set).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    session: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("session={token}"));
    }
    let request = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("session="))
        .map(|value| value.split(';').next().unwrap_or(value).to_string());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body, cookie)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, _, cookie) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": DEMO_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    cookie.expect("login sets a session cookie")
}

#[tokio::test]
async fn test_ping_is_public_and_unknown_routes_are_json() {
    let app = empty_app();

    let (status, body, _) = send(&app, "GET", "/api/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "pong");

    let (status, body, _) = send(&app, "GET", "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "route not found");
}

#[tokio::test]
async fn test_malformed_input_answers_json() {
    let (app, _) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;
    let carlos = login(&app, "carlos@demo.mercatu.app").await;

    // A body that is not JSON still gets the `{"error": ...}` shape
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("application/json"),
        "got {content_type}"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("JSON"));

    // So does a path id that is not a uuid
    let (status, body, _) = send(&app, "GET", "/api/requests/not-a-uuid", Some(&ana), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // And a query parameter of the wrong type
    let (status, body, _) = send(
        &app,
        "GET",
        "/api/requests/nearby?lat=north&lng=-46.6333",
        Some(&carlos),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_signup_login_me_logout_flow() {
    let app = empty_app();

    let (status, user, cookie) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Beatriz Rocha",
            "email": "bia@example.com",
            "password": "hunter22",
            "type": "client",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["type"], "client");
    assert_eq!(user["email"], "bia@example.com");
    assert!(user.get("passwordHash").is_none());
    let session = cookie.expect("signup sets a session cookie");

    let (status, me, _) = send(&app, "GET", "/api/auth/me", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);

    // Same email again, case-insensitively
    let (status, body, _) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Other",
            "email": "BIA@example.com",
            "password": "hunter22",
            "type": "client",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "bia@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, cleared) = send(&app, "POST", "/api/auth/logout", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared.as_deref(), Some(""));

    // The revoked session no longer resolves
    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some(&session), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = empty_app();

    let cases = [
        json!({ "name": "B", "email": "a@b.co", "password": "123456", "type": "client" }),
        json!({ "name": "Bia", "email": "not-an-email", "password": "123456", "type": "client" }),
        json!({ "name": "Bia", "email": "a@b.co", "password": "123", "type": "client" }),
    ];
    for payload in cases {
        let (status, _, _) = send(&app, "POST", "/api/auth/signup", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, user, _) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Marcos Paz",
            "email": "marcos@example.com",
            "password": "123456",
            "type": "professional",
            "profession": "Pintor",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["profession"], "Pintor");

    // The profession can also be filled in later
    let (status, user, _) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Paula Reis",
            "email": "paula@example.com",
            "password": "123456",
            "type": "professional",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["type"], "professional");
    assert_eq!(user["profession"], "");
}

#[tokio::test]
async fn test_phone_login() {
    let (app, demo) = demo_app().await;

    let (status, user, cookie) = send(
        &app,
        "POST",
        "/api/auth/login-phone",
        None,
        Some(json!({ "phone": "+55 11 98888-1001", "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], demo.client.id.to_string());
    assert!(cookie.is_some());

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/auth/login-phone",
        None,
        Some(json!({ "phone": "+55 11 98888-1001", "code": "000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An unknown number gets a fresh verified client account on the spot
    let (status, provisioned, cookie) = send(
        &app,
        "POST",
        "/api/auth/login-phone",
        None,
        Some(json!({ "phone": "+55 11 90000-0000", "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provisioned["type"], "client");
    assert_eq!(provisioned["name"], "Usuário");
    assert_eq!(provisioned["verified"], true);
    assert!(provisioned["email"]
        .as_str()
        .unwrap()
        .ends_with("@phone.temp"));
    assert!(cookie.is_some());

    // The same number logs back into the same account
    let (_, same, _) = send(
        &app,
        "POST",
        "/api/auth/login-phone",
        None,
        Some(json!({ "phone": "+55 11 90000-0000", "code": "123456" })),
    )
    .await;
    assert_eq!(same["id"], provisioned["id"]);

    // Switched off in config
    let mut config = Config::default();
    config.auth.phone_login_enabled = false;
    let disabled = build_router(AppState::new(config));
    let (status, _, _) = send(
        &disabled,
        "POST",
        "/api/auth/login-phone",
        None,
        Some(json!({ "phone": "+55 11 98888-1001", "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_update_reflects_in_directory() {
    let (app, demo) = demo_app().await;
    let session = login(&app, "carlos@demo.mercatu.app").await;

    let (status, updated, _) = send(
        &app,
        "PUT",
        "/api/auth/profile",
        Some(&session),
        Some(json!({ "hourlyRate": 120.5, "description": "Eletricista residencial" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["hourlyRate"], 120.5);

    let uri = format!("/api/professionals/{}", demo.electrician.id);
    let (status, profile, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["hourlyRate"], 120.5);
    assert_eq!(profile["description"], "Eletricista residencial");
}

#[tokio::test]
async fn test_professionals_directory_filters() {
    let (app, demo) = demo_app().await;

    let (status, body, _) = send(&app, "GET", "/api/professionals", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    // Best rated first
    assert_eq!(
        body["professionals"][0]["id"],
        demo.electrician.id.to_string()
    );

    let (_, body, _) = send(&app, "GET", "/api/professionals?category=encanador", None, None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["professionals"][0]["id"], demo.plumber.id.to_string());

    let (_, body, _) = send(&app, "GET", "/api/professionals?minRating=4.7", None, None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(
        body["professionals"][0]["id"],
        demo.electrician.id.to_string()
    );

    let (_, body, _) = send(&app, "GET", "/api/professionals?q=roberto", None, None).await;
    assert_eq!(body["total"], 1);

    let (_, body, _) = send(&app, "GET", "/api/professionals?limit=1&page=2", None, None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["professionals"].as_array().unwrap().len(), 1);

    // A client id is not a professional
    let uri = format!("/api/professionals/{}", demo.client.id);
    let (status, _, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_crud_and_role_gates() {
    let (app, _) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;
    let carlos = login(&app, "carlos@demo.mercatu.app").await;

    let (status, request, _) = send(
        &app,
        "POST",
        "/api/requests",
        Some(&ana),
        Some(json!({
            "title": "Pintar sala e corredor",
            "description": "Paredes em bom estado, pintura em duas demãos.",
            "category": "pintor",
            "budget": { "min": 800.0, "max": 1200.0, "type": "range" },
            "urgency": "low",
            "location": { "address": "Rua Augusta, 1200", "city": "São Paulo", "state": "SP" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "open");
    assert_eq!(request["budget"]["min"], 800.0);
    assert_eq!(request["location"]["city"], "São Paulo");
    let request_id = request["id"].as_str().unwrap().to_string();

    // Professionals cannot post requests, whatever the payload
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/requests",
        Some(&carlos),
        Some(json!({
            "title": "x",
            "description": "y",
            "category": "pintor",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, list, _) = send(&app, "GET", "/api/requests", Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 3);
    // Newest first
    assert_eq!(list["requests"][0]["id"], request_id);

    let uri = format!("/api/requests/{request_id}");
    let (status, updated, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&ana),
        Some(json!({ "budget": { "min": 950.0, "type": "fixed" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["budget"]["min"], 950.0);
    assert_eq!(updated["budget"]["type"], "fixed");

    // Someone else's request looks like it does not exist
    let (status, _, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&carlos),
        Some(json!({ "budget": { "min": 1.0, "type": "fixed" } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body, _) = send(&app, "DELETE", &uri, Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "request cancelled");

    // Cancelling twice is an illegal move
    let (status, _, _) = send(&app, "DELETE", &uri, Some(&ana), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Cancelled requests reject content edits
    let (status, _, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&ana),
        Some(json!({ "title": "novo título" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_request_validation() {
    let (app, _) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;

    let description = "Uma descrição suficientemente longa para passar.";
    let cases = [
        // Title under 5 characters
        json!({ "title": "Oi", "description": description, "category": "pintor" }),
        // Description under 20 characters
        json!({ "title": "Pintar a sala", "description": "curta", "category": "pintor" }),
        json!({ "title": "Pintar a sala", "description": description, "category": "astronauta" }),
        // Budgets must be positive, and a range needs a max above min
        json!({ "title": "Pintar a sala", "description": description, "category": "pintor",
                "budget": { "min": 0.0, "type": "fixed" } }),
        json!({ "title": "Pintar a sala", "description": description, "category": "pintor",
                "budget": { "min": 500.0, "max": 100.0, "type": "range" } }),
        json!({ "title": "Pintar a sala", "description": description, "category": "pintor",
                "budget": { "min": 100.0, "type": "range" } }),
    ];
    for payload in cases {
        let (status, _, _) = send(&app, "POST", "/api/requests", Some(&ana), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_request_detail_is_for_the_owner_and_professionals() {
    let (app, demo) = demo_app().await;
    let uri = format!("/api/requests/{}", demo.shower_request.id);

    // Any professional may inspect an open request
    let carlos = login(&app, "carlos@demo.mercatu.app").await;
    let (status, body, _) = send(&app, "GET", &uri, Some(&carlos), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proposals"].as_array().unwrap().len(), 1);
    assert_eq!(body["proposals"][0]["professionalRating"], 4.8);

    // The owner sees it too
    let ana = login(&app, "ana@demo.mercatu.app").await;
    let (status, _, _) = send(&app, "GET", &uri, Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);

    // Other clients do not
    let (_, _, other) = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Beatriz Rocha",
            "email": "bia@example.com",
            "password": "hunter22",
            "type": "client",
        })),
    )
    .await;
    let other = other.expect("signup sets a session cookie");
    let (status, _, _) = send(&app, "GET", &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_proposal_lifecycle_keeps_one_winner() {
    let (app, demo) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;
    let carlos = login(&app, "carlos@demo.mercatu.app").await;
    let roberto = login(&app, "roberto@demo.mercatu.app").await;

    let request_id = demo.shower_request.id;
    let proposals_uri = format!("/api/requests/{request_id}/proposals");

    // Clients cannot bid
    let (status, _, _) = send(
        &app,
        "POST",
        &proposals_uri,
        Some(&ana),
        Some(json!({ "message": "eu mesma faço", "price": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // One proposal per professional per request
    let (status, _, _) = send(
        &app,
        "POST",
        &proposals_uri,
        Some(&carlos),
        Some(json!({ "message": "segunda proposta", "price": 100.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, rival, _) = send(
        &app,
        "POST",
        &proposals_uri,
        Some(&roberto),
        Some(json!({ "message": "Também instalo chuveiros", "price": 130.0, "estimatedDuration": "3 horas" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rival["status"], "pending");
    let rival_id = rival["id"].as_str().unwrap().to_string();

    // Deciding is for the request owner; others see a 404
    let decide_uri = format!("/api/requests/{request_id}/proposals/{}", demo.proposal.id);
    let (status, _, _) = send(
        &app,
        "PUT",
        &decide_uri,
        Some(&carlos),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // "pending" is not a decision
    let (status, _, _) = send(
        &app,
        "PUT",
        &decide_uri,
        Some(&ana),
        Some(json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Accepting Carlos rejects Roberto and starts the job
    let (status, request, _) = send(
        &app,
        "PUT",
        &decide_uri,
        Some(&ana),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["status"], "in_progress");
    let proposals = request["proposals"].as_array().unwrap();
    assert_eq!(proposals.len(), 2);
    for proposal in proposals {
        let expected = if proposal["id"] == demo.proposal.id.to_string() {
            "accepted"
        } else {
            "rejected"
        };
        assert_eq!(proposal["status"], expected);
    }

    // The loser cannot be accepted afterwards
    let rival_uri = format!("/api/requests/{request_id}/proposals/{rival_id}");
    let (status, body, _) = send(
        &app,
        "PUT",
        &rival_uri,
        Some(&ana),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already"));

    // Nor decided twice
    let (status, _, _) = send(
        &app,
        "PUT",
        &decide_uri,
        Some(&ana),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Finish the job, then the request takes no further proposals
    let request_uri = format!("/api/requests/{request_id}");
    let (status, done, _) = send(
        &app,
        "PUT",
        &request_uri,
        Some(&ana),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, _, _) = send(
        &app,
        "POST",
        &proposals_uri,
        Some(&roberto),
        Some(json!({ "message": "ainda dá tempo?", "price": 90.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_nearby_feed() {
    let (app, demo) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;
    let carlos = login(&app, "carlos@demo.mercatu.app").await;

    // Clients have no feed
    let (status, _, _) = send(&app, "GET", "/api/requests/nearby", Some(&ana), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // From Praça da Sé both demo requests are within 10 km, nearest first
    let uri = "/api/requests/nearby?lat=-23.5505&lng=-46.6333";
    let (status, body, _) = send(&app, "GET", uri, Some(&carlos), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(
        body["requests"][0]["id"],
        demo.shower_request.id.to_string()
    );
    let first = body["requests"][0]["distanceKm"].as_f64().unwrap();
    let second = body["requests"][1]["distanceKm"].as_f64().unwrap();
    assert!(first < second);

    // Tighter radius drops the far one
    let uri = "/api/requests/nearby?lat=-23.5505&lng=-46.6333&radiusKm=4";
    let (_, body, _) = send(&app, "GET", uri, Some(&carlos), None).await;
    assert_eq!(body["total"], 1);

    let uri = "/api/requests/nearby?lat=-23.5505&lng=-46.6333&category=encanador";
    let (_, body, _) = send(&app, "GET", uri, Some(&carlos), None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["requests"][0]["id"], demo.leak_request.id.to_string());

    // Without a position the whole located feed comes back
    let (_, body, _) = send(&app, "GET", "/api/requests/nearby", Some(&carlos), None).await;
    assert_eq!(body["total"], 2);
    assert!(body["requests"][0].get("distanceKm").is_none());

    // A request without coordinates never enters the feed
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/requests",
        Some(&ana),
        Some(json!({
            "title": "Montar guarda-roupa",
            "description": "Guarda-roupa de seis portas ainda encaixotado.",
            "category": "montador",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body, _) = send(&app, "GET", "/api/requests/nearby", Some(&carlos), None).await;
    assert_eq!(body["total"], 2);

    // lat without lng is malformed
    let (status, _, _) = send(
        &app,
        "GET",
        "/api/requests/nearby?lat=-23.5505",
        Some(&carlos),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_flow() {
    let (app, demo) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;
    let roberto = login(&app, "roberto@demo.mercatu.app").await;
    let carlos = login(&app, "carlos@demo.mercatu.app").await;

    // The seeded thread with Carlos carries one unread for Ana and ends
    // with the photo she sent
    let (status, body, _) = send(&app, "GET", "/api/conversations", Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let seeded = &body["conversations"][0];
    assert_eq!(seeded["participants"].as_array().unwrap().len(), 2);
    let participant = &seeded["participants"][0];
    assert_eq!(participant["userId"], demo.client.id.to_string());
    assert_eq!(participant["userName"], demo.client.name);
    assert!(participant["userAvatar"].is_string());
    assert_eq!(participant["userType"], "client");
    assert_eq!(seeded["lastMessage"]["type"], "image");
    assert_eq!(seeded["unreadCount"][demo.client.id.to_string()], 1);

    // Chatting with yourself is not a thing
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/conversations",
        Some(&ana),
        Some(json!({ "participantId": demo.client.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, thread, _) = send(
        &app,
        "POST",
        "/api/conversations",
        Some(&ana),
        Some(json!({ "participantId": demo.plumber.id, "requestId": demo.leak_request.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(thread["requestTitle"], "Vazamento na pia da cozinha");
    let thread_id = thread["id"].as_str().unwrap().to_string();

    // Opening the same pair and request again returns the same thread
    let (status, again, _) = send(
        &app,
        "POST",
        "/api/conversations",
        Some(&ana),
        Some(json!({ "participantId": demo.plumber.id, "requestId": demo.leak_request.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], thread_id.as_str());

    let messages_uri = format!("/api/conversations/{thread_id}/messages");
    let (status, message, _) = send(
        &app,
        "POST",
        &messages_uri,
        Some(&ana),
        Some(json!({ "content": "Oi Roberto, pode vir amanhã?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["status"], "sent");
    let message_id = message["id"].as_str().unwrap().to_string();

    // Empty messages are rejected
    let (status, _, _) = send(
        &app,
        "POST",
        &messages_uri,
        Some(&ana),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // But an attachment can stand on its own
    let (status, sent, _) = send(
        &app,
        "POST",
        &messages_uri,
        Some(&ana),
        Some(json!({
            "content": "",
            "type": "file",
            "attachments": [{
                "url": "/uploads/orcamento.pdf",
                "name": "orcamento.pdf",
                "type": "application/pdf",
                "size": 10240,
            }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["attachments"][0]["type"], "application/pdf");

    // Outsiders cannot read the thread
    let detail_uri = format!("/api/conversations/{thread_id}");
    let (status, _, _) = send(&app, "GET", &detail_uri, Some(&carlos), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Roberto sees two unread messages
    let (_, body, _) = send(&app, "GET", &detail_uri, Some(&roberto), None).await;
    assert_eq!(body["unreadCount"][demo.plumber.id.to_string()], 2);

    // Delivery only moves forward
    let message_uri = format!("/api/conversations/{thread_id}/messages/{message_id}");
    let (status, advanced, _) = send(
        &app,
        "PUT",
        &message_uri,
        Some(&roberto),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(advanced["status"], "delivered");

    let (status, _, _) = send(
        &app,
        "PUT",
        &message_uri,
        Some(&roberto),
        Some(json!({ "status": "sent" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Reading the thread clears the counter and flips the messages
    let read_uri = format!("/api/conversations/{thread_id}/read");
    let (status, cleared, _) = send(&app, "PUT", &read_uri, Some(&roberto), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["unreadCount"][demo.plumber.id.to_string()], 0);

    let (_, body, _) = send(&app, "GET", &messages_uri, Some(&ana), None).await;
    let all_read = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["status"] == "read");
    assert!(all_read);

    // Only the sender can delete a message
    let (status, _, _) = send(&app, "DELETE", &message_uri, Some(&roberto), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "DELETE", &message_uri, Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body, _) = send(&app, "GET", &messages_uri, Some(&ana), None).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_conversation_targets_must_exist() {
    let (app, demo) = demo_app().await;
    let ana = login(&app, "ana@demo.mercatu.app").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/conversations",
        Some(&ana),
        Some(json!({ "participantId": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/conversations",
        Some(&ana),
        Some(json!({ "participantId": demo.plumber.id, "requestId": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = empty_app();

    let protected = [
        ("GET", "/api/auth/me"),
        ("GET", "/api/requests"),
        ("GET", "/api/requests/nearby"),
        ("GET", "/api/conversations"),
    ];
    for (method, uri) in protected {
        let (status, body, _) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(body["error"].is_string());
    }

    // A made-up token is as good as none
    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_store_counts() {
    let (app, _) = demo_app().await;

    let (status, body, _) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "mercatu-web");
    assert_eq!(body["store"]["users"], 3);
    assert_eq!(body["store"]["requests"], 2);
    assert_eq!(body["store"]["proposals"], 1);
    assert_eq!(body["store"]["messages"], 3);
}
