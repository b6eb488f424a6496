//! Weight submission, listing and deletion over HTTP.

use axum::http::StatusCode;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

mod common;
use common::{delete_authed, get_authed, post_weight, test_app, Part};

#[tokio::test]
async fn manual_weight_then_list() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    let (status, body) = app
        .send(post_weight(Some(&token), &[Part::Text("weight", "82.5")]))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["weight"], 82.5);
    assert_eq!(body["method"], "manual");
    assert!(body["id"].is_string());
    assert!(body["timestamp"].as_str().unwrap().contains('T'));

    let (status, list) = app.send(get_authed("/weights", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["weight"], 82.5);
    assert_eq!(list[0]["method"], "manual");
    assert_eq!(list[0]["id"], body["id"]);
}

#[tokio::test]
async fn photo_weight_uses_ocr() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    let (status, body) = app
        .send(post_weight(
            Some(&token),
            &[Part::File("image", "image/jpeg", b"08:05\n 79.3 kg")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["weight"], 79.3);
    assert_eq!(body["method"], "ocr");
}

#[tokio::test]
async fn unreadable_photo_is_extraction_error_and_not_stored() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    let (status, body) = app
        .send(post_weight(
            Some(&token),
            &[Part::File("image", "image/png", b"no reading")],
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "extraction_error");
    assert_eq!(app.store.weight_count().await, 0);
}

#[tokio::test]
async fn both_or_neither_inputs_are_rejected() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    let (status, body) = app
        .send(post_weight(
            Some(&token),
            &[
                Part::Text("weight", "80"),
                Part::File("image", "image/jpeg", b"80"),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = app.send(post_weight(Some(&token), &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // blank weight and an empty file part count as absent
    let (status, _) = app
        .send(post_weight(
            Some(&token),
            &[
                Part::Text("weight", ""),
                Part::File("image", "application/octet-stream", b""),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.weight_count().await, 0);
}

#[tokio::test]
async fn invalid_manual_values_are_rejected() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    for raw in ["abc", "-5", "0", "1000", "NaN", "inf"] {
        let (status, body) = app
            .send(post_weight(Some(&token), &[Part::Text("weight", raw)]))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {raw}: {body}");
    }
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    let (status, _) = app
        .send(post_weight(
            Some(&token),
            &[Part::File("image", "text/plain", b"80")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_requires_auth() {
    let app = test_app();
    let (status, _) = app
        .send(post_weight(None, &[Part::Text("weight", "80")]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.weight_count().await, 0);
}

#[tokio::test]
async fn users_only_see_their_own_entries() {
    let app = test_app();
    let alice = app.login("alice@example.com").await;
    let bob = app.login("bob@example.com").await;

    for w in ["70", "71"] {
        app.send(post_weight(Some(&alice), &[Part::Text("weight", w)]))
            .await;
    }
    app.send(post_weight(Some(&bob), &[Part::Text("weight", "90")]))
        .await;

    let (_, a) = app.send(get_authed("/weights", &alice)).await;
    let a: Vec<f64> = a
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["weight"].as_f64().unwrap())
        .collect();
    assert_eq!(a, vec![70.0, 71.0]);

    let (_, b) = app.send(get_authed("/weights", &bob)).await;
    let b = b.as_array().unwrap();
    assert_eq!(b.len(), 1);
    assert_eq!(b[0]["weight"], 90.0);
}

#[tokio::test]
async fn list_is_ascending_and_range_filtered() {
    let app = test_app();
    let token = app.login("u@example.com").await;

    for w in ["80", "81", "82"] {
        app.send(post_weight(Some(&token), &[Part::Text("weight", w)]))
            .await;
    }

    let (_, all) = app.send(get_authed("/weights", &token)).await;
    let listed: Vec<OffsetDateTime> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|e| OffsetDateTime::parse(e["timestamp"].as_str().unwrap(), &Rfc3339).unwrap())
        .collect();
    assert_eq!(listed.len(), 3);
    assert!(listed.windows(2).all(|w| w[0] <= w[1]));

    let (status, future) = app
        .send(get_authed("/weights?start=2999-01-01T00:00:00Z", &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(future.as_array().unwrap().is_empty());

    let (_, past) = app
        .send(get_authed("/weights?start=2000-01-01&end=2999-01-01", &token))
        .await;
    assert_eq!(past.as_array().unwrap().len(), 3);

    let (status, body) = app
        .send(get_authed("/weights?start=last-week", &token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn delete_own_entry() {
    let app = test_app();
    let token = app.login("u@example.com").await;
    let (_, entry) = app
        .send(post_weight(Some(&token), &[Part::Text("weight", "75")]))
        .await;
    let id = entry["id"].as_str().unwrap();

    let (status, body) = app
        .send(delete_authed(&format!("/weight/{id}"), &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (_, list) = app.send(get_authed("/weights", &token)).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, body) = app
        .send(delete_authed(&format!("/weight/{id}"), &token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn deleting_someone_elses_entry_is_forbidden() {
    let app = test_app();
    let owner = app.login("owner@example.com").await;
    let intruder = app.login("intruder@example.com").await;

    let (_, entry) = app
        .send(post_weight(Some(&owner), &[Part::Text("weight", "66.6")]))
        .await;
    let id = entry["id"].as_str().unwrap();

    let (status, body) = app
        .send(delete_authed(&format!("/weight/{id}"), &intruder))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (_, list) = app.send(get_authed("/weights", &owner)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}
