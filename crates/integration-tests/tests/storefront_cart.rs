//! Integration tests for the cart API.
//!
//! These tests require a running storefront and its collaborators; see
//! the crate docs. Run with: `cargo test -- --ignored`

use medleaf_integration_tests::{session_client, storefront_base_url};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Sign the client's session in with a provider token from the
/// environment, if one is configured.
async fn sign_in(client: &reqwest::Client) -> bool {
    let Ok(token) = std::env::var("TEST_IDENTITY_TOKEN") else {
        return false;
    };
    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}/auth/session"))
        .json(&json!({ "token": token }))
        .send()
        .await
        .expect("Failed to sign in");
    resp.status().is_success()
}

#[tokio::test]
#[ignore = "Requires running storefront and backends"]
async fn test_anonymous_cart_is_empty() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["item_count"], 0);
    assert!(body["items"].as_array().expect("items array").is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront and backends"]
async fn test_anonymous_mutation_is_silent_noop() {
    let client = session_client();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({
            "product_id": "prod-1",
            "name": "Paracetamol 500mg",
            "price": "49.50",
            "image_url": "https://cdn.medleaf.in/p/prod-1.jpg",
            "brand": "Cipla"
        }))
        .send()
        .await
        .expect("Failed to post cart item");

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running storefront, backends, and TEST_IDENTITY_TOKEN"]
async fn test_cart_round_trip() {
    let client = session_client();
    let base_url = storefront_base_url();
    assert!(sign_in(&client).await, "sign-in failed");

    // Add an item; the response reflects the optimistic state.
    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({
            "product_id": "prod-1",
            "name": "Paracetamol 500mg",
            "price": "49.50",
            "image_url": "https://cdn.medleaf.in/p/prod-1.jpg",
            "brand": "Cipla",
            "quantity": 2
        }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["item_count"], 2);

    // Update the quantity.
    let resp = client
        .patch(format!("{base_url}/api/cart/items/prod-1"))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .expect("Failed to update quantity");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["item_count"], 5);

    // Quantity below the floor is rejected without touching the cart.
    let resp = client
        .patch(format!("{base_url}/api/cart/items/prod-1"))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to send update");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Remove the item.
    let resp = client
        .delete(format!("{base_url}/api/cart/items/prod-1"))
        .send()
        .await
        .expect("Failed to remove item");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront, backends, and TEST_IDENTITY_TOKEN"]
async fn test_sign_out_clears_cart_view() {
    let client = session_client();
    let base_url = storefront_base_url();
    assert!(sign_in(&client).await, "sign-in failed");

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["item_count"], 0);
}
