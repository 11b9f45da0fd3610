use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use staya_api::{app, AppState, AuthConfig};
use staya_core::{Role, User};

fn test_state() -> AppState {
    AppState::in_memory(
        AuthConfig {
            secret: "integration-secret".to_string(),
            expiration: 3600,
        },
        1_000,
        900,
    )
    .unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn registration(email: &str, phone: &str, role: &str) -> Value {
    json!({
        "firstName": "Amina",
        "lastName": "Bello",
        "email": email,
        "phone": phone,
        "password": "secret123",
        "role": role
    })
}

async fn register(app: &Router, email: &str, phone: &str, role: &str) -> String {
    let (status, body) = send(app, Method::POST, "/api/auth/register", None, Some(registration(email, phone, role))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn admin_token(state: &AppState, app: &Router) -> String {
    let request = serde_json::from_value(registration("root@staya.ng", "09011112222", "vendor")).unwrap();
    let mut admin = User::register(request, Utc::now()).unwrap();
    admin.role = Role::Admin;
    state.users.create_user(&admin).await.unwrap();

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "root@staya.ng", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn hotel_payload(rooms: u32) -> Value {
    json!({
        "name": "Mambilla Plateau Lodge",
        "description": "Highland retreat with tea estate views",
        "address": "1 Gembu Road",
        "city": "Gembu",
        "pricePerNight": 30000.0,
        "rating": 4.5,
        "location": { "latitude": 6.7, "longitude": 11.25 },
        "rooms": [{
            "name": "Deluxe Double",
            "description": "Two guests, balcony",
            "type": "double",
            "capacity": 2,
            "pricePerNight": 30000.0,
            "totalRooms": rooms,
            "availableRooms": rooms
        }]
    })
}

fn route_payload() -> Value {
    json!({
        "operatorName": "Jalingo Express",
        "from": "Jalingo",
        "to": "Abuja",
        "departureTime": "07:30",
        "arrivalTime": "15:45",
        "duration": "8h 15m",
        "price": 12000.0,
        "busType": "luxury",
        "totalSeats": 12,
        "availableSeats": 12,
        "seatLayout": { "rows": 4, "seatsPerRow": 3 }
    })
}

fn guest() -> Value {
    json!({
        "firstName": "Amina",
        "lastName": "Bello",
        "email": "amina@example.com",
        "phone": "08012345678"
    })
}

fn days_from_now(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).format("%Y-%m-%d").to_string()
}

fn is_reference(value: &str, prefix: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == 3
        && parts[0] == prefix
        && !parts[1].is_empty()
        && parts[1].chars().all(|c| c.is_ascii_digit())
        && parts[2].len() == 9
        && parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

async fn create_hotel(app: &Router, token: &str, rooms: u32) -> (String, String) {
    let (status, body) = send(app, Method::POST, "/api/hotels", Some(token), Some(hotel_payload(rooms))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["data"]["id"].as_str().unwrap().to_string(),
        body["data"]["rooms"][0]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = app(test_state());

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["environment"], "development");

    let (status, body) = send(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not found - /nowhere");
}

#[tokio::test]
async fn test_register_and_duplicate() {
    let app = app(test_state());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("Amina@Example.com", "08012345678", "customer")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["data"]["email"], "amina@example.com");
    assert_eq!(body["data"]["role"], "customer");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());

    // Same phone, different email.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("other@example.com", "08012345678", "customer")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists with this email or phone number");
}

#[tokio::test]
async fn test_registration_validation_lists_every_field() {
    let app = app(test_state());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "firstName": "A",
            "lastName": "B",
            "email": "not-an-email",
            "phone": "12345",
            "password": "123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "phone"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("boss@example.com", "08099998888", "admin")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Role admin cannot be self-assigned");
}

#[tokio::test]
async fn test_login_does_not_reveal_accounts() {
    let app = app(test_state());
    register(&app, "amina@example.com", "08012345678", "customer").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "amina@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = send(&app, Method::POST, "/api/auth/login", None, Some(json!({ "email": "amina@example.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide an email and password");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "AMINA@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["firstName"], "Amina");
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = app(test_state());
    let token = register(&app, "amina@example.com", "08012345678", "customer").await;

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authorized to access this route");

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "amina@example.com");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_password_reset_and_change() {
    let app = app(test_state());
    register(&app, "amina@example.com", "08012345678", "customer").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/forgotpassword",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/forgotpassword",
        None,
        Some(json!({ "email": "amina@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = body["data"]["resetCode"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let wrong = if code == "000000" { "111111" } else { "000000" };
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/auth/resetpassword",
        None,
        Some(json!({ "email": "amina@example.com", "resetCode": wrong, "password": "brandnew1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset code");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/auth/resetpassword",
        None,
        Some(json!({ "email": "amina@example.com", "resetCode": code, "password": "brandnew1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    // The code is single use.
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/auth/resetpassword",
        None,
        Some(json!({ "email": "amina@example.com", "resetCode": code, "password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/auth/updatepassword",
        Some(&token),
        Some(json!({ "currentPassword": "secret123", "newPassword": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Password is incorrect");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/auth/updatepassword",
        Some(&token),
        Some(json!({ "currentPassword": "brandnew1", "newPassword": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "amina@example.com", "password": "another1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_details_enforces_unique_phone() {
    let app = app(test_state());
    register(&app, "first@example.com", "08011111111", "customer").await;
    let token = register(&app, "second@example.com", "08022222222", "customer").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/auth/updatedetails",
        Some(&token),
        Some(json!({ "phone": "08011111111" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate field value entered");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/auth/updatedetails",
        Some(&token),
        Some(json!({ "firstName": "Zainab" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["firstName"], "Zainab");
}

#[tokio::test]
async fn test_hotel_roles_and_ownership() {
    let app = app(test_state());
    let customer = register(&app, "guest@example.com", "08012345678", "customer").await;
    let owner = register(&app, "owner@example.com", "08023456789", "vendor").await;
    let rival = register(&app, "rival@example.com", "08034567890", "vendor").await;

    let (status, body) = send(&app, Method::POST, "/api/hotels", Some(&customer), Some(hotel_payload(3))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "User role customer is not authorized to access this route");

    let (status, _) = send(&app, Method::POST, "/api/hotels", None, Some(hotel_payload(3))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (hotel_id, _) = create_hotel(&app, &owner, 3).await;
    let uri = format!("/api/hotels/{}", hotel_id);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&rival), Some(json!({ "rating": 3.0 }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authorized to update this hotel");

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&rival), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authorized to delete this hotel");

    let (status, body) = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "rating": 6.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating must be between 1 and 5");

    let (status, body) = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "rating": 3.5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 3.5);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "Taraba State");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Hotel not found");

    let (status, body) = send(&app, Method::GET, "/api/hotels/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");
}

#[tokio::test]
async fn test_hotel_listing_filters_and_pages() {
    let app = app(test_state());
    let owner = register(&app, "owner@example.com", "08023456789", "vendor").await;
    for _ in 0..3 {
        create_hotel(&app, &owner, 2).await;
    }
    let mut lagos = hotel_payload(2);
    lagos["city"] = json!("Lagos");
    lagos["rating"] = json!(5.0);
    let (status, _) = send(&app, Method::POST, "/api/hotels", Some(&owner), Some(lagos)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/hotels?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["pages"], 2);
    assert_eq!(body["data"][0]["city"], "Lagos");

    let (_, body) = send(&app, Method::GET, "/api/hotels?city=gem&minPrice=1000", None, None).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (_, body) = send(&app, Method::GET, "/api/hotels?rating=4.8", None, None).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_route_seat_invariant() {
    let app = app(test_state());
    let vendor = register(&app, "coach@example.com", "08023456789", "vendor").await;

    let mut payload = route_payload();
    payload["availableSeats"] = json!(20);
    let (status, body) = send(&app, Method::POST, "/api/travel", Some(&vendor), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Available seats cannot exceed total seats");

    let (status, body) = send(&app, Method::POST, "/api/travel", Some(&vendor), Some(route_payload())).await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/travel/{}", body["data"]["id"].as_str().unwrap());

    // Catalog edits never move seat inventory.
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&vendor),
        Some(json!({ "price": 13500.0, "availableSeats": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 13500.0);
    assert_eq!(body["data"]["availableSeats"], 12);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&vendor), Some(json!({ "departureTime": "25:00" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "departureTime");

    let (_, body) = send(&app, Method::GET, "/api/travel?from=jalin&to=abu", None, None).await;
    assert_eq!(body["pagination"]["total"], 1);
    let (_, body) = send(&app, Method::GET, "/api/travel?from=kano", None, None).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_hotel_booking_rules_and_last_room() {
    let app = app(test_state());
    let vendor = register(&app, "owner@example.com", "08023456789", "vendor").await;
    let customer = register(&app, "guest@example.com", "08012345678", "customer").await;
    let (hotel_id, room_id) = create_hotel(&app, &vendor, 1).await;

    let booking = |check_in: i64, check_out: i64| {
        json!({
            "hotelId": hotel_id,
            "roomId": room_id,
            "checkInDate": days_from_now(check_in),
            "checkOutDate": days_from_now(check_out),
            "guests": 2,
            "guestDetails": guest()
        })
    };

    let (status, body) = send(&app, Method::POST, "/api/bookings/hotel", Some(&customer), Some(booking(5, 5))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Check-out date must be after check-in date");

    let (status, body) = send(&app, Method::POST, "/api/bookings/hotel", Some(&customer), Some(booking(-2, 3))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Check-in date cannot be in the past");

    let (status, body) = send(&app, Method::POST, "/api/bookings/hotel", Some(&customer), Some(booking(3, 6))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(is_reference(body["data"]["bookingReference"].as_str().unwrap(), "HTL"));
    assert_eq!(body["data"]["totalAmount"], 90000.0);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["paymentStatus"], "pending");

    let (status, _) = send(&app, Method::POST, "/api/bookings/hotel", Some(&customer), Some(booking(10, 11))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, Method::GET, &format!("/api/hotels/{}", hotel_id), None, None).await;
    assert_eq!(body["data"]["rooms"][0]["availableRooms"], 0);
}

#[tokio::test]
async fn test_payment_then_cancel_refunds_and_releases() {
    let app = app(test_state());
    let vendor = register(&app, "owner@example.com", "08023456789", "vendor").await;
    let customer = register(&app, "guest@example.com", "08012345678", "customer").await;
    let stranger = register(&app, "other@example.com", "08034567890", "customer").await;
    let (hotel_id, room_id) = create_hotel(&app, &vendor, 1).await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/bookings/hotel",
        Some(&customer),
        Some(json!({
            "hotelId": hotel_id,
            "roomId": room_id,
            "checkInDate": days_from_now(1),
            "checkOutDate": days_from_now(2),
            "guests": 1,
            "guestDetails": guest()
        })),
    )
    .await;
    let reference = body["data"]["bookingReference"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&stranger),
        Some(json!({ "bookingReference": reference })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&customer),
        Some(json!({ "bookingReference": reference, "paymentMethod": "card_visa" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "confirmed");
    assert_eq!(body["data"]["paymentStatus"], "paid");
    assert!(body["data"]["paymentId"].as_str().unwrap().starts_with("pay_"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&customer),
        Some(json!({ "bookingReference": reference })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This booking is not awaiting payment");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/bookings/{}/cancel", reference),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["paymentStatus"], "refunded");

    let (_, body) = send(&app, Method::GET, &format!("/api/hotels/{}", hotel_id), None, None).await;
    assert_eq!(body["data"]["rooms"][0]["availableRooms"], 1);

    let (status, body) = send(&app, Method::GET, &format!("/api/bookings/{}", reference), Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "hotel");

    let (status, _) = send(&app, Method::GET, "/api/bookings/HTL-1-NOPE", Some(&customer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_declined_payment_is_recorded() {
    let app = app(test_state());
    let vendor = register(&app, "owner@example.com", "08023456789", "vendor").await;
    let customer = register(&app, "guest@example.com", "08012345678", "customer").await;
    let (hotel_id, room_id) = create_hotel(&app, &vendor, 2).await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/bookings/hotel",
        Some(&customer),
        Some(json!({
            "hotelId": hotel_id,
            "roomId": room_id,
            "checkInDate": days_from_now(1),
            "checkOutDate": days_from_now(3),
            "guests": 1,
            "guestDetails": guest()
        })),
    )
    .await;
    let reference = body["data"]["bookingReference"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&customer),
        Some(json!({ "bookingReference": reference, "paymentMethod": "decline_card" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, Method::GET, &format!("/api/bookings/{}", reference), Some(&customer), None).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["paymentStatus"], "failed");
}

#[tokio::test]
async fn test_travel_booking_claims_seats() {
    let app = app(test_state());
    let vendor = register(&app, "coach@example.com", "08023456789", "vendor").await;
    let customer = register(&app, "rider@example.com", "08012345678", "customer").await;

    let (_, body) = send(&app, Method::POST, "/api/travel", Some(&vendor), Some(route_payload())).await;
    let route_id = body["data"]["id"].as_str().unwrap().to_string();

    let trip = |seats: Value, passengers: Value| {
        json!({
            "routeId": route_id,
            "travelDate": days_from_now(2),
            "passengers": passengers.as_array().map(|p| p.len()).unwrap_or(0),
            "seatNumbers": seats,
            "passengerDetails": passengers
        })
    };

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/bookings/travel",
        Some(&customer),
        Some(trip(json!(["1A"]), json!([guest(), guest()]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Number of seats must match number of passengers");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/bookings/travel",
        Some(&customer),
        Some(trip(json!(["1a", "1B"]), json!([guest(), guest()]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(is_reference(body["data"]["bookingReference"].as_str().unwrap(), "TRV"));
    assert_eq!(body["data"]["totalAmount"], 24000.0);
    assert_eq!(body["data"]["seatNumbers"], json!(["1A", "1B"]));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings/travel",
        Some(&customer),
        Some(trip(json!(["1B"]), json!([guest()]))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, &format!("/api/travel/{}/seats", route_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["availableSeats"], 10);
    let bookable = body["data"]["bookable"].as_array().unwrap();
    assert!(!bookable.contains(&json!("1A")));
    assert!(bookable.contains(&json!("1C")));

    let (_, body) = send(&app, Method::GET, "/api/bookings", Some(&customer), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["kind"], "travel");
}

#[tokio::test]
async fn test_admin_surfaces() {
    let state = test_state();
    let app = app(state.clone());
    let customer = register(&app, "guest@example.com", "08012345678", "customer").await;
    let admin = admin_token(&state, &app).await;

    let (status, body) = send(&app, Method::GET, "/api/admin", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "User role customer is not authorized to access this route");

    let (status, body) = send(&app, Method::GET, "/api/admin", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"], 2);
    assert_eq!(body["data"]["hotels"], 0);

    let (status, body) = send(&app, Method::GET, "/api/users?limit=1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["pagination"]["total"], 2);

    // Admins manage any hotel.
    let vendor = register(&app, "owner@example.com", "08023456789", "vendor").await;
    let (hotel_id, _) = create_hotel(&app, &vendor, 1).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/hotels/{}", hotel_id),
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/hotels", None, None).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = app(test_state());
    send(&app, Method::GET, "/health", None, None).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("staya_http_requests_total"));
}

async fn get_from(app: &Router, uri: &str, client: [u8; 4]) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from((client, 40000))))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_rate_limit_per_client_address() {
    let state = AppState::in_memory(
        AuthConfig {
            secret: "integration-secret".to_string(),
            expiration: 3600,
        },
        2,
        900,
    )
    .unwrap();
    let app = app(state);

    for _ in 0..2 {
        let (status, _) = get_from(&app, "/api/hotels", [10, 0, 0, 1]).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get_from(&app, "/api/hotels", [10, 0, 0, 1]).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too many requests from this IP, please try again later.");

    // Other clients and the health check are unaffected.
    let (status, _) = get_from(&app, "/api/hotels", [10, 0, 0, 2]).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_from(&app, "/health", [10, 0, 0, 1]).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let metrics = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(metrics.contains("staya_rate_limited_total 1"));
}
