mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{car_body, expect_status, id_of, spawn_server, unique_plate};

#[tokio::test]
async fn admin_creates_car_for_a_client() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let (client, client_id) = server.register_client("Owner").await?;

    let plate = unique_plate();
    let res = server.post("/cars", &admin, car_body(&plate.to_lowercase(), Some(client_id))).await?;
    let body = expect_status(res, StatusCode::CREATED).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["owner_id"], json!(client_id));
    assert_eq!(body["data"]["license_plate"], json!(plate.to_uppercase()));

    let car_id = id_of(&body["data"])?;
    let res = server.get(&format!("/cars/{}", car_id), &client).await?;
    expect_status(res, StatusCode::OK).await?;
    Ok(())
}

#[tokio::test]
async fn staff_must_name_a_client_owner() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;

    let res = server.post("/cars", &admin, car_body(&unique_plate(), None)).await?;
    let body = expect_status(res, StatusCode::BAD_REQUEST).await?;
    assert!(body["field_errors"].get("owner_id").is_some());
    Ok(())
}

#[tokio::test]
async fn client_sees_only_own_cars() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let (alice, alice_id) = server.register_client("Alice").await?;
    let (_, bob_id) = server.register_client("Bob").await?;

    server.create_car(&admin, alice_id, &unique_plate()).await?;
    server.create_car(&admin, bob_id, &unique_plate()).await?;

    let res = server.get(&format!("/cars?owner_id={}", bob_id), &alice).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    let cars = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0]["owner_id"], json!(alice_id));

    let res = server.get("/cars", &admin).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn client_cannot_touch_foreign_car() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let (_, owner_id) = server.register_client("Owner").await?;
    let (intruder, _) = server.register_client("Intruder").await?;
    let car_id = server.create_car(&admin, owner_id, &unique_plate()).await?;
    let path = format!("/cars/{}", car_id);

    let res = server.put(&path, &intruder, json!({ "mileage": 1 })).await?;
    let body = expect_status(res, StatusCode::FORBIDDEN).await?;
    assert_eq!(body["code"], "FORBIDDEN");

    assert_eq!(server.get(&path, &intruder).await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.delete(&path, &intruder).await?.status(), StatusCode::FORBIDDEN);

    let body = expect_status(server.get(&path, &admin).await?, StatusCode::OK).await?;
    assert_eq!(body["data"]["mileage"], 42000);
    Ok(())
}

#[tokio::test]
async fn owner_updates_and_deletes_own_car() -> Result<()> {
    let server = spawn_server().await?;
    let (client, client_id) = server.register_client("Self").await?;

    let res = server.post("/cars", &client, car_body(&unique_plate(), None)).await?;
    let created = expect_status(res, StatusCode::CREATED).await?;
    assert_eq!(created["data"]["owner_id"], json!(client_id));
    let path = format!("/cars/{}", id_of(&created["data"])?);

    let res = server.put(&path, &client, json!({ "color": "Black", "mileage": 50000 })).await?;
    let updated = expect_status(res, StatusCode::OK).await?;
    assert_eq!(updated["data"]["color"], "Black");
    assert_eq!(updated["data"]["created_at"], created["data"]["created_at"]);
    assert_ne!(updated["data"]["updated_at"], created["data"]["updated_at"]);

    assert_eq!(server.delete(&path, &client).await?.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.delete(&path, &client).await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.get(&path, &client).await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn plate_can_be_reused_after_delete() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let (_, owner_id) = server.register_client("Plates").await?;
    let plate = unique_plate();

    let first = server.create_car(&admin, owner_id, &plate).await?;
    let res = server.post("/cars", &admin, car_body(&plate, Some(owner_id))).await?;
    expect_status(res, StatusCode::CONFLICT).await?;

    let res = server.delete(&format!("/cars/{}", first), &admin).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    server.create_car(&admin, owner_id, &plate).await?;
    Ok(())
}

#[tokio::test]
async fn invalid_car_is_rejected_with_field_errors() -> Result<()> {
    let server = spawn_server().await?;
    let (client, _) = server.register_client("Sloppy").await?;

    let mut body = car_body(&unique_plate(), None);
    body["year"] = json!(1850);
    body["mileage"] = json!(-5);
    let res = server.post("/cars", &client, body).await?;
    let err = expect_status(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(err["code"], "VALIDATION_ERROR");
    assert!(err["field_errors"].get("year").is_some());
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_and_ids_are_bad_requests() -> Result<()> {
    let server = spawn_server().await?;
    let (client, _) = server.register_client("Typo").await?;

    let res = server
        .client
        .post(server.url("/cars"))
        .bearer_auth(&client)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    let body = expect_status(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["error"], true);

    let res = server.get("/cars/not-a-uuid", &client).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn car_repairs_follow_car_visibility() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let (owner, owner_id) = server.register_client("History").await?;
    let (stranger, _) = server.register_client("Stranger").await?;
    let car_id = server.create_car(&admin, owner_id, &unique_plate()).await?;

    for description in ["Oil change", "Brake pads"] {
        let res = server
            .post("/repairs", &admin, json!({ "car_id": car_id, "description": description, "cost": "80.00" }))
            .await?;
        expect_status(res, StatusCode::CREATED).await?;
    }

    let path = format!("/cars/{}/repairs", car_id);
    let body = expect_status(server.get(&path, &owner).await?, StatusCode::OK).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    assert_eq!(server.get(&path, &stranger).await?.status(), StatusCode::FORBIDDEN);
    Ok(())
}
