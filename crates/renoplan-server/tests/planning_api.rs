//! Projects, bills of materials, product search and vendor administration.

mod common;

use axum::http::StatusCode;
use common::{FakeGateway, TestApp, bom_response, products_response};
use renoplan_core::repo::UserRoleRepository;
use renoplan_types::AppRole;
use serde_json::{Value, json};
use uuid::Uuid;

fn planning_gateway() -> FakeGateway {
    FakeGateway::default()
        .with_tool("create_bill_of_materials", bom_response())
        .with_tool("extract_products", products_response())
        .with_tool(
            "extract_project_info",
            json!({
                "name": "Powder room",
                "timeline_weeks": 3,
                "materials_mentioned": ["Subway tile", "subway tile", "Brass"],
            }),
        )
}

async fn create_project(app: &TestApp, user: Option<Uuid>, name: &str) -> String {
    let (status, project) = app
        .send("POST", "/api/projects", user, Some(json!({"name": name, "budget": 5000})))
        .await;
    assert_eq!(status, StatusCode::OK);
    project["id"].as_str().unwrap().to_string()
}

fn admin(app: &TestApp) -> Option<Uuid> {
    let id = Uuid::new_v4();
    app.store.grant_role(id, AppRole::Admin).unwrap();
    Some(id)
}

#[tokio::test]
async fn test_project_crud() {
    let app = TestApp::new(planning_gateway());
    let user = Some(Uuid::new_v4());

    let (status, _) = app.send("POST", "/api/projects", None, Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("POST", "/api/projects", user, Some(json!({"name": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = create_project(&app, user, "Kitchen").await;

    let (status, updated) = app
        .send(
            "PUT",
            &format!("/api/projects/{}", id),
            user,
            Some(json!({"phase": "in_progress", "description": "Gut and refit"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phase"], "in_progress");
    assert_eq!(updated["name"], "Kitchen");
    assert_eq!(updated["budget"], 5000.0);

    let (status, _) = app
        .send("PUT", &format!("/api/projects/{}", id), user, Some(json!({"budget": -10})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app.send("GET", "/api/projects", user, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["budget"], 5000.0);

    let (status, _) = app
        .send("GET", &format!("/api/projects/{}", id), Some(Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", &format!("/api/projects/{}", id), user, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("GET", &format!("/api/projects/{}", id), user, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_extract_project_info_applies_to_project() {
    let app = TestApp::new(planning_gateway());
    let user = Some(Uuid::new_v4());
    let id = create_project(&app, user, "Untitled").await;

    let messages = json!([{"role": "user", "content": "Subway tile and brass fixtures, three weeks"}]);
    let (status, body) = app
        .send("POST", "/api/extract-project-info", None, Some(json!({"messages": messages})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projectData"]["timeline_weeks"], 3);

    let (status, _) = app
        .send(
            "POST",
            "/api/extract-project-info",
            user,
            Some(json!({"messages": messages, "projectId": id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, project) = app.send("GET", &format!("/api/projects/{}", id), user, None).await;
    assert_eq!(project["name"], "Powder room");
    assert_eq!(project["timeline_weeks"], 3);
    assert_eq!(project["materials_mentioned"], json!(["Subway tile", "Brass"]));
    assert_eq!(project["budget"], 5000.0);
}

#[tokio::test]
async fn test_bom_generation_and_shopping_list() {
    let app = TestApp::new(planning_gateway());
    let user = Some(Uuid::new_v4());
    let project_id = create_project(&app, user, "Powder room").await;

    let (status, generated) = app
        .send("POST", "/api/generate-bom", user, Some(json!({"projectId": project_id})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["totalCost"], 25.0);
    assert_eq!(generated["itemCount"], 2);
    let bom_id = generated["bomId"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            "POST",
            "/api/generate-bom",
            Some(Uuid::new_v4()),
            Some(json!({"projectId": project_id})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, boms) = app
        .send("GET", &format!("/api/projects/{}/boms", project_id), user, None)
        .await;
    assert_eq!(boms.as_array().unwrap().len(), 1);

    let (_, detail) = app.send("GET", &format!("/api/boms/{}", bom_id), user, None).await;
    assert_eq!(detail["status"], "draft");
    assert_eq!(detail["items"][0]["estimated_total_price"], 20.0);
    let item_id = detail["items"][0]["id"].as_str().unwrap().to_string();

    // Vendors are admin-managed.
    let admin = admin(&app);
    let (status, _) = app
        .send(
            "POST",
            "/api/admin/vendors",
            admin,
            Some(json!({"name": "Shop", "search_url_template": "https://shop.example/search?q={query}"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, found) = app
        .send(
            "POST",
            "/api/search-products",
            user,
            Some(json!({"bomItemId": item_id, "searchQuery": "chrome faucet"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["matchCount"], 2);
    let matches = found["matches"].as_array().unwrap();
    assert_eq!(matches[0]["match_score"], 1.0);
    assert_eq!(matches[0]["product_url"], Value::Null);
    assert_eq!(matches[1]["product_url"], "https://shop.example/faucet");

    let (_, listed) = app
        .send("GET", &format!("/api/bom-items/{}/matches", item_id), user, None)
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (_, empty) = app
        .send("GET", &format!("/api/boms/{}/shopping-list", bom_id), user, None)
        .await;
    assert_eq!(empty, json!([]));

    let chosen = matches[1]["id"].as_str().unwrap().to_string();
    let (status, selected) = app
        .send(
            "PUT",
            &format!("/api/product-matches/{}/selection", chosen),
            user,
            Some(json!({"selected": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["selected"], true);

    let (_, list) = app
        .send("GET", &format!("/api/boms/{}/shopping-list", bom_id), user, None)
        .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["product"]["id"], chosen.as_str());
    assert_eq!(list[0]["item"]["name"], "Faucet");

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/product-matches/{}/selection", chosen),
            Some(Uuid::new_v4()),
            Some(json!({"selected": false})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = app
        .send(
            "PUT",
            &format!("/api/boms/{}/status", bom_id),
            user,
            Some(json!({"status": "approved"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
}

#[tokio::test]
async fn test_search_without_vendors_is_empty() {
    let app = TestApp::new(planning_gateway());
    let user = Some(Uuid::new_v4());
    let project_id = create_project(&app, user, "Den").await;
    let (_, generated) = app
        .send("POST", "/api/generate-bom", user, Some(json!({"projectId": project_id})))
        .await;
    let (_, detail) = app
        .send("GET", &format!("/api/boms/{}", generated["bomId"].as_str().unwrap()), user, None)
        .await;

    let (status, found) = app
        .send(
            "POST",
            "/api/search-products",
            user,
            Some(json!({"bomItemId": detail["items"][1]["id"], "searchQuery": "paint"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["matchCount"], 0);
}

#[tokio::test]
async fn test_vendor_admin_requires_role() {
    let app = TestApp::new(planning_gateway());
    let vendor = json!({"name": "Shop", "search_url_template": "https://shop.example/search?q={query}"});

    let (status, _) = app
        .send("POST", "/api/admin/vendors", Some(Uuid::new_v4()), Some(vendor.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin(&app);
    let (status, _) = app
        .send(
            "POST",
            "/api/admin/vendors",
            admin,
            Some(json!({"name": "Bad", "search_url_template": "https://shop.example/search"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = app.send("POST", "/api/admin/vendors", admin, Some(vendor)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .send(
            "PUT",
            &format!("/api/admin/vendors/{}", id),
            admin,
            Some(json!({"name": "Shop", "search_url_template": "https://shop.example/s?q={query}", "active": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);

    let (_, active) = app.send("GET", "/api/vendors", None, None).await;
    assert_eq!(active, json!([]));
    let (_, all) = app.send("GET", "/api/admin/vendors", admin, None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.send("DELETE", &format!("/api/admin/vendors/{}", id), admin, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("DELETE", &format!("/api/admin/vendors/{}", id), admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_grant_and_revoke() {
    let app = TestApp::new(planning_gateway());
    let admin = admin(&app);
    let member = Uuid::new_v4();

    let (status, _) = app
        .send("GET", "/api/admin/vendors", Some(member), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("POST", "/api/admin/roles", admin, Some(json!({"user_id": member, "role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("GET", "/api/admin/vendors", Some(member), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("DELETE", &format!("/api/admin/roles/{}/admin", member), admin, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("GET", "/api/admin/vendors", Some(member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("DELETE", &format!("/api/admin/roles/{}/owner", member), admin, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
