mod common;

use common::*;
use reqwest::{Client, StatusCode};

async fn staff_client(app: &TestApp) -> Client {
    let (client, id) = app.signed_in("boss").await;
    app.make_staff(id).await;
    client
}

#[tokio::test]
async fn admin_requires_a_staff_account() {
    let app = spawn_app().await;
    assert_redirect(
        &app.get(&client(), "/admin/").await,
        "/auth/login/?next=%2Fadmin%2F",
    );

    let (regular, _) = app.signed_in("regular").await;
    assert_eq!(app.get(&regular, "/admin/").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        app.get(&regular, "/admin/post/").await.status(),
        StatusCode::FORBIDDEN
    );

    let staff = staff_client(&app).await;
    let response = app.get(&staff, "/admin/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    for slug in ["user", "location", "category", "post", "comment"] {
        assert!(body.contains(&format!("<a href=\"/admin/{}/\">", slug)));
    }
    assert_eq!(
        app.get(&staff, "/admin/unicorn/").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn post_list_shows_counts_and_image_placeholders() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    let author = app.user_id("boss").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Listed post", Some(travel), hours_ago(1), true)
        .await;
    app.create_comment(author, post_id, "one", hours_ago(1)).await;
    app.create_comment(author, post_id, "two", hours_ago(1)).await;

    let response = app.get(&staff, "/admin/post/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Listed post"));
    assert!(body.contains("Category travel"));
    assert!(body.contains("Number of comments"));
    assert!(body.contains("No image"));
}

#[tokio::test]
async fn staff_can_add_categories_and_locations() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;

    assert_eq!(
        app.get(&staff, "/admin/category/add/").await.status(),
        StatusCode::OK
    );
    let response = app
        .post_form(
            &staff,
            "/admin/category/add/",
            &[
                ("title", "Travel"),
                ("description", "Trips and journeys"),
                ("slug", "travel"),
                ("is_published", "on"),
            ],
        )
        .await;
    assert_redirect(&response, "/admin/category/");
    assert_eq!(
        app.get(&client(), "/category/travel/").await.status(),
        StatusCode::OK
    );

    let response = app
        .post_form(
            &staff,
            "/admin/category/add/",
            &[
                ("title", "Travel again"),
                ("description", "Duplicate"),
                ("slug", "travel"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Category with this slug already exists."));
    assert_eq!(app.count("categories").await, 1);

    let response = app
        .post_form(
            &staff,
            "/admin/location/add/",
            &[("name", "Lisbon"), ("is_published", "on")],
        )
        .await;
    assert_redirect(&response, "/admin/location/");
    assert_eq!(app.count("locations").await, 1);

    assert_eq!(
        app.get(&staff, "/admin/post/add/").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn unpublishing_a_category_in_the_admin_hides_its_posts() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    let author = app.user_id("boss").await;
    let travel = app.create_category("travel", true).await;
    app.create_post(author, "Trip report", Some(travel), hours_ago(1), true)
        .await;
    assert!(app.get(&client(), "/").await.text().await.unwrap().contains("Trip report"));

    let path = format!("/admin/category/{}/change/", travel);
    let response = app.get(&staff, &path).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains(r#"value="Category travel""#));
    assert!(body.contains("Posts about things"));
    assert!(body.contains(" checked"));

    let response = app
        .post_form(
            &staff,
            &path,
            &[
                ("title", "Travel"),
                ("description", "Trips and journeys"),
                ("slug", "travel"),
            ],
        )
        .await;
    assert_redirect(&response, "/admin/category/");

    let body = app.get(&client(), "/").await.text().await.unwrap();
    assert!(!body.contains("Trip report"));
    assert_eq!(
        app.get(&client(), "/category/travel/").await.status(),
        StatusCode::NOT_FOUND
    );
    let listing = app.get(&staff, "/admin/category/").await.text().await.unwrap();
    assert!(listing.contains(&format!("{}\">Change</a>", path)));
}

#[tokio::test]
async fn changing_a_category_to_a_taken_slug_is_refused() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    app.create_category("travel", true).await;
    let food = app.create_category("food", true).await;

    let response = app
        .post_form(
            &staff,
            &format!("/admin/category/{}/change/", food),
            &[
                ("title", "Food"),
                ("description", "Recipes"),
                ("slug", "travel"),
                ("is_published", "on"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Category with this slug already exists."));
    assert!(body.contains(r#"value="Food""#));
    assert_eq!(
        app.get(&client(), "/category/food/").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn staff_can_unpublish_a_post_and_rename_a_location() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    let author = app.user_id("boss").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Spam offer", Some(travel), hours_ago(1), true)
        .await;

    let response = app
        .post_form(
            &staff,
            &format!("/admin/post/{}/change/", post_id),
            &[("title", "Removed by moderator")],
        )
        .await;
    assert_redirect(&response, "/admin/post/");
    assert_eq!(
        app.post_title(post_id).await.as_deref(),
        Some("Removed by moderator")
    );
    assert!(!app.get(&client(), "/").await.text().await.unwrap().contains("Removed by moderator"));
    assert_eq!(
        app.get(&client(), &format!("/posts/{}/", post_id)).await.status(),
        StatusCode::NOT_FOUND
    );

    let response = app
        .post_form(&staff, &format!("/admin/post/{}/change/", post_id), &[("title", " ")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("This field is required."));

    let lisbon = app.create_location("Lisbon", true).await;
    let response = app
        .post_form(
            &staff,
            &format!("/admin/location/{}/change/", lisbon),
            &[("name", "Porto"), ("is_published", "on")],
        )
        .await;
    assert_redirect(&response, "/admin/location/");
    let listing = app.get(&staff, "/admin/location/").await.text().await.unwrap();
    assert!(listing.contains("Porto"));
    assert!(!listing.contains("Lisbon"));
}

#[tokio::test]
async fn change_pages_exist_only_for_editable_records() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    let boss = app.user_id("boss").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(boss, "Commented", Some(travel), hours_ago(1), true)
        .await;
    let comment = app.create_comment(boss, post_id, "Nice", hours_ago(1)).await;

    for path in [
        format!("/admin/user/{}/change/", boss),
        format!("/admin/comment/{}/change/", comment),
        "/admin/category/999/change/".to_string(),
        "/admin/unicorn/1/change/".to_string(),
    ] {
        assert_eq!(app.get(&staff, &path).await.status(), StatusCode::NOT_FOUND, "{}", path);
    }
    let response = app
        .post_form(
            &staff,
            "/admin/location/999/change/",
            &[("name", "Nowhere"), ("is_published", "on")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.count("locations").await, 0);

    let (regular, _) = app.signed_in("regular").await;
    let response = app
        .post_form(
            &regular,
            &format!("/admin/post/{}/change/", post_id),
            &[("title", "Hijacked")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.post_title(post_id).await.as_deref(), Some("Commented"));
}

#[tokio::test]
async fn deleting_a_category_keeps_its_posts() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    let author = app.user_id("boss").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Orphaned post", Some(travel), hours_ago(1), true)
        .await;

    let response = app
        .post_form(&staff, &format!("/admin/category/{}/delete/", travel), &[])
        .await;
    assert_redirect(&response, "/admin/category/");

    let category: Option<i64> = sqlx::query_scalar("SELECT category_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(category, None);
    let body = app.get(&client(), "/").await.text().await.unwrap();
    assert!(!body.contains("Orphaned post"));

    let response = app
        .post_form(&staff, &format!("/admin/category/{}/delete/", travel), &[])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_user_removes_their_posts_and_comments() {
    let app = spawn_app().await;
    let staff = staff_client(&app).await;
    let boss = app.user_id("boss").await;
    let (_, leaving) = app.signed_in("leaving").await;
    let travel = app.create_category("travel", true).await;
    let their_post = app
        .create_post(leaving, "Going away", Some(travel), hours_ago(1), true)
        .await;
    let boss_post = app
        .create_post(boss, "Staying", Some(travel), hours_ago(1), true)
        .await;
    app.create_comment(boss, their_post, "Bye", hours_ago(1)).await;
    app.create_comment(leaving, boss_post, "See you", hours_ago(1)).await;

    let response = app
        .post_form(&staff, &format!("/admin/user/{}/delete/", leaving), &[])
        .await;
    assert_redirect(&response, "/admin/user/");

    assert_eq!(app.count("users").await, 1);
    assert!(app.post_title(their_post).await.is_none());
    assert!(app.post_title(boss_post).await.is_some());
    assert_eq!(app.count("comments").await, 0);
}

#[tokio::test]
async fn non_staff_cannot_delete_through_the_admin() {
    let app = spawn_app().await;
    let (regular, id) = app.signed_in("regular").await;
    let travel = app.create_category("travel", true).await;
    app.create_post(id, "Safe post", Some(travel), hours_ago(1), true).await;

    let response = app
        .post_form(&regular, &format!("/admin/category/{}/delete/", travel), &[])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.count("categories").await, 1);
}
