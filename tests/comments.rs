mod common;

use common::*;
use reqwest::StatusCode;

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let app = spawn_app().await;
    let (_, author) = app.signed_in("author").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Talked about", Some(travel), hours_ago(10), true)
        .await;
    app.create_comment(author, post_id, "Second comment", hours_ago(1)).await;
    app.create_comment(author, post_id, "First comment", hours_ago(5)).await;

    let body = app
        .get(&client(), &format!("/posts/{}/", post_id))
        .await
        .text()
        .await
        .unwrap();
    let first = body.find("First comment").expect("first comment shown");
    let second = body.find("Second comment").expect("second comment shown");
    assert!(first < second);

    let index = app.get(&client(), "/").await.text().await.unwrap();
    assert!(index.contains("Comments (2)"));
}

#[tokio::test]
async fn logged_in_users_can_comment() {
    let app = spawn_app().await;
    let (_, author) = app.signed_in("author").await;
    let (reader_client, _) = app.signed_in("reader").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Open for comments", Some(travel), hours_ago(1), true)
        .await;
    let path = format!("/posts/{}/comment/", post_id);

    let response = app.post_form(&client(), &path, &[("text", "Drive-by")]).await;
    assert_redirect(
        &response,
        &format!("/auth/login/?next=%2Fposts%2F{}%2Fcomment%2F", post_id),
    );
    assert_eq!(app.count("comments").await, 0);

    let response = app
        .post_form(&reader_client, &path, &[("text", "Nice post")])
        .await;
    assert_redirect(&response, &format!("/posts/{}/", post_id));
    assert_eq!(app.count("comments").await, 1);

    let response = app.post_form(&reader_client, &path, &[("text", "   ")]).await;
    assert_redirect(&response, &format!("/posts/{}/", post_id));
    assert_eq!(app.count("comments").await, 1);

    let body = app
        .get(&reader_client, &format!("/posts/{}/", post_id))
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Nice post"));
}

#[tokio::test]
async fn hidden_posts_cannot_be_commented_by_others() {
    let app = spawn_app().await;
    let (author_client, author) = app.signed_in("author").await;
    let (reader_client, _) = app.signed_in("reader").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Draft", Some(travel), hours_ago(1), false)
        .await;
    let path = format!("/posts/{}/comment/", post_id);

    let response = app.post_form(&reader_client, &path, &[("text", "Peek")]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post_form(&author_client, &path, &[("text", "Note to self")]).await;
    assert_redirect(&response, &format!("/posts/{}/", post_id));
    assert_eq!(app.count("comments").await, 1);
}

#[tokio::test]
async fn only_the_comment_author_can_edit_or_delete_it() {
    let app = spawn_app().await;
    let (author_client, author) = app.signed_in("author").await;
    let (intruder_client, _) = app.signed_in("intruder").await;
    let travel = app.create_category("travel", true).await;
    let post_id = app
        .create_post(author, "Commented", Some(travel), hours_ago(2), true)
        .await;
    let comment_id = app
        .create_comment(author, post_id, "Original words", hours_ago(1))
        .await;
    let detail = format!("/posts/{}/", post_id);
    let edit = format!("/posts/{}/edit_comment/{}/", post_id, comment_id);
    let delete = format!("/posts/{}/delete_comment/{}/", post_id, comment_id);

    assert_redirect(&app.get(&intruder_client, &edit).await, &detail);
    let response = app
        .post_form(&intruder_client, &edit, &[("text", "Defaced")])
        .await;
    assert_redirect(&response, &detail);
    assert_redirect(&app.post_form(&intruder_client, &delete, &[]).await, &detail);
    assert_eq!(
        app.comment_text(comment_id).await.as_deref(),
        Some("Original words")
    );

    let response = app.get(&author_client, &edit).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Original words"));
    let response = app
        .post_form(&author_client, &edit, &[("text", "Better words")])
        .await;
    assert_redirect(&response, &detail);
    assert_eq!(
        app.comment_text(comment_id).await.as_deref(),
        Some("Better words")
    );

    let response = app.get(&author_client, &delete).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Delete comment"));
    assert_redirect(&app.post_form(&author_client, &delete, &[]).await, &detail);
    assert!(app.comment_text(comment_id).await.is_none());
}

#[tokio::test]
async fn comment_must_belong_to_the_post_in_the_path() {
    let app = spawn_app().await;
    let (author_client, author) = app.signed_in("author").await;
    let travel = app.create_category("travel", true).await;
    let first = app
        .create_post(author, "First", Some(travel), hours_ago(2), true)
        .await;
    let second = app
        .create_post(author, "Second", Some(travel), hours_ago(2), true)
        .await;
    let comment_id = app.create_comment(author, first, "On the first", hours_ago(1)).await;

    let response = app
        .get(
            &author_client,
            &format!("/posts/{}/edit_comment/{}/", second, comment_id),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
