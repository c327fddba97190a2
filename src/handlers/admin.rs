use std::sync::Arc;

use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::{
    admin::{bind_fields, ModelAdmin},
    authentication::StaffUser,
    data_formats::{AdminForm, FieldErrors},
    errors::RequestError,
    models::User,
    templates::base_context,
    AppState,
};

use super::render;

fn registered<'a>(state: &'a AppState, model: &str) -> Result<&'a dyn ModelAdmin, RequestError> {
    state.admin.get(model).ok_or(RequestError::NotFound)
}

pub async fn admin_index(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
) -> Result<Response, RequestError> {
    let mut context = base_context(Some(&user));
    context.insert("models", &state.admin.models());
    render(&state, "admin/index.html", &context)
}

pub async fn admin_model_list(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path(model): Path<String>,
) -> Result<Response, RequestError> {
    let admin = registered(&state, &model)?;
    let rows = admin.rows(&state.pool).await?;

    let mut context = base_context(Some(&user));
    context.insert("slug", admin.slug());
    context.insert("title", admin.title());
    context.insert("can_add", &admin.can_add());
    context.insert("can_change", &admin.can_change());
    context.insert("columns", admin.columns());
    context.insert("rows", &rows);
    render(&state, "admin/list.html", &context)
}

fn render_form(
    state: &AppState,
    user: &User,
    admin: &dyn ModelAdmin,
    id: Option<i64>,
    form: &AdminForm,
    errors: &FieldErrors,
) -> Result<Response, RequestError> {
    let action = match id {
        Some(id) => format!("/admin/{}/{}/change/", admin.slug(), id),
        None => format!("/admin/{}/add/", admin.slug()),
    };
    let mut context = base_context(Some(user));
    context.insert("slug", admin.slug());
    context.insert("title", admin.title());
    context.insert("heading", if id.is_some() { "Change" } else { "Add" });
    context.insert("action", &action);
    context.insert("fields", &bind_fields(admin.fields(), form, errors));
    render(state, "admin/form.html", &context)
}

async fn save_or_render(
    state: &AppState,
    user: &User,
    admin: &dyn ModelAdmin,
    id: Option<i64>,
    form: &AdminForm,
) -> Result<Response, RequestError> {
    if let Err(errors) = admin.save(&state.pool, id, form).await? {
        return render_form(state, user, admin, id, form, &errors);
    }
    tracing::info!(model = admin.slug(), ?id, staff = %user.username, "record saved from admin");
    Ok(Redirect::to(&format!("/admin/{}/", admin.slug())).into_response())
}

pub async fn admin_add_form(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path(model): Path<String>,
) -> Result<Response, RequestError> {
    let admin = registered(&state, &model)?;
    if !admin.can_add() {
        return Err(RequestError::NotFound);
    }
    render_form(&state, &user, admin, None, &AdminForm::blank(), &FieldErrors::new())
}

pub async fn admin_add(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path(model): Path<String>,
    Form(form): Form<AdminForm>,
) -> Result<Response, RequestError> {
    let admin = registered(&state, &model)?;
    if !admin.can_add() {
        return Err(RequestError::NotFound);
    }
    save_or_render(&state, &user, admin, None, &form).await
}

pub async fn admin_change_form(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path((model, id)): Path<(String, i64)>,
) -> Result<Response, RequestError> {
    let admin = registered(&state, &model)?;
    if !admin.can_change() {
        return Err(RequestError::NotFound);
    }
    let form = admin
        .initial(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound)?;
    render_form(&state, &user, admin, Some(id), &form, &FieldErrors::new())
}

pub async fn admin_change(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path((model, id)): Path<(String, i64)>,
    Form(form): Form<AdminForm>,
) -> Result<Response, RequestError> {
    let admin = registered(&state, &model)?;
    if !admin.can_change() {
        return Err(RequestError::NotFound);
    }
    save_or_render(&state, &user, admin, Some(id), &form).await
}

pub async fn admin_delete(
    Extension(state): Extension<Arc<AppState>>,
    StaffUser(user): StaffUser,
    Path((model, id)): Path<(String, i64)>,
) -> Result<Response, RequestError> {
    let admin = registered(&state, &model)?;
    if !admin.delete(&state.pool, id).await? {
        return Err(RequestError::NotFound);
    }
    tracing::info!(model = admin.slug(), id, staff = %user.username, "record deleted from admin");
    Ok(Redirect::to(&format!("/admin/{}/", admin.slug())).into_response())
}
