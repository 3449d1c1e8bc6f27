use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{FoodDeleted, FoodSaved, ListQuery},
    listing::{filter_by_name, total_pages, ListState},
    model::{FoodEntry, FoodFields, Meal},
};
use crate::{
    auth::Session,
    error::{AppError, AppResult},
    extract::{PathParam, QueryParams},
    forms::{FormKind, MultipartForm, Validator, DASHBOARD_ROUTE},
    images::{ImageSelection, FOOD_FOLDER},
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route(
            "/foods/:id",
            get(get_food).put(update_food).delete(delete_food),
        )
}

/// Validated `name`, `meal` and `date` of the add/edit food form.
fn food_form(form: &MultipartForm) -> AppResult<(String, Meal, Date)> {
    let mut v = Validator::default();
    let name = v.required("name", form.text("name"));
    let meal = v.choice::<Meal>(
        "meal",
        form.text("meal"),
        "must be Breakfast, Lunch, Dinner or Snack",
    );
    let date = v.date("date", form.text("date"));
    form.check_image(&mut v);
    v.finish()?;
    match (name, meal, date) {
        (Some(name), Some(meal), Some(date)) => Ok((name.to_string(), meal, date)),
        _ => Err(AppError::Validation(Vec::new())),
    }
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn list_foods(
    State(state): State<AppState>,
    session: Session,
    QueryParams(q): QueryParams<ListQuery>,
) -> AppResult<Response> {
    let entries = state.foods.list_by_user(session.user_id).await?;

    let mut list = ListState::default();
    list.set_search(q.search);
    let total = total_pages(filter_by_name(&entries, list.search()).len());
    if let Some(page) = q.page {
        list.go_to(page, total);
    }
    if let Some(nav) = q.nav {
        list.navigate(nav, total);
    }

    Ok(Json(list.view(&entries)).into_response())
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn get_food(
    State(state): State<AppState>,
    session: Session,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<FoodEntry>> {
    state
        .foods
        .get(session.user_id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("food"))
}

#[instrument(skip(state, session, form), fields(user_id = %session.user_id))]
pub async fn create_food(
    State(state): State<AppState>,
    session: Session,
    mut form: MultipartForm,
) -> AppResult<impl IntoResponse> {
    let (name, meal, date) = food_form(&form)?;

    let _submission = state
        .gate
        .begin(FormKind::AddFood, session.user_id.to_string())?;

    let mut image = ImageSelection::default();
    if let Some(file) = form.image.take() {
        image.select(Some(file));
    }
    let image_url = image
        .resolve(state.storage.as_ref(), FOOD_FOLDER, session.user_id)
        .await?;

    let food = state
        .foods
        .create(
            session.user_id,
            &FoodFields {
                name,
                meal,
                date,
                image_url,
            },
        )
        .await?;

    info!(user_id = %session.user_id, food_id = %food.id, "food added");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/foods/{}", food.id))],
        Json(FoodSaved {
            message: "Food has been added!",
            food,
            redirect_to: DASHBOARD_ROUTE,
        }),
    ))
}

#[instrument(skip(state, session, form), fields(user_id = %session.user_id))]
pub async fn update_food(
    State(state): State<AppState>,
    session: Session,
    PathParam(id): PathParam<Uuid>,
    mut form: MultipartForm,
) -> AppResult<Json<FoodSaved>> {
    let (name, meal, date) = food_form(&form)?;

    let _submission = state
        .gate
        .begin(FormKind::EditFood, format!("{}:{}", session.user_id, id))?;

    let Some(existing) = state.foods.get(session.user_id, id).await? else {
        warn!(user_id = %session.user_id, food_id = %id, "edit of unknown food");
        return Err(AppError::NotFound("food"));
    };

    let mut image = ImageSelection::with_existing(existing.image_url);
    if let Some(file) = form.image.take() {
        image.select(Some(file));
    }
    let image_url = image
        .resolve(state.storage.as_ref(), FOOD_FOLDER, session.user_id)
        .await?;

    let fields = FoodFields {
        name,
        meal,
        date,
        image_url,
    };
    let Some(food) = state.foods.update(session.user_id, id, &fields).await? else {
        warn!(user_id = %session.user_id, food_id = %id, "food vanished during edit");
        return Err(AppError::NotFound("food"));
    };

    info!(user_id = %session.user_id, food_id = %id, "food updated");
    Ok(Json(FoodSaved {
        message: "Food has been updated!",
        food,
        redirect_to: DASHBOARD_ROUTE,
    }))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn delete_food(
    State(state): State<AppState>,
    session: Session,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<FoodDeleted>> {
    if !state.foods.delete(session.user_id, id).await? {
        return Err(AppError::NotFound("food"));
    }
    info!(user_id = %session.user_id, food_id = %id, "food deleted");
    Ok(Json(FoodDeleted {
        message: "Food has been deleted",
        id,
    }))
}
