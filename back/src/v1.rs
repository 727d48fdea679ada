use std::sync::{atomic::Ordering, Arc};

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use todo_api::v1::{
    CalendarStatus, Direction, Health, NewTodo, Settings, Theme, Todo, TodoNode,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/todos", get(get_todos).post(add_todo))
        .route("/todos/:id", delete(delete_todo))
        .route("/todos/:id/toggle", post(toggle_todo))
        .route("/todos/:id/move", post(move_todo))
        .route("/generation", get(get_generation))
        .route("/settings", get(get_settings))
        .route("/settings/theme/:name", post(set_theme))
        .route("/calendar/toggle", post(toggle_calendar))
        .route("/calendar/status", get(calendar_status))
        .route("/calendar/disconnect", post(disconnect_calendar))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let todos_count = state.todos.lock().await.len();

    Json(Health {
        status: String::from("healthy"),
        todos_count,
        calendar_enabled: state.calendar.is_enabled(),
        calendar_connected: state.calendar.is_connected(),
    })
}

async fn get_generation(State(state): State<Arc<AppState>>) -> Json<u64> {
    Json(state.generation.load(Ordering::Relaxed))
}

async fn get_todos(State(state): State<Arc<AppState>>) -> Json<Vec<TodoNode>> {
    let todos = state.todos.lock().await;
    Json(todos.list_hierarchical())
}

async fn add_todo(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTodo>,
) -> AppResult<Json<Todo>> {
    let mut todos = state.todos.lock().await;
    let todo = todos.create(&new.title, new.parent_id)?;
    state.increment_generation();

    info!(
        id = %todo.id,
        title = %todo.title,
        parent_id = ?todo.parent_id,
        "created todo"
    );

    Ok(Json(todo))
}

async fn toggle_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TodoNode>>> {
    let mut todos = state.todos.lock().await;
    todos.toggle(id)?;
    state.increment_generation();

    info!(
        %id,
        completed = ?todos.get(id).map(|todo| todo.completed),
        "toggled todo"
    );

    Ok(Json(todos.list_hierarchical()))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TodoNode>>> {
    let mut todos = state.todos.lock().await;
    todos.delete(id)?;
    state.increment_generation();

    info!(%id, "deleted todo");

    Ok(Json(todos.list_hierarchical()))
}

async fn move_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(direction): Json<Direction>,
) -> Json<Vec<TodoNode>> {
    let mut todos = state.todos.lock().await;

    if todos.move_todo(id, direction) {
        state.increment_generation();
        info!(%id, ?direction, "moved todo");
    }

    Json(todos.list_hierarchical())
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings().await)
}

async fn set_theme(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Settings>> {
    let theme = Theme::from_key(&name).ok_or(AppError::UnknownTheme(name))?;
    *state.theme.lock().await = theme;

    info!(theme = theme.key(), "updated theme");

    Ok(Json(state.settings().await))
}

async fn toggle_calendar(State(state): State<Arc<AppState>>) -> Json<Settings> {
    let enabled = state.calendar.toggle_enabled();
    info!(enabled, "toggled calendar integration");

    Json(state.settings().await)
}

async fn calendar_status(State(state): State<Arc<AppState>>) -> Json<CalendarStatus> {
    match state.calendar.client() {
        Some(client) => Json(client.test_connection().await),
        None => Json(CalendarStatus::disconnected("Calendar not configured")),
    }
}

async fn disconnect_calendar(State(state): State<Arc<AppState>>) -> Json<Settings> {
    state.calendar.disconnect();
    info!("disconnected calendar");

    Json(state.settings().await)
}
