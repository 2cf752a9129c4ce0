use axum::Json;

use crate::models::Category;

/// All supported event categories, in their canonical lowercase form.
pub async fn list_categories() -> Json<Vec<&'static str>> {
    Json(Category::ALL.iter().map(Category::as_str).collect())
}
