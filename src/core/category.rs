//! Category business logic - Creating, listing, updating and removing categories.
//!
//! Removing a category leaves budgets and transactions that reference it in place;
//! readers substitute a placeholder label for the missing category.

use crate::{
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "Category name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Creates a category after trimming and validating its name.
pub async fn create_category(
    db: &DatabaseConnection,
    name: &str,
    icon: &str,
    color: &str,
) -> Result<category::Model> {
    let name = validate_name(name)?;

    let category = category::ActiveModel {
        name: Set(name),
        icon: Set(icon.to_string()),
        color: Set(color.to_string()),
        ..Default::default()
    };

    category.insert(db).await.map_err(Into::into)
}

/// Finds a category by id.
pub async fn get_category_by_id<C>(db: &C, category_id: i64) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every category, ordered alphabetically by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replaces the name, icon and color of an existing category.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    name: &str,
    icon: &str,
    color: &str,
) -> Result<category::Model> {
    let name = validate_name(name)?;
    let existing = get_category_by_id(db, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let mut active_model: category::ActiveModel = existing.into();
    active_model.name = Set(name);
    active_model.icon = Set(icon.to_string());
    active_model.color = Set(color.to_string());
    active_model.update(db).await.map_err(Into::into)
}

/// Deletes a category. Budgets and transactions referencing it are left untouched.
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let result = Category::delete_by_id(category_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::CategoryNotFound { id: category_id });
    }
    Ok(())
}

/// Builds the stand-in used when a budget references a category that no longer exists.
#[must_use]
pub fn placeholder_category(category_id: i64, label: &str) -> category::Model {
    category::Model {
        id: category_id,
        name: label.to_string(),
        icon: String::new(),
        color: String::new(),
    }
}
