use tracing::info;

use crate::{
    categories::repo::{Category, CategoryStore},
    error::{AppError, FieldErrors},
};

pub(crate) fn normalize_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim().to_string();
    let mut errs = FieldErrors::new();
    errs.length("Category", &name, 3, 30);
    errs.into_result("Category must be between 3 and 30 characters long.")?;
    Ok(name)
}

/// Creates a category unless one with the same name (ignoring case) exists.
pub async fn create(store: &dyn CategoryStore, raw_name: &str) -> Result<Category, AppError> {
    let name = normalize_name(raw_name)?;
    if store.find_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict(
            "Category already exists with that name.".into(),
        ));
    }
    let category = store.insert(&name).await?;
    info!(category_id = %category.id, name = %category.name, "category created");
    Ok(category)
}

/// Returns the existing category matching `raw_name` ignoring case, or creates it.
pub async fn find_or_create(
    store: &dyn CategoryStore,
    raw_name: &str,
) -> Result<Category, AppError> {
    let name = normalize_name(raw_name)?;
    if let Some(existing) = store.find_by_name(&name).await? {
        return Ok(existing);
    }
    let category = store.insert(&name).await?;
    info!(category_id = %category.id, name = %category.name, "category created");
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn create_rejects_case_insensitive_duplicate() {
        let store = MemoryStore::new();
        create(&store, "Rust").await.unwrap();
        let err = create(&store, "  rUST ").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_validates_length() {
        let store = MemoryStore::new();
        assert!(matches!(
            create(&store, "ab").await.unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(matches!(
            create(&store, &"x".repeat(31)).await.unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn find_or_create_reuses_existing() {
        let store = MemoryStore::new();
        let first = find_or_create(&store, "Travel").await.unwrap();
        let second = find_or_create(&store, "travel").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
