//! Note HTTP handlers: catalog, featured list, upload, own-notes management.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use nursenotes_core::defaults::{FEATURED_LIMIT, PAGE_SIZE};
use nursenotes_core::{
    filter_notes, total_pages, CatalogQuery, CategoryFilter, Note, NoteRepository, NoteSummary,
    NoteUpload, ObjectStore, YearFilter,
};

use super::current_user;

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Pagination metadata for the catalog response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Exact number of rows matching the filters, across all pages.
    pub total: i64,
    /// The page actually served (requests beyond the end are clamped).
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// List response wrapper with pagination metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Query parameters for the note catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    /// Category label or "All" (default).
    pub category: Option<String>,
    /// Study-year label or "All" (default).
    pub year: Option<String>,
    /// 1-based page index, default 1.
    pub page: Option<u32>,
    /// Free-text term. Narrows only the served page, after pagination; it
    /// does not change `total` and cannot match rows on other pages.
    pub q: Option<String>,
}

impl CatalogParams {
    fn catalog_query(&self) -> Result<CatalogQuery, ApiError> {
        let category: CategoryFilter = match self.category.as_deref() {
            None => CategoryFilter::All,
            Some(s) => s.parse()?,
        };
        let year: YearFilter = match self.year.as_deref() {
            None => YearFilter::All,
            Some(s) => s.parse()?,
        };
        Ok(CatalogQuery {
            category,
            year,
            page: self.page.unwrap_or(1).max(1),
            page_size: PAGE_SIZE,
        })
    }
}

/// Browse the shared catalog.
///
/// Rows come back newest first, equality-filtered by category and year,
/// nine per page, with the exact matching-row count. A page index past the
/// last page is clamped to it.
pub async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ListResponse<NoteSummary>>, ApiError> {
    let mut query = params.catalog_query()?;

    let mut page = state.db.notes.catalog_page(&query).await?;
    let pages = total_pages(page.total, query.page_size);
    if query.page > pages {
        query.page = pages;
        page = state.db.notes.catalog_page(&query).await?;
    }

    let data = match params.q.as_deref() {
        Some(term) => filter_notes(&page.notes, term),
        None => page.notes,
    };

    Ok(Json(ListResponse {
        data,
        pagination: PaginationMeta {
            total: page.total,
            page: query.page,
            page_size: query.page_size,
            total_pages: pages,
        },
    }))
}

/// The latest notes for the landing page.
pub async fn featured_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<NoteSummary>>, ApiError> {
    let notes = state.db.notes.featured(FEATURED_LIMIT).await?;
    Ok(Json(notes))
}

// =============================================================================
// UPLOAD
// =============================================================================

/// Upload a note: multipart form with `title`, `description`, `category`,
/// `year`, and `file` parts.
///
/// # Returns
/// - 201 Created with the stored note
/// - 400 Bad Request when validation fails (no object is stored)
/// - 401 Unauthorized without a valid session
pub async fn upload_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let user = current_user(&state, &headers).await?;

    let mut title = String::new();
    let mut description: Option<String> = None;
    let mut category = String::new();
    let mut year = String::new();
    let mut file_name = String::new();
    let mut data: Vec<u8> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = read_text_field(field).await?,
            "description" => {
                let text = read_text_field(field).await?;
                if !text.trim().is_empty() {
                    description = Some(text);
                }
            }
            "category" => category = read_text_field(field).await?,
            "year" => year = read_text_field(field).await?,
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec();
            }
            _ => {}
        }
    }

    let note = state
        .uploader
        .upload(
            &user,
            NoteUpload {
                title,
                description,
                category,
                year,
                file_name,
                data,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form field: {}", e)))
}

// =============================================================================
// OWN NOTES
// =============================================================================

/// List the authenticated user's own uploads, newest first.
pub async fn my_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Note>>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let notes = state.db.notes.list_by_owner(user.id).await?;
    Ok(Json(notes))
}

/// Delete one of the authenticated user's notes.
///
/// The stored file is removed best-effort after the row: a storage failure
/// is logged and the delete still succeeds.
pub async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&state, &headers).await?;
    let note = state.db.notes.delete_owned(id, user.id).await?;

    if let Some(key) = storage_key_from_url(&note.file_url) {
        if let Err(e) = state.store.delete(&key).await {
            warn!(
                subsystem = "api",
                component = "notes",
                op = "delete",
                note_id = %id,
                storage_key = %key,
                error = %e,
                "Stored file could not be removed"
            );
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Storage key of a note's public URL (its last path segment).
fn storage_key_from_url(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_from_url() {
        assert_eq!(
            storage_key_from_url("https://files.example/objects/ab/ab12.pdf").as_deref(),
            Some("ab12.pdf")
        );
        assert_eq!(storage_key_from_url("trailing/").as_deref(), None);
    }

    #[test]
    fn test_catalog_params_defaults() {
        let params = CatalogParams::default();
        let q = params.catalog_query().unwrap();
        assert_eq!(q.category, CategoryFilter::All);
        assert_eq!(q.year, YearFilter::All);
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, PAGE_SIZE);
    }

    #[test]
    fn test_catalog_params_rejects_unknown_category() {
        let params = CatalogParams {
            category: Some("Astrology".to_string()),
            ..Default::default()
        };
        assert!(params.catalog_query().is_err());
    }

    #[test]
    fn test_catalog_params_zero_page_becomes_first() {
        let params = CatalogParams {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(params.catalog_query().unwrap().page, 1);
    }
}
