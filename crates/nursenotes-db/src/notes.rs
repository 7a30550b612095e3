//! Note repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use nursenotes_core::{
    CatalogPage, CatalogQuery, Category, CreateNoteRequest, Error, Note, NoteRepository,
    NoteSummary, Result, StudyYear,
};

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

const NOTE_COLUMNS: &str = "n.id, n.title, n.description, n.category, n.year, n.file_url, n.user_id, n.created_at";

/// Build the catalog WHERE clause and its bind values from the query's
/// equality filters. Parameters are numbered from `$1`.
fn catalog_filter_clause(query: &CatalogQuery) -> (String, Vec<String>) {
    let mut clause = String::new();
    let mut binds: Vec<String> = Vec::new();
    let mut param_idx = 1;

    if let Some(category) = query.category.selected() {
        clause.push_str(&format!("AND n.category = ${} ", param_idx));
        binds.push(category.as_str().to_string());
        param_idx += 1;
    }
    if let Some(year) = query.year.selected() {
        clause.push_str(&format!("AND n.year = ${} ", param_idx));
        binds.push(year.as_str().to_string());
    }

    (clause, binds)
}

fn parse_category(label: &str) -> Result<Category> {
    label
        .parse()
        .map_err(|_| Error::Internal(format!("Stored note has unknown category '{}'", label)))
}

fn parse_year(label: Option<String>) -> Result<Option<StudyYear>> {
    label
        .map(|y| {
            y.parse().map_err(|_| {
                Error::Internal(format!("Stored note has unknown study year '{}'", y))
            })
        })
        .transpose()
}

fn map_row_to_note(row: &sqlx::postgres::PgRow) -> Result<Note> {
    let category: String = row.get("category");
    let year: Option<String> = row.get("year");
    Ok(Note {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        category: parse_category(&category)?,
        year: parse_year(year)?,
        file_url: row.get("file_url"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    })
}

fn map_row_to_summary(row: &sqlx::postgres::PgRow) -> Result<NoteSummary> {
    let note = map_row_to_note(row)?;
    Ok(NoteSummary {
        id: note.id,
        title: note.title,
        description: note.description,
        category: note.category,
        year: note.year,
        file_url: note.file_url,
        user_id: note.user_id,
        created_at: note.created_at,
        uploader_name: row.get("uploader_name"),
    })
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let id = Uuid::now_v7();
        let row = sqlx::query(
            r#"INSERT INTO notes (id, title, description, category, year, file_url, user_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, title, description, category, year, file_url, user_id, created_at"#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.category.as_str())
        .bind(req.year.as_str())
        .bind(&req.file_url)
        .bind(req.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        map_row_to_note(&row)
    }

    async fn catalog_page(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        let (clause, binds) = catalog_filter_clause(query);
        let (offset, limit) = query.window();

        // Exact count of matching rows across all pages.
        let count_sql = format!("SELECT COUNT(*) AS total FROM notes n WHERE true {}", clause);
        let mut count_query = sqlx::query(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
            .get("total");

        // The requested window, newest first, with uploader names.
        let page_sql = format!(
            "SELECT {}, p.full_name AS uploader_name
             FROM notes n
             JOIN profiles p ON p.id = n.user_id
             WHERE true {}
             ORDER BY n.created_at DESC
             LIMIT ${} OFFSET ${}",
            NOTE_COLUMNS,
            clause,
            binds.len() + 1,
            binds.len() + 2,
        );
        let mut page_query = sqlx::query(&page_sql);
        for value in &binds {
            page_query = page_query.bind(value);
        }
        let rows = page_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let notes = rows
            .iter()
            .map(map_row_to_summary)
            .collect::<Result<Vec<_>>>()?;

        Ok(CatalogPage { notes, total })
    }

    async fn featured(&self, limit: i64) -> Result<Vec<NoteSummary>> {
        let sql = format!(
            "SELECT {}, p.full_name AS uploader_name
             FROM notes n
             JOIN profiles p ON p.id = n.user_id
             ORDER BY n.created_at DESC
             LIMIT $1",
            NOTE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(map_row_to_summary).collect()
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let sql = format!("SELECT {} FROM notes n WHERE n.id = $1", NOTE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        map_row_to_note(&row)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes n WHERE n.user_id = $1 ORDER BY n.created_at DESC",
            NOTE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(map_row_to_note).collect()
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let sql = format!("SELECT {} FROM notes n WHERE n.id = $1 FOR UPDATE", NOTE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;
        let note = map_row_to_note(&row)?;

        if note.user_id != owner {
            return Err(Error::Forbidden(
                "Only the uploader can delete a note".into(),
            ));
        }

        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nursenotes_core::{CategoryFilter, YearFilter};

    #[test]
    fn test_filter_clause_all_is_empty() {
        let (clause, binds) = catalog_filter_clause(&CatalogQuery::default());
        assert!(clause.is_empty());
        assert!(binds.is_empty());
    }

    #[test]
    fn test_filter_clause_category_only() {
        let query = CatalogQuery {
            category: CategoryFilter::Only(Category::Anatomy),
            ..Default::default()
        };
        let (clause, binds) = catalog_filter_clause(&query);
        assert_eq!(clause, "AND n.category = $1 ");
        assert_eq!(binds, vec!["Anatomy".to_string()]);
    }

    #[test]
    fn test_filter_clause_category_and_year() {
        let query = CatalogQuery {
            category: CategoryFilter::Only(Category::ClinicalMedicine),
            year: YearFilter::Only(StudyYear::Third),
            ..Default::default()
        };
        let (clause, binds) = catalog_filter_clause(&query);
        assert_eq!(clause, "AND n.category = $1 AND n.year = $2 ");
        assert_eq!(
            binds,
            vec!["Clinical Medicine".to_string(), "3rd Year".to_string()]
        );
    }

    #[test]
    fn test_filter_clause_year_only_numbers_from_one() {
        let query = CatalogQuery {
            year: YearFilter::Only(StudyYear::First),
            ..Default::default()
        };
        let (clause, binds) = catalog_filter_clause(&query);
        assert_eq!(clause, "AND n.year = $1 ");
        assert_eq!(binds, vec!["1st Year".to_string()]);
    }
}
