//! Two-phase note upload.
//!
//! An upload moves through `Validating → UploadingFile → SavingMetadata`;
//! any failure returns the flow to idle with the reason. Validation runs
//! entirely before the first gateway call. The binary upload must complete
//! before the metadata insert begins, and an insert failure after a
//! successful upload triggers a compensating delete of the stored object so
//! no orphan survives. A failed compensation is logged, not surfaced; the
//! caller always sees the insert's own error.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::defaults::{ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES};
use crate::error::{Error, Result};
use crate::models::{AuthUser, Category, CreateNoteRequest, Note, StudyYear};
use crate::traits::{NoteRepository, ObjectStore};

/// Phase of the upload flow, used for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Validating,
    UploadingFile,
    SavingMetadata,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Validating => "validating",
            UploadPhase::UploadingFile => "uploading_file",
            UploadPhase::SavingMetadata => "saving_metadata",
        }
    }
}

/// A submitted upload form, fields as the client sent them.
#[derive(Debug, Clone)]
pub struct NoteUpload {
    pub title: String,
    pub description: Option<String>,
    /// Category label; must be one of the fixed set.
    pub category: String,
    /// Study-year label; must be one of the fixed set.
    pub year: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// An upload that passed validation.
#[derive(Debug, Clone)]
struct ValidatedUpload {
    title: String,
    description: Option<String>,
    category: Category,
    year: StudyYear,
    extension: String,
    data: Vec<u8>,
}

/// Lowercase extension of a file name, if it has one.
fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validate a submitted form. No gateway call happens before this passes.
fn validate(form: NoteUpload) -> Result<ValidatedUpload> {
    let title = form.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::Validation("Title is required".into()));
    }
    if form.category.trim().is_empty() {
        return Err(Error::Validation("Category is required".into()));
    }
    if form.year.trim().is_empty() {
        return Err(Error::Validation("Year is required".into()));
    }
    let category: Category = form.category.parse()?;
    let year: StudyYear = form.year.parse()?;

    if form.file_name.trim().is_empty() || form.data.is_empty() {
        return Err(Error::Validation("A file is required".into()));
    }
    if form.data.len() as u64 > MAX_UPLOAD_BYTES {
        return Err(Error::Validation(
            "File is too large; the limit is 50 MiB".into(),
        ));
    }
    let extension = file_extension(&form.file_name).ok_or_else(|| {
        Error::Validation("File has no extension; expected pdf, doc, or docx".into())
    })?;
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::Validation(format!(
            "Unsupported file type '.{}'; expected pdf, doc, or docx",
            extension
        )));
    }

    // Magic-byte check: only reject on a positive mismatch. Unrecognized
    // content passes, matching the lenient accept hint of the upload form.
    if let Some(kind) = infer::get(&form.data) {
        if kind.extension() != extension {
            return Err(Error::Validation(format!(
                "File content looks like '.{}' but the name says '.{}'",
                kind.extension(),
                extension
            )));
        }
    }

    let description = form
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(ValidatedUpload {
        title,
        description,
        category,
        year,
        extension,
        data: form.data,
    })
}

/// Runs uploads: object store first, metadata row second, compensating
/// delete when the second phase fails.
pub struct NoteUploader {
    store: Arc<dyn ObjectStore>,
    notes: Arc<dyn NoteRepository>,
}

impl NoteUploader {
    pub fn new(store: Arc<dyn ObjectStore>, notes: Arc<dyn NoteRepository>) -> Self {
        Self { store, notes }
    }

    /// Execute the full upload flow for `user`.
    pub async fn upload(&self, user: &AuthUser, form: NoteUpload) -> Result<Note> {
        debug!(
            subsystem = "upload",
            op = UploadPhase::Validating.as_str(),
            user_id = %user.id,
            file_name = %form.file_name,
            size_bytes = form.data.len(),
            "Validating upload"
        );
        let upload = validate(form)?;

        // Globally-unique storage key; the extension survives so the public
        // URL stays recognizable to clients.
        let key = format!("{}.{}", Uuid::new_v4(), upload.extension);

        debug!(
            subsystem = "upload",
            op = UploadPhase::UploadingFile.as_str(),
            user_id = %user.id,
            storage_key = %key,
            size_bytes = upload.data.len(),
            "Storing file"
        );
        self.store.put(&key, &upload.data).await?;
        let file_url = self.store.public_url(&key);

        debug!(
            subsystem = "upload",
            op = UploadPhase::SavingMetadata.as_str(),
            user_id = %user.id,
            storage_key = %key,
            "Saving note metadata"
        );
        let insert = self
            .notes
            .insert(CreateNoteRequest {
                title: upload.title,
                description: upload.description,
                category: upload.category,
                year: upload.year,
                file_url,
                user_id: user.id,
            })
            .await;

        match insert {
            Ok(note) => {
                info!(
                    subsystem = "upload",
                    note_id = %note.id,
                    user_id = %user.id,
                    storage_key = %key,
                    "Upload complete"
                );
                Ok(note)
            }
            Err(insert_err) => {
                warn!(
                    subsystem = "upload",
                    user_id = %user.id,
                    storage_key = %key,
                    error = %insert_err,
                    "Metadata insert failed; removing stored object"
                );
                if let Err(cleanup_err) = self.store.delete(&key).await {
                    // The object is orphaned. The caller still gets the
                    // insert's error, per the flow contract.
                    error!(
                        subsystem = "upload",
                        component = "compensation",
                        storage_key = %key,
                        error = %cleanup_err,
                        "Compensating delete failed; object orphaned"
                    );
                }
                Err(insert_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogPage, CatalogQuery};
    use crate::models::NoteSummary;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Records every gateway call; optionally fails a chosen operation.
    struct RecordingGateway {
        calls: Mutex<Vec<String>>,
        fail_put: bool,
        fail_insert: bool,
        fail_delete: bool,
    }

    impl RecordingGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_put: false,
                fail_insert: false,
                fail_delete: false,
            })
        }

        fn failing(fail_put: bool, fail_insert: bool, fail_delete: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_put,
                fail_insert,
                fail_delete,
            })
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingGateway {
        async fn put(&self, key: &str, _data: &[u8]) -> Result<()> {
            self.record(format!("put:{}", key));
            if self.fail_put {
                return Err(Error::Storage("disk full".into()));
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.record(format!("delete:{}", key));
            if self.fail_delete {
                return Err(Error::Storage("delete refused".into()));
            }
            Ok(())
        }

        async fn exists(&self, _key: &str) -> Result<bool> {
            Ok(true)
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://files.example/notes/{}", key)
        }
    }

    #[async_trait]
    impl NoteRepository for RecordingGateway {
        async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
            self.record("insert");
            if self.fail_insert {
                return Err(Error::Database(sqlx::Error::PoolClosed));
            }
            Ok(Note {
                id: Uuid::new_v4(),
                title: req.title,
                description: req.description,
                category: req.category,
                year: Some(req.year),
                file_url: req.file_url,
                user_id: req.user_id,
                created_at: Utc::now(),
            })
        }

        async fn catalog_page(&self, _query: &CatalogQuery) -> Result<CatalogPage> {
            Err(Error::Internal("not used in this test".into()))
        }

        async fn featured(&self, _limit: i64) -> Result<Vec<NoteSummary>> {
            Err(Error::Internal("not used in this test".into()))
        }

        async fn fetch(&self, _id: Uuid) -> Result<Note> {
            Err(Error::Internal("not used in this test".into()))
        }

        async fn list_by_owner(&self, _user_id: Uuid) -> Result<Vec<Note>> {
            Err(Error::Internal("not used in this test".into()))
        }

        async fn delete_owned(&self, _id: Uuid, _owner: Uuid) -> Result<Note> {
            Err(Error::Internal("not used in this test".into()))
        }
    }

    fn uploader(gateway: &Arc<RecordingGateway>) -> NoteUploader {
        NoteUploader::new(gateway.clone(), gateway.clone())
    }

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "nurse@example.com".to_string(),
        }
    }

    fn form() -> NoteUpload {
        NoteUpload {
            title: "Cardio Basics".to_string(),
            description: Some("ECG interpretation".to_string()),
            category: "Pathology".to_string(),
            year: "2nd Year".to_string(),
            file_name: "cardio.pdf".to_string(),
            data: vec![1u8; 12 * 1024 * 1024],
        }
    }

    #[tokio::test]
    async fn test_happy_path_calls_in_order() {
        let gw = RecordingGateway::new();
        let note = uploader(&gw).upload(&user(), form()).await.unwrap();

        let calls = gw.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("put:"));
        assert_eq!(calls[1], "insert");

        assert_eq!(note.title, "Cardio Basics");
        assert_eq!(note.category, Category::Pathology);
        assert_eq!(note.year, Some(StudyYear::Second));
        assert!(note.file_url.starts_with("https://files.example/notes/"));
        assert!(note.file_url.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_oversized_file_fails_before_any_gateway_call() {
        let gw = RecordingGateway::new();
        let mut f = form();
        f.data = vec![0u8; 60 * 1024 * 1024];

        let err = uploader(&gw).upload(&user(), f).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_title_fails_validation() {
        let gw = RecordingGateway::new();
        let mut f = form();
        f.title = "   ".to_string();

        let err = uploader(&gw).upload(&user(), f).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_category_fails_validation() {
        let gw = RecordingGateway::new();
        let mut f = form();
        f.category = "Astrology".to_string();

        let err = uploader(&gw).upload(&user(), f).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_fails_validation() {
        let gw = RecordingGateway::new();
        let mut f = form();
        f.file_name = "notes.exe".to_string();

        let err = uploader(&gw).upload(&user(), f).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn test_content_extension_mismatch_is_rejected() {
        let gw = RecordingGateway::new();
        let mut f = form();
        // A PNG header inside a file claiming to be a PDF.
        f.data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

        let err = uploader(&gw).upload(&user(), f).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn test_real_pdf_magic_bytes_pass_the_sniff() {
        let gw = RecordingGateway::new();
        let mut f = form();
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(4096, b' ');
        f.data = data;

        assert!(uploader(&gw).upload(&user(), f).await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_failure_triggers_compensating_delete() {
        let gw = RecordingGateway::failing(false, true, false);
        let err = uploader(&gw).upload(&user(), form()).await.unwrap_err();

        // The caller sees the insert's error, not a storage error.
        assert!(matches!(err, Error::Database(_)));

        let calls = gw.calls();
        assert_eq!(calls.len(), 3);
        let key = calls[0].strip_prefix("put:").unwrap().to_string();
        assert_eq!(calls[1], "insert");
        assert_eq!(calls[2], format!("delete:{}", key));
    }

    #[tokio::test]
    async fn test_failed_compensation_still_surfaces_insert_error() {
        let gw = RecordingGateway::failing(false, true, true);
        let err = uploader(&gw).upload(&user(), form()).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        let calls = gw.calls();
        assert!(calls.iter().any(|c| c.starts_with("delete:")));
    }

    #[tokio::test]
    async fn test_put_failure_skips_insert() {
        let gw = RecordingGateway::failing(true, false, false);
        let err = uploader(&gw).upload(&user(), form()).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let calls = gw.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("put:"));
    }

    #[test]
    fn test_file_extension_parsing() {
        assert_eq!(file_extension("notes.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("a.b.docx").as_deref(), Some("docx"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
