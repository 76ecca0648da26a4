use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::path::{Path, PathBuf};

use crate::{log_api_request, log_api_result};
use super::book::{Author, AuthorCreate, BookCreate, BookDetail, BookSummary, BookUpdate};
use super::feed::FeedQuery;

/// Typed client for the library-management REST API
#[derive(Clone)]
pub struct LmsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl LmsClient {
    pub const AUTHOR_SEARCH_SIZE: u32 = 100;

    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL must be hierarchical: {}", base_url));
        }
        // Url::join drops the last path segment unless it ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("lms-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        tracing::debug!(base_url = %base_url, "API client initialized");
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// `api/<collection>/<id>` with the id percent-encoded as one segment
    fn item_url(&self, collection: &str, id: &str) -> Result<Url> {
        let mut url = self.endpoint(&format!("api/{}/", collection))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base URL cannot carry path segments"))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Query string for `GET /api/books/`. Absent filters are omitted.
    pub fn book_list_params(query: &FeedQuery, page: u32, size: u32) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(author) = query.author_name() {
            params.push(("author_name", author.to_string()));
        }
        if let Some(title) = query.title() {
            params.push(("title", title.to_string()));
        }
        params.push(("page", page.to_string()));
        params.push(("size", size.to_string()));
        params
    }

    pub async fn list_books(&self, query: &FeedQuery, page: u32, size: u32) -> Result<Vec<BookSummary>> {
        log_api_request!("list_books", query = ?query, page, size);
        let result = async {
            let books: Vec<BookDetail> = self
                .http
                .get(self.endpoint("api/books/")?)
                .query(&Self::book_list_params(query, page, size))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok::<_, anyhow::Error>(books.into_iter().map(BookSummary::from).collect::<Vec<_>>())
        }
        .await;
        log_api_result!("list_books", result);
        result
    }

    pub async fn get_book(&self, id: &str) -> Result<BookDetail> {
        log_api_request!("get_book", id);
        let book = self
            .http
            .get(self.item_url("books", id)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(book)
    }

    pub async fn create_book(&self, book: &BookCreate) -> Result<BookDetail> {
        log_api_request!("create_book", book_manage_id = %book.book_manage_id);
        let created = self
            .http
            .post(self.endpoint("api/books/")?)
            .json(book)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created)
    }

    pub async fn update_book(&self, id: &str, update: &BookUpdate) -> Result<BookDetail> {
        log_api_request!("update_book", id);
        let updated = self
            .http
            .put(self.item_url("books", id)?)
            .json(update)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(updated)
    }

    pub async fn delete_book(&self, id: &str) -> Result<()> {
        log_api_request!("delete_book", id);
        self.http
            .delete(self.item_url("books", id)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Ask the server to scrape a bookstore page. The book is created asynchronously
    /// on the server side; success only means the job was accepted.
    pub async fn scrape_book(&self, url: &str) -> Result<()> {
        log_api_request!("scrape_book", url);
        self.http
            .post(self.endpoint("api/books/scrape")?)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Upload image files and return their storage references, in input order
    pub async fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<String>> {
        log_api_request!("upload_files", count = paths.len());
        let parts = futures::future::try_join_all(paths.iter().map(|p| file_part(p))).await?;
        let form = parts
            .into_iter()
            .fold(Form::new(), |form, part| form.part("files", part));

        let refs: Vec<String> = self
            .http
            .post(self.endpoint("api/books/upload")?)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if refs.len() != paths.len() {
            return Err(anyhow!(
                "Upload returned {} references for {} files",
                refs.len(),
                paths.len()
            ));
        }
        Ok(refs)
    }

    pub async fn list_authors(&self, name: Option<&str>, page: u32, size: u32) -> Result<Vec<Author>> {
        log_api_request!("list_authors", name = ?name, page, size);
        let mut params = Vec::with_capacity(3);
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            params.push(("name", name.to_string()));
        }
        params.push(("page", page.to_string()));
        params.push(("size", size.to_string()));

        let authors = self
            .http
            .get(self.endpoint("api/authors/")?)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(authors)
    }

    pub async fn create_author(&self, author: &AuthorCreate) -> Result<Author> {
        log_api_request!("create_author", name = %author.name);
        let created = self
            .http
            .post(self.endpoint("api/authors/")?)
            .json(author)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created)
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(Part::bytes(bytes).file_name(file_name).mime_str(mime)?)
}
