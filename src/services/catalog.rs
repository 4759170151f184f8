//! Catalog management service: books, authors and categories

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
        category::{Category, CategoryInput},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get a book with its category and authors
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let category = match book.category_id {
            Some(category_id) => Some(self.repository.categories.get_by_id(category_id).await?),
            None => None,
        };
        let authors = self.repository.books.authors_of(id).await?;
        Ok(BookDetails::new(book, category, authors))
    }

    pub async fn create_book(&self, data: CreateBook) -> AppResult<BookDetails> {
        data.validate()?;
        if let Some(ref isbn) = data.isbn {
            self.ensure_isbn_free(isbn, None).await?;
        }
        self.check_references(data.category_id, &data.author_ids).await?;

        let book = self.repository.books.create(&data).await?;
        tracing::info!(book_id = book.id, quantity = book.quantity, "Book created");
        self.get_book(book.id).await
    }

    pub async fn update_book(&self, id: i32, data: UpdateBook) -> AppResult<BookDetails> {
        data.validate()?;
        self.repository.books.get_by_id(id).await?;
        if let Some(ref isbn) = data.isbn {
            self.ensure_isbn_free(isbn, Some(id)).await?;
        }
        self.check_references(data.category_id, data.author_ids.as_deref().unwrap_or_default())
            .await?;

        self.repository.books.update(id, &data).await?;
        self.get_book(id).await
    }

    /// Delete a book that was never loaned
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.get_by_id(id).await?;
        if self.repository.books.has_loans(id).await? {
            return Err(AppError::BusinessRule(format!(
                "Book with id {} has loans and cannot be deleted",
                id
            )));
        }
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    async fn ensure_isbn_free(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if self.repository.books.isbn_exists(isbn, exclude_id).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                isbn
            )));
        }
        Ok(())
    }

    async fn check_references(&self, category_id: Option<i32>, author_ids: &[i32]) -> AppResult<()> {
        if let Some(category_id) = category_id {
            self.repository.categories.get_by_id(category_id).await?;
        }
        let missing = self.repository.authors.missing_ids(author_ids).await?;
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!("Authors not found: {:?}", missing)));
        }
        Ok(())
    }

    // Authors

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, data: CreateAuthor) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors.create(&data).await
    }

    pub async fn update_author(&self, id: i32, data: UpdateAuthor) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors.update(id, &data).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // Categories

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn create_category(&self, data: CategoryInput) -> AppResult<Category> {
        data.validate()?;
        self.repository.categories.create(&data).await
    }

    pub async fn rename_category(&self, id: i32, data: CategoryInput) -> AppResult<Category> {
        data.validate()?;
        self.repository.categories.rename(id, &data).await
    }

    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await
    }
}
