//! Books repository for catalog operations

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use super::PageWindow;
use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookQuery, CreateBook, UpdateBook},
        enums::BookStatus,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Authors of a book, by last name
    pub async fn authors_of(&self, book_id: i32) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.* FROM authors a
            JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = $1
            ORDER BY a.last_name, a.first_name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let window = PageWindow::new(query.page, query.per_page);

        fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a BookQuery) {
            builder.push(" WHERE TRUE");
            if let Some(ref title) = query.title {
                builder
                    .push(" AND LOWER(title) LIKE ")
                    .push_bind(format!("%{}%", title.to_lowercase()));
            }
            if let Some(ref isbn) = query.isbn {
                builder.push(" AND isbn = ").push_bind(isbn);
            }
            if let Some(category_id) = query.category_id {
                builder.push(" AND category_id = ").push_bind(category_id);
            }
        }

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM books");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY title, id LIMIT ")
            .push_bind(window.per_page)
            .push(" OFFSET ")
            .push_bind(window.offset);
        let books = select.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Check if an ISBN is already used by another book
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::INT IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether any loan, open or returned, references the book
    pub async fn has_loans(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a book and its author links in one transaction
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let quantity = data.quantity.unwrap_or(1);
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, isbn, category_id, status, publication_year, publisher, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.isbn)
        .bind(data.category_id)
        .bind(BookStatus::for_quantity(quantity))
        .bind(data.publication_year)
        .bind(&data.publisher)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        link_authors(&mut tx, book.id, &data.author_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Partial update; replaces author links when `author_ids` is given
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE books SET updated_at = NOW()");

        macro_rules! set_field {
            ($field:expr, $name:literal) => {
                if let Some(ref val) = $field {
                    builder.push(concat!(", ", $name, " = ")).push_bind(val);
                }
            };
        }

        set_field!(data.title, "title");
        set_field!(data.isbn, "isbn");
        set_field!(data.category_id, "category_id");
        set_field!(data.publication_year, "publication_year");
        set_field!(data.publisher, "publisher");
        set_field!(data.quantity, "quantity");
        if let Some(quantity) = data.quantity {
            builder.push(", status = ").push_bind(BookStatus::for_quantity(quantity));
        }

        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let book = builder
            .build_query_as::<Book>()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(ref author_ids) = data.author_ids {
            sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_authors(&mut tx, id, author_ids).await?;
        }

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book; author links cascade
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

async fn link_authors(conn: &mut PgConnection, book_id: i32, author_ids: &[i32]) -> AppResult<()> {
    if author_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO book_authors (book_id, author_id)
        SELECT $1, UNNEST($2::INT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(book_id)
    .bind(author_ids)
    .execute(conn)
    .await?;
    Ok(())
}
