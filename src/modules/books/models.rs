use bookshelf_http::KeySchema;
use bookshelf_store::Record;
use serde::{Deserialize, Serialize};

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
}

impl Book {
    /// Accepted body of `POST /api/books`.
    pub const SCHEMA: KeySchema = KeySchema::exact(&["id", "title", "author"]);

    pub fn new(id: i64, title: &str, author: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            author: author.to_string(),
        }
    }
}

/// Request model for replacing a book's title and author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBook {
    pub title: String,
    pub author: String,
}

impl UpdateBook {
    /// Accepted body of `PUT /api/books/{id}`.
    pub const SCHEMA: KeySchema = KeySchema::exact(&["title", "author"]);
}

impl Record for Book {
    type Key = i64;
    type Patch = UpdateBook;

    fn key(&self) -> &i64 {
        &self.id
    }

    fn apply(&mut self, patch: UpdateBook) {
        self.title = patch.title;
        self.author = patch.author;
    }
}

/// Catalogue loaded when `store.seed_books` is enabled.
pub fn seed_catalogue() -> Vec<Book> {
    vec![
        Book::new(1, "The Fellowship of the Ring", "J.R.R. Tolkien"),
        Book::new(2, "Harry Potter and the Philosopher's Stone", "J.K. Rowling"),
        Book::new(3, "The Two Towers", "J.R.R. Tolkien"),
        Book::new(4, "Harry Potter and the Chamber of Secrets", "J.K. Rowling"),
        Book::new(5, "The Return of the King", "J.R.R. Tolkien"),
    ]
}
