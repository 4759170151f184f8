//! Data models for the library server

pub mod author;
pub mod book;
pub mod borrower;
pub mod category;
pub mod employee;
pub mod enums;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails};
pub use borrower::Borrower;
pub use category::Category;
pub use employee::Employee;
pub use enums::{BookStatus, LoanDisplayStatus, LoanStatus};
pub use loan::{Loan, LoanHistory};
pub use user::{Role, UserClaims};
