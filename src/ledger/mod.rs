//! Loan ledger: book availability counts and the borrow/return lifecycle.
//!
//! Every operation runs inside one [`LedgerUnitOfWork`] obtained from a
//! [`LedgerStore`]. Nothing is visible to other requests until the unit of work
//! commits, and any error rolls the whole operation back.

#[cfg(test)]
pub(crate) mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        enums::{BookStatus, LoanStatus},
        loan::{CreateLoan, Loan, LoanHistory, NewLoan},
    },
};

/// Source of transaction-scoped units of work
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn LedgerUnitOfWork>>;
}

/// Reads and writes of a single ledger transaction.
///
/// Rows returned by the `lock_*` methods stay locked against concurrent units
/// of work until commit or rollback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    async fn borrower_exists(&mut self, borrower_id: i32) -> AppResult<bool>;

    async fn lock_book(&mut self, book_id: i32) -> AppResult<Option<Book>>;

    async fn update_book_stock(&mut self, book_id: i32, quantity: i32, status: BookStatus) -> AppResult<()>;

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan>;

    async fn lock_loan(&mut self, loan_id: i32) -> AppResult<Option<Loan>>;

    /// Flip the loan to returned and record when it came back
    async fn mark_loan_returned(&mut self, loan_id: i32, returned_at: DateTime<Utc>) -> AppResult<Loan>;

    async fn insert_history(
        &mut self,
        loan_id: i32,
        checkout_date: DateTime<Utc>,
        return_date: DateTime<Utc>,
    ) -> AppResult<LoanHistory>;

    async fn history_for_loan(&mut self, loan_id: i32) -> AppResult<Option<LoanHistory>>;

    async fn set_history_return(&mut self, history_id: i32, returned_at: DateTime<Utc>) -> AppResult<()>;

    async fn commit(&mut self) -> AppResult<()>;

    async fn rollback(&mut self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct LoanLedger {
    store: Arc<dyn LedgerStore>,
    max_batch_size: usize,
}

impl LoanLedger {
    pub fn new(store: Arc<dyn LedgerStore>, max_batch_size: usize) -> Self {
        Self {
            store,
            max_batch_size,
        }
    }

    /// Borrow every listed book for one borrower, all or nothing.
    ///
    /// Returns the created loan ids in request order.
    pub async fn borrow(&self, request: &CreateLoan) -> AppResult<Vec<i32>> {
        self.validate_borrow(request)?;

        let loan_date = start_of_day(request.loan_date);
        let return_date = start_of_day(request.return_date);

        let mut uow = self.store.begin().await?;
        match borrow_in(uow.as_mut(), request, loan_date, return_date).await {
            Ok(loan_ids) => {
                uow.commit().await?;
                tracing::info!(
                    borrower_id = request.borrower_id,
                    ?loan_ids,
                    "Borrowed {} book(s)",
                    loan_ids.len()
                );
                Ok(loan_ids)
            }
            Err(e) => {
                discard(uow.as_mut()).await;
                tracing::warn!(borrower_id = request.borrower_id, "Borrow rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Return a loan: put the copy back on the shelf and close the history row
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<Loan> {
        let mut uow = self.store.begin().await?;
        match return_in(uow.as_mut(), loan_id, Utc::now()).await {
            Ok(loan) => {
                uow.commit().await?;
                tracing::info!(loan_id, book_id = loan.book_id, "Loan returned");
                Ok(loan)
            }
            Err(e) => {
                discard(uow.as_mut()).await;
                tracing::warn!(loan_id, "Return rejected: {}", e);
                Err(e)
            }
        }
    }

    fn validate_borrow(&self, request: &CreateLoan) -> AppResult<()> {
        if request.book_ids.is_empty() {
            return Err(AppError::Validation("book_ids must not be empty".to_string()));
        }
        if request.book_ids.len() > self.max_batch_size {
            return Err(AppError::Validation(format!(
                "At most {} books can be borrowed at once",
                self.max_batch_size
            )));
        }
        if request.loan_date > request.return_date {
            return Err(AppError::Validation(
                "loan_date must not be after return_date".to_string(),
            ));
        }
        Ok(())
    }
}

async fn borrow_in(
    uow: &mut dyn LedgerUnitOfWork,
    request: &CreateLoan,
    loan_date: DateTime<Utc>,
    return_date: DateTime<Utc>,
) -> AppResult<Vec<i32>> {
    if !uow.borrower_exists(request.borrower_id).await? {
        return Err(AppError::NotFound(format!(
            "Borrower with id {} not found",
            request.borrower_id
        )));
    }

    // Lock in ascending id order so overlapping batches cannot deadlock
    let mut stock = BTreeMap::new();
    let mut lock_order = request.book_ids.clone();
    lock_order.sort_unstable();
    lock_order.dedup();
    for book_id in lock_order {
        let book = uow
            .lock_book(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;
        stock.insert(book_id, book.quantity);
    }

    let mut loan_ids = Vec::with_capacity(request.book_ids.len());
    for &book_id in &request.book_ids {
        let quantity = stock.get_mut(&book_id).ok_or_else(|| {
            AppError::Internal(format!("Book {} was not locked", book_id))
        })?;
        if *quantity <= 0 {
            return Err(AppError::OutOfStock(format!(
                "Book with id {} has no copies available",
                book_id
            )));
        }
        *quantity -= 1;

        uow.update_book_stock(book_id, *quantity, BookStatus::for_quantity(*quantity))
            .await?;

        let loan = uow
            .insert_loan(&NewLoan {
                book_id,
                borrower_id: request.borrower_id,
                loan_date,
                return_date,
            })
            .await?;
        uow.insert_history(loan.id, loan_date, return_date).await?;

        loan_ids.push(loan.id);
    }

    Ok(loan_ids)
}

async fn return_in(
    uow: &mut dyn LedgerUnitOfWork,
    loan_id: i32,
    now: DateTime<Utc>,
) -> AppResult<Loan> {
    let loan = uow
        .lock_loan(loan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

    if loan.status == LoanStatus::Returned {
        return Err(AppError::BusinessRule("Loan already returned".to_string()));
    }

    let book = uow.lock_book(loan.book_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("Book with id {} not found", loan.book_id))
    })?;
    uow.update_book_stock(book.id, book.quantity + 1, BookStatus::Available)
        .await?;

    let loan = uow.mark_loan_returned(loan_id, now).await?;

    match uow.history_for_loan(loan_id).await? {
        Some(history) => uow.set_history_return(history.id, now).await?,
        None => {
            tracing::warn!(loan_id, "Loan had no history row, recreating it");
            uow.insert_history(loan_id, loan.loan_date, now).await?;
        }
    }

    Ok(loan)
}

async fn discard(uow: &mut dyn LedgerUnitOfWork) {
    if let Err(e) = uow.rollback().await {
        tracing::error!("Rollback failed: {}", e);
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryLedgerStore;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(book_ids: Vec<i32>, borrower_id: i32) -> CreateLoan {
        CreateLoan {
            book_ids,
            borrower_id,
            loan_date: date(2024, 1, 1),
            return_date: date(2024, 1, 15),
        }
    }

    fn ledger(store: &Arc<MemoryLedgerStore>) -> LoanLedger {
        LoanLedger::new(store.clone(), 10)
    }

    #[tokio::test]
    async fn borrowing_last_copy_marks_book_borrowed() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 1).await;
        store.add_borrower(7).await;

        let loan_ids = ledger(&store).borrow(&request(vec![42], 7)).await.unwrap();

        let state = store.snapshot().await;
        let book = &state.books[&42];
        assert_eq!(loan_ids.len(), 1);
        assert_eq!(book.quantity, 0);
        assert_eq!(book.status, BookStatus::Borrowed);

        let loan = &state.loans[&loan_ids[0]];
        assert_eq!(loan.book_id, 42);
        assert_eq!(loan.borrower_id, 7);
        assert_eq!(loan.status, LoanStatus::Borrowed);
        assert_eq!(loan.loan_date, start_of_day(date(2024, 1, 1)));
        assert_eq!(loan.return_date, Some(start_of_day(date(2024, 1, 15))));

        assert_eq!(state.history.len(), 1);
        let history = state.history.values().next().unwrap();
        assert_eq!(history.loan_id, loan_ids[0]);
        assert_eq!(history.checkout_date, loan.loan_date);
    }

    #[tokio::test]
    async fn borrowing_with_copies_left_keeps_book_available() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(1, 3).await;
        store.add_borrower(7).await;

        ledger(&store).borrow(&request(vec![1], 7)).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.books[&1].quantity, 2);
        assert_eq!(state.books[&1].status, BookStatus::Available);
    }

    #[tokio::test]
    async fn out_of_stock_leaves_state_unchanged() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 0).await;
        store.add_borrower(7).await;
        let before = store.snapshot().await;

        let err = ledger(&store).borrow(&request(vec![42], 7)).await.unwrap_err();

        assert!(matches!(err, AppError::OutOfStock(_)));
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn failing_member_rolls_back_whole_batch() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(1, 5).await;
        store.add_book(2, 0).await;
        store.add_borrower(7).await;
        let before = store.snapshot().await;

        let err = ledger(&store)
            .borrow(&request(vec![1, 2], 7))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OutOfStock(_)));
        let after = store.snapshot().await;
        assert_eq!(after, before);
        assert_eq!(after.books[&1].quantity, 5);
        assert!(after.loans.is_empty());
    }

    #[tokio::test]
    async fn missing_book_rolls_back_whole_batch() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(1, 5).await;
        store.add_borrower(7).await;

        let err = ledger(&store)
            .borrow(&request(vec![1, 99], 7))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.snapshot().await.books[&1].quantity, 5);
    }

    #[tokio::test]
    async fn duplicate_ids_take_one_copy_each() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(1, 2).await;
        store.add_borrower(7).await;

        let loan_ids = ledger(&store).borrow(&request(vec![1, 1], 7)).await.unwrap();
        assert_eq!(loan_ids.len(), 2);
        assert_eq!(store.snapshot().await.books[&1].quantity, 0);

        store.add_book(2, 1).await;
        let err = ledger(&store).borrow(&request(vec![2, 2], 7)).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfStock(_)));
        assert_eq!(store.snapshot().await.books[&2].quantity, 1);
    }

    #[tokio::test]
    async fn unknown_borrower_is_not_found() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(1, 1).await;

        let err = ledger(&store).borrow(&request(vec![1], 7)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.snapshot().await.books[&1].quantity, 1);
    }

    #[tokio::test]
    async fn borrow_request_is_validated_before_touching_the_store() {
        let mut store = MockLedgerStore::new();
        store.expect_begin().never();
        let ledger = LoanLedger::new(Arc::new(store), 2);

        let empty = ledger.borrow(&request(vec![], 7)).await.unwrap_err();
        assert!(matches!(empty, AppError::Validation(_)));

        let too_many = ledger.borrow(&request(vec![1, 2, 3], 7)).await.unwrap_err();
        assert!(matches!(too_many, AppError::Validation(_)));

        let mut backwards = request(vec![1], 7);
        backwards.loan_date = date(2024, 2, 1);
        let backwards = ledger.borrow(&backwards).await.unwrap_err();
        assert!(matches!(backwards, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn return_puts_copy_back_and_closes_history() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 1).await;
        store.add_borrower(7).await;
        let ledger = ledger(&store);
        let loan_id = ledger.borrow(&request(vec![42], 7)).await.unwrap()[0];

        let loan = ledger.return_loan(loan_id).await.unwrap();

        assert_eq!(loan.status, LoanStatus::Returned);
        let state = store.snapshot().await;
        assert_eq!(state.books[&42].quantity, 1);
        assert_eq!(state.books[&42].status, BookStatus::Available);
        assert_eq!(state.loans[&loan_id].status, LoanStatus::Returned);

        let history: Vec<_> = state.history.values().collect();
        assert_eq!(history.len(), 1);
        assert!(history[0].return_date > start_of_day(date(2024, 1, 15)));
    }

    #[tokio::test]
    async fn return_stamps_actual_time_on_loan_and_history() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 1).await;
        store.add_borrower(7).await;
        let mut long_loan = request(vec![42], 7);
        long_loan.return_date = date(2024, 3, 1);
        let loan_id = ledger(&store).borrow(&long_loan).await.unwrap()[0];

        let back = start_of_day(date(2024, 1, 3));
        let mut uow = store.begin().await.unwrap();
        let loan = return_in(uow.as_mut(), loan_id, back).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(loan.returned_at, Some(back));
        assert_eq!(loan.return_date, Some(start_of_day(date(2024, 3, 1))));
        assert_eq!(
            crate::models::loan::LoanDetails::from(loan).display_status,
            crate::models::enums::LoanDisplayStatus::Returned
        );

        let state = store.snapshot().await;
        assert_eq!(state.loans[&loan_id].returned_at, Some(back));
        assert_eq!(state.history.values().next().unwrap().return_date, back);
    }

    #[tokio::test]
    async fn return_increments_by_exactly_one() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(5, 3).await;
        store.add_borrower(7).await;
        let ledger = ledger(&store);
        let loan_ids = ledger.borrow(&request(vec![5, 5], 7)).await.unwrap();
        assert_eq!(store.snapshot().await.books[&5].quantity, 1);

        ledger.return_loan(loan_ids[1]).await.unwrap();
        assert_eq!(store.snapshot().await.books[&5].quantity, 2);
    }

    #[tokio::test]
    async fn second_return_is_rejected_without_side_effects() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 1).await;
        store.add_borrower(7).await;
        let ledger = ledger(&store);
        let loan_id = ledger.borrow(&request(vec![42], 7)).await.unwrap()[0];
        ledger.return_loan(loan_id).await.unwrap();
        let before = store.snapshot().await;

        let err = ledger.return_loan(loan_id).await.unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(_)));
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn returning_unknown_loan_is_not_found() {
        let store = Arc::new(MemoryLedgerStore::default());
        let err = ledger(&store).return_loan(404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn return_recreates_missing_history_row() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 1).await;
        store.add_borrower(7).await;
        let ledger = ledger(&store);
        let loan_id = ledger.borrow(&request(vec![42], 7)).await.unwrap()[0];
        store.clear_history().await;

        ledger.return_loan(loan_id).await.unwrap();

        let state = store.snapshot().await;
        let history: Vec<_> = state.history.values().collect();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].loan_id, loan_id);
        assert_eq!(history[0].checkout_date, start_of_day(date(2024, 1, 1)));
    }

    #[tokio::test]
    async fn concurrent_borrows_of_last_copy_only_one_wins() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.add_book(42, 1).await;
        store.add_borrower(7).await;
        store.add_borrower(8).await;
        let ledger = ledger(&store);

        let first = request(vec![42], 7);
        let second = request(vec![42], 8);
        let (a, b) = tokio::join!(ledger.borrow(&first), ledger.borrow(&second));

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let state = store.snapshot().await;
        assert_eq!(state.books[&42].quantity, 0);
        assert_eq!(state.loans.len(), 1);
    }

    #[tokio::test]
    async fn commit_failure_surfaces_as_database_error() {
        let mut uow = MockLedgerUnitOfWork::new();
        uow.expect_borrower_exists().returning(|_| Ok(true));
        uow.expect_lock_book()
            .returning(|id| Ok(Some(MemoryLedgerStore::book(id, 1))));
        uow.expect_update_book_stock().returning(|_, _, _| Ok(()));
        uow.expect_insert_loan()
            .returning(|new| Ok(MemoryLedgerStore::loan(1, new)));
        uow.expect_insert_history().returning(|loan_id, checkout, ret| {
            Ok(LoanHistory {
                id: 1,
                loan_id,
                checkout_date: checkout,
                return_date: ret,
            })
        });
        uow.expect_commit()
            .times(1)
            .returning(|| Err(AppError::Database(sqlx::Error::PoolClosed)));

        let mut store = MockLedgerStore::new();
        let mut uow = Some(uow);
        store.expect_begin().times(1).returning(move || {
            let uow = uow.take().expect("begin called once");
            Ok(Box::new(uow) as Box<dyn LedgerUnitOfWork>)
        });

        let err = LoanLedger::new(Arc::new(store), 10)
            .borrow(&request(vec![42], 7))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn failed_operation_rolls_back_unit_of_work() {
        let mut uow = MockLedgerUnitOfWork::new();
        uow.expect_lock_loan().returning(|_| Ok(None));
        uow.expect_commit().never();
        uow.expect_rollback().times(1).returning(|| Ok(()));

        let mut store = MockLedgerStore::new();
        let mut uow = Some(uow);
        store.expect_begin().times(1).returning(move || {
            let uow = uow.take().expect("begin called once");
            Ok(Box::new(uow) as Box<dyn LedgerUnitOfWork>)
        });

        let err = LoanLedger::new(Arc::new(store), 10)
            .return_loan(9)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
