// core/src/requests.rs

//! Review queue for catalog submissions. Approval publishes the book and
//! closes the request in one store call.

use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{Book, BookId, BookRequest, NewBook, UserId};
use crate::store::BookRequestStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct BookRequestService {
  store: Arc<dyn BookRequestStore>,
}

impl BookRequestService {
  pub fn new(store: Arc<dyn BookRequestStore>) -> Self {
    Self { store }
  }

  pub async fn list_requests(&self) -> BookstoreResult<Vec<BookRequest>> {
    self.store.list_requests().await
  }

  #[instrument(name = "BookRequestService::submit", skip_all, fields(user_id = %requested_by, title = %submission.title))]
  pub async fn submit(&self, requested_by: UserId, submission: NewBook) -> BookstoreResult<BookRequest> {
    submission.validate()?;
    let request = BookRequest::pending(submission, requested_by, Utc::now());
    self.store.insert_request(&request).await?;
    info!(book_id = %request.book_id, "Book request submitted.");
    Ok(request)
  }

  /// Publishes a pending request to the catalog. Returns the closed request
  /// and the new book, which keeps the request's identifier.
  #[instrument(name = "BookRequestService::approve", skip(self))]
  pub async fn approve(&self, book_id: BookId) -> BookstoreResult<(BookRequest, Book)> {
    match self.store.approve_request(book_id, Utc::now()).await? {
      Some(approved) => {
        info!("Book request approved and published.");
        Ok(approved)
      }
      None => {
        warn!("No pending book request to approve.");
        Err(BookstoreError::not_found("Pending book request", book_id))
      }
    }
  }

  #[instrument(name = "BookRequestService::reject", skip(self))]
  pub async fn reject(&self, book_id: BookId) -> BookstoreResult<BookRequest> {
    let rejected = self
      .store
      .reject_request(book_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Pending book request", book_id))?;
    info!("Book request rejected.");
    Ok(rejected)
  }
}
