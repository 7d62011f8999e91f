//! Collaborator interfaces consumed by the category store.
//!
//! The HTTP client implements both traits; tests substitute fakes.

use std::future::Future;
use std::sync::Arc;

use reelbox_core::models::{ContentKind, ContentPage};

use crate::error::ApiError;

/// A paginated remote catalog.
pub trait ContentProvider: Send + Sync {
    /// Fetch one page of `kind` items filtered by `tag`, starting at `offset`.
    ///
    /// A page with no rows served means the catalog is exhausted.
    fn fetch_page(
        &self,
        kind: ContentKind,
        tag: &str,
        page_size: u32,
        offset: usize,
    ) -> impl Future<Output = Result<ContentPage, ApiError>> + Send;
}

/// Login state for the catalog server.
pub trait SessionProvider: Send + Sync {
    fn is_logged_in(&self) -> bool;

    /// Re-validate the session; updates `is_logged_in` as a side effect.
    fn check_login_status(
        &self,
        api_base_url: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl<T: ContentProvider + ?Sized> ContentProvider for Arc<T> {
    fn fetch_page(
        &self,
        kind: ContentKind,
        tag: &str,
        page_size: u32,
        offset: usize,
    ) -> impl Future<Output = Result<ContentPage, ApiError>> + Send {
        (**self).fetch_page(kind, tag, page_size, offset)
    }
}

impl<T: SessionProvider + ?Sized> SessionProvider for Arc<T> {
    fn is_logged_in(&self) -> bool {
        (**self).is_logged_in()
    }

    fn check_login_status(
        &self,
        api_base_url: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).check_login_status(api_base_url)
    }
}
