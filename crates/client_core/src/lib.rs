//! Client for the catalog admin REST API.
//!
//! [`ApiClient`] is the HTTP boundary; every screen of the admin tool is a
//! store on top of it. The product list is driven by
//! [`ProductQueryCoordinator`], which makes sure only the most recently
//! started listing fetch can change what is displayed.

use shared::domain::UserId;

pub mod auth;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod dashboard;
pub mod drafts;
pub mod notifications;
pub mod query;
pub mod token_store;
pub mod transport;

pub use auth::{AuthSession, SessionUser};
pub use catalog::{CatalogStore, CategoryStore, FilterOptions, PlatformStore, ProductCatalog};
pub use config::{load_settings, ClientSettings};
pub use coordinator::{FetchPhase, ListingEndpoint, ProductQueryCoordinator, QueryIntent, QueryView};
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use drafts::{BulkDraftList, ProductDraft};
pub use notifications::{InboxState, NotificationInbox};
pub use query::{FilterPatch, Pagination, PaginationPatch, ProductFilters, QueryState, Sorter};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::ApiClient;

/// Process-wide notifications broadcast by [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    LoggedIn { user_id: UserId, username: String },
    LoggedOut,
    /// The server answered 401; the stored token has been cleared.
    SessionExpired,
}
