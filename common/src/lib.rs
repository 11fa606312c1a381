//! Visit Roster Common Library
//!
//! 店舗名のあいまい照合・クライアント帰属・集計と、CLIで共有される型

pub mod alias;
pub mod attribution;
pub mod auth;
pub mod dates;
pub mod directory;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod message;
pub mod normalizer;
pub mod requests;
pub mod roster;
pub mod schema;
pub mod stats;
pub mod table;
pub mod types;

pub use alias::{inject_aliases, AliasConfig, AliasRule};
pub use attribution::ClientAttributor;
pub use auth::{Credentials, Roles};
pub use directory::{DirectoryEntry, DirectoryIndex, StoreDirectory, TokenizedEntry};
pub use error::{Error, Result};
pub use filter::{DateFilter, Filters, Page, PAGE_SIZE};
pub use matcher::{resolve, ClientMatch, MatchConfig};
pub use normalizer::{normalize, store_key};
pub use roster::{build_timeline, DaySchedule, PendingSource, Roster};
pub use stats::{aggregate, Bucket, DashboardStats};
pub use table::Table;
pub use types::{
    ChangeRecord, ChangeType, EditMode, LogRecord, NewInclusion, PendingStoreChange, PendingTimeChange,
    StatusUpdate, Visit, VisitKey, STATUS_DONE,
};
