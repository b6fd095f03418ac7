//! # Ledger Service
//!
//! Application layer of the wallet ledger: the transaction coordinator, the
//! reversal processor and the notification sinks.
//!
//! ## Architecture
//!
//! - `service` - Application service (orchestrates domain operations)
//! - `resolver` - Race-free get-or-create of a client's wallet
//! - `retry` - Conflict retry policy and cancellation signal
//! - `notify` - Notification sinks and the detached dispatcher
//!
//! The service is generic over `R: LedgerRepository`, allowing
//! different repository implementations to be injected.

pub mod notify;
pub mod resolver;
pub mod retry;
pub mod service;


pub use notify::{LogNotifier, WebhookNotifier, spawn_notification};
pub use resolver::get_or_create_wallet;
pub use retry::{CancelHandle, CancelSignal, RetryPolicy};
pub use service::LedgerService;
