//! Data models exchanged with the library service.
//!
//! - `Book`, `NewBook`: catalogue entries and new-book submissions
//! - `User`: borrower and staff accounts
//! - `BorrowRequest`, `ReturnRequest`: loan transactions
//! - `AvailabilityReport`, `OverdueReport`: report payloads
//! - `LoginRequest`, `SignupRequest`, `LoginResponse`: authentication
//! - `Page`, `Ack`: response envelopes shared by several endpoints

pub mod account;
pub mod book;
pub mod common;
pub mod loan;
pub mod report;
pub mod user;

pub use account::{LoginRequest, LoginResponse, SignupRequest};
pub use book::{Book, NewBook};
pub use common::{Ack, DataEnvelope, ListResponse, Page, Pagination};
pub use loan::{parse_id, BorrowRequest, ReturnRequest};
pub use report::{AvailabilityReport, OverdueItem, OverdueReport};
pub use user::User;
