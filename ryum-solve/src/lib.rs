#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod error;
pub use error::Error;

mod select;

mod solver;

mod transaction;
pub use transaction::AddResult;
pub use transaction::ResolveProgress;
pub use transaction::Transaction;
pub use transaction::Unresolved;
pub use transaction::UnresolvedReason;
pub use transaction::UpdateMember;
