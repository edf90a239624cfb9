pub mod bank_transfers;
pub mod checkout;
pub mod history;
pub mod recurring;
pub mod refunds;
pub mod settlement;

pub use bank_transfers::*;
pub use checkout::*;
pub use history::*;
pub use recurring::*;
pub use refunds::*;
