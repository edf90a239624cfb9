pub mod bank_transfer;
pub mod donation;
pub mod receipt;
pub mod recurring;

pub use bank_transfer::{BankTransferReference, BankTransferStatus, NewBankTransfer};
pub use donation::{
    Donation, DonationStatus, DonationTotals, NewDonation, PaymentMethod, PublicDonor,
    RefundStatus,
};
pub use receipt::{DonationReceipt, ReceiptDetails};
pub use recurring::{
    NewRecurringDonation, RecurringDonation, RecurringFrequency, RecurringStatus,
    MAX_CONSECUTIVE_FAILURES,
};
