pub mod admin;
pub mod donation;
pub mod user;

pub use admin::{Admin, AdminProfile, BankTransfer, CryptoWallet, CryptoWallets, PaymentMethods};
pub use donation::{CryptoType, Donation, DonationStatus, DonationView, PaymentMethod};
pub use user::{ProfileUpdate, User, UserProfile};
