//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval_request;
pub mod approval_workflow;
pub mod audit_log;
pub mod bank_account;
pub mod console;
pub mod profile;
pub mod spending_limit;
pub mod transaction;

pub use approval_request::{ApprovalRequestError, ApprovalRequestFilter, ApprovalRequestRepository};
pub use approval_workflow::{
    ApprovalWorkflowError, ApprovalWorkflowRepository, CreateApprovalWorkflowInput,
    UpdateApprovalWorkflowInput,
};
pub use audit_log::{AuditLogFilter, AuditLogRepository};
pub use bank_account::{
    BankAccountError, BankAccountRepository, CreateBankAccountInput, UpdateBankAccountInput,
};
pub use console::{ConsoleRepository, ConsoleResult};
pub use profile::ProfileRepository;
pub use spending_limit::{
    CreateSpendingLimitInput, SpendingLimitError, SpendingLimitRepository,
    UpdateSpendingLimitInput,
};
pub use transaction::{
    CreateTransactionInput, TransactionError, TransactionFilter, TransactionRepository,
};
