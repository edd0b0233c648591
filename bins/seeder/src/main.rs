//! Database seeder for Rimba development and testing.
//!
//! Creates a profile per finance role, a starter set of spending limits and
//! approval workflows, and two whitelisted payees. Re-running is safe:
//! profiles are upserted and the other tables are only seeded when empty.
//!
//! Usage:
//!   cargo run --bin seeder
//!   cargo run --bin seeder -- --tokens   # also print dev bearer tokens

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use rimba_core::access::{Profile, Role};
use rimba_core::payee::VerificationStatus;
use rimba_core::spending::{LedgerScope, LimitType};
use rimba_core::workflow::WorkflowType;
use rimba_db::repositories::{
    CreateApprovalWorkflowInput, CreateBankAccountInput, CreateSpendingLimitInput,
};
use rimba_db::{
    ApprovalWorkflowRepository, BankAccountRepository, ProfileRepository,
    SpendingLimitRepository, connect_with,
};
use rimba_shared::types::{Currency, UserId};
use rimba_shared::{AppConfig, JwtConfig, JwtService};

// Fixed UUIDs so tokens printed by one run stay valid across re-seeds.
const ADMIN_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0001);
const FINANCE_MANAGER_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0002);
const FINANCE_OPERATIONAL_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0003);
const FINANCE_PROJECT_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0004);
const FINANCE_AUDITOR_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0005);
const VIEWER_ID: Uuid = Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0006);

fn rupiah(amount: i64) -> Decimal {
    Decimal::new(amount, 0)
}

fn profiles() -> Vec<Profile> {
    [
        (ADMIN_ID, "Admin Rimba", Role::Admin, true),
        (FINANCE_MANAGER_ID, "Sari Wulandari", Role::FinanceManager, false),
        (FINANCE_OPERATIONAL_ID, "Budi Santoso", Role::FinanceOperational, false),
        (FINANCE_PROJECT_ID, "Dewi Lestari", Role::FinanceProject, false),
        (FINANCE_AUDITOR_ID, "Agus Pratama", Role::FinanceAuditor, false),
        (VIEWER_ID, "Tamu Dashboard", Role::Viewer, false),
    ]
    .into_iter()
    .map(|(id, name, role, god_mode)| Profile {
        user_id: UserId::from_uuid(id),
        full_name: name.to_string(),
        role,
        god_mode,
        is_active: true,
    })
    .collect()
}

fn spending_limits() -> Vec<CreateSpendingLimitInput> {
    let limit = |role, limit_type, ledger_type, amount: i64, description: &str| {
        CreateSpendingLimitInput {
            role,
            limit_type,
            ledger_type,
            limit_amount: rupiah(amount),
            currency: Currency::Idr,
            description: Some(description.to_string()),
            created_by: Some(UserId::from_uuid(ADMIN_ID)),
        }
    };

    vec![
        limit(
            Role::FinanceOperational,
            LimitType::PerTransaction,
            Some(LedgerScope::Operasional),
            5_000_000,
            "Operational single spend cap",
        ),
        limit(
            Role::FinanceOperational,
            LimitType::Daily,
            None,
            20_000_000,
            "Operational daily cap",
        ),
        limit(
            Role::FinanceProject,
            LimitType::PerTransaction,
            Some(LedgerScope::Proyek),
            25_000_000,
            "Project single spend cap",
        ),
        limit(
            Role::FinanceProject,
            LimitType::Monthly,
            Some(LedgerScope::Proyek),
            250_000_000,
            "Project monthly cap",
        ),
        limit(
            Role::FinanceManager,
            LimitType::Monthly,
            None,
            1_000_000_000,
            "Finance manager monthly cap",
        ),
    ]
}

fn workflows() -> Vec<CreateApprovalWorkflowInput> {
    vec![
        CreateApprovalWorkflowInput {
            workflow_name: "Operasional di atas 5 juta".to_string(),
            workflow_type: WorkflowType::Transaction,
            min_approvals: 1,
            required_roles: BTreeSet::from([Role::FinanceManager]),
            amount_threshold: Some(rupiah(5_000_000)),
            ledger_type: Some(LedgerScope::Operasional),
            auto_approve_days: Some(3),
            description: Some("Operational spends above the bookkeeper cap".to_string()),
        },
        CreateApprovalWorkflowInput {
            workflow_name: "Proyek besar".to_string(),
            workflow_type: WorkflowType::Transaction,
            min_approvals: 2,
            required_roles: BTreeSet::from([Role::FinanceManager, Role::Admin]),
            amount_threshold: Some(rupiah(50_000_000)),
            ledger_type: Some(LedgerScope::Proyek),
            auto_approve_days: None,
            description: Some("Large project disbursements".to_string()),
        },
        CreateApprovalWorkflowInput {
            workflow_name: "Pengeluaran umum".to_string(),
            workflow_type: WorkflowType::Transaction,
            min_approvals: 1,
            required_roles: BTreeSet::from([Role::FinanceManager, Role::Admin]),
            amount_threshold: Some(rupiah(10_000_000)),
            ledger_type: None,
            auto_approve_days: Some(5),
            description: None,
        },
    ]
}

fn bank_accounts() -> Vec<(CreateBankAccountInput, VerificationStatus)> {
    let account = |number: &str, name: &str, bank: &str| CreateBankAccountInput {
        account_number: number.to_string(),
        account_name: name.to_string(),
        bank_name: bank.to_string(),
        verification_status: None,
        verification_notes: None,
        created_by: Some(UserId::from_uuid(FINANCE_MANAGER_ID)),
    };

    vec![
        (
            account("1234567890", "CV Bibit Hutan Lestari", "Bank Mandiri"),
            VerificationStatus::Verified,
        ),
        (
            account("0987654321", "Koperasi Tani Hutan", "BRI"),
            VerificationStatus::Pending,
        ),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let print_tokens = std::env::args().any(|a| a == "--tokens");
    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = connect_with(&config.database).await?;
    println!("Connected!");

    println!("\nSeeding profiles...");
    let profile_repo = ProfileRepository::new(db.clone());
    let profiles = profiles();
    for profile in &profiles {
        profile_repo.upsert(profile).await?;
        println!("  {} ({})", profile.full_name, profile.role);
    }

    println!("\nSeeding spending limits...");
    let limit_repo = SpendingLimitRepository::new(db.clone());
    if limit_repo.list_limits(false).await?.is_empty() {
        for input in spending_limits() {
            let model = limit_repo.create_limit(input).await?;
            println!(
                "  {} {} {} {}",
                model.role, model.limit_type, model.limit_amount, model.currency
            );
        }
    } else {
        println!("  Already present, skipping");
    }

    println!("\nSeeding approval workflows...");
    let workflow_repo = ApprovalWorkflowRepository::new(db.clone());
    if workflow_repo.list_workflows(false).await?.is_empty() {
        for input in workflows() {
            let model = workflow_repo.create_workflow(input).await?;
            println!("  {} (min {})", model.workflow_name, model.min_approvals);
        }
    } else {
        println!("  Already present, skipping");
    }

    println!("\nSeeding bank accounts...");
    let account_repo = BankAccountRepository::new(db.clone());
    if account_repo.list_accounts(None).await?.is_empty() {
        for (input, status) in bank_accounts() {
            let mut model = account_repo.create_account(input).await?;
            if status != VerificationStatus::Pending {
                model = account_repo
                    .verify_account(
                        model.id,
                        status,
                        UserId::from_uuid(FINANCE_MANAGER_ID),
                        Some("Seeded".to_string()),
                        Utc::now(),
                    )
                    .await?;
            }
            println!(
                "  {} / {} [{}]",
                model.bank_name, model.account_name, model.verification_status
            );
        }
    } else {
        println!("  Already present, skipping");
    }

    if print_tokens {
        println!("\nDev bearer tokens:");
        let jwt = JwtService::new(JwtConfig::from(&config.jwt));
        for profile in &profiles {
            let token = jwt.generate_access_token(profile.user_id.into_inner(), None)?;
            println!("  {:<22} {}", profile.role.as_str(), token);
        }
    }

    println!("\nSeeding complete!");
    Ok(())
}
