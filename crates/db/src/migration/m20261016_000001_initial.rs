//! Initial database migration.
//!
//! Creates the profile, policy, whitelist, transaction, approval and audit
//! tables. Enumerated columns are text guarded by CHECK constraints.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: IDENTITY
        // ============================================================
        db.execute_unprepared(PROFILES_SQL).await?;

        // ============================================================
        // PART 2: POLICY RECORDS
        // ============================================================
        db.execute_unprepared(SPENDING_LIMITS_SQL).await?;
        db.execute_unprepared(APPROVAL_WORKFLOWS_SQL).await?;

        // ============================================================
        // PART 3: PAYEE WHITELIST
        // ============================================================
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 4: APPROVALS & TRANSACTIONS
        // ============================================================
        db.execute_unprepared(APPROVAL_REQUESTS_SQL).await?;
        db.execute_unprepared(APPROVAL_ACTIONS_SQL).await?;
        db.execute_unprepared(FINANCIAL_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const PROFILES_SQL: &str = r"
CREATE TABLE profiles (
    id UUID PRIMARY KEY,
    full_name VARCHAR(255) NOT NULL,
    role VARCHAR(50) NOT NULL CHECK (role IN (
        'admin', 'monev', 'viewer', 'program_planner', 'program_implementer',
        'carbon_specialist', 'finance_manager', 'finance_operational',
        'finance_project', 'finance_auditor', 'investor'
    )),
    god_mode BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SPENDING_LIMITS_SQL: &str = r"
CREATE TABLE spending_limits (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    role VARCHAR(50) NOT NULL,
    limit_type VARCHAR(20) NOT NULL
        CHECK (limit_type IN ('PER_TRANSACTION', 'DAILY', 'MONTHLY', 'ANNUAL')),
    ledger_type VARCHAR(20)
        CHECK (ledger_type IS NULL OR ledger_type IN ('OPERASIONAL', 'PROYEK', 'ALL')),
    limit_amount NUMERIC(20, 4) NOT NULL CHECK (limit_amount >= 0),
    currency VARCHAR(3) NOT NULL DEFAULT 'IDR',
    is_active BOOLEAN NOT NULL DEFAULT true,
    description TEXT,
    created_by UUID REFERENCES profiles(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_spending_limits_role ON spending_limits(role) WHERE is_active;
";

const APPROVAL_WORKFLOWS_SQL: &str = r"
CREATE TABLE approval_workflows (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    workflow_name VARCHAR(255) NOT NULL CHECK (length(trim(workflow_name)) > 0),
    workflow_type VARCHAR(30) NOT NULL CHECK (workflow_type IN (
        'TRANSACTION', 'BUDGET', 'GRANT', 'BENEFIT_DISTRIBUTION', 'REPORT'
    )),
    min_approvals INTEGER NOT NULL CHECK (min_approvals >= 1),
    required_roles JSONB NOT NULL DEFAULT '[]'::jsonb
        CHECK (jsonb_typeof(required_roles) = 'array'),
    amount_threshold NUMERIC(20, 4) CHECK (amount_threshold IS NULL OR amount_threshold >= 0),
    ledger_type VARCHAR(20)
        CHECK (ledger_type IS NULL OR ledger_type IN ('OPERASIONAL', 'PROYEK', 'ALL')),
    auto_approve_days INTEGER CHECK (auto_approve_days IS NULL OR auto_approve_days > 0),
    is_active BOOLEAN NOT NULL DEFAULT true,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_approval_workflows_type ON approval_workflows(workflow_type) WHERE is_active;
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_number VARCHAR(50) NOT NULL,
    account_name VARCHAR(255) NOT NULL,
    bank_name VARCHAR(255) NOT NULL,
    verification_status VARCHAR(20) NOT NULL DEFAULT 'PENDING'
        CHECK (verification_status IN ('PENDING', 'VERIFIED', 'REJECTED', 'SUSPENDED')),
    verification_notes TEXT,
    verified_by UUID REFERENCES profiles(id) ON DELETE SET NULL,
    verified_at TIMESTAMPTZ,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_by UUID REFERENCES profiles(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (bank_name, account_number)
);
";

const APPROVAL_REQUESTS_SQL: &str = r"
CREATE TABLE approval_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    workflow_id UUID NOT NULL REFERENCES approval_workflows(id),
    subject_type VARCHAR(30) NOT NULL,
    subject_id UUID NOT NULL,
    amount NUMERIC(20, 4) NOT NULL,
    currency VARCHAR(3) NOT NULL,
    ledger_type VARCHAR(20) NOT NULL CHECK (ledger_type IN ('OPERASIONAL', 'PROYEK')),
    submitted_by UUID NOT NULL REFERENCES profiles(id),
    submitted_at TIMESTAMPTZ NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING'
        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED', 'AUTO_APPROVED')),
    decided_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_approval_requests_pending ON approval_requests(submitted_at)
    WHERE status = 'PENDING';
";

const APPROVAL_ACTIONS_SQL: &str = r"
CREATE TABLE approval_actions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    request_id UUID NOT NULL REFERENCES approval_requests(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL REFERENCES profiles(id),
    approver_role VARCHAR(50) NOT NULL,
    decision VARCHAR(10) NOT NULL CHECK (decision IN ('APPROVE', 'REJECT')),
    note TEXT,
    acted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (request_id, approver_id)
);
";

const FINANCIAL_TRANSACTIONS_SQL: &str = r"
CREATE TABLE financial_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by UUID NOT NULL REFERENCES profiles(id),
    actor_role VARCHAR(50) NOT NULL,
    ledger_type VARCHAR(20) NOT NULL CHECK (ledger_type IN ('OPERASIONAL', 'PROYEK')),
    amount NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL,
    payee_account_id UUID REFERENCES bank_accounts(id),
    description TEXT,
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('APPROVED', 'PENDING_APPROVAL', 'REJECTED')),
    approval_request_id UUID REFERENCES approval_requests(id),
    occurred_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_financial_transactions_actor
    ON financial_transactions(created_by, created_at);
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    actor_id UUID,
    action VARCHAR(30) NOT NULL,
    entity_type VARCHAR(50) NOT NULL,
    entity_id UUID,
    details JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_created ON audit_logs(created_at DESC);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS financial_transactions CASCADE;
DROP TABLE IF EXISTS approval_actions CASCADE;
DROP TABLE IF EXISTS approval_requests CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS approval_workflows CASCADE;
DROP TABLE IF EXISTS spending_limits CASCADE;
DROP TABLE IF EXISTS profiles CASCADE;
";
