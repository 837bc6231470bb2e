//! Postgres backends for the store contracts. Every statement is a
//! parameterized query; the sort column and direction are interpolated only
//! from the allow-listed enums, never from request text.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};

use erights::auth::{AdminAccount, AdminDirectory, AdminStoreError};
use erights::registry::{import::ShareholderRecord, Shareholder, ShareholderDirectory};
use erights::submissions::{
    PageRequest, RightsAction, SortField, SortOrder, StoreError, Submission, SubmissionDraft,
    SubmissionFilter, SubmissionKind, SubmissionStatus, SubmissionStore,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS shareholders (
        id BIGSERIAL PRIMARY KEY,
        reg_account_number TEXT NOT NULL UNIQUE,
        chn TEXT UNIQUE,
        name TEXT NOT NULL,
        holdings BIGINT NOT NULL DEFAULT 0,
        rights_issue BIGINT NOT NULL DEFAULT 0,
        holdings_after BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS submissions (
        id BIGSERIAL PRIMARY KEY,
        kind TEXT NOT NULL,
        shareholder_id BIGINT NOT NULL REFERENCES shareholders(id),
        reg_account_number TEXT NOT NULL,
        name TEXT NOT NULL,
        chn TEXT,
        bvn TEXT,
        holdings BIGINT NOT NULL DEFAULT 0,
        rights_issue BIGINT NOT NULL DEFAULT 0,
        holdings_after BIGINT NOT NULL DEFAULT 0,
        action_type TEXT NOT NULL,
        shares_accepted BIGINT,
        shares_renounced BIGINT,
        apply_additional BOOLEAN NOT NULL DEFAULT FALSE,
        additional_shares BIGINT,
        amount_due BIGINT NOT NULL DEFAULT 0,
        additional_amount BIGINT,
        amount_payable BIGINT NOT NULL DEFAULT 0,
        payment_amount BIGINT,
        additional_payment_cheque_number TEXT,
        partial_payment_cheque_number TEXT,
        contact_name TEXT,
        email TEXT NOT NULL,
        mobile_phone TEXT,
        daytime_phone TEXT,
        filled_form_path TEXT,
        receipt_path TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS submissions_kind_idx ON submissions (kind)",
    "CREATE INDEX IF NOT EXISTS submissions_status_idx ON submissions (status)",
    "CREATE INDEX IF NOT EXISTS submissions_created_at_idx ON submissions (created_at)",
    "CREATE TABLE IF NOT EXISTS admin_users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )",
];

pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

/// Bring the schema up on startup; every statement is idempotent.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

fn store_err(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn decode_err(column: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unrecognized {column} label '{value}'").into())
}

fn submission_from_row(row: &PgRow) -> Result<Submission, sqlx::Error> {
    let kind_label: String = row.try_get("kind")?;
    let action_label: String = row.try_get("action_type")?;
    let status_label: String = row.try_get("status")?;

    Ok(Submission {
        id: row.try_get("id")?,
        kind: SubmissionKind::parse(&kind_label)
            .ok_or_else(|| decode_err("kind", &kind_label))?,
        shareholder_id: row.try_get("shareholder_id")?,
        reg_account_number: row.try_get("reg_account_number")?,
        name: row.try_get("name")?,
        chn: row.try_get("chn")?,
        bvn: row.try_get("bvn")?,
        holdings: row.try_get("holdings")?,
        rights_issue: row.try_get("rights_issue")?,
        holdings_after: row.try_get("holdings_after")?,
        action: RightsAction::parse(&action_label)
            .ok_or_else(|| decode_err("action_type", &action_label))?,
        shares_accepted: row.try_get("shares_accepted")?,
        shares_renounced: row.try_get("shares_renounced")?,
        apply_additional: row.try_get("apply_additional")?,
        additional_shares: row.try_get("additional_shares")?,
        amount_due: row.try_get("amount_due")?,
        additional_amount: row.try_get("additional_amount")?,
        amount_payable: row.try_get("amount_payable")?,
        payment_amount: row.try_get("payment_amount")?,
        additional_payment_cheque_number: row.try_get("additional_payment_cheque_number")?,
        partial_payment_cheque_number: row.try_get("partial_payment_cheque_number")?,
        contact_name: row.try_get("contact_name")?,
        email: row.try_get("email")?,
        mobile_phone: row.try_get("mobile_phone")?,
        daytime_phone: row.try_get("daytime_phone")?,
        filled_form_path: row.try_get("filled_form_path")?,
        receipt_path: row.try_get("receipt_path")?,
        status: SubmissionStatus::parse(&status_label)
            .ok_or_else(|| decode_err("status", &status_label))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Translate the shared filter into a WHERE clause. The same conditions the
/// in-memory store applies in Rust are applied here with binds; ILIKE gives
/// the case-insensitive substring match.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &SubmissionFilter) {
    let mut prefixed = false;
    let mut separator = |builder: &mut QueryBuilder<'_, Postgres>| {
        if prefixed {
            builder.push(" AND ");
        } else {
            builder.push(" WHERE ");
            prefixed = true;
        }
    };

    if let Some(kind) = filter.kind {
        separator(builder);
        builder.push("kind = ");
        builder.push_bind(kind.label());
    }

    if let Some(status) = filter.status.as_deref() {
        separator(builder);
        builder.push("status = ");
        builder.push_bind(status.to_string());
    }

    if let Some(claiming) = filter.claiming {
        separator(builder);
        builder.push("action_type = ");
        builder.push_bind(claiming.action().label());
    }

    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{search}%");
        separator(builder);
        builder.push("(name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR reg_account_number ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR chn ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR bvn ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[derive(Clone)]
pub struct PostgresSubmissionStore {
    pool: PgPool,
}

impl PostgresSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PostgresSubmissionStore {
    async fn insert(&self, draft: SubmissionDraft) -> Result<Submission, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO submissions (
                kind, shareholder_id, reg_account_number, name, chn, bvn,
                holdings, rights_issue, holdings_after, action_type,
                shares_accepted, shares_renounced, apply_additional,
                additional_shares, amount_due, additional_amount,
                amount_payable, payment_amount,
                additional_payment_cheque_number, partial_payment_cheque_number,
                contact_name, email, mobile_phone, daytime_phone,
                filled_form_path, receipt_path, status
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27
            )
            RETURNING *
            "#,
        )
        .bind(draft.kind.label())
        .bind(draft.shareholder_id)
        .bind(&draft.reg_account_number)
        .bind(&draft.name)
        .bind(&draft.chn)
        .bind(&draft.bvn)
        .bind(draft.holdings)
        .bind(draft.rights_issue)
        .bind(draft.holdings_after)
        .bind(draft.action.label())
        .bind(draft.shares_accepted)
        .bind(draft.shares_renounced)
        .bind(draft.apply_additional)
        .bind(draft.additional_shares)
        .bind(draft.amount_due)
        .bind(draft.additional_amount)
        .bind(draft.amount_payable)
        .bind(draft.payment_amount)
        .bind(&draft.additional_payment_cheque_number)
        .bind(&draft.partial_payment_cheque_number)
        .bind(&draft.contact_name)
        .bind(&draft.email)
        .bind(&draft.mobile_phone)
        .bind(&draft.daytime_phone)
        .bind(&draft.filled_form_path)
        .bind(&draft.receipt_path)
        .bind(draft.status.label())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        submission_from_row(&row).map_err(store_err)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref()
            .map(submission_from_row)
            .transpose()
            .map_err(store_err)
    }

    async fn update_status(
        &self,
        id: i64,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE submissions
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status.label())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref()
            .map(submission_from_row)
            .transpose()
            .map_err(store_err)
    }

    async fn list(
        &self,
        filter: &SubmissionFilter,
        sort: SortField,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<(Vec<Submission>, u64), StoreError> {
        let mut rows_builder = QueryBuilder::new("SELECT * FROM submissions");
        push_filters(&mut rows_builder, filter);
        rows_builder.push(" ORDER BY ");
        rows_builder.push(sort.column());
        rows_builder.push(" ");
        rows_builder.push(order.keyword());
        rows_builder.push(", id ");
        rows_builder.push(order.keyword());
        rows_builder.push(" LIMIT ");
        rows_builder.push_bind(page.limit as i64);
        rows_builder.push(" OFFSET ");
        rows_builder.push_bind(page.offset() as i64);

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM submissions");
        push_filters(&mut count_builder, filter);

        // Page and count run concurrently, joined before responding.
        let rows_query = rows_builder.build();
        let count_query = count_builder.build_query_scalar::<i64>();
        let (rows, total) = tokio::try_join!(
            rows_query.fetch_all(&self.pool),
            count_query.fetch_one(&self.pool),
        )
        .map_err(store_err)?;

        let submissions = rows
            .iter()
            .map(submission_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)?;

        Ok((submissions, total as u64))
    }

    async fn export(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT * FROM submissions");
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        rows.iter()
            .map(submission_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)
    }

    async fn count(&self, kind: Option<SubmissionKind>) -> Result<u64, StoreError> {
        let count: i64 = match kind {
            Some(kind) => sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE kind = $1")
                .bind(kind.label())
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?,
            None => sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?,
        };
        Ok(count as u64)
    }
}

#[derive(Clone)]
pub struct PostgresShareholderDirectory {
    pool: PgPool,
}

impl PostgresShareholderDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a registrar register export, leaving already-known accounts
    /// untouched.
    pub async fn import(&self, records: Vec<ShareholderRecord>) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for record in records {
            let holder = record.into_shareholder(0);
            let result = sqlx::query(
                r#"
                INSERT INTO shareholders
                    (reg_account_number, chn, name, holdings, rights_issue, holdings_after)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (reg_account_number) DO NOTHING
                "#,
            )
            .bind(&holder.reg_account_number)
            .bind(&holder.chn)
            .bind(&holder.name)
            .bind(holder.holdings)
            .bind(holder.rights_issue)
            .bind(holder.holdings_after)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}

fn shareholder_from_row(row: &PgRow) -> Result<Shareholder, sqlx::Error> {
    Ok(Shareholder {
        id: row.try_get("id")?,
        reg_account_number: row.try_get("reg_account_number")?,
        chn: row.try_get("chn")?,
        name: row.try_get("name")?,
        holdings: row.try_get("holdings")?,
        rights_issue: row.try_get("rights_issue")?,
        holdings_after: row.try_get("holdings_after")?,
    })
}

#[async_trait]
impl ShareholderDirectory for PostgresShareholderDirectory {
    async fn find_by_reg_account(&self, reg: &str) -> Result<Option<Shareholder>, StoreError> {
        let row = sqlx::query("SELECT * FROM shareholders WHERE reg_account_number = $1")
            .bind(reg)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref()
            .map(shareholder_from_row)
            .transpose()
            .map_err(store_err)
    }

    async fn find_by_chn(&self, chn: &str) -> Result<Option<Shareholder>, StoreError> {
        let row = sqlx::query("SELECT * FROM shareholders WHERE chn = $1")
            .bind(chn)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref()
            .map(shareholder_from_row)
            .transpose()
            .map_err(store_err)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shareholders")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(count as u64)
    }
}

#[derive(Clone)]
pub struct PostgresAdminDirectory {
    pool: PgPool,
}

impl PostgresAdminDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminDirectory for PostgresAdminDirectory {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<AdminAccount, AdminStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO admin_users (email, password)
            VALUES (LOWER($1), $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| AdminStoreError::Unavailable(err.to_string()))?;

        match row {
            Some(row) => Ok(AdminAccount {
                id: row
                    .try_get("id")
                    .map_err(|err| AdminStoreError::Unavailable(err.to_string()))?,
                email: row
                    .try_get("email")
                    .map_err(|err| AdminStoreError::Unavailable(err.to_string()))?,
                password_hash: row
                    .try_get("password")
                    .map_err(|err| AdminStoreError::Unavailable(err.to_string()))?,
            }),
            None => Err(AdminStoreError::DuplicateEmail),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, AdminStoreError> {
        let row = sqlx::query("SELECT id, email, password FROM admin_users WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| AdminStoreError::Unavailable(err.to_string()))?;

        row.map(|row| {
            Ok(AdminAccount {
                id: row
                    .try_get("id")
                    .map_err(|err: sqlx::Error| AdminStoreError::Unavailable(err.to_string()))?,
                email: row
                    .try_get("email")
                    .map_err(|err: sqlx::Error| AdminStoreError::Unavailable(err.to_string()))?,
                password_hash: row
                    .try_get("password")
                    .map_err(|err: sqlx::Error| AdminStoreError::Unavailable(err.to_string()))?,
            })
        })
        .transpose()
    }
}
