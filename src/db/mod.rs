pub mod seed;

use crate::domain::email::{company_domain, company_name};
use crate::domain::models::{AccountRole, CertificationStatus};
use crate::domain::survey;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Default password for auto-provisioned `hr@<domain>` accounts; forced
/// reset on first login via `must_reset_password`.
pub const DEFAULT_HR_PASSWORD: &str = "12345678";

pub const SESSION_TTL_DAYS: i64 = 7;

// ========== Row types ==========

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i32,
    pub domain: String,
    pub name: String,
    pub hr_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HrAccount {
    pub id: i32,
    pub company_id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AccountRole,
    pub last_login: Option<DateTime<Utc>>,
    pub must_reset_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub hr_account_id: i32,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A row that outlived its expiry must never authenticate, even when
    /// the purge job has not removed it yet.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub department: Option<String>,
    pub education_level: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub working_tenure: Option<String>,
    pub company_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertEmployee {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub education_level: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub working_tenure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: Uuid,
    pub response_number: i32,
    pub user_email: String,
    pub company_id: Option<i32>,
    pub company_domain: Option<String>,
    pub answers: Value,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flattened response + employee join used by the dashboard detail views,
/// the wellbeing/demographic aggregations and the CSV export.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseWithEmployee {
    pub id: Uuid,
    pub response_number: i32,
    pub user_email: String,
    pub company_id: Option<i32>,
    pub company_domain: Option<String>,
    pub answers: Value,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub employee_company: Option<String>,
    pub department: Option<String>,
    pub education_level: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub working_tenure: Option<String>,
    pub employee_company_id: Option<i32>,
    pub employee_created_at: DateTime<Utc>,
    pub employee_updated_at: DateTime<Utc>,
}

impl ResponseWithEmployee {
    pub fn split(self) -> (SurveyResponse, Employee) {
        let response = SurveyResponse {
            id: self.id,
            response_number: self.response_number,
            user_email: self.user_email.clone(),
            company_id: self.company_id,
            company_domain: self.company_domain,
            answers: self.answers,
            is_complete: self.is_complete,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        let employee = Employee {
            email: self.user_email,
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.employee_company,
            department: self.department,
            education_level: self.education_level,
            gender: self.gender,
            age: self.age,
            working_tenure: self.working_tenure,
            company_id: self.employee_company_id,
            created_at: self.employee_created_at,
            updated_at: self.employee_updated_at,
        };
        (response, employee)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub id: i32,
    pub company_id: i32,
    pub certificate_number: String,
    pub issued_by: i32,
    pub title: String,
    pub description: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub status: CertificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Certification joined with its company and issuing account.
#[derive(Debug, Clone, FromRow)]
pub struct CertificationRow {
    pub id: i32,
    pub company_id: i32,
    pub certificate_number: String,
    pub issued_by: i32,
    pub title: String,
    pub description: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub status: CertificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub company_domain: Option<String>,
    pub company_name: Option<String>,
    pub issuer_email: Option<String>,
    pub issuer_role: Option<AccountRole>,
}

/// HR account joined with its company, for the admin account list.
#[derive(Debug, Clone, FromRow)]
pub struct HrAccountWithCompany {
    pub id: i32,
    pub company_id: i32,
    pub email: String,
    pub role: AccountRole,
    pub last_login: Option<DateTime<Utc>>,
    pub must_reset_password: bool,
    pub created_at: DateTime<Utc>,
    pub company_domain: Option<String>,
    pub company_name: Option<String>,
}

// ========== Password hashing ==========

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// ========== Company operations ==========

pub async fn get_company_by_domain(pool: &PgPool, domain: &str) -> Result<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, domain, name, hr_email, created_at, updated_at
        FROM companies
        WHERE domain = $1
        "#,
    )
    .bind(domain)
    .fetch_optional(pool)
    .await?;
    Ok(company)
}

/// Creates the company on first sighting of a domain; a concurrent
/// creation for the same domain resolves to the existing row.
pub async fn ensure_company(pool: &PgPool, domain: &str) -> Result<Company> {
    let inserted = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (domain, name, hr_email)
        VALUES ($1, $2, $3)
        ON CONFLICT (domain) DO NOTHING
        RETURNING id, domain, name, hr_email, created_at, updated_at
        "#,
    )
    .bind(domain)
    .bind(company_name(domain))
    .bind(format!("hr@{domain}"))
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(company) => Ok(company),
        None => get_company_by_domain(pool, domain)
            .await?
            .ok_or_else(|| anyhow::anyhow!("company {domain} missing after conflicting insert")),
    }
}

pub async fn get_all_companies(pool: &PgPool) -> Result<Vec<Company>> {
    let companies = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, domain, name, hr_email, created_at, updated_at
        FROM companies
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(companies)
}

// ========== HR account operations ==========

const HR_ACCOUNT_COLUMNS: &str = "id, company_id, email, password_hash, role, last_login, must_reset_password, created_at, updated_at";

pub async fn get_hr_account_by_email(pool: &PgPool, email: &str) -> Result<Option<HrAccount>> {
    let account = sqlx::query_as::<_, HrAccount>(&format!(
        "SELECT {HR_ACCOUNT_COLUMNS} FROM hr_accounts WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

pub async fn get_hr_account_by_id(pool: &PgPool, id: i32) -> Result<Option<HrAccount>> {
    let account = sqlx::query_as::<_, HrAccount>(&format!(
        "SELECT {HR_ACCOUNT_COLUMNS} FROM hr_accounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Conditional insert: if the email is already taken (including by a
/// concurrent provisioning attempt) the existing account is returned.
pub async fn create_hr_account(
    pool: &PgPool,
    company_id: i32,
    email: &str,
    password: &str,
    role: AccountRole,
) -> Result<HrAccount> {
    let password_hash = hash_password(password)?;
    let inserted = sqlx::query_as::<_, HrAccount>(&format!(
        r#"
        INSERT INTO hr_accounts (company_id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING {HR_ACCOUNT_COLUMNS}
        "#
    ))
    .bind(company_id)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(account) => Ok(account),
        None => get_hr_account_by_email(pool, email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("hr account {email} missing after conflicting insert")),
    }
}

/// Fails closed: unknown email and wrong password are indistinguishable
/// to the caller.
pub async fn validate_hr_credentials(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<Option<HrAccount>> {
    let Some(account) = get_hr_account_by_email(pool, email).await? else {
        return Ok(None);
    };
    if verify_password(password, &account.password_hash) {
        Ok(Some(account))
    } else {
        Ok(None)
    }
}

pub async fn update_last_login(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query("UPDATE hr_accounts SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_all_hr_accounts(pool: &PgPool) -> Result<Vec<HrAccountWithCompany>> {
    let accounts = sqlx::query_as::<_, HrAccountWithCompany>(
        r#"
        SELECT
            a.id,
            a.company_id,
            a.email,
            a.role,
            a.last_login,
            a.must_reset_password,
            a.created_at,
            c.domain AS company_domain,
            c.name AS company_name
        FROM hr_accounts a
        LEFT JOIN companies c ON c.id = a.company_id
        ORDER BY a.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(accounts)
}

// ========== Session operations ==========

pub async fn create_session(
    pool: &PgPool,
    hr_account_id: i32,
    token: &str,
) -> Result<Session> {
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
    let session = sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (hr_account_id, token, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, hr_account_id, token, expires_at, created_at
        "#,
    )
    .bind(hr_account_id)
    .bind(token)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(session)
}

/// Returns the session only while unexpired; expired rows are filtered at
/// query time and re-checked by the caller.
pub async fn get_valid_session(pool: &PgPool, token: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT id, hr_account_id, token, expires_at, created_at
        FROM sessions
        WHERE token = $1
          AND expires_at > NOW()
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(session)
}

/// Idempotent; deleting an unknown token is not an error.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Best-effort housekeeping; correctness does not depend on it because
/// `get_valid_session` filters on expiry.
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// ========== Employee operations ==========

const EMPLOYEE_COLUMNS: &str = "email, first_name, last_name, company, department, education_level, gender, age, working_tenure, company_id, created_at, updated_at";

pub async fn get_employee(pool: &PgPool, email: &str) -> Result<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(employee)
}

/// Upserted on every survey-session start; conflicts on email overwrite
/// the demographic fields. Lazily creates the company for new domains.
pub async fn upsert_employee(pool: &PgPool, upsert: &UpsertEmployee) -> Result<Employee> {
    let domain = company_domain(&upsert.email);
    let company = ensure_company(pool, &domain).await?;

    let employee = sqlx::query_as::<_, Employee>(&format!(
        r#"
        INSERT INTO users (email, first_name, last_name, company, department,
                           education_level, gender, age, working_tenure, company_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (email) DO UPDATE
        SET first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            company = EXCLUDED.company,
            department = EXCLUDED.department,
            education_level = EXCLUDED.education_level,
            gender = EXCLUDED.gender,
            age = EXCLUDED.age,
            working_tenure = EXCLUDED.working_tenure,
            company_id = EXCLUDED.company_id,
            updated_at = NOW()
        RETURNING {EMPLOYEE_COLUMNS}
        "#
    ))
    .bind(&upsert.email)
    .bind(&upsert.first_name)
    .bind(&upsert.last_name)
    .bind(&company.name)
    .bind(&upsert.department)
    .bind(&upsert.education_level)
    .bind(&upsert.gender)
    .bind(&upsert.age)
    .bind(&upsert.working_tenure)
    .bind(company.id)
    .fetch_one(pool)
    .await?;
    Ok(employee)
}

pub async fn get_all_employees(pool: &PgPool, company_id: Option<i32>) -> Result<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(&format!(
        r#"
        SELECT {EMPLOYEE_COLUMNS}
        FROM users
        WHERE ($1::INT IS NULL OR company_id = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(employees)
}

// ========== Survey response operations ==========

const RESPONSE_COLUMNS: &str = "id, response_number, user_email, company_id, company_domain, answers, is_complete, completed_at, created_at, updated_at";

pub async fn get_survey_response(pool: &PgPool, email: &str) -> Result<Option<SurveyResponse>> {
    let response = sqlx::query_as::<_, SurveyResponse>(&format!(
        "SELECT {RESPONSE_COLUMNS} FROM survey_responses WHERE user_email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(response)
}

/// Merges a partial answer map into the stored one. Read-merge-write:
/// concurrent saves for the same email are last-write-wins on overlapping
/// keys (accepted for the single-user self-service flow).
/// `company_domain`/`company_id` are backfilled only while unset.
pub async fn save_progress(
    pool: &PgPool,
    email: &str,
    answers: &Map<String, Value>,
    is_complete: bool,
) -> Result<SurveyResponse> {
    let domain = company_domain(email);
    let company = ensure_company(pool, &domain).await?;
    let existing = get_survey_response(pool, email).await?;

    let response = match existing {
        Some(existing) => {
            let merged = survey::merge_answers(&existing.answers, answers);
            sqlx::query_as::<_, SurveyResponse>(&format!(
                r#"
                UPDATE survey_responses
                SET answers = $2,
                    is_complete = $3,
                    company_domain = COALESCE(company_domain, $4),
                    company_id = COALESCE(company_id, $5),
                    updated_at = NOW()
                WHERE user_email = $1
                RETURNING {RESPONSE_COLUMNS}
                "#
            ))
            .bind(email)
            .bind(merged)
            .bind(is_complete)
            .bind(&domain)
            .bind(company.id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, SurveyResponse>(&format!(
                r#"
                INSERT INTO survey_responses (user_email, answers, is_complete, company_domain, company_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {RESPONSE_COLUMNS}
                "#
            ))
            .bind(email)
            .bind(Value::Object(answers.clone()))
            .bind(is_complete)
            .bind(&domain)
            .bind(company.id)
            .fetch_one(pool)
            .await?
        }
    };
    Ok(response)
}

/// Finalizes a submission: the caller has already validated the full
/// 50-key set. Replaces (does not merge) the answer map in a single
/// upsert, then provisions the company's `hr@<domain>` account if no
/// account with that email exists yet.
pub async fn submit_final(
    pool: &PgPool,
    email: &str,
    answers: &Map<String, Value>,
) -> Result<SurveyResponse> {
    let domain = company_domain(email);
    let company = ensure_company(pool, &domain).await?;

    let response = sqlx::query_as::<_, SurveyResponse>(&format!(
        r#"
        INSERT INTO survey_responses (user_email, answers, is_complete, completed_at, company_domain, company_id)
        VALUES ($1, $2, TRUE, NOW(), $3, $4)
        ON CONFLICT (user_email) DO UPDATE
        SET answers = EXCLUDED.answers,
            is_complete = TRUE,
            completed_at = NOW(),
            company_domain = COALESCE(survey_responses.company_domain, EXCLUDED.company_domain),
            company_id = COALESCE(survey_responses.company_id, EXCLUDED.company_id),
            updated_at = NOW()
        RETURNING {RESPONSE_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(Value::Object(answers.clone()))
    .bind(&domain)
    .bind(company.id)
    .fetch_one(pool)
    .await?;

    let hr_email = format!("hr@{domain}");
    create_hr_account(pool, company.id, &hr_email, DEFAULT_HR_PASSWORD, AccountRole::Hr).await?;

    Ok(response)
}

/// All responses, optionally scoped to one company and/or to completed
/// submissions only.
pub async fn get_responses(
    pool: &PgPool,
    company_id: Option<i32>,
    completed_only: bool,
) -> Result<Vec<SurveyResponse>> {
    let responses = sqlx::query_as::<_, SurveyResponse>(&format!(
        r#"
        SELECT {RESPONSE_COLUMNS}
        FROM survey_responses
        WHERE ($1::INT IS NULL OR company_id = $1)
          AND ($2 = FALSE OR is_complete = TRUE)
        ORDER BY completed_at DESC NULLS LAST, created_at DESC
        "#
    ))
    .bind(company_id)
    .bind(completed_only)
    .fetch_all(pool)
    .await?;
    Ok(responses)
}

const RESPONSE_EMPLOYEE_SELECT: &str = r#"
    SELECT
        r.id,
        r.response_number,
        r.user_email,
        r.company_id,
        r.company_domain,
        r.answers,
        r.is_complete,
        r.completed_at,
        r.created_at,
        r.updated_at,
        u.first_name,
        u.last_name,
        u.company AS employee_company,
        u.department,
        u.education_level,
        u.gender,
        u.age,
        u.working_tenure,
        u.company_id AS employee_company_id,
        u.created_at AS employee_created_at,
        u.updated_at AS employee_updated_at
    FROM survey_responses r
    JOIN users u ON u.email = r.user_email
"#;

/// Completed responses joined with their employees. The inner join drops
/// orphaned response rows.
pub async fn get_responses_with_employees(
    pool: &PgPool,
    company_id: Option<i32>,
) -> Result<Vec<ResponseWithEmployee>> {
    let rows = sqlx::query_as::<_, ResponseWithEmployee>(&format!(
        r#"
        {RESPONSE_EMPLOYEE_SELECT}
        WHERE r.is_complete = TRUE
          AND ($1::INT IS NULL OR r.company_id = $1)
        ORDER BY r.completed_at DESC NULLS LAST, r.created_at DESC
        "#
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Resolves the human-facing response number; orphaned rows (no joined
/// employee) are treated as absent.
pub async fn get_response_by_number(
    pool: &PgPool,
    response_number: i32,
) -> Result<Option<ResponseWithEmployee>> {
    let row = sqlx::query_as::<_, ResponseWithEmployee>(&format!(
        "{RESPONSE_EMPLOYEE_SELECT} WHERE r.response_number = $1"
    ))
    .bind(response_number)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// (total, completed) counts, optionally company-scoped.
pub async fn survey_counts(pool: &PgPool, company_id: Option<i32>) -> Result<(i64, i64)> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM survey_responses WHERE ($1::INT IS NULL OR company_id = $1)",
    )
    .bind(company_id)
    .fetch_one(pool)
    .await?;

    let completed: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM survey_responses
        WHERE is_complete = TRUE
          AND ($1::INT IS NULL OR company_id = $1)
        "#,
    )
    .bind(company_id)
    .fetch_one(pool)
    .await?;

    Ok((total, completed))
}

// ========== Certification operations ==========

const CERTIFICATION_COLUMNS: &str = "id, company_id, certificate_number, issued_by, title, description, valid_from, valid_until, status, created_at, updated_at";

/// `CERT-<millis>-<7 uppercase alphanumerics>`.
pub fn certificate_number() -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let suffix: String = {
        let mut rng = rand::thread_rng();
        (0..7)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    };
    format!("CERT-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// The generated number is unique in practice but not by construction;
/// uniqueness is enforced by the storage constraint with a bounded retry
/// on collision.
pub async fn issue_certification(
    pool: &PgPool,
    company_id: i32,
    issued_by: i32,
    title: &str,
    description: Option<&str>,
    valid_until: Option<DateTime<Utc>>,
) -> Result<Certification> {
    for _ in 0..3 {
        let number = certificate_number();
        let result = sqlx::query_as::<_, Certification>(&format!(
            r#"
            INSERT INTO certifications (company_id, certificate_number, issued_by, title, description, valid_until)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CERTIFICATION_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(&number)
        .bind(issued_by)
        .bind(title)
        .bind(description)
        .bind(valid_until)
        .fetch_one(pool)
        .await;

        match result {
            Ok(certification) => return Ok(certification),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!("certificate number collision on {number}, retrying");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(anyhow::anyhow!("could not allocate a unique certificate number"))
}

pub async fn get_certifications(
    pool: &PgPool,
    company_id: Option<i32>,
) -> Result<Vec<CertificationRow>> {
    let rows = sqlx::query_as::<_, CertificationRow>(
        r#"
        SELECT
            ct.id,
            ct.company_id,
            ct.certificate_number,
            ct.issued_by,
            ct.title,
            ct.description,
            ct.valid_from,
            ct.valid_until,
            ct.status,
            ct.created_at,
            ct.updated_at,
            c.domain AS company_domain,
            c.name AS company_name,
            a.email AS issuer_email,
            a.role AS issuer_role
        FROM certifications ct
        LEFT JOIN companies c ON c.id = ct.company_id
        LEFT JOIN hr_accounts a ON a.id = ct.issued_by
        WHERE ($1::INT IS NULL OR ct.company_id = $1)
        ORDER BY ct.created_at DESC
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Sets status to revoked. Idempotent in effect: revoking twice leaves the
/// record revoked with no error.
pub async fn revoke_certification(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query("UPDATE certifications SET status = 'revoked', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_rows_never_authenticate() {
        let session = Session {
            id: Uuid::new_v4(),
            hr_account_id: 1,
            token: "tok".to_string(),
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::days(8),
        };
        // Still present in storage, but past expiry.
        assert!(!session.is_valid_at(Utc::now()));

        let live = Session {
            expires_at: Utc::now() + Duration::days(7),
            ..session
        };
        assert!(live.is_valid_at(Utc::now()));
    }

    #[test]
    fn certificate_numbers_have_the_expected_shape() {
        let number = certificate_number();
        let parts: Vec<&str> = number.splitn(3, '-').collect();
        assert_eq!(parts[0], "CERT");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 7);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn password_hashes_verify_and_reject() {
        let hash = hash_password("12345678").unwrap();
        assert!(verify_password("12345678", &hash));
        assert!(!verify_password("87654321", &hash));
        assert!(!verify_password("12345678", "not-a-phc-hash"));
    }
}
