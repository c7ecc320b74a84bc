//! Row builders shared by the aggregation and CSV tests.

use crate::db::{ResponseWithEmployee, SurveyResponse};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

pub fn response(domain: &str, is_complete: bool, answers: Value) -> SurveyResponse {
    let now = Utc::now();
    SurveyResponse {
        id: Uuid::new_v4(),
        response_number: 1,
        user_email: format!("someone@{domain}"),
        company_id: Some(1),
        company_domain: Some(domain.to_string()),
        answers,
        is_complete,
        completed_at: is_complete.then_some(now),
        created_at: now,
        updated_at: now,
    }
}

pub fn row(
    domain: &str,
    is_complete: bool,
    answers: Value,
    department: Option<&str>,
    gender: Option<&str>,
) -> ResponseWithEmployee {
    let now = Utc::now();
    ResponseWithEmployee {
        id: Uuid::new_v4(),
        response_number: 1,
        user_email: format!("someone@{domain}"),
        company_id: Some(1),
        company_domain: Some(domain.to_string()),
        answers,
        is_complete,
        completed_at: is_complete.then_some(now),
        created_at: now,
        updated_at: now,
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        employee_company: Some("acme".to_string()),
        department: department.map(str::to_string),
        education_level: None,
        gender: gender.map(str::to_string),
        age: None,
        working_tenure: None,
        employee_company_id: Some(1),
        employee_created_at: now,
        employee_updated_at: now,
    }
}

/// A complete 50-answer map with every question set to `label`.
pub fn full_answers(label: &str) -> Value {
    let mut map = serde_json::Map::new();
    for q in 1..=50 {
        map.insert(q.to_string(), json!(label));
    }
    Value::Object(map)
}
