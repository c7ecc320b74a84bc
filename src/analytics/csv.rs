//! CSV rendering for the dashboard export.

use crate::analytics::aggregate::response_section_averages;
use crate::db::ResponseWithEmployee;

const HEADER: &str = "Response Number,Email,First Name,Last Name,Department,Education Level,Gender,Working Tenure,Completed At,Section A Avg,Section B Avg,Section C Avg,Section D Avg,Section E Avg";

/// Quotes a field when needed, doubling embedded quotes.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders the export rows. Section averages are per-response, computed
/// over only the answered questions in each range, formatted to two
/// decimals.
pub fn render_csv(rows: &[ResponseWithEmployee]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for row in rows {
        let opt = |value: &Option<String>| escape(value.as_deref().unwrap_or(""));
        let completed_at = row
            .completed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        let mut fields = vec![
            row.response_number.to_string(),
            escape(&row.user_email),
            opt(&row.first_name),
            opt(&row.last_name),
            opt(&row.department),
            opt(&row.education_level),
            opt(&row.gender),
            opt(&row.working_tenure),
            escape(&completed_at),
        ];
        for average in response_section_averages(&row.answers) {
            fields.push(format!("{average:.2}"));
        }

        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_fixtures::row;
    use serde_json::json;

    #[test]
    fn renders_header_and_formatted_averages() {
        // q7 missing: section A averages the other 9 answers.
        let mut answers = serde_json::Map::new();
        for q in 1..=10 {
            if q != 7 {
                answers.insert(q.to_string(), json!("agree"));
            }
        }
        answers.insert("11".to_string(), json!("strongly_agree"));
        let rows = vec![row(
            "acme.com",
            true,
            serde_json::Value::Object(answers),
            Some("Engineering"),
            Some("Female"),
        )];

        let csv = render_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), HEADER);

        let data = lines.next().unwrap();
        assert!(data.starts_with("1,someone@acme.com,Jane,Doe,Engineering,"));
        assert!(data.ends_with("4.00,5.00,0.00,0.00,0.00"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn quotes_fields_containing_commas_and_doubles_quotes() {
        let mut r = row("acme.com", true, json!({}), Some("Sales, EMEA"), None);
        r.last_name = Some("O\"Brien".to_string());

        let csv = render_csv(&[r]);
        assert!(csv.contains("\"Sales, EMEA\""));
        assert!(csv.contains("\"O\"\"Brien\""));
    }

    #[test]
    fn missing_demographics_render_as_empty_fields() {
        let r = row("acme.com", false, json!({}), None, None);
        let csv = render_csv(&[r]);
        let data = csv.lines().nth(1).unwrap();
        // No completed_at on an in-progress row either.
        assert!(data.contains(",,,"));
        let field_count = data.split(',').count();
        assert_eq!(field_count, 14);
    }
}
