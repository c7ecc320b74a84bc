//! Fixed 50-question survey: answer scale, section layout and answer-map
//! validation/merging.

use serde_json::{Map, Value};

pub const QUESTION_COUNT: u32 = 50;

/// The five dashboard sections, each a contiguous range of 10 questions.
pub const SECTIONS: [(&str, u32, u32); 5] = [
    ("A", 1, 10),
    ("B", 11, 20),
    ("C", 21, 30),
    ("D", 31, 40),
    ("E", 41, 50),
];

/// Maps an ordinal answer label to its 1-5 score. Unknown labels score
/// nothing: they are skipped by every aggregation, never an error.
pub fn answer_score(label: &str) -> Option<i64> {
    match label {
        "strongly_disagree" => Some(1),
        "disagree" => Some(2),
        "neutral" => Some(3),
        "agree" => Some(4),
        "strongly_agree" => Some(5),
        _ => None,
    }
}

/// A question key must be the canonical decimal form of 1..=50 ("7", not
/// "07").
pub fn is_valid_question_key(key: &str) -> bool {
    match key.parse::<u32>() {
        Ok(n) => (1..=QUESTION_COUNT).contains(&n) && n.to_string() == key,
        Err(_) => false,
    }
}

fn is_valid_answer_value(value: &Value) -> bool {
    value.as_str().is_some_and(|s| answer_score(s).is_some())
}

/// Validates a partial answer map: every key in "1".."50", every value one
/// of the five labels.
pub fn validate_partial_answers(answers: &Map<String, Value>) -> Result<(), String> {
    for (key, value) in answers {
        if !is_valid_question_key(key) {
            return Err(format!("invalid question key: {key}"));
        }
        if !is_valid_answer_value(value) {
            return Err(format!("invalid answer for question {key}"));
        }
    }
    Ok(())
}

/// Validates a final submission: a valid partial map containing exactly
/// all 50 questions.
pub fn validate_full_answers(answers: &Map<String, Value>) -> Result<(), String> {
    validate_partial_answers(answers)?;
    if answers.len() != QUESTION_COUNT as usize {
        return Err(format!(
            "all {QUESTION_COUNT} questions must be answered (got {})",
            answers.len()
        ));
    }
    Ok(())
}

/// Merges `incoming` into `existing` key-by-key: incoming keys overwrite,
/// every other existing key is preserved. This is what lets an employee
/// save one section at a time without clobbering earlier sections.
pub fn merge_answers(existing: &Value, incoming: &Map<String, Value>) -> Value {
    let mut merged = match existing.as_object() {
        Some(map) => map.clone(),
        None => Map::new(),
    };
    for (key, value) in incoming {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn scale_maps_all_five_labels() {
        assert_eq!(answer_score("strongly_disagree"), Some(1));
        assert_eq!(answer_score("disagree"), Some(2));
        assert_eq!(answer_score("neutral"), Some(3));
        assert_eq!(answer_score("agree"), Some(4));
        assert_eq!(answer_score("strongly_agree"), Some(5));
        assert_eq!(answer_score("AGREE"), None);
        assert_eq!(answer_score(""), None);
    }

    #[test]
    fn question_keys_are_canonical() {
        assert!(is_valid_question_key("1"));
        assert!(is_valid_question_key("50"));
        assert!(!is_valid_question_key("0"));
        assert!(!is_valid_question_key("51"));
        assert!(!is_valid_question_key("07"));
        assert!(!is_valid_question_key("abc"));
        assert!(!is_valid_question_key("-3"));
    }

    #[test]
    fn partial_validation_accepts_sparse_maps() {
        let map = answers(&[("3", "agree"), ("42", "neutral")]);
        assert!(validate_partial_answers(&map).is_ok());
    }

    #[test]
    fn partial_validation_rejects_bad_values() {
        let map = answers(&[("3", "kind_of_agree")]);
        assert!(validate_partial_answers(&map).is_err());
        let mut map = Map::new();
        map.insert("3".to_string(), json!(4));
        assert!(validate_partial_answers(&map).is_err());
    }

    #[test]
    fn full_validation_requires_exactly_fifty() {
        let mut map = Map::new();
        for q in 1..=49 {
            map.insert(q.to_string(), json!("neutral"));
        }
        assert!(validate_full_answers(&map).is_err());

        map.insert("50".to_string(), json!("neutral"));
        assert!(validate_full_answers(&map).is_ok());

        // 50 entries with one corrupted value is still rejected.
        map.insert("50".to_string(), json!("meh"));
        assert!(validate_full_answers(&map).is_err());
    }

    #[test]
    fn disjoint_merges_commute() {
        let a = answers(&[("1", "agree"), ("2", "neutral")]);
        let b = answers(&[("11", "disagree"), ("12", "strongly_agree")]);

        let ab = merge_answers(&merge_answers(&json!({}), &a), &b);
        let ba = merge_answers(&merge_answers(&json!({}), &b), &a);
        assert_eq!(ab, ba);
        assert_eq!(ab.as_object().unwrap().len(), 4);
    }

    #[test]
    fn merge_overwrites_only_incoming_keys() {
        let saved = json!({"1": "agree", "2": "neutral", "3": "disagree"});
        let incoming = answers(&[("2", "strongly_agree")]);
        let merged = merge_answers(&saved, &incoming);
        assert_eq!(merged["1"], "agree");
        assert_eq!(merged["2"], "strongly_agree");
        assert_eq!(merged["3"], "disagree");
    }

    #[test]
    fn merge_tolerates_non_object_existing() {
        let merged = merge_answers(&Value::Null, &answers(&[("1", "agree")]));
        assert_eq!(merged["1"], "agree");
    }
}
