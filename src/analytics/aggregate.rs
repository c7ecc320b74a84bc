//! Completion stats, section averages, company insights, wellbeing
//! indices and demographic tallies.

use crate::db::{ResponseWithEmployee, SurveyResponse};
use crate::domain::survey::{answer_score, SECTIONS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStats {
    pub total_responses: i64,
    pub completed_responses: i64,
    pub in_progress_responses: i64,
    pub completion_rate: f64,
}

pub fn survey_stats(total: i64, completed: i64) -> SurveyStats {
    let completion_rate = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round()
    } else {
        0.0
    };
    SurveyStats {
        total_responses: total,
        completed_responses: completed,
        in_progress_responses: total - completed,
        completion_rate,
    }
}

/// Scored entries of an answer map: (question number, 1-5 score).
/// Non-numeric keys and unknown labels are skipped, never defaulted.
fn scored_answers(answers: &Value) -> Vec<(u32, i64)> {
    let Some(map) = answers.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let question = key.parse::<u32>().ok()?;
            let score = value.as_str().and_then(answer_score)?;
            Some((question, score))
        })
        .collect()
}

/// Mean score over the questions selected by `in_subset`, pooled across
/// answer maps. Returns (mean, scored answer count); no answers means
/// (0.0, 0) rather than NaN.
fn mean_over<'a>(
    answer_maps: impl Iterator<Item = &'a Value>,
    in_subset: impl Fn(u32) -> bool,
) -> (f64, usize) {
    let mut sum = 0i64;
    let mut count = 0usize;
    for answers in answer_maps {
        for (question, score) in scored_answers(answers) {
            if in_subset(question) {
                sum += score;
                count += 1;
            }
        }
    }
    if count == 0 {
        (0.0, 0)
    } else {
        (sum as f64 / count as f64, count)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAverage {
    pub section: String,
    pub average: f64,
    pub answer_count: usize,
}

/// Per-section averages pooled across completed responses. Unanswered
/// questions are excluded from numerator and denominator both.
pub fn section_averages(responses: &[SurveyResponse]) -> Vec<SectionAverage> {
    let completed: Vec<&Value> = responses
        .iter()
        .filter(|r| r.is_complete)
        .map(|r| &r.answers)
        .collect();

    SECTIONS
        .iter()
        .map(|&(label, from, to)| {
            let (average, answer_count) =
                mean_over(completed.iter().copied(), |q| (from..=to).contains(&q));
            SectionAverage {
                section: label.to_string(),
                average,
                answer_count,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInsight {
    pub company_domain: String,
    pub total_responses: usize,
    pub completed_responses: usize,
    pub completion_rate: f64,
    pub average_score: f64,
}

/// Per-company rollup over all responses (in progress included in the
/// counts). Responses whose company was never captured land under the
/// literal "unknown" bucket. The average score pools every answered
/// question of the company's completed responses.
pub fn company_insights(responses: &[SurveyResponse]) -> Vec<CompanyInsight> {
    let mut by_domain: BTreeMap<String, Vec<&SurveyResponse>> = BTreeMap::new();
    for response in responses {
        let domain = response
            .company_domain
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        by_domain.entry(domain).or_default().push(response);
    }

    by_domain
        .into_iter()
        .map(|(company_domain, group)| {
            let total = group.len();
            let completed: Vec<&Value> = group
                .iter()
                .filter(|r| r.is_complete)
                .map(|r| &r.answers)
                .collect();
            let completion_rate = if total > 0 {
                (completed.len() as f64 / total as f64 * 100.0).round()
            } else {
                0.0
            };
            let (average_score, _) = mean_over(completed.into_iter(), |_| true);
            CompanyInsight {
                company_domain,
                total_responses: total,
                completed_responses: group.iter().filter(|r| r.is_complete).count(),
                completion_rate,
                average_score,
            }
        })
        .collect()
}

/// Equality filters joined with AND; comparisons are case-sensitive, so
/// "Engineering" and "engineering" are distinct departments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WellbeingFilters {
    pub department: Option<String>,
    pub education_level: Option<String>,
    pub gender: Option<String>,
    pub working_tenure: Option<String>,
    pub company_domain: Option<String>,
    pub company_id: Option<i32>,
}

impl WellbeingFilters {
    fn matches(&self, row: &ResponseWithEmployee) -> bool {
        fn wanted<T: PartialEq>(filter: &Option<T>, actual: &Option<T>) -> bool {
            match filter {
                Some(expected) => actual.as_ref() == Some(expected),
                None => true,
            }
        }
        wanted(&self.department, &row.department)
            && wanted(&self.education_level, &row.education_level)
            && wanted(&self.gender, &row.gender)
            && wanted(&self.working_tenure, &row.working_tenure)
            && wanted(&self.company_domain, &row.company_domain)
            && wanted(&self.company_id, &row.company_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellbeingMetrics {
    pub success_score: f64,
    pub pride_index: f64,
    pub happiness_level: f64,
    pub overall_satisfaction: f64,
    pub response_count: usize,
}

/// Four composite indices over fixed question subsets, pooled across the
/// completed responses that match `filters`:
/// success 1-10 and 31-40, pride 21-30 and 41-50, happiness 11-20,
/// overall all 50. An empty filtered set yields zeros.
pub fn wellbeing_metrics(
    rows: &[ResponseWithEmployee],
    filters: &WellbeingFilters,
) -> WellbeingMetrics {
    let matching: Vec<&Value> = rows
        .iter()
        .filter(|row| row.is_complete && filters.matches(row))
        .map(|row| &row.answers)
        .collect();

    let pooled = |in_subset: fn(u32) -> bool| mean_over(matching.iter().copied(), in_subset).0;

    WellbeingMetrics {
        success_score: pooled(|q| (1..=10).contains(&q) || (31..=40).contains(&q)),
        pride_index: pooled(|q| (21..=30).contains(&q) || (41..=50).contains(&q)),
        happiness_level: pooled(|q| (11..=20).contains(&q)),
        overall_satisfaction: pooled(|_| true),
        response_count: matching.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicBreakdown {
    pub departments: Vec<LabelCount>,
    pub education_levels: Vec<LabelCount>,
    pub genders: Vec<LabelCount>,
    pub working_tenures: Vec<LabelCount>,
    pub ages: Vec<LabelCount>,
}

/// Occurrence counts per distinct attribute value across the linked
/// employees of completed responses, each attribute as a list of
/// (name, count) pairs. A null attribute drops the employee from that
/// attribute's tally only.
pub fn demographic_breakdown(rows: &[ResponseWithEmployee]) -> DemographicBreakdown {
    fn tally(counts: &mut BTreeMap<String, usize>, value: &Option<String>) {
        if let Some(v) = value {
            *counts.entry(v.clone()).or_insert(0) += 1;
        }
    }
    // Tallied through a BTreeMap so the pair lists come out deterministic.
    fn pairs(counts: BTreeMap<String, usize>) -> Vec<LabelCount> {
        counts
            .into_iter()
            .map(|(name, count)| LabelCount { name, count })
            .collect()
    }

    let mut departments = BTreeMap::new();
    let mut education_levels = BTreeMap::new();
    let mut genders = BTreeMap::new();
    let mut working_tenures = BTreeMap::new();
    let mut ages = BTreeMap::new();
    for row in rows.iter().filter(|r| r.is_complete) {
        tally(&mut departments, &row.department);
        tally(&mut education_levels, &row.education_level);
        tally(&mut genders, &row.gender);
        tally(&mut working_tenures, &row.working_tenure);
        tally(&mut ages, &row.age);
    }
    DemographicBreakdown {
        departments: pairs(departments),
        education_levels: pairs(education_levels),
        genders: pairs(genders),
        working_tenures: pairs(working_tenures),
        ages: pairs(ages),
    }
}

/// Per-response averages for sections A-E, over only the questions
/// answered in each range. Used by the CSV export.
pub fn response_section_averages(answers: &Value) -> [f64; 5] {
    let mut averages = [0.0; 5];
    for (i, &(_, from, to)) in SECTIONS.iter().enumerate() {
        let (average, _) =
            mean_over(std::iter::once(answers), |q| (from..=to).contains(&q));
        averages[i] = average;
    }
    averages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_fixtures::{full_answers, response, row};
    use serde_json::json;

    #[test]
    fn stats_round_the_completion_rate() {
        let stats = survey_stats(3, 2);
        assert_eq!(stats.total_responses, 3);
        assert_eq!(stats.completed_responses, 2);
        assert_eq!(stats.in_progress_responses, 1);
        assert_eq!(stats.completion_rate, 67.0);

        let empty = survey_stats(0, 0);
        assert_eq!(empty.completion_rate, 0.0);
    }

    #[test]
    fn company_scoped_stats_count_only_that_companys_responses() {
        // Two tenants with disjoint counts. An HR scope (Some) must
        // reproduce the per-company counts; the admin scope (None) sees
        // everything.
        let mut rows = vec![
            response("acme.com", true, json!({})),
            response("acme.com", false, json!({})),
            response("beta.io", true, json!({})),
        ];
        rows[2].company_id = Some(2);

        let scoped = |scope: Option<i32>| {
            let subset: Vec<&SurveyResponse> = rows
                .iter()
                .filter(|r| scope.is_none() || r.company_id == scope)
                .collect();
            let completed = subset.iter().filter(|r| r.is_complete).count() as i64;
            survey_stats(subset.len() as i64, completed)
        };

        let admin = scoped(None);
        assert_eq!(admin.total_responses, 3);
        assert_eq!(admin.completed_responses, 2);

        let acme_hr = scoped(Some(1));
        assert_eq!(acme_hr.total_responses, 2);
        assert_eq!(acme_hr.completed_responses, 1);

        let beta_hr = scoped(Some(2));
        assert_eq!(beta_hr.total_responses, 1);
        assert_eq!(beta_hr.completed_responses, 1);
    }

    #[test]
    fn section_averages_of_nothing_are_zero() {
        for s in section_averages(&[]) {
            assert_eq!(s.average, 0.0);
            assert_eq!(s.answer_count, 0);
        }
    }

    #[test]
    fn section_average_pools_across_responses() {
        // q1 answered "agree" (4) in one response, "strongly_agree" (5)
        // in another: section A averages 4.5.
        let responses = vec![
            response("acme.com", true, json!({"1": "agree"})),
            response("acme.com", true, json!({"1": "strongly_agree"})),
        ];
        let sections = section_averages(&responses);
        assert_eq!(sections[0].section, "A");
        assert_eq!(sections[0].average, 4.5);
        assert_eq!(sections[0].answer_count, 2);
        assert_eq!(sections[1].average, 0.0);
    }

    #[test]
    fn unanswered_questions_are_not_zero_filled() {
        // Section A with q7 missing: 9 answers, all "agree".
        let mut answers = serde_json::Map::new();
        for q in 1..=10 {
            if q != 7 {
                answers.insert(q.to_string(), json!("agree"));
            }
        }
        let responses = vec![response("acme.com", true, Value::Object(answers))];
        let sections = section_averages(&responses);
        assert_eq!(sections[0].average, 4.0);
        assert_eq!(sections[0].answer_count, 9);
    }

    #[test]
    fn incomplete_responses_are_excluded_from_section_averages() {
        let responses = vec![
            response("acme.com", true, json!({"1": "neutral"})),
            response("acme.com", false, json!({"1": "strongly_agree"})),
        ];
        assert_eq!(section_averages(&responses)[0].average, 3.0);
    }

    #[test]
    fn company_insights_group_with_unknown_fallback() {
        let mut orphan = response("x", false, json!({}));
        orphan.company_domain = None;
        let responses = vec![
            response("beta.io", true, json!({"1": "agree"})),
            response("acme.com", true, json!({"1": "strongly_agree", "2": "agree"})),
            response("acme.com", false, json!({"1": "strongly_disagree"})),
            orphan,
        ];

        let insights = company_insights(&responses);
        assert_eq!(insights.len(), 3);
        // BTreeMap grouping keeps the output deterministic.
        assert_eq!(insights[0].company_domain, "acme.com");
        assert_eq!(insights[0].total_responses, 2);
        assert_eq!(insights[0].completed_responses, 1);
        assert_eq!(insights[0].completion_rate, 50.0);
        // Incomplete answers never pollute the average.
        assert_eq!(insights[0].average_score, 4.5);

        assert_eq!(insights[1].company_domain, "beta.io");
        assert_eq!(insights[2].company_domain, "unknown");
        assert_eq!(insights[2].completed_responses, 0);
        assert_eq!(insights[2].average_score, 0.0);
    }

    #[test]
    fn wellbeing_subsets_pool_the_right_questions() {
        // q5 (success), q15 (happiness), q25 (pride), distinct scores.
        let answers = json!({"5": "strongly_agree", "15": "disagree", "25": "neutral"});
        let rows = vec![row("acme.com", true, answers, Some("Engineering"), None)];

        let metrics = wellbeing_metrics(&rows, &WellbeingFilters::default());
        assert_eq!(metrics.success_score, 5.0);
        assert_eq!(metrics.happiness_level, 2.0);
        assert_eq!(metrics.pride_index, 3.0);
        assert_eq!(metrics.overall_satisfaction, (5.0 + 2.0 + 3.0) / 3.0);
        assert_eq!(metrics.response_count, 1);
    }

    #[test]
    fn wellbeing_filters_are_case_sensitive_equality() {
        let rows = vec![
            row("acme.com", true, json!({"15": "strongly_agree"}), Some("Engineering"), None),
            row("acme.com", true, json!({"15": "strongly_disagree"}), Some("engineering"), None),
            row("acme.com", true, json!({"15": "disagree"}), None, None),
        ];

        let filters = WellbeingFilters {
            department: Some("Engineering".to_string()),
            ..Default::default()
        };
        let metrics = wellbeing_metrics(&rows, &filters);
        assert_eq!(metrics.response_count, 1);
        assert_eq!(metrics.happiness_level, 5.0);
    }

    #[test]
    fn wellbeing_of_an_empty_filtered_set_is_zero() {
        let rows = vec![row("acme.com", false, full_answers("agree"), Some("Sales"), None)];
        let filters = WellbeingFilters {
            department: Some("Marketing".to_string()),
            ..Default::default()
        };
        let metrics = wellbeing_metrics(&rows, &filters);
        assert_eq!(metrics.response_count, 0);
        assert_eq!(metrics.success_score, 0.0);
        assert_eq!(metrics.overall_satisfaction, 0.0);
    }

    #[test]
    fn null_attribute_only_skips_its_own_tally() {
        let rows = vec![
            row("acme.com", true, json!({}), None, Some("Female")),
            row("acme.com", true, json!({}), Some("Engineering"), Some("Female")),
        ];
        let breakdown = demographic_breakdown(&rows);
        assert_eq!(
            breakdown.departments,
            vec![LabelCount {
                name: "Engineering".to_string(),
                count: 1,
            }]
        );
        assert_eq!(
            breakdown.genders,
            vec![LabelCount {
                name: "Female".to_string(),
                count: 2,
            }]
        );
        assert!(breakdown.education_levels.is_empty());
    }

    #[test]
    fn per_response_section_averages_skip_missing_answers() {
        let answers = json!({"1": "agree", "2": "strongly_agree", "11": "neutral"});
        let averages = response_section_averages(&answers);
        assert_eq!(averages[0], 4.5);
        assert_eq!(averages[1], 3.0);
        assert_eq!(averages[2], 0.0);
    }
}
