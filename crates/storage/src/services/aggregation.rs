use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::dto::results::{
    CriterionBreakdown, GroupStatistics, JudgeRating, JudgeSubmissionScores, JudgeSummary,
    RankingEntry, ResultsSnapshot, SubmissionCriterionScores, SubmissionInfo,
};
use crate::models::{Criterion, JudgingGroup, Score, ScoringScale, Submission};

pub struct AggregationInput<'a> {
    pub scale: ScoringScale,
    pub weighted: bool,
    pub criteria: &'a [Criterion],
    pub scores: &'a [Score],
    pub submissions: &'a [Submission],
    pub judge_names: &'a BTreeMap<Uuid, String>,
}

impl<'a> AggregationInput<'a> {
    pub fn for_group(
        group: &JudgingGroup,
        criteria: &'a [Criterion],
        scores: &'a [Score],
        submissions: &'a [Submission],
        judge_names: &'a BTreeMap<Uuid, String>,
    ) -> Self {
        Self {
            scale: group.scoring_scale,
            weighted: group.weighted,
            criteria,
            scores,
            submissions,
            judge_names,
        }
    }
}

/// A score row that survived filtering, with its resolved positions
struct Counted<'a> {
    score: &'a Score,
    submission: usize,
    criterion: usize,
}

struct SubmissionTally {
    total: Decimal,
    ratings: i64,
    judges: BTreeSet<Uuid>,
    per_criterion: Vec<Vec<i16>>,
}

#[derive(Default)]
struct RatingTally {
    sum: i64,
    count: i64,
    min: Option<i16>,
    max: Option<i16>,
}

impl RatingTally {
    fn add(&mut self, rating: i16) {
        self.sum += i64::from(rating);
        self.count += 1;
        self.min = Some(self.min.map_or(rating, |m| m.min(rating)));
        self.max = Some(self.max.map_or(rating, |m| m.max(rating)));
    }

    fn mean(&self) -> Decimal {
        round(ratio(Decimal::from(self.sum), Decimal::from(self.count)))
    }
}

#[derive(Default)]
struct JudgeTally<'a> {
    ratings: RatingTally,
    by_submission: BTreeMap<usize, Vec<&'a Counted<'a>>>,
}

/// Derive the full results snapshot. Scores for criteria outside the current
/// set, or for submissions the directory no longer lists, are skipped.
pub fn aggregate(input: &AggregationInput<'_>) -> ResultsSnapshot {
    let mut criteria: Vec<&Criterion> = input.criteria.iter().collect();
    criteria.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.criterion_id.cmp(&b.criterion_id))
    });
    let criterion_index: HashMap<Uuid, usize> = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| (c.criterion_id, i))
        .collect();

    let mut submissions: Vec<&Submission> = input.submissions.iter().collect();
    submissions.sort_by_key(|s| s.submission_id);
    submissions.dedup_by_key(|s| s.submission_id);
    let submission_index: HashMap<Uuid, usize> = submissions
        .iter()
        .enumerate()
        .map(|(i, s)| (s.submission_id, i))
        .collect();

    let mut counted: Vec<Counted<'_>> = input
        .scores
        .iter()
        .filter_map(|score| {
            Some(Counted {
                score,
                submission: *submission_index.get(&score.submission_id)?,
                criterion: *criterion_index.get(&score.criterion_id)?,
            })
        })
        .collect();
    counted.sort_by_key(|c| (c.submission, c.score.judge_id, c.criterion));

    tracing::debug!(
        criteria = criteria.len(),
        submissions = submissions.len(),
        scores = input.scores.len(),
        counted = counted.len(),
        "Aggregating judging results"
    );

    let criteria_count = criteria.len() as i64;
    let weight_total = if input.weighted {
        criteria.iter().map(|c| c.weight).sum()
    } else {
        Decimal::from(criteria_count)
    };

    let mut tallies: Vec<SubmissionTally> = submissions
        .iter()
        .map(|_| SubmissionTally {
            total: Decimal::ZERO,
            ratings: 0,
            judges: BTreeSet::new(),
            per_criterion: vec![Vec::new(); criteria.len()],
        })
        .collect();
    let mut criterion_tallies: Vec<RatingTally> =
        criteria.iter().map(|_| RatingTally::default()).collect();
    let mut judge_tallies: BTreeMap<Uuid, JudgeTally<'_>> = BTreeMap::new();
    let mut group_tally = RatingTally::default();

    for entry in &counted {
        let rating = entry.score.rating;
        let factor = if input.weighted {
            criteria[entry.criterion].weight
        } else {
            Decimal::ONE
        };

        let tally = &mut tallies[entry.submission];
        tally.total += Decimal::from(rating) * factor;
        tally.ratings += 1;
        tally.judges.insert(entry.score.judge_id);
        tally.per_criterion[entry.criterion].push(rating);

        criterion_tallies[entry.criterion].add(rating);
        group_tally.add(rating);

        let judge = judge_tallies.entry(entry.score.judge_id).or_default();
        judge.ratings.add(rating);
        judge
            .by_submission
            .entry(entry.submission)
            .or_default()
            .push(entry);
    }

    let group_judge_count = judge_tallies.len() as i64;
    let possible_per_submission = Decimal::from(criteria_count * group_judge_count);
    let scale_max = Decimal::from(input.scale.max_rating());

    let mut ranked: Vec<(usize, RankingEntry, Decimal)> = submissions
        .iter()
        .zip(&tallies)
        .enumerate()
        .map(|(index, (submission, tally))| {
            let average = ratio(tally.total, Decimal::from(tally.ratings));
            let completion = percentage(Decimal::from(tally.ratings), possible_per_submission);
            let entry = RankingEntry {
                rank: 0,
                submission: submission_info(submission),
                total_score: tally.total,
                average_score: round(average),
                max_possible_score: scale_max * weight_total * Decimal::from(tally.judges.len()),
                completion_percentage: completion,
                ratings_received: tally.ratings,
                judge_count: tally.judges.len() as i64,
                criteria: criteria
                    .iter()
                    .zip(&tally.per_criterion)
                    .map(|(criterion, ratings)| SubmissionCriterionScores {
                        criterion_id: criterion.criterion_id,
                        question: criterion.question.clone(),
                        average_score: round(ratio(
                            Decimal::from(ratings.iter().map(|r| i64::from(*r)).sum::<i64>()),
                            Decimal::from(ratings.len() as i64),
                        )),
                        ratings: ratings.clone(),
                    })
                    .collect(),
            };
            (index, entry, average)
        })
        .collect();

    ranked.sort_by(|(_, a, a_avg), (_, b, b_avg)| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| b_avg.cmp(a_avg))
            .then_with(|| a.submission.submission_id.cmp(&b.submission.submission_id))
    });

    let mut rank_of = vec![0usize; submissions.len()];
    for (position, (index, entry, _)) in ranked.iter_mut().enumerate() {
        entry.rank = position as i64 + 1;
        rank_of[*index] = position;
    }

    let completion_sum: Decimal = ranked
        .iter()
        .map(|(_, entry, _)| entry.completion_percentage)
        .sum();
    let submission_count = submissions.len() as i64;

    let overall = GroupStatistics {
        submission_count,
        criteria_count,
        submissions_judged: tallies.iter().filter(|t| t.ratings > 0).count() as i64,
        judge_count: group_judge_count,
        average_score: group_tally.mean(),
        completion_percentage: round(ratio(completion_sum, Decimal::from(submission_count))),
    };

    let criteria_breakdown = criteria
        .iter()
        .zip(&criterion_tallies)
        .map(|(criterion, tally)| CriterionBreakdown {
            criterion_id: criterion.criterion_id,
            question: criterion.question.clone(),
            order: criterion.order,
            weight: criterion.weight,
            average_score: tally.mean(),
            rating_count: tally.count,
            min_rating: tally.min,
            max_rating: tally.max,
        })
        .collect();

    let possible_per_judge = Decimal::from(criteria_count * submission_count);
    let judges = judge_tallies
        .into_iter()
        .map(|(judge_id, tally)| {
            let mut by_submission: Vec<(usize, Vec<&Counted<'_>>)> =
                tally.by_submission.into_iter().collect();
            by_submission.sort_by_key(|(index, _)| rank_of[*index]);

            JudgeSummary {
                judge_id,
                display_name: input
                    .judge_names
                    .get(&judge_id)
                    .cloned()
                    .unwrap_or_else(|| judge_id.to_string()),
                ratings_submitted: tally.ratings.count,
                average_rating: tally.ratings.mean(),
                completion_percentage: percentage(
                    Decimal::from(tally.ratings.count),
                    possible_per_judge,
                ),
                submissions: by_submission
                    .into_iter()
                    .map(|(index, entries)| JudgeSubmissionScores {
                        submission_id: submissions[index].submission_id,
                        title: submissions[index].title.clone(),
                        ratings: entries
                            .into_iter()
                            .map(|entry| JudgeRating {
                                criterion_id: entry.score.criterion_id,
                                question: criteria[entry.criterion].question.clone(),
                                rating: entry.score.rating,
                                comment: entry.score.comment.clone(),
                                scored_at: entry.score.updated_at,
                            })
                            .collect(),
                    })
                    .collect(),
            }
        })
        .collect();

    ResultsSnapshot {
        rankings: ranked.into_iter().map(|(_, entry, _)| entry).collect(),
        criteria: criteria_breakdown,
        judges,
        overall,
    }
}

fn submission_info(submission: &Submission) -> SubmissionInfo {
    SubmissionInfo {
        submission_id: submission.submission_id,
        title: submission.title.clone(),
        slug: submission.slug.clone(),
        url: submission.url.clone(),
    }
}

/// `numerator / denominator`, or zero when there is nothing to divide by
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Share of `possible` covered by `received`, in percent, clamped to [0, 100]
fn percentage(received: Decimal, possible: Decimal) -> Decimal {
    round(ratio(received * Decimal::ONE_HUNDRED, possible).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn criterion(n: u128, question: &str, order: i32, weight: Decimal) -> Criterion {
        Criterion {
            criterion_id: id(100 + n),
            group_id: id(1),
            question: question.to_string(),
            description: None,
            weight,
            order,
            created_at: at(0),
        }
    }

    fn submission(n: u128, title: &str) -> Submission {
        Submission {
            submission_id: id(200 + n),
            group_id: id(1),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            url: Some(format!("https://example.com/{n}")),
            created_at: at(n as i64),
        }
    }

    fn score(judge: u128, submission: u128, criterion: u128, rating: i16) -> Score {
        Score {
            score_id: Uuid::new_v4(),
            group_id: id(1),
            judge_id: id(300 + judge),
            submission_id: id(200 + submission),
            criterion_id: id(100 + criterion),
            rating,
            comment: None,
            created_at: at(10),
            updated_at: at(10),
        }
    }

    struct Fixture {
        criteria: Vec<Criterion>,
        submissions: Vec<Submission>,
        scores: Vec<Score>,
        names: BTreeMap<Uuid, String>,
        weighted: bool,
    }

    impl Fixture {
        fn run(&self) -> ResultsSnapshot {
            aggregate(&AggregationInput {
                scale: ScoringScale::TenPoint,
                weighted: self.weighted,
                criteria: &self.criteria,
                scores: &self.scores,
                submissions: &self.submissions,
                judge_names: &self.names,
            })
        }
    }

    /// Two criteria, two judges, three submissions: judge A rates S1 (8, 9)
    /// and S3 (5, 5), judge B rates S1 (7, 8), nobody rates S2.
    fn scenario() -> Fixture {
        Fixture {
            criteria: vec![
                criterion(1, "Design", 0, Decimal::ONE),
                criterion(2, "Fun", 1, Decimal::ONE),
            ],
            submissions: vec![
                submission(1, "Submission 1"),
                submission(2, "Submission 2"),
                submission(3, "Submission 3"),
            ],
            scores: vec![
                score(1, 1, 1, 8),
                score(1, 1, 2, 9),
                score(2, 1, 1, 7),
                score(2, 1, 2, 8),
                score(1, 3, 1, 5),
                score(1, 3, 2, 5),
            ],
            names: BTreeMap::from([
                (id(301), "Ada".to_string()),
                (id(302), "Brian".to_string()),
            ]),
            weighted: false,
        }
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_scenario_rankings() {
        let snapshot = scenario().run();
        let order: Vec<Uuid> = snapshot
            .rankings
            .iter()
            .map(|r| r.submission.submission_id)
            .collect();
        assert_eq!(order, vec![id(201), id(203), id(202)]);

        let first = &snapshot.rankings[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.total_score, dec("32"));
        assert_eq!(first.average_score, dec("8.0"));
        assert_eq!(first.completion_percentage, dec("100"));
        assert_eq!(first.max_possible_score, dec("40"));
        assert_eq!(first.judge_count, 2);

        let third = &snapshot.rankings[1];
        assert_eq!(third.total_score, dec("10"));
        assert_eq!(third.average_score, dec("5.0"));
        assert_eq!(third.completion_percentage, dec("50"));
        assert_eq!(third.max_possible_score, dec("20"));

        let second = &snapshot.rankings[2];
        assert_eq!(second.rank, 3);
        assert_eq!(second.total_score, Decimal::ZERO);
        assert_eq!(second.average_score, Decimal::ZERO);
        assert_eq!(second.completion_percentage, Decimal::ZERO);
        assert_eq!(second.max_possible_score, Decimal::ZERO);
    }

    #[test]
    fn test_scenario_per_criterion_scores() {
        let snapshot = scenario().run();
        let first = &snapshot.rankings[0];
        assert_eq!(first.criteria[0].ratings, vec![8, 7]);
        assert_eq!(first.criteria[0].average_score, dec("7.5"));
        assert_eq!(first.criteria[1].ratings, vec![9, 8]);

        let design = &snapshot.criteria[0];
        assert_eq!(design.question, "Design");
        assert_eq!(design.rating_count, 3);
        assert_eq!(design.average_score, dec("6.67"));
        assert_eq!(design.min_rating, Some(5));
        assert_eq!(design.max_rating, Some(8));
    }

    #[test]
    fn test_scenario_overall_statistics() {
        let overall = scenario().run().overall;
        assert_eq!(overall.submission_count, 3);
        assert_eq!(overall.criteria_count, 2);
        assert_eq!(overall.submissions_judged, 2);
        assert_eq!(overall.judge_count, 2);
        assert_eq!(overall.average_score, dec("7.0"));
        assert_eq!(overall.completion_percentage, dec("50"));
    }

    #[test]
    fn test_scenario_judge_summaries() {
        let judges = scenario().run().judges;
        assert_eq!(judges.len(), 2);

        let ada = &judges[0];
        assert_eq!(ada.display_name, "Ada");
        assert_eq!(ada.ratings_submitted, 4);
        assert_eq!(ada.average_rating, dec("6.75"));
        assert_eq!(ada.completion_percentage, dec("66.67"));
        let titles: Vec<&str> = ada.submissions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Submission 1", "Submission 3"]);
        assert_eq!(ada.submissions[0].ratings[0].question, "Design");
        assert_eq!(ada.submissions[0].ratings[1].rating, 9);

        let brian = &judges[1];
        assert_eq!(brian.ratings_submitted, 2);
        assert_eq!(brian.average_rating, dec("7.5"));
    }

    #[test]
    fn test_zero_scores_yield_zero_metrics() {
        let mut fixture = scenario();
        fixture.scores.clear();
        let snapshot = fixture.run();

        assert_eq!(snapshot.overall.submissions_judged, 0);
        assert_eq!(snapshot.overall.average_score, Decimal::ZERO);
        assert_eq!(snapshot.overall.judge_count, 0);
        assert_eq!(snapshot.overall.completion_percentage, Decimal::ZERO);
        assert!(snapshot.judges.is_empty());
        assert!(
            snapshot
                .rankings
                .iter()
                .all(|r| r.total_score.is_zero() && r.completion_percentage.is_zero())
        );
    }

    #[test]
    fn test_empty_group_yields_empty_snapshot() {
        let fixture = Fixture {
            criteria: vec![],
            submissions: vec![],
            scores: vec![],
            names: BTreeMap::new(),
            weighted: false,
        };
        let snapshot = fixture.run();
        assert!(snapshot.rankings.is_empty());
        assert!(snapshot.criteria.is_empty());
        assert_eq!(snapshot.overall.average_score, Decimal::ZERO);
        assert_eq!(snapshot.overall.completion_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_output_is_independent_of_row_order() {
        let fixture = scenario();
        let first = fixture.run();

        let mut shuffled = scenario();
        shuffled.scores.reverse();
        shuffled.submissions.reverse();
        shuffled.criteria.reverse();

        assert_eq!(first, shuffled.run());
        assert_eq!(first, fixture.run());
    }

    #[test]
    fn test_ties_break_on_submission_id() {
        let fixture = Fixture {
            criteria: vec![criterion(1, "Design", 0, Decimal::ONE)],
            submissions: vec![submission(9, "Later"), submission(4, "Earlier")],
            scores: vec![score(1, 9, 1, 6), score(1, 4, 1, 6)],
            names: BTreeMap::new(),
            weighted: false,
        };

        for _ in 0..3 {
            let order: Vec<Uuid> = fixture
                .run()
                .rankings
                .iter()
                .map(|r| r.submission.submission_id)
                .collect();
            assert_eq!(order, vec![id(204), id(209)]);
        }
    }

    #[test]
    fn test_equal_totals_break_on_average() {
        // S1: one judge, 10 + 10 = 20 over 2 ratings. S2: 5 + 5 + 5 + 5 = 20
        // over 4 ratings. Equal totals, S1 has the higher average.
        let fixture = Fixture {
            criteria: vec![
                criterion(1, "Design", 0, Decimal::ONE),
                criterion(2, "Fun", 1, Decimal::ONE),
            ],
            submissions: vec![submission(1, "Polished"), submission(2, "Broad")],
            scores: vec![
                score(1, 2, 1, 5),
                score(1, 2, 2, 5),
                score(2, 2, 1, 5),
                score(2, 2, 2, 5),
                score(3, 1, 1, 10),
                score(3, 1, 2, 10),
            ],
            names: BTreeMap::new(),
            weighted: false,
        };
        let rankings = fixture.run().rankings;
        assert_eq!(rankings[0].submission.title, "Polished");
        assert_eq!(rankings[1].submission.title, "Broad");
    }

    #[test]
    fn test_orphaned_rows_are_ignored() {
        let mut fixture = scenario();
        // Rating against a criterion no longer in the set
        fixture.scores.push(score(1, 2, 7, 10));
        // Rating for a submission the directory no longer lists
        fixture.scores.push(score(2, 8, 1, 10));

        let snapshot = fixture.run();
        assert_eq!(snapshot, scenario().run());
    }

    #[test]
    fn test_criteria_added_after_scoring_rescale_completion() {
        let mut fixture = scenario();
        fixture
            .criteria
            .push(criterion(3, "Audio", 2, Decimal::ONE));
        let snapshot = fixture.run();

        let first = &snapshot.rankings[0];
        assert_eq!(first.total_score, dec("32"));
        assert_eq!(first.max_possible_score, dec("60"));
        assert_eq!(first.completion_percentage, dec("66.67"));
        assert!(first.criteria[2].ratings.is_empty());
        assert_eq!(snapshot.criteria[2].rating_count, 0);
        assert_eq!(snapshot.criteria[2].min_rating, None);
    }

    #[test]
    fn test_weights_apply_only_when_enabled() {
        let mut fixture = scenario();
        fixture.criteria[0].weight = dec("2");
        fixture.criteria[1].weight = dec("0.5");

        let unweighted = fixture.run();
        assert_eq!(unweighted.rankings[0].total_score, dec("32"));

        fixture.weighted = true;
        let weighted = fixture.run();
        let first = &weighted.rankings[0];
        // (8 + 7) * 2 + (9 + 8) * 0.5
        assert_eq!(first.total_score, dec("38.5"));
        assert_eq!(first.average_score, dec("9.63"));
        assert_eq!(first.max_possible_score, dec("50"));
        assert_eq!(weighted.overall.average_score, dec("7.0"));
    }

    #[test]
    fn test_unknown_judge_falls_back_to_id() {
        let mut fixture = scenario();
        fixture.names.clear();
        let judges = fixture.run().judges;
        assert_eq!(judges[0].display_name, id(301).to_string());
    }
}
