use std::fmt::Write as _;
use std::io::Write;

use storage::{
    dto::results::ResultsSnapshot,
    models::JudgingGroup,
    services::{Caller, JudgingService, export},
};

use crate::error::Result;

/// A group together with its freshly aggregated results
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: JudgingGroup,
    pub snapshot: ResultsSnapshot,
}

pub async fn load_report(service: &JudgingService, slug: &str) -> Result<GroupReport> {
    let (group, snapshot) = service.export_snapshot(&Caller::System, slug).await?;
    tracing::debug!(
        group = %group.slug,
        rankings = snapshot.rankings.len(),
        judges = snapshot.judges.len(),
        "Loaded results"
    );
    Ok(GroupReport { group, snapshot })
}

impl GroupReport {
    /// Write one CSV row per rating; returns the number of rows written
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<usize> {
        Ok(export::write_csv(&self.snapshot, writer)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.snapshot)?;
        Ok(())
    }

    /// Plain-text leaderboard for terminals
    pub fn summary(&self) -> String {
        let overall = &self.snapshot.overall;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{} ({}): {} submissions, {} criteria, {} judges, {}% complete",
            self.group.name,
            self.group.slug,
            overall.submission_count,
            overall.criteria_count,
            overall.judge_count,
            overall.completion_percentage,
        );

        for entry in &self.snapshot.rankings {
            let _ = writeln!(
                out,
                "{:>3}. {:<32} total {:>8}  avg {:>6}  max {:>8}  {:>6}% complete",
                entry.rank,
                entry.submission.title,
                entry.total_score,
                entry.average_score,
                entry.max_possible_score,
                entry.completion_percentage,
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use storage::{
        dto::{criterion::CriterionInput, group::CreateGroupRequest, score::SubmitScoreRequest},
        models::{Submission, User},
        store::MemoryStore,
    };
    use uuid::Uuid;

    async fn seeded() -> JudgingService {
        let store = Arc::new(MemoryStore::new());
        let service = JudgingService::from_store(store.clone());

        let request: CreateGroupRequest =
            serde_json::from_str(r#"{"name":"Autumn Jam","slug":"autumn-jam"}"#).unwrap();
        let group = service.create_group(&Caller::System, request).await.unwrap();
        let criteria = service
            .save_criteria(
                &Caller::System,
                "autumn-jam",
                &[CriterionInput {
                    question: "Polish".to_string(),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();

        let submission_id = Uuid::new_v4();
        store
            .add_submission(Submission {
                submission_id,
                group_id: group.group_id,
                title: "Moonlander".to_string(),
                slug: "moonlander".to_string(),
                url: None,
                created_at: Utc::now(),
            })
            .await;

        let judge = Uuid::new_v4();
        store
            .add_user(User {
                user_id: judge,
                display_name: "Lin".to_string(),
                is_admin: false,
            })
            .await;
        service
            .submit_score(
                &Caller::User(judge),
                "autumn-jam",
                None,
                SubmitScoreRequest {
                    submission_id,
                    criterion_id: criteria[0].criterion_id,
                    rating: 8,
                    comment: Some("tight controls".to_string()),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        service
    }

    #[tokio::test]
    async fn test_csv_report_has_one_row_per_rating() {
        let service = seeded().await;
        let report = load_report(&service, "autumn-jam").await.unwrap();

        let mut buf = Vec::new();
        assert_eq!(report.write_csv(&mut buf).unwrap(), 1);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("1,Moonlander,,Lin,Polish,8,tight controls,"));
    }

    #[tokio::test]
    async fn test_summary_lists_rankings() {
        let service = seeded().await;
        let report = load_report(&service, "autumn-jam").await.unwrap();

        let summary = report.summary();
        let mut lines = summary.lines();
        assert!(lines.next().unwrap().starts_with("Autumn Jam (autumn-jam): 1 submissions"));
        assert!(lines.next().unwrap().contains("Moonlander"));
    }

    #[tokio::test]
    async fn test_json_report_includes_judges() {
        let service = seeded().await;
        let report = load_report(&service, "autumn-jam").await.unwrap();

        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["judges"][0]["display_name"], "Lin");
    }

    #[tokio::test]
    async fn test_unknown_group_is_an_error() {
        let service = seeded().await;
        assert!(load_report(&service, "missing").await.is_err());
    }
}
