use std::io::Write;

use serde::Serialize;

use crate::dto::results::{JudgeSummary, RankingEntry, ResultsSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow<'a> {
    pub rank: i64,
    pub submission: &'a str,
    pub submission_url: &'a str,
    pub judge: &'a str,
    pub criterion: &'a str,
    pub rating: i16,
    pub comment: &'a str,
    pub scored_at: String,
}

/// Rows in ranking order, then judge order, then criterion order.
///
/// The iterator borrows the snapshot and builds each row on demand.
pub fn to_rows(snapshot: &ResultsSnapshot) -> impl Iterator<Item = ExportRow<'_>> + '_ {
    snapshot.rankings.iter().flat_map(move |entry| {
        snapshot
            .judges
            .iter()
            .flat_map(move |judge| rows_for(entry, judge))
    })
}

fn rows_for<'a>(
    entry: &'a RankingEntry,
    judge: &'a JudgeSummary,
) -> impl Iterator<Item = ExportRow<'a>> + 'a {
    judge
        .submissions
        .iter()
        .filter(move |s| s.submission_id == entry.submission.submission_id)
        .flat_map(|s| s.ratings.iter())
        .map(move |rating| ExportRow {
            rank: entry.rank,
            submission: &entry.submission.title,
            submission_url: entry.submission.url.as_deref().unwrap_or(""),
            judge: &judge.display_name,
            criterion: &rating.question,
            rating: rating.rating,
            comment: rating.comment.as_deref().unwrap_or(""),
            scored_at: rating.scored_at.to_rfc3339(),
        })
}

/// Serialize every row of `snapshot` into `writer` as CSV with a header line.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(snapshot: &ResultsSnapshot, writer: W) -> csv::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;

    for row in to_rows(snapshot) {
        csv_writer.serialize(row)?;
        written += 1;
    }

    if written == 0 {
        csv_writer.write_record(HEADER)?;
    }

    csv_writer.flush()?;
    Ok(written)
}

const HEADER: [&str; 8] = [
    "rank",
    "submission",
    "submission_url",
    "judge",
    "criterion",
    "rating",
    "comment",
    "scored_at",
];
