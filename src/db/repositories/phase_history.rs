use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{conversion_error, format_datetime, parse_datetime, parse_phase, to_i64, to_u32},
    models::{FocusSummary, PhaseRecord},
    Database,
};

fn row_to_phase_record(row: &Row) -> Result<PhaseRecord, rusqlite::Error> {
    let phase: String = row.get("phase")?;
    let completed_at: String = row.get("completed_at")?;

    Ok(PhaseRecord {
        id: row.get("id")?,
        phase: parse_phase(&phase).map_err(conversion_error)?,
        planned_seconds: to_u32(row.get("planned_seconds")?, "planned_seconds")
            .map_err(conversion_error)?,
        completed_cycles: to_u32(row.get("completed_cycles")?, "completed_cycles")
            .map_err(conversion_error)?,
        completed_at: parse_datetime(&completed_at, "completed_at").map_err(conversion_error)?,
    })
}

impl Database {
    pub async fn insert_phase_record(&self, record: &PhaseRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO phase_history (id, phase, planned_seconds, completed_cycles, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.phase.as_str(),
                    record.planned_seconds,
                    record.completed_cycles,
                    format_datetime(&record.completed_at),
                ],
            )
            .with_context(|| "failed to insert phase record")?;
            Ok(())
        })
        .await
    }

    /// Most recent first.
    pub async fn list_phase_history(&self, limit: u64) -> Result<Vec<PhaseRecord>> {
        let limit = to_i64(limit)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phase, planned_seconds, completed_cycles, completed_at
                 FROM phase_history
                 ORDER BY completed_at DESC
                 LIMIT ?1",
            )?;

            let records = stmt
                .query_map(params![limit], row_to_phase_record)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(records)
        })
        .await
    }

    pub async fn focus_summary_since(&self, since: DateTime<Utc>) -> Result<FocusSummary> {
        self.execute(move |conn| {
            let summary = conn
                .query_row(
                    "SELECT
                         COUNT(*),
                         COALESCE(SUM(planned_seconds), 0)
                     FROM phase_history
                     WHERE phase = 'Focus' AND completed_at >= ?1",
                    params![format_datetime(&since)],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )
                .with_context(|| "failed to summarize focus history")?;

            Ok(FocusSummary {
                focus_phases: to_u32(summary.0, "focus_phases")?,
                focused_seconds: u64::try_from(summary.1).unwrap_or(0),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::cycle::Phase;

    fn record(phase: Phase, planned_seconds: u32, at: DateTime<Utc>) -> PhaseRecord {
        PhaseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            phase,
            planned_seconds,
            completed_cycles: 0,
            completed_at: at,
        }
    }

    #[tokio::test]
    async fn test_history_is_listed_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.sqlite3")).unwrap();
        let now = Utc::now();

        db.insert_phase_record(&record(Phase::Focus, 1500, now - Duration::minutes(30)))
            .await
            .unwrap();
        db.insert_phase_record(&record(Phase::ShortBreak, 300, now - Duration::minutes(5)))
            .await
            .unwrap();
        db.insert_phase_record(&record(Phase::Focus, 1200, now))
            .await
            .unwrap();

        let history = db.list_phase_history(2).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].phase, Phase::Focus);
        assert_eq!(history[0].planned_seconds, 1200);
        assert_eq!(history[1].phase, Phase::ShortBreak);
    }

    #[tokio::test]
    async fn test_focus_summary_excludes_breaks_and_old_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.sqlite3")).unwrap();
        let now = Utc::now();

        for (phase, seconds, at) in [
            (Phase::Focus, 1500, now - Duration::days(2)),
            (Phase::Focus, 1500, now - Duration::hours(1)),
            (Phase::Focus, 600, now),
            (Phase::LongBreak, 900, now),
        ] {
            db.insert_phase_record(&record(phase, seconds, at))
                .await
                .unwrap();
        }

        let summary = db
            .focus_summary_since(now - Duration::days(1))
            .await
            .unwrap();

        assert_eq!(
            summary,
            FocusSummary {
                focus_phases: 2,
                focused_seconds: 2100,
            }
        );
    }
}
