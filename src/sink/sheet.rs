//! Spreadsheet-style history of report rows, kept in DuckDB.
//!
//! Every published report appends one row per channel. The pivot view sums
//! pending notifications per (report timestamp, channel).

use super::traits::{ReportSink, SinkError};
use crate::aggregate::stat::Report;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::Connection;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One appended row: `[timestamp, channelName, notificationCount, totalMessages]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub timestamp: DateTime<Utc>,
    pub channel_name: String,
    pub notification_count: u64,
    pub total_messages: u64,
}

/// Timestamps down, channel names across, summed pending counts in the cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotTable {
    pub channels: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    pub timestamp: DateTime<Utc>,
    /// One cell per entry of `PivotTable::channels`, 0 where no row exists.
    pub counts: Vec<u64>,
}

impl PivotTable {
    /// Tab-separated rendering with a header row.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("timestamp");
        for channel in &self.channels {
            out.push('\t');
            out.push_str(channel);
        }
        out.push('\n');

        for row in &self.rows {
            out.push_str(&row.timestamp.to_rfc3339());
            for count in &row.counts {
                out.push('\t');
                out.push_str(&count.to_string());
            }
            out.push('\n');
        }
        out
    }
}

pub struct SheetSink {
    conn: Arc<Mutex<Connection>>,
}

impl SheetSink {
    /// Open (or create) the history database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let sink = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        sink.init_schema()?;
        Ok(sink)
    }

    /// In-memory history, used by tests.
    pub fn in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        let sink = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        sink.init_schema()?;
        Ok(sink)
    }

    fn init_schema(&self) -> Result<(), SinkError> {
        let conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notification_counts (
                recorded_at TIMESTAMPTZ NOT NULL,
                channel_name VARCHAR NOT NULL,
                notification_count UBIGINT NOT NULL,
                total_messages UBIGINT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notification_counts_recorded_at
             ON notification_counts(recorded_at)",
            [],
        )?;
        Ok(())
    }

    pub async fn append(&self, report: &Report) -> Result<usize, SinkError> {
        let conn = self.conn.clone();
        let recorded_at = report.generated_at.timestamp_micros();
        let rows: Vec<(String, u64, u64)> = report
            .stats
            .iter()
            .map(|s| (s.channel_name.clone(), s.notification_count, s.total_messages))
            .collect();

        tokio::task::spawn_blocking(move || -> Result<usize, SinkError> {
            let mut conn = conn.lock().map_err(|_| SinkError::Poisoned)?;
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO notification_counts
                     (recorded_at, channel_name, notification_count, total_messages)
                     VALUES (to_timestamp(? / 1000000.0), ?, ?, ?)",
                )?;
                for (channel_name, notification_count, total_messages) in &rows {
                    stmt.execute(duckdb::params![
                        recorded_at,
                        channel_name,
                        notification_count,
                        total_messages
                    ])?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await?
    }

    /// All rows in insertion-time order.
    pub async fn rows(&self) -> Result<Vec<SheetRow>, SinkError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<SheetRow>, SinkError> {
            let conn = conn.lock().map_err(|_| SinkError::Poisoned)?;
            let mut stmt = conn.prepare(
                "SELECT epoch_us(recorded_at), channel_name, notification_count, total_messages
                 FROM notification_counts
                 ORDER BY recorded_at, channel_name",
            )?;
            let raw = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u64>(2)?,
                        row.get::<_, u64>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            raw.into_iter()
                .map(|(micros, channel_name, notification_count, total_messages)| {
                    Ok(SheetRow {
                        timestamp: timestamp_from_micros(micros)?,
                        channel_name,
                        notification_count,
                        total_messages,
                    })
                })
                .collect()
        })
        .await?
    }

    /// Sum of pending notifications grouped by report timestamp and channel.
    pub async fn pivot(&self) -> Result<PivotTable, SinkError> {
        let conn = self.conn.clone();
        let cells = tokio::task::spawn_blocking(move || -> Result<Vec<(i64, String, u64)>, SinkError> {
            let conn = conn.lock().map_err(|_| SinkError::Poisoned)?;
            let mut stmt = conn.prepare(
                "SELECT epoch_us(recorded_at), channel_name,
                        CAST(SUM(notification_count) AS UBIGINT)
                 FROM notification_counts
                 GROUP BY recorded_at, channel_name
                 ORDER BY recorded_at, channel_name",
            )?;
            let cells = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u64>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(cells)
        })
        .await??;

        build_pivot(cells)
    }
}

fn timestamp_from_micros(micros: i64) -> Result<DateTime<Utc>, SinkError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| SinkError::InvalidData(format!("timestamp out of range: {}", micros)))
}

fn build_pivot(cells: Vec<(i64, String, u64)>) -> Result<PivotTable, SinkError> {
    let channels: Vec<String> = cells
        .iter()
        .map(|(_, channel, _)| channel.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut by_timestamp: BTreeMap<i64, HashMap<String, u64>> = BTreeMap::new();
    for (micros, channel, count) in cells {
        *by_timestamp
            .entry(micros)
            .or_default()
            .entry(channel)
            .or_default() += count;
    }

    let rows = by_timestamp
        .into_iter()
        .map(|(micros, counts)| {
            Ok(PivotRow {
                timestamp: timestamp_from_micros(micros)?,
                counts: channels
                    .iter()
                    .map(|c| counts.get(c).copied().unwrap_or(0))
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, SinkError>>()?;

    Ok(PivotTable { channels, rows })
}

#[async_trait]
impl ReportSink for SheetSink {
    fn name(&self) -> &str {
        "sheet"
    }

    async fn publish(&self, report: &Report) -> Result<(), SinkError> {
        let appended = self.append(report).await?;
        tracing::info!(rows = appended, "Appended report rows to sheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::stat::ChannelStat;
    use crate::aggregate::window::TimeWindow;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn stat(name: &str, pending: u64, total: u64) -> ChannelStat {
        ChannelStat {
            channel_name: name.to_string(),
            notification_count: pending,
            total_messages: total,
            error: None,
        }
    }

    fn report(secs: i64, stats: Vec<ChannelStat>) -> Report {
        Report {
            generated_at: at(secs),
            window: TimeWindow::new(secs - 3600, secs).unwrap(),
            stats,
        }
    }

    #[test]
    fn test_build_pivot_fills_missing_cells() {
        let pivot = build_pivot(vec![
            (1_000_000, "random".to_string(), 2),
            (1_000_000, "general".to_string(), 1),
            (2_000_000, "general".to_string(), 4),
        ])
        .unwrap();

        assert_eq!(pivot.channels, vec!["general", "random"]);
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(pivot.rows[0].counts, vec![1, 2]);
        assert_eq!(pivot.rows[1].counts, vec![4, 0]);
    }

    #[test]
    fn test_tsv_rendering() {
        let pivot = PivotTable {
            channels: vec!["general".to_string()],
            rows: vec![PivotRow {
                timestamp: at(0),
                counts: vec![3],
            }],
        };
        assert_eq!(
            pivot.to_tsv(),
            "timestamp\tgeneral\n1970-01-01T00:00:00+00:00\t3\n"
        );
    }

    #[tokio::test]
    async fn test_append_and_read_rows() {
        let sink = SheetSink::in_memory().unwrap();
        sink.publish(&report(
            1_700_003_600,
            vec![stat("general", 1, 3), ChannelStat::failed("random", "boom")],
        ))
        .await
        .unwrap();

        let rows = sink.rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, at(1_700_003_600));
        assert_eq!(rows[0].channel_name, "general");
        assert_eq!(rows[0].notification_count, 1);
        assert_eq!(rows[0].total_messages, 3);
        assert_eq!(rows[1].notification_count, 0);
    }

    #[tokio::test]
    async fn test_pivot_across_reports() {
        let sink = SheetSink::in_memory().unwrap();
        sink.append(&report(1_700_003_600, vec![stat("general", 1, 3), stat("random", 0, 0)]))
            .await
            .unwrap();
        sink.append(&report(1_700_007_200, vec![stat("general", 5, 9)]))
            .await
            .unwrap();

        let pivot = sink.pivot().await.unwrap();
        assert_eq!(pivot.channels, vec!["general", "random"]);
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(pivot.rows[0].timestamp, at(1_700_003_600));
        assert_eq!(pivot.rows[0].counts, vec![1, 0]);
        assert_eq!(pivot.rows[1].counts, vec![5, 0]);
    }

    #[tokio::test]
    async fn test_empty_pivot() {
        let sink = SheetSink::in_memory().unwrap();
        assert_eq!(sink.pivot().await.unwrap(), PivotTable::default());
    }
}
