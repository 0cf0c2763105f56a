//! 日程事件存储：SQLite 持久化
//!
//! events 表 {id 自增, title, when_ts}；when_ts 为本地 ISO-8601 分钟精度（无时区），
//! 列表始终按 when_ts 升序。add_event 先经自然语言时间解析，解析失败即报错。

use std::path::Path;
use std::sync::Mutex;

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::scheduler::parse_natural_time;

/// when_ts 的存储格式（ISO-8601 本地时间，分钟精度）
const WHEN_TS_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// 日程层错误
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// 自然语言时间短语无法解析
    #[error("Could not parse time from: {0}")]
    UnparsableTime(String),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
}

/// 一条日程事件
#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub title: String,
    /// ISO-8601 本地时间戳（分钟精度）
    pub when_ts: String,
}

impl Event {
    pub fn when_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.when_ts, WHEN_TS_FORMAT).ok()
    }
}

/// SQLite 事件存储
pub struct EventStore {
    conn: Mutex<Connection>,
}

impl EventStore {
    /// 打开（或创建）事件库文件；父目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// 内存库（测试用）
    pub fn open_in_memory() -> Result<Self, SchedulerError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SchedulerError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                when_ts TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 新增事件：when_str 经自然语言解析；now 缺省取本地当前时刻（测试可注入）
    pub fn add_event(
        &self,
        title: &str,
        when_str: &str,
        now: Option<NaiveDateTime>,
    ) -> Result<i64, SchedulerError> {
        let now = now.unwrap_or_else(|| Local::now().naive_local());
        let when = parse_natural_time(when_str, now)
            .ok_or_else(|| SchedulerError::UnparsableTime(when_str.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO events(title, when_ts) VALUES (?1, ?2)",
            params![title, when.format(WHEN_TS_FORMAT).to_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 全部事件，按时间升序
    pub fn list_events(&self) -> Result<Vec<Event>, SchedulerError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, title, when_ts FROM events ORDER BY when_ts ASC")?;
        let events = stmt
            .query_map([], |row| {
                Ok(Event {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    when_ts: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// 删除事件；存在并删除返回 true
    pub fn remove_event(&self, event_id: i64) -> Result<bool, SchedulerError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM events WHERE id = ?1", params![event_id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn add_list_remove_round_trip() {
        let store = EventStore::open_in_memory().unwrap();
        let later = store
            .add_event("dentist", "2025-10-01 14:00", Some(fixed_now()))
            .unwrap();
        let earlier = store
            .add_event("standup", "tomorrow at 8AM", Some(fixed_now()))
            .unwrap();
        assert_eq!((later, earlier), (1, 2));

        // 列表按时间升序，与插入顺序无关
        let events = store.list_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "standup");
        assert_eq!(events[0].when_ts, "2025-01-02T08:00");
        assert_eq!(events[1].when_ts, "2025-10-01T14:00");
        assert!(events[0].when_datetime().unwrap() < events[1].when_datetime().unwrap());

        assert!(store.remove_event(later).unwrap());
        assert!(!store.remove_event(later).unwrap());
        assert_eq!(store.list_events().unwrap().len(), 1);
    }

    #[test]
    fn unparsable_time_is_rejected() {
        let store = EventStore::open_in_memory().unwrap();
        let err = store
            .add_event("mystery", "whenever", Some(fixed_now()))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnparsableTime(_)));
        assert!(store.list_events().unwrap().is_empty());
    }

    #[test]
    fn opens_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("events.db");
        let store = EventStore::open(&path).unwrap();
        store
            .add_event("ping", "in 30 minutes", Some(fixed_now()))
            .unwrap();
        drop(store);

        // 重新打开后数据仍在
        let store = EventStore::open(&path).unwrap();
        assert_eq!(store.list_events().unwrap().len(), 1);
    }
}
