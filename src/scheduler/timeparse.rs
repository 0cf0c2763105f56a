//! 自然语言时间解析
//!
//! 固定优先级规则链，先命中者胜（无论出现在字符串何处）：
//! 1. 绝对时间 `YYYY-MM-DD HH:MM`
//! 2. 相对偏移 `in N minutes|hours`
//! 3. 含 "tomorrow"：次日 + am/pm 或 HH:MM，缺省 09:00
//! 4. 含 "today" / 以 "at " 开头 / 含 " at "：当日时刻，不晚于 now 则顺延一天
//! 5. 裸 am/pm 或 HH:MM：今天的下一次出现（不晚于 now 则顺延一天）
//! 6. 都不命中返回 None
//!
//! 12 小时制转换：12am -> 0 点，12pm -> 12 点。

use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime, Timelike};
use regex::Regex;

static AMPM_RE: OnceLock<Regex> = OnceLock::new();
static HHMM_RE: OnceLock<Regex> = OnceLock::new();
static IN_X_RE: OnceLock<Regex> = OnceLock::new();
static DATE_TIME_RE: OnceLock<Regex> = OnceLock::new();

fn ampm_re() -> &'static Regex {
    AMPM_RE.get_or_init(|| Regex::new(r"\b(1[0-2]|0?[1-9])\s*(am|pm)\b").unwrap())
}

fn hhmm_re() -> &'static Regex {
    HHMM_RE.get_or_init(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap())
}

fn in_x_re() -> &'static Regex {
    IN_X_RE.get_or_init(|| Regex::new(r"(?i)\bin\s+(\d+)\s+(minute|minutes|hour|hours)\b").unwrap())
}

fn date_time_re() -> &'static Regex {
    DATE_TIME_RE.get_or_init(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\s+(\d{1,2}:\d{2})\b").unwrap())
}

/// 12 小时制小时转 24 小时制
fn apply_ampm(hour: u32, ampm: &str) -> u32 {
    if ampm.eq_ignore_ascii_case("am") {
        if hour == 12 {
            0
        } else {
            hour
        }
    } else if hour == 12 {
        12
    } else {
        hour + 12
    }
}

/// 在已小写文本中找 am/pm 时刻，返回 24 小时制小时
fn find_ampm(lower: &str) -> Option<u32> {
    let caps = ampm_re().captures(lower)?;
    let hour: u32 = caps[1].parse().ok()?;
    Some(apply_ampm(hour, &caps[2]))
}

/// 在已小写文本中找 HH:MM 时刻
fn find_hhmm(lower: &str) -> Option<(u32, u32)> {
    let caps = hhmm_re().captures(lower)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// 解析自然语言时间短语；now 为参照时刻。规则与优先级见模块注释。
/// 小时/分钟超界（如 "67:00"）视为不可解析。
pub fn parse_natural_time(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.trim();

    // 规则 1：绝对时间 YYYY-MM-DD HH:MM（无效日期落空后继续尝试后续规则）
    if let Some(caps) = date_time_re().captures(text) {
        let literal = format!("{} {}", &caps[1], &caps[2]);
        if let Ok(dt) = NaiveDateTime::parse_from_str(&literal, "%Y-%m-%d %H:%M") {
            return Some(dt);
        }
    }

    // 规则 2：in N minutes/hours
    if let Some(caps) = in_x_re().captures(text) {
        let num: i64 = caps[1].parse().ok()?;
        let delta = if caps[2].to_lowercase().starts_with("minute") {
            Duration::minutes(num)
        } else {
            Duration::hours(num)
        };
        return Some(now + delta);
    }

    let lower = text.to_lowercase();

    // 规则 3：tomorrow（+ am/pm 或 HH:MM，缺省 09:00）
    if lower.contains("tomorrow") {
        let base = (now + Duration::days(1)).with_second(0)?.with_nanosecond(0)?;
        if let Some(hour) = find_ampm(&lower) {
            return base.with_hour(hour)?.with_minute(0);
        }
        if let Some((hour, minute)) = find_hhmm(&lower) {
            return base.with_hour(hour)?.with_minute(minute);
        }
        return base.with_hour(9)?.with_minute(0);
    }

    // 规则 4：today / "at ..."，时刻不晚于 now 则顺延一天
    if lower.contains("today") || lower.starts_with("at ") || lower.contains(" at ") {
        let base = now.with_second(0)?.with_nanosecond(0)?;
        if let Some(hour) = find_ampm(&lower) {
            let dt = base.with_hour(hour)?.with_minute(0)?;
            return Some(if dt > now { dt } else { dt + Duration::days(1) });
        }
        if let Some((hour, minute)) = find_hhmm(&lower) {
            let dt = base.with_hour(hour)?.with_minute(minute)?;
            return Some(if dt > now { dt } else { dt + Duration::days(1) });
        }
        // 无时刻信息：落到下面的裸时刻规则（同样无法命中时整体返回 None）
    }

    // 规则 5：裸 am/pm 或 HH:MM，解释为今天的下一次出现
    if let Some(hour) = find_ampm(&lower) {
        let dt = now
            .with_hour(hour)?
            .with_minute(0)?
            .with_second(0)?
            .with_nanosecond(0)?;
        return Some(if dt > now { dt } else { dt + Duration::days(1) });
    }
    if let Some((hour, minute)) = find_hhmm(&lower) {
        let dt = now
            .with_hour(hour)?
            .with_minute(minute)?
            .with_second(0)?
            .with_nanosecond(0)?;
        return Some(if dt > now { dt } else { dt + Duration::days(1) });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn tomorrow_with_ampm() {
        let now = at(2025, 1, 1, 0, 0);
        assert_eq!(
            parse_natural_time("tomorrow at 8AM", now),
            Some(at(2025, 1, 2, 8, 0))
        );
    }

    #[test]
    fn tomorrow_with_hhmm_and_default() {
        let now = at(2025, 1, 1, 13, 45);
        assert_eq!(
            parse_natural_time("tomorrow at 14:30", now),
            Some(at(2025, 1, 2, 14, 30))
        );
        assert_eq!(
            parse_natural_time("tomorrow", now),
            Some(at(2025, 1, 2, 9, 0))
        );
    }

    #[test]
    fn relative_offsets() {
        let now = at(2025, 1, 1, 10, 15);
        assert_eq!(
            parse_natural_time("in 30 minutes", now),
            Some(at(2025, 1, 1, 10, 45))
        );
        assert_eq!(
            parse_natural_time("in 2 hours", now),
            Some(at(2025, 1, 1, 12, 15))
        );
    }

    #[test]
    fn absolute_date_ignores_now() {
        let now = at(2030, 12, 31, 23, 59);
        assert_eq!(
            parse_natural_time("2025-10-01 14:00", now),
            Some(at(2025, 10, 1, 14, 0))
        );
    }

    #[test]
    fn absolute_beats_other_rules() {
        let now = at(2025, 1, 1, 0, 0);
        // 同一短语里既有绝对时间又有 "tomorrow"：绝对时间优先
        assert_eq!(
            parse_natural_time("tomorrow or 2025-10-01 14:00", now),
            Some(at(2025, 10, 1, 14, 0))
        );
    }

    #[test]
    fn today_rolls_forward_when_not_future() {
        let now = at(2025, 1, 1, 15, 0);
        assert_eq!(
            parse_natural_time("today at 14:00", now),
            Some(at(2025, 1, 2, 14, 0))
        );
        assert_eq!(
            parse_natural_time("today at 4pm", now),
            Some(at(2025, 1, 1, 16, 0))
        );
    }

    #[test]
    fn at_prefix_counts_as_today() {
        let now = at(2025, 1, 1, 8, 0);
        assert_eq!(
            parse_natural_time("at 14:00", now),
            Some(at(2025, 1, 1, 14, 0))
        );
    }

    #[test]
    fn exact_now_rolls_forward() {
        // 不是严格晚于 now：顺延一天
        let now = at(2025, 1, 1, 14, 0);
        assert_eq!(
            parse_natural_time("today at 14:00", now),
            Some(at(2025, 1, 2, 14, 0))
        );
    }

    #[test]
    fn bare_times() {
        let now = at(2025, 1, 1, 9, 30);
        assert_eq!(
            parse_natural_time("8AM", now),
            Some(at(2025, 1, 2, 8, 0))
        );
        assert_eq!(
            parse_natural_time("10:00", now),
            Some(at(2025, 1, 1, 10, 0))
        );
    }

    #[test]
    fn twelve_hour_conversion() {
        let now = at(2025, 1, 1, 1, 0);
        // 12am -> 0 点（今日 0 点已过，顺延）
        assert_eq!(
            parse_natural_time("12am", now),
            Some(at(2025, 1, 2, 0, 0))
        );
        // 12pm -> 12 点
        assert_eq!(
            parse_natural_time("12pm", now),
            Some(at(2025, 1, 1, 12, 0))
        );
    }

    #[test]
    fn unparsable_returns_none() {
        let now = at(2025, 1, 1, 0, 0);
        assert_eq!(parse_natural_time("whenever", now), None);
        assert_eq!(parse_natural_time("at noonish", now), None);
        assert_eq!(parse_natural_time("at 67:00", now), None);
    }
}
