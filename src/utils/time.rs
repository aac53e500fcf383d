//! 时间工具

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime, NaiveTime};

/// 当前 Unix 时间戳 (毫秒)，时钟早于 1970 时返回 0
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// 本地当前时间
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// 把日期时间换成同一天的整点
pub fn at_hour(base: NaiveDateTime, hour: u32) -> Option<NaiveDateTime> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
    Some(base.date().and_time(time))
}

/// 格式化毫秒为 MM:SS.ms
pub fn format_mmss_ms(ms: u64) -> String {
    let mm = ms / 60_000;
    let ss = (ms / 1_000) % 60;
    format!("{:02}:{:02}.{:03}", mm, ss, ms % 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_at_hour() {
        let base = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(13, 27, 9)
            .unwrap();
        let evening = at_hour(base, 19).unwrap();
        assert_eq!(evening.hour(), 19);
        assert_eq!(evening.minute(), 0);
        assert_eq!(evening.date(), base.date());
        assert!(at_hour(base, 24).is_none());
    }

    #[test]
    fn test_format_mmss_ms() {
        assert_eq!(format_mmss_ms(0), "00:00.000");
        assert_eq!(format_mmss_ms(65_500), "01:05.500");
        assert_eq!(format_mmss_ms(3_661_007), "61:01.007");
    }

    #[test]
    fn test_now_ms_advances() {
        assert!(now_ms() > 1_600_000_000_000);
    }
}
