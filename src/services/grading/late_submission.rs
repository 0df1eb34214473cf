//! 迟交扣分

use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{GraderError, Result};
use crate::models::assignments::entities::LateSubmissionRule;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("ISO-8601 duration regex is valid")
});

/// ISO-8601 时长，例如 `P1D`、`PT12H`、`P1Y2M`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IsoDuration {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl IsoDuration {
    /// 年月按日历加，其余按固定时长加
    pub fn add_to(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        let shifted = start.checked_add_months(Months::new(months))?;
        let millis = (self.seconds * 1000.0).round() as i64;
        let fixed = Duration::try_weeks(i64::from(self.weeks))?
            .checked_add(&Duration::try_days(i64::from(self.days))?)?
            .checked_add(&Duration::try_hours(i64::from(self.hours))?)?
            .checked_add(&Duration::try_minutes(i64::from(self.minutes))?)?
            .checked_add(&Duration::try_milliseconds(millis)?)?;
        shifted.checked_add_signed(fixed)
    }
}

impl FromStr for IsoDuration {
    type Err = GraderError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GraderError::validation(format!("Invalid ISO-8601 duration: {s}"));
        // "P" 和 "PT" 没有任何分量
        if s == "P" || s.ends_with('T') {
            return Err(invalid());
        }
        let caps = ISO_DURATION.captures(s).ok_or_else(invalid)?;

        let int = |i: usize| -> Result<u32> {
            caps.get(i)
                .map(|m| m.as_str().parse::<u32>().map_err(|_| invalid()))
                .transpose()
                .map(|v| v.unwrap_or(0))
        };
        let seconds = caps
            .get(7)
            .map(|m| m.as_str().parse::<f64>().map_err(|_| invalid()))
            .transpose()?
            .unwrap_or(0.0);

        Ok(Self {
            years: int(1)?,
            months: int(2)?,
            weeks: int(3)?,
            days: int(4)?,
            hours: int(5)?,
            minutes: int(6)?,
            seconds,
        })
    }
}

/// 计算迟交系数
///
/// 没有截止时间或按时提交时为 1.0；否则取第一个 `deadline + period`
/// 晚于提交时间的区间的系数；超过最后一个区间时返回 `LateSubmission` 错误。
pub fn late_submission_scaling(
    deadline: Option<DateTime<Utc>>,
    rules: &[LateSubmissionRule],
    submitted_at: DateTime<Utc>,
) -> Result<f64> {
    let Some(deadline) = deadline else {
        return Ok(1.0);
    };
    if submitted_at <= deadline {
        return Ok(1.0);
    }

    for rule in rules {
        let period: IsoDuration = rule.period.parse()?;
        let until = period.add_to(deadline).ok_or_else(|| {
            GraderError::validation(format!("Late submission period out of range: {}", rule.period))
        })?;
        if until > submitted_at {
            return Ok(rule.scaling);
        }
    }

    Err(GraderError::late_submission(
        "Submission after due date of assignment",
    ))
}
