// ==========================================
// 码头堆存费用 KPI 系统 - 领域类型定义
// ==========================================
// 职责: 月份、等级、港口计费策略等基础值类型
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 自然月 (YearMonth)
// ==========================================
// 计费月份、KPI 目标月份统一使用该类型
// 排序语义: 先年后月
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// 构造自然月
    ///
    /// # 返回
    /// - Some(YearMonth): month 在 1..=12
    /// - None: 月份非法
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// 日期所在的自然月
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 当月第一天
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// 自 0 年 1 月起的月序号，用于月份加减
    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        let year = ordinal.div_euclid(12) as i32;
        let month = ordinal.rem_euclid(12) as u32 + 1;
        Self { year, month }
    }

    /// 月份偏移（可为负）
    pub fn add_months(&self, months: i32) -> Self {
        Self::from_ordinal(self.ordinal() + months as i64)
    }

    /// 上一个自然月
    pub fn prev_month(&self) -> Self {
        self.add_months(-1)
    }

    /// 去年同月
    pub fn prev_year(&self) -> Self {
        self.add_months(-12)
    }

    /// 两个月份之间相差的月数（other - self）
    pub fn months_until(&self, other: &YearMonth) -> i64 {
        other.ordinal() - self.ordinal()
    }

    /// 闭区间 [start, end] 内的所有自然月（start > end 时为空）
    pub fn range_inclusive(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
        let count = start.months_until(&end);
        if count < 0 {
            return Vec::new();
        }
        (0..=count).map(|i| start.add_months(i as i32)).collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    /// 解析 "YYYY-MM"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| format!("月份格式错误，期望 YYYY-MM: {}", trimmed))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("年份非法: {}", trimmed))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("月份非法: {}", trimmed))?;
        YearMonth::new(year, month).ok_or_else(|| format!("月份超出范围: {}", trimmed))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

// ==========================================
// KPI 等级 (Grade)
// ==========================================
// 总分含加分项，可超过 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// 总分 → 等级 (≥90 A, ≥80 B, ≥70 C, ≥60 D, 其余 F)
    pub fn from_score(total_score: f64) -> Self {
        if total_score >= 90.0 {
            Grade::A
        } else if total_score >= 80.0 {
            Grade::B
        } else if total_score >= 70.0 {
            Grade::C
        } else if total_score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}

// ==========================================
// 港口计费策略 (Port Policy)
// ==========================================
// Lazaro Cardenas 系列港口免堆期更长，且无首日固定费
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortPolicy {
    Standard,
    LazaroCardenas,
}

impl PortPolicy {
    /// 按目的港判定计费策略
    ///
    /// 大小写、首尾空白、内部多余空格均视为同一港口
    pub fn for_port(destination_port: Option<&str>) -> Self {
        let Some(port) = destination_port else {
            return PortPolicy::Standard;
        };

        let canonical = port
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
            .replace('Á', "A");

        match canonical.as_str() {
            "LZO" | "LAZARO" | "LAZARO CARDENAS" => PortPolicy::LazaroCardenas,
            _ => PortPolicy::Standard,
        }
    }
}

impl fmt::Display for PortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortPolicy::Standard => write!(f, "STANDARD"),
            PortPolicy::LazaroCardenas => write!(f, "LAZARO_CARDENAS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_month_arithmetic_crosses_year_boundary() {
        assert_eq!(ym(2024, 1).prev_month(), ym(2023, 12));
        assert_eq!(ym(2024, 3).prev_year(), ym(2023, 3));
        assert_eq!(ym(2023, 12).add_months(1), ym(2024, 1));
        assert_eq!(ym(2024, 12).add_months(-11), ym(2024, 1));
    }

    #[test]
    fn test_range_inclusive() {
        let months = YearMonth::range_inclusive(ym(2023, 11), ym(2024, 2));
        assert_eq!(
            months,
            vec![ym(2023, 11), ym(2023, 12), ym(2024, 1), ym(2024, 2)]
        );
        assert!(YearMonth::range_inclusive(ym(2024, 2), ym(2024, 1)).is_empty());
    }

    #[test]
    fn test_parse_and_display() {
        let m: YearMonth = "2024-07".parse().unwrap();
        assert_eq!(m, ym(2024, 7));
        assert_eq!(m.to_string(), "2024-07");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("202407".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(112.5), Grade::A);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.99), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
    }

    #[test]
    fn test_lazaro_port_variants() {
        for port in ["LZO", "LAZARO", "Lazaro Cardenas", "LAZARO CARDENAS", "  lazaro   cardenas "] {
            assert_eq!(PortPolicy::for_port(Some(port)), PortPolicy::LazaroCardenas, "{}", port);
        }
        assert_eq!(PortPolicy::for_port(Some("MANZANILLO")), PortPolicy::Standard);
        assert_eq!(PortPolicy::for_port(None), PortPolicy::Standard);
    }
}
