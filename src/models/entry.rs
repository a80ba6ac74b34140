use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{Category, Period};

/// Ids of entries produced from a recurrence template start with this.
pub const MATERIALIZED_PREFIX: &str = "rec_";

/// Deterministic id of the entry a template produces for a period.
pub fn materialized_id(template_id: &str, period: Period) -> String {
    format!(
        "{MATERIALIZED_PREFIX}{template_id}_{}_{}",
        period.year(),
        period.month()
    )
}

static DATE_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})[-/]([0-9]{1,2})[-/]([0-9]{1,2})").ok());

const FALLBACK_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%b %d, %Y", "%d %b %Y"];

/// The date column of an entry: a real date, or whatever text the sheet held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDate {
    Native(NaiveDate),
    Text(String),
}

impl EntryDate {
    /// Interpret user or sheet text. Unparsable text is kept verbatim.
    pub fn from_text(raw: &str) -> Self {
        match parse_date(raw) {
            Some(d) => Self::Native(d),
            None => Self::Text(raw.to_string()),
        }
    }

    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// `YYYY-MM-DD` when the value is a date, the raw text otherwise.
    pub fn normalized(&self) -> String {
        match self {
            Self::Native(d) => d.format("%Y-%m-%d").to_string(),
            Self::Text(raw) => match parse_date(raw) {
                Some(d) => d.format("%Y-%m-%d").to_string(),
                None => raw.clone(),
            },
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = DATE_PREFIX.as_ref().and_then(|re| re.captures(text)) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// One dated financial fact for one member. Never edited, only deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: String,
    pub member_id: String,
    pub year: i32,
    pub month: u32,
    pub date: EntryDate,
    /// Stored spelling; see [`LedgerEntry::kind`].
    pub category: String,
    pub amount: i64,
    pub note: String,
    pub created_at: String,
    pub updated_at: String,
}

impl LedgerEntry {
    pub fn kind(&self) -> Option<Category> {
        Category::parse(&self.category)
    }

    pub fn is_materialized(&self) -> bool {
        self.id.starts_with(MATERIALIZED_PREFIX)
    }

    pub fn in_period(&self, member_id: &str, period: Period) -> bool {
        !self.member_id.is_empty()
            && self.member_id == member_id
            && period.matches(self.year, self.month)
    }
}
