//! Rule-based reminder parser.
//!
//! Used when the semantic parser is disabled, unreachable, or keeps producing invalid payloads.
//! It is deterministic and has no external dependencies: the same text always yields the same
//! [`Intent`], and reminders it produces always carry [`FALLBACK_CONFIDENCE`].
//!
//! Pipeline: normalize numerals → keyword classification → clock-time patterns (tried in a
//! fixed order, first match wins) → relative patterns → task extraction.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Intent, IntentSource, ReminderIntent};
use crate::time::{DayOffset, RelativeUnit, TimeDescriptor};

/// Confidence attached to every reminder the fallback parser produces.
pub const FALLBACK_CONFIDENCE: f64 = 0.75;

/// Lead time used when a reminder request carries no recognizable time at all.
pub const DEFAULT_LEAD_MINUTES: f64 = 30.0;

/// Minimum length (in characters) of an extracted task before action phrases are tried.
const MIN_TASK_CHARS: usize = 2;

const REMINDER_KEYWORDS: &[&str] = &[
    "提醒", "记得", "别忘", "到时候", "时间到", "叫我", "通知我", "妈妈要", "爸爸要", "记得要",
    "remind", "remember to", "don't forget", "dont forget", "do not forget", "alert me",
    "wake me",
];

/// Phrases that only ask for a reminder when the text also names a time ("tell me at 5 ...").
const TIMED_REMINDER_KEYWORDS: &[&str] =
    &["叫", "通知", "告诉", "tell me", "let me know", "notify"];

/// Time vocabulary and reminder phrasing removed from CJK text, in removal order.
const CJK_STOPWORDS: &[&str] = &[
    "提醒", "我", "记得", "别忘", "到时候", "时间到", "明天", "后天", "今天", "上午", "下午",
    "中午", "晚上", "早上", "傍晚", "点", "分钟", "小时", "天", "一", "二", "三", "四", "五",
    "六", "七", "八", "九", "十", "半", "后", "前", "钟", "个", "的", "了", "要", "去", "来",
    "叫", "通知", "告诉", "妈妈", "爸爸", "爷爷", "奶奶", "您", "你",
];

/// Words dropped from the front of an English task ("remind me to ...").
const LEADING_STOPWORDS: &[&str] = &[
    "please", "remind", "me", "him", "her", "them", "us", "mom", "dad", "grandma", "grandpa",
    "to", "at", "that", "about", "remember", "don't", "dont", "do", "not", "forget", "tell", "let",
    "know", "alert", "notify", "and", "i", "need", "should", "can", "could", "would", "will",
    "you", "hey",
];

/// Words dropped from the end of an English task.
const TRAILING_STOPWORDS: &[&str] = &["at", "in", "on", "by", "please", "and", "for"];

const PLACEHOLDER_TASK_CJK: &str = "重要事项";
const PLACEHOLDER_TASK: &str = "something important";

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid fallback regex")
}

static CJK_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?P<num>[零一二两三四五六七八九十]+)(?P<unit>\s*(?:点|分钟|分|个?小时|个?钟头|天))")
});

static EN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"\b(?P<num>one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|forty|forty-five|fifty)\b(?P<unit>\s+(?:minutes?|mins?|hours?|days?|o'?clock))",
    )
});

static EN_AT_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\b(?P<at>at|past)\s+(?P<num>one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\b")
});

static EN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"\d\s*(?P<ampm>[ap])\.?m\b|\b(?P<word>morning|noon|afternoon|evening|tonight)\b")
});

/// Clock forms that carry minutes, in priority order: `H:MM`, `H点M分`, `H点半`.
static MINUTE_FORMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        regex(r"(?P<hour>\d{1,2})\s*:\s*(?P<minute>\d{2})"),
        regex(r"(?P<hour>\d{1,2})\s*点\s*(?P<minute>\d{1,2})"),
        regex(r"(?P<hour>\d{1,2})\s*点\s*(?P<half>半)|(?P<half2>half)\s+past\s+(?P<hour2>\d{1,2})"),
    ]
});

/// Clock forms with an hour only: `H点`, `H o'clock`, `Hpm`, `at H`.
static HOUR_FORM: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?P<hour>\d{1,2})\s*点|(?P<hour2>\d{1,2})\s*(?:o'?clock|[ap]\.?m\b)|\bat\s+(?P<hour3>\d{1,2})\b",
    )
});

/// Text right after an hour form that shows the number was a duration, not a clock time.
static DURATION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"^\s*(?:minutes?|mins?|hours?|hrs?|days?|分钟|小时|天)")
});

/// Relative patterns in priority order.
static RELATIVE_FORMS: LazyLock<Vec<(Regex, RelativeForm)>> = LazyLock::new(|| {
    vec![
        (
            regex(r"(?P<n>\d+(?:\.\d+)?)\s*(?:分钟|minutes?|mins?)"),
            RelativeForm::Count(RelativeUnit::Minute),
        ),
        (
            regex(r"半\s*个?\s*(?:小时|钟头)|\bhalf\s+an?\s+hour\b"),
            RelativeForm::Fixed(0.5, RelativeUnit::Hour),
        ),
        (
            regex(r"(?P<n>\d+(?:\.\d+)?)\s*个?\s*(?:小时|钟头|hours?|hrs?)"),
            RelativeForm::Count(RelativeUnit::Hour),
        ),
        (
            regex(r"\ban\s+hour\b"),
            RelativeForm::Fixed(1.0, RelativeUnit::Hour),
        ),
        (
            regex(r"(?P<n>\d+)\s*(?:天|days?)"),
            RelativeForm::Count(RelativeUnit::Day),
        ),
        (
            regex(r"后天|\bday\s+after\s+tomorrow\b"),
            RelativeForm::Fixed(2.0, RelativeUnit::Day),
        ),
        (
            regex(r"明天|\btomorrow\b"),
            RelativeForm::Fixed(1.0, RelativeUnit::Day),
        ),
    ]
});

/// Everything time-like, removed before the task is extracted.
static TIME_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?x)
          (?:上午|早上|早晨|凌晨|清晨|中午|下午|傍晚|晚上|今晚|今天|明天|后天)
        | \d+(?:\.\d+)?\s*个?\s*(?:分钟|小时|钟头|天)(?:以后|之后|后)?
        | 半\s*个?\s*(?:小时|钟头)(?:以后|之后|后)?
        | \d{1,2}\s*:\s*\d{2}(?:\s*[ap]\.?m\b\.?)?
        | \d{1,2}\s*点\s*(?:半|\d{1,2}\s*分?|钟)?
        | \b(?:in|after)\s+(?:\d+(?:\.\d+)?|an?|half\s+an?)\s+(?:minutes?|mins?|hours?|hrs?|days?)\b
        | \d+(?:\.\d+)?\s+(?:minutes?|mins?|hours?|hrs?|days?)\b
        | \b(?:at\s+)?half\s+past\s+\d{1,2}\b
        | \bat\s+\d{1,2}(?:\s*:\s*\d{2})?(?:\s*o'?clock)?(?:\s*[ap]\.?m\b\.?)?
        | \d{1,2}\s*(?:o'?clock|[ap]\.?m\b\.?)
        | \b(?:day\s+after\s+tomorrow|tomorrow|today|tonight|from\s+now)\b
        | \b(?:(?:this|in\s+the)\s+)?(?:morning|noon|afternoon|evening)\b
        ",
    )
});

/// Common tasks recognized when stopword stripping leaves too little.
static ACTION_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"吃药|服药|用药",
        r"看医生|去医院|体检|检查",
        r"买菜|购物",
        r"做饭|煮饭|烧饭",
        r"锻炼|运动|散步",
        r"喝水|补水",
        r"休息|睡觉",
        r"洗澡|洗头",
        r"打电话|联系",
        r"\btake\s+(?:my\s+|the\s+)?(?:medicine|medication|pills)\b",
        r"\b(?:see\s+the\s+doctor|doctor's\s+appointment|go\s+to\s+the\s+hospital)\b",
        r"\b(?:buy\s+groceries|grocery\s+shopping|go\s+shopping)\b",
        r"\b(?:cook\s+dinner|cook\s+lunch|make\s+dinner)\b",
        r"\b(?:drink\s+water)\b",
        r"\b(?:go\s+for\s+a\s+walk|exercise)\b",
        r"\b(?:call\s+\w+)\b",
    ]
    .iter()
    .map(|p| regex(p))
    .collect()
});

#[derive(Debug, Clone, Copy)]
enum RelativeForm {
    /// The number in group `n`, in the given unit.
    Count(RelativeUnit),
    /// A fixed amount ("half an hour", "tomorrow").
    Fixed(f64, RelativeUnit),
}

/// Morning/afternoon qualifier attached to an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HalfDay {
    Am,
    Noon,
    Pm,
}

impl HalfDay {
    /// Convert a spoken hour to 24-hour form.
    fn to_24h(self, hour: u32) -> u32 {
        match self {
            Self::Am if hour == 12 => 0,
            Self::Am => hour,
            Self::Noon if (1..=5).contains(&hour) => hour + 12,
            Self::Noon => hour,
            Self::Pm if hour < 12 => hour + 12,
            Self::Pm => hour,
        }
    }
}

/// A half-day marker found in the text, and the hour it means on its own (if it names a period).
#[derive(Debug, Clone, Copy)]
struct Marker {
    half: HalfDay,
    period_hour: Option<u32>,
}

/// Deterministic keyword/regex reminder parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackParser;

impl FallbackParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `text` into a reminder intent, or classify it as [`Intent::Other`].
    pub fn parse(&self, text: &str) -> Intent {
        let normalized = normalize(text);

        if !is_reminder_request(&normalized) {
            return Intent::Other {
                message: text.to_string(),
            };
        }

        let day = detect_day(&normalized);
        let time = match_clock_time(&normalized, day)
            .or_else(|| match_relative(&normalized))
            .unwrap_or(TimeDescriptor::relative(DEFAULT_LEAD_MINUTES, RelativeUnit::Minute));

        Intent::SetReminder(ReminderIntent {
            task: extract_task(&normalized),
            time,
            confidence: FALLBACK_CONFIDENCE,
            source: IntentSource::Fallback,
        })
    }
}

/// Lowercase ASCII, unify colons, and turn spelled-out numbers before time units into digits.
fn normalize(text: &str) -> String {
    let lowered = text.trim().to_ascii_lowercase().replace('：', ":");

    let cjk = CJK_NUMERAL.replace_all(&lowered, |caps: &Captures| {
        match cjk_number(&caps["num"]) {
            Some(n) => format!("{n}{}", &caps["unit"]),
            None => caps[0].to_string(),
        }
    });
    let en = EN_NUMERAL.replace_all(&cjk, |caps: &Captures| {
        match english_number(&caps["num"]) {
            Some(n) => format!("{n}{}", &caps["unit"]),
            None => caps[0].to_string(),
        }
    });
    EN_AT_NUMERAL
        .replace_all(&en, |caps: &Captures| match english_number(&caps["num"]) {
            Some(n) => format!("{} {n}", &caps["at"]),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Value of a Chinese numeral up to 99 (一, 十二, 二十五, 两).
fn cjk_number(s: &str) -> Option<u32> {
    fn digit(c: char) -> Option<u32> {
        Some(match c {
            '零' => 0,
            '一' => 1,
            '二' | '两' => 2,
            '三' => 3,
            '四' => 4,
            '五' => 5,
            '六' => 6,
            '七' => 7,
            '八' => 8,
            '九' => 9,
            _ => return None,
        })
    }

    let chars: Vec<char> = s.chars().collect();
    match chars.iter().position(|&c| c == '十') {
        None if chars.len() == 1 => digit(chars[0]),
        None => None,
        Some(pos) => {
            let tens = match &chars[..pos] {
                [] => 1,
                [d] => digit(*d)?,
                _ => return None,
            };
            let ones = match &chars[pos + 1..] {
                [] => 0,
                [d] => digit(*d)?,
                _ => return None,
            };
            Some(tens * 10 + ones)
        }
    }
}

fn english_number(s: &str) -> Option<u32> {
    Some(match s {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "forty-five" => 45,
        "fifty" => 50,
        _ => return None,
    })
}

fn is_reminder_request(text: &str) -> bool {
    REMINDER_KEYWORDS.iter().any(|k| text.contains(k))
        || (TIMED_REMINDER_KEYWORDS.iter().any(|k| text.contains(k)) && TIME_SPAN.is_match(text))
}

fn detect_day(text: &str) -> DayOffset {
    if text.contains("后天") || text.contains("day after tomorrow") {
        DayOffset::DayAfterTomorrow
    } else if text.contains("明天") || text.contains("tomorrow") {
        DayOffset::Tomorrow
    } else {
        DayOffset::Today
    }
}

/// Earliest half-day marker in the text.
fn find_marker(text: &str) -> Option<Marker> {
    const CJK_MARKERS: &[(&str, HalfDay, Option<u32>)] = &[
        ("上午", HalfDay::Am, Some(9)),
        ("早上", HalfDay::Am, Some(8)),
        ("早晨", HalfDay::Am, Some(8)),
        ("清晨", HalfDay::Am, Some(8)),
        ("凌晨", HalfDay::Am, None),
        ("中午", HalfDay::Noon, Some(12)),
        ("下午", HalfDay::Pm, Some(15)),
        ("傍晚", HalfDay::Pm, Some(18)),
        ("晚上", HalfDay::Pm, Some(19)),
        ("今晚", HalfDay::Pm, Some(19)),
    ];

    let cjk = CJK_MARKERS
        .iter()
        .filter_map(|&(word, half, period_hour)| {
            text.find(word).map(|pos| (pos, Marker { half, period_hour }))
        })
        .min_by_key(|(pos, _)| *pos);

    let en = EN_MARKER.captures(text).and_then(|caps| {
        let pos = caps.get(0)?.start();
        let marker = if let Some(ampm) = caps.name("ampm") {
            let half = if ampm.as_str() == "a" { HalfDay::Am } else { HalfDay::Pm };
            Marker { half, period_hour: None }
        } else {
            match caps.name("word")?.as_str() {
                "morning" => Marker { half: HalfDay::Am, period_hour: Some(8) },
                "noon" => Marker { half: HalfDay::Noon, period_hour: Some(12) },
                "afternoon" => Marker { half: HalfDay::Pm, period_hour: Some(15) },
                _ => Marker { half: HalfDay::Pm, period_hour: Some(19) },
            }
        };
        Some((pos, marker))
    });

    match (cjk, en) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a.1 } else { b.1 }),
        (a, b) => a.or(b).map(|(_, m)| m),
    }
}

fn group_u32(caps: &Captures, names: &[&str]) -> Option<u32> {
    names
        .iter()
        .find_map(|n| caps.name(n))
        .and_then(|m| m.as_str().parse().ok())
}

/// Out-of-range hours read as 12; out-of-range minutes read as 0.
fn clamp_clock(hour: u32, minute: u32) -> (u32, u32) {
    let hour = if hour <= 23 { hour } else { 12 };
    let minute = if minute <= 59 { minute } else { 0 };
    (hour, minute)
}

/// First `H:MM`-like form, trying each form in priority order.
fn find_minute_form(text: &str) -> Option<(u32, u32)> {
    MINUTE_FORMS.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let hour = group_u32(&caps, &["hour", "hour2"])?;
        let minute = if caps.name("half").is_some() || caps.name("half2").is_some() {
            30
        } else {
            group_u32(&caps, &["minute"])?
        };
        Some(clamp_clock(hour, minute))
    })
}

/// First hour-only form that is not actually a duration ("at 5 minutes past").
fn find_hour_form(text: &str) -> Option<u32> {
    HOUR_FORM.captures_iter(text).find_map(|caps| {
        let end = caps.get(0)?.end();
        if DURATION_SUFFIX.is_match(&text[end..]) {
            return None;
        }
        let hour = group_u32(&caps, &["hour", "hour2", "hour3"])?;
        Some(clamp_clock(hour, 0).0)
    })
}

/// Absolute clock patterns.
///
/// Without a half-day marker: `H:MM`, `H点M分`, `H点半`, bare hour. With a marker: the same
/// forms converted to 24-hour time, then a named period on its own.
fn match_clock_time(text: &str, day: DayOffset) -> Option<TimeDescriptor> {
    match find_marker(text) {
        None => {
            let bare = |hour: u32| (1..=12).contains(&hour);
            if let Some((hour, minute)) = find_minute_form(text) {
                return Some(TimeDescriptor::at(day, hour, minute, bare(hour)));
            }
            find_hour_form(text).map(|hour| TimeDescriptor::at(day, hour, 0, bare(hour)))
        }
        Some(marker) => {
            if let Some((hour, minute)) = find_minute_form(text) {
                return Some(TimeDescriptor::at(day, marker.half.to_24h(hour), minute, false));
            }
            if let Some(hour) = find_hour_form(text) {
                return Some(TimeDescriptor::at(day, marker.half.to_24h(hour), 0, false));
            }
            marker
                .period_hour
                .map(|hour| TimeDescriptor::at(day, hour, 0, false))
        }
    }
}

fn match_relative(text: &str) -> Option<TimeDescriptor> {
    RELATIVE_FORMS.iter().find_map(|(re, form)| {
        let caps = re.captures(text)?;
        match *form {
            RelativeForm::Count(unit) => {
                let amount: f64 = caps.name("n")?.as_str().parse().ok()?;
                Some(TimeDescriptor::relative(amount, unit))
            }
            RelativeForm::Fixed(amount, unit) => Some(TimeDescriptor::relative(amount, unit)),
        }
    })
}

fn has_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation() && c != '\'' || "，。！？、；：,".contains(c)
}

/// Strip time vocabulary and reminder phrasing; fall back to action phrases, then a placeholder.
fn extract_task(text: &str) -> String {
    let mut rest = TIME_SPAN.replace_all(text, " ").into_owned();
    for word in CJK_STOPWORDS {
        rest = rest.replace(word, "");
    }

    let words: Vec<&str> = rest
        .split(is_separator)
        .filter(|w| !w.is_empty())
        .collect();
    let start = words
        .iter()
        .position(|w| !LEADING_STOPWORDS.contains(w))
        .unwrap_or(words.len());
    let end = words[start..]
        .iter()
        .rposition(|w| !TRAILING_STOPWORDS.contains(w))
        .map(|i| start + i + 1)
        .unwrap_or(start);
    let task = words[start..end].join(" ");

    if task.chars().count() >= MIN_TASK_CHARS {
        return task;
    }

    ACTION_PHRASES
        .iter()
        .find_map(|re| re.find(text).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| {
            if has_cjk(text) {
                PLACEHOLDER_TASK_CJK.to_string()
            } else {
                PLACEHOLDER_TASK.to_string()
            }
        })
}
