//! Pure calendar math for the picker.
//!
//! Day values are normalized to local midnight, so day-level comparisons are
//! plain structural equality and never touch raw timestamps. Everything here
//! is referentially transparent; the only host-backed pieces are `today`, the
//! generic parse fallback and the locale name lookups, which go through the
//! browser on wasm and fall back to English tables elsewhere.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

/// A month grid always has 6 weeks of 7 cells, regardless of month length.
pub const GRID_CELLS: usize = 42;

const MONTHS_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const WEEKDAYS_ABBREV: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A date normalized to local midnight.
///
/// Equality of two `CalendarDay` values is the "same day" relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay {
    pub year: i32,
    /// Zero-based month, `0` = January.
    pub month: u32,
    /// One-based day of month.
    pub day: u32,
}

impl CalendarDay {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    pub fn year_month(self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    /// The host `Date` at local midnight of this day.
    pub fn to_js(self) -> js_sys::Date {
        js_sys::Date::new_with_year_month_day(self.year as u32, self.month as i32, self.day as i32)
    }
}

/// The month a picker is currently navigated to, independent of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// Zero-based month, `0` = January.
    pub month: u32,
}

impl YearMonth {
    pub fn of(day: CalendarDay) -> Self {
        day.year_month()
    }

    /// Shifts the cursor by `months` calendar months. Pure index arithmetic,
    /// no day-of-month involved, so it cannot overflow into a another month.
    pub fn shifted(self, months: i32) -> Self {
        let total = self.year * 12 + self.month as i32 + months;
        Self {
            year: total.div_euclid(12),
            month: total.rem_euclid(12) as u32,
        }
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Number of days in the given zero-based month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        0 | 2 | 4 | 6 | 7 | 9 | 11 => 31,
        3 | 5 | 8 | 10 => 30,
        1 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Weekday of the first day of the given zero-based month, `0` = Sunday.
pub fn first_weekday_of_month(year: i32, month: u32) -> u32 {
    weekday_of(CalendarDay::new(year, month, 1))
}

/// Sakamoto's method, `0` = Sunday.
fn weekday_of(day: CalendarDay) -> u32 {
    const T: [i32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let m = day.month as i32 + 1;
    let y = if m < 3 { day.year - 1 } else { day.year };
    let raw = y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)
        + T[(m - 1) as usize]
        + day.day as i32;
    raw.rem_euclid(7) as u32
}

/// Lays out a month as a fixed 42-cell grid: `first_weekday_of_month` leading
/// empty cells, one cell per day of the month, then empty padding. A caller
/// can always render 6 rows of 7 without per-month branching.
pub fn build_month_grid(year: i32, month: u32) -> Vec<Option<CalendarDay>> {
    let mut cells = Vec::with_capacity(GRID_CELLS);
    for _ in 0..first_weekday_of_month(year, month) {
        cells.push(None);
    }
    for day in 1..=days_in_month(year, month) {
        cells.push(Some(CalendarDay::new(year, month, day)));
    }
    while cells.len() < GRID_CELLS {
        cells.push(None);
    }
    cells
}

/// True iff both days are present and are the same day.
pub fn same_day(a: Option<CalendarDay>, b: Option<CalendarDay>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Strips the time-of-day from a host `Date` in the local timezone.
/// Returns `None` for an invalid `Date`.
pub fn normalize_to_local_midnight(date: &js_sys::Date) -> Option<CalendarDay> {
    if date.get_time().is_nan() {
        return None;
    }
    Some(CalendarDay {
        year: date.get_full_year() as i32,
        month: date.get_month(),
        day: date.get_date(),
    })
}

/// Parses a date string as a local calendar day.
///
/// A strict `YYYY-MM-DD` literal is interpreted as local midnight directly,
/// sidestepping the host parser's UTC reading of date-only ISO strings (which
/// shifts the day in negative-offset timezones). Anything else is handed to
/// the host parser and normalized; strings the host cannot parse, and
/// out-of-range literals like `2025-02-30`, yield `None`.
pub fn parse_iso_local(text: &str) -> Option<CalendarDay> {
    if let Some(day) = parse_strict_iso(text) {
        return Some(day);
    }
    parse_with_host(text)
}

fn parse_strict_iso(text: &str) -> Option<CalendarDay> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &text[range];
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    let year = digits(0..4)? as i32;
    let month = digits(5..7)?;
    let day = digits(8..10)?;
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month - 1) {
        return None;
    }
    Some(CalendarDay::new(year, month - 1, day))
}

#[cfg(target_arch = "wasm32")]
fn parse_with_host(text: &str) -> Option<CalendarDay> {
    normalize_to_local_midnight(&js_sys::Date::new(&JsValue::from_str(text)))
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_with_host(_text: &str) -> Option<CalendarDay> {
    None
}

/// Formats a day as zero-padded `YYYY-MM-DD`.
///
/// Round-trip law: `parse_iso_local(&to_iso_date(day)) == Some(day)`.
pub fn to_iso_date(day: CalendarDay) -> String {
    format!("{:04}-{:02}-{:02}", day.year, day.month + 1, day.day)
}

/// Shifts a day by `months` calendar months with the host engine's overflow
/// rule: the day-of-month is kept and excess days spill into the following
/// month, so Jan 31 + 1 month is Mar 3. Not corrected on purpose.
pub fn add_months(day: CalendarDay, months: i32) -> CalendarDay {
    let cursor = day.year_month().shifted(months);
    let mut year = cursor.year;
    let mut month = cursor.month;
    let mut day_of_month = day.day;
    while day_of_month > days_in_month(year, month) {
        day_of_month -= days_in_month(year, month);
        let next = YearMonth { year, month }.shifted(1);
        year = next.year;
        month = next.month;
    }
    CalendarDay::new(year, month, day_of_month)
}

/// Today at local midnight.
pub fn today() -> CalendarDay {
    #[cfg(target_arch = "wasm32")]
    {
        normalize_to_local_midnight(&js_sys::Date::new_0())
            .unwrap_or(CalendarDay::new(1970, 0, 1))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        date_from_unix_days(secs.div_euclid(86_400))
    }
}

/// Civil-from-days conversion for the off-wasm `today` fallback.
#[cfg(not(target_arch = "wasm32"))]
fn date_from_unix_days(days: i64) -> CalendarDay {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    CalendarDay::new(year as i32, (month - 1) as u32, day as u32)
}

/// Substitutes date tokens in `pattern`: `yyyy`, `MMM` (locale-aware
/// abbreviated month name), `MM`, `dd`, and a lone `d` (unpadded day, only
/// when not directly preceded by another `d`). Everything else passes through
/// verbatim. This is deliberately a minimal templating mechanism — repeated
/// occurrences work, but locale-specific names beyond the abbreviated month
/// are out of scope.
pub fn format_display(day: CalendarDay, pattern: &str, locale: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut index = 0;
    let mut previous = '\0';
    while index < chars.len() {
        let rest = &chars[index..];
        if rest.starts_with(&['y', 'y', 'y', 'y']) {
            out.push_str(&format!("{:04}", day.year));
            previous = 'y';
            index += 4;
        } else if rest.starts_with(&['M', 'M', 'M']) {
            out.push_str(&month_abbrev(locale, day.year, day.month));
            previous = 'M';
            index += 3;
        } else if rest.starts_with(&['M', 'M']) {
            out.push_str(&format!("{:02}", day.month + 1));
            previous = 'M';
            index += 2;
        } else if rest.starts_with(&['d', 'd']) {
            out.push_str(&format!("{:02}", day.day));
            previous = 'd';
            index += 2;
        } else if chars[index] == 'd' && previous != 'd' {
            out.push_str(&day.day.to_string());
            previous = 'd';
            index += 1;
        } else {
            previous = chars[index];
            out.push(chars[index]);
            index += 1;
        }
    }
    out
}

/// Locale-aware abbreviated month name, e.g. `"Mar"`.
pub fn month_abbrev(locale: &str, year: i32, month: u32) -> String {
    #[cfg(target_arch = "wasm32")]
    if let Some(name) = intl_format(locale, &[("month", "short")], year, month) {
        return name;
    }
    let _ = (locale, year);
    MONTHS_ABBREV[month as usize % 12].to_string()
}

/// Locale-aware month navigation label, e.g. `"March 2025"`.
pub fn month_label(locale: &str, view: YearMonth) -> String {
    #[cfg(target_arch = "wasm32")]
    if let Some(label) = intl_format(
        locale,
        &[("month", "long"), ("year", "numeric")],
        view.year,
        view.month,
    ) {
        return label;
    }
    let _ = locale;
    format!("{} {}", MONTHS_LONG[view.month as usize % 12], view.year)
}

/// Short weekday names in grid order, starting with Sunday.
pub fn weekday_abbrevs(locale: &str) -> Vec<String> {
    #[cfg(target_arch = "wasm32")]
    {
        // 2020-06-07 is a Sunday; format a known week to honor the locale.
        let names: Vec<String> = (0..7)
            .filter_map(|offset| {
                let date = js_sys::Date::new_with_year_month_day(2020, 5, 7 + offset);
                intl_format_date(locale, &[("weekday", "short")], &date)
            })
            .collect();
        if names.len() == 7 {
            return names;
        }
    }
    let _ = locale;
    WEEKDAYS_ABBREV.iter().map(|name| name.to_string()).collect()
}

#[cfg(target_arch = "wasm32")]
fn intl_format(locale: &str, options: &[(&str, &str)], year: i32, month: u32) -> Option<String> {
    let date = js_sys::Date::new_with_year_month_day(year as u32, month as i32, 1);
    intl_format_date(locale, options, &date)
}

#[cfg(target_arch = "wasm32")]
fn intl_format_date(
    locale: &str,
    options: &[(&str, &str)],
    date: &js_sys::Date,
) -> Option<String> {
    let option_bag = js_sys::Object::new();
    for (key, value) in options {
        js_sys::Reflect::set(
            &option_bag,
            &JsValue::from_str(key),
            &JsValue::from_str(value),
        )
        .ok()?;
    }
    let locales = js_sys::Array::of1(&JsValue::from_str(locale));
    let formatter = js_sys::Intl::DateTimeFormat::new(&locales, &option_bag);
    let format = formatter.format();
    format.call1(&formatter, date.as_ref()).ok()?.as_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_always_42_cells_with_matching_offset_and_day_count() {
        for year in 2019..=2030 {
            for month in 0..12 {
                let grid = build_month_grid(year, month);
                assert_eq!(grid.len(), GRID_CELLS, "length for {year}-{month}");
                let first_day_index = grid
                    .iter()
                    .position(Option::is_some)
                    .expect("month has at least one day");
                assert_eq!(
                    first_day_index as u32,
                    first_weekday_of_month(year, month),
                    "leading offset for {year}-{month}"
                );
                let day_count = grid.iter().filter(|cell| cell.is_some()).count() as u32;
                assert_eq!(
                    day_count,
                    days_in_month(year, month),
                    "day count for {year}-{month}"
                );
                // Days are contiguous and in order.
                for (offset, cell) in grid[first_day_index..first_day_index + day_count as usize]
                    .iter()
                    .enumerate()
                {
                    assert_eq!(*cell, Some(CalendarDay::new(year, month, offset as u32 + 1)));
                }
            }
        }
    }

    #[test]
    fn known_weekdays() {
        // 2025-03-01 is a Saturday, 2024-02-01 a Thursday, 2000-01-01 a Saturday.
        assert_eq!(first_weekday_of_month(2025, 2), 6);
        assert_eq!(first_weekday_of_month(2024, 1), 4);
        assert_eq!(first_weekday_of_month(2000, 0), 6);
        // June 2025 starts on a Sunday.
        assert_eq!(first_weekday_of_month(2025, 5), 0);
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 1), 28);
    }

    #[test]
    fn iso_round_trip() {
        let days = [
            CalendarDay::new(2025, 0, 15),
            CalendarDay::new(2024, 1, 29),
            CalendarDay::new(1999, 11, 31),
            CalendarDay::new(2025, 8, 7),
        ];
        for day in days {
            assert_eq!(parse_iso_local(&to_iso_date(day)), Some(day));
        }
    }

    #[test]
    fn strict_iso_parsing() {
        assert_eq!(
            parse_iso_local("2025-01-15"),
            Some(CalendarDay::new(2025, 0, 15))
        );
        assert_eq!(
            parse_iso_local("2024-02-29"),
            Some(CalendarDay::new(2024, 1, 29))
        );
        // Off-wasm there is no host parser to fall back to.
        assert_eq!(parse_iso_local("2023-02-29"), None);
        assert_eq!(parse_iso_local("2025-13-01"), None);
        assert_eq!(parse_iso_local("2025-2-07"), None);
        assert_eq!(parse_iso_local("2025-02-00"), None);
        assert_eq!(parse_iso_local(""), None);
        assert_eq!(parse_iso_local("not a date"), None);
    }

    #[test]
    fn add_months_spills_overflow_forward() {
        let jan31 = CalendarDay::new(2025, 0, 31);
        assert_eq!(add_months(jan31, 1), CalendarDay::new(2025, 2, 3));
        assert_eq!(
            add_months(CalendarDay::new(2024, 11, 31), 2),
            CalendarDay::new(2025, 2, 3)
        );
        assert_eq!(
            add_months(CalendarDay::new(2025, 0, 15), 1),
            CalendarDay::new(2025, 1, 15)
        );
        assert_eq!(
            add_months(CalendarDay::new(2025, 0, 15), -13),
            CalendarDay::new(2023, 11, 15)
        );
        assert_eq!(
            add_months(CalendarDay::new(2025, 11, 31), 1),
            CalendarDay::new(2026, 0, 31)
        );
    }

    #[test]
    fn year_month_shift_wraps_years() {
        assert_eq!(
            YearMonth { year: 2025, month: 0 }.shifted(-1),
            YearMonth { year: 2024, month: 11 }
        );
        assert_eq!(
            YearMonth { year: 2025, month: 11 }.shifted(1),
            YearMonth { year: 2026, month: 0 }
        );
        assert_eq!(
            YearMonth { year: 2025, month: 5 }.shifted(-30),
            YearMonth { year: 2022, month: 11 }
        );
    }

    #[test]
    fn display_formatting() {
        let day = CalendarDay::new(2025, 2, 7);
        assert_eq!(format_display(day, "yyyy-MM-dd", "en-US"), "2025-03-07");
        assert_eq!(format_display(day, "MMM d, yyyy", "en-US"), "Mar 7, 2025");
        assert_eq!(format_display(day, "dd/MM/yyyy", "en-US"), "07/03/2025");
        assert_eq!(format_display(day, "d", "en-US"), "7");
        // A `d` directly after `dd` is not a token.
        assert_eq!(format_display(day, "ddd", "en-US"), "07d");
        // Unrecognized tokens pass through verbatim.
        assert_eq!(format_display(day, "Qq yyyy", "en-US"), "Qq 2025");
        assert_eq!(format_display(day, "", "en-US"), "");
    }

    #[test]
    fn same_day_requires_both_sides() {
        let day = CalendarDay::new(2025, 2, 7);
        assert!(same_day(Some(day), Some(day)));
        assert!(!same_day(Some(day), Some(CalendarDay::new(2025, 2, 8))));
        assert!(!same_day(Some(day), None));
        assert!(!same_day(None, None));
    }
}
