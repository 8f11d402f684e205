use chrono::{Datelike, NaiveDate};

use crate::models::lenient::parse_date;

/// Whole years between a date of birth and `today`
///
/// Returns `None` when the date of birth cannot be parsed. The birthday
/// counts from the day itself; a 29 February birthday is reached on
/// 1 March in non-leap years.
pub fn calculate_age(date_of_birth: &str, today: NaiveDate) -> Option<i32> {
    let born = parse_date(date_of_birth)?;
    Some(age_on(born, today))
}

/// Calendar age on `today` of someone born on `born`
#[inline]
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_eighteenth_birthday() {
        let today = date(2026, 10, 16);
        assert_eq!(calculate_age("2008-10-16", today), Some(18));
        assert_eq!(calculate_age("2008-10-17", today), Some(17));
    }

    #[test]
    fn test_birthday_earlier_in_year() {
        assert_eq!(calculate_age("2000-01-01", date(2026, 10, 16)), Some(26));
    }

    #[test]
    fn test_leap_day_birthday() {
        assert_eq!(age_on(date(2004, 2, 29), date(2026, 2, 28)), 21);
        assert_eq!(age_on(date(2004, 2, 29), date(2026, 3, 1)), 22);
    }

    #[test]
    fn test_unparseable_dob() {
        assert_eq!(calculate_age("someday", date(2026, 10, 16)), None);
        assert_eq!(calculate_age("", date(2026, 10, 16)), None);
    }
}
