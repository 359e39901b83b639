use chrono::NaiveDate;

/// True iff `token` is a real calendar date written exactly as `MM/DD/YYYY`.
///
/// Month and day must be zero-padded, the year exactly four digits, and
/// nothing may surround the date. Never fails: anything else is `false`.
pub fn is_date(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'/' || bytes[5] != b'/' {
        return false;
    }
    let (Some(month), Some(day), Some(year)) = (
        digits(&bytes[0..2]),
        digits(&bytes[3..5]),
        digits(&bytes[6..10]),
    ) else {
        return false;
    };
    // Year 0000 is outside the accepted calendar.
    year >= 1 && NaiveDate::from_ymd_opt(year as i32, month, day).is_some()
}

fn digits(field: &[u8]) -> Option<u32> {
    field.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}
