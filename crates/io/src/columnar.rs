// Canonical schedule in a compact columnar binary form for audit/replay.
//
// Layout (all little-endian):
//   magic "SSCB" | version u32 | row_count u32
//   dates      row_count × i32 (days from CE)
//   balance    row_count × i64   repayment row_count × i64
//   agency     row_count × i64   recipient row_count × i64
//   total_fee  row_count × i64
//   flags      row_count × u8 (bit 0 = is_total)
//
// The format is frozen: changes require a version bump and a decode path
// for the old layout.

use chrono::{Datelike, NaiveDate};
use subrecon_core::{Schedule, ScheduleRow};

use crate::error::IoError;

/// Columnar schedule format version. Increment when the layout changes in a
/// way old readers can't handle.
pub const SCHEDULE_FORMAT_VERSION: u32 = 1;

const MAGIC: &[u8; 4] = b"SSCB";

pub fn encode_schedule(schedule: &Schedule) -> Vec<u8> {
    let rows = schedule.rows();
    let mut out = Vec::with_capacity(12 + rows.len() * (4 + 5 * 8 + 1));

    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&SCHEDULE_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());

    for row in rows {
        out.extend_from_slice(&row.debt_repayment_date.num_days_from_ce().to_le_bytes());
    }
    for accessor in MONEY_COLUMNS {
        for row in rows {
            out.extend_from_slice(&accessor(row).to_le_bytes());
        }
    }
    for row in rows {
        out.push(u8::from(row.is_total));
    }
    out
}

type MoneyAccessor = fn(&ScheduleRow) -> i64;

const MONEY_COLUMNS: [MoneyAccessor; 5] = [
    |r| r.principal_debt_balance,
    |r| r.principal_debt_repayment_amount,
    |r| r.agency_fee_amount,
    |r| r.recipient_fee_amount,
    |r| r.total_accrued_fee_amount,
];

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], IoError> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(IoError::Decode(format!(
                "truncated at byte {} (need {n} more)",
                self.pos
            )));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, IoError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i32(&mut self) -> Result<i32, IoError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64, IoError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
}

pub fn decode_schedule(bytes: &[u8]) -> Result<Schedule, IoError> {
    let mut cursor = Cursor { bytes, pos: 0 };

    if cursor.take(4)? != MAGIC {
        return Err(IoError::Decode("bad magic".into()));
    }
    let version = cursor.u32()?;
    if version != SCHEDULE_FORMAT_VERSION {
        return Err(IoError::Decode(format!(
            "unsupported format version {version} (expected {SCHEDULE_FORMAT_VERSION})"
        )));
    }
    let count = cursor.u32()? as usize;

    let mut dates = Vec::with_capacity(count);
    for _ in 0..count {
        let days = cursor.i32()?;
        let date = NaiveDate::from_num_days_from_ce_opt(days)
            .ok_or_else(|| IoError::Decode(format!("invalid date ordinal {days}")))?;
        dates.push(date);
    }

    let mut columns: [Vec<i64>; 5] = Default::default();
    for column in &mut columns {
        column.reserve(count);
        for _ in 0..count {
            column.push(cursor.i64()?);
        }
    }

    let mut rows = Vec::with_capacity(count);
    for i in 0..count {
        let flags = cursor.take(1)?[0];
        rows.push(ScheduleRow {
            debt_repayment_date: dates[i],
            principal_debt_balance: columns[0][i],
            principal_debt_repayment_amount: columns[1][i],
            agency_fee_amount: columns[2][i],
            recipient_fee_amount: columns[3][i],
            total_accrued_fee_amount: columns[4][i],
            is_total: flags & 1 == 1,
        });
    }

    Schedule::new(rows).map_err(|e| IoError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(d: &str, balance: i64, total: bool) -> ScheduleRow {
        ScheduleRow {
            debt_repayment_date: NaiveDate::parse_from_str(d, "%d.%m.%Y").unwrap(),
            principal_debt_balance: balance,
            principal_debt_repayment_amount: balance / 10,
            agency_fee_amount: 12_345,
            recipient_fee_amount: -7,
            total_accrued_fee_amount: 12_338,
            is_total: total,
        }
    }

    #[test]
    fn round_trip_preserves_rows_exactly() {
        let schedule = Schedule::new(vec![
            row("15.01.2023", 10_000_000, false),
            row("15.02.2023", 9_000_000, false),
            row("15.02.2023", 0, true),
        ])
        .unwrap();

        let bytes = encode_schedule(&schedule);
        let decoded = decode_schedule(&bytes).unwrap();
        assert_eq!(decoded, schedule);
    }

    #[test]
    fn truncated_buffer_is_a_decode_error() {
        let schedule = Schedule::new(vec![
            row("15.01.2023", 100, false),
            row("15.02.2023", 0, true),
        ])
        .unwrap();
        let bytes = encode_schedule(&schedule);
        assert!(decode_schedule(&bytes[..bytes.len() - 3]).is_err());
        assert!(decode_schedule(b"XXXX").is_err());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let schedule = Schedule::new(vec![
            row("15.01.2023", 100, false),
            row("15.02.2023", 0, true),
        ])
        .unwrap();
        let mut bytes = encode_schedule(&schedule);
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        match decode_schedule(&bytes) {
            Err(IoError::Decode(msg)) => assert!(msg.contains("version 99")),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }
}
