//! Fixed-layout binary object records
//!
//! Every object occupies [`RECORD_LEN`] consecutive `f64` slots:
//!
//! ```text
//! radius, scale, inv_mass, restitution,
//! orientation(4), position(3), lin_velocity(3), ang_velocity(3),
//! shape_params(4)
//! ```

use crate::body::ObjectRecord;
use crate::error::{PhysicsError, Result};

/// Slots per object record
pub const RECORD_LEN: usize = 21;

/// Buffer length needed for `count` records
pub fn required_len(count: usize) -> usize {
    count * RECORD_LEN
}

fn check_len(buf_len: usize, count: usize) -> Result<()> {
    let required = required_len(count);
    if buf_len < required {
        return Err(PhysicsError::BufferTooShort {
            required,
            actual: buf_len,
        });
    }
    Ok(())
}

fn take<const N: usize>(slots: &[f64], at: usize) -> [f64; N] {
    let mut out = [0.0; N];
    out.copy_from_slice(&slots[at..at + N]);
    out
}

fn write_record(record: &ObjectRecord, slots: &mut [f64]) {
    slots[0] = record.radius;
    slots[1] = record.scale;
    slots[2] = record.inv_mass;
    slots[3] = record.restitution;
    slots[4..8].copy_from_slice(&record.orientation);
    slots[8..11].copy_from_slice(&record.position);
    slots[11..14].copy_from_slice(&record.linear_velocity);
    slots[14..17].copy_from_slice(&record.angular_velocity);
    slots[17..21].copy_from_slice(&record.shape_params);
}

fn read_record(slots: &[f64]) -> ObjectRecord {
    ObjectRecord {
        radius: slots[0],
        scale: slots[1],
        inv_mass: slots[2],
        restitution: slots[3],
        orientation: take(slots, 4),
        position: take(slots, 8),
        linear_velocity: take(slots, 11),
        angular_velocity: take(slots, 14),
        shape_params: take(slots, 17),
    }
}

/// Write `records` into the front of `buf`.
///
/// Fails without touching `buf` if it holds fewer than
/// `RECORD_LEN * records.len()` slots.
pub fn encode_records(records: &[ObjectRecord], buf: &mut [f64]) -> Result<()> {
    check_len(buf.len(), records.len())?;
    for (record, slots) in records.iter().zip(buf.chunks_exact_mut(RECORD_LEN)) {
        write_record(record, slots);
    }
    Ok(())
}

/// Read `count` records from the front of `buf`
pub fn decode_records(buf: &[f64], count: usize) -> Result<Vec<ObjectRecord>> {
    check_len(buf.len(), count)?;
    Ok(buf.chunks_exact(RECORD_LEN).take(count).map(read_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seed: f64) -> ObjectRecord {
        ObjectRecord {
            radius: seed,
            scale: seed + 0.5,
            inv_mass: 0.25,
            restitution: 0.9,
            orientation: [0.1, 0.2, 0.3, 0.9],
            position: [seed, -seed, 2.0 * seed],
            linear_velocity: [1.0, 2.0, 3.0],
            angular_velocity: [-1.0, -2.0, -3.0],
            shape_params: [4.0, 1.0, 2.0, 3.0],
        }
    }

    #[test]
    fn test_layout() {
        let mut buf = [0.0; RECORD_LEN];
        encode_records(&[sample(1.0)], &mut buf).unwrap();
        assert_eq!(buf[0], 1.0);
        assert_eq!(buf[1], 1.5);
        assert_eq!(buf[2], 0.25);
        assert_eq!(buf[3], 0.9);
        assert_eq!(&buf[4..8], &[0.1, 0.2, 0.3, 0.9]);
        assert_eq!(&buf[8..11], &[1.0, -1.0, 2.0]);
        assert_eq!(&buf[17..21], &[4.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_round_trip_batch() {
        let records = vec![sample(1.0), sample(2.0), ObjectRecord::default()];
        let mut buf = vec![0.0; required_len(records.len())];
        encode_records(&records, &mut buf).unwrap();
        assert_eq!(decode_records(&buf, records.len()).unwrap(), records);
    }

    #[test]
    fn test_short_buffer_writes_nothing() {
        let records = [sample(1.0), sample(2.0)];
        let mut buf = vec![-7.0; required_len(2) - 1];
        let err = encode_records(&records, &mut buf).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(buf.iter().all(|v| *v == -7.0));
    }

    #[test]
    fn test_short_buffer_decode() {
        let buf = vec![0.0; RECORD_LEN];
        assert!(matches!(
            decode_records(&buf, 2),
            Err(PhysicsError::BufferTooShort { required: 42, actual: 21 })
        ));
    }

    #[test]
    fn test_longer_buffer_is_fine() {
        let mut buf = vec![0.0; RECORD_LEN + 5];
        encode_records(&[sample(3.0)], &mut buf).unwrap();
        assert_eq!(decode_records(&buf, 1).unwrap(), vec![sample(3.0)]);
        assert!(decode_records(&buf, 0).unwrap().is_empty());
    }
}
