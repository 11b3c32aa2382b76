//! Binary location-record decoder
//!
//! Packet layout (all multi-byte integers big-endian): an unsigned record
//! count at offset 9, records starting at offset 10. Each record carries 8
//! reserved bytes, priority, longitude and latitude scaled by 1e7,
//! altitude, angle, satellite count, speed, an event id, and a
//! variable-length IO section skipped at two bytes per element.

use byteorder::{BigEndian, ByteOrder};
use chrono::Utc;
use fleetlink_common::DecodedFix;

use crate::error::AvlError;

/// Shortest payload treated as a binary record packet.
pub const MIN_PACKET_LEN: usize = 20;

/// Offset of the record-count byte.
const RECORD_COUNT_OFFSET: usize = 9;
/// Offset of the first record.
const FIRST_RECORD_OFFSET: usize = 10;
/// Reserved bytes at the head of each record. The device's own timestamp
/// lives here and is not interpreted; fixes are stamped with wall-clock
/// ingestion time instead.
const RECORD_PREFIX_LEN: usize = 8;
/// Divisor converting raw coordinate integers to degrees.
const COORD_SCALE: f64 = 10_000_000.0;

/// Result of decoding one payload. Fixes decoded before a truncation are
/// kept alongside the error so the caller can forward the partial batch.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub fixes: Vec<DecodedFix>,
    pub error: Option<AvlError>,
}

/// Decode every record in `payload`, in packet order.
///
/// A payload shorter than [`MIN_PACKET_LEN`] yields zero fixes and a
/// truncation error. A record that runs past the end of the payload stops
/// decoding; earlier records are returned alongside the error. A record
/// count of zero is a valid empty packet.
pub fn decode_records(payload: &[u8]) -> DecodeOutcome {
    if payload.len() < MIN_PACKET_LEN {
        return DecodeOutcome {
            fixes: Vec::new(),
            error: Some(AvlError::TruncatedPacket {
                offset: 0,
                need: MIN_PACKET_LEN,
                available: payload.len(),
            }),
        };
    }

    let record_count = payload[RECORD_COUNT_OFFSET] as usize;
    let mut reader = ByteReader::new(payload, FIRST_RECORD_OFFSET);
    let mut fixes = Vec::with_capacity(record_count);

    for _ in 0..record_count {
        match decode_one(&mut reader) {
            Ok(fix) => fixes.push(fix),
            Err(e) => {
                return DecodeOutcome {
                    fixes,
                    error: Some(e),
                }
            }
        }
    }

    DecodeOutcome { fixes, error: None }
}

fn decode_one(reader: &mut ByteReader<'_>) -> Result<DecodedFix, AvlError> {
    reader.skip(RECORD_PREFIX_LEN)?;
    let priority = reader.read_u8()?;
    let raw_lon = reader.read_i32()?;
    let raw_lat = reader.read_i32()?;
    let altitude = reader.read_i16()?;
    let angle = reader.read_u16()?;
    let satellites = reader.read_u8()?;
    let speed = reader.read_u16()?;
    let event_id = reader.read_u8()?;
    let io_count = reader.read_u8()?;
    reader.skip(io_count as usize * 2)?;

    Ok(DecodedFix {
        priority,
        longitude: raw_lon as f64 / COORD_SCALE,
        latitude: raw_lat as f64 / COORD_SCALE,
        altitude,
        angle,
        satellites,
        speed,
        event_id,
        ingested_at: Utc::now(),
    })
}

/// Cursor over a payload slice. Every read is bounds-checked so a
/// truncated packet surfaces as an error instead of a panic.
struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    fn ensure(&self, need: usize) -> Result<(), AvlError> {
        if self.offset + need > self.buf.len() {
            return Err(AvlError::TruncatedPacket {
                offset: self.offset,
                need,
                available: self.buf.len() - self.offset,
            });
        }
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<(), AvlError> {
        self.ensure(count)?;
        self.offset += count;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, AvlError> {
        self.ensure(1)?;
        let v = self.buf[self.offset];
        self.offset += 1;
        Ok(v)
    }

    fn read_u16(&mut self) -> Result<u16, AvlError> {
        self.ensure(2)?;
        let v = BigEndian::read_u16(&self.buf[self.offset..]);
        self.offset += 2;
        Ok(v)
    }

    fn read_i16(&mut self) -> Result<i16, AvlError> {
        self.ensure(2)?;
        let v = BigEndian::read_i16(&self.buf[self.offset..]);
        self.offset += 2;
        Ok(v)
    }

    fn read_i32(&mut self) -> Result<i32, AvlError> {
        self.ensure(4)?;
        let v = BigEndian::read_i32(&self.buf[self.offset..]);
        self.offset += 4;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one record: 8 reserved bytes, fixed fields, then `io_count`
    /// two-byte IO elements.
    fn record(raw_lon: i32, raw_lat: i32, io_count: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0u8; 8]); // reserved prefix
        buf.push(1); // priority
        buf.extend_from_slice(&raw_lon.to_be_bytes());
        buf.extend_from_slice(&raw_lat.to_be_bytes());
        buf.extend_from_slice(&250i16.to_be_bytes()); // altitude
        buf.extend_from_slice(&90u16.to_be_bytes()); // angle
        buf.push(11); // satellites
        buf.extend_from_slice(&60u16.to_be_bytes()); // speed
        buf.push(5); // event id
        buf.push(io_count);
        buf.extend(std::iter::repeat(0xAB).take(io_count as usize * 2));
        buf
    }

    fn packet(records: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = vec![0u8; 9];
        buf.push(records.len() as u8);
        for r in records {
            buf.extend_from_slice(r);
        }
        buf
    }

    #[test]
    fn test_decode_short_payload() {
        let outcome = decode_records(&[0u8; 19]);
        assert!(outcome.fixes.is_empty());
        match outcome.error {
            Some(AvlError::TruncatedPacket { need, available, .. }) => {
                assert_eq!(need, MIN_PACKET_LEN);
                assert_eq!(available, 19);
            }
            other => panic!("Expected TruncatedPacket, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_zero_records() {
        // 20-byte payload declaring zero records is a valid empty packet
        let mut payload = packet(&[]);
        payload.resize(MIN_PACKET_LEN, 0);
        let outcome = decode_records(&payload);
        assert!(outcome.fixes.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_decode_single_record() {
        let payload = packet(&[record(123_456_789, -334_567_890, 0)]);
        let outcome = decode_records(&payload);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.fixes.len(), 1);

        let fix = &outcome.fixes[0];
        assert!((fix.longitude - 12.345_678_9).abs() < 1e-9);
        assert!((fix.latitude + 33.456_789_0).abs() < 1e-9);
        assert_eq!(fix.priority, 1);
        assert_eq!(fix.altitude, 250);
        assert_eq!(fix.angle, 90);
        assert_eq!(fix.satellites, 11);
        assert_eq!(fix.speed, 60);
        assert_eq!(fix.event_id, 5);
    }

    #[test]
    fn test_decode_skips_io_elements() {
        // Three IO elements on the first record must not shift the second
        let payload = packet(&[record(10_000_000, 20_000_000, 3), record(30_000_000, 40_000_000, 0)]);
        let outcome = decode_records(&payload);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.fixes.len(), 2);
        assert!((outcome.fixes[0].longitude - 1.0).abs() < 1e-9);
        assert!((outcome.fixes[1].longitude - 3.0).abs() < 1e-9);
        assert!((outcome.fixes[1].latitude - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_truncated_second_record() {
        // Second record cut off mid-field: first fix survives
        let mut payload = packet(&[record(10_000_000, 20_000_000, 0), record(30_000_000, 40_000_000, 0)]);
        payload.truncate(payload.len() - 10);
        let outcome = decode_records(&payload);
        assert_eq!(outcome.fixes.len(), 1);
        assert!((outcome.fixes[0].longitude - 1.0).abs() < 1e-9);
        assert!(matches!(
            outcome.error,
            Some(AvlError::TruncatedPacket { .. })
        ));
    }

    #[test]
    fn test_decode_truncated_io_block() {
        // IO count promises 4 elements but only 3 bytes remain
        let mut payload = packet(&[record(10_000_000, 20_000_000, 4)]);
        payload.truncate(payload.len() - 5);
        let outcome = decode_records(&payload);
        assert!(outcome.fixes.is_empty());
        match outcome.error {
            Some(AvlError::TruncatedPacket { need, available, .. }) => {
                assert_eq!(need, 8);
                assert_eq!(available, 3);
            }
            other => panic!("Expected TruncatedPacket, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_order_preserved() {
        let payload = packet(&[
            record(10_000_000, 0, 0),
            record(20_000_000, 0, 1),
            record(30_000_000, 0, 0),
        ]);
        let outcome = decode_records(&payload);
        assert!(outcome.error.is_none());
        let lons: Vec<f64> = outcome.fixes.iter().map(|f| f.longitude).collect();
        assert!((lons[0] - 1.0).abs() < 1e-9);
        assert!((lons[1] - 2.0).abs() < 1e-9);
        assert!((lons[2] - 3.0).abs() < 1e-9);
    }
}
