use bitstream::{BitError, BitReader, BitWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Read {
    Bit,
    Bits(u8),
    U8,
    I16,
    I32,
    F32,
    Str(usize),
    Skip(usize),
}

fn read_strategy() -> impl Strategy<Value = Read> {
    prop_oneof![
        Just(Read::Bit),
        (0u8..=64).prop_map(Read::Bits),
        Just(Read::U8),
        Just(Read::I16),
        Just(Read::I32),
        Just(Read::F32),
        (0usize..32).prop_map(Read::Str),
        (0usize..16).prop_map(Read::Skip),
    ]
}

fn apply(reader: &mut BitReader<'_>, read: &Read) -> Result<(), BitError> {
    match read {
        Read::Bit => reader.read_bit().map(drop),
        Read::Bits(bits) => reader.read_bits(*bits).map(drop),
        Read::U8 => reader.read_u8().map(drop),
        Read::I16 => reader.read_i16().map(drop),
        Read::I32 => reader.read_i32().map(drop),
        Read::F32 => reader.read_f32().map(drop),
        Read::Str(max) => reader.read_string(*max).map(drop),
        Read::Skip(len) => reader.skip_bytes(*len),
    }
}

proptest! {
    #[test]
    fn arbitrary_reads_never_overrun(
        data in prop::collection::vec(any::<u8>(), 0..64),
        reads in prop::collection::vec(read_strategy(), 1..48),
    ) {
        let mut reader = BitReader::new(&data);
        for read in &reads {
            let before = reader.bit_position();
            if apply(&mut reader, read).is_err() {
                // Only string reads may consume bits before failing.
                if !matches!(read, Read::Str(_)) {
                    prop_assert_eq!(reader.bit_position(), before);
                }
            }
            prop_assert!(reader.bit_position() <= data.len() * 8);
        }
    }

    #[test]
    fn truncated_message_always_errors(
        values in prop::collection::vec(any::<i32>(), 1..16),
        cut in 1usize..4,
    ) {
        let mut writer = BitWriter::new();
        for value in &values {
            writer.write_i32(*value);
        }
        let bytes = writer.finish();
        let truncated = &bytes[..bytes.len() - cut];

        let mut reader = BitReader::new(truncated);
        let mut decoded = Vec::new();
        let mut failed = false;
        for _ in &values {
            match reader.read_i32() {
                Ok(value) => decoded.push(value),
                Err(err) => {
                    prop_assert!(matches!(err, BitError::UnexpectedEof { .. }), "unexpected error kind");
                    failed = true;
                    break;
                }
            }
        }
        prop_assert!(failed);
        prop_assert_eq!(&decoded[..], &values[..decoded.len()]);
    }
}

#[test]
fn strings_and_bytes_share_one_cursor() {
    let mut writer = BitWriter::new();
    writer.write_bits(0b11, 2).unwrap();
    writer.write_string("cs 3 \"x\"").unwrap();
    writer.write_bytes(&[0xAA, 0x55]);
    writer.write_i16(-1);
    let bytes = writer.finish();

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_bits(2).unwrap(), 0b11);
    assert_eq!(reader.read_string(64).unwrap(), "cs 3 \"x\"");
    assert_eq!(reader.read_bytes(2).unwrap(), vec![0xAA, 0x55]);
    assert_eq!(reader.read_i16().unwrap(), -1);
    assert_eq!(reader.bits_remaining(), 6);
}
