#![no_main]

use bitstream::BitReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let bits = (data[idx - 1] / 7) % 65;
                let _ = reader.read_bits(bits);
            }
            2 => {
                let _ = reader.read_signed_bits((data[idx - 1] / 7) % 33);
            }
            3 => {
                let _ = reader.read_i32();
            }
            4 => {
                let _ = reader.read_f32();
            }
            5 => {
                let _ = reader.read_string(usize::from(data[idx - 1]));
            }
            _ => {
                let _ = reader.skip_bytes(usize::from(data[idx - 1] / 7));
            }
        }
    }
});
