#![no_main]

use client::{ClientConfig, ClientConnection, InboundMessage, NullHost};
use libfuzzer_sys::fuzz_target;

// Splits the input into messages on each 0xff byte and feeds them through one
// connection, so later messages see state built by earlier ones.
fuzz_target!(|data: &[u8]| {
    let Ok(mut connection) = ClientConnection::new(ClientConfig::for_testing()) else {
        return;
    };
    connection.reconnect();
    let mut host = NullHost;

    for (sequence, chunk) in data.split(|&byte| byte == 0xff).enumerate() {
        let message = InboundMessage {
            sequence: sequence as i32 + 1,
            data: chunk,
            realtime: sequence as i32 * 50,
        };
        if connection.parse_server_message(&mut host, &message).is_err() {
            connection.reconnect();
        }
        let _ = connection.current_entities().count();
    }
});
