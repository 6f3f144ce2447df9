#![no_main]

use std::io::Cursor;

use dispatchbuf::{ChannelConfig, IoChannel, PipeSource};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<u8>, u16, Vec<u16>)| {
    let (bytes, read_size, lengths) = input;

    let config = ChannelConfig::default().with_read_size(read_size as usize % 4096 + 1);
    let mut channel = IoChannel::with_config(Cursor::new(bytes.clone()), config)
        .expect("read size is in range");

    let mut out = Vec::new();
    for length in lengths {
        match channel.read(length as usize) {
            Ok(data) => {
                assert!(data.len() <= length as usize);
                out.extend_from_slice(&data.to_vec());
            }
            Err(_) => return,
        }
    }

    let rest = channel.read_until_end().expect("cursor reads never fail");
    out.extend_from_slice(&rest.to_vec());
    assert_eq!(out, bytes);
});
