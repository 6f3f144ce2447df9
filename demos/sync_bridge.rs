//! Buffer bridge and channel reading example.
//!
//! Run with:
//!     cargo run --example sync_bridge

use std::io::Cursor;

use bytes::Bytes;
use dispatchbuf::{ChannelConfig, IoChannel, PipeSource, create_dispatch_data};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Wrap an existing buffer without copying it
    let source = Bytes::from(b"hello, dispatch data".to_vec());
    let data = create_dispatch_data(source.clone());

    println!(
        "Wrapped {} bytes, shares storage: {}",
        data.len(),
        data.to_contiguous().as_ptr() == source.as_ptr()
    );

    // Compose without copying bytes
    let framed =
        create_dispatch_data(&b"["[..]) + data.slice(7..) + create_dispatch_data(&b"]"[..]);
    println!(
        "Framed: {:?} ({} regions)",
        String::from_utf8_lossy(&framed.to_vec()),
        framed.region_count()
    );

    #[cfg(feature = "object-bridge")]
    {
        let back = dispatchbuf::bridge_dispatch_data(&data);
        println!("Bridged back, same memory: {}", back.as_ptr() == source.as_ptr());
    }

    // Read a source into regions, 16 KiB at a time
    let input: Vec<u8> = (0..100_000).map(|i| (i % 251) as u8).collect();
    let config = ChannelConfig::default().with_read_size(16 * 1024);
    let mut channel = IoChannel::with_config(Cursor::new(input), config)?;

    let header = channel.read_exact(1024)?;
    let body = channel.read_until_end()?;
    channel.close();

    println!(
        "\nHeader: {} bytes in {} regions",
        header.len(),
        header.region_count()
    );
    println!("Body:   {} bytes in {} regions", body.len(), body.region_count());
    for (i, region) in body.regions().enumerate() {
        println!("  region {}: {} bytes", i + 1, region.len());
    }

    Ok(())
}
