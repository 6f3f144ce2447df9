//! Async channel reading example.
//!
//! Streams several readers concurrently, one `DispatchData` region per read.
//!
//! Run with:
//!     cargo run --example async_channel --features async-io

use dispatchbuf::{ChannelConfig, DispatchData, read_async};
use futures_util::TryStreamExt;
use tokio_util::compat::TokioAsyncReadCompatExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sources: Vec<Vec<u8>> = vec![
        (0..50_000).map(|i| (i % 256) as u8).collect(),
        (0..120_000).map(|i| (i % 199) as u8).collect(),
        Vec::new(),
    ];

    println!("Reading {} sources concurrently...\n", sources.len());

    let config = ChannelConfig::default().with_read_size(32 * 1024);

    let handles: Vec<_> = sources
        .into_iter()
        .enumerate()
        .map(|(source_id, bytes)| {
            tokio::spawn(async move {
                let reader = std::io::Cursor::new(bytes).compat();
                let parts: Vec<DispatchData> = read_async(reader, config)?.try_collect().await?;
                let data: DispatchData = parts.into_iter().collect();
                Ok::<_, dispatchbuf::DispatchError>((source_id, data))
            })
        })
        .collect();

    for handle in handles {
        let (source_id, data) = handle.await??;
        println!(
            "Source {}: {} bytes in {} regions",
            source_id,
            data.len(),
            data.region_count()
        );
    }

    Ok(())
}
