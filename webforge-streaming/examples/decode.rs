//! Decode a canned generation transcript, printing deltas as they arrive.
//!
//! Run with `RUST_LOG=webforge_streaming=trace` to watch frame handling.

use bytes::Bytes;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;
use webforge_streaming::DeltaStream;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Chunk boundaries deliberately fall mid-line and mid-JSON.
    let transcript: Vec<&[u8]> = vec![
        b"data: {\"choices\":[{\"delta\":{\"content\":\"<header>\"}}]}\n\ndata: {\"choi",
        b"ces\":[{\"delta\":{\"content\":\"<h1>Acme Bakery</h1>\"}}]}\n\n: keep-alive\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"</header>\"}}]}\n\ndata: [DONE]\n\n",
    ];

    let body = futures::stream::iter(
        transcript
            .into_iter()
            .map(|chunk| Ok::<_, std::io::Error>(Bytes::copy_from_slice(chunk))),
    );

    let mut deltas = DeltaStream::new(body);
    while let Some(delta) = deltas.next().await {
        match delta {
            Ok(fragment) => println!("delta: {fragment:?}"),
            Err(err) => eprintln!("stream failed: {err}"),
        }
    }

    if let Some(result) = deltas.take_result() {
        println!("status: {:?}", result.status());
        println!("site:   {}", result.text());
    }
}
