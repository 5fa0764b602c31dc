use anyhow::Result;
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use aegis_core::generation::{render_failure, render_failures};
use aegis_core::{GenerationRequest, Generator};

/// Sends the request and writes the answer as it arrives.
///
/// Failures are written in place of (or after) the answer with the error
/// marker, and the returned text is exactly what was displayed.
pub async fn write_response<W>(
    out: &mut W,
    generator: &dyn Generator,
    request: &GenerationRequest,
) -> Result<String>
where
    W: AsyncWrite + Unpin,
{
    let mut displayed = String::new();

    if request.stream {
        let mut rendered = Box::pin(render_failures(generator.stream(request).await));
        while let Some(text) = rendered.next().await {
            out.write_all(text.as_bytes()).await?;
            out.flush().await?;
            displayed.push_str(&text);
        }
    } else {
        displayed = match generator.generate(request).await {
            Ok(answer) => answer,
            Err(err) => {
                log::error!("Generation failed: {}", err);
                render_failure(&err)
            }
        };
        out.write_all(displayed.as_bytes()).await?;
    }

    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(displayed)
}
