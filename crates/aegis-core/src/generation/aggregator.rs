use async_stream::stream;
use futures_util::{Stream, StreamExt};

use super::FragmentStream;
use crate::errors::AegisError;

/// Prefix of every failure rendered into the text channel.
pub const ERROR_MARKER: &str = "Error:";

/// Everything a fragment stream produced, drained to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Concatenation of the fragments received before the stream ended.
    pub text: String,
    pub fragments: usize,
    pub failure: Option<AegisError>,
}

impl Transcript {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<String, AegisError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.text),
        }
    }
}

/// Consumes the stream and joins its fragments, keeping the valid prefix
/// when it ends in a failure.
pub async fn drain(mut stream: FragmentStream) -> Transcript {
    let mut transcript = Transcript::default();
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                transcript.text.push_str(&fragment);
                transcript.fragments += 1;
            }
            Err(err) => {
                transcript.failure = Some(err);
                break;
            }
        }
    }
    transcript
}

/// Text rendering of a failure for display in the conversation.
pub fn render_failure(err: &AegisError) -> String {
    format!("{} {}", ERROR_MARKER, err)
}

/// Maps failures into marked text so a display always has something to show.
///
/// A failure that follows partial text starts on a new line.
pub fn render_failures(mut stream: FragmentStream) -> impl Stream<Item = String> + Send {
    stream! {
        let mut at_line_start = true;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    if !fragment.is_empty() {
                        at_line_start = fragment.ends_with('\n');
                    }
                    yield fragment;
                }
                Err(err) => {
                    log::error!("Generation failed: {}", err);
                    let rendered = render_failure(&err);
                    if at_line_start {
                        yield rendered;
                    } else {
                        yield format!("\n{}", rendered);
                    }
                }
            }
        }
    }
}
