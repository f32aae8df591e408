//! Plain-text speech envelope returned to the voice platform.

use serde::Serialize;

const ENVELOPE_VERSION: &str = "1.0";
const PLAIN_TEXT: &str = "PlainText";

#[derive(Debug, Clone, Serialize)]
pub struct SpeechResponse {
    version: &'static str,
    response: ResponseBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    output_speech: OutputSpeech,
    should_end_session: bool,
}

#[derive(Debug, Clone, Serialize)]
struct OutputSpeech {
    #[serde(rename = "type")]
    speech_type: &'static str,
    text: String,
}

impl SpeechResponse {
    /// Speak `text` and end the session.
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            response: ResponseBody {
                output_speech: OutputSpeech {
                    speech_type: PLAIN_TEXT,
                    text: text.into(),
                },
                should_end_session: true,
            },
        }
    }

    pub fn text(&self) -> &str {
        &self.response.output_speech.text
    }
}
