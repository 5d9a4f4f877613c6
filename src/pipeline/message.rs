use crate::error::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Transport,
    Schema,
    Decode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineMessage {
    pub kind: MessageKind,
    pub title: String,
    pub description: String,
    pub cycle: u64,
}

impl PipelineMessage {
    pub fn from_error(error: &PipelineError, cycle: u64) -> Self {
        let (kind, title, description) = match error {
            PipelineError::Transport(_) => (
                MessageKind::Transport,
                "Network error".to_owned(),
                "Communication with the metrics server could not be established.".to_owned(),
            ),
            PipelineError::Schema(schema) => (
                MessageKind::Schema,
                "Malformed API data".to_owned(),
                schema.to_string(),
            ),
            PipelineError::Decode(decode) => (
                MessageKind::Decode,
                "Malformed API data".to_owned(),
                decode.to_string(),
            ),
        };

        Self {
            kind,
            title,
            description,
            cycle,
        }
    }
}
