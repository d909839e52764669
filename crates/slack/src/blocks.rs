use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Context { block_id: String, elements: Vec<TextObject> },
}

/// Who sees a slash-command reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    Ephemeral,
    InChannel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub response_type: ResponseType,
    #[serde(rename = "text")]
    pub fallback_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    response_type: ResponseType,
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::default(),
            fallback_text: fallback_text.into(),
            blocks: Vec::new(),
        }
    }

    pub fn in_channel(mut self) -> Self {
        self.response_type = ResponseType::InChannel;
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate {
            response_type: self.response_type,
            fallback_text: self.fallback_text,
            blocks: self.blocks,
        }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub fn echo_message(sender: &str, text: &str) -> MessageTemplate {
    let shown = if text.trim().is_empty() { "(empty command)" } else { text };
    MessageBuilder::new(format!("You said: {shown}"))
        .section("echo.body.v1", |section| {
            section.mrkdwn(format!("*You said:* {shown}"));
        })
        .context("echo.sender.v1", |context| {
            context.plain(format!("requested by {sender}"));
        })
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{echo_message, MessageBuilder};

    #[test]
    fn builder_serializes_to_slack_message_shape() {
        let message = MessageBuilder::new("deploy started")
            .in_channel()
            .section("deploy.header.v1", |section| {
                section.mrkdwn("*Deploy* started");
            })
            .context("deploy.meta.v1", |context| {
                context.plain("by U1").mrkdwn("`api`");
            })
            .build();

        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(
            value,
            json!({
                "response_type": "in_channel",
                "text": "deploy started",
                "blocks": [
                    {
                        "type": "section",
                        "block_id": "deploy.header.v1",
                        "text": { "type": "mrkdwn", "text": "*Deploy* started" }
                    },
                    {
                        "type": "context",
                        "block_id": "deploy.meta.v1",
                        "elements": [
                            { "type": "plain_text", "text": "by U1" },
                            { "type": "mrkdwn", "text": "`api`" }
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn text_only_message_omits_blocks() {
        let value = serde_json::to_value(MessageBuilder::new("hi").build()).expect("serialize");
        assert_eq!(value, json!({ "response_type": "ephemeral", "text": "hi" }));
    }

    #[test]
    fn echo_message_names_sender() {
        let message = echo_message("U42", "status");
        assert_eq!(message.fallback_text, "You said: status");
        assert_eq!(message.blocks.len(), 2);
    }
}
