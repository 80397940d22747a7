use std::{collections::VecDeque, sync::Arc};

use anyhow::{bail, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub enum ContentPart {
    Text(String),
    Image(Arc<RgbImage>),
}

/// Single-turn request for a language-and-vision model.
#[derive(Clone, Debug)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn with_image(mut self, image: Arc<RgbImage>) -> Self {
        self.content.insert(0, ContentPart::Image(image));
        self
    }

    /// All text parts, newline separated.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::Image(_)))
    }
}

/// One message in, one text out. No state is kept between calls.
pub trait LanguageModel {
    fn generate(&mut self, message: &Message) -> Result<String>;
}

impl<L: LanguageModel + ?Sized> LanguageModel for &mut L {
    fn generate(&mut self, message: &Message) -> Result<String> {
        (**self).generate(message)
    }
}

impl<L: LanguageModel + ?Sized> LanguageModel for Box<L> {
    fn generate(&mut self, message: &Message) -> Result<String> {
        (**self).generate(message)
    }
}

/// Replays canned responses in order and keeps every request it received.
#[derive(Clone, Debug, Default)]
pub struct ScriptedLanguageModel {
    responses: VecDeque<String>,
    requests: Vec<Message>,
}

impl ScriptedLanguageModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            requests: vec![],
        }
    }

    pub fn requests(&self) -> &[Message] {
        &self.requests
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl LanguageModel for ScriptedLanguageModel {
    fn generate(&mut self, message: &Message) -> Result<String> {
        self.requests.push(message.clone());
        match self.responses.pop_front() {
            Some(response) => Ok(response),
            None => bail!(
                "no scripted response left for request {}",
                self.requests.len()
            ),
        }
    }
}
