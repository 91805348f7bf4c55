//! Text-generation transport abstraction.
//!
//! The [`Transport`] trait decouples the invocation adapter from the actual
//! model backend. Tests use scripted transports that return predetermined
//! replies without touching the network.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::io::config::{TransportConfig, TransportKind};
use crate::io::process::run_with_stdin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// One non-streaming generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Abstraction over model backends.
pub trait Transport {
    /// Generate a reply for `request`. Any failure, including a timeout, is an error.
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request)
    }
}

/// Build the backend named by `config`.
pub fn transport_from_config(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    match config.kind {
        TransportKind::Http => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                anyhow!(
                    "API token not found in environment variable '{}' (set it or add it to .env)",
                    config.api_key_env
                )
            })?;
            Ok(Box::new(HttpTransport::new(config.base_url.clone(), api_key)?))
        }
        TransportKind::Command => Ok(Box::new(CommandTransport::new(
            config.command.clone(),
            config.output_limit_bytes,
        ))),
    }
}

/// OpenAI-compatible chat-completions backend.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(model = %request.model, timeout_secs = request.timeout.as_secs()))]
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(url = %self.base_url, "posting chat completion");
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .context("send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            warn!(status = %status, "chat completion rejected");
            return Err(anyhow!("chat completion returned {status}: {}", text.trim()));
        }

        let parsed: ChatResponse = response.json().context("parse chat completion")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion missing choices[0].message.content"))?;
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Backend that pipes the conversation into a local CLI.
///
/// The argv may contain `{model}`, replaced with the requested model id. The
/// CLI's stdout is the reply.
pub struct CommandTransport {
    argv: Vec<String>,
    output_limit_bytes: usize,
}

impl CommandTransport {
    pub fn new(argv: Vec<String>, output_limit_bytes: usize) -> Self {
        Self {
            argv,
            output_limit_bytes,
        }
    }
}

impl Transport for CommandTransport {
    #[instrument(skip_all, fields(model = %request.model, timeout_secs = request.timeout.as_secs()))]
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| anyhow!("transport command is empty"))?;
        let mut cmd = Command::new(program);
        for arg in args {
            cmd.arg(arg.replace("{model}", &request.model));
        }

        let prompt = render_conversation(&request.messages);
        let output = run_with_stdin(
            cmd,
            prompt.as_bytes(),
            request.timeout,
            self.output_limit_bytes,
        )
        .with_context(|| format!("run {program}"))?;

        if output.timed_out {
            return Err(anyhow!("{program} timed out after {:?}", request.timeout));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "{program} failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail(500)
            ));
        }
        Ok(output.stdout_text())
    }
}

/// Flatten a conversation into a single prompt for CLI backends.
pub fn render_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| match message.role {
            MessageRole::System => format!("<system>\n{}\n</system>", message.content.trim()),
            MessageRole::User => format!("<user>\n{}\n</user>", message.content.trim()),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: &str) -> GenerationRequest {
        GenerationRequest {
            model: model.to_string(),
            messages: vec![Message::system("be brief"), Message::user("say hi")],
            temperature: 0.1,
            max_tokens: 64,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn chat_request_serializes_openai_shape() {
        let req = request("m/1");
        let body = ChatRequest {
            model: &req.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream: false,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["model"], "m/1");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "say hi");
        assert_eq!(value["stream"], false);
        assert_eq!(value["max_tokens"], 64);
    }

    #[test]
    fn chat_response_tolerates_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .expect("parse");
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn conversation_renders_both_roles() {
        let rendered = render_conversation(&request("m").messages);
        assert_eq!(rendered, "<system>\nbe brief\n</system>\n\n<user>\nsay hi\n</user>");
    }

    #[cfg(unix)]
    #[test]
    fn command_transport_substitutes_model_and_reads_stdout() {
        let transport = CommandTransport::new(
            vec!["sh".into(), "-c".into(), "printf '%s' \"$0\"".into(), "{model}".into()],
            1024,
        );
        let reply = transport.generate(&request("tiny/model")).expect("generate");
        assert_eq!(reply, "tiny/model");
    }

    #[cfg(unix)]
    #[test]
    fn command_transport_reports_failure_status() {
        let transport = CommandTransport::new(
            vec!["sh".into(), "-c".into(), "echo nope 1>&2; exit 2".into()],
            1024,
        );
        let err = transport.generate(&request("m")).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
