//! Model invocation adapter: one conversation, bounded retries.

use std::thread;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::core::error::OrchestraError;
use crate::io::config::{ModelChoice, OrgloopConfig};
use crate::io::transport::{GenerationRequest, Message, Transport};

/// Retry policy for a single logical invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed wait between a failed attempt and the next one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
        }
    }
}

/// Sampling settings shared by every call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 4096,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Wraps a [`Transport`] with the retry policy and sampling settings.
///
/// The invoker never touches persisted state; its only side effects are the
/// transport call, logging and sleeping between attempts.
pub struct ModelInvoker<T> {
    transport: T,
    policy: RetryPolicy,
    settings: GenerationSettings,
}

impl<T: Transport> ModelInvoker<T> {
    pub fn new(transport: T, policy: RetryPolicy, settings: GenerationSettings) -> Self {
        Self {
            transport,
            policy,
            settings,
        }
    }

    pub fn from_config(transport: T, config: &OrgloopConfig) -> Self {
        Self::new(
            transport,
            RetryPolicy {
                max_attempts: config.max_attempts,
                backoff: config.backoff(),
            },
            GenerationSettings {
                temperature: config.generation.temperature,
                max_tokens: config.generation.max_tokens,
                timeout: Duration::from_secs(config.generation.timeout_secs),
            },
        )
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the two-message conversation against `model`.
    ///
    /// Returns the trimmed reply, or [`OrchestraError::Transport`] once every
    /// attempt has failed. Empty replies count as failed attempts.
    #[instrument(skip_all, fields(model = %model.id, max_attempts = self.policy.max_attempts))]
    pub fn invoke(
        &self,
        role_prompt: &str,
        task_prompt: &str,
        model: &ModelChoice,
    ) -> Result<String, OrchestraError> {
        let request = GenerationRequest {
            model: model.id.clone(),
            messages: vec![Message::system(role_prompt), Message::user(task_prompt)],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            timeout: model.timeout_override().unwrap_or(self.settings.timeout),
        };

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            info!(attempt, "model is thinking");
            match self.transport.generate(&request) {
                Ok(reply) if !reply.trim().is_empty() => {
                    info!(attempt, "model response received");
                    return Ok(reply.trim().to_string());
                }
                Ok(_) => {
                    last_error = "empty reply".to_string();
                }
                Err(err) => {
                    last_error = format!("{err:#}");
                }
            }
            warn!(attempt, max_attempts, error = %last_error, "model call failed");
            if attempt < max_attempts && !self.policy.backoff.is_zero() {
                thread::sleep(self.policy.backoff);
            }
        }

        Err(OrchestraError::Transport {
            model: model.id.clone(),
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedReply, ScriptedTransport};

    fn invoker(replies: Vec<ScriptedReply>) -> ModelInvoker<ScriptedTransport> {
        ModelInvoker::new(
            ScriptedTransport::new(replies),
            RetryPolicy {
                max_attempts: 3,
                backoff: Duration::ZERO,
            },
            GenerationSettings::default(),
        )
    }

    #[test]
    fn builds_two_message_conversation() {
        let invoker = invoker(vec![ScriptedReply::ok("  reply \n")]);
        let model = ModelChoice::new("m/1");
        let reply = invoker.invoke("role", "task", &model).expect("invoke");
        assert_eq!(reply, "reply");

        let requests = invoker.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![Message::system("role"), Message::user("task")]
        );
        assert_eq!(requests[0].model, "m/1");
        assert!((requests[0].temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(requests[0].max_tokens, 4096);
    }

    #[test]
    fn retries_then_succeeds() {
        let invoker = invoker(vec![
            ScriptedReply::err("timeout"),
            ScriptedReply::ok(""),
            ScriptedReply::ok("third time"),
        ]);
        let reply = invoker
            .invoke("r", "t", &ModelChoice::new("m"))
            .expect("invoke");
        assert_eq!(reply, "third time");
        assert_eq!(invoker.transport().calls(), 3);
    }

    #[test]
    fn exhausted_attempts_yield_transport_failure() {
        let invoker = invoker(vec![
            ScriptedReply::err("one"),
            ScriptedReply::err("two"),
            ScriptedReply::err("three"),
            ScriptedReply::ok("never reached"),
        ]);
        let err = invoker
            .invoke("r", "t", &ModelChoice::new("m"))
            .unwrap_err();
        assert_eq!(
            err,
            OrchestraError::Transport {
                model: "m".to_string(),
                attempts: 3,
                last_error: "three".to_string(),
            }
        );
        assert_eq!(invoker.transport().calls(), 3);
    }

    #[test]
    fn model_timeout_override_wins() {
        let invoker = invoker(vec![ScriptedReply::ok("ok")]);
        let model = ModelChoice::new("slow/model").with_timeout(900);
        invoker.invoke("r", "t", &model).expect("invoke");
        assert_eq!(
            invoker.transport().requests()[0].timeout,
            Duration::from_secs(900)
        );
    }
}
