use std::io::{self, BufReader};
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use musli::json;
use musli::{Decode, Encode};
use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::config::Config;
use crate::error::CommaitError;

use super::LlmClient;
use super::prompt_builder::Prompt;
use super::stream::read_stream_to_string;

/// Per-probe limit while waiting for the server to come up.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const READY_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, Encode)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Decode)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Decode)]
struct GenerateChunk {
    response: Option<String>,
    done: Option<bool>,
}

// Older servers read `name`, newer ones `model`.
#[derive(Debug, Encode)]
struct ShowRequest {
    model: String,
    name: String,
}

/// Synchronous Ollama client using /api/generate.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    stream: bool,
    ready_timeout: Duration,
    request_timeout: Duration,
}

impl OllamaClient {
    pub fn new(cfg: &Config) -> Result<Self, CommaitError> {
        let http = Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| CommaitError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.host.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            stream: cfg.stream,
            ready_timeout: cfg.ready_timeout,
            request_timeout: cfg.request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn unavailable(&self, reason: impl Into<String>) -> CommaitError {
        CommaitError::ModelUnavailable {
            host: self.base_url.clone(),
            reason: reason.into(),
        }
    }

    fn request_error(&self, err: reqwest::Error) -> CommaitError {
        if err.is_timeout() {
            CommaitError::ModelTimeout {
                model: self.model.clone(),
                secs: self.request_timeout.as_secs(),
            }
        } else if err.is_connect() {
            self.unavailable("connection refused, start it with `ollama serve`")
        } else {
            self.unavailable(err.to_string())
        }
    }

    fn not_installed(&self) -> CommaitError {
        self.unavailable(format!(
            "model `{m}` is not installed, run `ollama pull {m}`",
            m = self.model
        ))
    }

    fn server_responds(&self) -> bool {
        self.http
            .get(self.url("/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    fn model_available(&self) -> Result<bool, CommaitError> {
        let body = json::to_string(&ShowRequest {
            model: self.model.clone(),
            name: self.model.clone(),
        })
        .map_err(|e| CommaitError::Protocol(format!("failed to encode show request: {e}")))?;

        let resp = self
            .http
            .post(self.url("/api/show"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(PROBE_TIMEOUT)
            .body(body)
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(CommaitError::Protocol(format!(
                "HTTP {} from /api/show",
                status.as_u16()
            )))
        }
    }

    fn send_generate(&self, body: String) -> Result<String, CommaitError> {
        let url = self.url("/api/generate");

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(self.not_installed());
        }
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(CommaitError::Protocol(format!(
                "HTTP {} from {url}: {}",
                status.as_u16(),
                text.trim()
            )));
        }

        if self.stream {
            let reader = BufReader::new(resp);
            return read_stream_to_string(reader, &mut io::stderr(), parse_stream_line).map_err(
                |e| match e {
                    CommaitError::Io(io) if io.kind() == io::ErrorKind::TimedOut => {
                        CommaitError::ModelTimeout {
                            model: self.model.clone(),
                            secs: self.request_timeout.as_secs(),
                        }
                    }
                    other => other,
                },
            );
        }

        let text = resp.text().map_err(|e| self.request_error(e))?;
        log::trace!("Ollama raw JSON response: {text}");
        parse_response(&text)
    }
}

impl LlmClient for OllamaClient {
    fn describe(&self) -> String {
        format!("ollama {} @ {}", self.model, self.base_url)
    }

    fn wait_until_ready(&self) -> Result<(), CommaitError> {
        let started = Instant::now();
        let mut announced = false;

        while !self.server_responds() {
            if started.elapsed() >= self.ready_timeout {
                return Err(self.unavailable(format!(
                    "no answer after {}s, start it with `ollama serve`",
                    self.ready_timeout.as_secs()
                )));
            }
            if !announced {
                log::warn!(
                    "Waiting up to {}s for Ollama at {}",
                    self.ready_timeout.as_secs(),
                    self.base_url
                );
                announced = true;
            }
            thread::sleep(READY_POLL);
        }

        if !self.model_available()? {
            return Err(self.not_installed());
        }

        log::debug!("Ollama is ready with model {}", self.model);
        Ok(())
    }

    fn generate(&self, prompt: &Prompt) -> Result<String, CommaitError> {
        let body = json::to_string(&GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.text.clone(),
            stream: self.stream,
        })
        .map_err(|e| CommaitError::Protocol(format!("failed to encode generate request: {e}")))?;

        log::trace!("Ollama request body: {body}");

        let spinner = (!self.stream).then(|| spinner(&self.model));
        let outcome = self.send_generate(body);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        outcome
    }
}

fn spinner(model: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("Asking {model} for a commit message"));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn parse_response(text: &str) -> Result<String, CommaitError> {
    let parsed: GenerateResponse = json::from_str(text)
        .map_err(|e| CommaitError::Protocol(format!("failed to decode Ollama JSON: {e}")))?;
    Ok(parsed.response)
}

fn parse_stream_line(line: &str) -> Result<Option<String>, CommaitError> {
    let parsed: GenerateChunk = json::from_str(line)
        .map_err(|e| CommaitError::Protocol(format!("failed to decode Ollama stream JSON: {e}")))?;

    if parsed.done.unwrap_or(false) {
        return Ok(None);
    }

    Ok(parsed.response.filter(|chunk| !chunk.is_empty()))
}
