use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::{
    FinishedSession, LogSetRequest, SetLog, StartSessionRequest, StartedSession, WorkoutSession,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// The REST backend a session view persists to.
pub trait SessionBackend {
    fn sessions(&self) -> Result<Vec<WorkoutSession>, ApiError>;
    fn session(&self, session_id: u64) -> Result<WorkoutSession, ApiError>;
    fn session_logs(&self, session_id: u64) -> Result<Vec<SetLog>, ApiError>;
    fn log_set(&self, session_id: u64, request: &LogSetRequest) -> Result<SetLog, ApiError>;
    fn finish_session(&self, session_id: u64) -> Result<FinishedSession, ApiError>;
    fn start_session(&self, workout_id: u64) -> Result<StartedSession, ApiError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.authorize(self.client.get(self.url(path))).send()?;
        decode(response)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: Option<&serde_json::Value>) -> Result<T, ApiError> {
        debug!(path, "POST");
        let mut request = self.authorize(self.client.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(body);
        }
        decode(request.send()?)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    // an empty body decodes as null
    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    Ok(serde_json::from_str(body)?)
}

impl SessionBackend for ApiClient {
    fn sessions(&self) -> Result<Vec<WorkoutSession>, ApiError> {
        let sessions: Option<Vec<WorkoutSession>> = self.get("/workout-sessions")?;
        Ok(sessions.unwrap_or_default())
    }

    fn session(&self, session_id: u64) -> Result<WorkoutSession, ApiError> {
        self.get(&format!("/workout-sessions/{}", session_id))
    }

    fn session_logs(&self, session_id: u64) -> Result<Vec<SetLog>, ApiError> {
        let logs: Option<Vec<SetLog>> = self.get(&format!("/workout-sessions/{}/logs", session_id))?;
        Ok(logs.unwrap_or_default())
    }

    fn log_set(&self, session_id: u64, request: &LogSetRequest) -> Result<SetLog, ApiError> {
        let body = serde_json::to_value(request)?;
        self.post(&format!("/workout-sessions/{}/logs", session_id), Some(&body))
    }

    fn finish_session(&self, session_id: u64) -> Result<FinishedSession, ApiError> {
        let finished: Option<FinishedSession> = self.post(&format!("/workout-sessions/{}/finish", session_id), None)?;
        Ok(finished.unwrap_or_default())
    }

    fn start_session(&self, workout_id: u64) -> Result<StartedSession, ApiError> {
        let body = serde_json::to_value(StartSessionRequest { workout_id })?;
        self.post("/workout-sessions", Some(&body))
    }
}


#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use clap::Parser;

    use super::*;

    /// Answers one request with `status` and `body`, returning the raw request.
    fn serve_once(status: &str, body: &str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (url, handle)
    }

    fn client(url: &str, token: Option<&str>) -> ApiClient {
        let mut args = vec!["gainz".to_string(), "--api-url".to_string(), url.to_string()];
        if let Some(token) = token {
            args.push("--token".to_string());
            args.push(token.to_string());
        }
        ApiClient::new(&Config::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn fetches_session_with_bearer_token() {
        let body = r#"{"session_id": 9, "started_at": "2025-01-12T09:30:00Z",
                       "workout_snapshot": {"Name": "Pull", "Exercises": []}}"#;
        let (url, handle) = serve_once("200 OK", body);

        let session = client(&url, Some("secret")).session(9).unwrap();
        assert_eq!(session.session_id, 9);

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /workout-sessions/9 "));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[test]
    fn lists_sessions() {
        let body = r#"[
            {"session_id": 2, "started_at": "2025-01-10T08:00:00Z", "completed_at": "2025-01-10T09:00:00Z",
             "workout_snapshot": {"Name": "Legs", "Exercises": [
                {"ExerciseID": 1, "Exercise": {"ID": 1, "Name": "Squat"}, "Sets": 3, "Reps": 5}]}},
            {"session_id": 3, "started_at": "2025-01-12T09:30:00Z"}
        ]"#;
        let (url, handle) = serve_once("200 OK", body);

        let sessions = client(&url, Some("secret")).sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].is_completed());
        assert_eq!(sessions[1].session_id, 3);
        assert!(sessions[1].workout_snapshot.is_none());

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /workout-sessions "));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[test]
    fn null_session_list_is_empty() {
        let (url, handle) = serve_once("200 OK", "null");
        assert!(client(&url, None).sessions().unwrap().is_empty());
        handle.join().unwrap();
    }

    #[test]
    fn error_status_is_returned() {
        let (url, handle) = serve_once("404 Not Found", r#"{"error":"no such session"}"#);

        let err = client(&url, None).session_logs(3).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, ref body } if body.contains("no such session")));

        let request = handle.join().unwrap();
        assert!(!request.to_lowercase().contains("authorization"));
    }

    #[test]
    fn finish_accepts_empty_body() {
        let (url, handle) = serve_once("200 OK", "");

        let finished = client(&url, None).finish_session(4).unwrap();
        assert_eq!(finished, FinishedSession::default());
        assert!(handle.join().unwrap().starts_with("POST /workout-sessions/4/finish "));
    }

    #[test]
    fn null_logs_are_empty() {
        let (url, handle) = serve_once("200 OK", "null");
        assert!(client(&url, None).session_logs(4).unwrap().is_empty());
        handle.join().unwrap();
    }
}
