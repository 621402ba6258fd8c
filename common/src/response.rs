//! API response wrapper types.
//!
//! Provides the uniform response envelope for the listing endpoints and the
//! timing wrapper that fills in its message.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppResult;

/// Standard listing response.
///
/// `data` keeps the order in which the database returned the rows.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    /// Elapsed time of the query and mapping step, e.g. `"0.0123 seconds"`.
    pub message: Option<String>,

    /// Mapped records.
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    /// Creates an envelope whose message reports `elapsed`.
    pub fn with_elapsed(data: Vec<T>, elapsed: Duration) -> Self {
        Self {
            message: Some(format_elapsed(elapsed)),
            data,
        }
    }
}

/// Error body returned with every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Error kind (e.g. "DATABASE_ERROR", "EMPTY_RESULT").
    pub code: String,

    /// Generic, caller-safe message.
    pub message: String,
}

/// Value produced by an operation together with its wall-clock duration.
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Formats a duration as seconds with four decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.4} seconds", elapsed.as_secs_f64())
}

/// Awaits `operation` and records how long it took.
///
/// Only the operation itself is measured; anything the caller does before
/// or after is excluded.
pub async fn measure<F, T>(operation: F) -> AppResult<Timed<T>>
where
    F: Future<Output = AppResult<T>>,
{
    let start = Instant::now();
    let value = operation.await?;
    Ok(Timed {
        value,
        elapsed: start.elapsed(),
    })
}

/// Runs a listing operation and wraps its records in an [`Envelope`].
///
/// Errors from the operation are returned unchanged.
pub async fn timed<F, T>(operation: F) -> AppResult<Envelope<T>>
where
    F: Future<Output = AppResult<Vec<T>>>,
{
    let Timed { value, elapsed } = measure(operation).await?;
    Ok(Envelope::with_elapsed(value, elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn parse_seconds(message: &str) -> f64 {
        message
            .strip_suffix(" seconds")
            .expect("message ends with seconds")
            .parse()
            .expect("numeric seconds")
    }

    #[test]
    fn test_format_elapsed_four_decimals() {
        assert_eq!(format_elapsed(Duration::from_millis(1234)), "1.2340 seconds");
        assert_eq!(format_elapsed(Duration::ZERO), "0.0000 seconds");
        assert_eq!(format_elapsed(Duration::from_micros(56)), "0.0001 seconds");
    }

    #[tokio::test]
    async fn test_timed_wraps_records() {
        let envelope = timed(async { Ok(vec!["a", "b"]) }).await.unwrap();

        assert_eq!(envelope.data, vec!["a", "b"]);
        let message = envelope.message.unwrap();
        assert!(parse_seconds(&message) >= 0.0);
    }

    #[tokio::test]
    async fn test_timed_passes_errors_through() {
        let result: AppResult<Envelope<String>> = timed(async { Err(AppError::EmptyResult) }).await;
        assert!(matches!(result, Err(AppError::EmptyResult)));
    }

    #[tokio::test]
    async fn test_timing_covers_only_the_operation() {
        // Delay outside the measured span must not be reported.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let envelope = timed(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(vec![1])
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let seconds = parse_seconds(envelope.message.as_deref().unwrap());
        assert!(seconds >= 0.03, "inner delay missing: {seconds}");
        assert!(seconds < 0.2, "outer delay leaked: {seconds}");
    }

    #[test]
    fn test_envelope_serializes_message_and_data() {
        let envelope = Envelope {
            message: Some("0.0100 seconds".to_string()),
            data: vec!["x"],
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json, serde_json::json!({"message": "0.0100 seconds", "data": ["x"]}));

        let empty: Envelope<String> = Envelope {
            message: None,
            data: vec![],
        };
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json, serde_json::json!({"message": null, "data": []}));
    }
}
