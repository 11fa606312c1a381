//! 変更ログストア（スプレッドシートWebアプリ）
//!
//! 書き込みは送りっぱなし（レスポンス本文は見ない）。失敗はログに残すだけで
//! 呼び出し側には返さない。読み込みは行オブジェクトのJSON配列を受け取る。

use crate::error::{Result, VisitRosterError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use visit_roster_common::{ChangeRecord, LogRecord, StatusUpdate};

/// ログストアの操作
pub trait LogStore {
    /// 変更申請を追記（失敗してもエラーは返さない）
    fn append(&self, record: &ChangeRecord) -> impl Future<Output = ()> + Send;

    /// ステータスを更新（失敗してもエラーは返さない）
    fn update_status(&self, update: &StatusUpdate) -> impl Future<Output = ()> + Send;

    /// 全レコードを取得
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<LogRecord>>> + Send;
}

/// 再送ポリシー（既定は再送なし）
///
/// n回目の再送の前に `backoff_base_secs * 2^(n-1)` 秒待つ。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_secs: u64) -> Self {
        Self {
            max_retries,
            backoff_base_secs,
        }
    }

    /// 一時的なエラーのみ再送する
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_retriable(&err) || attempt >= self.max_retries => return Err(err),
                Err(err) => {
                    let delay_secs = self.backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
                    tracing::warn!(attempt, delay_secs, error = %err, "ログストアへの送信を再試行します");
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn is_retriable(err: &VisitRosterError) -> bool {
    match err {
        VisitRosterError::Http(_) => true,
        VisitRosterError::UnexpectedStatus(status) => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// HTTPのログストア
///
/// URL未設定の場合、書き込みは警告を出して何もせず、読み込みは空を返す。
#[derive(Debug, Clone)]
pub struct SheetLogStore {
    client: Client,
    url: Option<String>,
    retry: RetryPolicy,
}

impl SheetLogStore {
    pub fn new(url: Option<String>, timeout_secs: u64, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, url, retry })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// JSONを text/plain として POST（Apps Script のプリフライト回避）
    pub async fn post_json<T: Serialize>(&self, body: &T) -> Result<()> {
        let url = self.url.as_deref().ok_or(VisitRosterError::MissingSheetsUrl)?;
        let payload = serde_json::to_string(body)?;

        self.retry
            .run(|| async {
                let response = self
                    .client
                    .post(url)
                    .header(CONTENT_TYPE, "text/plain;charset=utf-8")
                    .body(payload.clone())
                    .send()
                    .await?;
                let status = response.status();
                if status.is_server_error() || status.as_u16() == 429 {
                    return Err(VisitRosterError::UnexpectedStatus(status.as_u16()));
                }
                Ok(())
            })
            .await
    }

    async fn deliver<T: Serialize + Sync>(&self, body: &T, what: &str) {
        if self.url.is_none() {
            tracing::warn!("ログストアのURLが未設定のため {} を送信しません", what);
            return;
        }
        match self.post_json(body).await {
            Ok(()) => tracing::debug!("{} を送信しました", what),
            Err(e) => tracing::error!(error = %e, "{} の送信に失敗しました", what),
        }
    }

    async fn get_rows(&self, url: &str) -> Result<Vec<LogRecord>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VisitRosterError::UnexpectedStatus(status.as_u16()));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Array(rows) => Ok(LogRecord::from_rows(&rows)),
            other => {
                tracing::warn!(kind = value_kind(&other), "ログストアが配列以外を返しました");
                Ok(Vec::new())
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl LogStore for SheetLogStore {
    async fn append(&self, record: &ChangeRecord) {
        self.deliver(record, "変更申請").await;
    }

    async fn update_status(&self, update: &StatusUpdate) {
        self.deliver(update, "ステータス更新").await;
    }

    async fn fetch_all(&self) -> Result<Vec<LogRecord>> {
        let Some(url) = self.url.as_deref() else {
            tracing::warn!("ログストアのURLが未設定のため空のログを返します");
            return Ok(Vec::new());
        };
        let records = self.retry.run(|| self.get_rows(url)).await?;
        tracing::info!(count = records.len(), "ログを取得しました");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_policy_default_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::default()
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VisitRosterError::UnexpectedStatus(503))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_policy_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::new(2, 0)
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(VisitRosterError::UnexpectedStatus(500))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retry_policy_skips_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::new(3, 0)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VisitRosterError::UnexpectedStatus(404))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_url_reads_empty() {
        let store = SheetLogStore::new(None, 5, RetryPolicy::default()).unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());
        // 書き込みは何もしない
        store.append(&ChangeRecord::default()).await;
    }
}
