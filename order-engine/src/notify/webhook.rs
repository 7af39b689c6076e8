//! HTTP webhook sink

use super::{NotificationSink, NotifyError, OrderNotification};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// POSTs the notification as JSON to a fixed URL
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::Value;
    use shared::order::Customer;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Webhook endpoint answering `status`; received bodies arrive on the channel
    async fn webhook_server(status: StatusCode) -> (String, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/webhook/nuevo-pedido",
            post(move |Json(body): Json<Value>| async move {
                let _ = tx.send(body);
                status
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/webhook/nuevo-pedido", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await });
        (url, rx)
    }

    fn notification() -> OrderNotification {
        OrderNotification {
            order_id: "abc".into(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
            customer: Customer {
                name: "Ana".into(),
                phone: "3001234567".into(),
                address: "Calle 10 #5-20".into(),
                email: None,
            },
            items: vec![],
            total: 7000.0,
            event: "new_order".into(),
        }
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let (url, mut received) = webhook_server(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();
        notifier.deliver(&notification()).await.unwrap();

        let body = received.recv().await.unwrap();
        assert_eq!(body["orderId"], "abc");
        assert_eq!(body["event"], "new_order");
        assert_eq!(body["total"], 7000.0);
    }

    #[tokio::test]
    async fn test_non_2xx_is_error() {
        let (url, _received) = webhook_server(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();
        let err = notifier.deliver(&notification()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Status { status: 500, .. }));
        assert_eq!(err.code(), shared::error::ErrorCode::NotificationFailed);
    }
}
