//! HTTP Remote Operation
//!
//! reqwest-backed adapter. `GET/POST /<plural>`, `PATCH/DELETE /<plural>/<id>`,
//! bearer token from the identity source; without a token nothing is sent. Non-2xx answers become
//! `TransportError::Status` carrying the body's `message` when there is one.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::traits::{RemoteOperation, RemoteResult};
use crate::envelope::TransportError;
use crate::identity::IdentitySource;
use crate::resource::Resource;

/// Shape of error bodies; only `message` is used
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpRemote<R> {
    client: Client,
    base: Url,
    identity: Arc<dyn IdentitySource>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpRemote<R> {
    /// `base` must end with a slash so resource paths join under it
    pub fn new(client: Client, base: Url, identity: Arc<dyn IdentitySource>) -> Self {
        Self {
            client,
            base,
            identity,
            _resource: PhantomData,
        }
    }

    fn collection_url(&self) -> Result<Url, TransportError> {
        self.base
            .join(R::PATH)
            .map_err(|e| TransportError::Other(format!("bad {} url: {}", R::NAME, e)))
    }

    fn member_url(&self, id: &str) -> Result<Url, TransportError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Other(format!("bad {} url", R::NAME)))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, TransportError> {
        let token = self
            .identity
            .auth_token()
            .ok_or(TransportError::Unauthenticated)?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.authorize(request)?.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            log::warn!("{} request failed with {}", R::NAME, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl<R: Resource> RemoteOperation<R> for HttpRemote<R> {
    async fn create(&self, request: &R::CreateRequest) -> RemoteResult<R::Created> {
        let url = self.collection_url()?;
        log::debug!("POST {}", url);
        self.send(self.client.post(url).json(request)).await
    }

    async fn list(&self) -> RemoteResult<Vec<R::Item>> {
        let url = self.collection_url()?;
        log::debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> RemoteResult<R::Item> {
        let url = self.member_url(id)?;
        log::debug!("PATCH {}", url);
        self.send(self.client.patch(url).json(patch)).await
    }

    async fn delete(&self, id: &str) -> RemoteResult<serde_json::Value> {
        let url = self.member_url(id)?;
        log::debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependentDraft, GrantLine};
    use crate::identity::{Session, User};
    use crate::resources::{DependentPayload, Dependents, Grants};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response; the handle yields the raw request
    async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).to_string()
        });

        (Url::parse(&format!("http://{}/api/", addr)).unwrap(), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= split + 4 + length
    }

    fn remote<R: Resource>(base: Url) -> HttpRemote<R> {
        let session = Arc::new(Session::signed_in(User::new("emp-1"), "tok-1"));
        let client = Client::builder().no_proxy().build().unwrap();
        HttpRemote::new(client, base, session)
    }

    #[tokio::test]
    async fn test_list_sends_bearer_token() {
        let body = r#"{"success":true,"message":"ok","data":[{"id":"srv-1","employee_id":"emp-1","first_name":"Ada","last_name":"Lovelace","relationship":"child","date_of_birth":null}]}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let env = remote::<Dependents>(base).list().await.unwrap();
        let request = server.await.unwrap();

        assert!(env.success);
        assert_eq!(env.data.unwrap()[0].id, "srv-1");
        assert!(request.starts_with("GET /api/dependents HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn test_create_posts_payload() {
        let body = r#"{"success":false,"message":"Duplicate dependent"}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let payload = DependentPayload {
            employee_id: "emp-1".to_string(),
            draft: DependentDraft {
                first_name: "Ada".to_string(),
                ..DependentDraft::default()
            },
        };
        let env = remote::<Dependents>(base).create(&payload).await.unwrap();
        let request = server.await.unwrap();

        assert!(!env.success);
        assert_eq!(env.message, "Duplicate dependent");
        assert!(request.starts_with("POST /api/dependents HTTP/1.1"));
        assert!(request.contains(r#""employee_id":"emp-1""#));
        assert!(request.contains(r#""first_name":"Ada""#));
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let (base, server) = serve_once("422 Unprocessable Entity", r#"{"message":"Email taken"}"#).await;

        let err = remote::<Dependents>(base).delete("srv-9").await.unwrap_err();
        let request = server.await.unwrap();

        assert_eq!(
            err,
            TransportError::Status { status: 422, message: Some("Email taken".to_string()) }
        );
        assert!(request.starts_with("DELETE /api/dependents/srv-9 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{}/api/", addr)).unwrap();
        let err = remote::<Dependents>(base).list().await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn test_grant_update_patches_single_line() {
        let body = r#"{"success":true,"message":"Grant updated","data":{"id":"g-4","user_id":"emp-1","grant_type":"medical","amount":90.0,"reason":"Clinic visit","status":"pending"}}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let line = GrantLine {
            grant_type: "medical".to_string(),
            amount: Some(90.0),
            reason: "Clinic visit".to_string(),
        };
        let env = remote::<Grants>(base).update("g-4", &line).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(env.data.unwrap().amount, 90.0);
        assert!(request.starts_with("PATCH /api/grants/g-4 HTTP/1.1"));
        let (_, sent) = request.split_once("\r\n\r\n").unwrap();
        let sent: serde_json::Value = serde_json::from_str(sent).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"grant_type": "medical", "amount": 90.0, "reason": "Clinic visit"})
        );
    }

    #[tokio::test]
    async fn test_signed_out_request_is_not_sent() {
        let (base, server) = serve_once("200 OK", r#"{"success":true,"message":"ok","data":[]}"#).await;
        let client = Client::builder().no_proxy().build().unwrap();
        let anonymous = HttpRemote::<Dependents>::new(client, base, Arc::new(Session::new()));

        let err = anonymous.list().await.unwrap_err();

        assert_eq!(err, TransportError::Unauthenticated);
        server.abort();
    }
}
