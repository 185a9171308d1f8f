use custom_crud_core::{open_db_in_memory, AdminController, AppConfig};
use custom_crud_web::{serve_with_listener, AppState};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::form_urlencoded::Serializer;

const PAGE: &str = "/wp-admin/admin.php?page=custom-crud-plugin";

struct TestServer {
    addr: SocketAddr,
    client: Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let config = AppConfig::from_toml_str(
            r#"
[security]
nonce_secret = "http-integration-secret"
"#,
        )
        .unwrap();
        let controller = AdminController::from_config(&config).unwrap();
        let conn = open_db_in_memory(controller.table()).unwrap();
        let state = Arc::new(AppState::new(
            conn,
            controller,
            config.security.user_header.as_str(),
            config.security.capabilities_header.as_str(),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = serve_with_listener(listener, state, async move {
                let _ = shutdown_rx.await;
            })
            .await;
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();
        Self {
            addr,
            client,
            _shutdown: shutdown_tx,
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    async fn get_as(&self, path_and_query: &str, capabilities: Option<&str>) -> Response {
        let mut request = self
            .client
            .get(self.url(path_and_query))
            .header("x-host-user", "1");
        if let Some(capabilities) = capabilities {
            request = request.header("x-host-capabilities", capabilities);
        }
        request.send().await.unwrap()
    }

    async fn get(&self, path_and_query: &str) -> Response {
        self.get_as(path_and_query, Some("manage_options")).await
    }

    async fn save(&self, id: &str, name: &str, email: &str) -> Response {
        let body = Serializer::new(String::new())
            .append_pair("action", "save_custom_data")
            .append_pair("id", id)
            .append_pair("name", name)
            .append_pair("email", email)
            .finish();
        self.client
            .post(self.url("/wp-admin/admin-post.php"))
            .header("x-host-user", "1")
            .header("x-host-capabilities", "manage_options")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .unwrap()
    }
}

fn location(response: &Response) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn delete_link(html: &str) -> String {
    let start = html.find("/wp-admin/admin-post.php?action=delete_custom_data").unwrap();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].replace("&amp;", "&")
}

#[tokio::test]
async fn save_render_delete_over_http() {
    let server = TestServer::start().await;

    let response = server.save("0", "Jane Doe", "jane@example.com").await;
    assert_eq!(location(&response), format!("{PAGE}&notice=created"));

    let response = server.get(PAGE).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("<td>1</td><td>Jane Doe</td><td>jane@example.com</td>"));

    let response = server.get(&delete_link(&html)).await;
    assert_eq!(location(&response), format!("{PAGE}&notice=deleted"));

    let html = server.get(PAGE).await.text().await.unwrap();
    assert!(!html.contains("Jane Doe"));
}

#[tokio::test]
async fn forged_delete_token_keeps_the_row() {
    let server = TestServer::start().await;
    server.save("0", "Keep Me", "keep@example.com").await;

    let response = server
        .get("/wp-admin/admin-post.php?action=delete_custom_data&id=1&_wpnonce=forged")
        .await;
    assert_eq!(location(&response), format!("{PAGE}&notice=token_rejected"));

    let html = server.get(PAGE).await.text().await.unwrap();
    assert!(html.contains("Keep Me"));
}

#[tokio::test]
async fn missing_capability_is_forbidden() {
    let server = TestServer::start().await;

    let response = server.get_as(PAGE, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server.get_as(PAGE, Some("read,edit_posts")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_slug_and_actions_are_rejected() {
    let server = TestServer::start().await;

    let response = server.get("/wp-admin/admin.php?page=other").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .get("/wp-admin/admin-post.php?action=save_custom_data&name=x&email=x@y.com")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.get("/wp-admin/admin-post.php?action=unknown").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_email_redirects_with_error_notice() {
    let server = TestServer::start().await;

    let response = server.save("0", "Jane", "not an email").await;
    let target = location(&response);
    assert_eq!(target, format!("{PAGE}&notice=invalid_email"));

    let html = server.get(&target).await.text().await.unwrap();
    assert!(html.contains("notice-error"));
    assert!(!html.contains("<td>1</td>"));
}
