//! Account endpoints and session capture.
//!
//! The server authenticates with an HttpOnly `token` cookie plus a
//! double-submit CSRF token. A browser gets both for free; here `login`
//! harvests them from `Set-Cookie` and installs them on the client so every
//! later call carries them.

use redink_types::{AuthSession, Credentials, User};

use crate::{ApiClient, ApiError, CSRF_COOKIE, SESSION_COOKIE, Session, cookie_value};

impl ApiClient {
    /// Create an account. The new user still has to `login`; signup does not
    /// start a session.
    pub async fn signup(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let response = self.post("/auth/signup").json(credentials).send().await?;
        Self::decode(response).await
    }

    /// Sign in and install the captured session on this client.
    ///
    /// The session token comes from the `token` cookie. The CSRF token is
    /// read from the `csrf_token` cookie, falling back to the copy in the
    /// response body when a proxy has stripped the cookie.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        let response = self.post("/auth/login").json(credentials).send().await?;
        let headers = response.headers().clone();
        let auth: AuthSession = Self::decode(response).await?;

        let Some(token) = cookie_value(&headers, SESSION_COOKIE) else {
            return Err(ApiError::InvalidBody(
                "login response did not set a session cookie".into(),
            ));
        };
        let csrf_token =
            cookie_value(&headers, CSRF_COOKIE).unwrap_or_else(|| auth.csrf_token.clone());
        self.set_session(Session { token, csrf_token });

        tracing::info!(user = %auth.user.email, "signed in");
        Ok(auth)
    }

    /// Sign out. The local session is dropped even when the server call
    /// fails; a session the server may have already revoked is not worth
    /// keeping.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.post("/auth/logout").send().await;
        self.clear_session();
        match result {
            Ok(response) => Self::expect_success(response).await,
            Err(source) => Err(ApiError::Http(source)),
        }
    }

    /// Fetch the signed-in user. Doubles as a session validity probe.
    pub async fn me(&self) -> Result<User, ApiError> {
        let response = self.get("/auth/me").send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod integration_tests {
    use redink_types::Credentials;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::{ApiClient, ApiError, Session};

    fn credentials() -> Credentials {
        Credentials {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        }
    }

    #[tokio::test]
    async fn test_login_captures_cookie_pair() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "correct horse",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "token=sess-9; Path=/; HttpOnly")
                    .append_header("set-cookie", "csrf_token=csrf-9; Path=/")
                    .set_body_json(json!({
                        "user": {
                            "id": "d4f0c3a1-9a6b-4f9f-8a37-5b1c0e8d2a11",
                            "email": "ada@example.com",
                        },
                        "csrf_token": "csrf-9",
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let auth = client.login(&credentials()).await.unwrap();

        assert_eq!(auth.user.email, "ada@example.com");
        let session = client.session().unwrap();
        assert_eq!(session.token, "sess-9");
        assert_eq!(session.csrf_token, "csrf-9");
    }

    #[tokio::test]
    async fn test_login_falls_back_to_body_csrf_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "token=sess-9; Path=/; HttpOnly")
                    .set_body_json(json!({
                        "user": {
                            "id": "d4f0c3a1-9a6b-4f9f-8a37-5b1c0e8d2a11",
                            "email": "ada@example.com",
                        },
                        "csrf_token": "csrf-from-body",
                    })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.login(&credentials()).await.unwrap();
        assert_eq!(client.session().unwrap().csrf_token, "csrf-from-body");
    }

    #[tokio::test]
    async fn test_login_without_session_cookie_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {
                    "id": "d4f0c3a1-9a6b-4f9f-8a37-5b1c0e8d2a11",
                    "email": "ada@example.com",
                },
                "csrf_token": "csrf-9",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.login(&credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody(_)));
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_login_bad_password_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error_code": "UNAUTHORIZED",
                "message": "Invalid email or password",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.login(&credentials()).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_signup_decodes_user_without_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "d4f0c3a1-9a6b-4f9f-8a37-5b1c0e8d2a11",
                "email": "ada@example.com",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let user = client.signup(&credentials()).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_keeps_wire_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error_code": "USER_EXISTS",
                "message": "An account with this email already exists",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.signup(&credentials()).await.unwrap_err();
        assert_eq!(err.code().map(crate::ErrorCode::as_str), Some("USER_EXISTS"));
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error_code": "INTERNAL_SERVER_ERROR",
                "message": "something broke",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_session(Session {
            token: "sess-9".into(),
            csrf_token: "csrf-9".into(),
        });

        assert!(client.logout().await.is_err());
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_me_round_trips_user() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "d4f0c3a1-9a6b-4f9f-8a37-5b1c0e8d2a11",
                "email": "ada@example.com",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_session(Session {
            token: "sess-9".into(),
            csrf_token: "csrf-9".into(),
        });
        let user = client.me().await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }
}
