pub use client::{Auth, Client, ClientError, Method, Response, StatusCode};
pub use uri::{InvalidUriError, Uri};

mod uri {
    use std::fmt::Display;
    use std::str::FromStr;

    use axum::http;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub struct InvalidUriError(String);

    impl Display for InvalidUriError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            self.0.fmt(f)
        }
    }

    impl From<http::uri::InvalidUri> for InvalidUriError {
        fn from(value: http::uri::InvalidUri) -> Self {
            InvalidUriError(value.to_string())
        }
    }

    impl From<http::uri::InvalidUriParts> for InvalidUriError {
        fn from(value: http::uri::InvalidUriParts) -> Self {
            InvalidUriError(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct Uri(http::Uri);

    impl Uri {
        pub fn new(uri: http::Uri) -> Self {
            Self(uri)
        }

        pub fn from_static(src: &'static str) -> Self {
            Self(http::Uri::from_static(src))
        }

        /// Replace the path and query of `base_uri`, keeping scheme and
        /// authority.
        pub fn from_parts(
            base_uri: Uri,
            path: &str,
            query: Option<&str>,
        ) -> Result<Self, InvalidUriError> {
            let path_and_query = if let Some(qs) = query {
                http::uri::PathAndQuery::from_maybe_shared(format!("{path}?{qs}",))?
            } else {
                http::uri::PathAndQuery::from_str(path)?
            };
            let mut parts = base_uri.0.into_parts();
            parts.path_and_query = Some(path_and_query);

            Ok(http::Uri::from_parts(parts).map(Self::new)?)
        }

        /// Replace the path and query of `base_uri` with `segments`. Each
        /// segment is percent-encoded so it cannot add path levels or a
        /// query of its own.
        pub fn from_segments(base_uri: &Uri, segments: &[&str]) -> Result<Self, InvalidUriError> {
            let mut url = reqwest::Url::parse(&base_uri.to_string())
                .map_err(|err| InvalidUriError(err.to_string()))?;
            url.path_segments_mut()
                .map_err(|_| InvalidUriError(format!("{base_uri} cannot be a base URI")))?
                .clear()
                .extend(segments);
            url.set_query(None);

            url.as_str().parse()
        }
    }

    impl Display for Uri {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            self.0.fmt(f)
        }
    }

    impl FromStr for Uri {
        type Err = InvalidUriError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Ok(http::Uri::from_str(s).map(Self::new)?)
        }
    }

    impl TryFrom<String> for Uri {
        type Error = InvalidUriError;

        fn try_from(value: String) -> Result<Self, Self::Error> {
            Ok(Self(http::Uri::from_maybe_shared(value)?))
        }
    }
}

mod client {
    use std::time::Duration;

    use reqwest::RequestBuilder;
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use super::uri::Uri;

    pub type Method = reqwest::Method;
    pub type StatusCode = reqwest::StatusCode;

    #[derive(Debug, thiserror::Error)]
    pub enum ClientError {
        #[error("server replied with status {0}: {1}")]
        Status(StatusCode, String),

        #[error(transparent)]
        Client(reqwest::Error),

        #[error(transparent)]
        Server(reqwest::Error),
    }

    #[derive(Debug)]
    pub struct Response(reqwest::Response);

    impl Response {
        pub fn status(&self) -> StatusCode {
            self.0.status()
        }

        pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
            self.0.json().await.map_err(ClientError::Server)
        }

        pub async fn text(self) -> Result<String, ClientError> {
            self.0.text().await.map_err(ClientError::Server)
        }
    }

    #[derive(Clone)]
    pub enum Auth {
        Bearer { token: String },
    }

    impl std::fmt::Debug for Auth {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Auth::Bearer { .. } => f.write_str("Bearer { token: *** }"),
            }
        }
    }

    // Based on: https://github.com/ramsayleung/rspotify/blob/master/rspotify-http/src/reqwest.rs
    #[derive(Debug, Clone)]
    pub struct Client {
        client: reqwest::Client,
        timeout: Option<Duration>,
        auth: Option<Auth>,
    }

    impl Client {
        pub fn new(timeout: Option<Duration>) -> Self {
            Self {
                client: reqwest::Client::new(),
                timeout,
                auth: None,
            }
        }

        pub fn auth(self, auth: Option<Auth>) -> Self {
            Self {
                client: self.client,
                timeout: self.timeout,
                auth,
            }
        }

        /// POST an `application/x-www-form-urlencoded` body and decode a
        /// JSON reply.
        pub async fn post_form<Form, Response>(
            &self,
            uri: &Uri,
            form: &Form,
        ) -> Result<Response, ClientError>
        where
            Form: Serialize + ?Sized,
            Response: DeserializeOwned,
        {
            check_status(
                self.request(Method::POST, uri, |req| Ok(req.form(form)))
                    .await?,
            )
            .await?
            .json()
            .await
        }

        /// PUT a JSON body. The reply body is left to the caller since
        /// some endpoints answer with nothing at all.
        pub async fn put<Payload>(
            &self,
            uri: &Uri,
            payload: &Payload,
        ) -> Result<Response, ClientError>
        where
            Payload: Serialize + ?Sized,
        {
            check_status(
                self.request(Method::PUT, uri, |req| Ok(req.json(payload)))
                    .await?,
            )
            .await
        }

        /// Thin wrapper around [reqwest::Request], this is your gateway to
        /// a fully customizable client if this type's methods won't do.
        pub async fn request<D>(
            &self,
            method: Method,
            uri: &Uri,
            decorator: D,
        ) -> Result<Response, ClientError>
        where
            D: FnOnce(RequestBuilder) -> Result<RequestBuilder, ClientError>,
        {
            let mut request = self.client.request(method, uri.to_string());

            if let Some(timeout) = self.timeout {
                request = request.timeout(timeout);
            }

            if let Some(auth) = &self.auth {
                request = match auth {
                    Auth::Bearer { token } => request.bearer_auth(token),
                };
            };

            request = decorator(request)?;

            Ok(Response(request.send().await.map_err(ClientError::Client)?))
        }
    }

    async fn check_status(res: Response) -> Result<Response, ClientError> {
        match res.status() {
            status if status.is_success() => Ok(res),
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(ClientError::Status(status, text))
            }
        }
    }
}
