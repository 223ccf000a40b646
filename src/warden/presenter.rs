//! Presentation strategies: HTML pages for browsers, JSON for headless clients.

use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use url::{form_urlencoded, Url};

use super::{error::FlowError, resolver::RequestContext};
use crate::oauth::TokenSet;

/// Renders the non-redirect outcomes of each flow step.
pub trait Presenter: Send + Sync {
    /// Whether a human is shown the login and consent prompts. A headless
    /// presenter accepts consent without asking.
    fn prompts_user(&self) -> bool;

    /// # Errors
    /// Returns [`FlowError::Render`] if the page cannot be produced.
    fn home(&self, authorization_url: &Url) -> Result<Response, FlowError>;

    /// # Errors
    /// Returns [`FlowError::Render`] if the page cannot be produced.
    fn login(&self, context: &RequestContext) -> Result<Response, FlowError>;

    /// # Errors
    /// Returns [`FlowError::Render`] if the page cannot be produced.
    fn consent(&self, context: &RequestContext) -> Result<Response, FlowError>;

    /// # Errors
    /// Returns [`FlowError::Render`] if the page cannot be produced.
    fn tokens(&self, tokens: &TokenSet) -> Result<Response, FlowError>;
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<html>
<body>
<h1>Please sign in to proceed.</h1>
{% if !subject_hint.is_empty() %}<p>Continuing as {{ subject_hint }}?</p>{% endif %}
<form action="{{ action }}" method="POST">
  <input name="username" type="text" value="{{ subject_hint }}" />
  <input name="password" type="password" />
  <input type="submit" />
</form>
</body>
</html>"#
)]
struct LoginPage<'a> {
    action: String,
    subject_hint: &'a str,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<html>
<body>
<h1>{% if client_id.is_empty() %}The application{% else %}{{ client_id }}{% endif %} wants access to:</h1>
<form action="{{ action }}" method="POST">
  <ul>
  {% for scope in scopes %}
    <li><label><input type="checkbox" name="grant_scope" value="{{ scope }}" checked />{{ scope }}</label></li>
  {% endfor %}
  </ul>
  <input type="submit" />
</form>
</body>
</html>"#
)]
struct ConsentPage<'a> {
    action: String,
    client_id: &'a str,
    scopes: &'a [String],
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<html>
<body>
<h1>Login and consent test</h1>
<p>To initiate the flow, click the "Authorize application" link.</p>
<p><a href="{{ authorization_url }}">Authorize application</a></p>
</body>
</html>"#
)]
struct HomePage<'a> {
    authorization_url: &'a str,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<html>
<body>
<ul>
  <li>Access Token: <code>{{ tokens.access_token }}</code></li>
  <li>Refresh Token: <code>{{ tokens.refresh_token }}</code></li>
  <li>Expires: <code>{% if let Some(expiry) = tokens.expiry %}{{ expiry }}{% else %}not reported{% endif %}</code></li>
  <li>ID Token: <code>{{ tokens.id_token }}</code></li>
</ul>
</body>
</html>"#
)]
struct TokenPage<'a> {
    tokens: &'a TokenSet,
}

fn render<T: Template>(template: &T) -> Result<Response, FlowError> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| FlowError::Render(e.to_string()))
}

fn form_action(path: &str, param: &str, challenge: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair(param, challenge)
        .finish();
    format!("{path}?{query}")
}

/// Browser-facing pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlPresenter;

impl Presenter for HtmlPresenter {
    fn prompts_user(&self) -> bool {
        true
    }

    fn home(&self, authorization_url: &Url) -> Result<Response, FlowError> {
        render(&HomePage {
            authorization_url: authorization_url.as_str(),
        })
    }

    fn login(&self, context: &RequestContext) -> Result<Response, FlowError> {
        render(&LoginPage {
            action: form_action("/login", "login_challenge", &context.challenge),
            subject_hint: context.subject_hint.as_deref().unwrap_or_default(),
        })
    }

    fn consent(&self, context: &RequestContext) -> Result<Response, FlowError> {
        render(&ConsentPage {
            action: form_action("/consent", "consent_challenge", &context.challenge),
            client_id: context.client_id.as_deref().unwrap_or_default(),
            scopes: &context.requested_scopes,
        })
    }

    fn tokens(&self, tokens: &TokenSet) -> Result<Response, FlowError> {
        render(&TokenPage { tokens })
    }
}

/// JSON responses for API clients that drive the flow without a UI.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessPresenter;

impl Presenter for HeadlessPresenter {
    fn prompts_user(&self) -> bool {
        false
    }

    fn home(&self, authorization_url: &Url) -> Result<Response, FlowError> {
        Ok(Json(json!({ "authorizationUrl": authorization_url.as_str() })).into_response())
    }

    fn login(&self, context: &RequestContext) -> Result<Response, FlowError> {
        Ok(Json(context).into_response())
    }

    fn consent(&self, context: &RequestContext) -> Result<Response, FlowError> {
        Ok(Json(context).into_response())
    }

    fn tokens(&self, tokens: &TokenSet) -> Result<Response, FlowError> {
        Ok(Json(tokens).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::{body::to_bytes, http::StatusCode};

    async fn body(response: Response) -> Result<String> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn context() -> RequestContext {
        RequestContext {
            challenge: "a&b".to_string(),
            requested_scopes: vec!["openid".to_string(), "<script>".to_string()],
            subject_hint: None,
            skip: false,
            client_id: Some("my-app-client".to_string()),
        }
    }

    #[test]
    fn form_action_encodes_challenge() {
        assert_eq!(
            form_action("/login", "login_challenge", "a&b c"),
            "/login?login_challenge=a%26b+c"
        );
    }

    #[tokio::test]
    async fn login_page_posts_back_with_challenge() -> Result<()> {
        let response = HtmlPresenter.login(&context())?;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await?;
        assert!(html.contains("login_challenge=a%26b"));
        assert!(html.contains(r#"name="password""#));
        Ok(())
    }

    #[tokio::test]
    async fn consent_page_escapes_scopes() -> Result<()> {
        let html = body(HtmlPresenter.consent(&context())?).await?;
        assert!(html.contains("openid"));
        assert!(html.contains("my-app-client"));
        assert!(!html.contains("<script>"));
        Ok(())
    }

    #[tokio::test]
    async fn headless_consent_is_json() -> Result<()> {
        let presenter = HeadlessPresenter;
        assert!(!presenter.prompts_user());
        let value: serde_json::Value =
            serde_json::from_str(&body(presenter.consent(&context())?).await?)?;
        assert_eq!(value["challenge"], "a&b");
        assert_eq!(value["requestedScopes"][0], "openid");
        Ok(())
    }

    #[tokio::test]
    async fn headless_home_returns_authorization_url() -> Result<()> {
        let url = Url::parse("http://127.0.0.1:4444/oauth2/auth?state=abc")?;
        let value: serde_json::Value =
            serde_json::from_str(&body(HeadlessPresenter.home(&url)?).await?)?;
        assert_eq!(value["authorizationUrl"], url.as_str());
        Ok(())
    }
}
