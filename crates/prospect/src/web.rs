use crate::agent::ResearchAgent;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use prospect_core::{Error, Result};
use std::sync::Arc;

/// The whole surface: a one-field form and the route that runs it.
pub fn router(agent: Arc<ResearchAgent>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/research", post(research))
        .with_state(agent)
}

pub async fn serve(agent: Arc<ResearchAgent>, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| Error::Network(format!("bind {host}:{port}: {e}")))?;
    tracing::info!(host, port, "serving research form");
    axum::serve(listener, router(agent))
        .await
        .map_err(|e| Error::Network(e.to_string()))
}

async fn index() -> Html<String> {
    Html(render_page(None, None))
}

#[derive(Debug, serde::Deserialize)]
struct ResearchForm {
    goal: String,
}

async fn research(
    State(agent): State<Arc<ResearchAgent>>,
    Form(form): Form<ResearchForm>,
) -> (StatusCode, Html<String>) {
    let goal = form.goal.trim().to_string();
    match agent.run(&goal).await {
        Ok(answer) => (
            StatusCode::OK,
            Html(render_page(Some(&goal), Some(Ok(&answer)))),
        ),
        Err(e) => {
            tracing::error!(goal = %goal, error = %e, "research failed");
            (
                StatusCode::BAD_GATEWAY,
                Html(render_page(Some(&goal), Some(Err(&e)))),
            )
        }
    }
}

fn render_page(goal: Option<&str>, outcome: Option<std::result::Result<&str, &Error>>) -> String {
    let goal = goal.map(escape_html).unwrap_or_default();
    let body = match outcome {
        None => String::new(),
        Some(Ok(answer)) => format!(
            "<h2>Result</h2>\n<pre class=\"answer\">{}</pre>",
            escape_html(answer)
        ),
        Some(Err(e)) => format!(
            "<p class=\"error\">research failed: {}</p>",
            escape_html(&e.to_string())
        ),
    };
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>AI research agent</title>\n\
         <style>body{{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}}\
         pre.answer{{white-space:pre-wrap}}p.error{{color:#a00}}</style>\n</head>\n<body>\n\
         <h1>AI research agent</h1>\n\
         <form method=\"post\" action=\"/research\">\n\
         <label for=\"goal\">Research goal</label><br>\n\
         <input type=\"text\" id=\"goal\" name=\"goal\" size=\"60\" value=\"{goal}\">\n\
         <button type=\"submit\">Research</button>\n</form>\n{body}\n</body>\n</html>\n"
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::memory::ConversationMemory;
    use crate::tools::ToolRegistry;
    use prospect_core::{ChatMessage, ChatOutcome, LlmBackend, ToolSpec};
    use prospect_local::browserless::BrowserlessClient;
    use prospect_local::pdf::{PdfLoader, PdfScraper};
    use prospect_local::scrape::WebScraper;
    use prospect_local::serper::SerperClient;
    use prospect_local::summarize::Summarizer;

    enum Script {
        Answer(&'static str),
        Fail,
    }

    struct OneShotLlm {
        script: Script,
    }

    #[async_trait::async_trait]
    impl LlmBackend for OneShotLlm {
        async fn complete(&self, _system: &str, _user: &str, _timeout_ms: u64) -> Result<String> {
            Ok("condensed".to_string())
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
            _timeout_ms: u64,
        ) -> Result<ChatOutcome> {
            match self.script {
                Script::Answer(text) => Ok(ChatOutcome::Message(text.to_string())),
                Script::Fail => Err(Error::UpstreamStatus {
                    status: 500,
                    context: "openai chat.completions".to_string(),
                }),
            }
        }
    }

    fn agent_with(script: Script) -> Arc<ResearchAgent> {
        let llm = Arc::new(OneShotLlm { script });
        let client = reqwest::Client::new();
        let summarizer = Summarizer::new(llm.clone());
        let tools = ToolRegistry::new(
            SerperClient::new(client.clone(), "test-key"),
            WebScraper::new(
                BrowserlessClient::new(client.clone(), "test-key"),
                summarizer.clone(),
            ),
            PdfScraper::new(PdfLoader::new(client), summarizer),
        );
        Arc::new(ResearchAgent::new(
            llm.clone(),
            tools,
            ConversationMemory::new(llm),
            AgentConfig::default(),
        ))
    }

    async fn serve_router(agent: Arc<ResearchAgent>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(agent)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn pages_escape_untrusted_text() {
        let page = render_page(Some("<script>alert(1)</script>"), None);
        assert!(!page.contains("<script>alert"), "page={page}");
        assert!(page.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn index_serves_the_form() {
        let base = serve_router(agent_with(Script::Answer("unused"))).await;
        let body = reqwest::get(base).await.unwrap().text().await.unwrap();
        assert!(body.contains("Research goal"));
        assert!(body.contains("name=\"goal\""));
    }

    #[tokio::test]
    async fn successful_research_renders_the_answer() {
        let base = serve_router(agent_with(Script::Answer("Jane Doe studied at MIT"))).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/research"))
            .form(&[("goal", "find Jane Doe's education")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body = resp.text().await.unwrap();
        assert!(body.contains("Jane Doe studied at MIT"));
    }

    #[tokio::test]
    async fn failures_are_visible_not_blank() {
        let base = serve_router(agent_with(Script::Fail)).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/research"))
            .form(&[("goal", "anything")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 502);
        let body = resp.text().await.unwrap();
        assert!(body.contains("research failed"), "body={body}");
        assert!(body.contains("HTTP 500"), "body={body}");
    }
}
