use prospect_core::{Error, Result, ToolCall, ToolSpec};
use prospect_local::pdf::{PdfScrape, PdfScraper};
use prospect_local::scrape::WebScraper;
use prospect_local::serper::SerperClient;
use schemars::JsonSchema;
use serde::Deserialize;

const DEFAULT_TOOL_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchArgs {
    /// Targeted search query. Ask for one specific fact at a time.
    query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScrapeSiteArgs {
    /// The objective & task the user gave the agent; guides what is kept
    /// when a large page is summarized.
    objective: String,
    /// URL of the site to scrape. Must come from search results; never
    /// make one up.
    url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScrapePdfArgs {
    /// The objective & task the user gave the agent.
    objective: String,
    /// Local path or URL of the PDF to read.
    filename: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchPdfArgs {
    /// The question to answer from the document.
    objective: String,
    /// Local path or URL of the PDF to read.
    filename: String,
}

/// The closed tool surface offered to the model. Four tools, four unique
/// names; dispatch is a typed match, not a string-similarity heuristic.
pub struct ToolRegistry {
    search: SerperClient,
    scraper: WebScraper,
    pdf: PdfScraper,
    timeout_ms: u64,
}

impl ToolRegistry {
    pub fn new(search: SerperClient, scraper: WebScraper, pdf: PdfScraper) -> Self {
        Self {
            search,
            scraper,
            pdf,
            timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn specs() -> Vec<ToolSpec> {
        vec![
            spec::<SearchArgs>(
                "search",
                "Search the web for current events and data. Ask targeted questions.",
            ),
            spec::<ScrapeSiteArgs>(
                "scrape_site",
                "Get the text of a website URL. Pass the research objective and a URL taken \
                 from search results; large pages come back summarized against the objective.",
            ),
            spec::<ScrapePdfArgs>(
                "scrape_pdf",
                "Read a PDF (local path or URL) and return its pages; large documents come \
                 back summarized against the objective.",
            ),
            spec::<SearchPdfArgs>(
                "search_pdf",
                "Answer a targeted question about a PDF document. Always returns a focused \
                 summary conditioned on the question.",
            ),
        ]
    }

    pub async fn dispatch(&self, call: &ToolCall) -> Result<String> {
        match call.name.as_str() {
            "search" => {
                let args: SearchArgs = parse_args(call)?;
                self.search.search(&args.query, self.timeout_ms).await
            }
            "scrape_site" => {
                let args: ScrapeSiteArgs = parse_args(call)?;
                self.scraper
                    .scrape(&args.objective, &args.url, self.timeout_ms)
                    .await
            }
            "scrape_pdf" => {
                let args: ScrapePdfArgs = parse_args(call)?;
                let scraped = self
                    .pdf
                    .scrape(&args.objective, &args.filename, self.timeout_ms)
                    .await?;
                Ok(render_pdf_scrape(scraped))
            }
            "search_pdf" => {
                let args: SearchPdfArgs = parse_args(call)?;
                self.pdf
                    .search(&args.objective, &args.filename, self.timeout_ms)
                    .await
            }
            other => Err(Error::InvalidInput(format!("unknown tool '{other}'"))),
        }
    }
}

fn spec<T: JsonSchema>(name: &str, description: &str) -> ToolSpec {
    let schema = schemars::schema_for!(T);
    ToolSpec {
        name: name.to_string(),
        description: description.to_string(),
        parameters: serde_json::to_value(schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Result<T> {
    serde_json::from_str(&call.arguments)
        .map_err(|e| Error::InvalidInput(format!("bad arguments for '{}': {e}", call.name)))
}

fn render_pdf_scrape(scraped: PdfScrape) -> String {
    match scraped {
        PdfScrape::Summary(text) => text,
        PdfScrape::Pages(pages) => pages
            .iter()
            .map(|p| format!("[page {}]\n{}", p.number, p.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_core::{ChatMessage, ChatOutcome, LlmBackend, ToolSpec};
    use prospect_local::browserless::BrowserlessClient;
    use prospect_local::pdf::{PdfLoader, PdfPage};
    use prospect_local::summarize::Summarizer;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct InertLlm;

    #[async_trait::async_trait]
    impl LlmBackend for InertLlm {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _timeout_ms: u64,
        ) -> prospect_core::Result<String> {
            Ok("condensed".to_string())
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
            _timeout_ms: u64,
        ) -> prospect_core::Result<ChatOutcome> {
            Err(Error::Llm("not used".to_string()))
        }
    }

    fn registry() -> ToolRegistry {
        let client = reqwest::Client::new();
        let summarizer = Summarizer::new(Arc::new(InertLlm));
        ToolRegistry::new(
            SerperClient::new(client.clone(), "test-key"),
            WebScraper::new(
                BrowserlessClient::new(client.clone(), "test-key"),
                summarizer.clone(),
            ),
            PdfScraper::new(PdfLoader::new(client), summarizer),
        )
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn registered_tool_names_are_unique() {
        let specs = ToolRegistry::specs();
        let names: HashSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), specs.len(), "duplicate tool name registered");
    }

    #[test]
    fn specs_document_their_argument_fields() {
        let specs = ToolRegistry::specs();
        let scrape = specs.iter().find(|s| s.name == "scrape_site").unwrap();
        let props = &scrape.parameters["properties"];
        assert!(props.get("objective").is_some(), "schema={:?}", scrape.parameters);
        assert!(props.get("url").is_some(), "schema={:?}", scrape.parameters);
        let search = specs.iter().find(|s| s.name == "search").unwrap();
        assert!(search.parameters["properties"].get("query").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_input() {
        match registry().dispatch(&call("hack_the_planet", "{}")).await {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("hack_the_planet")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_arguments_are_invalid_input() {
        match registry().dispatch(&call("search", "{\"q\": 1}")).await {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("search")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn pdf_pages_render_in_source_order() {
        let rendered = render_pdf_scrape(PdfScrape::Pages(vec![
            PdfPage {
                number: 1,
                text: "first".to_string(),
            },
            PdfPage {
                number: 2,
                text: "second".to_string(),
            },
        ]));
        assert!(rendered.starts_with("[page 1]\nfirst"));
        assert!(rendered.contains("[page 2]\nsecond"));
    }
}
