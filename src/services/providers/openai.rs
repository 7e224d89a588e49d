//! OpenAI chat-completions recommendation source
//!
//! Destinations are requested through a forced function call so the model
//! answers with JSON matching the destination schema. Overviews are plain
//! completions returned as markdown.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::{
    models::{parse_batch, Destination, Preferences, UserInfo},
    services::providers::{
        RecommendationError, RecommendationRequest, RecommendationResult, RecommendationSource,
    },
};

const RECOMMENDATION_FUNCTION: &str = "get_travel_recommendations";

const SYSTEM_PROMPT: &str = "Act as an experienced travel agent helping travellers find \
    destinations for their holidays. You will get the preferences of a traveller and suggest \
    destinations that fulfil them as closely as possible. Always return responses in JSON format.";

const OVERVIEW_SYSTEM_PROMPT: &str = "Act as an experienced travel agent writing a concise, \
    well-structured destination overview in markdown for a traveller.";

/// Settings for the OpenAI source
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    /// Destinations requested per batch
    pub recommendation_count: usize,
    /// Where trips are assumed to start
    pub trip_origin: String,
    /// Currency used when talking about prices
    pub display_currency: String,
    pub timeout: Duration,
}

pub struct OpenAiRecommender {
    http_client: HttpClient,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationArguments {
    destinations: Vec<Value>,
}

impl OpenAiRecommender {
    pub fn new(config: OpenAiConfig) -> reqwest::Result<Self> {
        let http_client = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// JSON schema of the forced function call; every field is required
    fn function_definition() -> Value {
        json!({
            "type": "function",
            "function": {
                "name": RECOMMENDATION_FUNCTION,
                "description": "Returns a structured list of travel destination suggestions.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "destinations": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": Self::destination_properties(),
                                "required": [
                                    "name", "description", "climate", "activities", "budget",
                                    "travel_tips", "best_time_to_visit", "currency", "language",
                                    "trending", "transportation"
                                ]
                            }
                        }
                    },
                    "required": ["destinations"]
                }
            }
        })
    }

    /// JSON schema of a single destination in the function call
    fn destination_properties() -> Value {
        json!({
            "name": {
                "type": "string",
                "description": "Name of the travel destination"
            },
            "description": {
                "type": "string",
                "description": "Brief description of the destination"
            },
            "climate": {
                "type": "string",
                "description": "Climate type during travel date (e.g., Warm, Cold, Mild)"
            },
            "activities": {
                "type": "array",
                "items": {
                    "type": "string",
                    "description": "Activity to do at the destination and which it is famous for"
                }
            },
            "budget": {
                "type": "string",
                "description": "Budget level (Low, Medium, High)"
            },
            "travel_tips": {
                "type": "string",
                "description": "Travel tips for the destination"
            },
            "best_time_to_visit": {
                "type": "array",
                "description": "Best time to visit the destination",
                "items": {
                    "type": "string",
                    "description": "Month"
                }
            },
            "currency": {
                "type": "string",
                "description": "Currency used at the destination"
            },
            "language": {
                "type": "string",
                "description": "Language spoken at the destination"
            },
            "trending": {
                "type": "boolean",
                "description": "Whether the destination is trending or not"
            },
            "transportation": {
                "type": "array",
                "description": "Transportation options to reach the destination",
                "items": {
                    "type": "string",
                    "description": "Transportation mode"
                }
            }
        })
    }

    fn traveller_profile(user_info: &UserInfo) -> String {
        format!(
            "{} ({} years old, {})",
            user_info.name(),
            user_info.age(),
            user_info.gender()
        )
    }

    fn recommendation_prompt(&self, request: &RecommendationRequest) -> String {
        let mut prompt = format!(
            "Suggest {} distinct travel destinations for the following user preferences: {}. \
             The traveller is {}. To consider transportation options and travel time to the \
             destination, assume the trip starts in {}. Only suggest locations where it can \
             reasonably be assumed that the budget is sufficient for transport and accommodation.",
            self.config.recommendation_count,
            request.preferences,
            Self::traveller_profile(&request.user_info),
            self.config.trip_origin,
        );

        let excluded = request.excluded();
        if !excluded.is_empty() {
            prompt.push_str(&format!(
                " Do not suggest any of the following destinations: {}.",
                excluded.join(", ")
            ));
        }

        prompt
    }

    fn overview_prompt(
        &self,
        destination_name: &str,
        preferences: &Preferences,
        user_info: &UserInfo,
    ) -> String {
        format!(
            "Write an overview of {} for a traveller who is {} with these preferences: {}. \
             Cover location, climate, best time to visit, currency, language, why to visit, \
             top attractions, food and drink, transportation from {} and travel tips. \
             State prices in {}.",
            destination_name,
            Self::traveller_profile(user_info),
            preferences,
            self.config.trip_origin,
            self.config.display_currency,
        )
    }

    async fn complete(&self, body: Value) -> RecommendationResult<ChatResponseMessage> {
        let url = format!("{}/chat/completions", self.config.api_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI request failed");
            return Err(RecommendationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| {
                RecommendationError::Malformed("response has no choices".to_string())
            })
    }

    /// Extracts and validates the destinations from a completion message
    fn parse_recommendations(
        message: ChatResponseMessage,
    ) -> RecommendationResult<Vec<Destination>> {
        let call = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .find(|call| call.function.name == RECOMMENDATION_FUNCTION)
            .ok_or_else(|| {
                RecommendationError::Malformed(format!(
                    "no {} call in response",
                    RECOMMENDATION_FUNCTION
                ))
            })?;

        let arguments: RecommendationArguments = serde_json::from_str(&call.function.arguments)
            .map_err(|e| {
                RecommendationError::Malformed(format!("invalid function arguments: {}", e))
            })?;

        parse_batch(arguments.destinations)
            .map_err(|e| RecommendationError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RecommendationSource for OpenAiRecommender {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> RecommendationResult<Vec<Destination>> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: self.recommendation_prompt(request),
            },
        ];

        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "tools": [Self::function_definition()],
            "tool_choice": {"type": "function", "function": {"name": RECOMMENDATION_FUNCTION}},
        });

        let message = self.complete(body).await?;
        let destinations = Self::parse_recommendations(message)?;

        tracing::info!(
            destinations = destinations.len(),
            excluded = request.excluded().len(),
            model = %self.config.model,
            "Recommendations received"
        );

        Ok(destinations)
    }

    async fn overview(
        &self,
        destination_name: &str,
        preferences: &Preferences,
        user_info: &UserInfo,
    ) -> RecommendationResult<String> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: OVERVIEW_SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: self.overview_prompt(destination_name, preferences, user_info),
            },
        ];

        let body = json!({
            "model": self.config.model,
            "messages": messages,
        });

        let message = self.complete(body).await?;

        match message.content {
            Some(text) if !text.trim().is_empty() => {
                tracing::info!(destination = %destination_name, "Overview received");
                Ok(text)
            }
            _ => Err(RecommendationError::Malformed(
                "overview response has no content".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Answer;

    fn config(api_url: String) -> OpenAiConfig {
        OpenAiConfig {
            api_key: "test_key".to_string(),
            api_url,
            model: "gpt-4o".to_string(),
            recommendation_count: 5,
            trip_origin: "Switzerland".to_string(),
            display_currency: "CHF".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request(exclude: Option<Vec<String>>) -> RecommendationRequest {
        let mut preferences = Preferences::new();
        preferences.insert("Climate", Answer::Single("Warm > 20°C".to_string()));
        preferences.insert(
            "Interests",
            Answer::Multiple(vec!["Party".to_string(), "Beach / Relaxation".to_string()]),
        );
        RecommendationRequest {
            preferences,
            user_info: UserInfo::new("Anna", 28, "female").unwrap(),
            exclude,
        }
    }

    fn destination_json(name: &str) -> Value {
        json!({
            "name": name,
            "description": "Sunny island",
            "climate": "Warm",
            "activities": ["Beach"],
            "budget": "Medium",
            "travel_tips": "Go early",
            "best_time_to_visit": ["July"],
            "currency": "EUR",
            "language": "Greek",
            "trending": false,
            "transportation": ["Plane"]
        })
    }

    fn tool_call_body(destinations: Value) -> String {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": RECOMMENDATION_FUNCTION,
                            "arguments": json!({"destinations": destinations}).to_string()
                        }
                    }]
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn test_prompt_without_exclusions() {
        let recommender = OpenAiRecommender::new(config("http://test.local".to_string())).unwrap();
        let prompt = recommender.recommendation_prompt(&request(None));

        assert!(prompt.starts_with("Suggest 5 distinct travel destinations"));
        assert!(prompt.contains("Climate: Warm > 20°C; Interests: Party, Beach / Relaxation"));
        assert!(prompt.contains("Anna (28 years old, female)"));
        assert!(prompt.contains("starts in Switzerland"));
        assert!(!prompt.contains("Do not suggest"));
    }

    #[test]
    fn test_prompt_lists_exclusions() {
        let recommender = OpenAiRecommender::new(config("http://test.local".to_string())).unwrap();
        let prompt = recommender.recommendation_prompt(&request(Some(vec![
            "Ibiza".to_string(),
            "Mykonos".to_string(),
        ])));

        assert!(
            prompt.ends_with("Do not suggest any of the following destinations: Ibiza, Mykonos.")
        );
    }

    #[test]
    fn test_function_definition_requires_all_fields() {
        let definition = OpenAiRecommender::function_definition();
        let required = definition["function"]["parameters"]["properties"]["destinations"]["items"]
            ["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 11);
        assert!(required.contains(&json!("transportation")));

        let properties = OpenAiRecommender::destination_properties();
        for field in required {
            let field = field.as_str().unwrap();
            assert!(properties.get(field).is_some(), "{} has no schema", field);
        }
    }

    #[tokio::test]
    async fn test_recommend_parses_tool_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(tool_call_body(json!([
                destination_json("Crete"),
                destination_json("Malta")
            ])))
            .create_async()
            .await;

        let recommender = OpenAiRecommender::new(config(server.url())).unwrap();
        let destinations = recommender.recommend(&request(None)).await.unwrap();

        mock.assert_async().await;
        let names: Vec<&str> = destinations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Crete", "Malta"]);
    }

    #[tokio::test]
    async fn test_recommend_rejects_batch_with_invalid_record() {
        let mut server = mockito::Server::new_async().await;
        let mut broken = destination_json("Malta");
        broken.as_object_mut().unwrap().remove("language");

        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(tool_call_body(json!([destination_json("Crete"), broken])))
            .create_async()
            .await;

        let recommender = OpenAiRecommender::new(config(server.url())).unwrap();
        let result = recommender.recommend(&request(None)).await;

        assert!(matches!(result, Err(RecommendationError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_recommend_without_tool_call_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "Try Crete!"}}]}"#,
            )
            .create_async()
            .await;

        let recommender = OpenAiRecommender::new(config(server.url())).unwrap();
        let result = recommender.recommend(&request(None)).await;

        assert!(matches!(result, Err(RecommendationError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_recommend_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let recommender = OpenAiRecommender::new(config(server.url())).unwrap();
        let result = recommender.recommend(&request(None)).await;

        match result {
            Err(RecommendationError::Upstream { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recommend_transport_error() {
        // Nothing listens on port 9 of the loopback interface
        let recommender = OpenAiRecommender::new(config("http://127.0.0.1:9".to_string())).unwrap();
        let result = recommender.recommend(&request(None)).await;

        assert!(matches!(result, Err(RecommendationError::Transport(_))));
    }

    #[tokio::test]
    async fn test_overview_returns_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [{"message": {
                    "role": "assistant",
                    "content": "## Crete\nSunny."
                }}]})
                .to_string(),
            )
            .create_async()
            .await;

        let recommender = OpenAiRecommender::new(config(server.url())).unwrap();
        let req = request(None);
        let text = recommender
            .overview("Crete", &req.preferences, &req.user_info)
            .await
            .unwrap();

        assert_eq!(text, "## Crete\nSunny.");
    }

    #[tokio::test]
    async fn test_overview_empty_content_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "  "}}]}"#)
            .create_async()
            .await;

        let recommender = OpenAiRecommender::new(config(server.url())).unwrap();
        let req = request(None);
        let result = recommender
            .overview("Crete", &req.preferences, &req.user_info)
            .await;

        assert!(matches!(result, Err(RecommendationError::Malformed(_))));
    }
}
