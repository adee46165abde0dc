use base64::{Engine as _, engine::general_purpose};
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// One attributed turn of the conversation.
///
/// Streamed candidates may carry content with no role, or no fields at all.
#[derive(Debug, Clone, Deserialize, Serialize, new)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(into)]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PartData {
    Text(String),
    InlineData(InlineData),
    FileData(FileData),
    VideoMetadata(VideoMetadata),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    ExecutableCode(ExecutableCode),
    CodeExecutionResult(CodeExecutionResult),
    /// A part kind this crate does not model, kept as received.
    #[serde(untagged)]
    Other(serde_json::Value),
}

const PART_KINDS: &[&str] = &[
    "text",
    "inlineData",
    "fileData",
    "videoMetadata",
    "functionCall",
    "functionResponse",
    "executableCode",
    "codeExecutionResult",
];

impl<'de> Deserialize<'de> for PartData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let mut fields =
            serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let Some(kind) = PART_KINDS
            .iter()
            .copied()
            .find(|kind| fields.contains_key(*kind))
        else {
            return Ok(Self::Other(serde_json::Value::Object(fields)));
        };
        let value = fields.remove(kind).unwrap_or_default();

        let data = match kind {
            "text" => serde_json::from_value(value).map(Self::Text),
            "inlineData" => serde_json::from_value(value).map(Self::InlineData),
            "fileData" => serde_json::from_value(value).map(Self::FileData),
            "videoMetadata" => serde_json::from_value(value).map(Self::VideoMetadata),
            "functionCall" => serde_json::from_value(value).map(Self::FunctionCall),
            "functionResponse" => serde_json::from_value(value).map(Self::FunctionResponse),
            "executableCode" => serde_json::from_value(value).map(Self::ExecutableCode),
            "codeExecutionResult" => serde_json::from_value(value).map(Self::CodeExecutionResult),
            other => return Err(D::Error::unknown_variant(other, PART_KINDS)),
        };
        data.map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, new, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(prefix = "with_", into, strip_option)]
pub struct Part {
    #[serde(flatten)]
    #[setters(skip)]
    pub data: PartData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub thought_signature: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PartData::Text(text.into()))
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(PartData::InlineData(InlineData::new(mime_type, data.into())))
    }

    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            PartData::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    #[new(into)]
    pub id: Option<String>,
    #[new(into)]
    pub name: String,
    #[serde(default)]
    #[new(into)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    #[new(into)]
    pub id: Option<String>,
    #[new(into)]
    pub name: String,
    #[new(into)]
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableCode {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExecutionResult {
    pub outcome: String,
    #[serde(default)]
    pub output: Option<String>,
}

/// Binary data carried inline in a request or response.
///
/// The bytes are encoded using base64 when serialized to JSON.
#[derive(Clone, Deserialize, Serialize, new)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[new(into)]
    mime_type: String,
    #[serde(
        serialize_with = "serialize_base64",
        deserialize_with = "deserialize_base64"
    )]
    data: Vec<u8>,
}

impl InlineData {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl std::fmt::Debug for InlineData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineData")
            .field("mime_type", &self.mime_type)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

fn serialize_base64<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(s)
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize, Serialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[new(into)]
    mime_type: String,
    #[new(into)]
    file_uri: String,
}

impl FileData {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_uri(&self) -> &str {
        &self.file_uri
    }
}

/// Clip bounds for a video part. Offsets are protobuf duration strings such as `"3.5s"`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_", into, strip_option)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub start_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub end_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub fps: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

pub mod safety {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum HarmCategory {
        HarmCategoryUnspecified,
        HarmCategorySexuallyExplicit,
        HarmCategoryHateSpeech,
        HarmCategoryHarassment,
        HarmCategoryDangerousContent,
        HarmCategoryCivicIntegrity,
        #[serde(other)]
        Unknown,
    }
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum HarmProbability {
        HarmProbabilityUnspecified,
        Negligible,
        Low,
        Medium,
        High,
        #[serde(other)]
        Unknown,
    }
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum HarmBlockThreshold {
        HarmBlockThresholdUnspecified,
        BlockNone,
        BlockLowAndAbove,
        BlockMedAndAbove,
        #[serde(rename = "BLOCK_ONLY_HIGH")]
        BlockOnlyHigh,
        Off,
    }
}

pub mod request {
    use derive_new::new;
    use derive_setters::Setters;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Deserialize, Serialize, new, Setters)]
    #[setters(prefix = "with_")]
    #[setters(into, strip_option)]
    #[serde(rename_all = "camelCase")]
    pub struct Request {
        #[setters(skip)]
        #[new(into)]
        pub contents: Vec<super::Content>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        #[serde(default)]
        #[new(default)]
        pub tools: Vec<Tool>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        #[serde(default)]
        #[new(default)]
        pub safety_settings: Vec<SafetySettings>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub generation_config: Option<GenerationConfig>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub system_instruction: Option<SystemInstructionContent>,
    }

    /// A capability the model may use while generating.
    ///
    /// Serialized as an object with exactly one key, e.g. `{"googleSearch": {}}`.
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Tool {
        FunctionDeclarations(Vec<FunctionDeclaration>),
        GoogleSearchRetrieval(GoogleSearchRetrieval),
        CodeExecution(CodeExecution),
        GoogleSearch(GoogleSearch),
    }

    #[derive(Debug, Clone, Deserialize, Serialize, Default)]
    pub struct GoogleSearch {}

    #[derive(Debug, Clone, Deserialize, Serialize, Default)]
    pub struct CodeExecution {}

    #[derive(Debug, Clone, Deserialize, Serialize, Default, new, Setters)]
    #[setters(prefix = "with_", strip_option)]
    #[serde(rename_all = "camelCase")]
    pub struct GoogleSearchRetrieval {
        #[new(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        dynamic_retrieval_config: Option<DynamicRetrievalConfig>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, Default, new, Setters)]
    #[setters(prefix = "with_", strip_option)]
    #[serde(rename_all = "camelCase")]
    pub struct DynamicRetrievalConfig {
        #[new(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<DynamicRetrievalMode>,
        #[new(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        dynamic_threshold: Option<f32>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    pub enum DynamicRetrievalMode {
        #[serde(rename = "MODE_UNSPECIFIED")]
        Unspecified,
        #[serde(rename = "MODE_DYNAMIC")]
        Dynamic,
    }

    #[derive(Debug, Serialize, Deserialize, Clone, Default)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum FunctionBehavior {
        /// The model waits for the function response before continuing.
        #[default]
        Blocking,
        /// The model keeps going and picks up function responses as they arrive.
        NonBlocking,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, new, Setters)]
    #[setters(prefix = "with_")]
    #[setters(into, strip_option)]
    #[serde(rename_all = "camelCase")]
    pub struct FunctionDeclaration {
        #[setters(skip)]
        #[new(into)]
        name: String,
        #[setters(skip)]
        #[new(into)]
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        parameters: Option<serde_json::Value>, // OpenAPI Schema
        #[new(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        behavior: Option<FunctionBehavior>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, new)]
    #[serde(rename_all = "camelCase")]
    pub struct SafetySettings {
        category: super::safety::HarmCategory,
        threshold: super::safety::HarmBlockThreshold,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum ThinkingLevel {
        ThinkingLevelUnspecified,
        Minimal,
        Low,
        Medium,
        High,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, Setters, new, Default)]
    #[setters(prefix = "with_")]
    #[setters(into, strip_option)]
    #[serde(rename_all = "camelCase")]
    pub struct ThinkingConfig {
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub thinking_level: Option<ThinkingLevel>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub thinking_budget: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub include_thoughts: Option<bool>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    pub enum MediaResolution {
        #[serde(rename = "MEDIA_RESOLUTION_UNSPECIFIED")]
        Unspecified,
        #[serde(rename = "MEDIA_RESOLUTION_LOW")]
        Low,
        #[serde(rename = "MEDIA_RESOLUTION_MEDIUM")]
        Medium,
        #[serde(rename = "MEDIA_RESOLUTION_HIGH")]
        High,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, Setters, new, Default)]
    #[setters(prefix = "with_")]
    #[setters(into, strip_option)]
    #[serde(rename_all = "camelCase")]
    pub struct GenerationConfig {
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub temperature: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub top_p: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub top_k: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub candidate_count: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub max_output_tokens: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub stop_sequences: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub response_mime_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub response_schema: Option<serde_json::Value>, // OpenAPI Schema
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub thinking_config: Option<ThinkingConfig>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[new(default)]
        pub media_resolution: Option<MediaResolution>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, new)]
    #[serde(rename_all = "camelCase")]
    pub struct SystemInstructionContent {
        parts: Vec<SystemInstructionPart>,
    }

    #[derive(Debug, Clone, Deserialize, Serialize, new)]
    #[serde(rename_all = "camelCase")]
    pub struct SystemInstructionPart {
        #[new(into)]
        text: String,
    }
}

pub mod response {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct Response {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
        #[serde(default)]
        pub prompt_feedback: Option<PromptFeedback>,
        #[serde(default)]
        pub usage_metadata: Option<UsageMetadata>,
        #[serde(default)]
        pub model_version: Option<String>,
    }

    impl Response {
        /// Text of the first candidate, thought parts excluded.
        ///
        /// Returns `None` when the candidate carries no text at all.
        pub fn text(&self) -> Option<String> {
            let content = self.candidates.first()?.content.as_ref()?;
            let mut texts = content
                .parts
                .iter()
                .filter(|part| !part.is_thought())
                .filter_map(|part| part.as_text())
                .peekable();
            texts.peek()?;
            Some(texts.collect())
        }

        pub fn finish_reason(&self) -> Option<&FinishReason> {
            self.candidates.first()?.finish_reason.as_ref()
        }
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct Candidate {
        #[serde(default)]
        pub content: Option<super::Content>,
        #[serde(default)]
        pub finish_reason: Option<FinishReason>,
        #[serde(default)]
        pub index: Option<i32>,
        #[serde(default)]
        pub safety_ratings: Vec<SafetyRating>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct UsageMetadata {
        pub prompt_token_count: Option<u32>,
        pub candidates_token_count: Option<u32>,
        pub thoughts_token_count: Option<u32>,
        pub total_token_count: Option<u32>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct PromptFeedback {
        #[serde(default)]
        pub block_reason: Option<String>,
        #[serde(default)]
        pub safety_ratings: Vec<SafetyRating>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SafetyRating {
        pub category: super::safety::HarmCategory,
        pub probability: super::safety::HarmProbability,
        #[serde(default)]
        pub blocked: bool,
    }

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum FinishReason {
        FinishReasonUnspecified,
        Stop,
        MaxTokens,
        Safety,
        Recitation,
        Language,
        Blocklist,
        ProhibitedContent,
        Spii,
        MalformedFunctionCall,
        Other,
        #[serde(other)]
        Unknown,
    }
}

pub mod rest;
pub mod sse;
