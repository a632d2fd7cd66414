//! `browsingContext` namespace: navigation, tree, printing and prompts.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContext, Navigation};

use super::nullable;

// ============================================================================
// Shared Types
// ============================================================================

/// Document readiness to wait for after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    None,
    Interactive,
    Complete,
}

/// Kind of top-level context to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateType {
    Tab,
    Window,
}

/// Node of the browsing context tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub context: BrowsingContext,
    pub url: String,
    /// `None` when the tree was cut off by `maxDepth`.
    pub children: Option<Vec<Info>>,
    /// `Some(None)` for top-level contexts.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub parent: Option<Option<BrowsingContext>>,
}

/// Payload of navigation lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationInfo {
    pub context: BrowsingContext,
    pub navigation: Option<Navigation>,
    pub timestamp: u64,
    pub url: String,
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u64,
    pub height: u64,
}

// ============================================================================
// Command Parameters
// ============================================================================

/// `browsingContext.captureScreenshot` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureScreenshotParameters {
    pub context: BrowsingContext,
}

/// `browsingContext.close` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseParameters {
    pub context: BrowsingContext,
}

/// `browsingContext.create` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParameters {
    #[serde(rename = "type")]
    pub create_type: CreateType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_context: Option<BrowsingContext>,
}

/// `browsingContext.getTree` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTreeParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<BrowsingContext>,
}

/// `browsingContext.handleUserPrompt` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleUserPromptParameters {
    pub context: BrowsingContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_text: Option<String>,
}

/// `browsingContext.navigate` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateParameters {
    pub context: BrowsingContext,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<ReadinessState>,
}

impl NavigateParameters {
    /// Navigates `context` to `url` without waiting.
    #[must_use]
    pub fn new(context: BrowsingContext, url: impl Into<String>) -> Self {
        Self {
            context,
            url: url.into(),
            wait: None,
        }
    }

    /// Waits for the given readiness state.
    #[must_use]
    pub fn with_wait(mut self, wait: ReadinessState) -> Self {
        self.wait = Some(wait);
        self
    }
}

/// Page orientation for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintOrientation {
    Portrait,
    Landscape,
}

/// Entry of `pageRanges`: a page number or a range such as `"2-4"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRange {
    Page(u64),
    Range(String),
}

/// `browsingContext.print` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintParameters {
    pub context: BrowsingContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<PrintMarginParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<PrintOrientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PrintPageParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ranges: Option<Vec<PageRange>>,
    /// 0.1 to 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shrink_to_fit: Option<bool>,
}

/// Print margins in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintMarginParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

/// Paper size in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintPageParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// `browsingContext.reload` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadParameters {
    pub context: BrowsingContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<ReadinessState>,
}

/// `browsingContext.setViewport` params. `None` restores the default viewport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetViewportParameters {
    pub context: BrowsingContext,
    pub viewport: Option<Viewport>,
}

// ============================================================================
// Results
// ============================================================================

/// `browsingContext.captureScreenshot` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureScreenshotResult {
    /// Base64-encoded PNG.
    pub data: String,
}

impl CaptureScreenshotResult {
    /// Decodes the PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `data` is not valid base64.
    pub fn decode_data(&self) -> Result<Vec<u8>> {
        decode_base64(&self.data, "screenshot")
    }
}

/// `browsingContext.create` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResult {
    pub context: BrowsingContext,
}

/// `browsingContext.getTree` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTreeResult {
    pub contexts: Vec<Info>,
}

/// `browsingContext.navigate` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateResult {
    pub navigation: Option<Navigation>,
    pub url: String,
}

/// `browsingContext.print` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResult {
    /// Base64-encoded PDF.
    pub data: String,
}

impl PrintResult {
    /// Decodes the PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `data` is not valid base64.
    pub fn decode_data(&self) -> Result<Vec<u8>> {
        decode_base64(&self.data, "print")
    }
}

fn decode_base64(data: &str, what: &str) -> Result<Vec<u8>> {
    Base64Standard
        .decode(data)
        .map_err(|e| Error::invalid_argument(format!("Invalid base64 {what} data: {e}")))
}

// ============================================================================
// Event Parameters
// ============================================================================

/// Kind of user prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPromptType {
    Alert,
    Confirm,
    Prompt,
    Beforeunload,
}

/// `browsingContext.userPromptClosed` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptClosedParameters {
    pub context: BrowsingContext,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_text: Option<String>,
}

/// `browsingContext.userPromptOpened` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPromptOpenedParameters {
    pub context: BrowsingContext,
    #[serde(rename = "type")]
    pub prompt_type: UserPromptType,
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================
