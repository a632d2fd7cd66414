//! `input` namespace: action sequences for `input.performActions`.
//!
//! Each [`SourceActions`] entry is one input device. Its `actions` list is
//! advanced one tick at a time across all sources.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::BrowsingContext;

use super::script::SharedReference;
use super::tag_literal;

// ============================================================================
// Origins
// ============================================================================

/// Coordinate origins other than an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedOrigin {
    Viewport,
    Pointer,
}

tag_literal!(
    /// `type` of an [`ElementOrigin`].
    ElementTag => "element"
);

/// Coordinates relative to an element's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementOrigin {
    #[serde(rename = "type")]
    pub kind: ElementTag,
    pub element: SharedReference,
}

/// Origin of pointer and wheel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Origin {
    Named(NamedOrigin),
    Element(ElementOrigin),
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer_type: Option<PointerType>,
}

/// Contact geometry shared by pointer actions.
///
/// Tilt (`tiltX`, `tiltY`) and angle (`altitudeAngle`, `azimuthAngle`)
/// describe the same thing; send one pair or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerCommonProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tangential_pressure: Option<f64>,
    /// 0 to 359 degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twist: Option<f64>,
    /// -90 to 90 degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_x: Option<f64>,
    /// -90 to 90 degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azimuth_angle: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAction {
    /// Single grapheme or WebDriver key code.
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerButtonAction {
    pub button: u64,
    #[serde(flatten)]
    pub common: PointerCommonProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerMoveAction {
    pub x: i64,
    pub y: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(flatten)]
    pub common: PointerCommonProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelScrollAction {
    pub x: i64,
    pub y: i64,
    pub delta_x: i64,
    pub delta_y: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NoneSourceAction {
    Pause(PauseAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeySourceAction {
    Pause(PauseAction),
    KeyDown(KeyAction),
    KeyUp(KeyAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerSourceAction {
    Pause(PauseAction),
    PointerDown(PointerButtonAction),
    PointerUp(PointerButtonAction),
    PointerMove(PointerMoveAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WheelSourceAction {
    Pause(PauseAction),
    Scroll(WheelScrollAction),
}

// ============================================================================
// Sources
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoneSourceActions {
    pub id: String,
    pub actions: Vec<NoneSourceAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySourceActions {
    pub id: String,
    pub actions: Vec<KeySourceAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSourceActions {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<PointerParameters>,
    pub actions: Vec<PointerSourceAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelSourceActions {
    pub id: String,
    pub actions: Vec<WheelSourceAction>,
}

/// Action sequence of one input source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceActions {
    None(NoneSourceActions),
    Key(KeySourceActions),
    Pointer(PointerSourceActions),
    Wheel(WheelSourceActions),
}

impl SourceActions {
    /// Returns the source id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::None(source) => &source.id,
            Self::Key(source) => &source.id,
            Self::Pointer(source) => &source.id,
            Self::Wheel(source) => &source.id,
        }
    }

    /// Returns the number of ticks this source spans.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None(source) => source.actions.len(),
            Self::Key(source) => source.actions.len(),
            Self::Pointer(source) => source.actions.len(),
            Self::Wheel(source) => source.actions.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Command Parameters
// ============================================================================

/// `input.performActions` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformActionsParameters {
    pub context: BrowsingContext,
    pub actions: Vec<SourceActions>,
}

/// `input.releaseActions` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseActionsParameters {
    pub context: BrowsingContext,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_pointer_sequence_decodes() {
        let json = json!({
            "context": "c",
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": {"pointerType": "mouse"},
                "actions": [
                    {"type": "pointerMove", "x": 10, "y": -4, "origin": "viewport"},
                    {"type": "pointerDown", "button": 0, "tiltX": 15},
                    {"type": "pause", "duration": 50},
                    {"type": "pointerUp", "button": 0}
                ]
            }]
        });
        let params: PerformActionsParameters =
            serde_json::from_value(json.clone()).expect("decode");
        let SourceActions::Pointer(pointer) = &params.actions[0] else {
            panic!("expected pointer source");
        };
        assert_eq!(params.actions[0].id(), "mouse");
        assert_eq!(params.actions[0].len(), 4);
        assert!(matches!(
            &pointer.actions[0],
            PointerSourceAction::PointerMove(PointerMoveAction {
                y: -4,
                origin: Some(Origin::Named(NamedOrigin::Viewport)),
                ..
            })
        ));
        let PointerSourceAction::PointerDown(down) = &pointer.actions[1] else {
            panic!("expected pointerDown");
        };
        assert_eq!(down.common.tilt_x, Some(15.0));
        assert_eq!(serde_json::to_value(&params).expect("encode")["actions"][0]["id"], "mouse");
    }

    #[test]
    fn test_element_origin() {
        let origin: Origin = serde_json::from_value(json!({
            "type": "element",
            "element": {"sharedId": "node-1"}
        }))
        .expect("decode");
        let Origin::Element(element) = origin else {
            panic!("expected element origin");
        };
        assert_eq!(element.element.shared_id.as_str(), "node-1");
    }

    #[test]
    fn test_key_actions_round_trip() {
        let source = SourceActions::Key(KeySourceActions {
            id: "kb".into(),
            actions: vec![
                KeySourceAction::KeyDown(KeyAction { value: "a".into() }),
                KeySourceAction::KeyUp(KeyAction { value: "a".into() }),
            ],
        });
        let json = serde_json::to_value(&source).expect("encode");
        assert_eq!(
            json,
            json!({"type": "key", "id": "kb", "actions": [
                {"type": "keyDown", "value": "a"},
                {"type": "keyUp", "value": "a"}
            ]})
        );
    }
}
