//! Minimal typed subset of the LINE Flex Message layout tree, enough for the
//! appointment reminder bubbles.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexContainer {
    Bubble {
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<FlexComponent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<FlexComponent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        footer: Option<FlexComponent>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexComponent {
    Box {
        layout: String,
        contents: Vec<FlexComponent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        margin: Option<String>,
        #[serde(rename = "paddingAll", skip_serializing_if = "Option::is_none")]
        padding_all: Option<String>,
        #[serde(rename = "backgroundColor", skip_serializing_if = "Option::is_none")]
        background_color: Option<String>,
    },
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        weight: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        margin: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        align: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        flex: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        wrap: Option<bool>,
    },
    Separator {
        #[serde(skip_serializing_if = "Option::is_none")]
        margin: Option<String>,
    },
}

impl FlexComponent {
    pub fn vbox(contents: Vec<FlexComponent>) -> Self {
        FlexComponent::Box {
            layout: "vertical".into(),
            contents,
            margin: None,
            padding_all: None,
            background_color: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        FlexComponent::Text {
            text: text.into(),
            size: None,
            color: None,
            weight: None,
            margin: None,
            align: None,
            flex: None,
            wrap: None,
        }
    }

    pub fn size(mut self, v: &str) -> Self {
        if let FlexComponent::Text { size, .. } = &mut self {
            *size = Some(v.into());
        }
        self
    }

    pub fn color(mut self, v: &str) -> Self {
        if let FlexComponent::Text { color, .. } = &mut self {
            *color = Some(v.into());
        }
        self
    }

    pub fn weight(mut self, v: &str) -> Self {
        if let FlexComponent::Text { weight, .. } = &mut self {
            *weight = Some(v.into());
        }
        self
    }

    pub fn margin(mut self, v: &str) -> Self {
        match &mut self {
            FlexComponent::Box { margin, .. }
            | FlexComponent::Text { margin, .. }
            | FlexComponent::Separator { margin } => *margin = Some(v.into()),
        }
        self
    }

    pub fn align(mut self, v: &str) -> Self {
        if let FlexComponent::Text { align, .. } = &mut self {
            *align = Some(v.into());
        }
        self
    }

    pub fn wrap(mut self) -> Self {
        if let FlexComponent::Text { wrap, .. } = &mut self {
            *wrap = Some(true);
        }
        self
    }

    pub fn flex(mut self, v: u32) -> Self {
        if let FlexComponent::Text { flex, .. } = &mut self {
            *flex = Some(v);
        }
        self
    }

    pub fn padding_all(mut self, v: &str) -> Self {
        if let FlexComponent::Box { padding_all, .. } = &mut self {
            *padding_all = Some(v.into());
        }
        self
    }

    pub fn background_color(mut self, v: &str) -> Self {
        if let FlexComponent::Box { background_color, .. } = &mut self {
            *background_color = Some(v.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase_tags_and_skips_absent_fields() {
        let bubble = FlexContainer::Bubble {
            size: Some("mega".into()),
            header: Some(FlexComponent::vbox(vec![
                FlexComponent::text("hi").weight("bold")
            ])),
            body: None,
            footer: None,
        };
        let v = serde_json::to_value(&bubble).unwrap();
        assert_eq!(v["type"], "bubble");
        assert_eq!(v["size"], "mega");
        assert_eq!(v["header"]["type"], "box");
        assert_eq!(v["header"]["contents"][0]["type"], "text");
        assert_eq!(v["header"]["contents"][0]["weight"], "bold");
        assert!(v["header"]["contents"][0].get("color").is_none());
        assert!(v.get("body").is_none());
    }
}
