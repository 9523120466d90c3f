//! Tag kinds and their fixed policies.
//!
//! A [`Node`](crate::Node) is a flat element; what makes an `<a>` behave
//! differently from a `<textarea>` is its [`TagKind`], looked up once at
//! construction through a [`KindTable`].

use std::collections::HashMap;

/// Form pre-action: runs before the actions of the form fields
pub const PRIORITY_PRE_ACTION: u8 = 0;
/// A field value changed
pub const PRIORITY_VALUE_CHANGED: u8 = 1;
/// Value-carrying click, or a generated response (images)
pub const PRIORITY_GENERATED: u8 = 2;
/// Form post-action: runs after the fields, before the submit
pub const PRIORITY_PRE_SUBMIT: u8 = 3;
/// Link or submit click
pub const PRIORITY_NAVIGATION: u8 = 4;
/// Image input click
pub const PRIORITY_IMAGE_CLICK: u8 = 5;
/// Asynchronous link click
pub const PRIORITY_ASYNC_LINK: u8 = 41;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Generic,
    Form,
    Anchor,
    Img,
    Label,
    Option,
    Select,
    TextArea,
    TextInput,
    PasswordInput,
    RadioInput,
    CheckboxInput,
    SubmitInput,
    HiddenInput,
    FileInput,
    ImageInput,
    Script,
    Style,
}

/// Which attributes carry an action for a tag kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRecord {
    pub priority: u8,
    pub sync_attribute: &'static str,
    pub async_attribute: &'static str,
    /// Whether an async render pass binds this kind through an update
    /// directive instead of the synchronous attribute
    pub async_via_update: bool,
}

const VALUE_CHANGED: ActionRecord = ActionRecord {
    priority: PRIORITY_VALUE_CHANGED,
    sync_attribute: "name",
    async_attribute: "onchange",
    async_via_update: false,
};

impl TagKind {
    pub fn action_record(self) -> Option<ActionRecord> {
        match self {
            TagKind::TextInput
            | TagKind::PasswordInput
            | TagKind::CheckboxInput
            | TagKind::HiddenInput
            | TagKind::FileInput
            | TagKind::TextArea
            | TagKind::Select => Some(VALUE_CHANGED),
            TagKind::RadioInput => Some(ActionRecord {
                priority: PRIORITY_GENERATED,
                sync_attribute: "value",
                async_attribute: "onchange",
                async_via_update: false,
            }),
            TagKind::SubmitInput => Some(ActionRecord {
                priority: PRIORITY_NAVIGATION,
                sync_attribute: "name",
                async_attribute: "onclick",
                async_via_update: true,
            }),
            TagKind::ImageInput => Some(ActionRecord {
                priority: PRIORITY_IMAGE_CLICK,
                sync_attribute: "name",
                async_attribute: "onclick",
                async_via_update: false,
            }),
            TagKind::Anchor => Some(ActionRecord {
                priority: PRIORITY_NAVIGATION,
                sync_attribute: "href",
                async_attribute: "onclick",
                async_via_update: true,
            }),
            TagKind::Img => Some(ActionRecord {
                priority: PRIORITY_GENERATED,
                sync_attribute: "src",
                async_attribute: "src",
                async_via_update: false,
            }),
            _ => None,
        }
    }

    /// Attribute toggled by `set_selected`
    pub fn selection_attribute(self) -> Option<&'static str> {
        match self {
            TagKind::RadioInput | TagKind::CheckboxInput => Some("checked"),
            TagKind::Option => Some("selected"),
            _ => None,
        }
    }

    /// Attributes every element of this kind starts with
    pub fn default_attributes(self) -> &'static [(&'static str, &'static str)] {
        match self {
            TagKind::Form => &[
                ("enctype", "multipart/form-data"),
                ("method", "post"),
                ("accept-charset", "utf-8"),
                ("action", "?"),
            ],
            TagKind::FileInput => &[("name", "file")],
            _ => &[],
        }
    }
}

/// Maps tag names (and `<input>` types) to kinds
#[derive(Debug, Clone)]
pub struct KindTable {
    tags: HashMap<String, TagKind>,
    inputs: HashMap<String, TagKind>,
}

impl KindTable {
    /// An empty table: every tag is generic
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
            inputs: HashMap::new(),
        }
    }

    /// The XHTML tags with specific behaviour
    pub fn xhtml() -> Self {
        let mut table = Self::empty();
        for (tag, kind) in [
            ("a", TagKind::Anchor),
            ("area", TagKind::Anchor),
            ("button", TagKind::SubmitInput),
            ("form", TagKind::Form),
            ("img", TagKind::Img),
            ("input", TagKind::TextInput),
            ("label", TagKind::Label),
            ("option", TagKind::Option),
            ("select", TagKind::Select),
            ("textarea", TagKind::TextArea),
            ("script", TagKind::Script),
            ("style", TagKind::Style),
        ] {
            table.define(tag, kind);
        }
        for (input_type, kind) in [
            ("text", TagKind::TextInput),
            ("password", TagKind::PasswordInput),
            ("radio", TagKind::RadioInput),
            ("checkbox", TagKind::CheckboxInput),
            ("submit", TagKind::SubmitInput),
            ("hidden", TagKind::HiddenInput),
            ("file", TagKind::FileInput),
            ("image", TagKind::ImageInput),
        ] {
            table.define_input(input_type, kind);
        }
        table
    }

    pub fn define(&mut self, tag: &str, kind: TagKind) {
        self.tags.insert(tag.to_ascii_lowercase(), kind);
    }

    pub fn define_input(&mut self, input_type: &str, kind: TagKind) {
        self.inputs.insert(input_type.to_ascii_lowercase(), kind);
    }

    /// Kind of a tag. `input_type` is only consulted for `<input>`.
    pub fn resolve(&self, tag: &str, input_type: Option<&str>) -> TagKind {
        let tag = tag.to_ascii_lowercase();
        if tag == "input" {
            if let Some(t) = input_type {
                if let Some(kind) = self.inputs.get(&t.to_ascii_lowercase()) {
                    return *kind;
                }
            }
        }
        self.tags.get(&tag).copied().unwrap_or(TagKind::Generic)
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self::xhtml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_selects_kind() {
        let table = KindTable::xhtml();
        assert_eq!(table.resolve("input", None), TagKind::TextInput);
        assert_eq!(table.resolve("input", Some("radio")), TagKind::RadioInput);
        assert_eq!(table.resolve("INPUT", Some("Checkbox")), TagKind::CheckboxInput);
        assert_eq!(table.resolve("input", Some("color")), TagKind::TextInput);
        assert_eq!(table.resolve("div", Some("radio")), TagKind::Generic);
    }

    #[test]
    fn test_action_records() {
        let radio = TagKind::RadioInput.action_record().unwrap();
        assert_eq!(radio.priority, PRIORITY_GENERATED);
        assert_eq!(radio.sync_attribute, "value");

        let submit = TagKind::SubmitInput.action_record().unwrap();
        assert_eq!((submit.priority, submit.async_attribute), (4, "onclick"));
        assert!(submit.async_via_update);

        assert_eq!(TagKind::ImageInput.action_record().unwrap().priority, 5);
        assert!(TagKind::Generic.action_record().is_none());
        assert!(TagKind::Form.action_record().is_none());
    }

    #[test]
    fn test_custom_table() {
        let mut table = KindTable::empty();
        assert_eq!(table.resolve("a", None), TagKind::Generic);
        table.define("x-link", TagKind::Anchor);
        assert_eq!(table.resolve("x-link", None), TagKind::Anchor);
    }
}
