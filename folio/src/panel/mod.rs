use crate::model::Block;
use crate::registry::{BlockRegistry, InputKind};
use crate::util::{br_to_newline, escape_html, newline_to_br};

/// One form control of the property panel, pre-filled from the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInput {
    pub key: String,
    pub label: String,
    pub kind: InputKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelModel {
    /// Nothing selected.
    Empty,
    /// Selected block has a type the registry does not know.
    NoSchema { block_type: String },
    Fields {
        block_id: String,
        block_type: String,
        fields: Vec<FieldInput>,
    },
}

impl PanelModel {
    pub fn for_block(registry: &BlockRegistry, block: Option<&Block>) -> Self {
        let Some(block) = block else {
            return PanelModel::Empty;
        };
        let Some(def) = registry.get(&block.block_type) else {
            return PanelModel::NoSchema {
                block_type: block.block_type.clone(),
            };
        };

        let fields = def
            .schema
            .iter()
            .map(|field| FieldInput {
                key: field.key.clone(),
                label: field.label.clone(),
                kind: field.kind,
                value: prop_to_input(field.kind, block.prop(&field.key)),
            })
            .collect();

        PanelModel::Fields {
            block_id: block.id.clone(),
            block_type: block.block_type.clone(),
            fields,
        }
    }
}

/// Stored prop to editable text: textareas show `<br>` as line breaks.
pub fn prop_to_input(kind: InputKind, stored: &str) -> String {
    match kind {
        InputKind::Textarea => br_to_newline(stored),
        InputKind::Text => stored.to_string(),
    }
}

/// Typed text to stored prop: textarea line breaks become `<br>`.
pub fn input_to_prop(kind: InputKind, typed: &str) -> String {
    match kind {
        InputKind::Textarea => newline_to_br(typed),
        InputKind::Text => typed.to_string(),
    }
}

pub fn render_panel(model: &PanelModel) -> String {
    match model {
        PanelModel::Empty => {
            "<div id=\"prop-empty\">Select a block on the canvas to edit its properties.</div>"
                .to_string()
        }
        PanelModel::NoSchema { block_type } => format!(
            "<div id=\"prop-active\"><span class=\"badge\">{}</span><div class=\"no-schema\">No schema for this block.</div></div>",
            escape_html(&block_type.to_uppercase())
        ),
        PanelModel::Fields {
            block_id,
            block_type,
            fields,
        } => {
            let mut html = format!(
                "<div id=\"prop-active\" data-block-id=\"{}\"><span class=\"badge\">{}</span>",
                escape_html(block_id),
                escape_html(&block_type.to_uppercase())
            );
            for field in fields {
                html.push_str(&format!(
                    "<label for=\"prop-{key}\">{}</label>",
                    escape_html(&field.label),
                    key = escape_html(&field.key)
                ));
                match field.kind {
                    InputKind::Textarea => html.push_str(&format!(
                        "<textarea id=\"prop-{}\" rows=\"3\">{}</textarea>",
                        escape_html(&field.key),
                        escape_html(&field.value)
                    )),
                    InputKind::Text => html.push_str(&format!(
                        "<input id=\"prop-{}\" type=\"text\" value=\"{}\">",
                        escape_html(&field.key),
                        escape_html(&field.value)
                    )),
                }
            }
            html.push_str("</div>");
            html
        }
    }
}
