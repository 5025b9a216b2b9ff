//! Built-in template catalogue, baked into the binary at compile time.
//!
//! Each `.tpl` file contributes one segment per line; the resulting body is
//! the lines joined without separator.

use crate::types::TemplateDefinition;

/// Default name of the reserved dynamic slot.
pub const DYNAMIC_SLOT: &str = "layer";

const TPLS: &[(&str, &str)] = &[
    ("loading", include_str!("templates/loading.tpl")),
    ("blocker", include_str!("templates/blocker.tpl")),
    ("layer", include_str!("templates/layer.tpl")),
    ("formResponse", include_str!("templates/form_response.tpl")),
    ("pagingCommands", include_str!("templates/paging_commands.tpl")),
    ("showCase", include_str!("templates/show_case.tpl")),
];

/// All built-in definitions in a stable order.
pub fn builtin() -> Vec<TemplateDefinition> {
    TPLS.iter()
        .map(|(name, source)| TemplateDefinition::from_lines(*name, source))
        .collect()
}
