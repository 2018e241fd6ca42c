//! Built-in rules named in spec §4.3's reference rule set.

mod brace_style;
mod import_organization;
mod indentation;
mod line_length;
mod whitespace;

pub use brace_style::BraceStyleRule;
pub use import_organization::ImportOrganizationRule;
pub use indentation::IndentationRule;
pub use line_length::LineLengthRule;
pub use whitespace::WhitespaceRule;
