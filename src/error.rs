//! Errors raised while reading allocation definition files.

use crate::definition::DefinitionKind;

/// Fatal problems with a definition file.
///
/// Malformed data lines are not errors: the parser skips them. Only a
/// definition that cannot be identified at all is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// No `# Security Set: <name>` / `# Model: <name>` header was found.
    #[error("missing '# {}: <name>' header", .kind.header_label())]
    MissingName { kind: DefinitionKind },

    /// The text carries neither a security-set nor a model name header.
    #[error("cannot tell whether this is a security set or a model: no name header")]
    UnknownKind,
}
