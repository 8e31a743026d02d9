//! # modelsync
//!
//! Parser, tolerance converter and diff engine for declarative allocation
//! files: security sets (tickers with target weights and tolerance bands)
//! and models (trees of security sets with the same bands).
//!
//! This crate is pure: it never touches the network or the filesystem.
//! `modelsync-client` talks to the trading API and `modelsync-engine` ties
//! both together into preview / sync / export workflows.
//!
//! ## Quick Start
//!
//! ```
//! use modelsync::{diff, parse_security_set, ChangeKind, SecurityEntry};
//!
//! let text = "\
//! ## Security Set: Test Set
//! ## Description: A test security set
//! AAPL  5  10  20
//! MSFT  3   8  15
//! ";
//!
//! let def = parse_security_set(text).unwrap();
//! assert_eq!(def.name, "Test Set");
//! assert_eq!(def.entries.len(), 2);
//!
//! // What the server currently holds
//! let current = vec![SecurityEntry::new("AAPL", 5.0, 9.0, 20.0)];
//!
//! let changes = diff(&def.entries, &current);
//! assert_eq!(changes.len(), 2);
//! assert_eq!(changes[0].kind, ChangeKind::Modify);
//! assert_eq!(changes[0].details, vec!["target 9 -> 10"]);
//! assert_eq!(changes[1].kind, ChangeKind::Add);
//! ```
//!
//! ## Tolerance Representation
//!
//! Files carry absolute bounds; the server stores offsets from target:
//!
//! | File (`Band`) | Server (`Tolerance`) |
//! |---------------|----------------------|
//! | `lower_bound` | `target - lower_bound` |
//! | `target`      | `target` |
//! | `upper_bound` | `upper_bound - target` |
//!
//! ```
//! use modelsync::Band;
//!
//! let tol = Band::new(5.0, 10.0, 20.0).to_tolerance();
//! assert_eq!((tol.lower_tolerance, tol.upper_tolerance), (5.0, 10.0));
//! ```

pub mod definition;
pub mod diff;
mod error;
pub mod percent;
pub mod tolerance;

// Re-export public API
pub use definition::{
    Definition, DefinitionKind, Entry, ModelComponent, ModelDefinition, ParsedDefinition,
    SecurityEntry, SecuritySetDefinition, detect_kind, parse, parse_any, parse_model,
    parse_security_set, render, render_model, render_security_set,
};
pub use diff::{ChangeCounts, ChangeKind, ChangeRecord, diff};
pub use error::FormatError;
pub use tolerance::{Band, Tolerance};
