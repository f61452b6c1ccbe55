//! Decoder for versioned engine asset archives.
//!
//! ```no_run
//! use assetgraph::{LoadOptions, Session};
//!
//! let mut session = Session::new(LoadOptions::default());
//! let report = session.load_folder("Game_Data")?;
//! println!("{} containers, {} failures", report.containers, report.failure_count());
//!
//! for (r, obj) in session.objects() {
//!     if let Some(tree) = session.value_tree(r)? {
//!         println!("{} {:?}: {}", obj.class_id(), obj.name(), tree.to_json()?);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bundle;
pub mod codec;
pub mod endian;
pub mod error;
pub mod object;
pub mod parallel;
pub mod serialized;
pub mod session;
pub mod sniff;
pub mod typetree;
pub mod version;

pub use endian::{Endian, EndianReader};
pub use error::{Error, Result};
pub use object::{ClassId, Object, ObjectKind, ObjectReader, ObjectRef, PPtr};
pub use serialized::SerializedFile;
pub use session::{LoadFailure, LoadOptions, LoadReport, LoadState, SchemaSource, Session, StreamingInfo};
pub use sniff::FileType;
pub use typetree::{TypeTree, TypeTreeNode, Value};
pub use version::{BuildTarget, UnityVersion};
