//! Identifiers, lookup tables and search conditions.

/// Declares named constants for an integer identifier newtype together with a
/// static `(name, id)` table used for name lookups.
macro_rules! id_table {
    ($ty:ident, $table:ident { $($konst:ident = $id:literal => $name:literal),+ $(,)? }) => {
        impl $ty {
            $(pub const $konst: Self = Self($id);)+
        }

        pub(crate) static $table: &[(&str, $ty)] = &[$(($name, $ty::$konst)),+];
    };
}

pub mod attributes;
pub mod condition;
mod control_types;
mod identifiers;
mod properties;

pub use attributes::names as attribute_names;
pub use condition::{ConditionFlags, ConditionValue, SearchCondition, TreeScope};
pub use control_types::ControlTypeId;
pub use identifiers::RuntimeId;
pub use properties::PropertyId;
