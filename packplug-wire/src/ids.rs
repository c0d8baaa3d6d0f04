use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Debug,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Index into the array this id is valid within.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

wire_id!(PathId, "Index into `Input::paths`.");
wire_id!(TargetId, "Index into `Input::targets`.");
wire_id!(ProductId, "Index into `Input::products`.");
wire_id!(PackageId, "Index into `Input::packages`.");
